use anyhow::Context;
use hound::WavReader;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{error, info, warn};

pub fn wav_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    let reader = WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let frames = reader.len() as f64 / spec.channels as f64;
    Ok(frames / spec.sample_rate as f64)
}

/// Join WAV parts into `out_path` with ffmpeg's concat demuxer, re-encoding to PCM
/// when a stream copy fails.
pub fn concat_wavs(parts: &[PathBuf], out_path: &Path) -> anyhow::Result<()> {
    let work_dir = out_path.parent().unwrap_or_else(|| Path::new("."));
    let list_path = work_dir.join("files.txt");
    {
        let mut f = File::create(&list_path)?;
        for p in parts {
            let abs = std::path::absolute(p)?;
            writeln!(f, "file '{}'", abs.display())?;
        }
    }
    info!("Concatenating {} WAV parts into {}", parts.len(), out_path.display());

    let run = |codec: &[&str]| -> anyhow::Result<bool> {
        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(codec)
            .arg(out_path)
            .status()
            .context("failed to spawn ffmpeg")?;
        Ok(status.success())
    };

    if !run(&["-c", "copy"])? {
        warn!("ffmpeg concat with copy failed; retrying with re-encode");
        if !run(&["-c:a", "pcm_s16le"])? {
            error!("ffmpeg failed to concatenate WAV files");
            anyhow::bail!("ffmpeg failed to concatenate WAV files");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_sample_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        // 1.5 s of stereo silence
        for _ in 0..(8000 * 3 / 2 * 2) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let duration = wav_duration_seconds(&path).unwrap();
        assert!((duration - 1.5).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(wav_duration_seconds(Path::new("/nonexistent/part.wav")).is_err());
    }
}
