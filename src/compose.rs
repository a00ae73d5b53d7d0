//! Final video assembly: samples the subtitle overlay at the output frame rate and
//! burns the resulting layers onto the background footage with ffmpeg.

use anyhow::Context;
use image::RgbaImage;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::subtitle::{SubtitleOverlay, Typeface};

const MAX_TITLE_SECONDS: f64 = 10.0;
const TITLE_SECONDS_PER_WORD: f64 = 0.25;

/// How long the title card holds the screen, from the title's word count.
pub fn title_card_duration(title: &str) -> f64 {
    let words = title.split_whitespace().count() as f64;
    (words * TITLE_SECONDS_PER_WORD).round_ties_even().min(MAX_TITLE_SECONDS)
}

/// The title card layer over `[0, duration)`; `None` when the card is never shown.
pub fn title_card_segment(card: RgbaImage, duration: f64) -> Option<OverlaySegment> {
    (duration > 0.0).then(|| OverlaySegment {
        layer: Arc::new(card),
        start: 0.0,
        end: duration,
    })
}

/// A run of consecutive frames showing the same layer.
#[derive(Debug, Clone)]
pub struct OverlaySegment {
    pub layer: Arc<RgbaImage>,
    pub start: f64,
    pub end: f64,
}

/// Query the overlay once per frame over `[0, duration)` and merge consecutive
/// frames that got the same layer.
pub fn sample_overlay<T: Typeface>(overlay: &mut SubtitleOverlay<T>, duration: f64, fps: u32) -> Vec<OverlaySegment> {
    let frame_count = (duration.max(0.0) * fps as f64).ceil() as u64;
    let frame_len = 1.0 / fps as f64;
    let mut segments: Vec<OverlaySegment> = Vec::new();
    let mut open = false;

    for frame in 0..frame_count {
        let t = frame as f64 / fps as f64;
        let Some(layer) = overlay.query(t) else {
            open = false;
            continue;
        };
        match segments.last_mut() {
            Some(last) if open && Arc::ptr_eq(&last.layer, &layer) => last.end = t + frame_len,
            _ => segments.push(OverlaySegment {
                layer,
                start: t,
                end: t + frame_len,
            }),
        }
        open = true;
    }
    debug!(
        "Sampled {} frames into {} overlay segments ({} layers rendered)",
        frame_count,
        segments.len(),
        overlay.renders()
    );
    segments
}

/// Assign each distinct layer an input slot, in first-use order.
fn distinct_layers(segments: &[OverlaySegment]) -> (Vec<Arc<RgbaImage>>, Vec<usize>) {
    let mut slots: HashMap<*const RgbaImage, usize> = HashMap::new();
    let mut layers = Vec::new();
    let mut slot_of_segment = Vec::with_capacity(segments.len());
    for seg in segments {
        let slot = *slots.entry(Arc::as_ptr(&seg.layer)).or_insert_with(|| {
            layers.push(Arc::clone(&seg.layer));
            layers.len() - 1
        });
        slot_of_segment.push(slot);
    }
    (layers, slot_of_segment)
}

/// ffmpeg filter graph: fit the background to the canvas, then overlay each segment's
/// layer (input `first_layer_input + slot`) during its half-open time window.
pub fn build_filter_script(
    segments: &[OverlaySegment],
    slot_of_segment: &[usize],
    first_layer_input: usize,
    size: (u32, u32),
) -> (String, String) {
    let (w, h) = size;
    let mut script = format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1[v0]"
    );
    for (i, (seg, slot)) in segments.iter().zip(slot_of_segment).enumerate() {
        let _ = write!(
            script,
            ";\n[v{}][{}:v]overlay=0:0:enable='gte(t,{:.3})*lt(t,{:.3})'[v{}]",
            i,
            first_layer_input + slot,
            seg.start,
            seg.end,
            i + 1
        );
    }
    (script, format!("[v{}]", segments.len()))
}

/// Inputs and outputs of one video render.
pub struct Composition<'a> {
    pub background: &'a Path,
    pub narration: &'a Path,
    pub work_dir: &'a Path,
    pub output: &'a Path,
    pub size: (u32, u32),
    pub fps: u32,
}

impl Composition<'_> {
    pub fn render(&self, segments: &[OverlaySegment]) -> anyhow::Result<()> {
        let (layers, slots) = distinct_layers(segments);
        let mut layer_paths: Vec<PathBuf> = Vec::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            let path = self.work_dir.join(format!("sub_{:04}.png", i));
            layer
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            layer_paths.push(path);
        }
        info!("Wrote {} subtitle layers for {} segments", layer_paths.len(), segments.len());

        let (script, out_label) = build_filter_script(segments, &slots, 2, self.size);
        let script_path = self.work_dir.join("filters.txt");
        std::fs::write(&script_path, script)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-y", "-loglevel", "error", "-stream_loop", "-1", "-i"])
            .arg(self.background)
            .arg("-i")
            .arg(self.narration);
        for path in &layer_paths {
            cmd.arg("-i").arg(path);
        }
        cmd.arg("-filter_complex_script")
            .arg(&script_path)
            .args(["-map", out_label.as_str(), "-map", "1:a:0"])
            .args(["-c:v", "libx264", "-c:a", "aac", "-r"])
            .arg(self.fps.to_string())
            .arg("-shortest")
            .arg(self.output);

        info!("Rendering final video {}", self.output.display());
        let status = cmd.status().context("failed to spawn ffmpeg")?;
        if !status.success() {
            error!("ffmpeg failed to produce final video");
            anyhow::bail!("ffmpeg failed to produce final video {}", self.output.display());
        }
        Ok(())
    }
}
