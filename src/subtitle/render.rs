//! Rasterizes a phrase into a full-canvas transparent layer.

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::error::RenderError;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BACKDROP_COLOR: Rgba<u8> = Rgba([0, 0, 0, 180]);
const BACKDROP_RADIUS: f32 = 15.0;
const MAX_LINE_PERCENT: f32 = 90.0;
const LINE_SPACING: f32 = 1.2;
/// Caption bar position: this percentage of the height plus a fixed offset above the bottom edge.
const BOTTOM_MARGIN_PERCENT: f32 = 12.0;
const BOTTOM_OFFSET: f32 = 200.0;

/// Vertical extent of the reference glyph (`A`), measured down from the top of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphBounds {
    pub top: f32,
    pub bottom: f32,
}

impl GlyphBounds {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Text measuring and drawing. Implementations must be deterministic.
pub trait Typeface {
    fn text_width(&self, text: &str) -> f32;
    fn reference_glyph(&self) -> GlyphBounds;
    /// Draw `text` with the top of its line box at `y`.
    fn draw_text(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>);
}

pub struct FontdueTypeface {
    font: Font,
    px: f32,
}

impl FontdueTypeface {
    pub fn load(path: impl AsRef<Path>, px: f32) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| RenderError::FontRead {
            path: path.display().to_string(),
            source,
        })?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| RenderError::FontParse {
            path: path.display().to_string(),
            reason: reason.to_string(),
        })?;
        Ok(Self { font, px })
    }

    fn ascent(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.px)
            .map(|m| m.ascent)
            .unwrap_or(self.px * 0.8)
    }

    fn kern(&self, prev: Option<char>, c: char) -> f32 {
        prev.and_then(|p| self.font.horizontal_kern(p, c, self.px))
            .unwrap_or(0.0)
    }
}

impl Typeface for FontdueTypeface {
    fn text_width(&self, text: &str) -> f32 {
        let mut width = 0.0;
        let mut prev = None;
        for c in text.chars() {
            width += self.kern(prev, c) + self.font.metrics(c, self.px).advance_width;
            prev = Some(c);
        }
        width
    }

    fn reference_glyph(&self) -> GlyphBounds {
        let m = self.font.metrics('A', self.px);
        let baseline = self.ascent();
        GlyphBounds {
            top: baseline - (m.height as i32 + m.ymin) as f32,
            bottom: baseline - m.ymin as f32,
        }
    }

    fn draw_text(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
        let baseline = y as f32 + self.ascent();
        let mut pen = x as f32;
        let mut prev = None;
        for c in text.chars() {
            pen += self.kern(prev, c);
            let (metrics, coverage) = self.font.rasterize(c, self.px);
            let gx = pen.round() as i32 + metrics.xmin;
            let gy = baseline.round() as i32 - (metrics.height as i32 + metrics.ymin);
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = coverage[row * metrics.width + col];
                    blend_pixel(canvas, gx + col as i32, gy + row as i32, color, alpha);
                }
            }
            pen += metrics.advance_width;
            prev = Some(c);
        }
    }
}

/// Rounded rectangle behind the text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backdrop {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Where each piece of a phrase lands on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseLayout {
    pub lines: Vec<String>,
    pub line_widths: Vec<f32>,
    pub line_height: f32,
    pub start_y: f32,
    pub backdrop: Option<Backdrop>,
}

pub struct SubtitleRenderer<T> {
    width: u32,
    height: u32,
    typeface: T,
}

impl SubtitleRenderer<FontdueTypeface> {
    /// Renderer with the font scaled to the canvas: 3% of its height, at least 24px.
    pub fn from_font_file(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, RenderError> {
        let px = (0.03 * height as f32).max(24.0);
        Self::new(width, height, FontdueTypeface::load(path, px)?)
    }
}

impl<T: Typeface> SubtitleRenderer<T> {
    pub fn new(width: u32, height: u32, typeface: T) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidCanvas { width, height });
        }
        Ok(Self {
            width,
            height,
            typeface,
        })
    }

    pub fn wrap(&self, text: &str) -> Vec<String> {
        let max_width = (self.width as f32 * MAX_LINE_PERCENT / 100.0).floor();
        wrap_words(&self.typeface, text, max_width)
    }

    pub fn layout(&self, text: &str, centered: bool) -> PhraseLayout {
        let (w, h) = (self.width as f32, self.height as f32);
        let lines = self.wrap(text);
        let line_widths: Vec<f32> = lines.iter().map(|l| self.typeface.text_width(l)).collect();
        let reference = self.typeface.reference_glyph();
        let line_height = (reference.bottom * LINE_SPACING).round();
        let total_height = lines.len() as f32 * line_height;

        let start_y = if centered {
            ((h - total_height) / 2.0).floor()
        } else {
            h - (h * BOTTOM_MARGIN_PERCENT / 100.0).floor() - total_height - BOTTOM_OFFSET
        };

        let backdrop = line_widths.iter().copied().reduce(f32::max).map(|widest| {
            let v_pad = (reference.height() / 2.0).floor();
            let h_pad = reference.height() * 0.8;
            let width = widest + 2.0 * h_pad;
            Backdrop {
                x: ((w - width) / 2.0).floor(),
                y: start_y - v_pad,
                width,
                height: total_height + 2.0 * v_pad,
            }
        });

        PhraseLayout {
            lines,
            line_widths,
            line_height,
            start_y,
            backdrop,
        }
    }

    /// Render `text` to a transparent canvas-sized layer; `centered` picks the middle
    /// of the frame instead of the caption bar.
    pub fn render(&self, text: &str, centered: bool) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let layout = self.layout(text, centered);

        if let Some(b) = layout.backdrop {
            fill_rounded_rect(&mut canvas, b, BACKDROP_RADIUS, BACKDROP_COLOR);
        }
        for (i, (line, line_width)) in layout.lines.iter().zip(&layout.line_widths).enumerate() {
            let x = ((self.width as f32 - line_width) / 2.0).floor() as i32;
            let y = (layout.start_y + i as f32 * layout.line_height).floor() as i32;
            self.typeface.draw_text(&mut canvas, x, y, line, TEXT_COLOR);
        }
        canvas
    }
}

/// Greedy word wrap: a word joins the current line while the line still fits.
/// A word wider than `max_width` gets a line of its own.
pub(crate) fn wrap_words<T: Typeface>(typeface: &T, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if typeface.text_width(&candidate) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(current);
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub(crate) fn fill_rounded_rect(canvas: &mut RgbaImage, rect: Backdrop, radius: f32, color: Rgba<u8>) {
    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.width, rect.y + rect.height);
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);

    let px_start = x0.floor().max(0.0) as u32;
    let py_start = y0.floor().max(0.0) as u32;
    let px_end = (x1.ceil().max(0.0) as u32).min(canvas.width());
    let py_end = (y1.ceil().max(0.0) as u32).min(canvas.height());

    for py in py_start..py_end {
        for px in px_start..px_end {
            let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
            if cx < x0 || cx > x1 || cy < y0 || cy > y1 {
                continue;
            }
            let nearest_x = cx.clamp(x0 + r, x1 - r);
            let nearest_y = cy.clamp(y0 + r, y1 - r);
            let (dx, dy) = (cx - nearest_x, cy - nearest_y);
            if dx * dx + dy * dy <= r * r {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// Source-over blend of `color` at `coverage` onto one pixel; out-of-bounds is ignored.
pub(crate) fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: u8) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() || coverage == 0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let src_a = (coverage as f32 / 255.0) * (color[3] as f32 / 255.0);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for ch in 0..3 {
        let mixed = (color[ch] as f32 * src_a + dst[ch] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[ch] = mixed.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Monospaced face that draws each character as a solid block.
    pub(crate) struct BlockFace {
        pub advance: f32,
        pub cap: f32,
    }

    impl Typeface for BlockFace {
        fn text_width(&self, text: &str) -> f32 {
            text.chars().count() as f32 * self.advance
        }

        fn reference_glyph(&self) -> GlyphBounds {
            GlyphBounds {
                top: 0.0,
                bottom: self.cap,
            }
        }

        fn draw_text(&self, canvas: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
            for (i, c) in text.chars().enumerate() {
                if c == ' ' {
                    continue;
                }
                let left = x + (i as f32 * self.advance) as i32;
                for dy in 0..self.cap as i32 {
                    for dx in 0..(self.advance as i32 - 2).max(1) {
                        blend_pixel(canvas, left + dx, y + dy, color, 255);
                    }
                }
            }
        }
    }

    pub(crate) fn block_renderer(width: u32, height: u32) -> SubtitleRenderer<BlockFace> {
        SubtitleRenderer::new(
            width,
            height,
            BlockFace {
                advance: 10.0,
                cap: 20.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn wraps_at_ninety_percent_of_width() {
        // 200px canvas allows 180px = 18 characters per line
        let renderer = block_renderer(200, 800);
        let lines = renderer.wrap("the quick brown fox jumps over the lazy dog");
        assert_eq!(lines, ["the quick brown", "fox jumps over the", "lazy dog"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 18));
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let renderer = block_renderer(100, 400);
        let lines = renderer.wrap("a supercalifragilistic b");
        assert_eq!(lines, ["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn centered_layout_is_vertically_centered() {
        let renderer = block_renderer(400, 1000);
        let layout = renderer.layout("one two", true);
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.line_height, 24.0);
        assert_eq!(layout.start_y, 488.0);

        let b = layout.backdrop.unwrap();
        assert_eq!(b.y, 478.0);
        assert_eq!(b.height, 24.0 + 20.0);
        assert_eq!(b.width, 70.0 + 32.0);
        assert_eq!(b.x, 149.0);
    }

    #[test]
    fn caption_bar_sits_above_bottom_offset() {
        let renderer = block_renderer(400, 1000);
        let layout = renderer.layout("one two", false);
        assert_eq!(layout.start_y, 1000.0 - 120.0 - 24.0 - 200.0);
    }

    #[test]
    fn empty_text_renders_fully_transparent() {
        let renderer = block_renderer(64, 64);
        let image = renderer.render("   ", true);
        assert!(image.pixels().all(|p| p[3] == 0));
        assert!(renderer.layout("", false).backdrop.is_none());
    }

    #[test]
    fn draws_backdrop_and_white_text() {
        let renderer = block_renderer(400, 1000);
        let image = renderer.render("hi", true);
        assert_eq!(image.dimensions(), (400, 1000));

        // layout: text x = (400 - 20) / 2 = 190, y = 488; backdrop from (174, 478)
        assert_eq!(*image.get_pixel(192, 490), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(180, 500), BACKDROP_COLOR);
        // rounded corner stays clear
        assert_eq!(image.get_pixel(174, 478)[3], 0);
        assert_eq!(image.get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = block_renderer(300, 600);
        let a = renderer.render("same words every time", false);
        let b = renderer.render("same words every time", false);
        assert_eq!(a.as_raw(), b.as_raw());
        assert_ne!(a.as_raw(), renderer.render("same words every time", true).as_raw());
    }

    #[test]
    fn rejects_empty_canvas() {
        let err = SubtitleRenderer::new(0, 100, BlockFace { advance: 1.0, cap: 1.0 }).err().unwrap();
        assert!(matches!(err, RenderError::InvalidCanvas { width: 0, height: 100 }));
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = SubtitleRenderer::from_font_file("/nonexistent/font.ttf", 100, 100).err().unwrap();
        assert!(matches!(err, RenderError::FontRead { .. }));
    }
}
