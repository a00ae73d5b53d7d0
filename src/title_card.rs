//! The opening card: subreddit and post title on a rounded panel in the middle of the frame.

use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::error::RenderError;
use crate::subtitle::render::{Backdrop, FontdueTypeface, Typeface, fill_rounded_rect, wrap_words};

const CARD_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HEADER_COLOR: Rgba<u8> = Rgba([255, 69, 0, 255]);
const TITLE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const CARD_RADIUS: f32 = 24.0;
const CARD_WIDTH_PERCENT: f32 = 80.0;
const LINE_SPACING: f32 = 1.2;
/// Font size as a share of the canvas height.
const FONT_SHARE: f32 = 0.022;
const MIN_FONT_PX: f32 = 24.0;

/// Where the card and its lines land on the canvas. The first line is the
/// `r/<subreddit>` header.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleCardLayout {
    pub card: Backdrop,
    pub lines: Vec<String>,
    pub line_height: f32,
    pub text_x: f32,
    pub text_y: f32,
}

pub struct TitleCard<T> {
    width: u32,
    height: u32,
    typeface: T,
}

impl TitleCard<FontdueTypeface> {
    pub fn from_font_file(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, RenderError> {
        let px = (FONT_SHARE * height as f32).max(MIN_FONT_PX);
        Self::new(width, height, FontdueTypeface::load(path, px)?)
    }
}

impl<T: Typeface> TitleCard<T> {
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

    pub fn layout(&self, subreddit: &str, title: &str) -> TitleCardLayout {
        let (w, h) = (self.width as f32, self.height as f32);
        let reference = self.typeface.reference_glyph();
        let pad = reference.height().round();
        let line_height = (reference.bottom * LINE_SPACING).round();

        let card_width = (w * CARD_WIDTH_PERCENT / 100.0).floor();
        let mut lines = vec![format!("r/{}", subreddit)];
        lines.extend(wrap_words(&self.typeface, title, card_width - 2.0 * pad));

        let card_height = lines.len() as f32 * line_height + 2.0 * pad;
        let card = Backdrop {
            x: ((w - card_width) / 2.0).floor(),
            y: ((h - card_height) / 2.0).floor(),
            width: card_width,
            height: card_height,
        };
        TitleCardLayout {
            text_x: card.x + pad,
            text_y: card.y + pad,
            card,
            lines,
            line_height,
        }
    }

    /// Render the card onto a transparent canvas-sized layer.
    pub fn render(&self, subreddit: &str, title: &str) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let layout = self.layout(subreddit, title);
        fill_rounded_rect(&mut canvas, layout.card, CARD_RADIUS, CARD_COLOR);
        for (i, line) in layout.lines.iter().enumerate() {
            let color = if i == 0 { HEADER_COLOR } else { TITLE_COLOR };
            let y = (layout.text_y + i as f32 * layout.line_height).floor() as i32;
            self.typeface
                .draw_text(&mut canvas, layout.text_x as i32, y, line, color);
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::render::tests::BlockFace;

    fn card(width: u32, height: u32) -> TitleCard<BlockFace> {
        TitleCard::new(
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
    fn header_then_wrapped_title() {
        let layout = card(200, 400).layout("tifu", "I locked myself out today");
        assert_eq!(layout.lines, ["r/tifu", "I locked", "myself out", "today"]);
        assert_eq!(layout.line_height, 24.0);
        assert_eq!(
            layout.card,
            Backdrop {
                x: 20.0,
                y: 132.0,
                width: 160.0,
                height: 136.0,
            }
        );
        assert_eq!((layout.text_x, layout.text_y), (40.0, 152.0));
    }

    #[test]
    fn empty_title_keeps_header() {
        let layout = card(200, 400).layout("AmItheAsshole", "");
        assert_eq!(layout.lines, ["r/AmItheAsshole"]);
    }

    #[test]
    fn card_is_drawn_centered_with_text() {
        let image = card(200, 400).render("tifu", "I locked myself out today");
        assert_eq!(image.dimensions(), (200, 400));
        // outside the card
        assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(100, 120).0, [0, 0, 0, 0]);
        // panel with no text on it
        assert_eq!(*image.get_pixel(175, 200), CARD_COLOR);
        // header and title glyphs
        assert_eq!(*image.get_pixel(41, 153), HEADER_COLOR);
        assert_eq!(*image.get_pixel(41, 177), TITLE_COLOR);
    }

    #[test]
    fn rendering_is_deterministic() {
        let c = card(200, 400);
        assert_eq!(c.render("tifu", "same title").as_raw(), c.render("tifu", "same title").as_raw());
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let err = TitleCard::new(0, 400, BlockFace { advance: 10.0, cap: 20.0 }).err();
        assert!(matches!(err, Some(RenderError::InvalidCanvas { .. })));
    }
}
