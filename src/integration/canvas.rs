//! Annotator that draws straight into the frame buffer with `imageproc`.

use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

use ab_glyph::{FontArc, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;
use tracing::warn;

use super::{Annotator, Color};
use crate::error::{Error, Result};
use crate::integration::frame::Frame;
use crate::tracker::Rect;

/// `imageproc`-backed annotator.
///
/// Text needs a font; without one, `draw_text` draws nothing and logs a
/// warning the first time. Detection boxes are drawn with `thickness`,
/// outlines such as the action zone with `outline_thickness`.
#[derive(Debug, Clone)]
pub struct CanvasAnnotator {
    font: Option<FontArc>,
    text_scale: f32,
    thickness: u32,
    outline_thickness: u32,
    missing_font: Arc<Once>,
}

impl Default for CanvasAnnotator {
    fn default() -> Self {
        Self {
            font: None,
            text_scale: 24.0,
            thickness: 2,
            outline_thickness: 1,
            missing_font: Arc::new(Once::new()),
        }
    }
}

impl CanvasAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Read a TrueType/OpenType font from disk.
    pub fn with_font_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            Error::InvalidConfig(format!("invalid font {}: {e}", path.display()))
        })?;
        Ok(self.with_font(font))
    }

    pub fn with_text_scale(mut self, scale: f32) -> Self {
        self.text_scale = scale;
        self
    }

    /// Stroke width in pixels for boxes and lines. Zero is treated as one.
    pub fn with_thickness(mut self, thickness: u32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    /// Stroke width for `draw_outline`. Zero is treated as one.
    pub fn with_outline_thickness(mut self, thickness: u32) -> Self {
        self.outline_thickness = thickness.max(1);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Hollow rectangle grown outwards one pixel per layer. Corners are
    /// inclusive, so a box of width w spans w + 1 pixels.
    fn stroke_rect(frame: &mut Frame, rect: &Rect, color: Color, thickness: u32) {
        if rect.width < 0 || rect.height < 0 {
            return;
        }
        for t in 0..thickness as i32 {
            let outline = PixelRect::at(rect.x - t, rect.y - t).of_size(
                (rect.width + 1 + 2 * t) as u32,
                (rect.height + 1 + 2 * t) as u32,
            );
            draw_hollow_rect_mut(frame.image_mut(), outline, Rgb(color.0));
        }
    }
}

impl Annotator for CanvasAnnotator {
    type Error = Infallible;

    fn draw_rectangle(
        &self,
        frame: &mut Frame,
        rect: &Rect,
        color: Color,
    ) -> std::result::Result<(), Self::Error> {
        Self::stroke_rect(frame, rect, color, self.thickness);
        Ok(())
    }

    fn draw_outline(
        &self,
        frame: &mut Frame,
        rect: &Rect,
        color: Color,
    ) -> std::result::Result<(), Self::Error> {
        Self::stroke_rect(frame, rect, color, self.outline_thickness);
        Ok(())
    }

    fn draw_text(
        &self,
        frame: &mut Frame,
        text: &str,
        (x, y): (i32, i32),
        color: Color,
    ) -> std::result::Result<(), Self::Error> {
        let Some(font) = &self.font else {
            self.missing_font
                .call_once(|| warn!("no font loaded, text annotations are skipped"));
            return Ok(());
        };
        draw_text_mut(
            frame.image_mut(),
            Rgb(color.0),
            x,
            y,
            PxScale::from(self.text_scale),
            font,
            text,
        );
        Ok(())
    }

    fn draw_line(
        &self,
        frame: &mut Frame,
        start: (i32, i32),
        end: (i32, i32),
        color: Color,
    ) -> std::result::Result<(), Self::Error> {
        let half = self.thickness as i32 / 2;
        for offset in -half..=half {
            for (dx, dy) in [(offset, 0), (0, offset)] {
                draw_line_segment_mut(
                    frame.image_mut(),
                    ((start.0 + dx) as f32, (start.1 + dy) as f32),
                    ((end.0 + dx) as f32, (end.1 + dy) as f32),
                    Rgb(color.0),
                );
            }
        }
        Ok(())
    }
}
