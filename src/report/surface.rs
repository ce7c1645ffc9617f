//! Drawing surface abstraction.
//!
//! Block renderers talk to a [`Surface`]; the PDF backend lives in
//! `pdf.rs`, and [`RecordingSurface`] keeps an in-memory display list that
//! tests and previews can inspect. All coordinates are top-down document
//! units, text `y` is the baseline.

use printpdf::image_crate::GenericImageView;
use serde::Serialize;

use super::metrics;
use super::{BlockError, ReportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BRAND_BLUE: Rgb = Rgb::new(37, 99, 235);
    pub const BAND_GRAY: Rgb = Rgb::new(240, 240, 240);
    pub const BORDER_GRAY: Rgb = Rgb::new(200, 200, 200);
    pub const RED: Rgb = Rgb::new(239, 68, 68);
    pub const AMBER: Rgb = Rgb::new(234, 179, 8);
    pub const GREEN: Rgb = Rgb::new(34, 197, 94);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FontWeight {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub size: f32,
    pub weight: FontWeight,
    pub color: Rgb,
    pub align: Align,
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
            color: Rgb::BLACK,
            align: Align::Left,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            ..Self::regular(size)
        }
    }

    pub fn italic(size: f32) -> Self {
        Self {
            weight: FontWeight::Italic,
            ..Self::regular(size)
        }
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Left edge of the text when anchored at `x` with this alignment.
    pub fn left_edge(&self, text: &str, x: f32) -> f32 {
        let width = metrics::text_width(text, self.size, self.weight);
        match self.align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        }
    }
}

/// Axis-aligned rectangle; `y` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A paginated drawing target. Draw calls go to the last page.
pub trait Surface {
    fn page_count(&self) -> usize;

    /// Appends a page; subsequent draws land on it.
    fn add_page(&mut self);

    fn text(&mut self, text: &str, x: f32, baseline: f32, style: &TextStyle)
        -> Result<(), BlockError>;

    fn fill_rect(&mut self, rect: Rect, color: Rgb) -> Result<(), BlockError>;

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, thickness: f32) -> Result<(), BlockError>;

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Rgb)
        -> Result<(), BlockError>;

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgb, thickness: f32)
        -> Result<(), BlockError>;

    /// Draws an encoded raster stretched to `rect`.
    fn image(&mut self, encoded: &[u8], rect: Rect) -> Result<(), BlockError>;

    /// Serializes the document. Consumes the surface: a document is finalized once.
    fn finish(self) -> Result<Vec<u8>, ReportError>
    where
        Self: Sized;
}

/// Decodes an encoded raster (PNG, JPEG, ...) for embedding.
pub fn decode_raster(encoded: &[u8]) -> Result<printpdf::image_crate::DynamicImage, BlockError> {
    printpdf::image_crate::load_from_memory(encoded)
        .map_err(|e| BlockError::ImageDecode(e.to_string()))
}

// ─── In-memory display list ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        baseline: f32,
        style: TextStyle,
    },
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    StrokeRect {
        rect: Rect,
        color: Rgb,
    },
    RoundedRect {
        rect: Rect,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
    },
    Image {
        rect: Rect,
        pixel_width: u32,
        pixel_height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOp {
    pub page: usize,
    #[serde(flatten)]
    pub op: DrawOp,
}

/// Surface that records every primitive instead of rasterizing.
///
/// `finish` serializes the display list as JSON.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pages: usize,
    ops: Vec<PlacedOp>,
    rejected_text: Option<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            pages: 1,
            ops: Vec::new(),
            rejected_text: None,
        }
    }

    /// Makes every text primitive containing `needle` fail, to exercise
    /// the degraded-render path.
    pub fn rejecting_text(mut self, needle: &str) -> Self {
        self.rejected_text = Some(needle.to_string());
        self
    }

    pub fn ops(&self) -> &[PlacedOp] {
        &self.ops
    }

    /// All text drawn, in order, with its page.
    pub fn texts(&self) -> Vec<(usize, &str)> {
        self.ops
            .iter()
            .filter_map(|placed| match &placed.op {
                DrawOp::Text { text, .. } => Some((placed.page, text.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn find_text(&self, needle: &str) -> Option<&PlacedOp> {
        self.ops
            .iter()
            .find(|placed| matches!(&placed.op, DrawOp::Text { text, .. } if text.contains(needle)))
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(PlacedOp {
            page: self.pages - 1,
            op,
        });
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RecordingSurface {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self) {
        self.pages += 1;
    }

    fn text(
        &mut self,
        text: &str,
        x: f32,
        baseline: f32,
        style: &TextStyle,
    ) -> Result<(), BlockError> {
        if let Some(needle) = &self.rejected_text {
            if text.contains(needle.as_str()) {
                return Err(BlockError::Draw(format!("text rejected: {text}")));
            }
        }
        self.push(DrawOp::Text {
            text: text.to_string(),
            x,
            baseline,
            style: *style,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) -> Result<(), BlockError> {
        self.push(DrawOp::FillRect { rect, color });
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, _thickness: f32) -> Result<(), BlockError> {
        self.push(DrawOp::StrokeRect { rect, color });
        Ok(())
    }

    fn fill_rounded_rect(
        &mut self,
        rect: Rect,
        _radius: f32,
        color: Rgb,
    ) -> Result<(), BlockError> {
        self.push(DrawOp::RoundedRect { rect, color });
        Ok(())
    }

    fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        _thickness: f32,
    ) -> Result<(), BlockError> {
        self.push(DrawOp::Line { from, to, color });
        Ok(())
    }

    fn image(&mut self, encoded: &[u8], rect: Rect) -> Result<(), BlockError> {
        let (pixel_width, pixel_height) = decode_raster(encoded)?.dimensions();
        self.push(DrawOp::Image {
            rect,
            pixel_width,
            pixel_height,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        serde_json::to_vec(&self.ops).map_err(|e| ReportError::Serialize(e.to_string()))
    }
}
