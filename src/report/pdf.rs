//! `printpdf` backend for [`Surface`].

use std::io::BufWriter;

use printpdf::image_crate::GenericImageView;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

// Explicit imports shadow printpdf's own `Rect`/`Rgb`.
use super::settings::PageGeometry;
use super::surface::{decode_raster, FontWeight, Rect, Rgb, Surface, TextStyle};
use super::{BlockError, ReportError};

const LAYER_NAME: &str = "Layer 1";
/// Resolution images are embedded at before scaling to their slot.
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
/// Cubic Bézier handle length for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    width: f32,
    height: f32,
    pages: usize,
}

impl PdfSurface {
    /// Creates a one-page document. Font registration is the only step
    /// that can fail, and it makes the surface unusable.
    pub fn new(title: &str, geometry: &PageGeometry) -> Result<Self, ReportError> {
        let (doc, page1, layer1) =
            PdfDocument::new(title, Mm(geometry.width), Mm(geometry.height), LAYER_NAME);
        let layer = doc.get_page(page1).get_layer(layer1);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Surface(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Surface(format!("PDF font error: {e}")))?;
        let italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(|e| ReportError::Surface(format!("PDF font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            italic,
            width: geometry.width,
            height: geometry.height,
            pages: 1,
        })
    }

    /// Top-down document y to PDF's bottom-up y.
    fn flip(&self, y: f32) -> Mm {
        Mm(self.height - y)
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(Mm(x), self.flip(y))
    }

    fn font(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
            FontWeight::Italic => &self.italic,
        }
    }

    fn rect_ring(&self, rect: Rect) -> Vec<(Point, bool)> {
        vec![
            (self.point(rect.x, rect.y), false),
            (self.point(rect.x + rect.width, rect.y), false),
            (self.point(rect.x + rect.width, rect.bottom()), false),
            (self.point(rect.x, rect.bottom()), false),
        ]
    }

    fn rounded_ring(&self, rect: Rect, radius: f32) -> Vec<(Point, bool)> {
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        let k = r * KAPPA;
        let (left, top) = (rect.x, rect.y);
        let (right, bottom) = (rect.x + rect.width, rect.bottom());

        // Each corner: two control points flagged `true`, then the end point.
        vec![
            (self.point(left + r, top), false),
            (self.point(right - r, top), false),
            (self.point(right - r + k, top), true),
            (self.point(right, top + r - k), true),
            (self.point(right, top + r), false),
            (self.point(right, bottom - r), false),
            (self.point(right, bottom - r + k), true),
            (self.point(right - r + k, bottom), true),
            (self.point(right - r, bottom), false),
            (self.point(left + r, bottom), false),
            (self.point(left + r - k, bottom), true),
            (self.point(left, bottom - r + k), true),
            (self.point(left, bottom - r), false),
            (self.point(left, top + r), false),
            (self.point(left, top + r - k), true),
            (self.point(left + r - k, top), true),
            (self.point(left + r, top), false),
        ]
    }

    fn add_shape(&self, ring: Vec<(Point, bool)>, mode: PaintMode) {
        self.layer.add_polygon(Polygon {
            rings: vec![ring],
            mode,
            winding_order: WindingOrder::NonZero,
        });
    }
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        None,
    ))
}

impl Surface for PdfSurface {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn add_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
    }

    fn text(
        &mut self,
        text: &str,
        x: f32,
        baseline: f32,
        style: &TextStyle,
    ) -> Result<(), BlockError> {
        let left = style.left_edge(text, x);
        self.layer.set_fill_color(pdf_color(style.color));
        self.layer
            .use_text(text, style.size, Mm(left), self.flip(baseline), self.font(style.weight));
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb) -> Result<(), BlockError> {
        self.layer.set_fill_color(pdf_color(color));
        self.add_shape(self.rect_ring(rect), PaintMode::Fill);
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, thickness: f32) -> Result<(), BlockError> {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(thickness);
        self.add_shape(self.rect_ring(rect), PaintMode::Stroke);
        Ok(())
    }

    fn fill_rounded_rect(
        &mut self,
        rect: Rect,
        radius: f32,
        color: Rgb,
    ) -> Result<(), BlockError> {
        self.layer.set_fill_color(pdf_color(color));
        self.add_shape(self.rounded_ring(rect, radius), PaintMode::Fill);
        Ok(())
    }

    fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb,
        thickness: f32,
    ) -> Result<(), BlockError> {
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (self.point(from.0, from.1), false),
                (self.point(to.0, to.1), false),
            ],
            is_closed: false,
        });
        Ok(())
    }

    fn image(&mut self, encoded: &[u8], rect: Rect) -> Result<(), BlockError> {
        let decoded = decode_raster(encoded)?;
        let (px_w, px_h) = decoded.dimensions();
        if px_w == 0 || px_h == 0 {
            return Err(BlockError::ImageDecode("image has no pixels".into()));
        }
        // Alpha channels are not embeddable as-is.
        let decoded = printpdf::image_crate::DynamicImage::ImageRgb8(decoded.to_rgb8());

        let natural_w = px_w as f32 * MM_PER_INCH / IMAGE_DPI;
        let natural_h = px_h as f32 * MM_PER_INCH / IMAGE_DPI;

        Image::from_dynamic_image(&decoded).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x)),
                translate_y: Some(self.flip(rect.bottom())),
                scale_x: Some(rect.width / natural_w),
                scale_y: Some(rect.height / natural_h),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Serialize(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Serialize(format!("PDF buffer error: {e}")))
    }
}
