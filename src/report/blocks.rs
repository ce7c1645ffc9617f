//! Block primitives and the canvas that places them.
//!
//! Every block is gated by `ensure_space` with its full height before it is
//! drawn, so a block never straddles a page boundary. [`Canvas::group`] gates
//! several blocks as one unit. A block whose drawing fails is recorded in
//! [`Canvas::failures`] and replaced by blank space of its placeholder
//! height; composition carries on.

use serde::Serialize;

use crate::models::{ImageData, Severity};

use super::cursor::LayoutCursor;
use super::metrics::{line_height, wrap_text};
use super::settings::{ImageSlot, PageGeometry};
use super::surface::{Align, Rect, Rgb, Surface, TextStyle};
use super::BlockError;

/// Space left where an image could not be drawn.
pub const IMAGE_PLACEHOLDER_HEIGHT: f32 = 10.0;
pub const SECTION_BAND_HEIGHT: f32 = 10.0;
pub const TABLE_ROW_HEIGHT: f32 = 7.0;
pub const BADGE_WIDTH: f32 = 30.0;
pub const BADGE_HEIGHT: f32 = 7.0;
const BADGE_RADIUS: f32 = 2.0;
/// Baseline offset within a line box, as a fraction of the line height.
const BASELINE_RATIO: f32 = 0.7;
/// Inset of text inside bands and boxes.
pub const INSET: f32 = 5.0;

/// A block that was replaced by a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockFailure {
    pub block: String,
    pub page: usize,
    pub reason: String,
}

pub fn severity_color(severity: Severity) -> Rgb {
    match severity {
        Severity::High => Rgb::RED,
        Severity::Moderate => Rgb::AMBER,
        Severity::None => Rgb::GREEN,
    }
}

/// Rounded severity badge with its label centered inside.
fn draw_severity_badge<S: Surface>(
    surface: &mut S,
    x: f32,
    y: f32,
    severity: Severity,
) -> Result<(), BlockError> {
    let rect = Rect::new(x, y, BADGE_WIDTH, BADGE_HEIGHT);
    surface.fill_rounded_rect(rect, BADGE_RADIUS, severity_color(severity))?;
    surface.text(
        severity.as_str(),
        x + BADGE_WIDTH / 2.0,
        y + 5.0,
        &TextStyle::bold(9.0).color(Rgb::WHITE).align(Align::Center),
    )
}

/// Baseline of a single line of `size` whose line box starts at `top`.
pub fn baseline(top: f32, size: f32) -> f32 {
    top + line_height(size) * BASELINE_RATIO
}

/// Document surface plus the layout cursor that owns its vertical position.
pub struct Canvas<S: Surface> {
    surface: S,
    cursor: LayoutCursor,
    failures: Vec<BlockFailure>,
    /// Inside a group: page breaks are suppressed.
    holding: bool,
}

impl<S: Surface> Canvas<S> {
    pub fn new(surface: S, geometry: PageGeometry) -> Self {
        Self {
            surface,
            cursor: LayoutCursor::new(geometry),
            failures: Vec::new(),
            holding: false,
        }
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn geometry(&self) -> PageGeometry {
        *self.cursor.geometry()
    }

    pub fn failures(&self) -> &[BlockFailure] {
        &self.failures
    }

    pub fn into_parts(self) -> (S, LayoutCursor, Vec<BlockFailure>) {
        (self.surface, self.cursor, self.failures)
    }

    /// Breaks the page first if `height` would not fit. No-op inside a group.
    pub fn ensure_space(&mut self, height: f32) {
        if self.holding {
            return;
        }
        if let Some(brk) = self.cursor.ensure_space(height) {
            self.surface.add_page();
            debug_assert_eq!(brk.page_index + 1, self.surface.page_count());
        }
    }

    pub fn break_page(&mut self) {
        let brk = self.cursor.break_page();
        self.surface.add_page();
        debug_assert_eq!(brk.page_index + 1, self.surface.page_count());
    }

    /// Vertical whitespace. Outside a group it is dropped when it would run
    /// past the bottom margin; the next block breaks the page anyway.
    pub fn gap(&mut self, height: f32) {
        if self.holding || !self.cursor.will_overflow(height) {
            self.cursor.advance(height);
        }
    }

    /// Lays out several blocks as one unit of `height`.
    ///
    /// The unit is gated once; blocks placed by `build` never break the page,
    /// even when the unit is taller than a page. Afterwards the cursor sits at
    /// least `height` below the unit's top. Groups nest. Returns the height
    /// consumed.
    pub fn group<F>(&mut self, height: f32, build: F) -> f32
    where
        F: FnOnce(&mut Self),
    {
        self.ensure_space(height);
        let top = self.cursor.current_y();
        let held = std::mem::replace(&mut self.holding, true);
        build(self);
        self.holding = held;

        let used = self.cursor.current_y() - top;
        if used < height {
            self.cursor.advance(height - used);
        }
        used.max(height)
    }

    /// Places one block of known `height` at the cursor.
    ///
    /// `draw` receives the block's top y. On success the cursor advances by
    /// `height`; on failure the failure is recorded and the cursor advances
    /// by `placeholder` instead. Returns the height consumed.
    pub fn block<F>(&mut self, name: &str, height: f32, placeholder: f32, draw: F) -> f32
    where
        F: FnOnce(&mut S, f32) -> Result<(), BlockError>,
    {
        self.ensure_space(height);
        let top = self.cursor.current_y();
        match draw(&mut self.surface, top) {
            Ok(()) => {
                self.cursor.advance(height);
                height
            }
            Err(e) => {
                self.record_failure(name, &e);
                self.cursor.advance(placeholder);
                placeholder
            }
        }
    }

    /// Draws outside the flow (e.g. a footer band). The cursor does not move.
    pub fn pinned<F>(&mut self, name: &str, draw: F)
    where
        F: FnOnce(&mut S) -> Result<(), BlockError>,
    {
        if let Err(e) = draw(&mut self.surface) {
            self.record_failure(name, &e);
        }
    }

    fn record_failure(&mut self, name: &str, error: &BlockError) {
        tracing::warn!(
            block = name,
            page = self.cursor.page_index(),
            "Block render failed, using placeholder: {error}"
        );
        self.failures.push(BlockFailure {
            block: name.to_string(),
            page: self.cursor.page_index(),
            reason: error.to_string(),
        });
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    /// Single line of text anchored at `x`. Height is one line.
    pub fn text_line(&mut self, text: &str, x: f32, style: TextStyle) -> f32 {
        let height = line_height(style.size);
        self.block("text", height, height, |surface, top| {
            surface.text(text, x, baseline(top, style.size), &style)
        })
    }

    /// Bold heading at the left margin.
    pub fn heading(&mut self, text: &str, size: f32) -> f32 {
        let x = self.geometry().margin;
        self.text_line(text, x, TextStyle::bold(size))
    }

    /// Word-wrapped paragraph; `max_width` defaults to the content width.
    /// Height is `lines × line_height`.
    pub fn paragraph(&mut self, text: &str, x: f32, max_width: Option<f32>, style: TextStyle) -> f32 {
        let max_width = max_width.unwrap_or_else(|| self.geometry().content_width());
        let lines = wrap_text(text, max_width, style.size, style.weight);
        let line_h = line_height(style.size);
        let height = lines.len() as f32 * line_h;
        self.block("paragraph", height, height, |surface, top| {
            for (i, line) in lines.iter().enumerate() {
                surface.text(line, x, baseline(top + i as f32 * line_h, style.size), &style)?;
            }
            Ok(())
        })
    }

    /// Raster image stretched to the slot at the left margin. An undecodable
    /// payload leaves [`IMAGE_PLACEHOLDER_HEIGHT`] of blank space.
    pub fn image(&mut self, name: &str, image: &ImageData, slot: ImageSlot) -> f32 {
        let x = self.geometry().margin;
        self.block(name, slot.height, IMAGE_PLACEHOLDER_HEIGHT, |surface, top| {
            let bytes = image
                .decode()
                .map_err(|e| BlockError::ImageEncoding(e.to_string()))?;
            surface.image(&bytes, Rect::new(x, top, slot.width, slot.height))
        })
    }

    /// Full-width filled rectangle.
    pub fn filled_rect(&mut self, height: f32, color: Rgb) -> f32 {
        let geometry = self.geometry();
        self.block("rect", height, height, |surface, top| {
            surface.fill_rect(
                Rect::new(geometry.margin, top, geometry.content_width(), height),
                color,
            )
        })
    }

    /// Section header: gray band with a bold title.
    pub fn section_band(&mut self, title: &str) -> f32 {
        let x = self.geometry().margin + INSET;
        self.group(SECTION_BAND_HEIGHT, |canvas| {
            let top = canvas.cursor.current_y();
            canvas.filled_rect(SECTION_BAND_HEIGHT, Rgb::BAND_GRAY);
            canvas.pinned("section title", |surface| {
                surface.text(title, x, top + 7.0, &TextStyle::bold(14.0))
            });
        })
    }

    /// Severity badge at the current row, `right_inset` in from the right
    /// margin. Does not advance, so the next block shares its row.
    pub fn badge(&mut self, severity: Severity, right_inset: f32) {
        let geometry = self.geometry();
        let x = geometry.width - geometry.margin - right_inset - BADGE_WIDTH;
        let top = self.cursor.current_y();
        self.pinned("badge", |surface| draw_severity_badge(surface, x, top, severity));
    }

    /// Label left, value right, same baseline.
    pub fn key_value_row(&mut self, label: &str, value: &str, size: f32) -> f32 {
        let geometry = self.geometry();
        self.block("table row", TABLE_ROW_HEIGHT, TABLE_ROW_HEIGHT, |surface, top| {
            let base = top + 5.0;
            surface.text(label, geometry.margin + INSET, base, &TextStyle::regular(size))?;
            surface.text(
                value,
                geometry.width - geometry.margin - INSET,
                base,
                &TextStyle::regular(size).align(Align::Right),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::surface::tests::png_bytes;
    use crate::report::surface::{DrawOp, RecordingSurface};

    fn small_page() -> PageGeometry {
        PageGeometry {
            width: 100.0,
            height: 100.0,
            margin: 10.0,
            top_margin: 10.0,
            bottom_margin: 10.0,
        }
    }

    fn canvas() -> Canvas<RecordingSurface> {
        Canvas::new(RecordingSurface::new(), small_page())
    }

    #[test]
    fn text_line_advances_by_line_height() {
        let mut c = canvas();
        let h = c.text_line("hello", 10.0, TextStyle::regular(10.0));
        assert_eq!(h, 5.0);
        assert_eq!(c.cursor().current_y(), 15.0);
    }

    #[test]
    fn paragraph_height_is_lines_times_leading() {
        let mut c = canvas();
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let h = c.paragraph(text, 10.0, Some(30.0), TextStyle::regular(10.0));
        let lines = c.surface().texts().len();
        assert!(lines > 1);
        assert_eq!(h, lines as f32 * 5.0);
    }

    #[test]
    fn block_breaks_page_before_drawing() {
        let mut c = canvas();
        c.gap(70.0); // y = 80, content bottom = 90
        c.filled_rect(15.0, Rgb::RED);
        assert_eq!(c.surface().page_count(), 2);
        let op = &c.surface().ops()[0];
        assert_eq!(op.page, 1);
        assert!(matches!(op.op, DrawOp::FillRect { rect, .. } if rect.y == 10.0));
        assert_eq!(c.cursor().current_y(), 25.0);
    }

    #[test]
    fn gap_dropped_at_page_bottom() {
        let mut c = canvas();
        c.gap(75.0);
        c.gap(10.0);
        assert_eq!(c.cursor().current_y(), 85.0);
    }

    #[test]
    fn good_image_uses_slot() {
        let mut c = canvas();
        let img = ImageData::from_bytes("image/png", &png_bytes(3, 3));
        let h = c.image("scan", &img, ImageSlot { width: 40.0, height: 30.0 });
        assert_eq!(h, 30.0);
        assert!(c.failures().is_empty());
        assert!(matches!(
            c.surface().ops()[0].op,
            DrawOp::Image { rect, .. } if rect.width == 40.0 && rect.height == 30.0
        ));
    }

    #[test]
    fn bad_base64_image_becomes_placeholder() {
        let mut c = canvas();
        let img = ImageData::jpeg_base64("%%%not-base64%%%");
        let h = c.image("segmented image", &img, ImageSlot::default());
        assert_eq!(h, IMAGE_PLACEHOLDER_HEIGHT);
        assert_eq!(c.cursor().current_y(), 20.0);
        assert_eq!(c.failures().len(), 1);
        assert_eq!(c.failures()[0].block, "segmented image");
        assert!(c.failures()[0].reason.contains("base64"));
    }

    #[test]
    fn undecodable_image_becomes_placeholder() {
        let mut c = canvas();
        let img = ImageData::from_bytes("image/jpeg", b"not a jpeg");
        c.image("original image", &img, ImageSlot::default());
        assert_eq!(c.failures().len(), 1);
        assert!(c.surface().ops().is_empty());
    }

    #[test]
    fn failed_text_block_keeps_going() {
        let mut c = Canvas::new(RecordingSurface::new().rejecting_text("bad"), small_page());
        c.text_line("bad line", 10.0, TextStyle::regular(10.0));
        c.text_line("good line", 10.0, TextStyle::regular(10.0));
        assert_eq!(c.failures().len(), 1);
        assert_eq!(c.surface().texts(), vec![(0, "good line")]);
        assert_eq!(c.cursor().current_y(), 20.0);
    }

    #[test]
    fn key_value_row_right_aligns_value() {
        let mut c = canvas();
        c.key_value_row("Class 1:", "12.30%", 11.0);
        let ops = c.surface().ops();
        let (label_x, value) = match (&ops[0].op, &ops[1].op) {
            (DrawOp::Text { x: lx, .. }, DrawOp::Text { x, baseline, style, text }) => {
                assert_eq!(style.align, Align::Right);
                assert_eq!(text, "12.30%");
                (*lx, (*x, *baseline))
            }
            _ => panic!("expected two text ops"),
        };
        assert_eq!(label_x, 15.0);
        assert_eq!(value.0, 85.0);
        match &ops[0].op {
            DrawOp::Text { baseline, .. } => assert_eq!(*baseline, value.1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn badge_colors_by_severity() {
        assert_eq!(severity_color(Severity::High), Rgb::RED);
        assert_eq!(severity_color(Severity::Moderate), Rgb::AMBER);
        assert_eq!(severity_color(Severity::None), Rgb::GREEN);

        let mut c = canvas();
        c.gap(5.0);
        c.badge(Severity::Moderate, 0.0);
        assert!(matches!(
            c.surface().ops()[0].op,
            DrawOp::RoundedRect { color, rect } if color == Rgb::AMBER && rect.x == 60.0 && rect.y == 15.0
        ));
        assert!(c.surface().find_text("Moderate").is_some());
        // Shares the row with whatever comes next.
        assert_eq!(c.cursor().current_y(), 15.0);
    }

    #[test]
    fn section_band_is_filled_rect_with_title() {
        let mut c = canvas();
        let h = c.section_band("Diagnostic Findings");
        assert_eq!(h, SECTION_BAND_HEIGHT);
        assert_eq!(c.cursor().current_y(), 10.0 + SECTION_BAND_HEIGHT);
        let ops = c.surface().ops();
        assert!(matches!(
            ops[0].op,
            DrawOp::FillRect { rect, color } if color == Rgb::BAND_GRAY && rect.y == 10.0 && rect.width == 80.0
        ));
        assert!(matches!(&ops[1].op, DrawOp::Text { text, baseline, .. } if text == "Diagnostic Findings" && *baseline == 17.0));
    }

    #[test]
    fn group_is_gated_once_and_padded() {
        let mut c = canvas();
        c.gap(50.0); // y = 60
        let h = c.group(25.0, |c| {
            c.text_line("a", 15.0, TextStyle::regular(10.0));
            c.text_line("b", 15.0, TextStyle::regular(10.0));
        });
        assert_eq!(h, 25.0);
        assert_eq!(c.surface().page_count(), 1);
        assert_eq!(c.cursor().current_y(), 85.0);

        // 85 + 20 > 90: the whole group moves to the next page.
        c.group(20.0, |c| {
            c.text_line("c", 15.0, TextStyle::regular(10.0));
        });
        assert_eq!(c.surface().page_count(), 2);
        assert_eq!(c.surface().find_text("c").unwrap().page, 1);
        assert_eq!(c.cursor().current_y(), 30.0);
    }

    #[test]
    fn oversized_group_breaks_once_and_stays_together() {
        let mut c = canvas();
        c.text_line("before", 10.0, TextStyle::regular(10.0));
        c.group(200.0, |c| {
            c.section_band("Band");
            c.group(150.0, |c| {
                c.paragraph(&"word ".repeat(400), 15.0, Some(70.0), TextStyle::regular(10.0));
            });
        });
        assert_eq!(c.surface().page_count(), 2);
        let pages: Vec<usize> = c.surface().ops().iter().skip(1).map(|op| op.page).collect();
        assert!(pages.iter().all(|&p| p == 1), "{pages:?}");
        // Breaks resume once the group is closed.
        c.text_line("after", 10.0, TextStyle::regular(10.0));
        assert_eq!(c.surface().page_count(), 3);
    }

    #[test]
    fn pinned_does_not_move_cursor() {
        let mut c = canvas();
        c.pinned("footer", |s| s.line((10.0, 95.0), (90.0, 95.0), Rgb::BRAND_BLUE, 0.5));
        assert_eq!(c.cursor().current_y(), 10.0);
        assert_eq!(c.surface().ops().len(), 1);
    }
}
