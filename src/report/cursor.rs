//! Vertical write position within a fixed-size page.
//!
//! Coordinates run top-down: `current_y` starts at the top margin and grows
//! as blocks are placed. The cursor knows nothing about drawing; callers
//! translate a returned [`PageBreak`] into a new page on their surface.

use super::settings::PageGeometry;

/// A page break the cursor performed. The caller must append the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the surface must receive a new page"]
pub struct PageBreak {
    /// Index of the page that was just started.
    pub page_index: usize,
}

#[derive(Debug, Clone)]
pub struct LayoutCursor {
    current_y: f32,
    page_index: usize,
    geometry: PageGeometry,
}

impl LayoutCursor {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            current_y: geometry.top_margin,
            page_index: 0,
            geometry,
        }
    }

    pub fn current_y(&self) -> f32 {
        self.current_y
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.page_index + 1
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Space left above the bottom margin on the current page.
    pub fn remaining(&self) -> f32 {
        self.geometry.content_bottom() - self.current_y
    }

    /// Nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.current_y <= self.geometry.top_margin
    }

    /// Moves down by `height`. Does not check for overflow.
    pub fn advance(&mut self, height: f32) {
        debug_assert!(height >= 0.0, "cursor cannot move up: {height}");
        self.current_y += height.max(0.0);
    }

    pub fn will_overflow(&self, height: f32) -> bool {
        self.current_y + height > self.geometry.content_bottom()
    }

    /// Starts the next page and resets `current_y` to the top margin.
    pub fn break_page(&mut self) -> PageBreak {
        self.page_index += 1;
        self.current_y = self.geometry.top_margin;
        tracing::debug!(page = self.page_index, "Page break");
        PageBreak {
            page_index: self.page_index,
        }
    }

    /// Breaks the page if a block of `height` would cross the bottom margin.
    ///
    /// A block taller than a whole page is placed on a page of its own and
    /// allowed to overflow: the cursor breaks at most once per call, and
    /// never when the current page is still empty.
    pub fn ensure_space(&mut self, height: f32) -> Option<PageBreak> {
        if !self.will_overflow(height) {
            return None;
        }
        if self.at_page_top() {
            tracing::warn!(
                height,
                usable = self.geometry.usable_height(),
                "Block taller than a page; allowing overflow"
            );
            return None;
        }
        Some(self.break_page())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PageGeometry {
        PageGeometry {
            width: 100.0,
            height: 200.0,
            margin: 10.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
        }
    }

    #[test]
    fn starts_at_top_margin() {
        let cursor = LayoutCursor::new(geometry());
        assert_eq!(cursor.current_y(), 20.0);
        assert_eq!(cursor.page_index(), 0);
        assert_eq!(cursor.remaining(), 160.0);
        assert!(cursor.at_page_top());
    }

    #[test]
    fn advance_moves_down() {
        let mut cursor = LayoutCursor::new(geometry());
        cursor.advance(15.5);
        assert_eq!(cursor.current_y(), 35.5);
        assert!(!cursor.at_page_top());
    }

    #[test]
    fn will_overflow_is_strict() {
        let mut cursor = LayoutCursor::new(geometry());
        cursor.advance(100.0);
        assert!(!cursor.will_overflow(60.0)); // lands exactly on the bottom margin
        assert!(cursor.will_overflow(60.5));
    }

    #[test]
    fn break_page_resets_and_counts() {
        let mut cursor = LayoutCursor::new(geometry());
        cursor.advance(90.0);
        let brk = cursor.break_page();
        assert_eq!(brk.page_index, 1);
        assert_eq!(cursor.current_y(), 20.0);
        assert_eq!(cursor.page_count(), 2);
    }

    #[test]
    fn ensure_space_breaks_only_when_needed() {
        let mut cursor = LayoutCursor::new(geometry());
        assert!(cursor.ensure_space(50.0).is_none());
        cursor.advance(150.0);
        assert_eq!(cursor.ensure_space(50.0), Some(PageBreak { page_index: 1 }));
        assert_eq!(cursor.current_y(), 20.0);
    }

    #[test]
    fn oversized_block_breaks_once_then_overflows() {
        let mut cursor = LayoutCursor::new(geometry());
        cursor.advance(10.0);
        assert!(cursor.ensure_space(500.0).is_some());
        // Fresh page: no second break, the block is allowed through.
        assert!(cursor.ensure_space(500.0).is_none());
        cursor.advance(500.0);
        assert_eq!(cursor.page_count(), 2);
        assert!(cursor.ensure_space(1.0).is_some());
        assert_eq!(cursor.page_count(), 3);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn geometry() -> PageGeometry {
        PageGeometry {
            width: 100.0,
            height: 200.0,
            margin: 10.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
        }
    }

    /// Reference page count: greedy packing, oversized blocks alone on a page.
    fn expected_pages(heights: &[f32], usable: f32) -> usize {
        let mut pages = 1;
        let mut used = 0.0f32;
        for &h in heights {
            if used + h > usable && used > 0.0 {
                pages += 1;
                used = 0.0;
            }
            used += h;
        }
        pages
    }

    proptest! {
        /// Property: a gated block that fits on a page never crosses the bottom margin
        #[test]
        fn gated_blocks_never_overlap(
            raw in prop::collection::vec(1u16..120, 1..40),
            oversized_at in 0usize..40,
        ) {
            let mut heights: Vec<f32> = raw.into_iter().map(f32::from).collect();
            let at = oversized_at.min(heights.len());
            heights.insert(at, 400.0);

            let geo = geometry();
            let mut cursor = LayoutCursor::new(geo);
            for &h in &heights {
                let _ = cursor.ensure_space(h);
                let top = cursor.current_y();
                cursor.advance(h);
                if h <= geo.usable_height() {
                    prop_assert!(cursor.current_y() <= geo.content_bottom());
                } else {
                    prop_assert_eq!(top, geo.top_margin);
                }
            }
            prop_assert_eq!(cursor.page_count(), expected_pages(&heights, geo.usable_height()));
        }
    }
}
