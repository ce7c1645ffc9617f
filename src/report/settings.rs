//! Tunable report constants.
//!
//! Defaults reproduce the established report layout: A4 in millimetres,
//! 80×60 image slots, findings triggered above 5% and rated High above 15%.
//! All of it can be overridden from a JSON settings file.

use serde::{Deserialize, Serialize};

/// Fixed-size page and its margins, in document units (mm for PDF output).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Left/right margin.
    pub margin: f32,
    /// Where `current_y` restarts on a fresh page.
    pub top_margin: f32,
    /// Flow content never extends below `height - bottom_margin`.
    /// The band underneath holds the footer.
    pub bottom_margin: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 15.0,
            top_margin: 20.0,
            bottom_margin: 35.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y that flow content may reach.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.bottom_margin
    }

    pub fn usable_height(&self) -> f32 {
        self.content_bottom() - self.top_margin
    }
}

/// Percentage thresholds for the severity tiers (both strict `>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub trigger: f64,
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            trigger: 5.0,
            high: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSlot {
    pub width: f32,
    pub height: f32,
}

impl Default for ImageSlot {
    fn default() -> Self {
        Self {
            width: 80.0,
            height: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub page: PageGeometry,
    pub image_slot: ImageSlot,
    pub thresholds: Thresholds,
    /// Minimum height of one finding box; grows if the description wraps further.
    pub finding_box_height: f32,
    /// Vertical gap after each finding box.
    pub finding_gap: f32,
}

impl ReportSettings {
    pub const DEFAULT_FINDING_BOX_HEIGHT: f32 = 35.0;
    pub const DEFAULT_FINDING_GAP: f32 = 5.0;
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            image_slot: ImageSlot::default(),
            thresholds: Thresholds::default(),
            finding_box_height: Self::DEFAULT_FINDING_BOX_HEIGHT,
            finding_gap: Self::DEFAULT_FINDING_GAP,
        }
    }
}
