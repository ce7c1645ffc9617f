//! Report composition: a straight-line state machine over report sections.
//!
//! `Header → Metadata → OriginalImage → SegmentedImage → Findings →
//! DistributionTable → ProcessingInfo → Footer`. Each section is gated on
//! the space it needs; the findings section gates every finding box
//! separately so no box is split across pages. The document is finalized
//! once, after the footer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{format_percentage, AnalysisResult, Finding, ImageData};

use super::blocks::{BlockFailure, Canvas, INSET, SECTION_BAND_HEIGHT, TABLE_ROW_HEIGHT};
use super::classify::classify_with;
use super::metrics::{line_height, wrap_text};
use super::pdf::PdfSurface;
use super::settings::ReportSettings;
use super::surface::{Align, FontWeight, Rect, Rgb, Surface, TextStyle};
use super::ReportError;

pub const REPORT_TITLE: &str = "DentiMap";
pub const REPORT_SUBTITLE: &str = "AI-Powered Dental Analysis Report";
const HEADER_HEIGHT: f32 = 20.0;
const HEADER_GAP: f32 = 10.0;
const SECTION_GAP: f32 = 5.0;
const HEADING_SIZE: f32 = 14.0;
const FINDING_TITLE_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 11.0;
const INFO_LINE_HEIGHT: f32 = 6.0;
/// Bottom band of the last page reserved for credits.
pub const FOOTER_HEIGHT: f32 = 30.0;
const DISCLAIMER: &str = "This analysis is for informational purposes only. Please consult a dental professional for diagnosis.";

/// Report sections in composition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Metadata,
    OriginalImage,
    SegmentedImage,
    Findings,
    DistributionTable,
    ProcessingInfo,
    Footer,
}

impl Section {
    pub const FIRST: Section = Section::Header;

    pub fn next(self) -> Option<Section> {
        match self {
            Self::Header => Some(Self::Metadata),
            Self::Metadata => Some(Self::OriginalImage),
            Self::OriginalImage => Some(Self::SegmentedImage),
            Self::SegmentedImage => Some(Self::Findings),
            Self::Findings => Some(Self::DistributionTable),
            Self::DistributionTable => Some(Self::ProcessingInfo),
            Self::ProcessingInfo => Some(Self::Footer),
            Self::Footer => None,
        }
    }
}

/// The finalized report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact {
    pub file_name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub findings: Vec<Finding>,
    /// Blocks replaced by placeholders; empty for a clean render.
    pub degraded_blocks: Vec<BlockFailure>,
}

impl ReportArtifact {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_blocks.is_empty()
    }

    /// Writes the artifact under `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "Report saved");
        Ok(path)
    }
}

/// `DentiMap_Analysis_2026-10-17.pdf`
pub fn report_file_name(generated_at: &DateTime<Local>) -> String {
    format!("DentiMap_Analysis_{}.pdf", generated_at.format("%Y-%m-%d"))
}

/// `"class_1"` → `"Class 1"`. Only the first underscore becomes a space.
pub fn class_label(key: &str) -> String {
    let spaced = key.replacen('_', " ", 1);
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Composes a PDF report with default settings, stamped now.
pub fn compose_report(
    result: &AnalysisResult,
    original_image: &ImageData,
) -> Result<ReportArtifact, ReportError> {
    compose_report_with(result, original_image, &ReportSettings::default(), Local::now())
}

pub fn compose_report_with(
    result: &AnalysisResult,
    original_image: &ImageData,
    settings: &ReportSettings,
    generated_at: DateTime<Local>,
) -> Result<ReportArtifact, ReportError> {
    let surface = PdfSurface::new("DentiMap Analysis Report", &settings.page)?;
    ReportComposer::new(surface, *settings, generated_at).compose(result, original_image)
}

/// Owns one document surface and its cursor for a single report build.
pub struct ReportComposer<S: Surface> {
    canvas: Canvas<S>,
    settings: ReportSettings,
    generated_at: DateTime<Local>,
}

impl<S: Surface> ReportComposer<S> {
    pub fn new(surface: S, settings: ReportSettings, generated_at: DateTime<Local>) -> Self {
        Self {
            canvas: Canvas::new(surface, settings.page),
            settings,
            generated_at,
        }
    }

    /// Classifies the distribution and lays out the full report.
    pub fn compose(
        self,
        result: &AnalysisResult,
        original_image: &ImageData,
    ) -> Result<ReportArtifact, ReportError> {
        let findings = classify_with(&result.class_distribution, &self.settings.thresholds);
        self.compose_with_findings(result, original_image, findings)
    }

    /// Lays out the report for an already-computed findings list.
    pub fn compose_with_findings(
        mut self,
        result: &AnalysisResult,
        original_image: &ImageData,
        findings: Vec<Finding>,
    ) -> Result<ReportArtifact, ReportError> {
        let mut state = Some(Section::FIRST);
        while let Some(section) = state {
            self.render_section(section, result, original_image, &findings);
            state = section.next();
        }

        let (surface, cursor, degraded_blocks) = self.canvas.into_parts();
        let page_count = cursor.page_count();
        let bytes = surface.finish()?;

        tracing::info!(
            pages = page_count,
            findings = findings.len(),
            degraded = degraded_blocks.len(),
            "Report composed"
        );

        Ok(ReportArtifact {
            file_name: report_file_name(&self.generated_at),
            bytes,
            page_count,
            findings,
            degraded_blocks,
        })
    }

    fn render_section(
        &mut self,
        section: Section,
        result: &AnalysisResult,
        original_image: &ImageData,
        findings: &[Finding],
    ) {
        match section {
            Section::Header => self.header(),
            Section::Metadata => self.metadata(),
            Section::OriginalImage => self.image_section("Original Scan", "original image", original_image, 10.0),
            Section::SegmentedImage => self.image_section(
                "AI Segmentation Result",
                "segmented image",
                &result.segmented_image,
                15.0,
            ),
            Section::Findings => self.findings(findings),
            Section::DistributionTable => self.distribution_table(result),
            Section::ProcessingInfo => self.processing_info(result),
            Section::Footer => self.footer(),
        }
    }

    fn header(&mut self) {
        let page = self.settings.page;
        self.canvas.block("header", HEADER_HEIGHT, HEADER_HEIGHT, |surface, top| {
            // Full-bleed band from the page edge down to the end of the block.
            surface.fill_rect(Rect::new(0.0, 0.0, page.width, top + HEADER_HEIGHT), Rgb::BRAND_BLUE)?;
            let center = page.width / 2.0;
            surface.text(
                REPORT_TITLE,
                center,
                top,
                &TextStyle::bold(24.0).color(Rgb::WHITE).align(Align::Center),
            )?;
            surface.text(
                REPORT_SUBTITLE,
                center,
                top + 10.0,
                &TextStyle::regular(12.0).color(Rgb::WHITE).align(Align::Center),
            )
        });
        self.canvas.gap(HEADER_GAP);
    }

    fn metadata(&mut self) {
        let stamp = self.generated_at.format("%B %-d, %Y, %I:%M %p");
        let margin = self.settings.page.margin;
        self.canvas.text_line(
            &format!("Report Generated: {stamp}"),
            margin,
            TextStyle::regular(BODY_SIZE),
        );
        self.canvas.gap(10.0);
    }

    fn image_section(&mut self, title: &str, block: &str, image: &ImageData, gap_after: f32) {
        let slot = self.settings.image_slot;
        // Keep the caption with its image.
        self.canvas.ensure_space(line_height(HEADING_SIZE) + 1.0 + slot.height);
        self.canvas.heading(title, HEADING_SIZE);
        self.canvas.gap(1.0);
        self.canvas.image(block, image, slot);
        self.canvas.gap(gap_after);
    }

    fn findings(&mut self, findings: &[Finding]) {
        let settings = self.settings;
        let lead = SECTION_BAND_HEIGHT
            + SECTION_GAP
            + findings.first().map_or(0.0, |f| finding_box_height(&settings, f));

        // Band and first box are one unit, so the band is never orphaned.
        self.canvas.group(lead, |canvas| {
            canvas.section_band("Diagnostic Findings");
            canvas.gap(SECTION_GAP);
            if let Some(first) = findings.first() {
                finding_box(canvas, &settings, 0, first);
            }
        });
        if !findings.is_empty() {
            self.canvas.gap(settings.finding_gap);
        }

        for (index, finding) in findings.iter().enumerate().skip(1) {
            finding_box(&mut self.canvas, &settings, index, finding);
            self.canvas.gap(settings.finding_gap);
        }
    }

    fn distribution_table(&mut self, result: &AnalysisResult) {
        self.canvas.gap(SECTION_GAP);
        self.canvas.ensure_space(SECTION_BAND_HEIGHT + SECTION_GAP + TABLE_ROW_HEIGHT);
        self.canvas.section_band("Detailed Segmentation Analysis");
        self.canvas.gap(SECTION_GAP);

        for (key, share) in result.class_distribution.iter() {
            self.canvas.key_value_row(
                &format!("{}:", class_label(key)),
                &format_percentage(share.percentage),
                TABLE_SIZE,
            );
        }
        self.canvas.gap(10.0);
    }

    fn processing_info(&mut self, result: &AnalysisResult) {
        let margin = self.settings.page.margin + INSET;
        let timing = format!("Analysis completed in {} seconds", result.inference_time_seconds);
        let dimensions = format!("Image dimensions: {} pixels", result.image_dimensions());
        let style = TextStyle::italic(BODY_SIZE);

        self.canvas.block("processing info", 2.0 * INFO_LINE_HEIGHT, 2.0 * INFO_LINE_HEIGHT, |surface, top| {
            surface.text(&timing, margin, top + 4.0, &style)?;
            surface.text(&dimensions, margin, top + 4.0 + INFO_LINE_HEIGHT, &style)
        });
    }

    /// Credits pinned to the bottom band of the last page.
    fn footer(&mut self) {
        let page = self.settings.page;
        let footer_top = page.height - FOOTER_HEIGHT;
        if self.canvas.cursor().current_y() > footer_top {
            self.canvas.break_page();
        }

        let center = page.width / 2.0;
        self.canvas.pinned("footer", |surface| {
            surface.line(
                (page.margin, footer_top),
                (page.width - page.margin, footer_top),
                Rgb::BRAND_BLUE,
                0.5,
            )?;
            let centered = |style: TextStyle| style.align(Align::Center);
            surface.text("Model Information", center, footer_top + 7.0, &centered(TextStyle::bold(10.0)))?;
            surface.text("Powered by DentiMap AI", center, footer_top + 13.0, &centered(TextStyle::regular(9.0)))?;
            surface.text(
                "Model Creator: Dr. Debesh Jha and Team",
                center,
                footer_top + 18.0,
                &centered(TextStyle::regular(9.0)),
            )?;
            surface.text(DISCLAIMER, center, footer_top + 23.0, &centered(TextStyle::italic(8.0)))
        });
    }
}

fn description_width(settings: &ReportSettings) -> f32 {
    settings.page.content_width() - 4.0 * INSET
}

/// Box height: the configured minimum, grown to fit a long description.
fn finding_box_height(settings: &ReportSettings, finding: &Finding) -> f32 {
    let lines = wrap_text(
        &finding.description,
        description_width(settings),
        BODY_SIZE,
        FontWeight::Regular,
    )
    .len() as f32;
    let content = 15.0 + lines * line_height(BODY_SIZE) + 10.0;
    content.max(settings.finding_box_height)
}

/// Bordered box: numbered title with the severity badge on its row, the
/// wrapped description, then the confidence line.
fn finding_box<S: Surface>(
    canvas: &mut Canvas<S>,
    settings: &ReportSettings,
    index: usize,
    finding: &Finding,
) {
    let page = settings.page;
    let box_height = finding_box_height(settings, finding);
    let text_x = page.margin + INSET;

    canvas.group(box_height, |canvas| {
        let top = canvas.cursor().current_y();
        canvas.pinned("finding border", |surface| {
            surface.stroke_rect(
                Rect::new(page.margin, top, page.content_width(), box_height),
                Rgb::BORDER_GRAY,
                0.5,
            )
        });
        canvas.gap(2.0);
        canvas.badge(finding.severity, INSET);
        canvas.text_line(
            &format!("{}. {}", index + 1, finding.name),
            text_x,
            TextStyle::bold(FINDING_TITLE_SIZE),
        );
        canvas.gap(4.0);
        canvas.paragraph(
            &finding.description,
            text_x,
            Some(description_width(settings)),
            TextStyle::regular(BODY_SIZE),
        );
        canvas.gap(3.0);
        canvas.text_line(&finding.confidence_label(), text_x, TextStyle::bold(BODY_SIZE));
    });
}
