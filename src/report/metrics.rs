//! Text measurement for the built-in Helvetica faces.
//!
//! Widths come from the standard Helvetica AFM (1/1000 em). Bold is
//! approximated from the regular widths, which is close enough for wrapping
//! and alignment.

use super::surface::FontWeight;

pub const PT_TO_MM: f32 = 0.352_778;

/// Leading in document units per point of font size (10pt → 5 units).
pub const LINE_HEIGHT_PER_PT: f32 = 0.5;

const BOLD_WIDTH_FACTOR: f32 = 1.06;
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica advance widths for ASCII 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn char_width(c: char) -> u16 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of `text` in document units.
pub fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    let factor = match weight {
        FontWeight::Bold => BOLD_WIDTH_FACTOR,
        FontWeight::Regular | FontWeight::Italic => 1.0,
    };
    units as f32 / 1000.0 * size * PT_TO_MM * factor
}

pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_PER_PT
}

/// Greedy word wrap to `max_width`. A single word wider than the line is
/// kept whole. Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, max_width: f32, size: f32, weight: FontWeight) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() {
            let candidate_width = text_width(&current, size, weight)
                + text_width(" ", size, weight)
                + text_width(word, size, weight);
            if candidate_width > max_width {
                lines.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
