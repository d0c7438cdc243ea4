//! Handler interface between the traversal engine and the censoring policy.
//!
//! The engine never decides what to censor. It resolves every text run it
//! encounters, in document order, and asks the handler; the handler may
//! keep whatever match state it needs (regex search progress, per-page
//! accumulators) as long as it relies on being called in order.

use crate::geom::{Matrix, Rect};
use lopdf::Document;

/// RGB color with components in 0..=1, as written into content streams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const DARK_GRAY: Self = Self::new(0.25, 0.25, 0.25);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#RRGGBB` (or `RRGGBB`) hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim_start_matches('#');
        // Byte-indexed slicing below requires single-byte characters.
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        ))
    }
}

/// A contiguous rendered span of characters with resolved position and font.
///
/// One show-text instruction yields zero or more runs; `TJ` splits on its
/// positioning adjustments.
#[derive(Debug, Clone)]
pub struct TextRun {
    /// Decoded text of the run.
    pub text: String,
    /// Resource name of the active font (e.g. "F1"), if any was set.
    pub font: Option<String>,
    /// Font size in text space units.
    pub size: f64,
    /// Page-space bounds of the run.
    pub bounds: Rect,
    /// Text rendering matrix at the start of the run (text matrix composed
    /// with the CTM).
    pub matrix: Matrix,
}

/// Censoring policy and lifecycle callbacks.
///
/// The traversal engine notifies the handler of document and page
/// boundaries and consults it once per text run, in document order. All
/// lifecycle methods default to no-ops so a policy only implements what it
/// needs.
pub trait CensorHandler {
    /// Decide whether the draw instruction rendering this run should be
    /// suppressed. Called exactly once per run as it is encountered.
    fn should_censor(&mut self, run: &TextRun) -> bool;

    /// The document is about to be traversed.
    fn begin_document(&mut self, _doc: &Document) {}

    /// A page is about to be traversed. `page_no` is 1-based.
    fn begin_page(&mut self, _page_no: u32, _page_count: u32) {}

    /// The page traversal finished and its rewritten content is committed.
    fn end_page(&mut self, _page_no: u32) {}

    /// The document traversal finished.
    fn end_document(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        let c = Color::from_hex("#FF0000").unwrap();
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex("000000").unwrap(), Color::BLACK);
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("zzzzzz").is_none());
    }

    #[test]
    fn non_ascii_input_is_rejected_without_panicking() {
        // Six bytes, but the second character spans two of them.
        assert!(Color::from_hex("aé123").is_none());
        assert!(Color::from_hex("#aé123").is_none());
    }
}
