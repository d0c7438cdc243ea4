//! The production censoring policy.
//!
//! A `Censor` owns an ordered list of regex expressions with optional
//! colors, decides per text run whether it gets suppressed, and records
//! the page-space bounds of everything it suppressed so the host can draw
//! cover bars afterwards.

use std::collections::BTreeMap;

use lopdf::{Document, Object};
use regex::Regex;
use tracing::debug;

use crate::draw::{CoverMark, MarkStyle};
use crate::error::{Error, Result};
use crate::geom::Rect;
use crate::handler::{CensorHandler, Color, TextRun};

/// The color text is censored in when its expression carries none.
pub const DEFAULT_CENSOR_COLOR: Color = Color::BLACK;

/// Censoring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Censor every run that matches an expression.
    #[default]
    All,
    /// Censor matching runs only inside highlighted (marked) areas.
    Marked,
    /// Censor matching runs only outside highlighted (marked) areas.
    Unmarked,
}

/// A regex/color pair identifying what to censor and with what color.
#[derive(Debug, Clone)]
pub struct Expression {
    pattern: Regex,
    color: Option<Color>,
}

impl Expression {
    pub fn new(pattern: &str, color: Option<Color>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::InvalidExpression {
            pattern: pattern.to_string(),
            msg: e.to_string(),
        })?;
        Ok(Self { pattern, color })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn color(&self) -> Color {
        self.color.unwrap_or(DEFAULT_CENSOR_COLOR)
    }
}

/// Regex-driven censoring policy with per-page cover-bar accumulation.
pub struct Censor {
    expressions: Vec<Expression>,
    mode: Mode,
    /// Highlight-annotation rectangles per 1-based page number, collected
    /// at begin-document when the mode needs them.
    marked_areas: BTreeMap<u32, Vec<Rect>>,
    /// Cover marks for suppressed runs, per 1-based page number.
    marks: BTreeMap<u32, Vec<CoverMark>>,
    current_page: u32,
}

impl Censor {
    /// Creates a policy from an expression list. A catch-all expression is
    /// appended so every run matches something when `expressions` is empty
    /// or exhausted without a match.
    pub fn new(mut expressions: Vec<Expression>, mode: Mode) -> Result<Self> {
        expressions.push(Expression::new(".", Some(DEFAULT_CENSOR_COLOR))?);
        Ok(Self {
            expressions,
            mode,
            marked_areas: BTreeMap::new(),
            marks: BTreeMap::new(),
            current_page: 0,
        })
    }

    /// First expression matching the run's text, if any.
    fn matching_expression(&self, text: &str) -> Option<&Expression> {
        self.expressions.iter().find(|e| e.is_match(text))
    }

    fn in_marked_area(&self, run: &TextRun) -> bool {
        self.marked_areas
            .get(&self.current_page)
            .is_some_and(|areas| areas.iter().any(|a| rects_intersect(a, &run.bounds)))
    }

    /// Drains the accumulated cover marks, keyed by 1-based page number.
    pub fn take_marks(&mut self) -> BTreeMap<u32, Vec<CoverMark>> {
        std::mem::take(&mut self.marks)
    }
}

impl CensorHandler for Censor {
    fn should_censor(&mut self, run: &TextRun) -> bool {
        let Some(color) = self.matching_expression(&run.text).map(Expression::color) else {
            return false;
        };
        let censored = match self.mode {
            Mode::All => true,
            Mode::Marked => self.in_marked_area(run),
            Mode::Unmarked => !self.in_marked_area(run),
        };
        if censored {
            self.marks.entry(self.current_page).or_default().push(
                CoverMark {
                    bounds: run.bounds,
                    color,
                    style: MarkStyle::Bar,
                },
            );
        }
        censored
    }

    fn begin_document(&mut self, doc: &Document) {
        self.marks.clear();
        self.marked_areas.clear();
        if self.mode != Mode::All {
            self.marked_areas = collect_highlight_areas(doc);
            debug!(
                pages = self.marked_areas.len(),
                "collected highlight areas for marked/unmarked censoring"
            );
        }
    }

    fn begin_page(&mut self, page_no: u32, _page_count: u32) {
        self.current_page = page_no;
    }
}

fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
}

/// Reads the `Rect` of every Highlight annotation, per page.
fn collect_highlight_areas(doc: &Document) -> BTreeMap<u32, Vec<Rect>> {
    let mut areas: BTreeMap<u32, Vec<Rect>> = BTreeMap::new();
    for (page_no, page_id) in doc.get_pages() {
        let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
            continue;
        };
        let annots = match page.get(b"Annots") {
            Ok(Object::Array(list)) => list.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(list)) => list.clone(),
                _ => continue,
            },
            _ => continue,
        };
        for entry in &annots {
            let annot = match entry {
                Object::Dictionary(d) => d,
                Object::Reference(id) => match doc.get_object(*id) {
                    Ok(Object::Dictionary(d)) => d,
                    _ => continue,
                },
                _ => continue,
            };
            let is_highlight = matches!(
                annot.get(b"Subtype"),
                Ok(Object::Name(name)) if name.as_slice() == b"Highlight"
            );
            if !is_highlight {
                continue;
            }
            if let Ok(Object::Array(values)) = annot.get(b"Rect")
                && let Some(rect) = rect_from_array(values)
            {
                areas.entry(page_no).or_default().push(rect);
            }
        }
    }
    areas
}

fn rect_from_array(values: &[Object]) -> Option<Rect> {
    if values.len() != 4 {
        return None;
    }
    let mut nums = [0.0f64; 4];
    for (slot, obj) in nums.iter_mut().zip(values) {
        *slot = match obj {
            Object::Integer(n) => *n as f64,
            Object::Real(n) => f64::from(*n),
            _ => return None,
        };
    }
    Some(Rect::from_corners((nums[0], nums[1]), (nums[2], nums[3])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MATRIX_IDENTITY;

    fn run(text: &str, bounds: Rect) -> TextRun {
        TextRun {
            text: text.to_string(),
            font: Some("F1".to_string()),
            size: 12.0,
            bounds,
            matrix: MATRIX_IDENTITY,
        }
    }

    #[test]
    fn catch_all_censors_everything_in_all_mode() {
        let mut censor = Censor::new(Vec::new(), Mode::All).unwrap();
        censor.begin_page(1, 1);
        assert!(censor.should_censor(&run("anything", Rect::new(0.0, 0.0, 10.0, 10.0))));
    }

    #[test]
    fn first_matching_expression_supplies_the_color() {
        let expressions = vec![
            Expression::new("secret", Some(Color::new(1.0, 0.0, 0.0))).unwrap(),
        ];
        let mut censor = Censor::new(expressions, Mode::All).unwrap();
        censor.begin_page(1, 1);
        censor.should_censor(&run("top secret", Rect::new(0.0, 0.0, 10.0, 10.0)));
        censor.should_censor(&run("plain", Rect::new(0.0, 20.0, 10.0, 10.0)));
        let marks = censor.take_marks().remove(&1).unwrap();
        assert_eq!(marks[0].color, Color::new(1.0, 0.0, 0.0));
        assert_eq!(marks[1].color, DEFAULT_CENSOR_COLOR);
    }

    #[test]
    fn invalid_expression_is_rejected() {
        assert!(Expression::new("(unclosed", None).is_err());
    }

    #[test]
    fn unmarked_mode_skips_runs_inside_marked_areas() {
        let mut censor = Censor::new(Vec::new(), Mode::Unmarked).unwrap();
        censor
            .marked_areas
            .insert(1, vec![Rect::new(0.0, 0.0, 50.0, 50.0)]);
        censor.begin_page(1, 1);
        assert!(!censor.should_censor(&run("inside", Rect::new(10.0, 10.0, 5.0, 5.0))));
        assert!(censor.should_censor(&run("outside", Rect::new(100.0, 100.0, 5.0, 5.0))));
    }
}
