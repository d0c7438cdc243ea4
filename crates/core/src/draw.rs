//! Cover-mark rendering.
//!
//! Draws the rectangles collected by the censoring pass back onto the
//! page: filled bars over suppressed text, stroked crossed boxes over
//! detected images and forms. The original page content is bracketed in
//! `q`/`Q` so leftover graphics state cannot displace the marks.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

use crate::error::Result;
use crate::geom::Rect;
use crate::handler::Color;

/// How a cover mark is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStyle {
    /// Filled bar, used over suppressed text.
    Bar,
    /// Stroked box with diagonals, used over images and forms.
    CrossedBox,
}

/// One rectangle to draw over the page.
#[derive(Debug, Clone)]
pub struct CoverMark {
    pub bounds: Rect,
    pub color: Color,
    pub style: MarkStyle,
}

impl CoverMark {
    pub fn bar(bounds: Rect, color: Color) -> Self {
        Self {
            bounds,
            color,
            style: MarkStyle::Bar,
        }
    }

    pub fn crossed_box(bounds: Rect, color: Color) -> Self {
        Self {
            bounds,
            color,
            style: MarkStyle::CrossedBox,
        }
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rect_operands(r: &Rect) -> Vec<Object> {
    vec![real(r.x), real(r.y), real(r.width), real(r.height)]
}

/// Content-stream operations for one mark.
fn mark_operations(mark: &CoverMark) -> Vec<Operation> {
    let Rect {
        x,
        y,
        width,
        height,
    } = mark.bounds;
    let mut ops = Vec::new();
    match mark.style {
        MarkStyle::Bar => {
            ops.push(Operation::new(
                "rg",
                vec![real(mark.color.r), real(mark.color.g), real(mark.color.b)],
            ));
            ops.push(Operation::new("re", rect_operands(&mark.bounds)));
            ops.push(Operation::new("f", vec![]));
        }
        MarkStyle::CrossedBox => {
            ops.push(Operation::new(
                "RG",
                vec![real(mark.color.r), real(mark.color.g), real(mark.color.b)],
            ));
            ops.push(Operation::new("w", vec![real(2.0)]));
            ops.push(Operation::new("re", rect_operands(&mark.bounds)));
            ops.push(Operation::new("m", vec![real(x), real(y)]));
            ops.push(Operation::new("l", vec![real(x + width), real(y + height)]));
            ops.push(Operation::new("m", vec![real(x), real(y + height)]));
            ops.push(Operation::new("l", vec![real(x + width), real(y)]));
            ops.push(Operation::new("S", vec![]));
        }
    }
    ops
}

/// Draws the given marks over a page.
///
/// The existing content is wrapped in a `q`/`Q` pair and the marks are
/// appended after it, so they always render on top and in page
/// coordinates.
pub fn draw_cover_marks(doc: &mut Document, page_id: ObjectId, marks: &[CoverMark]) -> Result<()> {
    if marks.is_empty() {
        return Ok(());
    }
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;

    let mut operations = Vec::with_capacity(content.operations.len() + marks.len() * 8 + 4);
    operations.push(Operation::new("q", vec![]));
    operations.extend(content.operations);
    operations.push(Operation::new("Q", vec![]));
    operations.push(Operation::new("q", vec![]));
    for mark in marks {
        operations.extend(mark_operations(mark));
    }
    operations.push(Operation::new("Q", vec![]));

    let encoded = Content { operations }.encode()?;
    doc.change_page_content(page_id, encoded)?;
    Ok(())
}
