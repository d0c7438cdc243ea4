//! High-level censoring API.
//!
//! Ties the pieces together: rewrite the document's content streams with
//! a regex-driven [`Censor`] policy, collect the bounds of the images and
//! forms that remain, and draw cover marks over everything that was
//! suppressed or detected.

use std::path::Path;

use lopdf::{Document, ObjectId};
use tracing::info;

use crate::censor::{Censor, Expression, Mode};
use crate::draw::{CoverMark, draw_cover_marks};
use crate::error::{Error, Result};
use crate::handler::Color;
use crate::processor::{collect_object_bounds, rewrite_document};

/// Color of the crossed boxes drawn over images and forms.
pub const OBJECT_BOX_COLOR: Color = Color::DARK_GRAY;

/// What to censor and how to mark it.
#[derive(Debug, Clone, Default)]
pub struct CensorOptions {
    /// Ordered expressions; a catch-all is appended behind them, so an
    /// empty list censors all text.
    pub expressions: Vec<Expression>,
    pub mode: Mode,
    /// Also draw crossed boxes over every drawn image and form XObject.
    pub box_objects: bool,
}

/// Counts of what a censoring pass did, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    /// Bars drawn over suppressed text runs.
    pub text_marks: usize,
    /// Crossed boxes drawn over images and forms.
    pub object_marks: usize,
}

/// Censors a loaded document in place.
pub fn censor_document(doc: &mut Document, options: &CensorOptions) -> Result<Summary> {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    if pages.is_empty() {
        return Err(Error::EmptyDocument);
    }

    let mut censor = Censor::new(options.expressions.clone(), options.mode)?;
    rewrite_document(doc, &mut censor)?;
    let mut marks = censor.take_marks();

    let mut summary = Summary {
        pages: pages.len(),
        ..Summary::default()
    };
    summary.text_marks = marks.values().map(Vec::len).sum();

    if options.box_objects {
        for &(page_no, page_id) in &pages {
            let bounds = collect_object_bounds(doc, page_id)?;
            summary.object_marks += bounds.len();
            marks
                .entry(page_no)
                .or_default()
                .extend(
                    bounds
                        .into_iter()
                        .map(|rect| CoverMark::crossed_box(rect, OBJECT_BOX_COLOR)),
                );
        }
    }

    for (page_no, page_id) in pages {
        if let Some(page_marks) = marks.get(&page_no) {
            draw_cover_marks(doc, page_id, page_marks)?;
        }
    }

    info!(
        pages = summary.pages,
        text_marks = summary.text_marks,
        object_marks = summary.object_marks,
        "censoring pass finished"
    );
    Ok(summary)
}

/// Loads `input`, censors it, and saves the result to `output`.
pub fn censor_file<P, Q>(input: P, output: Q, options: &CensorOptions) -> Result<Summary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut doc = Document::load(input.as_ref())?;
    let summary = censor_document(&mut doc, options)?;
    doc.save(output.as_ref())?;
    Ok(summary)
}
