//! Selective content-stream rewriter.
//!
//! Re-emits every instruction of a document's content streams verbatim
//! except the suppressible show-text instructions, which a
//! [`CensorHandler`] may drop. Nested form XObjects and transparency
//! groups are rewritten in their own frames and committed back to their
//! own stream objects, so the page keeps invoking them unchanged.

use lopdf::content::Content;
use lopdf::content::Operation;
use lopdf::{Document, ObjectId};
use tracing::{debug, warn};

use super::resources::ResourceScope;
use super::stack::{FrameSource, StreamFrame, StreamStack};
use super::walker::{StreamVisitor, Walker};
use crate::error::Result;
use crate::geom::{MATRIX_IDENTITY, Rect};
use crate::handler::{CensorHandler, TextRun};

/// Rewrites every page of `doc` in place, dropping the show-text
/// instructions whose runs the handler marks for censoring.
///
/// The handler sees every text run in stream order, pages in ascending
/// page-number order, and receives the lifecycle notifications around
/// them. Nested streams are committed as they close; a page's own stream
/// is committed when the page ends.
pub fn rewrite_document(doc: &mut Document, handler: &mut dyn CensorHandler) -> Result<()> {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let page_count = pages.len() as u32;

    handler.begin_document(doc);
    let mut stack = StreamStack::new();
    stack.begin();

    let outcome = rewrite_pages(doc, handler, &mut stack, &pages, page_count);

    stack.finish();
    if outcome.is_ok() {
        handler.end_document();
    }
    outcome
}

fn rewrite_pages(
    doc: &mut Document,
    handler: &mut dyn CensorHandler,
    stack: &mut StreamStack,
    pages: &[(u32, ObjectId)],
    page_count: u32,
) -> Result<()> {
    for &(page_no, page_id) in pages {
        let content = doc.get_page_content(page_id)?;
        let operations = Content::decode(&content)?.operations;
        let scope = ResourceScope::for_page(doc, page_id);

        stack.push(StreamFrame::new(FrameSource::Page(page_id)));
        handler.begin_page(page_no, page_count);

        let commits = {
            let mut visitor = RewriteVisitor::new(stack, handler);
            let mut walker = Walker::new(doc, &mut visitor, MATRIX_IDENTITY, scope);
            walker.walk(&operations)?;
            if let Some(frame) = visitor.stack.pop() {
                visitor.stage(frame)?;
            }
            visitor.commits
        };

        debug!(page = page_no, streams = commits.len(), "committing rewritten streams");
        for (source, data) in commits {
            apply_commit(doc, source, data)?;
        }
        handler.end_page(page_no);
    }
    Ok(())
}

/// Replaces the content of the stream a frame was opened for.
fn apply_commit(doc: &mut Document, source: FrameSource, data: Vec<u8>) -> Result<()> {
    match source {
        FrameSource::Page(page_id) => {
            doc.change_page_content(page_id, data)?;
        }
        FrameSource::XObject(id) => {
            let stream = doc.get_object_mut(id)?.as_stream_mut()?;
            stream.dict.remove(b"Filter");
            stream.dict.remove(b"DecodeParms");
            stream.dict.set("Length", data.len() as i64);
            stream.content = data;
        }
    }
    Ok(())
}

/// Per-page visitor: forwards instructions into the open frame and gates
/// the suppressible show-text instructions on the handler's decisions.
struct RewriteVisitor<'a> {
    stack: &'a mut StreamStack,
    handler: &'a mut dyn CensorHandler,
    /// Closed frames waiting to be written back to the document once the
    /// page's walk releases its borrow.
    commits: Vec<(FrameSource, Vec<u8>)>,
    /// Decision of the most recent run; a show-text instruction that
    /// yields no runs is gated by this.
    censoring: bool,
}

impl<'a> RewriteVisitor<'a> {
    fn new(stack: &'a mut StreamStack, handler: &'a mut dyn CensorHandler) -> Self {
        Self {
            stack,
            handler,
            commits: Vec::new(),
            censoring: false,
        }
    }

    fn forward(&mut self, op: &Operation) {
        match self.stack.writer() {
            Some(writer) => writer.push(op.clone()),
            None => warn!(operator = %op.operator, "no open frame, instruction dropped"),
        }
    }

    fn stage(&mut self, frame: StreamFrame) -> Result<()> {
        let data = Content {
            operations: frame.operations,
        }
        .encode()?;
        self.commits.push((frame.source, data));
        Ok(())
    }
}

impl StreamVisitor for RewriteVisitor<'_> {
    fn instruction(&mut self, op: &Operation) -> Result<()> {
        self.forward(op);
        Ok(())
    }

    fn show_text(&mut self, op: &Operation, runs: &[TextRun], gated: bool) -> Result<()> {
        for run in runs {
            self.censoring = self.handler.should_censor(run);
        }
        if gated && self.censoring {
            debug!(operator = %op.operator, "suppressing show-text instruction");
        } else {
            self.forward(op);
        }
        Ok(())
    }

    fn enter_form(&mut self, id: ObjectId, _name: &str, _bounds: Rect, _group: bool) -> Result<()> {
        self.stack.push(StreamFrame::new(FrameSource::XObject(id)));
        Ok(())
    }

    fn leave_form(&mut self, _id: ObjectId) -> Result<()> {
        if let Some(frame) = self.stack.pop() {
            self.stage(frame)?;
        }
        Ok(())
    }
}
