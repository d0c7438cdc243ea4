//! Drawn-object bounds extraction.
//!
//! Walks a page's content stream and collects the device-space bounding
//! box of every visible drawn object: image XObjects (a unit square
//! mapped through the transformation matrix in effect at the `Do`) and
//! form XObjects (their declared `BBox` mapped through the composed
//! transform). A form's box is recorded before its body is walked, so
//! boxes appear in encounter order; nothing is deduplicated or merged.
//! Stencil-mask images are skipped, they clip rather than draw.

use lopdf::{Document, ObjectId};
use lopdf::content::Content;
use tracing::debug;

use super::resources::ResourceScope;
use super::walker::{StreamVisitor, Walker};
use crate::error::Result;
use crate::geom::{MATRIX_IDENTITY, Matrix, Rect, image_bounds};

/// Bounding boxes of all objects drawn on the page, in encounter order.
pub fn collect_object_bounds(doc: &Document, page_id: ObjectId) -> Result<Vec<Rect>> {
    let content = doc.get_page_content(page_id)?;
    let operations = Content::decode(&content)?.operations;
    let scope = ResourceScope::for_page(doc, page_id);

    let mut visitor = BoundsVisitor::default();
    let mut walker = Walker::new(doc, &mut visitor, MATRIX_IDENTITY, scope);
    walker.walk(&operations)?;
    debug!(count = visitor.bounds.len(), "collected drawn-object bounds");
    Ok(visitor.bounds)
}

#[derive(Default)]
struct BoundsVisitor {
    bounds: Vec<Rect>,
}

impl StreamVisitor for BoundsVisitor {
    fn draw_image(&mut self, _name: &str, _id: ObjectId, stencil: bool, ctm: Matrix) -> Result<()> {
        if !stencil {
            self.bounds.push(image_bounds(ctm));
        }
        Ok(())
    }

    fn enter_form(&mut self, _id: ObjectId, _name: &str, bounds: Rect, _group: bool) -> Result<()> {
        self.bounds.push(bounds);
        Ok(())
    }
}
