//! Content-stream processing: traversal, rewriting, and bounds
//! extraction.

pub mod extractor;
pub mod resources;
pub mod rewriter;
pub mod stack;
pub mod text;
pub mod walker;

pub use extractor::collect_object_bounds;
pub use rewriter::rewrite_document;
pub use stack::{FrameSource, StreamFrame, StreamStack};
pub use walker::{StreamVisitor, Walker};
