//! Stream-frame stack.
//!
//! For every nesting level currently open during a rewrite (page, form
//! XObject, transparency group) the stack holds one frame pairing the
//! stream being read with the output buffer being written. When a frame
//! is popped its buffer fully replaces the content of the stream it was
//! opened for; the commit itself happens at the traversal layer, which
//! knows the document.
//!
//! Push/pop must nest exactly with stream entry/exit events. Divergence
//! is a caller bug, so it is reported through logging and handled
//! best-effort instead of aborting the document.

use lopdf::ObjectId;
use lopdf::content::Operation;
use tracing::{error, warn};

/// The stream a frame was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    /// A page's content stream.
    Page(ObjectId),
    /// A form XObject or transparency group stream.
    XObject(ObjectId),
}

/// One stack entry: the identity of an open input stream plus the output
/// buffer that instructions are forwarded into.
#[derive(Debug)]
pub struct StreamFrame {
    pub source: FrameSource,
    pub operations: Vec<Operation>,
}

impl StreamFrame {
    pub fn new(source: FrameSource) -> Self {
        Self {
            source,
            operations: Vec::new(),
        }
    }
}

/// LIFO collection of stream frames, alive exactly while a document is
/// being traversed.
#[derive(Debug, Default)]
pub struct StreamStack {
    frames: Option<Vec<StreamFrame>>,
}

impl StreamStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the stack at begin-document.
    pub fn begin(&mut self) {
        self.frames = Some(Vec::new());
    }

    /// Deinitializes the stack at end-document.
    ///
    /// A non-empty stack means pushes and pops did not pair up with
    /// stream entry/exit events; that is reported and the stack is
    /// forcibly cleared.
    pub fn finish(&mut self) {
        if let Some(frames) = self.frames.take()
            && !frames.is_empty()
        {
            error!(
                depth = frames.len(),
                "stream stack not empty after the document was processed; \
                 push/pop calls did not pair up with stream entry/exit events"
            );
        }
    }

    /// True between `begin` and `finish`.
    pub fn is_active(&self) -> bool {
        self.frames.is_some()
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.frames.as_ref().map_or(0, Vec::len)
    }

    /// Pushes a frame for a newly entered stream. Outside an active
    /// traversal this is a no-op with a diagnostic.
    pub fn push(&mut self, frame: StreamFrame) {
        match &mut self.frames {
            Some(frames) => frames.push(frame),
            None => {
                warn!("tried to push a stream frame but the stack has not been initialized");
            }
        }
    }

    /// Output buffer of the top frame — the "current writer". `None` when
    /// no stack is initialized or no frame is open.
    pub fn writer(&mut self) -> Option<&mut Vec<Operation>> {
        self.frames
            .as_mut()
            .and_then(|frames| frames.last_mut())
            .map(|frame| &mut frame.operations)
    }

    /// Removes and returns the top frame.
    ///
    /// Popping with no active stack or no open frame indicates a
    /// mismatched push; it is reported and `None` is returned.
    pub fn pop(&mut self) -> Option<StreamFrame> {
        let popped = self.frames.as_mut().and_then(Vec::pop);
        if popped.is_none() {
            error!("tried to pop a stream frame from an empty stream stack");
        }
        popped
    }
}
