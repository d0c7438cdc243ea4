//! tachar - selective censoring of PDF content streams.
//!
//! Rewrites a document's content streams instruction by instruction,
//! suppressing the show-text instructions a regex policy marks, then
//! draws cover marks over the censored runs (and optionally over drawn
//! images and forms). See [`high_level`] for the entry points and
//! [`handler::CensorHandler`] for plugging in a custom policy.

pub mod censor;
pub mod draw;
pub mod error;
pub mod geom;
pub mod handler;
pub mod high_level;
pub mod processor;

pub use censor::{Censor, Expression, Mode};
pub use error::{Error, Result};
pub use handler::{CensorHandler, Color, TextRun};
pub use high_level::{CensorOptions, Summary, censor_document, censor_file};
