//! Core document model, error types, and slide text assembly for
//! presentation text extraction.

pub mod error;
pub mod extract;
pub mod types;

pub use error::{Error, Result};
pub use extract::{ExtractedText, TextBlock, TextExtractor};
pub use types::{Presentation, PresentationFormat, Shape, ShapeKind, Slide};
