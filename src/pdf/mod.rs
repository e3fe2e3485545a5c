//! PDF processing layer
//!
//! This module provides page splitting using qpdf.

mod qpdf;
mod split;

pub use qpdf::QpdfWrapper;
pub use split::{split_pages, PageDocument, PageSplit};
