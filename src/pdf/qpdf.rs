//! qpdf FFI wrapper for PDF page extraction
//!
//! This module opens source documents and copies single pages into new
//! documents using the qpdf crate (vendored FFI).

use crate::error::{Error, Result};
use qpdf::{QPdf, QPdfDictionary, QPdfObject, QPdfObjectLike, QPdfObjectType};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&str; 4] = ["/MediaBox", "/CropBox", "/Resources", "/Rotate"];

/// Bound on `/Parent` hops, guarding against cyclic page trees
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Wrapper for qpdf operations via FFI
pub struct QpdfWrapper;

/// Map qpdf crate errors to our error types
fn map_qpdf_error(e: qpdf::QPdfError) -> Error {
    match e.error_code() {
        qpdf::QPdfErrorCode::InvalidPassword => Error::InvalidPdf {
            reason: "PDF is password protected".to_string(),
        },
        _ => Error::QpdfError {
            reason: e.to_string(),
        },
    }
}

/// Reject data that does not start with a PDF header
fn validate_header(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidPdf {
            reason: "Document is empty".to_string(),
        });
    }
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

fn parent_of(node: &QPdfDictionary) -> Option<QPdfDictionary> {
    node.get("/Parent")
        .filter(|parent| parent.get_type() == QPdfObjectType::Dictionary)
        .map(QPdfDictionary::from)
}

/// Value of `key` on the nearest ancestor of `page` that defines it
fn inherited_attribute(page: &QPdfDictionary, key: &str) -> Option<QPdfObject> {
    let mut node = parent_of(page)?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Some(value) = node.get(key) {
            return Some(value);
        }
        node = parent_of(&node)?;
    }
    None
}

/// Set inherited attributes directly on the page so it stands alone once
/// copied out of its page tree.
fn push_inherited_attributes(page: &QPdfDictionary) {
    for key in INHERITABLE_ATTRIBUTES {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(page, key) {
            page.set(key, value);
        }
    }
}

impl QpdfWrapper {
    /// Parse PDF bytes
    pub fn open(data: &[u8]) -> Result<QPdf> {
        validate_header(data)?;
        QPdf::read_from_memory(data).map_err(map_qpdf_error)
    }

    /// Number of pages in an opened document
    pub fn page_count(document: &QPdf) -> Result<u32> {
        document.get_num_pages().map_err(map_qpdf_error)
    }

    /// Copy the page at `index` (0-based) into a new single-page document
    ///
    /// # Returns
    /// The single-page PDF as bytes
    pub fn extract_page(source: &QPdf, index: u32) -> Result<Vec<u8>> {
        let total = Self::page_count(source)?;
        let page = source.get_page(index).ok_or_else(|| Error::QpdfError {
            reason: format!("Page {} out of bounds (total: {})", index + 1, total),
        })?;
        push_inherited_attributes(&page);

        let dest = QPdf::empty();
        let copied = dest.copy_from_foreign(&page);
        dest.add_page(&copied, false).map_err(map_qpdf_error)?;

        let mut writer = dest.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory().map_err(map_qpdf_error)
    }

    /// Get the page count of PDF bytes
    pub fn get_page_count(input_data: &[u8]) -> Result<u32> {
        let document = Self::open(input_data)?;
        Self::page_count(&document)
    }
}
