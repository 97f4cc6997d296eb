//! Shared PDF handling utilities
//!
//! This crate provides the page geometry, page-tree attribute lookup,
//! outline (bookmark) model, metadata handling and output file helpers
//! used by the trim and merge tools.

pub mod error;
pub mod geometry;
pub mod io;
pub mod metadata;
pub mod outline;
pub mod page;
pub mod page_map;
pub mod text;

pub use error::PdfError;
pub use geometry::Rect;
pub use metadata::Metadata;
pub use outline::{Destination, Outline, OutlineItem, OutlineNode, TocEntry};
pub use page::PageGeometry;
pub use page_map::PageIndexMap;

/// Load a PDF from memory, mapping parser failures to [`PdfError`]
pub fn load_document(bytes: &[u8]) -> Result<lopdf::Document, PdfError> {
    lopdf::Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))
}

/// Serialize a document to bytes
pub fn save_document(doc: &mut lopdf::Document) -> Result<Vec<u8>, PdfError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}
