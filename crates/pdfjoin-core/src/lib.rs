//! PDF merge and page-width normalization
//!
//! This crate provides lopdf-based document assembly used alongside the
//! trim engine:
//! - `merge_documents` / `merge_files`: concatenate PDFs with one bookmark
//!   per input file holding that file's own outline
//! - `normalize_widths`: scale pages to the width of the first page

pub mod error;
pub mod merge;
pub mod order;
pub mod report;
pub mod scale;

pub use error::PdfJoinError;
pub use merge::{merge_documents, merge_files, MergeInput};
pub use order::{sort_inputs, SortMode};
pub use report::MergeReport;
pub use scale::{default_scaled_path, normalize_widths};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfJoinError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfJoinError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rejects_garbage() {
        let result = get_page_count(b"%PDF-1.7 truncated");
        assert!(matches!(result, Err(PdfJoinError::ParseError(_))));
    }

    #[test]
    fn test_sort_mode_deserializes_lowercase() {
        let mode: SortMode = serde_json::from_str(r#""created""#).unwrap();
        assert_eq!(mode, SortMode::Created);
    }
}
