use shared_pdf::PdfError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrimError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Renderer reported {rendered} pages but the document has {parsed}")]
    PageCountMismatch { rendered: usize, parsed: usize },

    #[error("Trim cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}
