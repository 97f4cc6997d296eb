use shared_pdf::PdfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfJoinError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}
