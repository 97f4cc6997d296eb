use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Malformed PDF structure: {0}")]
    Malformed(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
