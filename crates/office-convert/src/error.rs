use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Not a Word or PowerPoint file: {}", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Converter program not found: {0}")]
    ToolNotFound(String),

    #[error("Conversion of {} failed ({status}): {stderr}", .file.display())]
    ToolFailed {
        file: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Converter produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
