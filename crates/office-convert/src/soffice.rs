//! LibreOffice headless conversion

use crate::error::ConvertError;
use crate::kind::DocumentKind;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Turns one office document into a PDF next to it
pub trait Converter {
    /// Convert `input`, returning the path of the written PDF
    fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError>;
}

/// Runs `soffice --headless --convert-to pdf --outdir <dir> <file>`
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("soffice"),
        }
    }
}

impl SofficeConverter {
    /// Use a specific `soffice` executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, input: &Path) -> Command {
        let outdir = match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut cmd = Command::new(&self.program);
        cmd.args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(outdir)
            .arg(input);
        cmd
    }
}

/// Sibling PDF path for an office document
pub fn pdf_path_for(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

impl Converter for SofficeConverter {
    fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        if DocumentKind::from_path(input).is_none() {
            return Err(ConvertError::UnsupportedFile(input.to_path_buf()));
        }

        debug!("Converting {} with {}", input.display(), self.program.display());
        let output = self.command(input).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ConvertError::ToolNotFound(self.program.display().to_string())
            } else {
                ConvertError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                file: input.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let pdf = pdf_path_for(input);
        if !pdf.exists() {
            return Err(ConvertError::MissingOutput(pdf));
        }
        Ok(pdf)
    }
}
