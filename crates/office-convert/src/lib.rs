//! Batch conversion of Word and PowerPoint files to PDF
//!
//! Conversion is delegated to LibreOffice running headless. Files are
//! discovered per folder, converted one by one, and failures are
//! collected rather than aborting the batch.

pub mod batch;
pub mod error;
pub mod kind;
pub mod soffice;

pub use batch::{convert_batch, BatchProgress, BatchReport, ConversionFailure};
pub use error::ConvertError;
pub use kind::{scan_folder, DocumentKind};
pub use soffice::{pdf_path_for, Converter, SofficeConverter};
