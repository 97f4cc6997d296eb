//! Whitespace trimming for PDF pages
//!
//! Each page is rendered, the bounding box of its non-background pixels is
//! detected, and the page is rebuilt at that size with its vector content
//! intact. The outline is remapped onto the new pages and document
//! metadata is carried over.
//!
//! ```no_run
//! # #[cfg(feature = "pdfium")]
//! # fn example() -> Result<(), pdftrim_core::TrimError> {
//! use pdftrim_core::{trim_pdf, PdfiumBackend, TrimRequest};
//!
//! let backend = PdfiumBackend::new(72.0)?;
//! let report = trim_pdf(&TrimRequest::new("slides.pdf"), &backend)?;
//! println!("{}", report.message());
//! # Ok(())
//! # }
//! ```

pub mod clip;
pub mod config;
pub mod detect;
pub mod error;
pub mod raster;
pub mod trim;

pub use clip::PageAssembler;
pub use config::{AxisPolicy, ExecutionMode, TrimConfig, TrimOptions};
pub use detect::{content_extent, detect_content_bbox};
pub use error::TrimError;
#[cfg(feature = "pdfium")]
pub use raster::PdfiumBackend;
pub use raster::{PixelBuffer, PrerenderedBackend, PrerenderedRasterizer, RasterBackend, Rasterizer};
pub use trim::{
    default_output_path, trim_pdf, CancelHandle, JobState, Progress, TrimEvent, TrimJob,
    TrimReport, TrimRequest,
};
