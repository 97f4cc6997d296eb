//! Page rasterization
//!
//! The detector only needs pixels, so rendering sits behind two small
//! traits. [`RasterBackend`] opens a document; the returned [`Rasterizer`]
//! renders its pages one at a time. The PDFium backend is the production
//! implementation; [`PrerenderedBackend`] replays buffers supplied by the
//! caller.

use crate::error::TrimError;
use std::path::Path;

/// Row-major 8-bit RGB pixels of one rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap existing RGB bytes; `data` must hold exactly `width * height * 3` bytes
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TrimError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(TrimError::InvalidOption(format!(
                "pixel buffer of {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert RGBA bytes, dropping the alpha channel
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, TrimError> {
        let data = rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        Self::from_rgb(width, height, data)
    }

    /// An all-white page
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![255; width as usize * height as usize * 3],
        }
    }

    /// Paint the pixel rectangle `[x0, x1) x [y0, y1)`, clamped to the buffer
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, rgb: [u8; 3]) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let offset = self.offset(x, y);
                self.data[offset..offset + 3].copy_from_slice(&rgb);
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = self.offset(x, y);
        [self.data[offset], self.data[offset + 1], self.data[offset + 2]]
    }

    /// Pixel rows, each `width * 3` bytes long
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact((self.width as usize * 3).max(1))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }
}

/// Renders the pages of one open document
pub trait Rasterizer {
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based). Output must be deterministic for a
    /// given page.
    fn render(&self, index: usize) -> Result<PixelBuffer, TrimError>;
}

/// Opens documents for rendering
pub trait RasterBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Rasterizer + 'a>, TrimError>;
}

/// Serves pixel buffers rendered ahead of time
#[derive(Debug, Clone, Default)]
pub struct PrerenderedRasterizer {
    pages: Vec<PixelBuffer>,
}

impl PrerenderedRasterizer {
    pub fn new(pages: Vec<PixelBuffer>) -> Self {
        Self { pages }
    }
}

impl Rasterizer for PrerenderedRasterizer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, index: usize) -> Result<PixelBuffer, TrimError> {
        self.pages.get(index).cloned().ok_or(TrimError::Render {
            page: index,
            message: format!("no pre-rendered image ({} available)", self.pages.len()),
        })
    }
}

/// Backend whose every document renders as the same pre-rendered pages
#[derive(Debug, Clone, Default)]
pub struct PrerenderedBackend {
    pages: Vec<PixelBuffer>,
}

impl PrerenderedBackend {
    pub fn new(pages: Vec<PixelBuffer>) -> Self {
        Self { pages }
    }
}

impl RasterBackend for PrerenderedBackend {
    fn open<'a>(&'a self, _path: &Path) -> Result<Box<dyn Rasterizer + 'a>, TrimError> {
        Ok(Box::new(PrerenderedRasterizer::new(self.pages.clone())))
    }
}

#[cfg(feature = "pdfium")]
pub use self::pdfium_backend::PdfiumBackend;

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use super::{PixelBuffer, RasterBackend, Rasterizer};
    use crate::error::TrimError;
    use pdfium_render::prelude::*;
    use std::path::Path;
    use tracing::debug;

    /// Rasterizer backed by a PDFium shared library.
    ///
    /// The library is looked up next to the executable first, then on the
    /// system library path.
    pub struct PdfiumBackend {
        pdfium: Pdfium,
        scale: f32,
    }

    impl PdfiumBackend {
        pub fn new(dpi: f64) -> Result<Self, TrimError> {
            let bindings =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                    .or_else(|_| Pdfium::bind_to_system_library())
                    .map_err(|e| {
                        TrimError::InvalidOption(format!("PDFium library not available: {}", e))
                    })?;
            Ok(Self {
                pdfium: Pdfium::new(bindings),
                scale: (dpi / 72.0) as f32,
            })
        }
    }

    impl RasterBackend for PdfiumBackend {
        fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn Rasterizer + 'a>, TrimError> {
            let document = self
                .pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| TrimError::Parse(e.to_string()))?;
            debug!("PDFium opened {} ({} pages)", path.display(), document.pages().len());
            Ok(Box::new(PdfiumRasterizer {
                document,
                scale: self.scale,
            }))
        }
    }

    struct PdfiumRasterizer<'a> {
        document: PdfDocument<'a>,
        scale: f32,
    }

    impl Rasterizer for PdfiumRasterizer<'_> {
        fn page_count(&self) -> usize {
            self.document.pages().len() as usize
        }

        fn render(&self, index: usize) -> Result<PixelBuffer, TrimError> {
            let render_error = |message: String| TrimError::Render {
                page: index,
                message,
            };

            let page_index = u16::try_from(index)
                .map_err(|_| render_error("page index out of range".into()))?;
            let page = self
                .document
                .pages()
                .get(page_index)
                .map_err(|e| render_error(e.to_string()))?;

            let width = ((page.width().value * self.scale).round() as i32).max(1);
            let height = ((page.height().value * self.scale).round() as i32).max(1);
            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width)
                        .set_target_height(height)
                        .set_clear_color(PdfColor::WHITE),
                )
                .map_err(|e| render_error(e.to_string()))?;

            PixelBuffer::from_rgba(
                bitmap.width() as u32,
                bitmap.height() as u32,
                &bitmap.as_rgba_bytes(),
            )
        }
    }
}
