//! Content bounding-box detection
//!
//! A pixel counts as content when its unweighted gray value is darker than
//! `255 * (1 - threshold)`. The detected box is expressed in raster
//! orientation over the page rectangle (see `shared_pdf::geometry`).

use crate::config::TrimOptions;
use crate::raster::PixelBuffer;
use shared_pdf::Rect;

/// Inclusive pixel bounds of the content found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelExtent {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

/// Brightness below which a pixel is content
fn brightness_floor(threshold: f64) -> f64 {
    255.0 * (1.0 - threshold)
}

fn is_content(rgb: &[u8], floor: f64) -> bool {
    let gray = (rgb[0] as u32 + rgb[1] as u32 + rgb[2] as u32) / 3;
    (gray as f64) < floor
}

/// Smallest pixel rectangle containing every content pixel, or `None`
/// for a blank page
pub fn content_extent(pixels: &PixelBuffer, threshold: f64) -> Option<PixelExtent> {
    let floor = brightness_floor(threshold);
    let mut left = pixels.width();
    let mut right = 0;
    let mut top = pixels.height();
    let mut bottom = 0;

    for (y, row) in pixels.rows().enumerate() {
        let mut row_pixels = row.chunks_exact(3);
        let Some(first) = row_pixels.position(|px| is_content(px, floor)) else {
            continue;
        };
        // `position` consumed the prefix, so search the rest from the back
        let last = row_pixels
            .rposition(|px| is_content(px, floor))
            .map(|offset| first + 1 + offset)
            .unwrap_or(first);

        let y = y as u32;
        left = left.min(first as u32);
        right = right.max(last as u32);
        top = top.min(y);
        bottom = y;
    }

    if left > right || top > bottom {
        return None;
    }
    Some(PixelExtent {
        left,
        top,
        right,
        bottom,
    })
}

/// Clamp `[lo, hi]` to the page span. A span that collapses to nothing
/// (one-pixel content with no margin) keeps the full page span.
fn trimmed_span(lo: f64, hi: f64, page_lo: f64, page_hi: f64) -> (f64, f64) {
    let (lo, hi) = (lo.max(page_lo), hi.min(page_hi));
    if hi > lo {
        (lo, hi)
    } else {
        (page_lo, page_hi)
    }
}

/// Detect the content box of a rendered page.
///
/// `page` is the page rectangle the buffer was rendered from. The result
/// lies within `page`, in raster orientation, and includes the safety
/// margin on trimmed axes. Pinned axes, and pages with no content at all,
/// keep the full page extent.
pub fn detect_content_bbox(pixels: &PixelBuffer, page: &Rect, options: &TrimOptions) -> Rect {
    if pixels.is_empty() {
        return *page;
    }
    let Some(extent) = content_extent(pixels, options.threshold) else {
        return *page;
    };

    let scale_x = page.width() / pixels.width() as f64;
    let scale_y = page.height() / pixels.height() as f64;
    let margin = options.margin;

    let (x0, x1) = if options.axis.trims_horizontal() {
        trimmed_span(
            page.x0 + extent.left as f64 * scale_x - margin,
            page.x0 + extent.right as f64 * scale_x + margin,
            page.x0,
            page.x1,
        )
    } else {
        (page.x0, page.x1)
    };

    let (y0, y1) = if options.axis.trims_vertical() {
        trimmed_span(
            page.y0 + extent.top as f64 * scale_y - margin,
            page.y0 + extent.bottom as f64 * scale_y + margin,
            page.y0,
            page.y1,
        )
    } else {
        (page.y0, page.y1)
    };

    Rect::new(x0, y0, x1, y1)
}
