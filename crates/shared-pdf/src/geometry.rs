//! Page geometry in PDF points
//!
//! Rectangles are stored as corner pairs `(x0, y0)`-`(x1, y1)` with
//! `x0 <= x1` and `y0 <= y1`. Two orientations are in use:
//!
//! - PDF user space, where y grows upward (page boxes, form bounding boxes)
//! - raster orientation, where y grows downward from the top edge of the
//!   page rectangle (boxes derived from rendered pixels)
//!
//! Both span the same numeric range for a given page; [`Rect::flip_y_within`]
//! converts between them.

use crate::error::PdfError;
use lopdf::Object;

/// Axis-aligned rectangle in points (1 point = 1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// US Letter, the fallback when a page declares no usable box
    pub const LETTER: Rect = Rect {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    /// Build a rectangle from two corners, normalizing their order
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Rectangle anchored at the origin
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// True when the rectangle encloses no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Whether `other` lies entirely within this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }

    /// Overlapping region of two rectangles, if any
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);

        if x0 < x1 && y0 < y1 {
            Some(Rect { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Corner-wise comparison within `tolerance` points
    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            && (self.y0 - other.y0).abs() <= tolerance
            && (self.x1 - other.x1).abs() <= tolerance
            && (self.y1 - other.y1).abs() <= tolerance
    }

    /// Reflect the y-range inside `frame`.
    ///
    /// Maps raster orientation to PDF user space and back: a value `y`
    /// becomes `frame.y0 + frame.y1 - y`, so the top edge of the frame in
    /// one orientation is the top edge in the other.
    pub fn flip_y_within(&self, frame: &Rect) -> Rect {
        let sum = frame.y0 + frame.y1;
        Rect::new(self.x0, sum - self.y1, self.x1, sum - self.y0)
    }

    /// Uniformly scale all coordinates
    pub fn scale(&self, factor: f64) -> Rect {
        Rect::new(
            self.x0 * factor,
            self.y0 * factor,
            self.x1 * factor,
            self.y1 * factor,
        )
    }

    /// Parse a box array `[llx lly urx ury]`
    pub fn from_pdf_array(array: &[Object]) -> Result<Self, PdfError> {
        if array.len() != 4 {
            return Err(PdfError::Malformed(format!(
                "Box must have 4 elements, found {}",
                array.len()
            )));
        }

        let mut values = [0.0; 4];
        for (i, obj) in array.iter().enumerate() {
            values[i] = number(obj).ok_or_else(|| {
                PdfError::Malformed(format!("Box element {} is not a number", i))
            })?;
        }

        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }

    /// Encode as a PDF box array
    pub fn to_pdf_array(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.x0 as f32),
            Object::Real(self.y0 as f32),
            Object::Real(self.x1 as f32),
            Object::Real(self.y1 as f32),
        ])
    }
}

/// Read an integer or real PDF object as `f64`
pub fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(n) => Some(*n as f64),
        Object::Real(n) => Some(*n as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_normalizes_corners() {
        let rect = Rect::new(100.0, 700.0, 10.0, 20.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 100.0, 700.0));
        assert_eq!(rect.width(), 90.0);
        assert_eq!(rect.height(), 680.0);
    }

    #[test]
    fn test_intersect_disjoint_is_none() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn test_intersect_overlap() {
        let media = Rect::new(0.0, 0.0, 612.0, 792.0);
        let crop = Rect::new(36.0, 36.0, 700.0, 756.0);
        assert_eq!(
            media.intersect(&crop),
            Some(Rect::new(36.0, 36.0, 612.0, 756.0))
        );
    }

    #[test]
    fn test_flip_y_within_offset_frame() {
        let frame = Rect::new(0.0, 100.0, 600.0, 900.0);
        // 50pt band at the top of the frame in raster orientation
        let raster = Rect::new(10.0, 100.0, 20.0, 150.0);
        let user = raster.flip_y_within(&frame);
        assert_eq!(user, Rect::new(10.0, 850.0, 20.0, 900.0));
    }

    #[test]
    fn test_from_pdf_array_mixed_numbers() {
        let array = vec![
            Object::Integer(0),
            Object::Real(0.5),
            Object::Integer(612),
            Object::Real(792.0),
        ];
        let rect = Rect::from_pdf_array(&array).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.5, 612.0, 792.0));
    }

    #[test]
    fn test_from_pdf_array_rejects_bad_input() {
        assert!(Rect::from_pdf_array(&[Object::Integer(0)]).is_err());
        let array = vec![
            Object::Integer(0),
            Object::Name(b"Oops".to_vec()),
            Object::Integer(1),
            Object::Integer(1),
        ];
        assert!(Rect::from_pdf_array(&array).is_err());
    }

    proptest! {
        #[test]
        fn flip_is_an_involution(
            y0 in -500.0f64..500.0,
            h in 1.0f64..1000.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let frame = Rect::new(0.0, y0, 100.0, y0 + h);
            let inner = Rect::new(0.0, y0 + a * h, 50.0, y0 + b * h);
            let back = inner.flip_y_within(&frame).flip_y_within(&frame);
            prop_assert!(back.approx_eq(&inner, 1e-9));
        }
    }
}
