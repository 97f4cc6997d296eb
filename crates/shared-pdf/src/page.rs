//! Page-level attribute lookup
//!
//! `MediaBox`, `CropBox`, `Rotate` and `Resources` are inheritable: a page
//! that omits them takes the value from the nearest ancestor in the page
//! tree that defines it.

use crate::error::PdfError;
use crate::geometry::Rect;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Maximum page-tree depth followed when looking up inherited attributes
const MAX_TREE_DEPTH: usize = 64;

/// Maximum chain of indirect references followed by [`resolve`]
const MAX_REFERENCE_CHAIN: usize = 16;

/// Geometry needed to map rendered pixels back to page space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible page rectangle (CropBox clipped to MediaBox)
    pub rect: Rect,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i32,
}

/// Follow indirect references until a direct object is reached
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_CHAIN {
        match current {
            Object::Reference(id) => match doc.objects.get(id) {
                Some(target) => current = target,
                None => return current,
            },
            _ => return current,
        }
    }
    current
}

/// Resolve an object to a dictionary, if it is one
pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj) {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Page object ids in document order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Object id of the document catalog
pub fn catalog_id(doc: &Document) -> Result<ObjectId, PdfError> {
    doc.trailer
        .get(b"Root")
        .map_err(|_| PdfError::Malformed("No Root in trailer".into()))?
        .as_reference()
        .map_err(|_| PdfError::Malformed("Root is not a reference".into()))
}

/// The document catalog dictionary
pub fn catalog(doc: &Document) -> Result<&Dictionary, PdfError> {
    let id = catalog_id(doc)?;
    doc.get_dictionary(id)
        .map_err(|_| PdfError::Malformed("Catalog not found".into()))
}

/// Look up an inheritable page attribute, walking up through `/Parent`.
///
/// The returned object is not resolved, so references to shared
/// resources stay references.
pub fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve_dict(doc, parent)?;
    }
    None
}

fn inherited_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Rect> {
    let obj = inherited(doc, page_id, key)?;
    match resolve(doc, obj) {
        Object::Array(array) => Rect::from_pdf_array(array).ok(),
        _ => None,
    }
}

/// The page's MediaBox, defaulting to US Letter
pub fn media_box(doc: &Document, page_id: ObjectId) -> Rect {
    inherited_box(doc, page_id, b"MediaBox")
        .filter(|rect| !rect.is_empty())
        .unwrap_or(Rect::LETTER)
}

/// The visible page rectangle: CropBox clipped to MediaBox
pub fn page_rect(doc: &Document, page_id: ObjectId) -> Rect {
    let media = media_box(doc, page_id);
    inherited_box(doc, page_id, b"CropBox")
        .and_then(|crop| crop.intersect(&media))
        .unwrap_or(media)
}

/// Page rotation normalized to 0, 90, 180 or 270
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i32 {
    inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .map(|angle| normalize_rotation(angle as i32))
        .unwrap_or(0)
}

/// Rotation snapped to a quarter turn in `[0, 360)`
pub fn normalize_rotation(angle: i32) -> i32 {
    let normalized = angle.rem_euclid(360);
    (normalized / 90) * 90
}

/// Rectangle and rotation for one page
pub fn page_geometry(doc: &Document, page_id: ObjectId) -> PageGeometry {
    PageGeometry {
        rect: page_rect(doc, page_id),
        rotation: page_rotation(doc, page_id),
    }
}

/// The page's resource dictionary, or a reference to it
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Object {
    inherited(doc, page_id, b"Resources")
        .cloned()
        .unwrap_or_else(|| Object::Dictionary(Dictionary::new()))
}
