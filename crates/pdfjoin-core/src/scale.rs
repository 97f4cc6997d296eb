//! Page-width normalization
//!
//! Brings every page to the width of the first page by uniform scaling.
//! Pages keep their object ids, so outline destinations stay valid.

use crate::error::PdfJoinError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use shared_pdf::geometry::number;
use shared_pdf::page::{inherited, media_box, page_ids, resolve};
use shared_pdf::Rect;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pages within this many points of the target width are left alone
pub const WIDTH_TOLERANCE: f64 = 0.1;

/// Page boxes rewritten when a page is scaled
const PAGE_BOXES: [&str; 5] = ["MediaBox", "CropBox", "BleedBox", "TrimBox", "ArtBox"];

/// Default output path for a width-normalized copy: `<stem>_Crop.pdf`
pub fn default_scaled_path(input: &std::path::Path) -> std::path::PathBuf {
    shared_pdf::io::suffixed_path(input, "_Crop")
}

/// Scale every page whose width differs from the first page's
pub fn normalize_widths(bytes: &[u8]) -> Result<Vec<u8>, PdfJoinError> {
    let mut doc = shared_pdf::load_document(bytes).map_err(|e| match e {
        shared_pdf::PdfError::ParseError(message) => PdfJoinError::ParseError(message),
        other => PdfJoinError::Pdf(other),
    })?;

    let pages = page_ids(&doc);
    let first = *pages
        .first()
        .ok_or_else(|| PdfJoinError::InvalidInput("Document has no pages".into()))?;
    let target_width = media_box(&doc, first).width();

    let mut factors = BTreeMap::new();
    for (index, &page_id) in pages.iter().enumerate().skip(1) {
        let width = media_box(&doc, page_id).width();
        if (width - target_width).abs() <= WIDTH_TOLERANCE {
            continue;
        }
        let factor = target_width / width;
        debug!(
            "Scaling page {} from {:.1}pt to {:.1}pt (factor {:.4})",
            index + 1,
            width,
            target_width,
            factor
        );
        scale_page(&mut doc, page_id, factor)?;
        factors.insert(page_id, factor);
    }
    scale_destinations(&mut doc, &factors);
    info!(
        "Normalized {} of {} pages to {:.1}pt width",
        factors.len(),
        pages.len(),
        target_width
    );

    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfJoinError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Uniformly scale one page's boxes and content about the origin
fn scale_page(doc: &mut Document, page_id: ObjectId, factor: f64) -> Result<(), PdfJoinError> {
    let mut boxes = Vec::new();
    for key in PAGE_BOXES {
        let value = inherited(doc, page_id, key.as_bytes()).map(|obj| resolve(doc, obj));
        if let Some(Object::Array(array)) = value {
            if let Ok(rect) = Rect::from_pdf_array(array) {
                boxes.push((key, rect.scale(factor)));
            }
        }
    }
    if boxes.iter().all(|(key, _)| *key != "MediaBox") {
        boxes.push(("MediaBox", media_box(doc, page_id).scale(factor)));
    }

    let existing = doc
        .get_dictionary(page_id)
        .map_err(|_| PdfJoinError::OperationError(format!("Page {:?} not found", page_id)))?
        .get(b"Contents")
        .ok()
        .cloned();

    let prefix = format!("q {:.6} 0 0 {:.6} 0 0 cm\n", factor, factor);
    let prefix_id = doc.add_object(Stream::new(Dictionary::new(), prefix.into_bytes()));
    let suffix_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ".to_vec()));

    let mut contents = vec![Object::Reference(prefix_id)];
    let resolved = existing.as_ref().map(|obj| resolve(doc, obj).clone());
    match resolved {
        Some(Object::Array(parts)) => contents.extend(parts),
        Some(Object::Stream(_)) => contents.extend(existing),
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|_| PdfJoinError::OperationError(format!("Page {:?} not found", page_id)))?;
    for (key, rect) in boxes {
        page.set(key, rect.to_pdf_array());
    }
    page.set("Contents", Object::Array(contents));

    scale_annotations(doc, page_id, factor)
}

/// Scale the `/Rect` of every annotation on a page
fn scale_annotations(doc: &mut Document, page_id: ObjectId, factor: f64) -> Result<(), PdfJoinError> {
    let annots = match doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
    {
        Some(obj) => obj.clone(),
        None => return Ok(()),
    };
    let (array_id, mut items) = match annots {
        Object::Reference(id) => match doc.get_object(id) {
            Ok(Object::Array(items)) => (Some(id), items.clone()),
            _ => return Ok(()),
        },
        Object::Array(items) => (None, items),
        _ => return Ok(()),
    };

    for item in items.iter_mut() {
        match item {
            Object::Reference(id) => {
                if let Ok(annot) = doc.get_dictionary_mut(*id) {
                    scale_rect_entry(annot, factor);
                }
            }
            Object::Dictionary(annot) => scale_rect_entry(annot, factor),
            _ => {}
        }
    }

    match array_id {
        Some(id) => {
            doc.objects.insert(id, Object::Array(items));
        }
        None => {
            doc.get_dictionary_mut(page_id)
                .map_err(|_| PdfJoinError::OperationError(format!("Page {:?} not found", page_id)))?
                .set("Annots", Object::Array(items));
        }
    }
    Ok(())
}

fn scale_rect_entry(annot: &mut Dictionary, factor: f64) {
    let scaled = match annot.get(b"Rect") {
        Ok(Object::Array(array)) => Rect::from_pdf_array(array).ok().map(|r| r.scale(factor)),
        _ => None,
    };
    if let Some(rect) = scaled {
        annot.set("Rect", rect.to_pdf_array());
    }
}

/// Scale the view coordinates of explicit destinations (`[page /XYZ l t z]`
/// and friends) that target a scaled page, wherever they appear
fn scale_destinations(doc: &mut Document, factors: &BTreeMap<ObjectId, f64>) {
    if factors.is_empty() {
        return;
    }
    for object in doc.objects.values_mut() {
        scale_destinations_in(object, factors);
    }
}

fn scale_destinations_in(object: &mut Object, factors: &BTreeMap<ObjectId, f64>) {
    match object {
        Object::Array(items) => match destination_factor(items, factors) {
            Some(factor) => scale_view(items, factor),
            None => {
                for item in items.iter_mut() {
                    scale_destinations_in(item, factors);
                }
            }
        },
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                scale_destinations_in(value, factors);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                scale_destinations_in(value, factors);
            }
        }
        _ => {}
    }
}

fn destination_factor(items: &[Object], factors: &BTreeMap<ObjectId, f64>) -> Option<f64> {
    match items {
        [Object::Reference(page), Object::Name(_), ..] => factors.get(page).copied(),
        _ => None,
    }
}

fn scale_view(items: &mut [Object], factor: f64) {
    let coords = match items.get(1) {
        Some(Object::Name(kind)) => match kind.as_slice() {
            b"XYZ" => 2..4,
            b"FitH" | b"FitBH" | b"FitV" | b"FitBV" => 2..3,
            b"FitR" => 2..6,
            _ => return,
        },
        _ => return,
    };
    for index in coords {
        if let Some(slot) = items.get_mut(index) {
            if let Some(value) = number(slot) {
                *slot = Object::Real((value * factor) as f32);
            }
        }
    }
}
