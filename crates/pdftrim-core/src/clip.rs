//! Page reconstruction
//!
//! The output document starts as a copy of the source's objects so fonts,
//! images and shared resources keep their ids. Each clipped page is a new
//! page object that draws the source page's content through a Form XObject
//! whose bounding box is the clip rectangle. Source pages, the old catalog
//! and anything else left unreachable are pruned in [`PageAssembler::finish`].

use crate::error::TrimError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use shared_pdf::page::{page_geometry, page_resources};
use shared_pdf::{metadata::Metadata, outline, Outline, PdfError, Rect};
use tracing::debug;

/// Name under which the clipped content is registered in each new page
const FORM_NAME: &str = "Fm0";

/// Builds the output document one clipped page at a time
pub struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl PageAssembler {
    /// Start an output document that can reference `source`'s objects
    pub fn new(source: &Document) -> Self {
        let mut doc = Document::with_version(source.version.clone());
        doc.objects = source.objects.clone();
        doc.max_id = source.max_id;
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page showing only `raster_box` of the source page.
    ///
    /// `raster_box` is in raster orientation over the source page rectangle,
    /// as produced by the detector. The new page measures exactly the box
    /// and the box's lower-left corner lands on the new page's origin.
    /// Returns the 0-based index of the new page in the output.
    pub fn clip_page(
        &mut self,
        source: &Document,
        source_page: ObjectId,
        raster_box: &Rect,
    ) -> Result<usize, TrimError> {
        let geometry = page_geometry(source, source_page);
        let clip = raster_box.flip_y_within(&geometry.rect);
        if clip.is_empty() {
            return Err(PdfError::Malformed(format!(
                "Clip rectangle for page {:?} is empty",
                source_page
            ))
            .into());
        }

        let content = source
            .get_page_content(source_page)
            .map_err(|e| PdfError::Malformed(format!("Unreadable page content: {}", e)))?;

        let form = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Form".to_vec())),
            ("BBox", clip.to_pdf_array()),
            ("Resources", page_resources(source, source_page)),
        ]);
        let form_id = self.doc.add_object(Stream::new(form, content));

        let draw = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(1),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(1),
                        Object::Real(-clip.x0 as f32),
                        Object::Real(-clip.y0 as f32),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(FORM_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let draw_bytes = draw
            .encode()
            .map_err(|e| PdfError::OperationError(format!("Failed to encode content: {}", e)))?;
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), draw_bytes));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                FORM_NAME,
                Object::Reference(form_id),
            )])),
        )]);
        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Rect::from_size(clip.width(), clip.height()).to_pdf_array(),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if geometry.rotation != 0 {
            page.set("Rotate", Object::Integer(geometry.rotation as i64));
        }

        let page_id = self.doc.add_object(page);
        self.kids.push(page_id);
        debug!(
            "Clipped page {:?} to {:.1}x{:.1}pt as output page {}",
            source_page,
            clip.width(),
            clip.height(),
            self.kids.len()
        );
        Ok(self.kids.len() - 1)
    }

    /// Complete the document: page tree, catalog, outline and metadata.
    ///
    /// Outline targets index the pages in the order they were clipped.
    pub fn finish(mut self, outline: &Outline, metadata: &Metadata) -> Result<Document, TrimError> {
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.kids.len() as i64)),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer = Dictionary::new();
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        outline::write_outline(&mut self.doc, outline, &self.kids)?;
        metadata.write(&mut self.doc);

        let pruned = self.doc.prune_objects();
        debug!("Pruned {} unreachable objects", pruned.len());
        self.doc.renumber_objects();
        self.doc.compress();

        Ok(self.doc)
    }
}
