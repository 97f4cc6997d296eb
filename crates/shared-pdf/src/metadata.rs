//! Document information dictionary (`/Info`)

use crate::page::resolve;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Key/value metadata from the trailer's `/Info` dictionary.
///
/// Values are stored fully resolved so they can be written into another
/// document without dangling references.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: Dictionary,
}

impl Metadata {
    /// Read the source document's info dictionary; missing or unreadable
    /// info yields empty metadata
    pub fn read(doc: &Document) -> Self {
        let info = doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|obj| resolve(doc, obj));

        let mut entries = Dictionary::new();
        if let Some(Object::Dictionary(dict)) = info {
            for (key, value) in dict.iter() {
                entries.set(key.clone(), resolve(doc, value).clone());
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Text value of a key such as `Title` or `Author`
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.entries
            .get(key.as_bytes())
            .ok()
            .and_then(crate::text::object_text)
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.entries
            .set(key, crate::text::encode_text_string(value));
    }

    /// Attach a copy of this metadata to `doc` as its `/Info` dictionary.
    ///
    /// Returns the id of the new info object, or `None` when there is
    /// nothing to write.
    pub fn write(&self, doc: &mut Document) -> Option<ObjectId> {
        if self.is_empty() {
            return None;
        }
        let id = doc.add_object(Object::Dictionary(self.entries.clone()));
        doc.trailer.set("Info", Object::Reference(id));
        Some(id)
    }
}
