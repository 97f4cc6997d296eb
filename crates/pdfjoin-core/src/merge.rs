//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document with one bookmark per
//! source file.

use crate::error::PdfJoinError;
use crate::report::MergeReport;
use lopdf::{Document, Object, ObjectId};
use shared_pdf::outline::{read_outline, write_outline};
use shared_pdf::page::{catalog_id, inherited, page_ids};
use shared_pdf::{Destination, Outline, OutlineItem, OutlineNode, PageIndexMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// One document to merge, named for its bookmark
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MergeInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Merge multiple PDFs into one
///
/// The algorithm:
/// 1. If empty, return error
/// 2. Load every input and read its outline and page count
/// 3. Start from the first document and, for each further document:
///    a. Calculate ID offset to avoid conflicts
///    b. Import all objects with remapped IDs
///    c. Append pages to the destination
/// 4. Rebuild the page tree and write the combined outline: a top-level
///    entry per input, titled with its name and pointing at its first page,
///    holding the input's own outline shifted by the pages before it
/// 5. Prune, compress and return the merged result
pub fn merge_documents(inputs: Vec<MergeInput>) -> Result<Vec<u8>, PdfJoinError> {
    if inputs.is_empty() {
        return Err(PdfJoinError::OperationError("No documents to merge".into()));
    }

    let mut loaded = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let mut doc = Document::load_mem(&input.bytes).map_err(|e| {
            PdfJoinError::ParseError(format!("Failed to load {}: {}", input.name, e))
        })?;
        pin_inherited_attributes(&mut doc);
        loaded.push(doc);
    }

    let mut outline_nodes = Vec::with_capacity(inputs.len());
    let mut page_offset = 0;
    for (input, doc) in inputs.iter().zip(&loaded) {
        let count = doc.get_pages().len();
        outline_nodes.push(file_entry(
            &input.name,
            &read_outline(doc),
            page_offset,
            count,
        ));
        page_offset += count;
    }

    let mut sources = loaded.into_iter();
    let mut dest = sources
        .next()
        .ok_or_else(|| PdfJoinError::OperationError("No documents to merge".into()))?;
    let mut dest_max_id = dest.max_id;
    let mut dest_page_refs = page_ids(&dest);

    for source in sources {
        // Get source pages before we start consuming the document
        let source_pages = page_ids(&source);
        let id_offset = dest_max_id;

        for (old_id, object) in source.objects {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        dest_page_refs.extend(
            source_pages
                .into_iter()
                .map(|(num, gen)| (num + id_offset, gen)),
        );

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }
    dest.max_id = dest_max_id;

    update_page_tree(&mut dest, &dest_page_refs)?;
    write_outline(&mut dest, &Outline::new(outline_nodes), &dest_page_refs)?;

    let pruned = dest.prune_objects();
    debug!("Pruned {} objects after merge", pruned.len());
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfJoinError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

    Ok(buffer)
}

/// Bookmark for one input: its name over its own outline, offset into the
/// merged page sequence
fn file_entry(name: &str, outline: &Outline, offset: usize, page_count: usize) -> OutlineNode {
    let item = OutlineItem {
        title: name.to_string(),
        // An input without pages has nothing to point at
        target: (page_count > 0).then(|| Destination {
            page: offset,
            view: Vec::new(),
        }),
    };
    let children = outline
        .remap(&PageIndexMap::offset(page_count, offset))
        .nodes;

    if children.is_empty() {
        OutlineNode::Leaf(item)
    } else {
        OutlineNode::Group { item, children }
    }
}

/// Read `paths` in order, merge them, and write the result to `output`.
///
/// Each input's bookmark is titled with its file name.
pub fn merge_files(paths: &[PathBuf], output: &Path) -> Result<MergeReport, PdfJoinError> {
    let start = Instant::now();

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = fs::read(path).map_err(|e| {
            PdfJoinError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        inputs.push(MergeInput::new(name, bytes));
    }

    let input_size: usize = inputs.iter().map(|input| input.bytes.len()).sum();
    let merged = merge_documents(inputs)?;
    let page_count = crate::get_page_count(&merged)?;

    shared_pdf::io::write_atomically(output, &merged)?;

    let report = MergeReport {
        file_count: paths.len(),
        input_size_bytes: input_size,
        output_size_bytes: merged.len(),
        page_count,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Merged {} files ({} pages) into {}",
        report.file_count,
        report.page_count,
        output.display()
    );
    Ok(report)
}

/// Page attributes a page may take from its ancestors in the page tree
const INHERITABLE_KEYS: [&str; 4] = ["MediaBox", "CropBox", "Resources", "Rotate"];

/// Copy inherited attributes onto each page so pages keep them once the
/// page tree is flattened
fn pin_inherited_attributes(doc: &mut Document) {
    for page_id in page_ids(doc) {
        let missing: Vec<(&str, Object)> = INHERITABLE_KEYS
            .iter()
            .filter(|key| {
                doc.get_dictionary(page_id)
                    .map(|page| !page.has(key.as_bytes()))
                    .unwrap_or(false)
            })
            .filter_map(|key| Some((*key, inherited(doc, page_id, key.as_bytes())?.clone())))
            .collect();

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in missing {
                page.set(key, value);
            }
        }
    }
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's page tree at `page_refs`, flattening it
fn update_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfJoinError> {
    let catalog_id = catalog_id(doc)?;
    let pages_id = doc
        .get_dictionary(catalog_id)
        .map_err(|_| PdfJoinError::OperationError("Invalid catalog".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfJoinError::OperationError("No Pages reference in catalog".into()))?;

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids = page_refs.iter().map(|&id| Object::Reference(id)).collect();
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        }
        _ => {
            return Err(PdfJoinError::OperationError(
                "Invalid pages dictionary".into(),
            ))
        }
    }

    // Imported pages still point at their old trees
    let mut attached = 0;
    for &page_id in page_refs {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
            attached += 1;
        }
    }
    if attached != page_refs.len() {
        return Err(PdfJoinError::OperationError(format!(
            "{} of {} pages could not be attached",
            page_refs.len() - attached,
            page_refs.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Dictionary;
    use pretty_assertions::assert_eq;
    use shared_pdf::TocEntry;

    /// Helper to create a simple PDF with N pages containing identifiable text
    fn create_test_pdf(num_pages: u32, content_prefix: &str, toc: &[TocEntry]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.new_object_id();
        let catalog_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for page_num in 0..num_pages {
            let page_id = doc.new_object_id();
            let content_id = doc.new_object_id();

            let content = format!(
                "BT /F1 12 Tf 50 700 Td ({}-Page-{}) Tj ET",
                content_prefix,
                page_num + 1
            );
            doc.objects.insert(
                content_id,
                Object::Stream(lopdf::Stream::new(Dictionary::new(), content.into_bytes())),
            );

            let mut page_dict = Dictionary::new();
            page_dict.set("Type", Object::Name(b"Page".to_vec()));
            page_dict.set("Parent", Object::Reference(pages_id));
            page_dict.set("Contents", Object::Reference(content_id));
            page_dict.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            );

            doc.objects.insert(page_id, Object::Dictionary(page_dict));
            page_ids.push(page_id);
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(num_pages as i64));
        pages_dict.set(
            "Kids",
            Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
        );
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        doc.objects
            .insert(catalog_id, Object::Dictionary(catalog_dict));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        if !toc.is_empty() {
            write_outline(&mut doc, &Outline::from_toc(toc), &page_ids).unwrap();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn toc_rows(bytes: &[u8]) -> Vec<(usize, String, Option<usize>)> {
        let doc = Document::load_mem(bytes).unwrap();
        read_outline(&doc)
            .to_toc()
            .into_iter()
            .map(|e| (e.level, e.title, e.page))
            .collect()
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document_gets_file_bookmark() {
        let pdf = create_test_pdf(2, "Single", &[]);
        let result = merge_documents(vec![MergeInput::new("single.pdf", pdf)]).unwrap();

        let doc = Document::load_mem(&result).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(toc_rows(&result), vec![(1, "single.pdf".to_string(), Some(1))]);
    }

    #[test]
    fn test_merge_two_documents_combines_pages() {
        let doc_a = create_test_pdf(2, "DocA", &[]);
        let doc_b = create_test_pdf(3, "DocB", &[]);

        let merged = merge_documents(vec![
            MergeInput::new("a.pdf", doc_a),
            MergeInput::new("b.pdf", doc_b),
        ])
        .unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 5, "Merged document should have 5 pages");
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let merged = merge_documents(vec![
            MergeInput::new("first.pdf", create_test_pdf(2, "First", &[])),
            MergeInput::new("second.pdf", create_test_pdf(1, "Second", &[])),
            MergeInput::new("third.pdf", create_test_pdf(2, "Third", &[])),
        ])
        .unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        let texts: Vec<String> = page_ids(&doc)
            .into_iter()
            .map(|id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect();
        let expected = [
            "First-Page-1",
            "First-Page-2",
            "Second-Page-1",
            "Third-Page-1",
            "Third-Page-2",
        ];
        assert_eq!(texts.len(), expected.len());
        for (text, marker) in texts.iter().zip(expected) {
            assert!(text.contains(marker), "{} not in {}", marker, text);
        }
    }

    #[test]
    fn test_merged_pages_point_at_new_tree() {
        let merged = merge_documents(vec![
            MergeInput::new("a.pdf", create_test_pdf(1, "A", &[])),
            MergeInput::new("b.pdf", create_test_pdf(2, "B", &[])),
        ])
        .unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        let pages_id = shared_pdf::page::catalog(&doc)
            .unwrap()
            .get(b"Pages")
            .unwrap()
            .as_reference()
            .unwrap();
        for page_id in page_ids(&doc) {
            let parent = doc
                .get_dictionary(page_id)
                .unwrap()
                .get(b"Parent")
                .unwrap()
                .as_reference()
                .unwrap();
            assert_eq!(parent, pages_id);
        }
    }

    #[test]
    fn test_merge_offsets_nested_bookmarks() {
        let doc_a = create_test_pdf(
            2,
            "DocA",
            &[TocEntry::new(1, "Intro", 1), TocEntry::new(1, "Body", 2)],
        );
        let doc_b = create_test_pdf(3, "DocB", &[]);
        let doc_c = create_test_pdf(
            4,
            "DocC",
            &[TocEntry::new(1, "Part", 1), TocEntry::new(2, "Detail", 3)],
        );

        let merged = merge_documents(vec![
            MergeInput::new("a.pdf", doc_a),
            MergeInput::new("b.pdf", doc_b),
            MergeInput::new("c.pdf", doc_c),
        ])
        .unwrap();

        assert_eq!(
            toc_rows(&merged),
            vec![
                (1, "a.pdf".to_string(), Some(1)),
                (2, "Intro".to_string(), Some(1)),
                (2, "Body".to_string(), Some(2)),
                (1, "b.pdf".to_string(), Some(3)),
                (1, "c.pdf".to_string(), Some(6)),
                (2, "Part".to_string(), Some(6)),
                (3, "Detail".to_string(), Some(8)),
            ]
        );
    }

    #[test]
    fn test_merge_rejects_invalid_input() {
        let result = merge_documents(vec![
            MergeInput::new("good.pdf", create_test_pdf(1, "Good", &[])),
            MergeInput::new("bad.pdf", b"not a pdf".to_vec()),
        ]);
        match result {
            Err(PdfJoinError::ParseError(message)) => assert!(message.contains("bad.pdf")),
            other => panic!("expected parse error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_merge_files_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        fs::write(&a, create_test_pdf(2, "A", &[])).unwrap();
        fs::write(&b, create_test_pdf(1, "B", &[])).unwrap();
        let output = dir.path().join("merged.pdf");

        let report = merge_files(&[a, b], &output).unwrap();
        assert_eq!(report.file_count, 2);
        assert_eq!(report.page_count, 3);
        assert_eq!(report.output_size_bytes as u64, fs::metadata(&output).unwrap().len());

        let merged = fs::read(&output).unwrap();
        assert_eq!(
            toc_rows(&merged),
            vec![
                (1, "a.pdf".to_string(), Some(1)),
                (1, "b.pdf".to_string(), Some(3)),
            ]
        );
    }

    #[test]
    fn test_merge_files_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.pdf");
        let result = merge_files(&[dir.path().join("absent.pdf")], &output);
        assert!(matches!(result, Err(PdfJoinError::InvalidInput(_))));
        assert!(!output.exists());
    }
}
