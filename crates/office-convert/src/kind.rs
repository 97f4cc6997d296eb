//! Recognized office documents

use crate::error::ConvertError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `.doc` / `.docx`
    Word,
    /// `.ppt` / `.pptx`
    Presentation,
}

impl DocumentKind {
    /// Classify a file by extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "doc" | "docx" => Some(DocumentKind::Word),
            "ppt" | "pptx" => Some(DocumentKind::Presentation),
            _ => None,
        }
    }
}

/// Office documents directly inside `dir`: Word files first, then
/// presentations, each group sorted by file name
pub fn scan_folder(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut word = Vec::new();
    let mut presentations = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match DocumentKind::from_path(&path) {
            Some(DocumentKind::Word) => word.push(path),
            Some(DocumentKind::Presentation) => presentations.push(path),
            None => {}
        }
    }

    word.sort();
    presentations.sort();
    word.extend(presentations);
    Ok(word)
}
