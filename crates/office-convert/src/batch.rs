//! Folder-wide conversion with per-file progress

use crate::soffice::Converter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Emitted after each file, converted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the file just handled
    pub current: usize,
    pub total: usize,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<ConversionFailure>,
}

impl BatchReport {
    pub fn message(&self) -> String {
        if self.failed.is_empty() {
            format!("Converted {} file(s)", self.converted.len())
        } else {
            format!(
                "Converted {} file(s), {} failed",
                self.converted.len(),
                self.failed.len()
            )
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert each file in order. A failing file is logged and recorded,
/// and the batch moves on to the next one.
pub fn convert_batch<F>(converter: &dyn Converter, files: &[PathBuf], mut progress: F) -> BatchReport
where
    F: FnMut(BatchProgress),
{
    let total = files.len();
    let mut report = BatchReport::default();

    for (index, file) in files.iter().enumerate() {
        match converter.convert(file) {
            Ok(pdf) => {
                info!("Converted {} -> {}", file.display(), pdf.display());
                report.converted.push(pdf);
            }
            Err(e) => {
                warn!("Skipping {}: {}", file.display(), e);
                report.failed.push(ConversionFailure {
                    file: file.clone(),
                    message: e.to_string(),
                });
            }
        }
        progress(BatchProgress {
            current: index + 1,
            total,
            file_name: display_name(file),
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::soffice::pdf_path_for;
    use pretty_assertions::assert_eq;

    struct FakeConverter;

    impl Converter for FakeConverter {
        fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError> {
            if display_name(input).contains("broken") {
                Err(ConvertError::MissingOutput(pdf_path_for(input)))
            } else {
                Ok(pdf_path_for(input))
            }
        }
    }

    #[test]
    fn test_failures_do_not_stop_batch() {
        let files = vec![
            PathBuf::from("in/a.docx"),
            PathBuf::from("in/broken.doc"),
            PathBuf::from("in/c.pptx"),
        ];
        let mut seen = Vec::new();
        let report = convert_batch(&FakeConverter, &files, |p| seen.push(p));

        assert_eq!(
            report.converted,
            vec![PathBuf::from("in/a.pdf"), PathBuf::from("in/c.pdf")]
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, PathBuf::from("in/broken.doc"));
        assert_eq!(report.message(), "Converted 2 file(s), 1 failed");

        let ticks: Vec<(usize, usize, &str)> = seen
            .iter()
            .map(|p| (p.current, p.total, p.file_name.as_str()))
            .collect();
        assert_eq!(
            ticks,
            vec![(1, 3, "a.docx"), (2, 3, "broken.doc"), (3, 3, "c.pptx")]
        );
    }

    #[test]
    fn test_empty_batch() {
        let mut calls = 0;
        let report = convert_batch(&FakeConverter, &[], |_| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(report.message(), "Converted 0 file(s)");
    }
}
