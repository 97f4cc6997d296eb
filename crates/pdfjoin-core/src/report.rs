use serde::Serialize;

/// Statistics for a completed merge
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub file_count: usize,
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

impl MergeReport {
    pub fn message(&self) -> String {
        format!(
            "Merged {} files into {} pages ({} bytes)",
            self.file_count, self.page_count, self.output_size_bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes() {
        let report = MergeReport {
            file_count: 2,
            input_size_bytes: 2048,
            output_size_bytes: 1900,
            page_count: 7,
            processing_time_ms: 12,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["page_count"], 7);
        assert_eq!(json["file_count"], 2);
        assert_eq!(report.message(), "Merged 2 files into 7 pages (1900 bytes)");
    }
}
