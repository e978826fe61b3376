use std::path::Path;

use tracing::*;

use crate::config::{ExtractConfig, MetadataStamping};
use crate::error::BtebError;
use crate::extract::metadata::MetadataExtractor;
use crate::extract::scanner::{RecordScanner, ScanSummary};
use crate::record::{DocumentMetadata, ResultRecord};
use crate::source::PageSource;

/// Records of one document, in the order they appear in the text.
#[derive(Debug, Clone, Default)]
pub struct DocumentResult {
    pub records: Vec<ResultRecord>,
    pub metadata: DocumentMetadata,
    pub summary: ScanSummary,
}

/// Drives the metadata extractor and one record scanner over the pages of a single
/// document. Scanner state carries over page breaks, so a failed record may wrap
/// onto the next page.
#[derive(Debug, Clone, Copy)]
pub struct DocumentDriver {
    extractor: MetadataExtractor,
    stamping: MetadataStamping,
    auto_clean_text: bool,
}

impl DocumentDriver {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            extractor: MetadataExtractor::new(config.date_search),
            stamping: config.stamping,
            auto_clean_text: config.auto_clean_text,
        }
    }

    /// Reads `path` through `source` and extracts its records.
    #[tracing::instrument(skip_all, fields(document = %path.display()))]
    pub fn extract_file(
        &self,
        source: &dyn PageSource,
        path: &Path,
    ) -> Result<DocumentResult, BtebError> {
        let pages = source.page_texts(path)?;
        let result = self.extract_pages(&pages);
        info!(
            "Extracted {} records ({} passed, {} failed, {} discarded) from {} pages.",
            result.summary.records(),
            result.summary.passed,
            result.summary.failed,
            result.summary.discarded,
            result.summary.pages
        );
        Ok(result)
    }

    pub fn extract_pages<I, S>(&self, pages: I) -> DocumentResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut metadata = DocumentMetadata::default();
        let mut scanner = RecordScanner::new();
        let mut records = Vec::new();
        let mut page_count = 0;

        for (page_no, page) in pages.into_iter().enumerate() {
            page_count += 1;
            let text = self.prepare_text(page.as_ref());

            if !metadata.is_complete() && metadata.absorb(self.extractor.extract(&text)) {
                debug!(page_no, ?metadata, "document metadata updated");
            }

            for line in text.lines() {
                records.extend(
                    scanner
                        .scan_line(line)
                        .into_iter()
                        .map(|scanned| {
                            ResultRecord::stamped(scanned.roll_number, scanned.outcome, &metadata)
                        }),
                );
            }
        }

        scanner.finish();

        if self.stamping == MetadataStamping::Retroactive {
            for record in records.iter_mut() {
                record.fill_unset_from(&metadata);
            }
        }

        let mut summary = scanner.summary();
        summary.pages = page_count;

        DocumentResult {
            records,
            metadata,
            summary,
        }
    }

    fn prepare_text(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if self.auto_clean_text {
            plsfix::fix_text(&text, None)
        } else {
            text
        }
    }
}
