use derive_builder::Builder;

use crate::consts::{DEFAULT_HEADER_LINES, SEMESTER_PROMPT_THRESHOLD};

/// Where on a page the result date is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSearch {
    /// Only the first `lines` lines of each page.
    Header { lines: usize },
    /// Anywhere in the page text.
    #[default]
    Anywhere,
}

impl DateSearch {
    pub fn header() -> Self {
        DateSearch::Header {
            lines: DEFAULT_HEADER_LINES,
        }
    }
}

/// How document metadata reaches records emitted before it was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataStamping {
    /// Each record carries the metadata known at the moment it was emitted.
    #[default]
    AtEmission,
    /// After the last page, blank fields of every record are filled from the final
    /// document metadata.
    Retroactive,
}

/// Configuration for extracting one or many result documents
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct ExtractConfig {
    pub date_search: DateSearch,
    pub stamping: MetadataStamping,
    /// Run extracted page text through `plsfix` before scanning
    pub auto_clean_text: bool,
    /// Semester-less records a document may have before the caller is asked for one
    pub semester_prompt_threshold: usize,
    /// Extract documents of a batch on the rayon pool
    pub parallel: bool,
    /// Semester used instead of asking when a document needs one. Single-file
    /// extraction also gives it to every record still without one after back-fill
    #[builder(setter(into, strip_option))]
    pub default_semester: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            date_search: DateSearch::default(),
            stamping: MetadataStamping::default(),
            auto_clean_text: true,
            semester_prompt_threshold: SEMESTER_PROMPT_THRESHOLD,
            parallel: false,
            default_semester: None,
        }
    }
}
