//! Header field extraction.
//!
//! Result sheets print the institute, publication date and examination header near
//! the top of a page. Every field is optional: a page without a match simply
//! contributes nothing, and the document keeps whatever it already knows.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::config::DateSearch;
use crate::consts::BOARD_MARKER;

static INSTITUTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{5}) - (.*?), (.*?)\n").expect("institute pattern"));

static RESULT_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Date\s*:\s*(\d{2}-\d{2}-\d{4})").expect("result date pattern")
});

static SEMESTER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,2})(?:st|nd|rd|th)\s+Semester\s*\((\d{4})\s+Regulation\)\s*Examination of (.*?)\s*,",
    )
    .expect("semester pattern")
});

static EXAMINATION_HELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"held\s*in\s*(\w+\s*,\s*\d{4})").expect("examination held pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institute {
    pub code: String,
    pub name: String,
    pub district: String,
}

/// Parsed `<n>th Semester (<year> Regulation) Examination of <trade>,` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterHeader {
    /// Ordinal form, e.g. `4th`.
    pub semester: String,
    pub regulation: String,
    pub trade: String,
}

/// Fields found on a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub institute: Option<Institute>,
    pub result_date: Option<String>,
    pub semester: Option<SemesterHeader>,
    pub examination_held: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.institute.is_none()
            && self.result_date.is_none()
            && self.semester.is_none()
            && self.examination_held.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor {
    date_search: DateSearch,
}

impl MetadataExtractor {
    pub fn new(date_search: DateSearch) -> Self {
        Self { date_search }
    }

    /// Extracts whatever header fields `page_text` carries.
    pub fn extract(&self, page_text: &str) -> PageMetadata {
        let metadata = PageMetadata {
            institute: extract_institute(page_text),
            result_date: self.extract_result_date(page_text),
            semester: extract_semester(page_text),
            examination_held: EXAMINATION_HELD_PATTERN
                .captures(page_text)
                .map(|caps| caps[1].trim().to_string()),
        };
        trace!(?metadata, "page metadata");
        metadata
    }

    fn extract_result_date(&self, page_text: &str) -> Option<String> {
        match self.date_search {
            DateSearch::Anywhere => RESULT_DATE_PATTERN
                .captures(page_text)
                .map(|caps| caps[1].to_string()),
            DateSearch::Header { lines } => page_text.lines().take(lines).find_map(|line| {
                RESULT_DATE_PATTERN
                    .captures(line)
                    .map(|caps| caps[1].to_string())
            }),
        }
    }
}

fn extract_institute(page_text: &str) -> Option<Institute> {
    if !page_text.contains(BOARD_MARKER) {
        return None;
    }

    INSTITUTE_PATTERN.captures(page_text).map(|caps| Institute {
        code: caps[1].to_string(),
        name: caps[2].trim().to_string(),
        district: caps[3].trim().to_string(),
    })
}

fn extract_semester(page_text: &str) -> Option<SemesterHeader> {
    let caps = SEMESTER_PATTERN.captures(page_text)?;
    let number = caps[1].parse::<u32>().ok()?;

    Some(SemesterHeader {
        semester: ordinal(number),
        regulation: caps[2].to_string(),
        trade: caps[3].trim().to_string(),
    })
}

/// English ordinal form of `n`: `1st`, `2nd`, `3rd`, `4th`, `11th`, `21st`, ...
pub fn ordinal(n: u32) -> String {
    let suffix = if (10..=20).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}
