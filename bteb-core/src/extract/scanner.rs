//! Line-oriented result scanner.
//!
//! Result sheets print records as free-flowing text:
//!
//! ```text
//! 601234 (3.50) 601235 (3.25) 601236 { 66641(T), 66642(P) }
//! 601237 { 66641(T), 66642(P), 66643(T), 66644(T),
//! 66645(P), 66646(T) }
//! ```
//!
//! Passed records are `<roll> (<gpa>)`. Failed records are `<roll> { <subjects> }`
//! where the bracketed list may wrap onto any number of following lines, so the
//! scanner keeps the open record in [`ScanState::CollectingFailed`] until the
//! closing brace shows up.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, trace, warn};

use crate::record::{FailedSubject, Outcome, SubjectStatus};

static PASSED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{6})\s*\(\s*(\d+(?:\.\d+)?)\s*\)").expect("passed record pattern")
});

static FAILED_START_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{6})\s*\{").expect("failed record pattern"));

static SUBJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5,6})\((T|P)\)").expect("failed subject pattern"));

/// Scanner state between lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScanState {
    #[default]
    Idle,
    /// A failed record was opened with `{` and its subject list is not closed yet.
    CollectingFailed {
        roll_number: String,
        subjects: Vec<FailedSubject>,
    },
}

/// A complete record recognized by the scanner, before metadata is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedResult {
    pub roll_number: String,
    pub outcome: Outcome,
}

impl ScannedResult {
    fn passed(roll_number: String, gpa: f64) -> Self {
        Self {
            roll_number,
            outcome: Outcome::Passed { gpa },
        }
    }

    fn failed(roll_number: String, failed_subjects: Vec<FailedSubject>) -> Self {
        Self {
            roll_number,
            outcome: Outcome::Failed { failed_subjects },
        }
    }
}

/// Failed record whose closing brace never appeared.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialRecord {
    pub roll_number: String,
    pub subjects: Vec<FailedSubject>,
}

/// Counters collected while scanning one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub pages: usize,
    pub lines: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed records dropped because the input ended before their closing brace.
    pub discarded: usize,
}

impl ScanSummary {
    pub fn records(&self) -> usize {
        self.passed + self.failed
    }
}

#[derive(Debug, Default)]
pub struct RecordScanner {
    state: ScanState,
    summary: ScanSummary,
}

impl RecordScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, ScanState::CollectingFailed { .. })
    }

    pub fn summary(&self) -> ScanSummary {
        self.summary
    }

    /// Feeds one physical line and returns the records it completed.
    ///
    /// On an idle line every passed record is returned before any failed record,
    /// whatever their positions in the line.
    pub fn scan_line(&mut self, line: &str) -> Vec<ScannedResult> {
        self.summary.lines += 1;
        let mut out = Vec::new();

        match std::mem::take(&mut self.state) {
            ScanState::Idle => self.scan_idle(line, &mut out),
            ScanState::CollectingFailed {
                roll_number,
                mut subjects,
            } => match line.find('}') {
                Some(close) => {
                    // subjects anywhere on the closing line belong to the open record,
                    // unless a new failed record starts after the brace
                    let tail = &line[close + 1..];
                    let owned = FAILED_START_PATTERN
                        .find(tail)
                        .map_or(line.len(), |start| close + 1 + start.start());
                    subjects.extend(parse_subjects(&line[..owned]));
                    debug!(roll = %roll_number, subjects = subjects.len(), "closed wrapped failed record");
                    self.push(&mut out, ScannedResult::failed(roll_number, subjects));
                    self.scan_idle(tail, &mut out);
                }
                None => {
                    subjects.extend(parse_subjects(line));
                    self.state = ScanState::CollectingFailed {
                        roll_number,
                        subjects,
                    };
                }
            },
        }

        out
    }

    /// Ends the input. An open failed record is discarded and returned.
    pub fn finish(&mut self) -> Option<PartialRecord> {
        match std::mem::take(&mut self.state) {
            ScanState::Idle => None,
            ScanState::CollectingFailed {
                roll_number,
                subjects,
            } => {
                warn!(
                    roll = %roll_number,
                    subjects = subjects.len(),
                    "input ended inside a failed record, discarding it"
                );
                self.summary.discarded += 1;
                Some(PartialRecord {
                    roll_number,
                    subjects,
                })
            }
        }
    }

    fn scan_idle(&mut self, line: &str, out: &mut Vec<ScannedResult>) {
        for caps in PASSED_PATTERN.captures_iter(line) {
            match caps[2].parse::<f64>() {
                Ok(gpa) => self.push(out, ScannedResult::passed(caps[1].to_string(), gpa)),
                Err(err) => trace!(roll = &caps[1], %err, "unparsable gpa"),
            }
        }

        let mut rest = line;
        while let Some((roll_number, body)) = failed_start(rest) {
            match body.find('}') {
                Some(close) => {
                    let subjects = parse_subjects(&body[..close]);
                    self.push(out, ScannedResult::failed(roll_number, subjects));
                    rest = &body[close + 1..];
                }
                None => {
                    let subjects = parse_subjects(body);
                    debug!(roll = %roll_number, "failed record continues on next line");
                    self.state = ScanState::CollectingFailed {
                        roll_number,
                        subjects,
                    };
                    return;
                }
            }
        }
    }

    fn push(&mut self, out: &mut Vec<ScannedResult>, result: ScannedResult) {
        if result.outcome.is_passed() {
            self.summary.passed += 1;
        } else {
            self.summary.failed += 1;
        }
        out.push(result);
    }
}

/// Finds the next `<roll> {` and returns the roll with the text after the brace.
fn failed_start(text: &str) -> Option<(String, &str)> {
    let caps = FAILED_START_PATTERN.captures(text)?;
    let open = caps.get(0)?;
    Some((caps[1].to_string(), &text[open.end()..]))
}

fn parse_subjects(text: &str) -> Vec<FailedSubject> {
    SUBJECT_PATTERN
        .captures_iter(text)
        .filter_map(|caps: Captures<'_>| {
            SubjectStatus::from_tag(&caps[2]).map(|status| FailedSubject::new(&caps[1], status))
        })
        .collect()
}
