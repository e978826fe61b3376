//! Batch processing of result documents.
//!
//! Every supported file of an input directory becomes one JSON file in the output
//! directory. Before writing, semester-less records are back-filled with the
//! document's majority semester; a document where no semester could be resolved at
//! all is handed to a [`SemesterSource`] to decide.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use snafu::ResultExt;
use tracing::*;

use crate::config::ExtractConfig;
use crate::document::{DocumentDriver, DocumentResult};
use crate::error::{BtebError, IoReadSnafu};
use crate::extract::scanner::ScanSummary;
use crate::output::{ensure_output_dir, output_path, write_records};
use crate::record::ResultRecord;
use crate::source::{InputKind, PageSource};

/// What the semester back-fill did to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillOutcome {
    /// No record lacked a semester.
    Complete,
    /// `filled` records received `semester`.
    Filled { semester: String, filled: usize },
    /// No semester could be resolved; `missing` records stay without one.
    Unresolved { missing: usize },
}

/// A document without any resolved semester and too many records to leave unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedsSemester {
    pub missing: usize,
}

impl fmt::Display for NeedsSemester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records have no semester", self.missing)
    }
}

/// Most frequent non-empty semester; ties go to the value seen first.
pub fn majority_semester(records: &[ResultRecord]) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (index, semester) in records.iter().filter_map(ResultRecord::semester).enumerate() {
        counts.entry(semester).or_insert((0, index)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(semester, _)| semester.to_string())
}

/// Sets `semester` on every record without one and returns how many changed.
pub fn apply_semester(records: &mut [ResultRecord], semester: &str) -> usize {
    let mut filled = 0;
    for record in records.iter_mut().filter(|r| r.semester().is_none()) {
        record.result_semester = Some(semester.to_string());
        filled += 1;
    }
    filled
}

/// Back-fills missing semesters from the majority value of the document.
///
/// Returns [`NeedsSemester`] when no record has a semester and more than
/// `threshold` records lack one.
pub fn backfill_semester(
    records: &mut [ResultRecord],
    threshold: usize,
) -> Result<BackfillOutcome, NeedsSemester> {
    let missing = records.iter().filter(|r| r.semester().is_none()).count();
    if missing == 0 {
        return Ok(BackfillOutcome::Complete);
    }

    match majority_semester(records) {
        Some(semester) => {
            let filled = apply_semester(records, &semester);
            Ok(BackfillOutcome::Filled { semester, filled })
        }
        None if missing > threshold => Err(NeedsSemester { missing }),
        None => Ok(BackfillOutcome::Unresolved { missing }),
    }
}

/// Decides the semester of a document the back-fill could not resolve.
pub trait SemesterSource {
    /// `Ok(None)` leaves the records without a semester.
    fn semester_for(&mut self, document: &Path, missing: usize)
    -> Result<Option<String>, BtebError>;
}

/// Answers every request with the same value.
#[derive(Debug, Clone)]
pub struct FixedSemester(pub String);

impl SemesterSource for FixedSemester {
    fn semester_for(&mut self, _: &Path, _: usize) -> Result<Option<String>, BtebError> {
        Ok(Some(self.0.clone()))
    }
}

/// Never supplies a semester.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveUnset;

impl SemesterSource for LeaveUnset {
    fn semester_for(&mut self, document: &Path, missing: usize) -> Result<Option<String>, BtebError> {
        warn!(
            "{} records of {} have no semester, leaving them unset.",
            missing,
            document.display()
        );
        Ok(None)
    }
}

/// Outcome of one written document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub records: usize,
    pub summary: ScanSummary,
    pub backfill: BackfillOutcome,
}

#[derive(Debug)]
pub struct DocumentFailure {
    pub input: PathBuf,
    pub error: BtebError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<DocumentReport>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.documents.len() + self.failures.len()
    }

    pub fn records(&self) -> usize {
        self.documents.iter().map(|d| d.records).sum()
    }
}

pub struct BatchOrchestrator<'a, S: PageSource> {
    source: &'a S,
    config: ExtractConfig,
    driver: DocumentDriver,
}

impl<'a, S: PageSource> BatchOrchestrator<'a, S> {
    pub fn new(source: &'a S, config: ExtractConfig) -> Self {
        let driver = DocumentDriver::new(&config);
        Self {
            source,
            config,
            driver,
        }
    }

    /// Supported documents directly inside `input_dir`, sorted by file name.
    pub fn discover(input_dir: &Path) -> Result<Vec<PathBuf>, BtebError> {
        let context = || IoReadSnafu {
            path: input_dir.display().to_string(),
        };

        let mut inputs = Vec::new();
        for entry in std::fs::read_dir(input_dir).with_context(|_| context())? {
            let path = entry.with_context(|_| context())?.path();
            if path.is_file() && InputKind::for_path(&path).is_some() {
                inputs.push(path);
            }
        }
        inputs.sort();
        Ok(inputs)
    }

    /// Extracts one document, resolves its semesters and writes its JSON file.
    ///
    /// Unlike [`run`](Self::run), a configured `default_semester` is given to every
    /// record still without one, whatever the number of such records.
    pub fn process_file(
        &self,
        input: &Path,
        output_dir: &Path,
        semesters: &mut dyn SemesterSource,
    ) -> Result<DocumentReport, BtebError> {
        ensure_output_dir(output_dir)?;
        let result = self.driver.extract_file(self.source, input)?;
        self.finish_document(input, result, output_dir, semesters, true)
    }

    /// Processes every supported document of `input_dir`.
    ///
    /// A document that fails is recorded in the report and the batch moves on.
    #[tracing::instrument(skip_all, fields(input = %input_dir.display()))]
    pub fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        semesters: &mut dyn SemesterSource,
    ) -> Result<BatchReport, BtebError> {
        let inputs = Self::discover(input_dir)?;
        ensure_output_dir(output_dir)?;
        info!(
            "Found {} documents, writing results to {}.",
            inputs.len(),
            output_dir.display()
        );

        let extracted: Box<dyn Iterator<Item = (PathBuf, Result<DocumentResult, BtebError>)> + '_> =
            if self.config.parallel {
                let results = inputs
                    .par_iter()
                    .map(|input| (input.clone(), self.driver.extract_file(self.source, input)))
                    .collect::<Vec<_>>();
                Box::new(results.into_iter())
            } else {
                Box::new(
                    inputs
                        .iter()
                        .map(|input| (input.clone(), self.driver.extract_file(self.source, input))),
                )
            };

        let mut report = BatchReport::default();
        for (input, result) in extracted {
            let outcome = result
                .and_then(|result| self.finish_document(&input, result, output_dir, semesters, false));
            match outcome {
                Ok(document) => report.documents.push(document),
                Err(error) => {
                    error!("Failed to process {}: {}", input.display(), error);
                    report.failures.push(DocumentFailure { input, error });
                }
            }
        }

        info!(
            "Processed {}/{} documents, {} records.",
            report.documents.len(),
            report.total(),
            report.records()
        );
        Ok(report)
    }

    fn finish_document(
        &self,
        input: &Path,
        result: DocumentResult,
        output_dir: &Path,
        semesters: &mut dyn SemesterSource,
        fill_unresolved: bool,
    ) -> Result<DocumentReport, BtebError> {
        let mut records = result.records;

        let backfill = match backfill_semester(&mut records, self.config.semester_prompt_threshold)
        {
            Ok(BackfillOutcome::Unresolved { missing }) => {
                match self.config.default_semester.as_deref() {
                    Some(semester) if fill_unresolved => fill_with(&mut records, semester),
                    _ => BackfillOutcome::Unresolved { missing },
                }
            }
            Ok(outcome) => outcome,
            Err(needs) => {
                warn!("{} needs a result semester: {}.", input.display(), needs);
                let chosen = match self.config.default_semester.clone() {
                    Some(semester) => Some(semester),
                    None => semesters.semester_for(input, needs.missing)?,
                };
                match chosen.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    Some(semester) => fill_with(&mut records, semester),
                    None => BackfillOutcome::Unresolved {
                        missing: needs.missing,
                    },
                }
            }
        };
        debug!(?backfill, "semester back-fill");

        let output = output_path(output_dir, input);
        write_records(&output, &records)?;
        info!("Results extracted to {}", output.display());

        Ok(DocumentReport {
            input: input.to_path_buf(),
            output,
            records: records.len(),
            summary: result.summary,
            backfill,
        })
    }
}

fn fill_with(records: &mut [ResultRecord], semester: &str) -> BackfillOutcome {
    let filled = apply_semester(records, semester);
    BackfillOutcome::Filled {
        semester: semester.to_string(),
        filled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocumentMetadata, Outcome};
    use crate::source::TextFileSource;

    fn records(semesters: &[(Option<&str>, usize)]) -> Vec<ResultRecord> {
        let mut roll = 600000;
        let mut records = Vec::new();
        for (semester, count) in semesters {
            let metadata = DocumentMetadata {
                semester: semester.map(str::to_string),
                ..Default::default()
            };
            for _ in 0..*count {
                roll += 1;
                records.push(ResultRecord::stamped(
                    roll.to_string(),
                    Outcome::Passed { gpa: 3.0 },
                    &metadata,
                ));
            }
        }
        records
    }

    #[derive(Default)]
    struct Recording {
        asked: Vec<(PathBuf, usize)>,
        answer: Option<String>,
    }

    impl SemesterSource for Recording {
        fn semester_for(
            &mut self,
            document: &Path,
            missing: usize,
        ) -> Result<Option<String>, BtebError> {
            self.asked.push((document.to_path_buf(), missing));
            Ok(self.answer.clone())
        }
    }

    #[test]
    fn test_backfill_majority_without_prompt() {
        let mut records = records(&[(Some("4th"), 48), (None, 2)]);

        let outcome = backfill_semester(&mut records, 50).unwrap();

        assert_eq!(
            outcome,
            BackfillOutcome::Filled {
                semester: "4th".to_string(),
                filled: 2
            }
        );
        assert!(records.iter().all(|r| r.semester() == Some("4th")));
    }

    #[test]
    fn test_backfill_needs_semester_over_threshold() {
        let mut records = records(&[(None, 60)]);

        let needs = backfill_semester(&mut records, 50).unwrap_err();
        assert_eq!(needs, NeedsSemester { missing: 60 });

        assert_eq!(apply_semester(&mut records, "6th"), 60);
        assert!(records.iter().all(|r| r.semester() == Some("6th")));
    }

    #[test]
    fn test_backfill_unresolved_under_threshold() {
        let mut records = records(&[(None, 50)]);
        assert_eq!(
            backfill_semester(&mut records, 50),
            Ok(BackfillOutcome::Unresolved { missing: 50 })
        );
        assert!(records.iter().all(|r| r.semester().is_none()));
    }

    #[test]
    fn test_backfill_complete_and_empty() {
        let mut complete = records(&[(Some("2nd"), 3)]);
        assert_eq!(
            backfill_semester(&mut complete, 50),
            Ok(BackfillOutcome::Complete)
        );
        assert_eq!(backfill_semester(&mut [], 50), Ok(BackfillOutcome::Complete));
    }

    #[test]
    fn test_majority_semester_ties_go_to_first_seen() {
        let records = records(&[(Some("3rd"), 2), (Some("5th"), 2), (None, 1)]);
        assert_eq!(majority_semester(&records).as_deref(), Some("3rd"));

        let records = records_with_majority();
        assert_eq!(majority_semester(&records).as_deref(), Some("5th"));
    }

    fn records_with_majority() -> Vec<ResultRecord> {
        records(&[(Some("3rd"), 1), (Some("5th"), 3), (Some("3rd"), 1)])
    }

    fn write_sheet(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn passed_lines(start: u32, count: u32) -> String {
        (start..start + count)
            .map(|roll| format!("{roll} (3.25)\n"))
            .collect()
    }

    #[test]
    fn test_run_asks_for_semester_and_applies_it() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "a.txt", &passed_lines(601000, 60));
        let output = dir.path().join("output");

        let source = TextFileSource;
        let orchestrator = BatchOrchestrator::new(&source, ExtractConfig::default());
        let mut semesters = Recording {
            answer: Some("7th".to_string()),
            ..Default::default()
        };
        let report = orchestrator
            .run(dir.path(), &output, &mut semesters)
            .unwrap();

        assert_eq!(semesters.asked.len(), 1);
        assert_eq!(semesters.asked[0].1, 60);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(
            report.documents[0].backfill,
            BackfillOutcome::Filled {
                semester: "7th".to_string(),
                filled: 60
            }
        );

        let written: Vec<ResultRecord> =
            serde_json::from_slice(&std::fs::read(output.join("a.json")).unwrap()).unwrap();
        assert_eq!(written.len(), 60);
        assert!(written.iter().all(|r| r.semester() == Some("7th")));
    }

    #[test]
    fn test_default_semester_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "a.txt", &passed_lines(601000, 60));
        write_sheet(dir.path(), "b.txt", &passed_lines(602000, 3));
        let output = dir.path().join("output");

        let config = ExtractConfig {
            default_semester: Some("1st".to_string()),
            ..Default::default()
        };
        let source = TextFileSource;
        let orchestrator = BatchOrchestrator::new(&source, config);
        let mut semesters = Recording::default();
        let report = orchestrator
            .run(dir.path(), &output, &mut semesters)
            .unwrap();

        assert!(semesters.asked.is_empty());
        assert_eq!(report.records(), 63);
        assert_eq!(
            report.documents[0].backfill,
            BackfillOutcome::Filled {
                semester: "1st".to_string(),
                filled: 60
            }
        );
        assert_eq!(
            report.documents[1].backfill,
            BackfillOutcome::Unresolved { missing: 3 }
        );

        let written: Vec<ResultRecord> =
            serde_json::from_slice(&std::fs::read(output.join("b.json")).unwrap()).unwrap();
        assert!(written.iter().all(|r| r.semester().is_none()));
    }

    #[test]
    fn test_single_file_default_semester_fills_small_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sheet(dir.path(), "a.txt", &passed_lines(601000, 2));

        let config = ExtractConfig {
            default_semester: Some("1st".to_string()),
            ..Default::default()
        };
        let source = TextFileSource;
        let orchestrator = BatchOrchestrator::new(&source, config);
        let mut semesters = Recording::default();
        let report = orchestrator
            .process_file(&input, dir.path(), &mut semesters)
            .unwrap();

        assert!(semesters.asked.is_empty());
        assert_eq!(
            report.backfill,
            BackfillOutcome::Filled {
                semester: "1st".to_string(),
                filled: 2
            }
        );
    }

    #[test]
    fn test_blank_answer_leaves_records_unset() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sheet(dir.path(), "a.txt", &passed_lines(601000, 51));

        let source = TextFileSource;
        let orchestrator = BatchOrchestrator::new(&source, ExtractConfig::default());
        let mut semesters = FixedSemester("   ".to_string());
        let report = orchestrator
            .process_file(&input, dir.path(), &mut semesters)
            .unwrap();

        assert_eq!(report.backfill, BackfillOutcome::Unresolved { missing: 51 });
        assert_eq!(report.output, dir.path().join("a.json"));
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "b.txt", "");
        write_sheet(dir.path(), "a.PDF", "");
        write_sheet(dir.path(), "notes.md", "");
        std::fs::create_dir(dir.path().join("output")).unwrap();

        let inputs = BatchOrchestrator::<TextFileSource>::discover(dir.path()).unwrap();
        let names = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a.PDF", "b.txt"]);
    }
}
