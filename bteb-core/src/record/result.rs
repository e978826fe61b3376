use serde::{Deserialize, Serialize};

use crate::record::metadata::DocumentMetadata;

/// Component of a subject the student failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectStatus {
    #[serde(rename = "T")]
    Theory,
    #[serde(rename = "P")]
    Practical,
}

impl SubjectStatus {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "T" => Some(SubjectStatus::Theory),
            "P" => Some(SubjectStatus::Practical),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            SubjectStatus::Theory => "T",
            SubjectStatus::Practical => "P",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSubject {
    pub subject_code: String,
    pub status: SubjectStatus,
}

impl FailedSubject {
    pub fn new(subject_code: impl Into<String>, status: SubjectStatus) -> Self {
        Self {
            subject_code: subject_code.into(),
            status,
        }
    }
}

/// Result of one student, tagged by `status` in the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Passed {
        #[serde(rename = "GPA")]
        gpa: f64,
    },
    Failed {
        failed_subjects: Vec<FailedSubject>,
    },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed { .. })
    }
}

/// One recognized roll number together with the document metadata current when it
/// was emitted. Field order is the order of the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub roll_number: String,
    pub result: Outcome,
    pub institute_code: String,
    pub institute_name: String,
    pub district: String,
    pub result_date: Option<String>,
    pub result_semester: Option<String>,
    pub regulation: Option<String>,
    pub trade: Option<String>,
    pub examination_held: Option<String>,
}

impl ResultRecord {
    /// Builds a record stamped with a snapshot of `metadata`.
    pub fn stamped(roll_number: String, result: Outcome, metadata: &DocumentMetadata) -> Self {
        Self {
            roll_number,
            result,
            institute_code: metadata.institute_code.clone().unwrap_or_default(),
            institute_name: metadata.institute_name.clone().unwrap_or_default(),
            district: metadata.district.clone().unwrap_or_default(),
            result_date: metadata.result_date.clone(),
            result_semester: metadata.semester.clone(),
            regulation: metadata.regulation.clone(),
            trade: metadata.trade.clone(),
            examination_held: metadata.examination_held.clone(),
        }
    }

    /// Fills every field that is still blank from `metadata`, leaving populated
    /// fields untouched.
    pub fn fill_unset_from(&mut self, metadata: &DocumentMetadata) {
        fill_blank(&mut self.institute_code, &metadata.institute_code);
        fill_blank(&mut self.institute_name, &metadata.institute_name);
        fill_blank(&mut self.district, &metadata.district);
        fill_none(&mut self.result_date, &metadata.result_date);
        fill_none(&mut self.result_semester, &metadata.semester);
        fill_none(&mut self.regulation, &metadata.regulation);
        fill_none(&mut self.trade, &metadata.trade);
        fill_none(&mut self.examination_held, &metadata.examination_held);
    }

    /// Semester of this record, if one is populated and non-empty.
    pub fn semester(&self) -> Option<&str> {
        self.result_semester.as_deref().filter(|s| !s.is_empty())
    }
}

fn fill_blank(slot: &mut String, value: &Option<String>) {
    if slot.is_empty() {
        if let Some(value) = value {
            slot.clone_from(value);
        }
    }
}

fn fill_none(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}
