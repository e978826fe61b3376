pub mod metadata;
pub mod result;

pub use metadata::DocumentMetadata;
pub use result::{FailedSubject, Outcome, ResultRecord, SubjectStatus};
