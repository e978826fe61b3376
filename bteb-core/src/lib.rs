pub mod batch;
pub mod config;
pub mod consts;
pub mod document;
pub mod error;
pub mod extract;
pub mod output;
pub mod record;
pub mod source;

// Re-export commonly used types
pub use batch::{BatchOrchestrator, BatchReport, FixedSemester, LeaveUnset, SemesterSource};
pub use config::{DateSearch, ExtractConfig, ExtractConfigBuilder, MetadataStamping};
pub use document::{DocumentDriver, DocumentResult};
pub use error::BtebError;
pub use record::{FailedSubject, Outcome, ResultRecord, SubjectStatus};
pub use source::{InputSource, PageSource, PdfiumSource, TextFileSource};
