//! `OpsDeck` Domain - Core business types
//!
//! This crate defines the domain model for the OpsDeck operator console.
//! All types here are pure Rust with no I/O dependencies.

pub mod environment;
pub mod error;
pub mod history;
pub mod id;
pub mod job;
pub mod navigation;
pub mod records;
pub mod submission;

pub use environment::{Environment, EnvironmentBinding, EnvironmentVersion};
pub use error::{DomainError, DomainResult, ValidationError};
pub use history::{JobHistory, JobHistoryEntry};
pub use id::generate_id;
pub use job::{ApplyOutcome, Job, JobId, JobKind, JobStatus, JobUpdate, ResultSummary};
pub use navigation::{Navigation, View};
pub use records::{ProcessConfig, UserFilter, UserRecord, UserRole};
pub use submission::{
    ExportFormat, ExportRequest, ExportSelection, ImportRequest, ProcessSelector,
    SubmissionLimits, SubmissionRequest, UploadFile,
};
