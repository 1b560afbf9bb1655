//! Job submission inputs and their validation.
//!
//! Validation is pure: nothing here touches the network, so a rejected
//! submission never reaches the remote service.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::job::JobKind;

/// Default per-file upload ceiling (50 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// A file queued for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name sent to the service.
    pub file_name: String,
    /// File contents.
    pub content: Vec<u8>,
}

impl UploadFile {
    /// Creates an upload file from a name and its contents.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// Size of the contents in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Target of an import: the process (and optional category) that receives
/// the uploaded records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSelector {
    /// Process identifier.
    pub process_id: String,
    /// Optional category within the process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProcessSelector {
    /// Selects a process without a category.
    #[must_use]
    pub fn process(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            category: None,
        }
    }

    /// Narrows the selection to a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Import submission: files plus the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// Files to upload.
    pub files: Vec<UploadFile>,
    /// Receiving process.
    pub target: ProcessSelector,
}

impl ImportRequest {
    /// Creates an import request.
    #[must_use]
    pub const fn new(files: Vec<UploadFile>, target: ProcessSelector) -> Self {
        Self { files, target }
    }

    /// Total payload size in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(UploadFile::size).sum()
    }

    /// Checks the request against the submission limits.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for an empty file set, a blank target,
    /// blank or duplicate file names, or a file above the size ceiling.
    pub fn validate(&self, limits: &SubmissionLimits) -> Result<(), ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::new("at least one file is required"));
        }
        if self.target.process_id.trim().is_empty() {
            return Err(ValidationError::new("a target process is required"));
        }
        if let Some(max) = limits.max_files {
            if self.files.len() > max {
                return Err(ValidationError::new(format!(
                    "too many files: {} (limit {max})",
                    self.files.len()
                )));
            }
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if file.file_name.trim().is_empty() {
                return Err(ValidationError::new("file name must not be empty"));
            }
            if !seen.insert(file.file_name.as_str()) {
                return Err(ValidationError::new(format!(
                    "duplicate file name: {}",
                    file.file_name
                )));
            }
            if file.size() > limits.max_file_bytes {
                return Err(ValidationError::new(format!(
                    "{} is {} bytes, above the {} byte limit",
                    file.file_name,
                    file.size(),
                    limits.max_file_bytes
                )));
            }
        }
        Ok(())
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// JSON documents.
    Json,
    /// Excel workbook.
    Xlsx,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(ValidationError::new(format!("unknown export format: {other}"))),
        }
    }
}

/// Which records an export covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSelection {
    /// Explicit process ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub process_ids: Vec<String>,
    /// Free-text filter evaluated by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ExportSelection {
    /// Returns true when neither ids nor a filter are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.process_ids.iter().all(|id| id.trim().is_empty())
            && self.filter.as_deref().is_none_or(|f| f.trim().is_empty())
    }
}

/// Export submission descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Records to export.
    pub selection: ExportSelection,
    /// Output format.
    #[serde(default)]
    pub format: ExportFormat,
}

impl ExportRequest {
    /// Creates an export request.
    #[must_use]
    pub const fn new(selection: ExportSelection, format: ExportFormat) -> Self {
        Self { selection, format }
    }

    /// Checks that the selection is not empty.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when nothing is selected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.selection.is_empty() {
            return Err(ValidationError::new(
                "select at least one process or provide a filter",
            ));
        }
        Ok(())
    }
}

/// Either kind of submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionRequest {
    /// File import.
    Import(ImportRequest),
    /// Data export.
    Export(ExportRequest),
}

impl SubmissionRequest {
    /// Kind of job this submission creates.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Import(_) => JobKind::Import,
            Self::Export(_) => JobKind::Export,
        }
    }

    /// Validates the submission.
    ///
    /// # Errors
    ///
    /// Propagates the import or export validation error.
    pub fn validate(&self, limits: &SubmissionLimits) -> Result<(), ValidationError> {
        match self {
            Self::Import(request) => request.validate(limits),
            Self::Export(request) => request.validate(),
        }
    }
}

/// Limits applied to submissions before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionLimits {
    /// Per-file size ceiling in bytes.
    pub max_file_bytes: u64,
    /// Optional cap on the number of files in one import.
    pub max_files: Option<usize>,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_files: None,
        }
    }
}
