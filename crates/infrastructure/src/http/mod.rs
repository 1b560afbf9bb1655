//! HTTP infrastructure utilities.
//!
//! This module provides:
//! - Multipart form construction for job uploads
//! - Reading upload files from disk

mod multipart;
mod uploads;

pub use multipart::{build_form, part_mime};
pub use uploads::{UploadReadError, read_upload_files};
