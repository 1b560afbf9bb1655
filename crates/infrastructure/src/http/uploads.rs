//! Reading upload files from disk.

use std::path::{Path, PathBuf};

use opsdeck_domain::UploadFile;

/// Failure to read a file queued for import.
#[derive(Debug, thiserror::Error)]
pub enum UploadReadError {
    /// The path has no usable file name.
    #[error("not a file path: {0}")]
    NoFileName(PathBuf),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Reads each path into an [`UploadFile`] named after its final component.
///
/// # Errors
///
/// Fails on the first path that cannot be read.
pub async fn read_upload_files<P: AsRef<Path>>(
    paths: &[P],
) -> Result<Vec<UploadFile>, UploadReadError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| UploadReadError::NoFileName(path.to_path_buf()))?
            .to_string();
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| UploadReadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        files.push(UploadFile::new(file_name, content));
    }
    Ok(files)
}
