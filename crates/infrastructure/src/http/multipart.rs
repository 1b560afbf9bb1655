//! Multipart form construction.

use std::path::Path;

use opsdeck_application::ApiError;
use opsdeck_application::ports::MultipartForm;
use reqwest::multipart::{Form, Part};

/// Content type of an upload part, guessed from its file name.
#[must_use]
pub fn part_mime(file_name: &str) -> String {
    mime_guess::from_path(Path::new(file_name))
        .first_or_octet_stream()
        .to_string()
}

/// Converts a port-level multipart form into a reqwest form.
///
/// Text fields come first, then one part per file under the form's file
/// field name.
///
/// # Errors
///
/// Returns an `InvalidRequest` error if a guessed MIME type is rejected.
pub fn build_form(form: MultipartForm) -> Result<Form, ApiError> {
    let mut built = Form::new();
    for (name, value) in form.fields {
        built = built.text(name, value);
    }

    for file in form.files {
        let mime = part_mime(&file.file_name);
        let part = Part::bytes(file.content)
            .file_name(file.file_name)
            .mime_str(&mime)
            .map_err(|e| ApiError::invalid_request(format!("invalid MIME type {mime}: {e}")))?;
        built = built.part(form.file_field.clone(), part);
    }

    Ok(built)
}
