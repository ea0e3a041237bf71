//! PDF selection validation.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Largest file the analysis service accepts
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A file the user picked, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    /// Declared media type, if anything declared one
    pub media_type: Option<String>,
    pub size: u64,
}

/// A validated PDF ready to be submitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    #[error("Please select a PDF file")]
    Missing,
    #[error("{name} is not a PDF file. Please select a PDF file")]
    NotPdf { name: String },
    #[error("{name} is too large ({size}). Maximum file size is 50 MB")]
    TooLarge { name: String, size: String },
}

/// Validate a candidate: it must exist, look like a PDF and fit the size limit.
pub fn validate_upload(candidate: Option<FileCandidate>) -> Result<SelectedFile, UploadError> {
    let candidate = candidate.ok_or(UploadError::Missing)?;

    if !is_pdf(&candidate) {
        return Err(UploadError::NotPdf {
            name: candidate.name,
        });
    }

    if candidate.size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size: format_size(candidate.size),
            name: candidate.name,
        });
    }

    Ok(SelectedFile {
        path: candidate.path,
        name: candidate.name,
        size: candidate.size,
    })
}

/// The declared media type or the file extension must indicate a PDF.
fn is_pdf(candidate: &FileCandidate) -> bool {
    let declared = candidate
        .media_type
        .as_deref()
        .map(|m| {
            let m = m.trim().to_ascii_lowercase();
            m == PDF_MEDIA_TYPE || m == "application/x-pdf"
        })
        .unwrap_or(false);

    declared || has_pdf_extension(&candidate.name)
}

pub fn has_pdf_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Human readable size, e.g. `"12.4 MB"`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
