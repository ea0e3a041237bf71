//! Binary responses (page images, annotated PDFs, exports) and thumbnail
//! data URIs.
//!
//! Binary endpoints answer with a JSON error envelope instead of the expected
//! payload when something goes wrong, so every body is classified before it
//! is written anywhere.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::api::error_from_body;
use crate::upload::PDF_MEDIA_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `GET /api/visualize/{job}/{page}`
    PageImage,
    /// `GET /api/download_annotated_pdf/{job}/{page}`
    AnnotatedPdf,
    /// `GET /api/export/{job}`
    Export,
}

impl ArtifactKind {
    /// Message used when the body is neither the payload nor a readable error
    pub fn fallback_error(&self) -> &'static str {
        match self {
            ArtifactKind::PageImage => "Failed to load page image",
            ArtifactKind::AnnotatedPdf => "Failed to download annotated PDF",
            ArtifactKind::Export => "Failed to export analysis results",
        }
    }

    fn accepts(&self, content_type: &str, body: &[u8]) -> bool {
        match self {
            ArtifactKind::PageImage => content_type.starts_with("image/"),
            ArtifactKind::AnnotatedPdf => {
                content_type.starts_with(PDF_MEDIA_TYPE)
                    || (content_type.is_empty() && body.starts_with(b"%PDF"))
            }
            ArtifactKind::Export => {
                if !content_type.is_empty() && !content_type.contains("json") {
                    return false;
                }
                match serde_json::from_slice::<Value>(body) {
                    Ok(Value::Object(map)) => map.get("success") != Some(&Value::Bool(false)),
                    Ok(_) => true,
                    Err(_) => false,
                }
            }
        }
    }
}

/// Decide whether a response body is the expected artifact.
///
/// Returns the error message to show otherwise: the server's `error` field when
/// the body is a JSON envelope, else the kind's fallback message.
pub fn classify_artifact<'a>(
    kind: ArtifactKind,
    content_type: Option<&str>,
    body: &'a [u8],
) -> Result<&'a [u8], String> {
    let content_type = content_type
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if kind.accepts(&content_type, body) {
        return Ok(body);
    }

    Err(error_from_body(body).unwrap_or_else(|| kind.fallback_error().to_string()))
}

pub fn annotated_pdf_filename(page: u32) -> String {
    format!("annotated_page_{page}.pdf")
}

pub fn page_image_filename(page: u32) -> String {
    format!("page_{page}_detections.jpg")
}

/// Default export file name, always a single path component.
pub fn export_filename(job_id: &str) -> String {
    let job_id: String = job_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("fire_alarm_analysis_{job_id}.json")
}

/// A parsed `data:<media type>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    /// Still base64 encoded
    pub payload: &'a str,
}

static DATA_URI: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^data:([\w.+-]+/[\w.+-]+)(?:;[^,;]+=[^,;]+)*;base64,(.*)$").ok()
});

/// Parse a base64 data URI. Anything else yields `None`.
pub fn parse_data_uri(uri: &str) -> Option<DataUri<'_>> {
    let caps = DATA_URI.as_ref()?.captures(uri.trim())?;

    Some(DataUri {
        media_type: caps.get(1)?.as_str(),
        payload: caps.get(2)?.as_str(),
    })
}

/// File extension for a thumbnail media type.
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    match media_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

pub fn thumbnail_filename(page: u32, media_type: &str) -> String {
    format!("page_{page}.{}", extension_for_media_type(media_type))
}
