//! Analysis options, request fields and the per-analysis state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{join_pages, PageList};

/// Server-side default for the confidence threshold
pub const DEFAULT_CONFIDENCE: f64 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Local object detector over selected pages
    Local,
    /// Gemini document analysis over the whole file
    Gemini,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Local => write!(f, "device detection"),
            AnalysisKind::Gemini => write!(f, "Gemini AI analysis"),
        }
    }
}

/// Client-side validation failures. None of these ever reach the network.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please select a PDF file first")]
    NoFile,
    #[error("Please select at least one page to analyze")]
    NoPagesSelected,
    #[error("Pages not in the document: {0}")]
    UnknownPages(PageList),
    #[error("Confidence threshold must be between 0 and 1, got {0}")]
    InvalidConfidence(f64),
    #[error("A {0} request is already in progress")]
    AlreadyRunning(AnalysisKind),
    #[error("{0} is not available on the server")]
    Unavailable(AnalysisKind),
}

/// Options bundle sent with a local analysis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub skip_blank: bool,
    pub skip_edges: bool,
    pub use_parallel: bool,
    pub use_cache: bool,
    pub confidence: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            skip_blank: true,
            skip_edges: false,
            use_parallel: true,
            use_cache: true,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence) {
            Ok(())
        } else {
            Err(ValidationError::InvalidConfidence(self.confidence))
        }
    }

    /// Text form fields, in the order the server documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("skip_blank", self.skip_blank.to_string()),
            ("skip_edges", self.skip_edges.to_string()),
            ("use_parallel", self.use_parallel.to_string()),
            ("use_cache", self.use_cache.to_string()),
            ("confidence", self.confidence.to_string()),
        ]
    }
}

/// Everything the local analysis request needs besides the file bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalRequest {
    pub pages: Vec<u32>,
    pub options: AnalysisOptions,
}

impl LocalRequest {
    /// All text fields of the multipart body, `selected_pages` first.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("selected_pages", join_pages(&self.pages))];
        fields.extend(self.options.form_fields());
        fields
    }
}

/// Lifecycle of one analysis type.
///
/// A failure keeps whatever result was on screen before the request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState<T> {
    Idle,
    Submitting { previous: Option<T> },
    Succeeded(T),
    Failed { error: String, previous: Option<T> },
}

impl<T> Default for AnalysisState<T> {
    fn default() -> Self {
        AnalysisState::Idle
    }
}

impl<T> AnalysisState<T> {
    pub fn is_submitting(&self) -> bool {
        matches!(self, AnalysisState::Submitting { .. })
    }

    /// The result currently displayed, if any.
    pub fn result(&self) -> Option<&T> {
        match self {
            AnalysisState::Idle => None,
            AnalysisState::Submitting { previous } | AnalysisState::Failed { previous, .. } => {
                previous.as_ref()
            }
            AnalysisState::Succeeded(result) => Some(result),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn take_result(self) -> Option<T> {
        match self {
            AnalysisState::Idle => None,
            AnalysisState::Submitting { previous } | AnalysisState::Failed { previous, .. } => {
                previous
            }
            AnalysisState::Succeeded(result) => Some(result),
        }
    }

    /// Move to `Submitting`, refusing while a request is already in flight.
    pub fn begin(&mut self, kind: AnalysisKind) -> Result<(), ValidationError> {
        if self.is_submitting() {
            return Err(ValidationError::AlreadyRunning(kind));
        }

        let previous = std::mem::replace(self, AnalysisState::Idle).take_result();
        *self = AnalysisState::Submitting { previous };
        Ok(())
    }

    /// Settle the in-flight request.
    pub fn finish(&mut self, outcome: Result<T, String>) {
        let previous = std::mem::replace(self, AnalysisState::Idle).take_result();
        *self = match outcome {
            Ok(result) => AnalysisState::Succeeded(result),
            Err(error) => AnalysisState::Failed { error, previous },
        };
    }
}
