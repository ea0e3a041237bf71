//! Response shapes of the analysis service.
//!
//! Fields the client only forwards to a transformation are kept as raw
//! [`serde_json::Value`]s so a malformed section never fails the whole
//! response; the view builders decide how to degrade.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /api/check_status`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StatusResponse {
    pub local_model_configured: Option<bool>,
    /// Older deployments report the hosted detector instead of a local model
    pub roboflow_configured: Option<bool>,
    #[serde(default)]
    pub gemini_configured: bool,
    pub local_model_name: Option<String>,
    pub local_model_filename: Option<String>,
    pub local_model_path: Option<String>,
    pub model_path: Option<String>,
    pub local_detector_error: Option<String>,
    pub roboflow_workspace: Option<String>,
    pub roboflow_project: Option<String>,
    pub roboflow_version: Option<Value>,
}

impl StatusResponse {
    /// Whether any detector backend reports itself as ready.
    pub fn detector_configured(&self) -> bool {
        self.local_model_configured
            .or(self.roboflow_configured)
            .unwrap_or(false)
    }
}

/// One thumbnail descriptor from `POST /api/preview_pages`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PageThumbnail {
    pub page_number: u32,
    /// `data:` URI holding the encoded image
    pub thumbnail: String,
}

/// `POST /api/preview_pages`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PreviewResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageThumbnail>,
    pub total_pages: Option<u64>,
}

/// `POST /api/analyze`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub job_id: Option<String>,
    pub total_devices: Option<u64>,
    pub pages_with_devices: Option<u64>,
    pub total_pages: Option<u64>,
    pub selected_pages: Option<Vec<u32>>,
    /// Handed to the aggregator as-is; absent, `null` or non-array means no pages
    #[serde(default)]
    pub page_analyses: Value,
}

/// `POST /api/analyze_gemini`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GeminiResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub job_id: Option<String>,
    #[serde(default)]
    pub project_info: Value,
    #[serde(default)]
    pub code_requirements: Value,
    #[serde(default)]
    pub fire_alarm_pages: Value,
    #[serde(default)]
    pub fire_alarm_notes: Value,
    #[serde(default)]
    pub mechanical_devices: Value,
    #[serde(default)]
    pub specifications: Value,
    pub total_pages: Option<u64>,
    pub analysis_timestamp: Option<String>,
}

/// Error body returned by every endpoint on failure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ErrorEnvelope {
    pub success: Option<bool>,
    pub error: Option<String>,
}

/// Responses carrying the `success` / `error` pair.
pub trait ApiOutcome {
    fn success(&self) -> bool;
    fn error_message(&self) -> Option<&str>;
}

macro_rules! impl_api_outcome {
    ($($ty:ty),*) => {
        $(
            impl ApiOutcome for $ty {
                fn success(&self) -> bool {
                    self.success
                }

                fn error_message(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )*
    };
}

impl_api_outcome!(PreviewResponse, AnalyzeResponse, GeminiResponse);

/// Fallback shown when the server says `success: false` without a reason
pub const UNKNOWN_SERVER_ERROR: &str = "Unknown error";

/// Turn a `success: false` response into its error message.
pub fn into_outcome<T: ApiOutcome>(response: T) -> Result<T, String> {
    if response.success() {
        Ok(response)
    } else {
        Err(response
            .error_message()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(UNKNOWN_SERVER_ERROR)
            .to_string())
    }
}

/// Extract the `error` string from an arbitrary error body, if it has one.
pub fn error_from_body(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    envelope.error.filter(|e| !e.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_response_local_model() {
        let status: StatusResponse = serde_json::from_value(json!({
            "local_model_configured": true,
            "gemini_configured": false,
            "local_model_name": "fa_devices_v3",
            "model_path": null
        }))
        .unwrap();

        assert!(status.detector_configured());
        assert!(!status.gemini_configured);
        assert_eq!(status.local_model_name.as_deref(), Some("fa_devices_v3"));
    }

    #[test]
    fn test_status_response_legacy_roboflow() {
        let status: StatusResponse = serde_json::from_value(json!({
            "roboflow_configured": true,
            "gemini_configured": true,
            "roboflow_workspace": "acme",
            "roboflow_project": "fire-alarm",
            "roboflow_version": 4
        }))
        .unwrap();

        assert!(status.detector_configured());
        assert_eq!(status.roboflow_version, Some(json!(4)));
    }

    #[test]
    fn test_status_response_empty_body() {
        let status: StatusResponse = serde_json::from_value(json!({})).unwrap();

        assert!(!status.detector_configured());
        assert!(!status.gemini_configured);
    }

    #[test]
    fn test_analyze_response_missing_page_analyses() {
        let response: AnalyzeResponse =
            serde_json::from_value(json!({"success": true, "job_id": "abc"})).unwrap();

        assert!(response.page_analyses.is_null());
        assert_eq!(response.job_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_into_outcome_success() {
        let response = PreviewResponse {
            success: true,
            ..Default::default()
        };

        assert!(into_outcome(response).is_ok());
    }

    #[test]
    fn test_into_outcome_failure_with_message() {
        let response = AnalyzeResponse {
            success: false,
            error: Some("Local detector not initialized".to_string()),
            ..Default::default()
        };

        assert_eq!(
            into_outcome(response).unwrap_err(),
            "Local detector not initialized"
        );
    }

    #[test]
    fn test_into_outcome_failure_without_message() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();

        assert_eq!(into_outcome(response).unwrap_err(), UNKNOWN_SERVER_ERROR);
    }

    #[test]
    fn test_error_from_body() {
        assert_eq!(
            error_from_body(br#"{"success": false, "error": "Job not found"}"#),
            Some("Job not found".to_string())
        );
        assert_eq!(error_from_body(b"%PDF-1.7"), None);
        assert_eq!(error_from_body(br#"{"error": "  "}"#), None);
    }
}
