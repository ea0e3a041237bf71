//! Service availability indicators derived from `GET /api/check_status`.

use serde::Serialize;
use serde_json::Value;

use crate::api::StatusResponse;

/// Seconds between two status polls
pub const POLL_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Online,
    Offline,
}

impl Indicator {
    pub fn from_flag(ready: bool) -> Self {
        if ready {
            Indicator::Online
        } else {
            Indicator::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Indicator::Online)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemStatus {
    pub name: String,
    pub indicator: Indicator,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub detector: SubsystemStatus,
    pub llm: SubsystemStatus,
}

impl StatusView {
    pub fn detector_online(&self) -> bool {
        self.detector.indicator.is_online()
    }

    pub fn llm_online(&self) -> bool {
        self.llm.indicator.is_online()
    }
}

pub const DETECTOR_NAME: &str = "Local detector";
pub const LLM_NAME: &str = "Gemini AI";

/// Map the status flags to one indicator per subsystem.
pub fn status_view(status: &StatusResponse) -> StatusView {
    let detector_online = status.detector_configured();

    let detector_detail = if detector_online {
        detector_label(status)
    } else {
        status
            .local_detector_error
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| Some("Not configured".to_string()))
    };

    StatusView {
        detector: SubsystemStatus {
            name: DETECTOR_NAME.to_string(),
            indicator: Indicator::from_flag(detector_online),
            detail: detector_detail,
        },
        llm: SubsystemStatus {
            name: LLM_NAME.to_string(),
            indicator: Indicator::from_flag(status.gemini_configured),
            detail: Some(
                if status.gemini_configured {
                    "Configured"
                } else {
                    "Not configured"
                }
                .to_string(),
            ),
        },
    }
}

/// Both subsystems offline, used when the status query itself fails.
pub fn unreachable_view(error: &str) -> StatusView {
    let subsystem = |name: &str| SubsystemStatus {
        name: name.to_string(),
        indicator: Indicator::Offline,
        detail: Some(format!("Server unreachable: {error}")),
    };

    StatusView {
        detector: subsystem(DETECTOR_NAME),
        llm: subsystem(LLM_NAME),
    }
}

/// Model name, else the hosted `workspace/project/vN`, else the model path.
fn detector_label(status: &StatusResponse) -> Option<String> {
    let non_empty = |s: &Option<String>| s.clone().filter(|v| !v.trim().is_empty());

    if let Some(name) = non_empty(&status.local_model_name) {
        return Some(name);
    }

    if let (Some(workspace), Some(project)) = (
        non_empty(&status.roboflow_workspace),
        non_empty(&status.roboflow_project),
    ) {
        let version = match &status.roboflow_version {
            Some(Value::String(v)) if !v.trim().is_empty() => Some(v.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        return Some(match version {
            Some(v) => format!("{workspace}/{project}/v{v}"),
            None => format!("{workspace}/{project}"),
        });
    }

    non_empty(&status.local_model_filename)
        .or_else(|| non_empty(&status.local_model_path))
        .or_else(|| non_empty(&status.model_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: Value) -> StatusResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_view_all_online() {
        let view = status_view(&status(json!({
            "local_model_configured": true,
            "gemini_configured": true,
            "local_model_name": "fa_yolo_v8"
        })));

        assert!(view.detector_online());
        assert!(view.llm_online());
        assert_eq!(view.detector.detail.as_deref(), Some("fa_yolo_v8"));
        assert_eq!(view.llm.detail.as_deref(), Some("Configured"));
    }

    #[test]
    fn test_status_view_detector_error() {
        let view = status_view(&status(json!({
            "local_model_configured": false,
            "gemini_configured": false,
            "local_detector_error": "Model file not found"
        })));

        assert_eq!(view.detector.indicator, Indicator::Offline);
        assert_eq!(view.detector.detail.as_deref(), Some("Model file not found"));
        assert_eq!(view.llm.indicator, Indicator::Offline);
    }

    #[test]
    fn test_status_view_roboflow_label() {
        let view = status_view(&status(json!({
            "roboflow_configured": true,
            "roboflow_workspace": "acme",
            "roboflow_project": "fire-alarm",
            "roboflow_version": "3"
        })));

        assert_eq!(view.detector.detail.as_deref(), Some("acme/fire-alarm/v3"));
    }

    #[test]
    fn test_status_view_model_path_label() {
        let view = status_view(&status(json!({
            "local_model_configured": true,
            "model_path": "/models/best.pt"
        })));

        assert_eq!(view.detector.detail.as_deref(), Some("/models/best.pt"));
    }

    #[test]
    fn test_unreachable_view() {
        let view = unreachable_view("connection refused");

        assert!(!view.detector_online());
        assert!(!view.llm_online());
        assert!(view
            .llm
            .detail
            .as_deref()
            .unwrap()
            .contains("connection refused"));
    }
}
