//! HTTP client for the analysis service.

use std::time::Duration;

use fireplan_core::analysis::LocalRequest;
use fireplan_core::api::{
    error_from_body, into_outcome, AnalyzeResponse, ApiOutcome, GeminiResponse, PageThumbnail,
    PreviewResponse, StatusResponse,
};
use fireplan_core::artifacts::{classify_artifact, ArtifactKind};
use fireplan_core::endpoints::{self, join_url};
use fireplan_core::upload::PDF_MEDIA_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::error::Error;

/// PDF bytes read once from disk and attached to every upload
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    /// Multipart form with the PDF under the `pdf` field.
    fn form(&self) -> Result<Form, Error> {
        let part = Part::bytes(self.bytes.clone())
            .file_name(self.name.clone())
            .mime_str(PDF_MEDIA_TYPE)
            .map_err(|e| Error::Validation(format!("Invalid MIME type: {e}")))?;

        Ok(Form::new().part(endpoints::PDF_FIELD, part))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub async fn check_status(&self) -> Result<StatusResponse, Error> {
        let url = self.url(endpoints::CHECK_STATUS);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let response = check_response(response, "Failed to check status").await?;

        response
            .json()
            .await
            .map_err(|e| Error::Response(format!("Failed to parse status response: {e}")))
    }

    pub async fn preview_pages(&self, upload: &PdfUpload) -> Result<Vec<PageThumbnail>, Error> {
        let response: PreviewResponse = self
            .post_form(endpoints::PREVIEW_PAGES, upload.form()?)
            .await?;

        if response.pages.is_empty() {
            return Err(Error::Response(
                "The server returned no page previews".to_string(),
            ));
        }

        Ok(response.pages)
    }

    pub async fn analyze(
        &self,
        upload: &PdfUpload,
        request: &LocalRequest,
    ) -> Result<AnalyzeResponse, Error> {
        let mut form = upload.form()?;
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }

        self.post_form(endpoints::ANALYZE, form).await
    }

    pub async fn analyze_gemini(&self, upload: &PdfUpload) -> Result<GeminiResponse, Error> {
        self.post_form(endpoints::ANALYZE_GEMINI, upload.form()?)
            .await
    }

    /// Fetch a binary artifact and make sure the body is what was asked for.
    pub async fn fetch_artifact(&self, kind: ArtifactKind, path: &str) -> Result<Vec<u8>, Error> {
        let url = self.url(path);
        log::debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let response = check_response(response, kind.fallback_error()).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        log::debug!(
            "GET {url} -> {} ({} bytes)",
            content_type.as_deref().unwrap_or("no content type"),
            body.len()
        );

        classify_artifact(kind, content_type.as_deref(), &body)
            .map(<[u8]>::to_vec)
            .map_err(Error::Response)
    }

    async fn post_form<T>(&self, path: &str, form: Form) -> Result<T, Error>
    where
        T: DeserializeOwned + ApiOutcome,
    {
        let url = self.url(path);
        log::debug!("POST {url}");

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        log::debug!("POST {url} -> {status} ({} bytes)", body.len());

        match serde_json::from_slice::<T>(&body) {
            Ok(parsed) => into_outcome(parsed).map_err(Error::Server),
            Err(_) if !status.is_success() => Err(Error::Server(
                error_from_body(&body).unwrap_or_else(|| format!("HTTP {status}")),
            )),
            Err(e) => Err(Error::Response(format!(
                "Invalid response from server: {e}"
            ))),
        }
    }
}

/// Check that an HTTP response was successful, returning a descriptive error otherwise.
async fn check_response(
    response: reqwest::Response,
    context: &str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let detail = error_from_body(&body).unwrap_or_else(|| format!("HTTP {status}"));
    Err(Error::Server(format!("{context} [{status}]: {detail}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        body::Bytes,
        extract::{Path, State},
        http::{header, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Json, Router,
    };
    use fireplan_core::analysis::AnalysisOptions;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    pub(crate) async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    pub(crate) fn upload() -> PdfUpload {
        PdfUpload {
            name: "plans.pdf".to_string(),
            bytes: b"%PDF-1.7 test".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_check_status() {
        let router = Router::new().route(
            "/api/check_status",
            get(|| async {
                Json(json!({
                    "local_model_configured": true,
                    "gemini_configured": false,
                    "local_model_name": "fa_yolo_v8"
                }))
            }),
        );
        let base_url = spawn_server(router).await;

        let status = client(&base_url).check_status().await.unwrap();

        assert!(status.detector_configured());
        assert!(!status.gemini_configured);
        assert_eq!(status.local_model_name.as_deref(), Some("fa_yolo_v8"));
    }

    #[tokio::test]
    async fn test_check_status_server_error() {
        let router = Router::new().route(
            "/api/check_status",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base_url = spawn_server(router).await;

        let err = client(&base_url).check_status().await.unwrap_err();

        assert!(matches!(err, Error::Server(ref msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .check_status()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_preview_pages() {
        let router = Router::new().route(
            "/api/preview_pages",
            post(|| async {
                Json(json!({
                    "success": true,
                    "pages": [
                        {"page_number": 1, "thumbnail": "data:image/jpeg;base64,AAAA"},
                        {"page_number": 2, "thumbnail": "data:image/jpeg;base64,BBBB"}
                    ]
                }))
            }),
        );
        let base_url = spawn_server(router).await;

        let pages = client(&base_url).preview_pages(&upload()).await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].page_number, 2);
    }

    #[tokio::test]
    async fn test_preview_pages_failure() {
        let router = Router::new().route(
            "/api/preview_pages",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"success": false, "error": "Invalid PDF file"})),
                )
            }),
        );
        let base_url = spawn_server(router).await;

        let err = client(&base_url)
            .preview_pages(&upload())
            .await
            .unwrap_err();

        assert_eq!(err, Error::Server("Invalid PDF file".to_string()));
    }

    #[tokio::test]
    async fn test_preview_pages_malformed() {
        let router = Router::new().route(
            "/api/preview_pages",
            post(|| async { Json(json!({"success": true, "pages": "nope"})) }),
        );
        let base_url = spawn_server(router).await;

        let err = client(&base_url)
            .preview_pages(&upload())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Response(_)));
    }

    #[tokio::test]
    async fn test_analyze_sends_form_fields() {
        let captured: Arc<Mutex<String>> = Arc::default();
        let router = Router::new()
            .route(
                "/api/analyze",
                post(
                    |State(captured): State<Arc<Mutex<String>>>, body: Bytes| async move {
                        *captured.lock().unwrap() = String::from_utf8_lossy(&body).to_string();
                        Json(json!({
                            "success": true,
                            "job_id": "job-1",
                            "total_devices": 1,
                            "page_analyses": [
                                {"page_number": 3, "devices": [{"device_type": "Horn Strobe", "confidence": 0.8}]}
                            ]
                        }))
                    },
                ),
            )
            .with_state(captured.clone());
        let base_url = spawn_server(router).await;
        let request = LocalRequest {
            pages: vec![1, 3],
            options: AnalysisOptions {
                confidence: 0.55,
                ..Default::default()
            },
        };

        let response = client(&base_url)
            .analyze(&upload(), &request)
            .await
            .unwrap();

        assert_eq!(response.job_id.as_deref(), Some("job-1"));
        let body = captured.lock().unwrap().clone();
        assert!(body.contains("name=\"pdf\"; filename=\"plans.pdf\""));
        assert!(body.contains("name=\"selected_pages\"\r\n\r\n1,3"));
        assert!(body.contains("name=\"skip_blank\"\r\n\r\ntrue"));
        assert!(body.contains("name=\"confidence\"\r\n\r\n0.55"));
    }

    #[tokio::test]
    async fn test_analyze_server_failure() {
        let router = Router::new().route(
            "/api/analyze",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"success": false, "error": "Local detector not initialized"})),
                )
            }),
        );
        let base_url = spawn_server(router).await;
        let request = LocalRequest {
            pages: vec![1],
            options: AnalysisOptions::default(),
        };

        let err = client(&base_url)
            .analyze(&upload(), &request)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            Error::Server("Local detector not initialized".to_string())
        );
    }

    #[tokio::test]
    async fn test_analyze_gemini() {
        let router = Router::new().route(
            "/api/analyze_gemini",
            post(|| async {
                Json(json!({
                    "success": true,
                    "project_info": {"project_name": "Riverside Clinic"},
                    "total_pages": 12
                }))
            }),
        );
        let base_url = spawn_server(router).await;

        let response = client(&base_url).analyze_gemini(&upload()).await.unwrap();

        assert_eq!(response.total_pages, Some(12));
        assert_eq!(response.project_info["project_name"], "Riverside Clinic");
    }

    fn artifact_router() -> Router {
        Router::new().route(
            "/api/download_annotated_pdf/{job}/{page}",
            get(|Path((job, page)): Path<(String, u32)>| async move {
                match (job.as_str(), page) {
                    ("job-1", 1) => (
                        [(header::CONTENT_TYPE, "application/pdf")],
                        b"%PDF-1.4 annotated".to_vec(),
                    )
                        .into_response(),
                    ("job-1", _) => Json(json!({"success": false, "error": "No analysis for page"}))
                        .into_response(),
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(json!({"success": false, "error": "Job not found"})),
                    )
                        .into_response(),
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_annotated_pdf() {
        let base_url = spawn_server(artifact_router()).await;
        let api = client(&base_url);

        let pdf = api
            .fetch_artifact(
                ArtifactKind::AnnotatedPdf,
                &endpoints::download_annotated_path("job-1", 1),
            )
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let err = api
            .fetch_artifact(
                ArtifactKind::AnnotatedPdf,
                &endpoints::download_annotated_path("job-1", 4),
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::Response("No analysis for page".to_string()));

        let err = api
            .fetch_artifact(
                ArtifactKind::AnnotatedPdf,
                &endpoints::download_annotated_path("missing", 1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Server(ref msg) if msg.contains("Job not found")));
    }
}
