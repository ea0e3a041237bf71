//! Controllers that move [`UiState`] through the network calls of one run.
//!
//! A session owns the state, the API client and the renderer. Every
//! controller validates through the state first, so nothing is sent when the
//! state refuses a transition.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fireplan_core::analysis::{AnalysisKind, AnalysisOptions, ValidationError};
use fireplan_core::api::StatusResponse;
use fireplan_core::artifacts::{annotated_pdf_filename, ArtifactKind};
use fireplan_core::detection::DetectionView;
use fireplan_core::endpoints::download_annotated_path;
use fireplan_core::gemini::GeminiView;
use fireplan_core::selection::{join_pages, PageList};
use fireplan_core::state::UiState;
use fireplan_core::status::{status_view, unreachable_view, StatusView};
use fireplan_core::upload::FileCandidate;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiClient, PdfUpload};
use crate::render::{self, Renderer, SavedArtifact};
use crate::prelude::*;

pub struct Session {
    state: UiState,
    api: ApiClient,
    renderer: Box<dyn Renderer>,
    upload: Option<PdfUpload>,
    /// No spinner; stdout carries machine-readable output
    quiet: bool,
}

impl Session {
    pub fn new(global: &crate::Global, json: bool) -> Result<Self> {
        let api = ApiClient::new(&global.server, Duration::from_secs(global.timeout))?;
        Ok(Self::with_client(api, render::renderer(json), json))
    }

    pub fn with_client(api: ApiClient, renderer: Box<dyn Renderer>, quiet: bool) -> Self {
        Self {
            state: UiState::new(),
            api,
            renderer,
            upload: None,
            quiet,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.into());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    fn apply_status(&mut self, outcome: std::result::Result<StatusResponse, Error>) -> StatusView {
        let view = match outcome {
            Ok(status) => status_view(&status),
            Err(err) => {
                log::warn!("Status check failed: {err}");
                unreachable_view(&err.to_string())
            }
        };

        self.state.apply_status(view.clone());
        log::debug!("Availability: {:?}", self.state.availability());
        view
    }

    /// One status poll. A failed query marks both services offline.
    pub async fn poll_status(&mut self) -> StatusView {
        let outcome = self.api.check_status().await;
        self.apply_status(outcome)
    }

    /// Validate a PDF on disk and make it the active file.
    ///
    /// The size and type checks run on metadata alone, so a rejected file is
    /// never read nor sent.
    pub async fn select_file(&mut self, path: &Path) -> Result<()> {
        self.upload = None;

        let candidate = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Some(FileCandidate {
                path: path.to_path_buf(),
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string()),
                media_type: None,
                size: meta.len(),
            }),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Failed to stat {}: {e}", path.display());
                None
            }
        };
        let missing = candidate.is_none();

        let file = match self.state.select_file(candidate) {
            Ok(file) => file.clone(),
            Err(_) if missing => {
                return Err(
                    Error::Validation(format!("File not found: {}", path.display())).into(),
                )
            }
            Err(err) => return Err(Error::from(err).into()),
        };

        let bytes = match tokio::fs::read(&file.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state.reset();
                return Err(eyre!("Failed to read {}: {e}", file.path.display()));
            }
        };

        log::info!("Selected {} ({} bytes)", file.name, file.size);
        self.upload = Some(PdfUpload {
            name: file.name.clone(),
            bytes,
        });
        log::debug!("Availability: {:?}", self.state.availability());
        self.renderer.file_selected(&file)
    }

    /// Generate page previews, polling the status alongside.
    ///
    /// On failure no grid is left behind, so no page can be selected.
    pub async fn load_previews(&mut self) -> Result<StatusView> {
        let upload = require_upload(&self.upload)?;
        let spinner = self.spinner(format!("Generating page previews for {}...", upload.name));

        let (status, previews) = futures::join!(
            self.api.check_status(),
            self.api.preview_pages(upload)
        );
        spinner.finish_and_clear();

        let status = self.apply_status(status);
        match previews {
            Ok(pages) => {
                log::info!("Received {} page previews", pages.len());
                self.state.load_previews(pages);
                Ok(status)
            }
            Err(err) => {
                self.state.preview_failed();
                Err(eyre!(err).wrap_err("Failed to generate page previews"))
            }
        }
    }

    pub fn select_all(&mut self) {
        self.state.select_all();
    }

    pub fn select_pages(&mut self, pages: &PageList) -> Result<()> {
        self.state.select_pages(pages).map_err(Error::from)?;
        Ok(())
    }

    /// Run the local detector over the selected pages.
    ///
    /// A failure keeps any earlier result in the state.
    pub async fn run_local(&mut self, options: AnalysisOptions) -> Result<DetectionView> {
        let upload = require_upload(&self.upload)?;
        let request = self.state.begin_local(options).map_err(Error::from)?;
        log::info!(
            "Submitting pages {} for {}",
            join_pages(&request.pages),
            AnalysisKind::Local
        );

        let spinner = self.spinner(format!(
            "Analyzing {} page(s) of {}...",
            request.pages.len(),
            upload.name
        ));
        let outcome = self.api.analyze(upload, &request).await;
        spinner.finish_and_clear();

        let failure = outcome.as_ref().err().cloned();
        self.state.finish_local(outcome.map_err(|e| e.to_string()));
        if let Some(err) = failure {
            return Err(err.into());
        }

        let view = self
            .state
            .local()
            .result()
            .cloned()
            .ok_or_eyre("Analysis finished without a result")?;
        self.renderer.detection(&view)?;
        Ok(view)
    }

    /// Run the Gemini analysis over the whole file.
    ///
    /// Refused without a request when the last status poll reported the
    /// service as not configured.
    pub async fn run_gemini(&mut self) -> Result<GeminiView> {
        let upload = require_upload(&self.upload)?;
        self.state.begin_gemini().map_err(Error::from)?;
        log::info!("Submitting {} for {}", upload.name, AnalysisKind::Gemini);

        let spinner = self.spinner("Running Gemini AI analysis, this can take a few minutes...");
        let outcome = self.api.analyze_gemini(upload).await;
        spinner.finish_and_clear();

        let failure = outcome.as_ref().err().cloned();
        self.state.finish_gemini(outcome.map_err(|e| e.to_string()));
        if let Some(err) = failure {
            return Err(err.into());
        }

        let view = self
            .state
            .gemini()
            .result()
            .cloned()
            .ok_or_eyre("Analysis finished without a result")?;
        self.renderer.gemini(&view)?;
        Ok(view)
    }

    /// Fetch one artifact and write it to `output`.
    pub async fn save_artifact(
        &self,
        kind: ArtifactKind,
        path: &str,
        output: &Path,
        label: String,
        hint: Option<String>,
    ) -> Result<SavedArtifact> {
        let bytes = self.api.fetch_artifact(kind, path).await?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create {}: {e}", parent.display()))?;
        }
        tokio::fs::write(output, &bytes)
            .await
            .map_err(|e| eyre!("Failed to write file to {}: {e}", output.display()))?;
        log::info!("Wrote {} bytes to {}", bytes.len(), output.display());

        Ok(SavedArtifact {
            label,
            path: output.to_path_buf(),
            bytes: bytes.len(),
            hint,
        })
    }

    /// Download the annotated PDF of every page with detections into `dir`.
    ///
    /// Pages that fail are reported as warnings and skipped.
    pub async fn download_annotated_pages(
        &self,
        view: &DetectionView,
        dir: &Path,
    ) -> Result<Vec<SavedArtifact>> {
        let Some(job_id) = view.job_id.as_deref() else {
            self.renderer
                .warning("The server returned no job id, nothing to download");
            return Ok(Vec::new());
        };

        let downloads = view.page_cards.iter().map(|card| {
            let output: PathBuf = dir.join(annotated_pdf_filename(card.page_number));
            async move {
                let result = self
                    .save_artifact(
                        ArtifactKind::AnnotatedPdf,
                        &download_annotated_path(job_id, card.page_number),
                        &output,
                        format!("annotated page {}", card.page_number),
                        None,
                    )
                    .await;
                (card.page_number, result)
            }
        });

        let mut saved = Vec::new();
        for (page, result) in join_all(downloads).await {
            match result {
                Ok(artifact) => saved.push(artifact),
                Err(err) => self.renderer.warning(&format!("Page {page}: {err}")),
            }
        }

        self.renderer.artifacts(&saved)?;
        Ok(saved)
    }
}

fn require_upload(upload: &Option<PdfUpload>) -> Result<&PdfUpload> {
    upload
        .as_ref()
        .ok_or_else(|| Error::from(ValidationError::NoFile).into())
}
