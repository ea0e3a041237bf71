//! UI state for one client session.
//!
//! Built once at start-up and owned by the shell, which performs the network
//! calls and feeds their outcomes back through the transitions below.

use serde::Serialize;

use crate::analysis::{
    AnalysisKind, AnalysisOptions, AnalysisState, LocalRequest, ValidationError,
};
use crate::api::{AnalyzeResponse, GeminiResponse, PageThumbnail};
use crate::detection::{build_detection_view, DetectionView};
use crate::gemini::{build_gemini_view, GeminiView};
use crate::selection::{PageList, PageSelection};
use crate::status::StatusView;
use crate::upload::{validate_upload, FileCandidate, SelectedFile, UploadError};

/// Which actions are currently allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub preview: bool,
    pub select_pages: bool,
    pub local_analysis: bool,
    pub gemini_analysis: bool,
}

#[derive(Debug, Default)]
pub struct UiState {
    active_file: Option<SelectedFile>,
    thumbnails: Vec<PageThumbnail>,
    selection: PageSelection,
    job_id: Option<String>,
    status: Option<StatusView>,
    local: AnalysisState<DetectionView>,
    gemini: AnalysisState<GeminiView>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_file(&self) -> Option<&SelectedFile> {
        self.active_file.as_ref()
    }

    pub fn thumbnails(&self) -> &[PageThumbnail] {
        &self.thumbnails
    }

    pub fn selection(&self) -> &PageSelection {
        &self.selection
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn status(&self) -> Option<&StatusView> {
        self.status.as_ref()
    }

    pub fn local(&self) -> &AnalysisState<DetectionView> {
        &self.local
    }

    pub fn gemini(&self) -> &AnalysisState<GeminiView> {
        &self.gemini
    }

    /// Back to the idle baseline: no file, no grid, no job, no results.
    pub fn reset(&mut self) {
        self.active_file = None;
        self.thumbnails.clear();
        self.selection.clear();
        self.job_id = None;
        self.local = AnalysisState::Idle;
        self.gemini = AnalysisState::Idle;
    }

    /// Validate and store a newly picked file. Any outcome discards the
    /// previous file's grid, selection, job id and results.
    pub fn select_file(
        &mut self,
        candidate: Option<FileCandidate>,
    ) -> Result<&SelectedFile, UploadError> {
        self.reset();
        let file = validate_upload(candidate)?;
        Ok(&*self.active_file.insert(file))
    }

    /// Replace the preview grid. The selection starts empty.
    pub fn load_previews(&mut self, pages: Vec<PageThumbnail>) {
        self.selection = PageSelection::with_pages(pages.iter().map(|p| p.page_number));
        self.thumbnails = pages;
    }

    /// Preview generation failed: no grid, nothing selectable.
    pub fn preview_failed(&mut self) {
        self.thumbnails.clear();
        self.selection.clear();
    }

    pub fn toggle_page(&mut self, page: u32) -> bool {
        self.selection.toggle(page)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    /// Select exactly `pages`. Pages without a thumbnail are rejected and the
    /// selection is left untouched.
    pub fn select_pages(&mut self, pages: &PageList) -> Result<(), ValidationError> {
        let unknown = self.selection.unknown_pages(pages);
        if !unknown.is_empty() {
            return Err(ValidationError::UnknownPages(unknown));
        }

        self.selection.select_only(pages);
        Ok(())
    }

    pub fn apply_status(&mut self, status: StatusView) {
        self.status = Some(status);
    }

    pub fn availability(&self) -> Availability {
        let has_file = self.active_file.is_some();
        let llm_online = self.status.as_ref().is_some_and(StatusView::llm_online);

        Availability {
            preview: has_file,
            select_pages: !self.thumbnails.is_empty(),
            local_analysis: has_file && !self.local.is_submitting(),
            gemini_analysis: has_file && llm_online && !self.gemini.is_submitting(),
        }
    }

    /// Validate a local analysis and move it to `Submitting`.
    pub fn begin_local(&mut self, options: AnalysisOptions) -> Result<LocalRequest, ValidationError> {
        if self.active_file.is_none() {
            return Err(ValidationError::NoFile);
        }
        if self.selection.is_empty() {
            return Err(ValidationError::NoPagesSelected);
        }
        options.validate()?;

        self.local.begin(AnalysisKind::Local)?;

        Ok(LocalRequest {
            pages: self.selection.selected(),
            options,
        })
    }

    /// Validate a Gemini analysis and move it to `Submitting`.
    ///
    /// The LLM must have been reported as configured by the last status poll.
    pub fn begin_gemini(&mut self) -> Result<(), ValidationError> {
        if self.active_file.is_none() {
            return Err(ValidationError::NoFile);
        }
        if !self.status.as_ref().is_some_and(StatusView::llm_online) {
            return Err(ValidationError::Unavailable(AnalysisKind::Gemini));
        }

        self.gemini.begin(AnalysisKind::Gemini)
    }

    /// Settle the local analysis. A success records the job id.
    pub fn finish_local(&mut self, outcome: Result<AnalyzeResponse, String>) {
        let outcome = outcome.map(|response| {
            if let Some(job_id) = response.job_id.clone() {
                self.job_id = Some(job_id);
            }
            build_detection_view(&response)
        });
        self.local.finish(outcome);
    }

    /// Settle the Gemini analysis. A success records the job id when the
    /// server sends one.
    pub fn finish_gemini(&mut self, outcome: Result<GeminiResponse, String>) {
        let outcome = outcome.map(|response| {
            if let Some(job_id) = response.job_id.clone() {
                self.job_id = Some(job_id);
            }
            build_gemini_view(&response)
        });
        self.gemini.finish(outcome);
    }
}
