//! Output of every controller goes through a [`Renderer`], so the session
//! logic never writes to the terminal directly.

use std::path::PathBuf;

use fireplan_core::api::PageThumbnail;
use fireplan_core::detection::DetectionView;
use fireplan_core::gemini::GeminiView;
use fireplan_core::selection::PageSelection;
use fireplan_core::status::StatusView;
use fireplan_core::upload::SelectedFile;
use serde::Serialize;

use crate::prelude::*;

pub mod json;
pub mod terminal;

/// An artifact written to disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedArtifact {
    pub label: String,
    pub path: PathBuf,
    pub bytes: usize,
    /// Follow-up command offered next to the artifact
    pub hint: Option<String>,
}

/// A thumbnail from the preview grid, with where it was saved if it was
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewEntry {
    pub page_number: u32,
    pub media_type: Option<String>,
    pub saved_to: Option<PathBuf>,
}

impl PreviewEntry {
    pub fn new(page: &PageThumbnail, media_type: Option<&str>, saved_to: Option<PathBuf>) -> Self {
        Self {
            page_number: page.page_number,
            media_type: media_type.map(str::to_string),
            saved_to,
        }
    }
}

pub trait Renderer {
    fn status(&self, view: &StatusView) -> Result<()>;

    fn file_selected(&self, file: &SelectedFile) -> Result<()>;

    fn previews(&self, entries: &[PreviewEntry], selection: &PageSelection) -> Result<()>;

    fn detection(&self, view: &DetectionView) -> Result<()>;

    fn gemini(&self, view: &GeminiView) -> Result<()>;

    fn artifacts(&self, saved: &[SavedArtifact]) -> Result<()>;

    /// Non-fatal problem; the command keeps going.
    fn warning(&self, message: &str);
}

pub fn renderer(json: bool) -> Box<dyn Renderer> {
    if json {
        Box::new(json::JsonRenderer)
    } else {
        Box::new(terminal::TerminalRenderer)
    }
}
