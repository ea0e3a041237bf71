use fireplan_core::detection::DetectionView;
use fireplan_core::gemini::GeminiView;
use fireplan_core::selection::PageSelection;
use fireplan_core::status::StatusView;
use fireplan_core::upload::SelectedFile;
use serde::Serialize;

use super::{PreviewEntry, Renderer, SavedArtifact};
use crate::prelude::{eprintln, println, *};

/// Pretty JSON on stdout, warnings on stderr.
pub struct JsonRenderer;

fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn output<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", format_json(value)?);
    Ok(())
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    total_pages: usize,
    selected_pages: Vec<u32>,
    pages: &'a [PreviewEntry],
}

impl Renderer for JsonRenderer {
    fn status(&self, view: &StatusView) -> Result<()> {
        output(view)
    }

    fn file_selected(&self, file: &SelectedFile) -> Result<()> {
        log::info!("Selected {} ({} bytes)", file.name, file.size);
        Ok(())
    }

    fn previews(&self, entries: &[PreviewEntry], selection: &PageSelection) -> Result<()> {
        output(&PreviewOutput {
            total_pages: entries.len(),
            selected_pages: selection.selected(),
            pages: entries,
        })
    }

    fn detection(&self, view: &DetectionView) -> Result<()> {
        output(view)
    }

    fn gemini(&self, view: &GeminiView) -> Result<()> {
        output(view)
    }

    fn artifacts(&self, saved: &[SavedArtifact]) -> Result<()> {
        output(saved)
    }

    fn warning(&self, message: &str) {
        eprintln!("{}", serde_json::json!({ "warning": message }));
    }
}
