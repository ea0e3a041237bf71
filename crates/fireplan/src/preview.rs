use std::path::{Path, PathBuf};

use base64::Engine;
use fireplan_core::artifacts::{parse_data_uri, thumbnail_filename, DataUri};

use crate::prelude::*;
use crate::render::PreviewEntry;
use crate::session::Session;

#[derive(Debug, clap::Args)]
pub struct PreviewOptions {
    /// PDF file to preview
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Decode the thumbnails into this directory
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: PreviewOptions, global: crate::Global) -> Result<()> {
    let mut session = Session::new(&global, options.json)?;

    session.select_file(&options.file).await?;
    let status = session.load_previews().await?;
    if global.verbose {
        session.renderer().status(&status)?;
    }

    let mut entries = Vec::new();
    for page in session.state().thumbnails() {
        let data_uri = parse_data_uri(&page.thumbnail);

        let saved_to = match (&options.out_dir, &data_uri) {
            (Some(dir), Some(uri)) => match save_thumbnail(dir, page.page_number, uri).await {
                Ok(path) => Some(path),
                Err(err) => {
                    session
                        .renderer()
                        .warning(&format!("Page {}: {err}", page.page_number));
                    None
                }
            },
            (Some(_), None) => {
                session.renderer().warning(&format!(
                    "Page {}: thumbnail is not a base64 data URI",
                    page.page_number
                ));
                None
            }
            (None, _) => None,
        };

        entries.push(PreviewEntry::new(
            page,
            data_uri.map(|uri| uri.media_type),
            saved_to,
        ));
    }

    session
        .renderer()
        .previews(&entries, session.state().selection())
}

fn decode_thumbnail(uri: &DataUri<'_>) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(uri.payload)
        .map_err(|e| eyre!("Invalid thumbnail data: {e}"))
}

async fn save_thumbnail(dir: &Path, page: u32, uri: &DataUri<'_>) -> Result<PathBuf> {
    let bytes = decode_thumbnail(uri)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| eyre!("Failed to create {}: {e}", dir.display()))?;

    let path = dir.join(thumbnail_filename(page, uri.media_type));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| eyre!("Failed to write file to {}: {e}", path.display()))?;

    Ok(path)
}
