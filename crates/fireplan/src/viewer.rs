//! Page image, annotated PDF and export downloads for a finished job.

use std::path::PathBuf;

use clap::builder::NonEmptyStringValueParser;
use fireplan_core::artifacts::{
    annotated_pdf_filename, export_filename, page_image_filename, ArtifactKind,
};
use fireplan_core::endpoints::{download_annotated_path, export_path, visualize_path};

use crate::prelude::{println, *};
use crate::session::Session;

#[derive(Debug, clap::Args)]
pub struct ViewOptions {
    /// Job id printed by `fireplan analyze`
    #[arg(value_name = "JOB_ID", value_parser = NonEmptyStringValueParser::new())]
    pub job_id: String,

    /// Page number (1-indexed)
    #[arg(value_name = "PAGE", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Output file path (default: page_<PAGE>_detections.jpg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct DownloadOptions {
    /// Job id printed by `fireplan analyze`
    #[arg(value_name = "JOB_ID", value_parser = NonEmptyStringValueParser::new())]
    pub job_id: String,

    /// Page number (1-indexed)
    #[arg(value_name = "PAGE", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Output file path (default: annotated_page_<PAGE>.pdf)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct ExportOptions {
    /// Job id printed by `fireplan analyze`
    #[arg(value_name = "JOB_ID", value_parser = NonEmptyStringValueParser::new())]
    pub job_id: String,

    /// Output file path (default: fire_alarm_analysis_<JOB_ID>.json)
    #[arg(short, long, conflicts_with = "url")]
    pub output: Option<PathBuf>,

    /// Only print the export address
    #[arg(long)]
    pub url: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn view(options: ViewOptions, global: crate::Global) -> Result<()> {
    let session = Session::new(&global, options.json)?;
    let output = options
        .output
        .unwrap_or_else(|| PathBuf::from(page_image_filename(options.page)));

    let saved = session
        .save_artifact(
            ArtifactKind::PageImage,
            &visualize_path(&options.job_id, options.page),
            &output,
            format!("page {} detections", options.page),
            Some(format!(
                "fireplan download {} {}",
                options.job_id, options.page
            )),
        )
        .await?;

    session.renderer().artifacts(&[saved])
}

pub async fn download(options: DownloadOptions, global: crate::Global) -> Result<()> {
    let session = Session::new(&global, options.json)?;
    let output = options
        .output
        .unwrap_or_else(|| PathBuf::from(annotated_pdf_filename(options.page)));

    let saved = session
        .save_artifact(
            ArtifactKind::AnnotatedPdf,
            &download_annotated_path(&options.job_id, options.page),
            &output,
            format!("annotated page {}", options.page),
            None,
        )
        .await?;

    session.renderer().artifacts(&[saved])
}

pub async fn export(options: ExportOptions, global: crate::Global) -> Result<()> {
    let session = Session::new(&global, options.json)?;
    let path = export_path(&options.job_id);

    if options.url {
        let url = session.api().url(&path);
        if options.json {
            println!("{}", serde_json::json!({ "url": url }));
        } else {
            println!("{url}");
        }
        return Ok(());
    }

    let output = options
        .output
        .unwrap_or_else(|| PathBuf::from(export_filename(&options.job_id)));

    let saved = session
        .save_artifact(
            ArtifactKind::Export,
            &path,
            &output,
            format!("analysis results of job {}", options.job_id),
            None,
        )
        .await?;

    session.renderer().artifacts(&[saved])
}
