use std::path::PathBuf;

use clap::ArgAction;
use fireplan_core::analysis::{AnalysisOptions, DEFAULT_CONFIDENCE};
use fireplan_core::selection::parse_page_list;

use crate::prelude::*;
use crate::session::Session;

#[derive(Debug, clap::Args)]
pub struct AnalyzeOptions {
    /// PDF file to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Pages to analyze, e.g. 1,3,5-8
    #[arg(
        short,
        long,
        value_name = "LIST",
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    pub pages: Option<String>,

    /// Analyze every page of the document
    #[arg(long)]
    pub all: bool,

    /// Skip pages without drawing content
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub skip_blank: bool,

    /// Drop detections along the page border
    #[arg(long, value_name = "BOOL", default_value_t = false, action = ArgAction::Set)]
    pub skip_edges: bool,

    /// Let the server process pages in parallel
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub parallel: bool,

    /// Reuse cached results for pages analyzed before
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    pub cache: bool,

    /// Minimum detection confidence, between 0 and 1
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    pub confidence: f64,

    /// Download the annotated PDF of every page with detections into this directory
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeOptions {
    fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            skip_blank: self.skip_blank,
            skip_edges: self.skip_edges,
            use_parallel: self.parallel,
            use_cache: self.cache,
            confidence: self.confidence,
        }
    }
}

pub async fn run(options: AnalyzeOptions, global: crate::Global) -> Result<()> {
    let analysis_options = options.analysis_options();
    analysis_options.validate().map_err(Error::from)?;
    let pages = options
        .pages
        .as_deref()
        .map(parse_page_list)
        .transpose()
        .map_err(Error::from)?;

    let mut session = Session::new(&global, options.json)?;
    session.select_file(&options.file).await?;

    let status = session.load_previews().await?;
    if global.verbose {
        session.renderer().status(&status)?;
    }
    if !status.detector_online() {
        session
            .renderer()
            .warning("The local detector is reported offline, the analysis will likely fail");
    }

    match pages {
        Some(pages) => session.select_pages(&pages)?,
        None => session.select_all(),
    }

    let view = session.run_local(analysis_options).await?;

    if let Some(dir) = &options.download_dir {
        session.download_annotated_pages(&view, dir).await?;
    }

    Ok(())
}
