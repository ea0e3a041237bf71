use std::path::PathBuf;

use crate::prelude::*;
use crate::session::Session;

#[derive(Debug, clap::Args)]
pub struct GeminiOptions {
    /// PDF file to analyze
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: GeminiOptions, global: crate::Global) -> Result<()> {
    let mut session = Session::new(&global, options.json)?;

    session.select_file(&options.file).await?;

    let status = session.poll_status().await;
    if global.verbose {
        session.renderer().status(&status)?;
    }

    session.run_gemini().await?;

    Ok(())
}
