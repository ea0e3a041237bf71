use crate::prelude::*;
use clap::Parser;

mod analyze;
mod api;
mod error;
mod gemini;
mod prelude;
mod preview;
mod render;
mod session;
mod status;
mod viewer;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Analyze fire alarm plan PDFs with a local device detector and Gemini AI"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Base URL of the analysis server
    #[clap(
        long,
        env = "FIREPLAN_SERVER",
        global = true,
        default_value = "http://localhost:5000"
    )]
    server: String,

    /// Request timeout in seconds
    #[clap(long, env = "FIREPLAN_TIMEOUT", global = true, default_value = "300")]
    timeout: u64,

    /// Whether to display additional information.
    #[clap(long, env = "FIREPLAN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Show whether the local detector and Gemini AI are available
    Status(crate::status::StatusOptions),

    /// Render page thumbnails for a PDF
    Preview(crate::preview::PreviewOptions),

    /// Detect fire alarm devices on selected pages
    Analyze(crate::analyze::AnalyzeOptions),

    /// Extract project information, codes and notes with Gemini AI
    Gemini(crate::gemini::GeminiOptions),

    /// Save the detection image of an analyzed page
    View(crate::viewer::ViewOptions),

    /// Download the annotated PDF of an analyzed page
    Download(crate::viewer::DownloadOptions),

    /// Export the full results of an analysis job
    Export(crate::viewer::ExportOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Status(options) => crate::status::run(options, app.global).await,
        SubCommands::Preview(options) => crate::preview::run(options, app.global).await,
        SubCommands::Analyze(options) => crate::analyze::run(options, app.global).await,
        SubCommands::Gemini(options) => crate::gemini::run(options, app.global).await,
        SubCommands::View(options) => crate::viewer::view(options, app.global).await,
        SubCommands::Download(options) => crate::viewer::download(options, app.global).await,
        SubCommands::Export(options) => crate::viewer::export(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
