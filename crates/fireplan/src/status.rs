use std::future::Future;
use std::time::Duration;

use fireplan_core::status::{StatusView, POLL_INTERVAL_SECS};
use tokio::time::MissedTickBehavior;

use crate::prelude::{eprintln, *};
use crate::session::Session;

#[derive(Debug, clap::Args)]
pub struct StatusOptions {
    /// Keep polling every 30 seconds until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: StatusOptions, global: crate::Global) -> Result<()> {
    let mut session = Session::new(&global, options.json)?;

    if !options.watch {
        let view = session.poll_status().await;
        return session.renderer().status(&view);
    }

    if global.verbose {
        eprintln!(
            "Polling {} every {POLL_INTERVAL_SECS}s, press Ctrl-C to stop",
            global.server
        );
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let polls = poll_until(
        &mut session,
        Duration::from_secs(POLL_INTERVAL_SECS),
        shutdown,
    )
    .await?;
    log::info!("Stopped after {polls} status polls");

    Ok(())
}

/// Poll once right away, then every `period`, until `shutdown` resolves.
///
/// Indicators are rendered on the first poll and whenever they change.
/// Returns the number of polls made.
async fn poll_until(
    session: &mut Session,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<usize> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut previous: Option<StatusView> = None;
    let mut polls = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let view = session.poll_status().await;
                polls += 1;

                if previous.as_ref() == Some(&view) {
                    log::debug!("Status unchanged");
                } else {
                    session.renderer().status(&view)?;
                    previous = Some(view);
                }
            }
            _ = &mut shutdown => break,
        }
    }

    Ok(polls)
}
