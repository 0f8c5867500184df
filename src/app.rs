use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config;
use crate::data::{Listing, ListingProvider};
use crate::hackernews;
use crate::launcher::{self, LaunchReport};
use crate::storage::{self, UsageGate};
use crate::ui::{self, MenuExit};

/// How a run ended when nothing went wrong.
#[derive(Debug)]
pub enum Outcome {
    AlreadyRanToday,
    Cancelled,
    Finished(LaunchReport),
}

impl Outcome {
    /// Text for the user, if any. Launch failures are listed one per line.
    pub fn message(&self) -> Option<String> {
        match self {
            Outcome::AlreadyRanToday => Some("You already checked today".to_string()),
            Outcome::Cancelled => None,
            Outcome::Finished(report) if report.failures.is_empty() => None,
            Outcome::Finished(report) => Some(
                report
                    .failures
                    .iter()
                    .map(|failure| format!("Failed to open link: {failure}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

pub fn run() -> Result<Outcome> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    debug!(path = ?config::default_path(), "configuration loaded");

    let gate = UsageGate::open(storage::Options {
        path: cfg.gate.marker_path.clone(),
    })
    .context("open usage gate")?;

    let client = hackernews::Client::new(hackernews::ClientConfig {
        base_url: cfg.hackernews.url.clone(),
        user_agent: cfg.hackernews.user_agent.clone(),
        timeout: cfg.hackernews.timeout,
        http_client: None,
    })
    .context("create hackernews client")?;

    let Some(listing) = prepare(&gate, &client)? else {
        return Ok(Outcome::AlreadyRanToday);
    };

    let listing = match ui::run_menu(listing).context("run selection menu")? {
        MenuExit::Confirmed(listing) => listing,
        MenuExit::Cancelled => {
            info!("selection cancelled");
            return Ok(Outcome::Cancelled);
        }
    };

    let urls = launcher::resolve_links(&listing);
    let opener = launcher::opener_from_config(&cfg.browser);
    let report = launcher::launch_all(opener.as_ref(), &urls);
    info!(
        opened = report.opened.len(),
        failed = report.failures.len(),
        "finished launching links"
    );

    Ok(Outcome::Finished(report))
}

/// Checks the usage gate and loads the listing. `None` means the tool
/// already ran today and nothing was fetched. The run is recorded only
/// once the front page has been retrieved.
pub fn prepare(gate: &UsageGate, provider: &dyn ListingProvider) -> Result<Option<Listing>> {
    if !gate.may_run().context("check usage gate")? {
        info!(path = %gate.path().display(), "already ran today");
        return Ok(None);
    }

    let entries = provider.front_page().context("fetch front page")?;
    gate.record_run().context("record run")?;
    Ok(Some(Listing::from_entries(entries)))
}
