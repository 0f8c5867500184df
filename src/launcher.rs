use std::io;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::config::BrowserConfig;
use crate::data::{Item, Listing, Selection};

const URL_PLACEHOLDER: &str = "%URL%";

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("system browser could not open {url}")]
    Browser {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to start {program} for {url}")]
    Spawn {
        program: String,
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status} for {url}")]
    ExitStatus {
        program: String,
        url: String,
        status: ExitStatus,
    },
}

/// Target for an item's selection. Self posts opened as `Site` fall back to the thread.
pub fn resolve(item: &Item) -> Option<&str> {
    match item.selection {
        Selection::Unselected => None,
        Selection::Site => Some(
            item.site_url
                .as_deref()
                .filter(|site| *site != item.thread_url)
                .unwrap_or(item.thread_url.as_str()),
        ),
        Selection::Comments => Some(item.thread_url.as_str()),
    }
}

pub fn resolve_links(listing: &Listing) -> Vec<String> {
    listing
        .items()
        .iter()
        .filter_map(resolve)
        .map(str::to_string)
        .collect()
}

pub trait Opener {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

/// The platform default browser.
pub struct SystemBrowser;

impl Opener for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        webbrowser::open(url).map_err(|source| LaunchError::Browser {
            url: url.to_string(),
            source,
        })
    }
}

/// A user supplied command such as `firefox %URL%`; the URL is appended when
/// no argument carries the placeholder. Waits for the command to exit.
pub struct CommandBrowser {
    program: String,
    args: Vec<String>,
}

impl CommandBrowser {
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn args_for(&self, url: &str) -> Vec<String> {
        if self.args.iter().any(|arg| arg.contains(URL_PLACEHOLDER)) {
            self.args
                .iter()
                .map(|arg| arg.replace(URL_PLACEHOLDER, url))
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(url.to_string());
            args
        }
    }
}

impl Opener for CommandBrowser {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        let status = Command::new(&self.program)
            .args(self.args_for(url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| LaunchError::Spawn {
                program: self.program.clone(),
                url: url.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::ExitStatus {
                program: self.program.clone(),
                url: url.to_string(),
                status,
            })
        }
    }
}

pub fn opener_from_config(cfg: &BrowserConfig) -> Box<dyn Opener> {
    match CommandBrowser::new(&cfg.command) {
        Some(browser) => Box::new(browser),
        None => Box::new(SystemBrowser),
    }
}

#[derive(Debug, Default)]
pub struct LaunchReport {
    pub opened: Vec<String>,
    pub failures: Vec<LaunchError>,
}

/// Opens every URL in order; a failure is recorded and the rest still run.
pub fn launch_all(opener: &dyn Opener, urls: &[String]) -> LaunchReport {
    let mut report = LaunchReport::default();
    for url in urls {
        match opener.open(url) {
            Ok(()) => {
                debug!(%url, "opened link");
                report.opened.push(url.clone());
            }
            Err(err) => {
                debug!(%url, error = %err, "failed to open link");
                report.failures.push(err);
            }
        }
    }
    report
}
