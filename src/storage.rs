use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

pub const MARKER_FILE: &str = ".hacker_news";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone)]
pub struct Options {
    pub path: Option<PathBuf>,
}

/// Once-per-calendar-day lock backed by a file holding the last run date.
#[derive(Debug, Clone)]
pub struct UsageGate {
    path: PathBuf,
}

impl UsageGate {
    pub fn open(opts: Options) -> Result<Self> {
        let path = if let Some(path) = opts.path {
            path
        } else {
            default_path().context("storage: resolve home directory")?
        };
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Date of the last recorded run. Unreadable dates count as no run.
    pub fn last_run(&self) -> Result<Option<NaiveDate>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("storage: read {}", self.path.display()))
            }
        };

        match NaiveDate::parse_from_str(contents.trim(), DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable last-run date");
                Ok(None)
            }
        }
    }

    pub fn may_run(&self) -> Result<bool> {
        self.may_run_on(today())
    }

    pub fn may_run_on(&self, today: NaiveDate) -> Result<bool> {
        let allowed = match self.last_run()? {
            Some(last) => today.signed_duration_since(last).num_days() >= 1,
            None => true,
        };
        debug!(%today, allowed, "usage gate checked");
        Ok(allowed)
    }

    pub fn record_run(&self) -> Result<()> {
        self.record_run_on(today())
    }

    pub fn record_run_on(&self, day: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("storage: create directory {}", parent.display()))?;
            }
        }
        fs::write(&self.path, day.format(DATE_FORMAT).to_string())
            .with_context(|| format!("storage: write {}", self.path.display()))?;
        debug!(%day, path = %self.path.display(), "recorded run");
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(MARKER_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn gate_in(dir: &Path) -> UsageGate {
        UsageGate::open(Options {
            path: Some(dir.join(MARKER_FILE)),
        })
        .unwrap()
    }

    #[test]
    fn first_run_is_allowed_then_blocked() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        assert!(gate.may_run().unwrap());
        gate.record_run().unwrap();
        assert!(!gate.may_run().unwrap());
    }

    #[test]
    fn compares_calendar_dates_only() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        gate.record_run_on(date(2024, 3, 9)).unwrap();

        assert!(!gate.may_run_on(date(2024, 3, 9)).unwrap());
        assert!(gate.may_run_on(date(2024, 3, 10)).unwrap());
        assert!(gate.may_run_on(date(2025, 1, 1)).unwrap());
    }

    #[test]
    fn future_date_blocks() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        gate.record_run_on(date(2030, 1, 1)).unwrap();
        assert!(!gate.may_run_on(date(2029, 12, 31)).unwrap());
    }

    #[test]
    fn marker_holds_iso_date() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        gate.record_run_on(date(2024, 11, 5)).unwrap();
        let contents = fs::read_to_string(gate.path()).unwrap();
        assert_eq!(contents, "2024-11-05");
        assert_eq!(gate.last_run().unwrap(), Some(date(2024, 11, 5)));
    }

    #[test]
    fn reads_trailing_newline() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        fs::write(gate.path(), "2024-02-29\n").unwrap();
        assert_eq!(gate.last_run().unwrap(), Some(date(2024, 2, 29)));
    }

    #[test]
    fn corrupt_marker_counts_as_never_run() {
        let dir = tempdir().unwrap();
        let gate = gate_in(dir.path());
        fs::write(gate.path(), "yesterday-ish").unwrap();
        assert_eq!(gate.last_run().unwrap(), None);
        assert!(gate.may_run_on(date(2024, 1, 1)).unwrap());
    }

    #[test]
    fn record_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let gate = UsageGate::open(Options {
            path: Some(dir.path().join("nested").join("state").join(MARKER_FILE)),
        })
        .unwrap();
        gate.record_run_on(date(2024, 6, 1)).unwrap();
        assert!(gate.path().exists());
    }
}
