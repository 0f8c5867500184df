use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV_PREFIX: &str = "HN_DAILY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub hackernews: HackerNewsConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HackerNewsConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_url() -> String {
    crate::hackernews::HN_URL.to_string()
}

fn default_user_agent() -> String {
    format!("hn-daily/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

/// Empty `command` means the platform's default browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BrowserConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GateConfig {
    #[serde(default)]
    pub marker_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();
    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);

    let path = options
        .config_file
        .clone()
        .or_else(|| env_config_path(prefix))
        .or_else(default_config_path);
    if let Some(path) = path {
        if path.exists() {
            let from_file = read_config_file(&path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    cfg = merge_config(cfg, load_env(prefix));

    Ok(cfg)
}

/// `HN_DAILY_CONFIG` names the config file in place of the default location.
fn env_config_path(prefix: &str) -> Option<PathBuf> {
    env::var_os(format!("{}_CONFIG", prefix.to_uppercase()))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    let defaults = HackerNewsConfig::default();

    if !other.hackernews.url.is_empty() && other.hackernews.url != defaults.url {
        base.hackernews.url = other.hackernews.url;
    }
    if !other.hackernews.user_agent.is_empty()
        && other.hackernews.user_agent != defaults.user_agent
    {
        base.hackernews.user_agent = other.hackernews.user_agent;
    }
    if other.hackernews.timeout != defaults.timeout && !other.hackernews.timeout.is_zero() {
        base.hackernews.timeout = other.hackernews.timeout;
    }

    if !other.browser.command.is_empty() {
        base.browser.command = other.browser.command;
    }

    if other.gate.marker_path.is_some() {
        base.gate.marker_path = other.gate.marker_path;
    }

    base
}

fn load_env(prefix: &str) -> Config {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    let mut cfg = Config::default();
    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value);
    }
    cfg
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "hackernews.url" => cfg.hackernews.url = value,
        "hackernews.user_agent" => cfg.hackernews.user_agent = value,
        "hackernews.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.hackernews.timeout = duration;
            }
        }
        "browser.command" => {
            cfg.browser.command = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        "gate.marker_path" => {
            if !value.trim().is_empty() {
                cfg.gate.marker_path = Some(PathBuf::from(value));
            }
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    env_config_path(DEFAULT_ENV_PREFIX).or_else(default_config_path)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hn-daily").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn isolated(path: PathBuf) -> LoadOptions {
        LoadOptions {
            config_file: Some(path),
            env_prefix: Some("HN_DAILY_TEST_UNSET".into()),
        }
    }

    #[test]
    fn load_defaults_without_files() {
        let dir = tempdir().unwrap();
        let cfg = load(isolated(dir.path().join("missing.yaml"))).unwrap();
        assert_eq!(cfg.hackernews.url, "https://news.ycombinator.com/");
        assert_eq!(cfg.hackernews.timeout, Duration::from_secs(20));
        assert!(cfg.browser.command.is_empty());
        assert!(cfg.gate.marker_path.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "browser:\n  command: [firefox, \"%URL%\"]\nhackernews:\n  timeout: 5s\ngate:\n  marker_path: /tmp/hn-marker\n",
        )
        .unwrap();

        let cfg = load(isolated(path)).unwrap();
        assert_eq!(cfg.browser.command, vec!["firefox", "%URL%"]);
        assert_eq!(cfg.hackernews.timeout, Duration::from_secs(5));
        assert_eq!(cfg.gate.marker_path, Some(PathBuf::from("/tmp/hn-marker")));
        assert_eq!(cfg.hackernews.url, default_url());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "browser: [unterminated").unwrap();
        assert!(load(isolated(path)).is_err());
    }

    #[test]
    fn env_names_the_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elsewhere.yaml");
        fs::write(&path, "hackernews:\n  url: http://127.0.0.1:8080/\n").unwrap();

        env::set_var("HN_DAILY_CFGTEST_CONFIG", &path);
        let cfg = load(LoadOptions {
            config_file: None,
            env_prefix: Some("HN_DAILY_CFGTEST".into()),
        })
        .unwrap();
        env::remove_var("HN_DAILY_CFGTEST_CONFIG");

        assert_eq!(cfg.hackernews.url, "http://127.0.0.1:8080/");
    }

    #[test]
    fn explicit_config_file_wins_over_env() {
        let dir = tempdir().unwrap();
        let named = dir.path().join("named.yaml");
        fs::write(&named, "hackernews:\n  timeout: 7s\n").unwrap();

        env::set_var("HN_DAILY_CFGWIN_CONFIG", &named);
        let cfg = load(LoadOptions {
            config_file: Some(dir.path().join("missing.yaml")),
            env_prefix: Some("HN_DAILY_CFGWIN".into()),
        })
        .unwrap();
        env::remove_var("HN_DAILY_CFGWIN_CONFIG");

        assert_eq!(cfg.hackernews.timeout, default_timeout());
    }

    #[test]
    fn env_overrides() {
        let dir = tempdir().unwrap();
        env::set_var("HN_DAILY_ENVTEST_BROWSER__COMMAND", "firefox, --new-tab ,%URL%");
        env::set_var("HN_DAILY_ENVTEST_HACKERNEWS__TIMEOUT", "3s");
        let cfg = load(LoadOptions {
            config_file: Some(dir.path().join("missing.yaml")),
            env_prefix: Some("HN_DAILY_ENVTEST".into()),
        })
        .unwrap();
        env::remove_var("HN_DAILY_ENVTEST_BROWSER__COMMAND");
        env::remove_var("HN_DAILY_ENVTEST_HACKERNEWS__TIMEOUT");

        assert_eq!(cfg.browser.command, vec!["firefox", "--new-tab", "%URL%"]);
        assert_eq!(cfg.hackernews.timeout, Duration::from_secs(3));
    }
}
