use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::data::{Entry, ListingProvider};

pub const HN_URL: &str = "https://news.ycombinator.com/";

const STORY_ROW: &str = "tr.athing";
const TITLE_LINK: &str = "span.titleline > a";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("unexpected page structure: {0}")]
    Structure(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub http_client: Option<HttpClient>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: HN_URL.to_string(),
            user_agent: format!("hn-daily/{}", crate::VERSION),
            timeout: Duration::from_secs(20),
            http_client: None,
        }
    }
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("hackernews client user agent required");
        }

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("parse hackernews url {:?}", config.base_url))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout)
                .build()
                .context("build hackernews HTTP client")?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    fn fetch_front_page(&self) -> Result<String, FetchError> {
        let url = self.base_url.to_string();
        debug!(%url, "fetching front page");

        let response = self
            .http
            .get(self.base_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(|source| FetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        response
            .text()
            .map_err(|source| FetchError::Http { url, source })
    }
}

impl ListingProvider for Client {
    fn front_page(&self) -> Result<Vec<Entry>> {
        let html = self.fetch_front_page()?;
        let entries = parse_front_page(&html, &self.base_url)?;
        info!(count = entries.len(), "parsed front page");
        Ok(entries)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|err| FetchError::Structure(format!("selector {css}: {err}")))
}

/// Extracts story rows from a front page document.
///
/// Each `tr.athing` row carries the item id; its title anchor holds the
/// story target, which is relative (`item?id=N`) for self posts. Targets are
/// resolved against `base`, and a target equal to the thread URL yields an
/// entry without a `site_url`.
pub fn parse_front_page(html: &str, base: &Url) -> Result<Vec<Entry>, FetchError> {
    let document = Html::parse_document(html);
    let row_selector = selector(STORY_ROW)?;
    let title_selector = selector(TITLE_LINK)?;

    let mut entries = Vec::new();
    for row in document.select(&row_selector) {
        match parse_row(row, &title_selector, base) {
            Some(entry) => entries.push(entry),
            None => warn!(id = ?row.value().attr("id"), "skipping malformed story row"),
        }
    }

    if entries.is_empty() {
        return Err(FetchError::Structure(format!(
            "no `{STORY_ROW}` rows with a title link"
        )));
    }

    Ok(entries)
}

fn parse_row(row: ElementRef<'_>, title_selector: &Selector, base: &Url) -> Option<Entry> {
    let id = row.value().attr("id")?.trim();
    if id.is_empty() {
        return None;
    }
    let thread_url = base.join(&format!("item?id={id}")).ok()?.to_string();

    let anchor = row.select(title_selector).next()?;
    let title = anchor.text().collect::<String>().trim().to_string();
    let site_url = anchor
        .value()
        .attr("href")
        .and_then(|href| base.join(href.trim()).ok())
        .map(|url| url.to_string())
        .filter(|url| *url != thread_url);

    Some(Entry {
        title,
        site_url,
        thread_url,
    })
}
