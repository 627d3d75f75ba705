//! Naver News search API provider.
//!
//! `GET {base}/v1/search/news.json?query=..&display=..&sort=..`, authenticated
//! with the `X-Naver-Client-Id` / `X-Naver-Client-Secret` header pair.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use newsbrief_shared::{NewsBriefError, Result, SearchSection};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::normalize::{normalize_url, strip_markup};
use crate::provider::{SearchHit, SearchProvider};

/// Largest `display` value the API accepts.
pub const NAVER_MAX_DISPLAY: usize = 100;

const SERVICE: &str = "naver";

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("NewsBrief/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Client id/secret pair issued by the Naver developer console.
#[derive(Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl NaverCredentials {
    /// Read both values from the named environment variables.
    pub fn from_env(id_var: &str, secret_var: &str) -> Result<Self> {
        let read = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    NewsBriefError::config(format!(
                        "search credential not found. Set the {var} environment variable."
                    ))
                })
        };

        Ok(Self {
            client_id: read(id_var)?,
            client_secret: read(secret_var)?,
        })
    }
}

impl std::fmt::Debug for NaverCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaverCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NaverResponse {
    #[serde(default)]
    items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
struct NaverItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    link: String,
    #[serde(default, rename = "pubDate")]
    pub_date: Option<String>,
}

impl NaverItem {
    /// Convert to a hit, preferring the publisher's own URL over the portal
    /// mirror. Items without a usable http(s) URL are dropped.
    fn into_hit(self) -> Option<SearchHit> {
        let url = [self.originallink.trim(), self.link.trim()]
            .into_iter()
            .find(|u| !u.is_empty() && normalize_url(u).is_some())?
            .to_string();

        let published_at = self
            .pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());

        Some(SearchHit {
            url,
            title: strip_markup(&self.title),
            published_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// [`SearchProvider`] backed by the Naver News search API.
#[derive(Debug, Clone)]
pub struct NaverSearch {
    client: Client,
    endpoint: String,
    credentials: NaverCredentials,
    sort: String,
}

impl NaverSearch {
    pub fn new(
        base_url: &str,
        credentials: NaverCredentials,
        sort: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| NewsBriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/search/news.json", base_url.trim_end_matches('/')),
            credentials,
            sort: sort.into(),
        })
    }

    /// Build from the `[search]` config section, reading credentials from env.
    pub fn from_config(section: &SearchSection, timeout: Duration) -> Result<Self> {
        let credentials =
            NaverCredentials::from_env(&section.client_id_env, &section.client_secret_env)?;
        Self::new(&section.base_url, credentials, section.sort.clone(), timeout)
    }
}

#[async_trait]
impl SearchProvider for NaverSearch {
    #[instrument(skip_all, fields(query = %query, limit))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let display = limit.min(NAVER_MAX_DISPLAY);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query.to_string()),
                ("display", display.to_string()),
                ("sort", self.sort.clone()),
            ])
            .header("X-Naver-Client-Id", &self.credentials.client_id)
            .header("X-Naver-Client-Secret", &self.credentials.client_secret)
            .send()
            .await
            .map_err(|e| NewsBriefError::upstream(SERVICE, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsBriefError::upstream(SERVICE, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(NewsBriefError::upstream(
                SERVICE,
                format!("HTTP {status}: {snippet}"),
            ));
        }

        let parsed: NaverResponse = serde_json::from_str(&body)
            .map_err(|e| NewsBriefError::parse(format!("naver response: {e}")))?;

        let total = parsed.items.len();
        let hits: Vec<SearchHit> = parsed
            .items
            .into_iter()
            .filter_map(NaverItem::into_hit)
            .take(limit)
            .collect();

        debug!(returned = total, usable = hits.len(), "naver search complete");
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}
