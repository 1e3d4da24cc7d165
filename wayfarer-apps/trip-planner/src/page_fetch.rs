//!  Wayfarer Trip Planner
//!
//!  Copyright (C) 2026  The Wayfarer Developers
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Page Fetching
//!
//! Effectful (network) side of the scrapers. Everything that parses lives
//! elsewhere and only ever sees a `&str` body.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use wayfarer_fetch_queues::{AttemptError, FetchQueue, FetchQueueError};
use wreq::redirect::Policy;
use wreq_util::Emulation;

use crate::consent_cookie::is_consent_wall;
use crate::site_adapter::SiteFetchFailure;

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Source of raw HTML pages. Swapped for canned pages in tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str, cookie: Option<&str>) -> Result<String, SiteFetchFailure>;
}

/// Browser-emulating client shared by scrapers and JSON API adapters
pub fn build_http_client() -> Result<wreq::Client> {
    wreq::Client::builder()
        .emulation(Emulation::Safari18_5)
        .redirect(Policy::default())
        .build()
        .context("Failed to build HTTP client")
}

#[derive(Debug, Error)]
#[error("HTTP status {0}")]
struct HttpStatus(u16);

#[derive(Clone)]
pub struct PageFetcher {
    client: Arc<wreq::Client>,
    queue: FetchQueue,
    accept_language: String,
}

impl PageFetcher {
    pub fn new(queue: FetchQueue) -> Result<Self> {
        Ok(Self::with_client(Arc::new(build_http_client()?), queue))
    }

    pub fn with_client(client: Arc<wreq::Client>, queue: FetchQueue) -> Self {
        Self {
            client,
            queue,
            accept_language: ACCEPT_LANGUAGE.to_string(),
        }
    }

    pub fn with_accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.accept_language = accept_language.into();
        self
    }
}

/// Markers of interstitials served instead of results
fn looks_blocked(body: &str) -> Option<&'static str> {
    if is_consent_wall(body) {
        return Some("consent wall");
    }
    let lower = body.chars().take(20_000).collect::<String>().to_lowercase();
    const CHALLENGE_MARKERS: [&str; 4] = [
        "px-captcha",
        "are you a robot",
        "verify you are human",
        "cf-challenge",
    ];
    if CHALLENGE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some("bot challenge");
    }
    None
}

fn classify(err: FetchQueueError) -> SiteFetchFailure {
    let status = err
        .last_error()
        .and_then(|e| e.downcast_ref::<HttpStatus>())
        .map(|s| s.0);
    match status {
        Some(code @ (401 | 403 | 429)) => SiteFetchFailure::Blocked(format!("HTTP {code}")),
        _ => SiteFetchFailure::Unreachable(format!("{err:#}")),
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self, url: &str, cookie: Option<&str>) -> Result<String, SiteFetchFailure> {
        let start = Instant::now();
        let body = self
            .queue
            .run(|| {
                let client = Arc::clone(&self.client);
                let url = url.to_string();
                let cookie = cookie.map(str::to_string);
                let accept_language = self.accept_language.clone();
                async move {
                    tracing::debug!("[fetch_page] GET {}", url);
                    let mut request = client.get(&url).header("Accept-Language", accept_language);
                    if let Some(cookie) = &cookie {
                        request = request.header("Cookie", cookie);
                    }
                    let resp = request.send().await.context("Request failed")?;
                    let status = resp.status();
                    if status.is_server_error() {
                        return Err(AttemptError::Retry(HttpStatus(status.as_u16()).into()));
                    }
                    if !status.is_success() {
                        return Err(AttemptError::abort(HttpStatus(status.as_u16())));
                    }
                    let body = resp.text().await.context("Read body")?;
                    Ok(body)
                }
            })
            .await
            .map_err(classify)?;

        tracing::debug!(
            "[fetch_page] {} chars from {} in {:?}",
            body.chars().count(),
            url,
            start.elapsed()
        );

        if let Some(reason) = looks_blocked(&body) {
            tracing::warn!("[fetch_page] {} served a {}", url, reason);
            return Err(SiteFetchFailure::Blocked(format!(
                "{reason}; body preview: {}",
                crate::text_extract::truncate_chars(&body, 200)
            )));
        }
        Ok(body)
    }
}
