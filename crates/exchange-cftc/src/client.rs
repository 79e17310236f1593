//! Paged Socrata client for the CFTC public reporting endpoints.
//!
//! Pages are requested strictly in sequence with `$limit`/`$offset` until a
//! page comes back empty. Consecutive requests are spaced by a fixed pause
//! enforced with a `governor` rate limiter.

use crate::error::FetchError;
use crate::query::SodaQuery;
use cot_core::SourceConfig;
use cot_data::{RawRow, RawTable};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Header carrying the optional Socrata application token.
pub const APP_TOKEN_HEADER: &str = "X-App-Token";

type PauseLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct SodaClient {
    http: Client,
    page_size: usize,
    app_token: Option<String>,
    /// `None` when the configured pause is zero
    pause: Option<PauseLimiter>,
}

impl SodaClient {
    /// Builds a client from the `source` configuration section.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &SourceConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let pause = Quota::with_period(Duration::from_millis(config.pause_ms))
            .map(RateLimiter::direct);

        Ok(Self {
            http,
            page_size: config.page_size.max(1),
            app_token: config.app_token.clone().filter(|t| !t.is_empty()),
            pause,
        })
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Downloads every row matching `query`.
    ///
    /// # Errors
    /// The first failed page aborts the download: non-2xx responses become
    /// [`FetchError::Transport`], non-array bodies [`FetchError::UnexpectedPayload`].
    pub async fn fetch_all(&self, url: &str, query: &SodaQuery) -> Result<RawTable, FetchError> {
        let mut table = RawTable::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let rows = self.fetch_page(url, query, offset).await?;
            if rows.is_empty() {
                break;
            }
            pages += 1;
            tracing::debug!(url, offset, rows = rows.len(), "Fetched page");
            for row in rows {
                table.push_row(row);
            }
            offset += self.page_size;
        }

        tracing::info!(
            url,
            filter = query.where_clause.as_deref().unwrap_or(""),
            pages,
            rows = table.len(),
            "Download complete"
        );
        Ok(table)
    }

    async fn fetch_page(
        &self,
        url: &str,
        query: &SodaQuery,
        offset: usize,
    ) -> Result<Vec<RawRow>, FetchError> {
        if let Some(limiter) = &self.pause {
            limiter.until_ready().await;
        }

        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&query.page_params(self.page_size, offset));
        if let Some(token) = &self.app_token {
            request = request.header(APP_TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transport { status, body });
        }

        let payload: Value = response.json().await?;
        rows_from_payload(payload)
    }
}

/// Flattens a JSON array of objects into string cells. Nulls are left out.
pub(crate) fn rows_from_payload(payload: Value) -> Result<Vec<RawRow>, FetchError> {
    let Value::Array(items) = payload else {
        return Err(FetchError::UnexpectedPayload(format!(
            "expected a JSON array, got {}",
            kind(&payload)
        )));
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter_map(|(name, value)| cell(value).map(|v| (name, v)))
                .collect()),
            other => Err(FetchError::UnexpectedPayload(format!(
                "expected row objects, got {}",
                kind(&other)
            ))),
        })
        .collect()
}

fn cell(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
