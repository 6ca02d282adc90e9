use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

use polars::prelude::DataFrame;

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::models::{ConsumptionRequest, Granularity, InstantsType, ReadingsOptions, TagId};
use crate::params;
use crate::table;
use crate::util::{decode_json, to_epoch_ms, urljoin};

/// Async client for the consumption endpoints.
///
/// Runs on a caller-owned [`reqwest::Client`] and a token obtained elsewhere,
/// for instance from [`Client::session`](crate::Client::session). It never
/// logs in or refreshes: once the token expires, requests fail with
/// [`Error::Http`] and the caller has to build a new `AsyncClient`.
///
/// The client holds no mutable state, so concurrent or cancelled calls
/// cannot affect each other.
#[derive(Debug, Clone)]
pub struct AsyncClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl AsyncClient {
    /// `rename_tags` default of [`AsyncClient::readings_table`].
    pub const DEFAULT_RENAME_TAGS: bool = false;

    pub fn new(token: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            http,
        }
    }

    /// Uses the base URL of `config`, which is validated first.
    ///
    /// Timeout and user agent belong to the injected `http` client and are not applied.
    pub fn with_config(
        token: impl Into<String>,
        http: reqwest::Client,
        config: &ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim().to_string(),
            token: token.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw consumptions body for `tags` between two epoch-millisecond instants.
    pub async fn consumptions(
        &self,
        granularity: Granularity,
        tags: &[TagId],
        start_ms: i64,
        end_ms: i64,
        instants_type: Option<InstantsType>,
    ) -> Result<Value> {
        if self.token.is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let url = urljoin(&self.base_url, &params::consumptions_path(granularity));
        let query = params::consumption_params(tags, start_ms, end_ms, instants_type);
        debug!(url = %url, tags = tags.len(), "fetching consumptions");

        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, params::authorization(&self.token))
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Transport(e.without_url()))?;
        decode_json(status, &url, text)
    }

    pub async fn consumptions_table(&self, request: &ConsumptionRequest) -> Result<DataFrame> {
        let raw = self
            .consumptions(
                request.granularity,
                &request.tags,
                to_epoch_ms(&request.start),
                to_epoch_ms(&request.end),
                request.instants_type,
            )
            .await?;
        table::flat_table(&raw)
    }

    /// `options.metric` as a `Date` column plus one column per tag id.
    ///
    /// Tag renaming is not available here: asking for it fails with
    /// [`Error::NotImplemented`] before any request is made.
    pub async fn readings_table(
        &self,
        request: &ConsumptionRequest,
        options: &ReadingsOptions,
    ) -> Result<DataFrame> {
        if options.rename_tags.unwrap_or(Self::DEFAULT_RENAME_TAGS) {
            return Err(Error::NotImplemented(
                "renaming tags is not available on the async client",
            ));
        }

        table::readings(&self.consumptions_table(request).await?, &options.metric)
    }
}
