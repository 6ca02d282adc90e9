use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use polars::prelude::DataFrame;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{Session, SessionReply};
use crate::config::ClientConfig;
use crate::entity::{Tag, Unit};
use crate::error::{Error, Result};
use crate::models::{
    ConsumptionRequest, Granularity, InstantsType, ListQuery, ListReply, ReadingsOptions, TagId,
    TagInfo, UnitId, UnitInfo,
};
use crate::params::{self, Params};
use crate::table;
use crate::util::{decode_json, to_epoch_ms, urljoin};

/// Blocking client for the Cloogy API.
///
/// Holds one pooled HTTP session and the token [`Session`]. Every
/// authenticated call first checks the token and refreshes it once when it
/// has expired. The token triple sits behind a mutex and is swapped as a
/// whole, so a `Client` can be shared between threads; calls are otherwise
/// not coordinated and each blocks the calling thread.
#[derive(Debug)]
pub struct Client {
    base_url: String,
    http: HttpClient,
    session: Mutex<Session>,
}

impl Client {
    /// `rename_tags` default of [`Client::readings_table`].
    pub const DEFAULT_RENAME_TAGS: bool = true;

    /// Unauthenticated client against the production API.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, config.user_agent_header()?);

        let http = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim().to_string(),
            http,
            session: Mutex::new(Session::default()),
        })
    }

    /// Builds a client and logs in with `login` / `password`.
    pub fn login(config: ClientConfig, login: &str, password: &str) -> Result<Self> {
        let client = Self::with_config(config)?;
        client.authenticate(login, password)?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the current token state.
    pub fn session(&self) -> Session {
        self.lock_session().clone()
    }

    /// Replaces the token state, e.g. with one saved from an earlier client.
    pub fn restore_session(&self, session: Session) {
        *self.lock_session() = session;
    }

    /// Exchanges credentials for a token, refresh token and expiry.
    pub fn authenticate(&self, login: &str, password: &str) -> Result<()> {
        let url = urljoin(&self.base_url, params::SESSIONS_PATH);
        debug!(url = %url, "requesting session token");

        let reply: SessionReply = self.send_json(
            self.http
                .post(&url)
                .json(&params::login_body(login, password)),
            &url,
        )?;
        let session = Session::from_reply(reply, Utc::now())?;
        *self.lock_session() = session;

        info!("authenticated");
        Ok(())
    }

    /// Trades the refresh token for a new token triple.
    ///
    /// On failure the previous state is left untouched.
    pub fn re_authenticate(&self) -> Result<()> {
        let mut session = self.lock_session();
        self.refresh(&mut session)
    }

    fn refresh(&self, session: &mut Session) -> Result<()> {
        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or(Error::NotAuthenticated)?;

        let url = urljoin(&self.base_url, params::REFRESH_PATH);
        debug!(url = %url, "refreshing session token");

        let query = params::refresh_params(session.token.as_deref(), refresh_token);
        let reply: SessionReply = self.send_json(self.http.put(&url).query(&query), &url)?;
        *session = Session::from_reply(reply, Utc::now())?;

        info!("session token refreshed");
        Ok(())
    }

    /// Token for the next request, refreshed first when expired.
    fn bearer(&self) -> Result<String> {
        let mut session = self.lock_session();
        if session.needs_refresh(Utc::now()) {
            debug!("session token expired");
            self.refresh(&mut session)?;
        }
        session
            .bearer()
            .map(str::to_string)
            .ok_or(Error::NotAuthenticated)
    }

    pub fn units(&self, query: &ListQuery) -> Result<Vec<Unit<'_>>> {
        let token = self.bearer()?;
        let infos: Vec<UnitInfo> = self.list(&token, params::UNITS_PATH, query)?;
        Ok(infos.into_iter().map(|i| Unit::new(self, i)).collect())
    }

    /// The unit with id `unit_id`; [`Error::EmptyResult`] when there is none.
    pub fn unit(&self, unit_id: UnitId) -> Result<Unit<'_>> {
        let filter = params::id_filter(unit_id);
        self.units(&ListQuery::new().filter(filter.clone()))?
            .into_iter()
            .next()
            .ok_or(Error::EmptyResult {
                entity: "unit",
                filter,
            })
    }

    pub fn tags(&self, query: &ListQuery) -> Result<Vec<Tag<'_>>> {
        let token = self.bearer()?;
        let infos: Vec<TagInfo> = self.list(&token, params::TAGS_PATH, query)?;
        Ok(infos.into_iter().map(|i| Tag::new(self, i)).collect())
    }

    /// The tag with id `tag_id`; [`Error::EmptyResult`] when there is none.
    pub fn tag(&self, tag_id: TagId) -> Result<Tag<'_>> {
        let filter = params::id_filter(tag_id);
        self.tags(&ListQuery::new().filter(filter.clone()))?
            .into_iter()
            .next()
            .ok_or(Error::EmptyResult {
                entity: "tag",
                filter,
            })
    }

    /// Raw consumptions body for `tags` between two epoch-millisecond instants.
    pub fn consumptions(
        &self,
        granularity: Granularity,
        tags: &[TagId],
        start_ms: i64,
        end_ms: i64,
        instants_type: Option<InstantsType>,
    ) -> Result<Value> {
        let token = self.bearer()?;
        let url = urljoin(&self.base_url, &params::consumptions_path(granularity));
        let query = params::consumption_params(tags, start_ms, end_ms, instants_type);
        debug!(url = %url, tags = tags.len(), "fetching consumptions");

        self.send_json(self.authorized_get(&url, &token, &query), &url)
    }

    /// Consumptions as a flat table, one row per record.
    pub fn consumptions_table(&self, request: &ConsumptionRequest) -> Result<DataFrame> {
        let raw = self.consumptions(
            request.granularity,
            &request.tags,
            to_epoch_ms(&request.start),
            to_epoch_ms(&request.end),
            request.instants_type,
        )?;
        table::flat_table(&raw)
    }

    /// `options.metric` as a `Date` column plus one column per tag, one row per date.
    ///
    /// Tag columns are renamed to tag names unless `options.rename_tags` is
    /// `Some(false)`; see [`Client::DEFAULT_RENAME_TAGS`].
    pub fn readings_table(
        &self,
        request: &ConsumptionRequest,
        options: &ReadingsOptions,
    ) -> Result<DataFrame> {
        let mut wide = table::readings(&self.consumptions_table(request)?, &options.metric)?;

        let rename = options.rename_tags.unwrap_or(Self::DEFAULT_RENAME_TAGS);
        if rename && wide.width() > 1 {
            let names = self.tag_names(&request.tags)?;
            table::rename_tags(&mut wide, &names)?;
        }
        Ok(wide)
    }

    fn tag_names(&self, tags: &[TagId]) -> Result<HashMap<TagId, String>> {
        let query = ListQuery::new().filter(params::tags_filter(tags));
        Ok(self
            .tags(&query)?
            .into_iter()
            .filter_map(|tag| {
                let info = tag.into_info();
                info.name.map(|name| (info.id, name))
            })
            .collect())
    }

    fn list<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &ListQuery,
    ) -> Result<Vec<T>> {
        let url = urljoin(&self.base_url, path);
        debug!(url = %url, "listing");

        let reply: ListReply<T> =
            self.send_json(self.authorized_get(&url, token, &params::list_params(query)), &url)?;
        Ok(reply.list)
    }

    fn authorized_get(&self, url: &str, token: &str, query: &Params) -> RequestBuilder {
        self.http
            .get(url)
            .header(AUTHORIZATION, params::authorization(token))
            .query(query)
    }

    // Errors name `url` (no query string) because refresh queries carry tokens.
    fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        let resp = request.send().map_err(|e| Error::Transport(e.without_url()))?;
        let status = resp.status();
        let text = resp.text().map_err(|e| Error::Transport(e.without_url()))?;
        decode_json(status, url, text)
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
