use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Body of both the login and the refresh response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct SessionReply {
    pub(crate) token: String,
    pub(crate) refresh_token: String,
    /// Seconds until `token` expires.
    pub(crate) timeout: i64,
}

/// Token state of a blocking [`Client`](crate::Client).
///
/// The three fields are only ever replaced together.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    /// Instant after which `token` is stale.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: Some(token.into()),
            refresh_token: Some(refresh_token.into()),
            expires_at: Some(expires_at),
        }
    }

    pub(crate) fn from_reply(reply: SessionReply, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = TimeDelta::try_seconds(reply.timeout)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| Error::Deserialization {
                message: format!("token timeout out of range: {}", reply.timeout),
                body: String::new(),
            })?;
        Ok(Self::new(reply.token, reply.refresh_token, expires_at))
    }

    /// A refresh is due when a refresh token is held and the expiry has passed
    /// (or was never recorded).
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.refresh_token.is_some() && self.expires_at.is_none_or(|t| t <= now)
    }

    /// Token usable for an `Authorization` header. Empty tokens count as absent.
    pub(crate) fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("token", &redact(&self.token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
