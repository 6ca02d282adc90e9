use chrono::{DateTime, Utc};
use polars::prelude::PolarsError;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::TagId;

/// Every failure the Cloogy client can report.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable token after the refresh check. Raised before any request is sent.
    #[error("not authenticated: call `authenticate` first")]
    NotAuthenticated,

    /// The API answered with a non-2xx status.
    #[error("API request failed: HTTP {status} for url ({url})\n{body}")]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// Connection, TLS or timeout failure below the HTTP layer.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("failed to parse API JSON: {message}")]
    Deserialization { message: String, body: String },

    /// Single-entity lookup matched nothing.
    #[error("no {entity} matched `{filter}`")]
    EmptyResult {
        entity: &'static str,
        filter: String,
    },

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A consumption record is missing `TagId`/`Date` or has the wrong types.
    #[error("invalid consumption record: {0}")]
    InvalidRecord(String),

    #[error("column `{0}` not present in consumptions")]
    MissingColumn(String),

    /// Two records share the same `(TagId, Date)` key, so a pivot would lose one.
    #[error("duplicate reading for tag {tag_id} at {date}")]
    DuplicateReading { tag_id: TagId, date: DateTime<Utc> },

    /// A data frame operation failed while shaping consumptions.
    #[error("table error: {0}")]
    Table(#[from] PolarsError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of a rejected request, if this error came from one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Returns `true` when the server rejected the credentials or token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_exposes_status() {
        let err = Error::Http {
            status: StatusCode::UNAUTHORIZED,
            url: "https://api.cloogy.com/api/1.4/sessions".into(),
            body: "bad credentials".into(),
        };
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("HTTP 401"));
        assert!(err.to_string().contains("bad credentials"));
    }

    #[test]
    fn local_errors_carry_no_status() {
        assert_eq!(Error::NotAuthenticated.status(), None);
        assert!(!Error::NotImplemented("x").is_unauthorized());
    }
}
