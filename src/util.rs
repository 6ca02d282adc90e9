use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Turns a finished response into `T`, or into [`Error::Http`] on a non-2xx status.
pub(crate) fn decode_json<T: DeserializeOwned>(
    status: StatusCode,
    url: &str,
    text: String,
) -> Result<T> {
    if !status.is_success() {
        return Err(Error::Http {
            status,
            url: url.to_string(),
            body: text,
        });
    }

    serde_json::from_str::<T>(&text).map_err(|e| Error::Deserialization {
        message: format!("{} (url={}, status={})", e, url, status),
        body: text,
    })
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

pub(crate) fn to_epoch_ms(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// `None` when the value is outside chrono's representable range.
pub(crate) fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
