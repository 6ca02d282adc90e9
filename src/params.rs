//! Request building shared by the blocking and async clients.

use serde_json::{Value, json};

use crate::models::{Granularity, InstantsType, ListQuery, TagId, UnitId};

pub(crate) const SESSIONS_PATH: &str = "sessions";
pub(crate) const REFRESH_PATH: &str = "session/refresh";
pub(crate) const UNITS_PATH: &str = "units";
pub(crate) const TAGS_PATH: &str = "tags";

pub(crate) type Params = Vec<(&'static str, String)>;

pub(crate) fn consumptions_path(granularity: Granularity) -> String {
    format!("consumptions/{}", granularity.as_str())
}

pub(crate) fn authorization(token: &str) -> String {
    format!("ISA {}", token)
}

pub(crate) fn login_body(login: &str, password: &str) -> Value {
    json!({
        "Login": login,
        "Password": password,
    })
}

pub(crate) fn refresh_params(token: Option<&str>, refresh_token: &str) -> Params {
    let mut params = Params::new();
    if let Some(token) = token {
        params.push(("token", token.to_string()));
    }
    params.push(("refresh_token", refresh_token.to_string()));
    params
}

pub(crate) fn list_params(query: &ListQuery) -> Params {
    let fields = [
        ("Include", &query.include),
        ("Where", &query.filter),
        ("Order", &query.order),
    ];
    fields
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name, v.to_string()))
        })
        .collect()
}

/// Tag ids in the bracketed form the API expects, e.g. `[1, 2]`.
pub(crate) fn tag_list(tags: &[TagId]) -> String {
    let inner = tags
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

pub(crate) fn id_filter(id: i64) -> String {
    format!("Id={}", id)
}

pub(crate) fn tags_filter(tags: &[TagId]) -> String {
    format!("Id in {}", tag_list(tags))
}

/// `UnitId=<id>`, appended to a caller filter with `+` (the API's AND).
pub(crate) fn unit_tags_filter(unit_id: UnitId, filter: Option<&str>) -> String {
    match filter.filter(|f| !f.is_empty()) {
        Some(f) => format!("{}+UnitId={}", f, unit_id),
        None => format!("UnitId={}", unit_id),
    }
}

pub(crate) fn consumption_params(
    tags: &[TagId],
    start_ms: i64,
    end_ms: i64,
    instants_type: Option<InstantsType>,
) -> Params {
    let mut params = vec![
        ("from", start_ms.to_string()),
        ("to", end_ms.to_string()),
        ("tags", tag_list(tags)),
    ];
    if let Some(kind) = instants_type {
        params.push(("instantsType", kind.as_str().to_string()));
    }
    params
}
