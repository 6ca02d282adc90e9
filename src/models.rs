use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::util::from_epoch_ms;

/// Identifier of a tag (sensor channel).
pub type TagId = i64;

/// Identifier of a unit (metering point).
pub type UnitId = i64;

/// Time-bucketing resolution of a consumption query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Instant,
    Hourly,
    Daily,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "Instant",
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation applied within an `Instant` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstantsType {
    Avg,
    Max,
    Min,
    Stdev,
}

impl InstantsType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "Avg",
            Self::Max => "Max",
            Self::Min => "Min",
            Self::Stdev => "Stdev",
        }
    }
}

impl fmt::Display for InstantsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the `units` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInfo {
    #[serde(rename = "Id")]
    pub id: UnitId,
    /// Last communication, epoch milliseconds.
    #[serde(rename = "LastComm", default, skip_serializing_if = "Option::is_none")]
    pub last_comm: Option<i64>,
    /// Every other field of the record, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UnitInfo {
    pub fn last_communication(&self) -> Option<DateTime<Utc>> {
        self.last_comm.and_then(from_epoch_ms)
    }
}

/// One record of the `tags` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    #[serde(rename = "Id")]
    pub id: TagId,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Last communication, epoch milliseconds.
    #[serde(
        rename = "LastCommunication",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_communication: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TagInfo {
    pub fn last_communication(&self) -> Option<DateTime<Utc>> {
        self.last_communication.and_then(from_epoch_ms)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListReply<T> {
    #[serde(rename = "List")]
    pub(crate) list: Vec<T>,
}

/// Optional `Include` / `Where` / `Order` parameters of a listing call.
///
/// Values are passed to the API verbatim; unset or empty ones are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub include: Option<String>,
    /// Filter expression, sent as `Where`.
    pub filter: Option<String>,
    pub order: Option<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Consumption query expressed with timestamps instead of raw epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionRequest {
    pub granularity: Granularity,
    pub tags: Vec<TagId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub instants_type: Option<InstantsType>,
}

impl ConsumptionRequest {
    pub fn new(
        granularity: Granularity,
        tags: impl IntoIterator<Item = TagId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            granularity,
            tags: tags.into_iter().collect(),
            start,
            end,
            instants_type: None,
        }
    }

    pub fn with_instants_type(mut self, instants_type: InstantsType) -> Self {
        self.instants_type = Some(instants_type);
        self
    }
}

/// Shaping options for a readings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingsOptions {
    /// Consumption column to spread over the tag columns.
    pub metric: String,
    /// Replace tag ids by tag names. `None` uses the client's own default:
    /// [`Client::DEFAULT_RENAME_TAGS`](crate::Client::DEFAULT_RENAME_TAGS) or
    /// [`AsyncClient::DEFAULT_RENAME_TAGS`](crate::AsyncClient::DEFAULT_RENAME_TAGS).
    pub rename_tags: Option<bool>,
}

impl Default for ReadingsOptions {
    fn default() -> Self {
        Self {
            metric: "Read".to_string(),
            rename_tags: None,
        }
    }
}

impl ReadingsOptions {
    pub fn metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn rename_tags(mut self, rename: bool) -> Self {
        self.rename_tags = Some(rename);
        self
    }
}
