//! Units and tags as returned by the listing endpoints, tied to the client
//! that fetched them so they can issue scoped follow-up queries.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde_json::Value;

use crate::client::Client;
use crate::error::Result;
use crate::models::{
    ConsumptionRequest, Granularity, InstantsType, ListQuery, TagInfo, UnitInfo,
};
use crate::params::unit_tags_filter;

/// A metering point.
#[derive(Debug, Clone)]
pub struct Unit<'c> {
    client: &'c Client,
    info: UnitInfo,
}

impl<'c> Unit<'c> {
    pub(crate) fn new(client: &'c Client, info: UnitInfo) -> Self {
        Self { client, info }
    }

    pub fn info(&self) -> &UnitInfo {
        &self.info
    }

    pub fn into_info(self) -> UnitInfo {
        self.info
    }

    /// Raw value of a field outside the typed ones, e.g. `unit.field("Serial")`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.info.extra.get(name)
    }

    pub fn last_communication(&self) -> Option<DateTime<Utc>> {
        self.info.last_communication()
    }

    /// Tags of this unit. A filter in `query` is kept and ANDed with `UnitId`.
    pub fn tags(&self, query: &ListQuery) -> Result<Vec<Tag<'c>>> {
        let query = ListQuery {
            filter: Some(unit_tags_filter(self.info.id, query.filter.as_deref())),
            ..query.clone()
        };
        self.client.tags(&query)
    }
}

impl Deref for Unit<'_> {
    type Target = UnitInfo;

    fn deref(&self) -> &UnitInfo {
        &self.info
    }
}

impl PartialEq for Unit<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

/// A sensor channel of a unit.
#[derive(Debug, Clone)]
pub struct Tag<'c> {
    client: &'c Client,
    info: TagInfo,
}

impl<'c> Tag<'c> {
    pub(crate) fn new(client: &'c Client, info: TagInfo) -> Self {
        Self { client, info }
    }

    pub fn info(&self) -> &TagInfo {
        &self.info
    }

    pub fn into_info(self) -> TagInfo {
        self.info
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.info.extra.get(name)
    }

    pub fn last_communication(&self) -> Option<DateTime<Utc>> {
        self.info.last_communication()
    }

    /// Consumptions of this tag alone, as a flat frame.
    pub fn consumptions_table(
        &self,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        instants_type: Option<InstantsType>,
    ) -> Result<DataFrame> {
        let request = ConsumptionRequest {
            instants_type,
            ..ConsumptionRequest::new(granularity, [self.info.id], start, end)
        };
        self.client.consumptions_table(&request)
    }
}

impl Deref for Tag<'_> {
    type Target = TagInfo;

    fn deref(&self) -> &TagInfo {
        &self.info
    }
}

impl PartialEq for Tag<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}
