//! A small Rust client for the Cloogy energy-metering API.
//!
//! The client logs in, keeps its bearer token fresh, lists units and tags,
//! and turns consumption readings into time-indexed tables.
//!
//! ## Quick start
//! - Build a [`Client`] with [`Client::login`] (or [`Client::with_config`] and
//!   [`Client::authenticate`]).
//! - Fetch a readings [`DataFrame`] with [`Client::readings_table`]: a `Date`
//!   column plus one column per tag, one row per timestamp.
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use cloogy::{Client, ClientConfig, ConsumptionRequest, Granularity, ReadingsOptions};
//!
//! fn main() -> cloogy::Result<()> {
//!     let client = Client::login(ClientConfig::default(), "me@example.com", "secret")?;
//!     let request = ConsumptionRequest::new(
//!         Granularity::Hourly,
//!         [1001, 1002],
//!         Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
//!         Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
//!     );
//!     let table = client.readings_table(&request, &ReadingsOptions::default())?;
//!     println!("{table}");
//!     Ok(())
//! }
//! ```
//!
//! [`AsyncClient`] offers the consumption calls on top of an existing
//! `reqwest::Client` and token.

#![forbid(unsafe_code)]

mod async_client;
mod auth;
mod client;
mod config;
mod entity;
mod error;
mod models;
mod params;
mod table;
mod util;

pub use async_client::AsyncClient;
pub use auth::Session;
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use entity::{Tag, Unit};
pub use error::{Error, Result};
pub use models::{
    ConsumptionRequest, Granularity, InstantsType, ListQuery, ReadingsOptions, TagId, TagInfo,
    UnitId, UnitInfo,
};
pub use polars::prelude::DataFrame;
pub use table::{DATE_COLUMN, TAG_ID_COLUMN, date_dtype};
