//! Consumption records as polars data frames.
//!
//! The flat frame has one row per record with `Date` as a UTC datetime.
//! The readings frame has a `Date` column followed by one column per tag.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::num::NonZeroUsize;

use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::{
    DataFrame, DataType, IntoColumn, JsonReader, SerReader, Series, SortMultipleOptions, TimeUnit,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::TagId;
use crate::util::from_epoch_ms;

pub const TAG_ID_COLUMN: &str = "TagId";
pub const DATE_COLUMN: &str = "Date";

/// `Datetime(ms, UTC)`, the type of every `Date` column.
pub fn date_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into()))
}

/// Builds the flat frame from the raw consumptions body, a JSON array of flat objects.
///
/// An empty array gives an empty frame that still has typed `TagId` and `Date` columns.
pub fn flat_table(raw: &Value) -> Result<DataFrame> {
    let records = raw.as_array().ok_or_else(|| {
        Error::InvalidRecord(format!("expected a JSON array, got {}", kind_of(raw)))
    })?;
    check_keys(records)?;

    let Some(rows) = NonZeroUsize::new(records.len()) else {
        return Ok(DataFrame::new(vec![
            Series::new_empty(TAG_ID_COLUMN.into(), &DataType::Int64).into_column(),
            Series::new_empty(DATE_COLUMN.into(), &date_dtype()).into_column(),
        ])?);
    };

    let json = serde_json::to_vec(records).map_err(|e| Error::InvalidRecord(e.to_string()))?;
    let mut df = JsonReader::new(Cursor::new(json.as_slice()))
        .infer_schema_len(Some(rows))
        .finish()?;

    let tag_ids = df.column(TAG_ID_COLUMN)?.cast(&DataType::Int64)?;
    let dates = df
        .column(DATE_COLUMN)?
        .cast(&DataType::Int64)?
        .cast(&date_dtype())?;
    df.with_column(tag_ids)?;
    df.with_column(dates)?;
    Ok(df)
}

/// Pivots `metric` to one column per tag (named by tag id), one row per date.
///
/// Rows are sorted by `Date`; tag columns come out in ascending id order.
/// Cells without a record are null.
pub fn readings(flat: &DataFrame, metric: &str) -> Result<DataFrame> {
    if flat.height() == 0 {
        return Ok(DataFrame::new(vec![
            Series::new_empty(DATE_COLUMN.into(), &date_dtype()).into_column(),
        ])?);
    }

    let values = flat
        .column(metric)
        .map_err(|_| Error::MissingColumn(metric.to_string()))?;
    match values.dtype() {
        DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Null => {}
        other => {
            return Err(Error::InvalidRecord(format!(
                "`{}` holds {} values, not numbers",
                metric, other
            )));
        }
    }
    let values = values.cast(&DataType::Float64)?;

    let mut frame = flat.select([TAG_ID_COLUMN, DATE_COLUMN])?;
    frame.with_column(values)?;

    let wide = pivot_stable(
        &frame,
        [TAG_ID_COLUMN],
        Some([DATE_COLUMN]),
        Some([metric]),
        true,
        None,
        None,
    )?;
    Ok(wide.sort([DATE_COLUMN], SortMultipleOptions::default())?)
}

/// Relabels tag columns found in `names`; other columns are left alone.
pub fn rename_tags(wide: &mut DataFrame, names: &HashMap<TagId, String>) -> Result<()> {
    for (id, name) in names {
        let label = id.to_string();
        if wide.get_column_index(&label).is_some() {
            wide.rename(&label, name.as_str().into())?;
        }
    }
    Ok(())
}

// Every record needs an integer `TagId` and a numeric `Date`, and no two may
// share both: the pivot would otherwise have to pick one of them.
fn check_keys(records: &[Value]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(Error::InvalidRecord(format!(
                "record {} is {}, not an object",
                i,
                kind_of(record)
            )));
        };

        let tag_id = fields
            .get(TAG_ID_COLUMN)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::InvalidRecord(format!("record {} has no integer `TagId`", i)))?;
        let date_ms = fields
            .get(DATE_COLUMN)
            .and_then(|d| d.as_i64().or_else(|| d.as_f64().map(|ms| ms as i64)))
            .ok_or_else(|| Error::InvalidRecord(format!("record {} has no numeric `Date`", i)))?;
        let date = from_epoch_ms(date_ms).ok_or_else(|| {
            Error::InvalidRecord(format!("record {} has out-of-range `Date` {}", i, date_ms))
        })?;

        if !seen.insert((tag_id, date_ms)) {
            return Err(Error::DuplicateReading { tag_id, date });
        }
    }
    Ok(())
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
