//! Turning database rows into the arrays DataTables renders.
//!
//! Every cell is first read into a [`CellValue`], a closed set of the kinds a row can carry,
//! and then mapped to JSON by [`project_value`]. Cells the driver cannot read as any known
//! kind become [`CellValue::Unknown`], and [`UnknownValuePolicy`] decides what happens to
//! them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use sea_orm::prelude::Decimal;
use sea_orm::{DbErr, QueryResult, TryGetError, TryGetable};
use serde_json::Value;

/// One row as sent to the client, in column order.
pub type ProjectedRow = Vec<Value>;

/// A single value read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact numeric, what MySQL returns for DECIMAL columns and `SUM`/`AVG`.
    Decimal(Decimal),
    Timestamp(NaiveDateTime),
    Time(NaiveTime),
    /// The driver returned something none of the other variants can hold.
    Unknown,
}

/// Handling of [`CellValue::Unknown`] cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownValuePolicy {
    /// Leave the cell out. The row comes out shorter than the column list.
    #[default]
    Drop,
    /// Emit `""` so later cells keep their column positions.
    EmptyString,
}

/// Source of cells for one result row.
///
/// The sea-orm [`QueryResult`] implementation never fails: a cell no decoder accepts is
/// reported as [`CellValue::Unknown`]. The error path is for sources that can lose a whole
/// row.
pub trait RowSource {
    /// Read the cell at `index`.
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` when the row cannot be decoded at all; the row is then skipped.
    fn cell(&self, index: usize) -> Result<CellValue, DbErr>;
}

fn decode<T: TryGetable>(row: &QueryResult, index: usize, saw_null: &mut bool) -> Option<T> {
    match T::try_get_by_index(row, index) {
        Ok(value) => Some(value),
        Err(TryGetError::Null(_)) => {
            *saw_null = true;
            None
        }
        Err(TryGetError::DbErr(_)) => None,
    }
}

impl RowSource for QueryResult {
    /// Tries each supported Rust type in turn; the first the driver accepts wins.
    fn cell(&self, index: usize) -> Result<CellValue, DbErr> {
        let mut saw_null = false;

        let cell = if let Some(v) = decode::<i64>(self, index, &mut saw_null) {
            CellValue::Int(v)
        } else if let Some(v) = decode::<u64>(self, index, &mut saw_null) {
            CellValue::UInt(v)
        } else if let Some(v) = decode::<f64>(self, index, &mut saw_null) {
            CellValue::Float(v)
        } else if let Some(v) = decode::<f32>(self, index, &mut saw_null) {
            CellValue::Float(f64::from(v))
        } else if let Some(v) = decode::<Decimal>(self, index, &mut saw_null) {
            CellValue::Decimal(v)
        } else if let Some(v) = decode::<NaiveDateTime>(self, index, &mut saw_null) {
            CellValue::Timestamp(v)
        } else if let Some(v) = decode::<DateTime<Utc>>(self, index, &mut saw_null) {
            CellValue::Timestamp(v.naive_utc())
        } else if let Some(v) = decode::<NaiveDate>(self, index, &mut saw_null) {
            CellValue::Timestamp(v.and_time(NaiveTime::MIN))
        } else if let Some(v) = decode::<NaiveTime>(self, index, &mut saw_null) {
            CellValue::Time(v)
        } else if let Some(v) = decode::<String>(self, index, &mut saw_null) {
            CellValue::Text(v)
        } else if let Some(v) = decode::<Vec<u8>>(self, index, &mut saw_null) {
            CellValue::Bytes(v)
        } else if saw_null {
            CellValue::Null
        } else {
            CellValue::Unknown
        };

        Ok(cell)
    }
}

/// Map one cell to JSON, or `None` when the cell is dropped.
///
/// Nulls become `""`, the same thing the ungrouped SELECT list produces with
/// `IF(ISNULL(...), '', ...)`.
#[must_use]
pub fn project_value(cell: CellValue, policy: UnknownValuePolicy) -> Option<Value> {
    match cell {
        CellValue::Null => Some(Value::String(String::new())),
        CellValue::Text(text) => Some(Value::String(text)),
        CellValue::Bytes(bytes) => Some(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        )),
        CellValue::Int(v) => Some(Value::from(v)),
        CellValue::UInt(v) => Some(Value::from(v)),
        CellValue::Float(v) => Some(Value::from(v)),
        // Kept as text so the scale survives.
        CellValue::Decimal(v) => Some(Value::String(v.to_string())),
        CellValue::Time(v) => Some(Value::String(v.to_string())),
        CellValue::Timestamp(ts) => Some(Value::String(
            ts.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true),
        )),
        CellValue::Unknown => match policy {
            UnknownValuePolicy::Drop => None,
            UnknownValuePolicy::EmptyString => Some(Value::String(String::new())),
        },
    }
}

/// Project the first `width` cells of `row`.
///
/// # Errors
///
/// Propagates the first error returned by [`RowSource::cell`].
pub fn project_row<R: RowSource>(
    row: &R,
    width: usize,
    policy: UnknownValuePolicy,
) -> Result<ProjectedRow, DbErr> {
    let mut projected = Vec::with_capacity(width);
    for index in 0..width {
        if let Some(value) = project_value(row.cell(index)?, policy) {
            projected.push(value);
        }
    }
    Ok(projected)
}

/// Project every row, skipping (and logging) rows that fail to decode.
pub fn project_rows<R: RowSource>(
    rows: &[R],
    width: usize,
    policy: UnknownValuePolicy,
) -> Vec<ProjectedRow> {
    rows.iter()
        .enumerate()
        .filter_map(|(position, row)| match project_row(row, width, policy) {
            Ok(projected) => Some(projected),
            Err(err) => {
                tracing::warn!(row = position, error = ?err, "Skipping row that could not be decoded");
                None
            }
        })
        .collect()
}
