//! Flattening of decoded records into [`Row`]s.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;
use wifidash_core::row::RESERVED_KEYS;
use wifidash_core::{Row, Scalar};

use crate::annotated::{Cell, Record};
use crate::error::DecodeError;

/// Columns InfluxDB adds to every table that are not series tags.
const BOOKKEEPING: [&str; 4] = ["result", "table", "_start", "_stop"];

fn to_scalar(cell: &Cell) -> Scalar {
    match cell {
        Cell::Str(s) => Scalar::Str(s.clone()),
        Cell::Long(v) => Scalar::Int(*v),
        Cell::Double(v) => Scalar::Float(*v),
        Cell::Bool(b) => Scalar::Bool(*b),
        Cell::Time(t) => Scalar::Str(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}

fn to_tag(cell: &Cell) -> String {
    match cell {
        Cell::Str(s) => s.clone(),
        other => to_scalar(other).to_text(),
    }
}

fn text<'a>(record: &'a Record, column: &'static str) -> Result<&'a str, DecodeError> {
    match record.get(column) {
        Some(Cell::Str(s)) => Ok(s),
        _ => Err(DecodeError::MissingColumn(column)),
    }
}

fn timestamp(record: &Record) -> Result<DateTime<Utc>, DecodeError> {
    match record.get("_time") {
        Some(Cell::Time(t)) => Ok(*t),
        Some(Cell::Str(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| DecodeError::Cell {
                column: "_time".to_string(),
                value: raw.clone(),
                datatype: "dateTime:RFC3339".to_string(),
            }),
        _ => Err(DecodeError::MissingColumn("_time")),
    }
}

/// Turn records into rows, in order. Records with a null `_value` are
/// dropped; empty tag cells are not carried over.
pub fn normalize(records: &[Record]) -> Result<Vec<Row>, DecodeError> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let measurement = text(record, "_measurement")?;
        let field = text(record, "_field")?;
        let time = timestamp(record)?;
        let Some(value) = record.get("_value") else {
            debug!(measurement, field, "skipping record with null value");
            continue;
        };

        let mut row = Row::new(measurement, field, time, to_scalar(value));
        for (name, cell) in &record.cells {
            if name.is_empty()
                || BOOKKEEPING.contains(&name.as_str())
                || RESERVED_KEYS.contains(&name.as_str())
            {
                continue;
            }
            if let Some(cell) = cell {
                let tag = to_tag(cell);
                if !tag.is_empty() {
                    row.insert_tag(name.as_str(), tag);
                }
            }
        }
        rows.push(row);
    }
    Ok(rows)
}
