//! Decoder for InfluxDB annotated CSV.
//!
//! A response is a sequence of tables. Each table starts with `#datatype`,
//! `#group` and `#default` annotation rows followed by a header row and its
//! records. The first column of every row is reserved for annotations and is
//! empty on header and record rows.

use chrono::{DateTime, Utc};

use crate::error::DecodeError;

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Str(String),
    Long(i64),
    Double(f64),
    Bool(bool),
    Time(DateTime<Utc>),
}

/// One decoded record. A `None` cell is a null.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub cells: Vec<(String, Option<Cell>)>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, cell)| cell.as_ref())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }
}

#[derive(Default)]
struct TableHeader {
    datatypes: Vec<String>,
    defaults: Vec<String>,
    columns: Option<Vec<String>>,
}

impl TableHeader {
    fn in_body(&self) -> bool {
        self.columns.is_some()
    }
}

/// Decode every table of `body` into a flat record list.
pub fn decode(body: &str) -> Result<Vec<Record>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut table = TableHeader::default();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let first = row.get(0).unwrap_or_default();
        let rest = || row.iter().skip(1).map(str::to_string).collect::<Vec<_>>();

        if first.starts_with('#') {
            if table.in_body() {
                table = TableHeader::default();
            }
            match first {
                "#datatype" => table.datatypes = rest(),
                "#default" => table.defaults = rest(),
                _ => {}
            }
            continue;
        }

        let Some(columns) = &table.columns else {
            table.columns = Some(rest());
            continue;
        };

        // Unannotated tables of the same shape repeat the header row.
        if row.iter().skip(1).eq(columns.iter().map(String::as_str)) {
            continue;
        }

        if let Some(idx) = columns.iter().position(|c| c == "error") {
            let message = row.get(idx + 1).unwrap_or_default();
            return Err(DecodeError::Query(message.to_string()));
        }

        let mut record = Record::default();
        for (idx, name) in columns.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let raw = row.get(idx + 1).unwrap_or_default();
            let raw = if raw.is_empty() {
                table.defaults.get(idx).map(String::as_str).unwrap_or_default()
            } else {
                raw
            };
            let datatype = table.datatypes.get(idx).map(String::as_str).unwrap_or("string");
            let cell = parse_cell(name, datatype, raw)?;
            record.cells.push((name.clone(), cell));
        }
        records.push(record);
    }

    Ok(records)
}

fn parse_cell(column: &str, datatype: &str, raw: &str) -> Result<Option<Cell>, DecodeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let invalid = || DecodeError::Cell {
        column: column.to_string(),
        value: raw.to_string(),
        datatype: datatype.to_string(),
    };
    let cell = match datatype {
        "long" => Cell::Long(raw.parse().map_err(|_| invalid())?),
        "unsignedLong" => {
            let v: u64 = raw.parse().map_err(|_| invalid())?;
            Cell::Long(i64::try_from(v).map_err(|_| invalid())?)
        }
        "double" => Cell::Double(raw.parse().map_err(|_| invalid())?),
        "boolean" => match raw {
            "true" => Cell::Bool(true),
            "false" => Cell::Bool(false),
            _ => return Err(invalid()),
        },
        t if t.starts_with("dateTime") => Cell::Time(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|_| invalid())?
                .with_timezone(&Utc),
        ),
        _ => Cell::Str(raw.to_string()),
    };
    Ok(Some(cell))
}
