use thiserror::Error;

/// Faults in a query response body. All of them are upstream errors from the
/// caller's point of view.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column `{column}` holds {value:?}, which is not a valid {datatype}")]
    Cell {
        column: String,
        value: String,
        datatype: String,
    },

    #[error("query rejected by InfluxDB: {0}")]
    Query(String),

    #[error("record is missing the `{0}` column")]
    MissingColumn(&'static str),
}
