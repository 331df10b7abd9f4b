//! Flat row model shared by the store adapters and the aggregators.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Column names a tag can never shadow.
pub const RESERVED_KEYS: [&str; 4] = ["_measurement", "_field", "_time", "_value"];

/// A single cell value as reported by the store.
///
/// The variant reflects the column datatype the store declared, not the
/// semantic type of the field. Aggregators coerce with [`Scalar::to_i64`],
/// [`Scalar::to_f64`] and [`Scalar::to_text`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Scalar {
    /// Integer coercion: floats truncate toward zero, booleans map to 1/0 and
    /// strings must parse as a base-10 integer.
    pub fn to_i64(&self, field: &str) -> CoreResult<i64> {
        match self {
            Scalar::Int(v) => Ok(*v),
            Scalar::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            Scalar::Bool(b) => Ok(i64::from(*b)),
            Scalar::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| self.coercion_error(field, "integer")),
            Scalar::Float(_) => Err(self.coercion_error(field, "integer")),
        }
    }

    /// Float coercion: integers widen, booleans map to 1.0/0.0 and strings
    /// must parse as a float.
    pub fn to_f64(&self, field: &str) -> CoreResult<f64> {
        match self {
            Scalar::Int(v) => Ok(*v as f64),
            Scalar::Float(v) => Ok(*v),
            Scalar::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Scalar::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.coercion_error(field, "float")),
        }
    }

    /// Textual rendering; never fails.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    fn coercion_error(&self, field: &str, expected: &'static str) -> CoreError {
        CoreError::Coercion {
            field: field.to_string(),
            value: self.to_string(),
            expected,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            // Integral floats keep one decimal so 5.0 does not read as an integer.
            Scalar::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Str(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Str(v)
    }
}

/// One sample of one field, with every tag of its series merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub measurement: String,
    pub field: String,
    pub time: DateTime<Utc>,
    pub value: Scalar,
    pub tags: BTreeMap<String, String>,
}

impl Row {
    pub fn new(
        measurement: impl Into<String>,
        field: impl Into<String>,
        time: DateTime<Utc>,
        value: impl Into<Scalar>,
    ) -> Self {
        Self {
            measurement: measurement.into(),
            field: field.into(),
            time,
            value: value.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Attach a tag. Reserved column names are ignored.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_tag(key, value);
        self
    }

    pub fn insert_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return;
        }
        self.tags.insert(key, value.into());
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// The tag as a string scalar, for seeding builder attributes.
    pub fn tag_scalar(&self, key: &str) -> Option<Scalar> {
        self.tag(key).map(Scalar::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_coercion_follows_numeric_rules() {
        assert_eq!(Scalar::Float(3.9).to_i64("x").expect("float"), 3);
        assert_eq!(Scalar::Float(-3.9).to_i64("x").expect("neg float"), -3);
        assert_eq!(Scalar::Bool(true).to_i64("x").expect("bool"), 1);
        assert_eq!(Scalar::from(" 42 ").to_i64("x").expect("str"), 42);
    }

    #[test]
    fn non_numeric_text_is_a_coercion_error() {
        let err = Scalar::from("eleven").to_i64("channel").expect_err("must fail");
        match err {
            CoreError::Coercion {
                field, expected, ..
            } => {
                assert_eq!(field, "channel");
                assert_eq!(expected, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(Scalar::from("3.5").to_i64("x").is_err());
        assert!(Scalar::from("n/a").to_f64("x").is_err());
    }

    #[test]
    fn float_coercion_accepts_integers_and_text() {
        assert_eq!(Scalar::Int(7).to_f64("x").expect("int"), 7.0);
        assert_eq!(Scalar::from("12.5").to_f64("x").expect("str"), 12.5);
    }

    #[test]
    fn text_rendering_keeps_float_decimal() {
        assert_eq!(Scalar::Float(5.0).to_text(), "5.0");
        assert_eq!(Scalar::Float(2.25).to_text(), "2.25");
        assert_eq!(Scalar::Int(5).to_text(), "5");
        assert_eq!(Scalar::from("5.2.1").to_text(), "5.2.1");
    }

    #[test]
    fn tags_cannot_shadow_reserved_keys() {
        let row = Row::new("ap_metrics", "clientCount", Utc::now(), 3_i64)
            .with_tag("_field", "bogus")
            .with_tag("apMac", "aa:bb");
        assert_eq!(row.field, "clientCount");
        assert_eq!(row.tag("_field"), None);
        assert_eq!(row.tag("apMac"), Some("aa:bb"));
    }
}
