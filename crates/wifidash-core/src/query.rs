//! Structured query descriptions and their Flux rendering.
//!
//! Handlers never format query text themselves. They describe what they need
//! as a [`FluxQuery`] and the store adapter calls [`FluxQuery::render`], which
//! is the only place user-supplied values reach query text.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::error::{CoreError, CoreResult};

/// Lower bound of a query range.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeStart {
    /// Lookback relative to now, rendered as `-30m`, `-2h`, `-7d`.
    Relative(Duration),
    Absolute(DateTime<Utc>),
}

/// Upper bound of a query range.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeStop {
    Now,
    Absolute(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub start: RangeStart,
    pub stop: Option<RangeStop>,
}

impl TimeRange {
    /// The trailing window ending now.
    pub fn last(lookback: Duration) -> Self {
        Self {
            start: RangeStart::Relative(lookback),
            stop: None,
        }
    }

    /// An explicit window; a missing start falls back to `default_lookback`
    /// and a missing stop to now.
    pub fn between(
        start: Option<DateTime<Utc>>,
        stop: Option<DateTime<Utc>>,
        default_lookback: Duration,
    ) -> Self {
        Self {
            start: start
                .map(RangeStart::Absolute)
                .unwrap_or(RangeStart::Relative(default_lookback)),
            stop: Some(stop.map(RangeStop::Absolute).unwrap_or(RangeStop::Now)),
        }
    }
}

/// Tag predicate pushed down to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equals { tag: String, value: String },
    /// Tag equals any of the values; rendered as an anchored regex alternation.
    OneOf { tag: String, values: Vec<String> },
}

impl Filter {
    pub fn equals(tag: &str, value: &str) -> CoreResult<Self> {
        check_value(tag, value)?;
        Ok(Filter::Equals {
            tag: tag.to_string(),
            value: value.to_string(),
        })
    }

    pub fn one_of<I, S>(tag: &str, values: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(CoreError::InvalidFilter {
                field: tag.to_string(),
                reason: "at least one value is required".to_string(),
            });
        }
        for value in &values {
            check_value(tag, value)?;
        }
        Ok(Filter::OneOf {
            tag: tag.to_string(),
            values,
        })
    }

    pub fn tag(&self) -> &str {
        match self {
            Filter::Equals { tag, .. } | Filter::OneOf { tag, .. } => tag,
        }
    }

    /// Evaluate the predicate against a tag set.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            Filter::Equals { tag, value } => tags.get(tag) == Some(value),
            Filter::OneOf { tag, values } => tags
                .get(tag)
                .is_some_and(|actual| values.iter().any(|v| v == actual)),
        }
    }

    fn render(&self) -> String {
        match self {
            Filter::Equals { tag, value } => {
                format!("r[{}] == {}", flux_string(tag), flux_string(value))
            }
            Filter::OneOf { tag, values } => {
                format!("r[{}] =~ {}", flux_string(tag), flux_regex(values))
            }
        }
    }
}

/// Reject values that cannot be safely embedded in query text.
fn check_value(field: &str, value: &str) -> CoreResult<()> {
    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(CoreError::InvalidFilter {
            field: field.to_string(),
            reason: format!("control character U+{:04X} is not allowed", c as u32),
        });
    }
    Ok(())
}

/// Per-series reduction applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    #[default]
    None,
    /// Keep the most recent sample of every series.
    Last,
    /// Mean over fixed windows of `every_minutes`, empty windows dropped.
    WindowMean { every_minutes: u32 },
}

/// Everything the store needs to answer one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxQuery {
    pub measurement: String,
    pub range: TimeRange,
    pub filters: Vec<Filter>,
    pub group_by: Vec<String>,
    pub reducer: Reducer,
}

impl FluxQuery {
    pub fn new(measurement: &str, range: TimeRange) -> Self {
        Self {
            measurement: measurement.to_string(),
            range,
            filters: Vec::new(),
            group_by: Vec::new(),
            reducer: Reducer::None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Push an optional equality filter; `None` and empty values are skipped.
    pub fn filter_eq(self, tag: &str, value: Option<&str>) -> CoreResult<Self> {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => Ok(self.filter(Filter::equals(tag, v)?)),
            None => Ok(self),
        }
    }

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn last(mut self) -> Self {
        self.reducer = Reducer::Last;
        self
    }

    pub fn window_mean(mut self, every_minutes: u32) -> Self {
        self.reducer = Reducer::WindowMean { every_minutes };
        self
    }

    /// Render the query as Flux against `bucket`.
    pub fn render(&self, bucket: &str) -> String {
        let mut out = format!("from(bucket: {})\n", flux_string(bucket));

        let start = match &self.range.start {
            RangeStart::Relative(lookback) => format!("-{}", flux_duration(*lookback)),
            RangeStart::Absolute(at) => flux_time(at),
        };
        match &self.range.stop {
            None => out.push_str(&format!("  |> range(start: {start})\n")),
            Some(stop) => {
                let stop = match stop {
                    RangeStop::Now => "now()".to_string(),
                    RangeStop::Absolute(at) => flux_time(at),
                };
                out.push_str(&format!("  |> range(start: {start}, stop: {stop})\n"));
            }
        }

        out.push_str(&format!(
            "  |> filter(fn: (r) => r[\"_measurement\"] == {})\n",
            flux_string(&self.measurement)
        ));

        if !self.filters.is_empty() {
            let predicate = self
                .filters
                .iter()
                .map(Filter::render)
                .collect::<Vec<_>>()
                .join(" and ");
            out.push_str(&format!("  |> filter(fn: (r) => {predicate})\n"));
        }

        if !self.group_by.is_empty() {
            let columns = self
                .group_by
                .iter()
                .map(|c| flux_string(c))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("  |> group(columns: [{columns}])\n"));
        }

        match self.reducer {
            Reducer::None => {}
            Reducer::Last => out.push_str("  |> last()\n"),
            Reducer::WindowMean { every_minutes } => out.push_str(&format!(
                "  |> aggregateWindow(every: {}m, fn: mean, createEmpty: false)\n",
                every_minutes.max(1)
            )),
        }

        out
    }
}

/// Quote a Flux string literal.
fn flux_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            // `${` opens string interpolation in Flux.
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Anchored alternation, e.g. `/^(?:zone-001|zone-002)$/`.
fn flux_regex(values: &[String]) -> String {
    let alternation = values
        .iter()
        .map(|v| regex::escape(v).replace('/', "\\/"))
        .collect::<Vec<_>>()
        .join("|");
    format!("/^(?:{alternation})$/")
}

fn flux_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(1);
    if secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

fn flux_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
