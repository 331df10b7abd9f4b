//! 802.11 disconnect cause codes.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, float_field, int_field, text_field, EntityBuilder};
use crate::error::CoreResult;
use crate::query::{FluxQuery, TimeRange};
use crate::row::{Row, Scalar};
use crate::store::TelemetryStore;

pub const MEASUREMENT: &str = "disconnect_codes";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CauseCode {
    pub code: i64,
    pub description: String,
    pub count: i64,
    pub impact_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CauseCodeSort {
    #[default]
    Count,
    ImpactScore,
}

pub struct CauseCodeBuilder {
    code: i64,
    description: Option<Scalar>,
    count: Option<Scalar>,
    impact_score: Option<Scalar>,
}

impl EntityBuilder for CauseCodeBuilder {
    type Key = i64;
    type Output = CauseCode;
    const MEASUREMENT: &'static str = MEASUREMENT;

    /// A missing `code` tag groups under code 0.
    fn key(row: &Row) -> CoreResult<Option<i64>> {
        match row.tag("code") {
            Some(raw) => Scalar::from(raw).to_i64("code").map(Some),
            None => Ok(Some(0)),
        }
    }

    fn seed(key: &i64, _row: &Row) -> Self {
        Self {
            code: *key,
            description: None,
            count: None,
            impact_score: None,
        }
    }

    fn apply(&mut self, row: &Row) {
        let slot = match row.field.as_str() {
            "description" => &mut self.description,
            "count" => &mut self.count,
            "impactScore" => &mut self.impact_score,
            _ => return,
        };
        *slot = Some(row.value.clone());
    }

    fn finish(self) -> CoreResult<CauseCode> {
        Ok(CauseCode {
            code: self.code,
            description: text_field(self.description.as_ref(), ""),
            count: int_field(self.count.as_ref(), "count")?,
            impact_score: float_field(self.impact_score.as_ref(), "impactScore")?,
        })
    }
}

pub fn cause_code_query() -> FluxQuery {
    FluxQuery::new(MEASUREMENT, TimeRange::last(Duration::hours(48)))
        .group_by(&["code"])
        .last()
}

/// Descending by the chosen measure.
pub fn sort_cause_codes(codes: &mut [CauseCode], sort: CauseCodeSort) {
    match sort {
        CauseCodeSort::Count => codes.sort_by(|a, b| b.count.cmp(&a.count)),
        CauseCodeSort::ImpactScore => {
            codes.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score))
        }
    }
}

pub async fn fetch_cause_codes(
    store: &dyn TelemetryStore,
    sort: CauseCodeSort,
    limit: Option<usize>,
) -> CoreResult<Vec<CauseCode>> {
    let rows = store.query(&cause_code_query()).await?;
    let mut codes = aggregate::<CauseCodeBuilder>(&rows)?;
    sort_cause_codes(&mut codes, sort);
    if let Some(limit) = limit {
        codes.truncate(limit);
    }
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(code: Option<&str>, field: &str, value: impl Into<Scalar>) -> Row {
        let row = Row::new(MEASUREMENT, field, Utc::now(), value);
        match code {
            Some(code) => row.with_tag("code", code),
            None => row,
        }
    }

    #[test]
    fn sorted_by_count_descending() {
        let rows = vec![
            row(Some("3"), "count", 50_i64),
            row(Some("8"), "count", 200_i64),
            row(Some("3"), "impactScore", 9.5),
            row(Some("8"), "impactScore", 1.0),
        ];
        let mut codes = aggregate::<CauseCodeBuilder>(&rows).expect("aggregate");
        sort_cause_codes(&mut codes, CauseCodeSort::Count);
        let counts: Vec<_> = codes.iter().map(|c| c.count).collect();
        assert_eq!(counts, [200, 50]);

        sort_cause_codes(&mut codes, CauseCodeSort::ImpactScore);
        assert_eq!(codes[0].code, 3);
    }

    #[test]
    fn missing_code_groups_under_zero() {
        let rows = vec![row(None, "description", "Unspecified")];
        let codes = aggregate::<CauseCodeBuilder>(&rows).expect("aggregate");
        assert_eq!(codes[0].code, 0);
        assert_eq!(codes[0].description, "Unspecified");
        assert_eq!(codes[0].count, 0);
        assert_eq!(codes[0].impact_score, 0.0);
    }

    #[test]
    fn non_numeric_code_is_a_coercion_error() {
        let rows = vec![row(Some("deauth"), "count", 1_i64)];
        assert!(matches!(
            aggregate::<CauseCodeBuilder>(&rows),
            Err(crate::CoreError::Coercion { .. })
        ));
    }
}
