//! Shared response shaping: pagination, palettes and rounding.

use serde::Serialize;

pub const FALLBACK_COLOR: &str = "#999999";

/// Load bands in presentation order.
pub const BAND_LABELS: [&str; 3] = ["2.4G", "5G", "6G/5G"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// Slice `items` to one page. `total` is counted before slicing.
pub fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> (Vec<T>, Pagination) {
    let total = items.len();
    let page = items.into_iter().skip(offset).take(limit).collect();
    let pagination = Pagination {
        total,
        limit,
        offset,
        has_more: offset.saturating_add(limit) < total,
    };
    (page, pagination)
}

pub fn os_color(os: &str) -> &'static str {
    match os {
        "iOS" => "#8B5CF6",
        "Android" => "#3B82F6",
        "Unknown" => "#1E3A5F",
        "Chrome OS/Chromebook" => "#10B981",
        "macOS" => "#D1D5DB",
        "Windows" => "#6B7280",
        _ => FALLBACK_COLOR,
    }
}

pub fn band_color(band: &str) -> &'static str {
    match band {
        "2.4G" => "#1E3A5F",
        "5G" => "#10B981",
        "6G/5G" => "#3B82F6",
        _ => FALLBACK_COLOR,
    }
}

/// Two decimals of the exact binary value, ties to even.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_partial_page() {
        let items: Vec<u32> = (0..25).collect();
        let (page, p) = paginate(items.clone(), 10, 20);
        assert_eq!(page, vec![20, 21, 22, 23, 24]);
        assert_eq!(p.total, 25);
        assert!(!p.has_more);

        let (page, p) = paginate(items, 10, 0);
        assert_eq!(page.len(), 10);
        assert!(p.has_more);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let (page, p) = paginate(vec![1, 2, 3], 10, 50);
        assert!(page.is_empty());
        assert_eq!(p.total, 3);
        assert!(!p.has_more);
    }

    #[test]
    fn unknown_labels_get_fallback_color() {
        assert_eq!(os_color("iOS"), "#8B5CF6");
        assert_eq!(os_color("Plan 9"), FALLBACK_COLOR);
        assert_eq!(band_color("6G/5G"), "#3B82F6");
        assert_eq!(band_color("60G"), FALLBACK_COLOR);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let (_, p) = paginate(vec![1], 1, 0);
        let v = serde_json::to_value(p).expect("serialize");
        assert_eq!(v["hasMore"], false);
        assert_eq!(v["total"], 1);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(200.0 / 3.0), 66.67);
        assert_eq!(round2(100.0 / 3.0), 33.33);
    }

    #[test]
    fn exact_ties_round_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(99.875), 99.88);
        // 2.675 is stored just below the tie
        assert_eq!(round2(2.675), 2.67);
    }
}
