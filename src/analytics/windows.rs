use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Recency bucket for a solved-problem event, anchored at "now".
///
/// Windows are closed-left, open-right in date space: a solve exactly at
/// a cutoff date belongs to the newer window. Nothing ever ages out of
/// `Older` (the 28d+ bucket); old solves keep counting forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    /// Solved within the last 3 days.
    Days3,
    /// Solved within the last 7 days (but not the last 3).
    Days7,
    /// Solved within the last 14 days (but not the last 7).
    Days14,
    /// Everything older, labeled 28d+.
    Older,
}

impl RecencyWindow {
    pub const ALL: [RecencyWindow; 4] = [
        RecencyWindow::Days3,
        RecencyWindow::Days7,
        RecencyWindow::Days14,
        RecencyWindow::Older,
    ];

    /// Bucket for an age in whole days. Ages exactly at a cutoff land in
    /// the newer window; negative ages (future-dated data) are treated
    /// as age zero.
    pub fn for_age_days(age_days: i64) -> RecencyWindow {
        let age = age_days.max(0);
        if age <= 3 {
            RecencyWindow::Days3
        } else if age <= 7 {
            RecencyWindow::Days7
        } else if age <= 14 {
            RecencyWindow::Days14
        } else {
            RecencyWindow::Older
        }
    }

    /// Bucket a calendar solved date relative to `now`.
    pub fn bucket(now: NaiveDate, solved: NaiveDate) -> RecencyWindow {
        RecencyWindow::for_age_days((now - solved).num_days())
    }

    /// Multiplier applied to counts in this window by the weighted score.
    pub fn recency_multiplier(self) -> f64 {
        match self {
            RecencyWindow::Days3 => 1.0,
            RecencyWindow::Days7 => 0.8,
            RecencyWindow::Days14 => 0.5,
            RecencyWindow::Older => 0.3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecencyWindow::Days3 => "3d",
            RecencyWindow::Days7 => "7d",
            RecencyWindow::Days14 => "14d",
            RecencyWindow::Older => "28d+",
        }
    }

    /// Position in [`RecencyWindow::ALL`]; used to index window arrays.
    pub fn index(self) -> usize {
        match self {
            RecencyWindow::Days3 => 0,
            RecencyWindow::Days7 => 1,
            RecencyWindow::Days14 => 2,
            RecencyWindow::Older => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn every_age_maps_to_exactly_one_window() {
        for age in 0..60 {
            let w = RecencyWindow::for_age_days(age);
            let hits = RecencyWindow::ALL.iter().filter(|x| **x == w).count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn boundary_ages_land_in_newer_window() {
        assert_eq!(RecencyWindow::for_age_days(0), RecencyWindow::Days3);
        assert_eq!(RecencyWindow::for_age_days(3), RecencyWindow::Days3);
        assert_eq!(RecencyWindow::for_age_days(4), RecencyWindow::Days7);
        assert_eq!(RecencyWindow::for_age_days(7), RecencyWindow::Days7);
        assert_eq!(RecencyWindow::for_age_days(8), RecencyWindow::Days14);
        assert_eq!(RecencyWindow::for_age_days(14), RecencyWindow::Days14);
        assert_eq!(RecencyWindow::for_age_days(15), RecencyWindow::Older);
    }

    #[test]
    fn old_solves_never_expire() {
        assert_eq!(RecencyWindow::for_age_days(28), RecencyWindow::Older);
        assert_eq!(RecencyWindow::for_age_days(10_000), RecencyWindow::Older);
    }

    #[test]
    fn future_dates_count_as_today() {
        let now = d("2026-08-30");
        assert_eq!(
            RecencyWindow::bucket(now, d("2026-09-05")),
            RecencyWindow::Days3
        );
    }
}
