use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;
use truelevel_schemas::car_count::CarCount;

/// A reporting window, open at the start and closed at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at > self.start && at <= self.end
    }

    pub fn covers(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        from >= self.start && to <= self.end
    }

    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        from < self.end && to > self.start
    }
}

/// A count window that overlaps the period without lying inside it.
///
/// Its cars can't be split by time, so they are left out of the period and
/// listed instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCarCount {
    pub package_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub cars: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodCarCounts {
    pub by_package: BTreeMap<String, u64>,
    pub skipped: Vec<SkippedCarCount>,
}

/// Cars per package for one site, summing every count window that lies inside the period.
///
/// Windows that only partly overlap the period are returned in `skipped`.
pub fn car_counts_for_period(
    counts: &[CarCount],
    site_id: &str,
    period: &ReportPeriod,
) -> PeriodCarCounts {
    let mut result = PeriodCarCounts::default();
    for count in counts.iter().filter(|c| c.site_id == site_id) {
        if period.covers(count.period_start, count.period_end) {
            *result.by_package.entry(count.package_id.clone()).or_insert(0) += count.cars;
        } else if period.overlaps(count.period_start, count.period_end) {
            warn!(
                site_id,
                package_id = %count.package_id,
                window_start = %count.period_start,
                window_end = %count.period_end,
                cars = count.cars,
                "car count window straddles the report period; its cars are not counted"
            );
            result.skipped.push(SkippedCarCount {
                package_id: count.package_id.clone(),
                period_start: count.period_start,
                period_end: count.period_end,
                cars: count.cars,
            });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
    }

    fn count(site: &str, package: &str, from: u32, to: u32, cars: u64) -> CarCount {
        CarCount {
            site_id: site.to_string(),
            package_id: package.to_string(),
            period_start: day(from),
            period_end: day(to),
            cars,
        }
    }

    #[test]
    fn sums_windows_inside_period_for_site() {
        let period = ReportPeriod::new(day(1), day(15));
        let counts = vec![
            count("S1", "BASIC", 1, 8, 120),
            count("S1", "BASIC", 8, 15, 80),
            count("S1", "DELUXE", 1, 15, 40),
            count("S1", "DELUXE", 10, 20, 999),
            count("S2", "BASIC", 1, 8, 500),
        ];
        let totals = car_counts_for_period(&counts, "S1", &period);
        assert_eq!(totals.by_package.get("BASIC"), Some(&200));
        assert_eq!(totals.by_package.get("DELUXE"), Some(&40));
        assert_eq!(totals.by_package.len(), 2);
        assert_eq!(totals.skipped.len(), 1);
        assert_eq!(totals.skipped[0].cars, 999);
    }

    #[test]
    fn straddling_monthly_export_is_listed_not_lost() {
        let period = ReportPeriod::new(day(1), day(15));
        let counts = vec![
            CarCount {
                site_id: "S1".to_string(),
                package_id: "BASIC".to_string(),
                period_start: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
                period_end: day(30),
                cars: 1000,
            },
            count("S1", "BASIC", 15, 30, 7),
            count("S1", "BASIC", 20, 30, 5),
        ];
        let totals = car_counts_for_period(&counts, "S1", &period);
        assert!(totals.by_package.is_empty());
        // Windows touching only the period edge don't overlap it.
        assert_eq!(totals.skipped.len(), 1);
        assert_eq!(totals.skipped[0].cars, 1000);
        assert_eq!(totals.skipped[0].package_id, "BASIC");
    }

    #[test]
    fn period_is_open_at_start() {
        let period = ReportPeriod::new(day(1), day(15));
        assert!(!period.contains(day(1)));
        assert!(period.contains(day(15)));
    }
}
