use crate::error::TrueLevelError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use truelevel_schemas::snapshot::InventorySnapshot;

/// Gallons consumed by one chemical at one site between two snapshots.
///
/// `gallons_consumed` is kept raw: a negative value means more product is on
/// hand than was accounted for, and is flagged `anomalous` instead of clamped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRecord {
    pub chemical_id: String,
    pub site_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub gallons_consumed: f64,
    pub anomalous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    NoPriorReading,
    NoReadingInPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UsageOutcome {
    Derived(UsageRecord),
    Excluded {
        chemical_id: String,
        site_id: String,
        at: DateTime<Utc>,
        reason: ExclusionReason,
    },
}

pub fn derive_usage(
    previous: &InventorySnapshot,
    current: &InventorySnapshot,
) -> Result<UsageRecord, TrueLevelError> {
    let mismatch = |reason: String| TrueLevelError::MismatchedSnapshots {
        chemical_id: current.chemical_id.clone(),
        site_id: current.site_id.clone(),
        timestamp: current.timestamp,
        reason,
    };

    if previous.chemical_id != current.chemical_id {
        return Err(mismatch(format!(
            "previous snapshot is for chemical '{}'",
            previous.chemical_id
        )));
    }
    if previous.site_id != current.site_id {
        return Err(mismatch(format!("previous snapshot is for site '{}'", previous.site_id)));
    }
    if current.timestamp <= previous.timestamp {
        return Err(mismatch(format!(
            "previous snapshot at {} is not earlier",
            previous.timestamp
        )));
    }

    let gallons_consumed = previous.total_on_hand_gallons + current.delivery_gallons
        - current.total_on_hand_gallons;
    let anomalous = gallons_consumed < 0.0;
    if anomalous {
        warn!(
            chemical_id = %current.chemical_id,
            site_id = %current.site_id,
            period_end = %current.timestamp,
            gallons_consumed,
            "negative usage; likely an unrecorded delivery or a unit mistake"
        );
    }

    Ok(UsageRecord {
        chemical_id: current.chemical_id.clone(),
        site_id: current.site_id.clone(),
        period_start: previous.timestamp,
        period_end: current.timestamp,
        gallons_consumed,
        anomalous,
    })
}

/// Derives usage between each consecutive pair of snapshots for one chemical/site.
///
/// The earliest snapshot has nothing to compare against and comes back as
/// an exclusion rather than an assumed zero.
pub fn derive_usage_series(
    snapshots: &[InventorySnapshot],
) -> Result<Vec<UsageOutcome>, TrueLevelError> {
    let mut ordered: Vec<&InventorySnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut outcomes = Vec::with_capacity(ordered.len());
    if let Some(first) = ordered.first() {
        outcomes.push(UsageOutcome::Excluded {
            chemical_id: first.chemical_id.clone(),
            site_id: first.site_id.clone(),
            at: first.timestamp,
            reason: ExclusionReason::NoPriorReading,
        });
    }
    for pair in ordered.windows(2) {
        outcomes.push(UsageOutcome::Derived(derive_usage(pair[0], pair[1])?));
    }
    Ok(outcomes)
}

/// Merges consecutive usage records of one chemical/site into a single period record.
///
/// Returns `None` for an empty slice. An anomaly in any part carries over,
/// so a negative interval can't hide inside a positive total.
pub fn combine_usage(records: &[UsageRecord]) -> Option<UsageRecord> {
    let first = records.first()?;
    let mut combined = first.clone();
    for record in &records[1..] {
        combined.period_start = combined.period_start.min(record.period_start);
        combined.period_end = combined.period_end.max(record.period_end);
        combined.gallons_consumed += record.gallons_consumed;
        combined.anomalous |= record.anomalous;
    }
    combined.anomalous |= combined.gallons_consumed < 0.0;
    Some(combined)
}
