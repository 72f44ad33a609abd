use crate::{
    conversion::{resolve_gallons, Clamp, ConversionTable},
    error::TrueLevelError,
};
use chrono::{DateTime, Utc};
use truelevel_schemas::{
    snapshot::InventorySnapshot,
    visit::{ChemicalEntry, ReadingMethod, Visit},
};
use tracing::warn;

/// Turns one visit entry into an inventory snapshot.
///
/// Depth readings need the tank's conversion table; gallon readings don't.
pub fn build_snapshot(
    site_id: &str,
    timestamp: DateTime<Utc>,
    entry: &ChemicalEntry,
    table: Option<&ConversionTable>,
) -> Result<InventorySnapshot, TrueLevelError> {
    let context = |field: &str| {
        format!(
            "{} of chemical '{}' at site '{}' on {}",
            field, entry.chemical_id, site_id, timestamp
        )
    };

    let reading = &entry.tank_reading;
    for (field, value) in [
        ("tank reading", reading.raw_value),
        ("backstock", entry.backstock_gallons),
        ("delivery", entry.delivery_gallons),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(TrueLevelError::InvalidReading {
                context: context(field),
                value,
            });
        }
    }

    let (tank_gallons, clamped) = match (reading.method, table) {
        (ReadingMethod::Gallons, _) => (reading.raw_value, None),
        (ReadingMethod::Inches, Some(table)) => {
            let resolved = resolve_gallons(table, reading)?;
            (resolved.gallons, resolved.clamped)
        }
        (ReadingMethod::Inches, None) => {
            return Err(TrueLevelError::ContainerProfileNotFound(format!(
                "no container profile for the tank of chemical '{}' at site '{}'",
                entry.chemical_id, site_id
            )))
        }
    };

    if let (Some(side), Some(table)) = (clamped, table) {
        let side = match side {
            Clamp::BelowRange => "below",
            Clamp::AboveRange => "above",
        };
        warn!(
            chemical_id = %entry.chemical_id,
            site_id,
            profile_id = table.profile_id(),
            %timestamp,
            inches = reading.raw_value,
            "depth reading is {} the calibrated range; clamped to {:.2} gal",
            side,
            tank_gallons
        );
    }

    Ok(InventorySnapshot {
        chemical_id: entry.chemical_id.clone(),
        site_id: site_id.to_string(),
        timestamp,
        tank_gallons,
        backstock_gallons: entry.backstock_gallons,
        delivery_gallons: entry.delivery_gallons,
        total_on_hand_gallons: tank_gallons + entry.backstock_gallons,
        clamped: clamped.is_some(),
    })
}

/// Builds the snapshot for `chemical_id` recorded on a visit, if the visit checked it.
pub fn snapshot_from_visit(
    visit: &Visit,
    chemical_id: &str,
    table: Option<&ConversionTable>,
) -> Option<Result<InventorySnapshot, TrueLevelError>> {
    visit
        .entries
        .iter()
        .find(|e| e.chemical_id == chemical_id)
        .map(|entry| build_snapshot(&visit.site_id, visit.visited_at, entry, table))
}
