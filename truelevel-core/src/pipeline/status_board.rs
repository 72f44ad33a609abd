use crate::{
    conversion::ConversionTable,
    error::{ErrorKind, TrueLevelError},
    snapshot::snapshot_from_visit,
    status::{classify, TankStatus},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use truelevel_schemas::{
    chemical::Chemical, container::ContainerProfile, site::{Site, Tank}, visit::Visit,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TankState {
    Classified { status: TankStatus },
    NoReading,
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankStatusRow {
    pub tank_id: String,
    pub chemical_id: String,
    pub capacity_gallons: f64,
    pub last_reading_at: Option<DateTime<Utc>>,
    pub tank_gallons: Option<f64>,
    pub state: TankState,
}

/// Classifies every tank at `site` from its most recent visit reading.
///
/// The tank's own alert threshold overrides the chemical catalog's.
pub fn tank_statuses(
    site: &Site,
    visits: &[Visit],
    chemicals: &[Chemical],
    container_profiles: &[ContainerProfile],
) -> Vec<TankStatusRow> {
    let mut site_visits: Vec<&Visit> = visits.iter().filter(|v| v.site_id == site.site_id).collect();
    site_visits.sort_by_key(|v| std::cmp::Reverse(v.visited_at));

    site.tanks
        .iter()
        .map(|tank| {
            let mut row = TankStatusRow {
                tank_id: tank.tank_id.clone(),
                chemical_id: tank.chemical_id.clone(),
                capacity_gallons: tank.capacity_gallons,
                last_reading_at: None,
                tank_gallons: None,
                state: TankState::NoReading,
            };
            if let Err(e) = classify_tank(tank, &site_visits, chemicals, container_profiles, &mut row) {
                row.state = TankState::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                };
            }
            row
        })
        .collect()
}

fn classify_tank(
    tank: &Tank,
    latest_first: &[&Visit],
    chemicals: &[Chemical],
    container_profiles: &[ContainerProfile],
    row: &mut TankStatusRow,
) -> Result<(), TrueLevelError> {
    let table = match &tank.container_profile_id {
        Some(id) => {
            let profile = container_profiles
                .iter()
                .find(|p| &p.profile_id == id)
                .ok_or_else(|| TrueLevelError::ContainerProfileNotFound(id.clone()))?;
            Some(ConversionTable::from_profile(profile)?)
        }
        None => None,
    };

    let Some(snapshot) = latest_first
        .iter()
        .find_map(|v| snapshot_from_visit(v, &tank.chemical_id, table.as_ref()))
        .transpose()?
    else {
        return Ok(());
    };

    let threshold = tank.alert_threshold_gallons.or_else(|| {
        chemicals
            .iter()
            .find(|c| c.chemical_id == tank.chemical_id)
            .and_then(|c| c.alert_threshold_gallons)
    });

    row.last_reading_at = Some(snapshot.timestamp);
    row.tank_gallons = Some(snapshot.tank_gallons);
    row.state = TankState::Classified {
        status: classify(snapshot.tank_gallons, tank.capacity_gallons, threshold)?,
    };
    Ok(())
}
