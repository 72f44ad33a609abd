//! Apportions a chemical's usage and cost across the applications and
//! packages that consumed it, weighted by work units.

use crate::{error::TrueLevelError, usage::UsageRecord, work::{compute_work, ApplicationWork}};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationShare {
    pub application_id: String,
    pub cost: f64,
    pub gallons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageShare {
    pub package_id: String,
    pub cost: f64,
    pub gallons: f64,
    pub cars_served: u64,
    /// `None` when the package served no cars.
    pub cost_per_car: Option<f64>,
}

/// Usage that no active application could absorb.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnattributedCost {
    pub cost: f64,
    pub gallons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostAllocation {
    pub chemical_id: String,
    pub site_id: String,
    /// Reading-to-reading span the gallons were measured over. It can start
    /// before the report period when the prior reading predates it.
    pub usage_start: DateTime<Utc>,
    pub usage_end: DateTime<Utc>,
    pub unit_cost: f64,
    pub gallons_consumed: f64,
    pub total_cost: f64,
    /// Carried from the usage record; the figures are raw.
    pub anomalous: bool,
    pub by_application: Vec<ApplicationShare>,
    pub by_package: Vec<PackageShare>,
    pub unattributed: Option<UnattributedCost>,
}

impl CostAllocation {
    pub fn attributed_cost(&self) -> f64 {
        self.total_cost - self.unattributed.as_ref().map_or(0.0, |u| u.cost)
    }
}

/// Splits `usage` at `unit_cost` dollars per gallon across `applications`.
///
/// Shares are kept at full precision; rounding happens only in the report.
pub fn allocate(
    usage: &UsageRecord,
    unit_cost: f64,
    applications: &[ApplicationWork],
) -> Result<CostAllocation, TrueLevelError> {
    let total_cost = usage.gallons_consumed * unit_cost;

    let mut work_by_application = Vec::with_capacity(applications.len());
    for application in applications {
        work_by_application.push((application, compute_work(application)?));
    }
    let total_work: f64 = work_by_application
        .iter()
        .flat_map(|(_, units)| units.values())
        .sum();

    let mut allocation = CostAllocation {
        chemical_id: usage.chemical_id.clone(),
        site_id: usage.site_id.clone(),
        usage_start: usage.period_start,
        usage_end: usage.period_end,
        unit_cost,
        gallons_consumed: usage.gallons_consumed,
        total_cost,
        anomalous: usage.anomalous,
        by_application: Vec::new(),
        by_package: Vec::new(),
        unattributed: None,
    };

    if total_work <= 0.0 {
        warn!(
            chemical_id = %usage.chemical_id,
            site_id = %usage.site_id,
            total_cost,
            applications = applications.len(),
            "no work recorded for chemical (no application or no cars served); cost is unattributed"
        );
        allocation.unattributed = Some(UnattributedCost {
            cost: total_cost,
            gallons: usage.gallons_consumed,
        });
        return Ok(allocation);
    }
    debug!(chemical_id = %usage.chemical_id, total_work, total_cost, "allocating chemical cost");

    let mut packages: BTreeMap<String, PackageShare> = BTreeMap::new();
    for (application, units) in &work_by_application {
        let mut app_share = ApplicationShare {
            application_id: application.application_id.clone(),
            cost: 0.0,
            gallons: 0.0,
        };
        for (package_id, work) in units {
            let share_of_work = work / total_work;
            let cost = total_cost * share_of_work;
            let gallons = usage.gallons_consumed * share_of_work;
            app_share.cost += cost;
            app_share.gallons += gallons;

            let package = packages.entry(package_id.clone()).or_insert_with(|| PackageShare {
                package_id: package_id.clone(),
                cost: 0.0,
                gallons: 0.0,
                cars_served: application.cars_served(package_id),
                cost_per_car: None,
            });
            package.cost += cost;
            package.gallons += gallons;
        }
        allocation.by_application.push(app_share);
    }

    allocation.by_package = packages
        .into_values()
        .map(|mut package| {
            if package.cars_served > 0 {
                package.cost_per_car = Some(package.cost / package.cars_served as f64);
            }
            package
        })
        .collect();

    Ok(allocation)
}
