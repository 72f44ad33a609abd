use crate::error::TrueLevelError;
use serde::Serialize;
use std::collections::BTreeMap;
use truelevel_schemas::package::Application;

/// One injector application and the packages routed through it for a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationWork {
    pub application_id: String,
    pub package_ids: Vec<String>,
    pub gpm: f64,
    pub cars_served_by_package: BTreeMap<String, u64>,
}

impl ApplicationWork {
    /// Pairs a configured application with the period's car counts.
    pub fn from_application(application: &Application, cars_by_package: &BTreeMap<String, u64>) -> Self {
        let cars_served_by_package = application
            .package_ids
            .iter()
            .map(|id| (id.clone(), cars_by_package.get(id).copied().unwrap_or(0)))
            .collect();
        Self {
            application_id: application.application_id.clone(),
            package_ids: application.package_ids.clone(),
            gpm: application.injector.gpm,
            cars_served_by_package,
        }
    }

    pub fn cars_served(&self, package_id: &str) -> u64 {
        self.cars_served_by_package.get(package_id).copied().unwrap_or(0)
    }
}

/// Work units per package: flow rate times cars served.
///
/// Both factors matter, since package volume varies independently of the
/// injector's flow rate. Idle packages get zero work, not an error.
pub fn compute_work(application: &ApplicationWork) -> Result<BTreeMap<String, f64>, TrueLevelError> {
    if !(application.gpm.is_finite() && application.gpm > 0.0) {
        return Err(TrueLevelError::InvalidEquipmentRate {
            application_id: application.application_id.clone(),
            gpm: application.gpm,
        });
    }

    Ok(application
        .package_ids
        .iter()
        .map(|id| (id.clone(), application.gpm * application.cars_served(id) as f64))
        .collect())
}
