use serde::{Deserialize, Serialize};

/// A chemical tank installed at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub tank_id: String,
    pub chemical_id: String,
    /// Container profile used to convert depth readings for this tank.
    pub container_profile_id: Option<String>,
    pub capacity_gallons: f64,
    /// Overrides the chemical's catalog threshold when present.
    pub alert_threshold_gallons: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
    pub site_name: String,
    pub operator: Option<String>,
    pub tanks: Vec<Tank>,
}

impl Site {
    pub fn tank_for(&self, chemical_id: &str) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.chemical_id == chemical_id)
    }
}
