use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMethod {
    Gallons,
    Inches,
}

/// A single operator-entered tank measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankReading {
    pub method: ReadingMethod,
    pub raw_value: f64,
}

impl TankReading {
    pub fn gallons(raw_value: f64) -> Self {
        Self { method: ReadingMethod::Gallons, raw_value }
    }

    pub fn inches(raw_value: f64) -> Self {
        Self { method: ReadingMethod::Inches, raw_value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalEntry {
    pub chemical_id: String,
    pub tank_reading: TankReading,
    #[serde(default)]
    pub backstock_gallons: f64,
    #[serde(default)]
    pub delivery_gallons: f64,
}

/// A distributor's service visit to a site, with one entry per chemical checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub visit_id: String,
    pub site_id: String,
    pub visited_at: DateTime<Utc>,
    pub technician: Option<String>,
    pub entries: Vec<ChemicalEntry>,
}
