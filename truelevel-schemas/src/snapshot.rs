use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded inventory measurement for a chemical at a site.
///
/// `total_on_hand_gallons` is always `tank_gallons + backstock_gallons`;
/// deliveries are informational and already folded into tank or backstock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub chemical_id: String,
    pub site_id: String,
    pub timestamp: DateTime<Utc>,
    pub tank_gallons: f64,
    pub backstock_gallons: f64,
    pub delivery_gallons: f64,
    pub total_on_hand_gallons: f64,
    /// Set when a depth reading fell outside the calibrated range.
    #[serde(default)]
    pub clamped: bool,
}
