use serde::{Deserialize, Serialize};

/// One calibration sample for a container shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionPoint {
    pub inches: f64,
    pub gallons: f64,
}

/// Reference data for a tank or drum shape and its calibrated depth-to-volume curve.
///
/// Capacity is recorded per tank on the site, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerProfile {
    pub profile_id: String,
    pub display_name: Option<String>,
    pub conversion_points: Vec<ConversionPoint>,
}
