//! Depth-to-volume conversion for tanks measured with a dipstick.

use crate::error::TrueLevelError;
use truelevel_schemas::{
    container::{ContainerProfile, ConversionPoint},
    visit::{ReadingMethod, TankReading},
};

/// A validated, immutable calibration curve for one container shape.
///
/// Points are strictly increasing in both inches and gallons, and there are
/// always at least two of them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionTable {
    profile_id: String,
    points: Vec<ConversionPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    BelowRange,
    AboveRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGallons {
    pub gallons: f64,
    pub clamped: Option<Clamp>,
}

impl ConversionTable {
    pub fn new(profile_id: &str, points: Vec<ConversionPoint>) -> Result<Self, TrueLevelError> {
        let invalid = |reason: String| TrueLevelError::InvalidConversionTable {
            profile_id: profile_id.to_string(),
            reason,
        };

        if points.len() < 2 {
            return Err(invalid(format!(
                "at least two calibration points are required, found {}",
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.inches.is_finite() || !p.gallons.is_finite()) {
            return Err(invalid(format!("non-finite calibration point {:?}", p)));
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].inches <= pair[0].inches || pair[1].gallons <= pair[0].gallons {
                return Err(invalid(format!(
                    "points {} and {} are not strictly increasing",
                    i,
                    i + 1
                )));
            }
        }

        Ok(Self {
            profile_id: profile_id.to_string(),
            points,
        })
    }

    pub fn from_profile(profile: &ContainerProfile) -> Result<Self, TrueLevelError> {
        Self::new(&profile.profile_id, profile.conversion_points.clone())
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn points(&self) -> &[ConversionPoint] {
        &self.points
    }

    /// Interpolates a depth in inches to gallons, clamping outside the calibrated range.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReading` for a NaN or infinite depth.
    pub fn gallons_at(&self, inches: f64) -> Result<ResolvedGallons, TrueLevelError> {
        if !inches.is_finite() {
            return Err(TrueLevelError::InvalidReading {
                context: format!("depth for container profile {}", self.profile_id),
                value: inches,
            });
        }
        // Construction guarantees at least two points.
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if inches < first.inches {
            return Ok(ResolvedGallons {
                gallons: first.gallons,
                clamped: Some(Clamp::BelowRange),
            });
        }
        if inches > last.inches {
            return Ok(ResolvedGallons {
                gallons: last.gallons,
                clamped: Some(Clamp::AboveRange),
            });
        }

        let upper_index = self
            .points
            .iter()
            .position(|p| p.inches >= inches)
            .unwrap_or(self.points.len() - 1);
        let upper = self.points[upper_index];
        if upper.inches == inches || upper_index == 0 {
            return Ok(ResolvedGallons {
                gallons: upper.gallons,
                clamped: None,
            });
        }
        let lower = self.points[upper_index - 1];

        let ratio = (inches - lower.inches) / (upper.inches - lower.inches);
        Ok(ResolvedGallons {
            gallons: (lower.gallons + ratio * (upper.gallons - lower.gallons)).min(upper.gallons),
            clamped: None,
        })
    }
}

/// Maps a raw tank reading to gallons. Gallon readings pass through unchanged.
pub fn resolve_gallons(table: &ConversionTable, reading: &TankReading) -> Result<ResolvedGallons, TrueLevelError> {
    match reading.method {
        ReadingMethod::Gallons if !reading.raw_value.is_finite() => Err(TrueLevelError::InvalidReading {
            context: "gallon reading".to_string(),
            value: reading.raw_value,
        }),
        ReadingMethod::Gallons => Ok(ResolvedGallons {
            gallons: reading.raw_value,
            clamped: None,
        }),
        ReadingMethod::Inches => table.gallons_at(reading.raw_value),
    }
}
