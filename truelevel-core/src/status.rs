use crate::error::TrueLevelError;
use serde::Serialize;

/// Fraction of capacity above which a tank is considered healthy.
pub const NORMAL_FILL_RATIO: f64 = 0.50;
/// Fraction of capacity at or above which a tank is only low, not critical.
pub const LOW_STOCK_FILL_RATIO: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TankStatus {
    Normal,
    LowStock,
    Critical,
}

/// Classifies a tank level.
///
/// A positive custom alert threshold wins over the percentage fallback:
/// above twice the threshold is normal, above the threshold is low stock.
pub fn classify(
    current_gallons: f64,
    total_capacity: f64,
    alert_threshold_gallons: Option<f64>,
) -> Result<TankStatus, TrueLevelError> {
    if !(total_capacity.is_finite() && total_capacity > 0.0) {
        return Err(TrueLevelError::InvalidCapacity(total_capacity));
    }
    if !(current_gallons.is_finite() && current_gallons >= 0.0) {
        return Err(TrueLevelError::InvalidReading {
            context: "current tank level".to_string(),
            value: current_gallons,
        });
    }

    if let Some(threshold) = alert_threshold_gallons.filter(|t| *t > 0.0) {
        return Ok(if current_gallons > 2.0 * threshold {
            TankStatus::Normal
        } else if current_gallons > threshold {
            TankStatus::LowStock
        } else {
            TankStatus::Critical
        });
    }

    let fill = current_gallons / total_capacity;
    Ok(if fill > NORMAL_FILL_RATIO {
        TankStatus::Normal
    } else if fill >= LOW_STOCK_FILL_RATIO {
        TankStatus::LowStock
    } else {
        TankStatus::Critical
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_boundaries() {
        let t = Some(10.0);
        assert_eq!(classify(20.0001, 100.0, t).unwrap(), TankStatus::Normal);
        assert_eq!(classify(20.0, 100.0, t).unwrap(), TankStatus::LowStock);
        assert_eq!(classify(10.0001, 100.0, t).unwrap(), TankStatus::LowStock);
        assert_eq!(classify(10.0, 100.0, t).unwrap(), TankStatus::Critical);
        assert_eq!(classify(0.0, 100.0, t).unwrap(), TankStatus::Critical);
    }

    #[test]
    fn percentage_fallback() {
        assert_eq!(classify(51.0, 100.0, None).unwrap(), TankStatus::Normal);
        assert_eq!(classify(50.0, 100.0, None).unwrap(), TankStatus::LowStock);
        assert_eq!(classify(25.0, 100.0, None).unwrap(), TankStatus::LowStock);
        assert_eq!(classify(24.9, 100.0, None).unwrap(), TankStatus::Critical);
    }

    #[test]
    fn zero_threshold_falls_back_to_percentage() {
        assert_eq!(classify(60.0, 100.0, Some(0.0)).unwrap(), TankStatus::Normal);
        assert_eq!(classify(10.0, 100.0, Some(-3.0)).unwrap(), TankStatus::Critical);
    }

    #[test]
    fn rejects_bad_capacity_and_negative_level() {
        assert!(matches!(classify(10.0, 0.0, None), Err(TrueLevelError::InvalidCapacity(_))));
        assert!(matches!(classify(10.0, -5.0, Some(2.0)), Err(TrueLevelError::InvalidCapacity(_))));
        assert!(matches!(
            classify(-0.5, 100.0, None),
            Err(TrueLevelError::InvalidReading { .. })
        ));
        assert!(matches!(classify(10.0, f64::INFINITY, None), Err(TrueLevelError::InvalidCapacity(_))));
        assert!(matches!(
            classify(f64::NAN, 100.0, None),
            Err(TrueLevelError::InvalidReading { .. })
        ));
    }
}
