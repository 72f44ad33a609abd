use crate::error::TrueLevelError;
use truelevel_schemas::chemical::Chemical;

/// Dollars per gallon for a catalog chemical.
pub fn unit_cost(chemical: &Chemical) -> Result<f64, TrueLevelError> {
    let invalid = |reason: String| TrueLevelError::InvalidUnitCost {
        chemical_id: chemical.chemical_id.clone(),
        reason,
    };

    if !(chemical.container_size_gallons.is_finite() && chemical.container_size_gallons > 0.0) {
        return Err(invalid(format!(
            "container size must be positive and finite, got {} gal",
            chemical.container_size_gallons
        )));
    }
    if !(chemical.container_cost_usd.is_finite() && chemical.container_cost_usd >= 0.0) {
        return Err(invalid(format!(
            "container cost must be finite and not negative, got ${}",
            chemical.container_cost_usd
        )));
    }
    Ok(chemical.container_cost_usd / chemical.container_size_gallons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use truelevel_schemas::chemical::ChemicalCategory;

    fn chemical(cost: f64, size: f64) -> Chemical {
        Chemical {
            chemical_id: "CHEM-WAX".to_string(),
            chemical_name: "Hot Wax".to_string(),
            category: ChemicalCategory::Wax,
            supplier: None,
            container_cost_usd: cost,
            container_size_gallons: size,
            alert_threshold_gallons: None,
            notes: None,
        }
    }

    #[test]
    fn cost_per_gallon() {
        assert_eq!(unit_cost(&chemical(110.0, 55.0)).unwrap(), 2.0);
    }

    #[test]
    fn rejects_empty_container_and_negative_price() {
        assert!(matches!(
            unit_cost(&chemical(110.0, 0.0)),
            Err(TrueLevelError::InvalidUnitCost { .. })
        ));
        assert!(matches!(
            unit_cost(&chemical(-1.0, 5.0)),
            Err(TrueLevelError::InvalidUnitCost { .. })
        ));
        assert!(unit_cost(&chemical(f64::INFINITY, 5.0)).is_err());
        assert!(unit_cost(&chemical(110.0, f64::NAN)).is_err());
    }
}
