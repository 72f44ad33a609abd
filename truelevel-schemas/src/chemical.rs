use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChemicalCategory {
    PreSoak,
    Detergent,
    TriFoam,
    Wax,
    Protectant,
    TireShine,
    DryingAgent,
    WheelCleaner,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub distributor: Option<String>,
    pub manufacturer: Option<String>,
    pub part_number: Option<String>,
}

/// A purchasable wash chemical as it appears in the distributor catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    /// A unique, machine-readable identifier (e.g., "CHEM-TRIFOAM-BLUE").
    pub chemical_id: String,
    pub chemical_name: String,
    pub category: ChemicalCategory,
    pub supplier: Option<Supplier>,
    /// Price paid for one purchased container (drum, tote, pail).
    pub container_cost_usd: f64,
    /// Volume of one purchased container, in gallons.
    pub container_size_gallons: f64,
    /// Catalog-wide low-stock threshold; a tank may override it.
    pub alert_threshold_gallons: Option<f64>,
    pub notes: Option<String>,
}
