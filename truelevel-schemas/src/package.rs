use serde::{Deserialize, Serialize};

/// A wash package sold at a site (e.g., "Basic", "Deluxe", "Ultimate").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashPackage {
    pub package_id: String,
    pub package_name: String,
    pub site_id: String,
    pub price_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injector {
    pub injector_id: String,
    pub tip_id: Option<String>,
    /// Flow rate through the injector/tip combination.
    pub gpm: f64,
}

/// A chemical-to-tank application: one injector feeding one chemical to the
/// packages routed through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: String,
    pub site_id: String,
    pub chemical_id: String,
    pub injector: Injector,
    pub package_ids: Vec<String>,
}
