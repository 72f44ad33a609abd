use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cars sold for one package over a counting window, as exported from the
/// site's point-of-sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarCount {
    pub site_id: String,
    pub package_id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub cars: u64,
}
