//! Chemical usage and GPM-weighted cost allocation for car-wash sites.
//!
//! Raw tank readings become gallons ([`conversion`]), consecutive snapshots
//! become usage ([`usage`]), injector flow times cars served weights the split
//! of that usage across wash packages ([`work`], [`allocation`]), and the
//! results roll up into a cost-per-car report ([`report`]).
//! [`pipeline::builder::CostReportBuilder`] runs the whole chain for a site.

pub mod allocation;
pub mod conversion;
pub mod error;
pub mod export;
pub mod period;
pub mod pipeline;
pub mod pricing;
pub mod report;
pub mod snapshot;
pub mod status;
pub mod usage;
pub mod work;
