//! Cost-per-car report assembly.
//!
//! Allocations come in at full precision. Every dollar and gallon figure is
//! rounded to two decimals here and nowhere earlier.

use crate::{
    allocation::{ApplicationShare, CostAllocation, PackageShare},
    error::{ErrorKind, TrueLevelError},
    period::{ReportPeriod, SkippedCarCount},
    usage::ExclusionReason,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rounds to cents, half away from zero.
///
/// The small nudge keeps decimal halves like 1.005 from landing just below
/// the midpoint after binary scaling.
pub fn round_currency(value: f64) -> f64 {
    let scaled = value * 100.0;
    let nudged = scaled + scaled.signum() * 1e-9;
    nudged.round() / 100.0 + 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum OverallCostPerCar {
    Computed(f64),
    NoCarsRecorded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_cars: u64,
    /// Attributed plus unattributed cost.
    pub total_chemical_cost: f64,
    pub attributed_cost: f64,
    pub unattributed_cost: f64,
    pub overall_cost_per_car: OverallCostPerCar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageReportLine {
    pub package_id: String,
    pub cost: f64,
    pub gallons: f64,
    pub cars_served: u64,
    pub cost_per_car: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChemicalReportLine {
    pub chemical_id: String,
    pub usage_start: DateTime<Utc>,
    pub usage_end: DateTime<Utc>,
    /// The prior reading predates the period, so part of the charged usage
    /// may have happened before it.
    pub starts_before_period: bool,
    pub unit_cost: f64,
    pub gallons_consumed: f64,
    pub total_cost: f64,
    pub unattributed_cost: Option<f64>,
    pub anomalous: bool,
    pub by_application: Vec<ApplicationShare>,
    pub by_package: Vec<PackageShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnattributedLine {
    pub chemical_id: String,
    pub cost: f64,
    pub gallons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageAnomaly {
    pub chemical_id: String,
    pub site_id: String,
    pub gallons_consumed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedPeriod {
    pub chemical_id: String,
    pub site_id: String,
    pub at: DateTime<Utc>,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialFailure {
    pub chemical_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl PartialFailure {
    pub fn from_error(chemical_id: &str, error: &TrueLevelError) -> Self {
        Self {
            chemical_id: chemical_id.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// What the pipeline produced for one chemical in the period.
#[derive(Debug, Clone, PartialEq)]
pub enum ChemicalOutcome {
    Allocated(CostAllocation),
    Excluded(ExcludedPeriod),
    Failed(PartialFailure),
}

impl ChemicalOutcome {
    fn chemical_id(&self) -> &str {
        match self {
            Self::Allocated(a) => &a.chemical_id,
            Self::Excluded(e) => &e.chemical_id,
            Self::Failed(f) => &f.chemical_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostPerCarReport {
    pub period: ReportPeriod,
    pub summary: ReportSummary,
    pub by_package: Vec<PackageReportLine>,
    pub by_chemical: Vec<ChemicalReportLine>,
    pub unattributed: Vec<UnattributedLine>,
    pub anomalies: Vec<UsageAnomaly>,
    pub excluded: Vec<ExcludedPeriod>,
    pub partial_failures: Vec<PartialFailure>,
    /// Car count windows straddling the period, left out of `total_cars`.
    pub skipped_car_counts: Vec<SkippedCarCount>,
}

impl CostPerCarReport {
    pub fn has_warnings(&self) -> bool {
        !(self.unattributed.is_empty()
            && self.anomalies.is_empty()
            && self.excluded.is_empty()
            && self.partial_failures.is_empty()
            && self.skipped_car_counts.is_empty())
    }
}

pub fn build_report(
    period: ReportPeriod,
    allocations: &[CostAllocation],
    car_counts_by_package: &BTreeMap<String, u64>,
) -> CostPerCarReport {
    let outcomes: Vec<ChemicalOutcome> =
        allocations.iter().cloned().map(ChemicalOutcome::Allocated).collect();
    build_report_from_outcomes(period, &outcomes, car_counts_by_package)
}

/// Builds the report from per-chemical outcomes, keeping exclusions and
/// failures beside whatever computed successfully.
///
/// Outcomes are ordered by chemical id first, so input order never changes the output.
pub fn build_report_from_outcomes(
    period: ReportPeriod,
    outcomes: &[ChemicalOutcome],
    car_counts_by_package: &BTreeMap<String, u64>,
) -> CostPerCarReport {
    let mut ordered: Vec<&ChemicalOutcome> = outcomes.iter().collect();
    ordered.sort_by(|a, b| a.chemical_id().cmp(b.chemical_id()));

    let mut total_cost = 0.0;
    let mut attributed_cost = 0.0;
    let mut unattributed_cost = 0.0;
    let mut package_totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    let mut by_chemical = Vec::new();
    let mut unattributed = Vec::new();
    let mut anomalies = Vec::new();
    let mut excluded = Vec::new();
    let mut partial_failures = Vec::new();

    for outcome in ordered {
        let allocation = match outcome {
            ChemicalOutcome::Allocated(allocation) => allocation,
            ChemicalOutcome::Excluded(e) => {
                excluded.push(e.clone());
                continue;
            }
            ChemicalOutcome::Failed(f) => {
                partial_failures.push(f.clone());
                continue;
            }
        };

        total_cost += allocation.total_cost;
        attributed_cost += allocation.attributed_cost();
        for package in &allocation.by_package {
            let entry = package_totals.entry(package.package_id.as_str()).or_insert((0.0, 0.0));
            entry.0 += package.cost;
            entry.1 += package.gallons;
        }
        if let Some(u) = &allocation.unattributed {
            unattributed_cost += u.cost;
            unattributed.push(UnattributedLine {
                chemical_id: allocation.chemical_id.clone(),
                cost: round_currency(u.cost),
                gallons: round_currency(u.gallons),
            });
        }
        if allocation.anomalous {
            anomalies.push(UsageAnomaly {
                chemical_id: allocation.chemical_id.clone(),
                site_id: allocation.site_id.clone(),
                gallons_consumed: round_currency(allocation.gallons_consumed),
            });
        }
        by_chemical.push(chemical_line(allocation, &period));
    }

    let total_cars: u64 = car_counts_by_package.values().sum();
    let overall_cost_per_car = if total_cars > 0 {
        OverallCostPerCar::Computed(round_currency(total_cost / total_cars as f64))
    } else {
        OverallCostPerCar::NoCarsRecorded
    };

    let mut package_ids: Vec<&str> = package_totals.keys().copied().collect();
    package_ids.extend(car_counts_by_package.keys().map(String::as_str));
    package_ids.sort_unstable();
    package_ids.dedup();

    let by_package = package_ids
        .into_iter()
        .map(|package_id| {
            let (cost, gallons) = package_totals.get(package_id).copied().unwrap_or((0.0, 0.0));
            let cars_served = car_counts_by_package.get(package_id).copied().unwrap_or(0);
            PackageReportLine {
                package_id: package_id.to_string(),
                cost: round_currency(cost),
                gallons: round_currency(gallons),
                cars_served,
                cost_per_car: (cars_served > 0).then(|| round_currency(cost / cars_served as f64)),
            }
        })
        .collect();

    CostPerCarReport {
        period,
        summary: ReportSummary {
            total_cars,
            total_chemical_cost: round_currency(total_cost),
            attributed_cost: round_currency(attributed_cost),
            unattributed_cost: round_currency(unattributed_cost),
            overall_cost_per_car,
        },
        by_package,
        by_chemical,
        unattributed,
        anomalies,
        excluded,
        partial_failures,
        skipped_car_counts: Vec::new(),
    }
}

fn chemical_line(allocation: &CostAllocation, period: &ReportPeriod) -> ChemicalReportLine {
    ChemicalReportLine {
        chemical_id: allocation.chemical_id.clone(),
        usage_start: allocation.usage_start,
        usage_end: allocation.usage_end,
        starts_before_period: allocation.usage_start < period.start,
        unit_cost: round_currency(allocation.unit_cost),
        gallons_consumed: round_currency(allocation.gallons_consumed),
        total_cost: round_currency(allocation.total_cost),
        unattributed_cost: allocation.unattributed.as_ref().map(|u| round_currency(u.cost)),
        anomalous: allocation.anomalous,
        by_application: allocation
            .by_application
            .iter()
            .map(|a| ApplicationShare {
                application_id: a.application_id.clone(),
                cost: round_currency(a.cost),
                gallons: round_currency(a.gallons),
            })
            .collect(),
        by_package: allocation
            .by_package
            .iter()
            .map(|p| PackageShare {
                package_id: p.package_id.clone(),
                cost: round_currency(p.cost),
                gallons: round_currency(p.gallons),
                cars_served: p.cars_served,
                cost_per_car: p.cost_per_car.map(round_currency),
            })
            .collect(),
    }
}
