use crate::{error::TrueLevelError, report::CostPerCarReport};
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    period_start: String,
    period_end: String,
    chemical_id: &'a str,
    package_id: &'a str,
    gallons: f64,
    cost: f64,
    cars_served: Option<u64>,
    cost_per_car: Option<f64>,
    anomalous: bool,
}

/// Writes the whole report as pretty-printed JSON.
pub fn write_json<P: AsRef<Path>>(report: &CostPerCarReport, path: P) -> Result<(), TrueLevelError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(|e| TrueLevelError::FileIO(path.display().to_string(), e))
}

/// Writes a report's allocation lines as CSV, one row per chemical and package.
///
/// Unattributed cost gets its own row with the package column set to
/// `UNATTRIBUTED`, so column totals still match the report's chemical cost.
pub struct ReportCsvWriter {
    path: String,
    writer: Writer<fs::File>,
}

impl ReportCsvWriter {
    pub const UNATTRIBUTED: &'static str = "UNATTRIBUTED";

    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, TrueLevelError> {
        let path = path.as_ref().display().to_string();
        let writer = Writer::from_path(&path).map_err(|e| TrueLevelError::CsvError(path.clone(), e))?;
        Ok(Self { path, writer })
    }

    pub fn write_report(&mut self, report: &CostPerCarReport) -> Result<(), TrueLevelError> {
        let period_start = report.period.start.to_rfc3339();
        let period_end = report.period.end.to_rfc3339();

        for chemical in &report.by_chemical {
            for package in &chemical.by_package {
                self.write_row(ReportRow {
                    period_start: period_start.clone(),
                    period_end: period_end.clone(),
                    chemical_id: &chemical.chemical_id,
                    package_id: &package.package_id,
                    gallons: package.gallons,
                    cost: package.cost,
                    cars_served: Some(package.cars_served),
                    cost_per_car: package.cost_per_car,
                    anomalous: chemical.anomalous,
                })?;
            }
        }
        for line in &report.unattributed {
            let anomalous = report
                .anomalies
                .iter()
                .any(|a| a.chemical_id == line.chemical_id);
            self.write_row(ReportRow {
                period_start: period_start.clone(),
                period_end: period_end.clone(),
                chemical_id: &line.chemical_id,
                package_id: Self::UNATTRIBUTED,
                gallons: line.gallons,
                cost: line.cost,
                cars_served: None,
                cost_per_car: None,
                anomalous,
            })?;
        }

        self.writer
            .flush()
            .map_err(|e| TrueLevelError::FileIO(self.path.clone(), e))
    }

    fn write_row(&mut self, row: ReportRow<'_>) -> Result<(), TrueLevelError> {
        self.writer
            .serialize(row)
            .map_err(|e| TrueLevelError::CsvError(self.path.clone(), e))
    }
}
