use crate::config::KnowledgeBase;
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::info;
use truelevel_core::{
    conversion::{resolve_gallons, ConversionTable},
    export::{write_json, ReportCsvWriter},
    period::ReportPeriod,
    pipeline::{
        builder::CostReportBuilder,
        status_board::{tank_statuses, TankState},
    },
    report::{CostPerCarReport, OverallCostPerCar},
};
use truelevel_schemas::visit::TankReading;

/// Runs the cost-per-car pipeline for one site and writes `report.json` and `report.csv`.
pub fn run_report(kb: &KnowledgeBase, site_id: &str, period: ReportPeriod, output_dir: &Path) -> Result<CostPerCarReport> {
    println!("\n--- [Report] Cost per car for site {} ---", site_id);
    let site = kb.site(site_id)?;

    let report = CostReportBuilder::new()
        .with_site(site.clone())
        .with_period(period)
        .with_chemicals(KnowledgeBase::sorted(&kb.chemicals))
        .with_container_profiles(KnowledgeBase::sorted(&kb.container_profiles))
        .with_applications(KnowledgeBase::sorted(&kb.applications))
        .with_visits(kb.visits.clone())
        .with_car_counts(kb.car_counts.clone())
        .build()?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let json_path = output_dir.join("report.json");
    write_json(&report, &json_path)?;

    let csv_path = output_dir.join("report.csv");
    let mut writer = ReportCsvWriter::new(&csv_path)?;
    writer.write_report(&report)?;

    info!(output = ?output_dir, "report written");
    print_summary_report(kb, &report);
    Ok(report)
}

/// Prints the tank status board for one site.
pub fn run_status(kb: &KnowledgeBase, site_id: &str) -> Result<()> {
    let site = kb.site(site_id)?;
    let rows = tank_statuses(
        site,
        &kb.visits,
        &KnowledgeBase::sorted(&kb.chemicals),
        &KnowledgeBase::sorted(&kb.container_profiles),
    );

    println!("\n--- [Status] Tanks at {} ({}) ---", site.site_name, site.site_id);
    println!("| Tank | Chemical | Gallons | Capacity | Last Reading | Status |");
    println!("|------|----------|---------|----------|--------------|--------|");
    for row in rows {
        let gallons = row.tank_gallons.map_or("-".to_string(), |g| format!("{:.2}", g));
        let last = row
            .last_reading_at
            .map_or("-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let status = match &row.state {
            TankState::Classified { status } => format!("{:?}", status),
            TankState::NoReading => "No reading".to_string(),
            TankState::Failed { message, .. } => format!("Error: {}", message),
        };
        println!(
            "| {} | {} | {} | {:.1} | {} | {} |",
            row.tank_id, row.chemical_id, gallons, row.capacity_gallons, last, status
        );
    }
    Ok(())
}

/// Resolves a depth reading through a container profile.
pub fn run_convert(kb: &KnowledgeBase, profile_id: &str, inches: f64) -> Result<()> {
    let profile = kb
        .container_profiles
        .get(profile_id)
        .with_context(|| format!("Container profile '{}' not found", profile_id))?;
    let table = ConversionTable::from_profile(profile)?;
    let resolved = resolve_gallons(&table, &TankReading::inches(inches))?;

    match resolved.clamped {
        Some(side) => println!(
            "{:.2} in => {:.2} gal (clamped, {:?} calibrated range)",
            inches, resolved.gallons, side
        ),
        None => println!("{:.2} in => {:.2} gal", inches, resolved.gallons),
    }
    Ok(())
}

fn package_name<'a>(kb: &'a KnowledgeBase, package_id: &'a str) -> &'a str {
    kb.packages.get(package_id).map_or(package_id, |p| p.package_name.as_str())
}

fn chemical_name<'a>(kb: &'a KnowledgeBase, chemical_id: &'a str) -> &'a str {
    kb.chemicals.get(chemical_id).map_or(chemical_id, |c| c.chemical_name.as_str())
}

fn print_summary_report(kb: &KnowledgeBase, report: &CostPerCarReport) {
    println!("\n\n--- [Cost Per Car Summary] ---");
    println!("========================================");
    println!(
        "Period: {} to {}",
        report.period.start.format("%Y-%m-%d"),
        report.period.end.format("%Y-%m-%d")
    );
    println!("  - Total Cars:               {}", report.summary.total_cars);
    println!("  - Total Chemical Cost:      ${:.2} USD", report.summary.total_chemical_cost);
    println!("  - Attributed Cost:          ${:.2} USD", report.summary.attributed_cost);
    println!("  - Unattributed Cost:        ${:.2} USD", report.summary.unattributed_cost);
    match report.summary.overall_cost_per_car {
        OverallCostPerCar::Computed(value) => {
            println!("  - Overall Cost Per Car:     ${:.2} USD", value)
        }
        OverallCostPerCar::NoCarsRecorded => {
            println!("  - Overall Cost Per Car:     n/a (no cars recorded)")
        }
    }

    println!("\nBy Package:");
    for line in &report.by_package {
        let per_car = line.cost_per_car.map_or("n/a".to_string(), |c| format!("${:.2}", c));
        println!(
            "  - {:<20} {:>6} cars | ${:>9.2} | {:>8.2} gal | {} / car",
            package_name(kb, &line.package_id),
            line.cars_served,
            line.cost,
            line.gallons,
            per_car
        );
    }

    println!("\nBy Chemical:");
    for line in &report.by_chemical {
        println!(
            "  - {:<20} {:>8.2} gal @ ${:.2}/gal = ${:.2}{}",
            chemical_name(kb, &line.chemical_id),
            line.gallons_consumed,
            line.unit_cost,
            line.total_cost,
            if line.anomalous { "  [ANOMALY]" } else { "" }
        );
        if line.starts_before_period {
            println!(
                "      (usage measured from {}, before the period start)",
                line.usage_start.format("%Y-%m-%d")
            );
        }
        for package in &line.by_package {
            println!(
                "      {:<18} ${:>9.2} | {:>8.2} gal",
                package_name(kb, &package.package_id),
                package.cost,
                package.gallons
            );
        }
    }

    if report.has_warnings() {
        println!("\nWarnings:");
        for line in &report.unattributed {
            println!(
                "  - Unattributed: {} ${:.2} ({:.2} gal), no active application",
                chemical_name(kb, &line.chemical_id),
                line.cost,
                line.gallons
            );
        }
        for anomaly in &report.anomalies {
            println!(
                "  - Negative usage: {} {:.2} gal; check for an unrecorded delivery",
                chemical_name(kb, &anomaly.chemical_id),
                anomaly.gallons_consumed
            );
        }
        for excluded in &report.excluded {
            println!(
                "  - Excluded: {} ({:?})",
                chemical_name(kb, &excluded.chemical_id),
                excluded.reason
            );
        }
        for skipped in &report.skipped_car_counts {
            println!(
                "  - Car count not counted: {} {} cars ({} to {}) straddles the period",
                package_name(kb, &skipped.package_id),
                skipped.cars,
                skipped.period_start.format("%Y-%m-%d"),
                skipped.period_end.format("%Y-%m-%d")
            );
        }
        for failure in &report.partial_failures {
            println!(
                "  - Failed [{:?}]: {}: {}",
                failure.kind, failure.chemical_id, failure.message
            );
        }
    }
    println!("========================================");
}
