use chrono::{DateTime, TimeZone, Utc};
use truelevel_core::{
    error::ErrorKind,
    period::ReportPeriod,
    pipeline::builder::CostReportBuilder,
    report::OverallCostPerCar,
    usage::ExclusionReason,
};
use truelevel_schemas::{
    car_count::CarCount,
    chemical::{Chemical, ChemicalCategory},
    container::{ContainerProfile, ConversionPoint},
    package::{Application, Injector},
    site::{Site, Tank},
    visit::{ChemicalEntry, TankReading, Visit},
};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, d, 12, 0, 0).unwrap()
}

fn chemical(id: &str, cost: f64, size: f64) -> Chemical {
    Chemical {
        chemical_id: id.to_string(),
        chemical_name: id.to_string(),
        category: ChemicalCategory::TriFoam,
        supplier: None,
        container_cost_usd: cost,
        container_size_gallons: size,
        alert_threshold_gallons: None,
        notes: None,
    }
}

fn tank(chemical_id: &str, profile: Option<&str>) -> Tank {
    Tank {
        tank_id: format!("TANK-{chemical_id}"),
        chemical_id: chemical_id.to_string(),
        container_profile_id: profile.map(str::to_string),
        capacity_gallons: 55.0,
        alert_threshold_gallons: None,
    }
}

fn entry(chemical_id: &str, reading: TankReading, backstock: f64, delivery: f64) -> ChemicalEntry {
    ChemicalEntry {
        chemical_id: chemical_id.to_string(),
        tank_reading: reading,
        backstock_gallons: backstock,
        delivery_gallons: delivery,
    }
}

fn visit(d: u32, entries: Vec<ChemicalEntry>) -> Visit {
    Visit {
        visit_id: format!("V-{d}"),
        site_id: "SITE-1".to_string(),
        visited_at: day(d),
        technician: Some("sam".to_string()),
        entries,
    }
}

fn application(id: &str, chemical_id: &str, gpm: f64, packages: &[&str]) -> Application {
    Application {
        application_id: id.to_string(),
        site_id: "SITE-1".to_string(),
        chemical_id: chemical_id.to_string(),
        injector: Injector { injector_id: format!("INJ-{id}"), tip_id: None, gpm },
        package_ids: packages.iter().map(|p| p.to_string()).collect(),
    }
}

fn cars(package: &str, n: u64) -> CarCount {
    CarCount {
        site_id: "SITE-1".to_string(),
        package_id: package.to_string(),
        period_start: day(1),
        period_end: day(15),
        cars: n,
    }
}

fn builder() -> CostReportBuilder {
    CostReportBuilder::new()
        .with_site(Site {
            site_id: "SITE-1".to_string(),
            site_name: "Main St Express".to_string(),
            operator: None,
            tanks: vec![tank("CHEM-X", Some("DRUM")), tank("CHEM-NEW", None)],
        })
        .with_period(ReportPeriod::new(day(1), day(15)))
        .with_container_profiles(vec![ContainerProfile {
            profile_id: "DRUM".to_string(),
            display_name: None,
            conversion_points: vec![
                ConversionPoint { inches: 0.0, gallons: 0.0 },
                ConversionPoint { inches: 30.0, gallons: 60.0 },
            ],
        }])
        .with_car_counts(vec![cars("PKG-A", 100), cars("PKG-B", 50)])
}

#[test]
fn gpm_weighted_end_to_end() {
    // 25 in => 50 gal on hand; 10 in => 20 gal tank + 20 backstock, after a 20 gal delivery.
    let report = builder()
        .with_chemicals(vec![chemical("CHEM-X", 110.0, 55.0)])
        .with_applications(vec![
            application("A", "CHEM-X", 1.5, &["PKG-A"]),
            application("B", "CHEM-X", 1.0, &["PKG-B"]),
        ])
        .with_visits(vec![
            visit(1, vec![entry("CHEM-X", TankReading::inches(25.0), 0.0, 0.0)]),
            visit(15, vec![entry("CHEM-X", TankReading::inches(10.0), 20.0, 20.0)]),
        ])
        .build()
        .unwrap();

    let x = &report.by_chemical[0];
    assert_eq!(x.gallons_consumed, 30.0);
    assert_eq!(x.total_cost, 60.0);
    assert_eq!(x.by_application[0].cost, 45.0);
    assert_eq!(x.by_application[0].gallons, 22.5);
    assert_eq!(x.by_application[1].cost, 15.0);
    assert_eq!(x.by_application[1].gallons, 7.5);
    assert_eq!(x.by_package[0].cost_per_car, Some(0.45));
    assert_eq!(x.by_package[1].cost_per_car, Some(0.3));

    assert_eq!(report.summary.total_cars, 150);
    assert_eq!(report.summary.total_chemical_cost, 60.0);
    assert_eq!(report.summary.overall_cost_per_car, OverallCostPerCar::Computed(0.4));
    assert!(report.unattributed.is_empty());
    assert!(report.anomalies.is_empty());
}

#[test]
fn anomalies_exclusions_and_failures_do_not_abort_the_report() {
    let report = builder()
        .with_chemicals(vec![
            chemical("CHEM-X", 110.0, 55.0),
            chemical("CHEM-NEW", 50.0, 5.0),
            chemical("CHEM-BAD", 10.0, 0.0),
            chemical("CHEM-ORPHAN", 10.0, 5.0),
        ])
        .with_applications(vec![application("A", "CHEM-X", 1.0, &["PKG-A", "PKG-B"])])
        .with_visits(vec![
            visit(
                1,
                vec![
                    entry("CHEM-X", TankReading::gallons(20.0), 0.0, 0.0),
                    entry("CHEM-BAD", TankReading::gallons(4.0), 0.0, 0.0),
                    entry("CHEM-ORPHAN", TankReading::gallons(5.0), 0.0, 0.0),
                ],
            ),
            visit(
                15,
                vec![
                    entry("CHEM-X", TankReading::gallons(40.0), 0.0, 10.0),
                    entry("CHEM-NEW", TankReading::gallons(5.0), 0.0, 5.0),
                    entry("CHEM-BAD", TankReading::gallons(2.0), 0.0, 0.0),
                    entry("CHEM-ORPHAN", TankReading::gallons(3.0), 0.0, 0.0),
                ],
            ),
        ])
        .build()
        .unwrap();

    // 20 + 10 - 40 = -10 gal, raw and flagged.
    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].chemical_id, "CHEM-X");
    assert_eq!(report.anomalies[0].gallons_consumed, -10.0);

    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].chemical_id, "CHEM-NEW");
    assert_eq!(report.excluded[0].reason, ExclusionReason::NoPriorReading);

    assert_eq!(report.partial_failures.len(), 1);
    assert_eq!(report.partial_failures[0].chemical_id, "CHEM-BAD");
    assert_eq!(report.partial_failures[0].kind, ErrorKind::Configuration);

    // 2 gal of a $2/gal chemical with no applications.
    assert_eq!(report.unattributed.len(), 1);
    assert_eq!(report.unattributed[0].cost, 4.0);
    assert_eq!(report.summary.unattributed_cost, 4.0);
    assert_eq!(report.summary.total_chemical_cost, -20.0 + 4.0);
}

#[test]
fn missing_site_or_period_is_rejected() {
    let err = CostReportBuilder::new().build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn same_inputs_same_report() {
    let make = || {
        builder()
            .with_chemicals(vec![chemical("CHEM-X", 100.0, 30.0)])
            .with_applications(vec![application("A", "CHEM-X", 0.7, &["PKG-A", "PKG-B"])])
            .with_visits(vec![
                visit(1, vec![entry("CHEM-X", TankReading::inches(17.3), 3.0, 0.0)]),
                visit(8, vec![entry("CHEM-X", TankReading::inches(11.1), 3.0, 0.0)]),
                visit(15, vec![entry("CHEM-X", TankReading::inches(4.9), 0.0, 0.0)]),
            ])
            .build()
            .unwrap()
    };
    let first = serde_json::to_string(&make()).unwrap();
    let second = serde_json::to_string(&make()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn car_count_window_straddling_the_period_is_surfaced() {
    // A monthly point-of-sale export for a half-month report.
    let monthly = CarCount {
        period_start: Utc.with_ymd_and_hms(2024, 7, 31, 12, 0, 0).unwrap(),
        period_end: day(31),
        cars: 1000,
        ..cars("PKG-A", 0)
    };
    let report = builder()
        .with_car_counts(vec![monthly])
        .with_chemicals(vec![chemical("CHEM-X", 110.0, 55.0)])
        .with_applications(vec![application("A", "CHEM-X", 1.5, &["PKG-A"])])
        .with_visits(vec![
            visit(1, vec![entry("CHEM-X", TankReading::inches(25.0), 0.0, 0.0)]),
            visit(15, vec![entry("CHEM-X", TankReading::inches(10.0), 20.0, 20.0)]),
        ])
        .build()
        .unwrap();

    assert_eq!(report.summary.total_cars, 0);
    assert_eq!(report.summary.overall_cost_per_car, OverallCostPerCar::NoCarsRecorded);
    assert_eq!(report.summary.unattributed_cost, 60.0);
    assert_eq!(report.skipped_car_counts.len(), 1);
    assert_eq!(report.skipped_car_counts[0].package_id, "PKG-A");
    assert_eq!(report.skipped_car_counts[0].cars, 1000);
    assert!(report.has_warnings());

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["skipped_car_counts"][0]["cars"], 1000);
}

#[test]
fn usage_measured_from_before_the_period_is_flagged() {
    let report = builder()
        .with_period(ReportPeriod::new(day(5), day(15)))
        .with_chemicals(vec![chemical("CHEM-X", 110.0, 55.0)])
        .with_applications(vec![application("A", "CHEM-X", 1.0, &["PKG-A"])])
        .with_visits(vec![
            visit(1, vec![entry("CHEM-X", TankReading::gallons(40.0), 0.0, 0.0)]),
            visit(15, vec![entry("CHEM-X", TankReading::gallons(30.0), 0.0, 0.0)]),
        ])
        .build()
        .unwrap();

    let x = &report.by_chemical[0];
    // The whole day 1 to day 15 interval is charged to the period.
    assert_eq!(x.gallons_consumed, 10.0);
    assert_eq!(x.usage_start, day(1));
    assert_eq!(x.usage_end, day(15));
    assert!(x.starts_before_period);
}

#[test]
fn bad_visit_entry_becomes_an_input_failure() {
    let report = builder()
        .with_chemicals(vec![
            chemical("CHEM-X", 110.0, 55.0),
            chemical("CHEM-NEW", 50.0, 5.0),
            chemical("CHEM-Y", 20.0, 5.0),
        ])
        .with_visits(vec![
            visit(
                1,
                vec![
                    entry("CHEM-X", TankReading::inches(25.0), 0.0, 0.0),
                    entry("CHEM-Y", TankReading::gallons(10.0), 0.0, 0.0),
                ],
            ),
            visit(
                15,
                vec![
                    entry("CHEM-X", TankReading::inches(10.0), -5.0, 0.0),
                    entry("CHEM-Y", TankReading::gallons(6.0), 0.0, 0.0),
                ],
            ),
        ])
        .build()
        .unwrap();

    assert_eq!(report.partial_failures.len(), 1);
    let failure = &report.partial_failures[0];
    assert_eq!(failure.chemical_id, "CHEM-X");
    assert_eq!(failure.kind, ErrorKind::Input);
    assert!(failure.message.contains("backstock"));

    assert_eq!(report.by_chemical.len(), 1);
    assert_eq!(report.by_chemical[0].chemical_id, "CHEM-Y");
    assert_eq!(report.summary.total_chemical_cost, 16.0);
}
