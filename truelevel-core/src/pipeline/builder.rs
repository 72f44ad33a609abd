use crate::{
    allocation::allocate,
    conversion::ConversionTable,
    error::TrueLevelError,
    period::{car_counts_for_period, ReportPeriod},
    pricing::unit_cost,
    report::{build_report_from_outcomes, ChemicalOutcome, CostPerCarReport, ExcludedPeriod, PartialFailure},
    snapshot::snapshot_from_visit,
    usage::{combine_usage, derive_usage_series, ExclusionReason, UsageOutcome},
    work::ApplicationWork,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use truelevel_schemas::{
    car_count::CarCount,
    chemical::Chemical,
    container::ContainerProfile,
    package::Application,
    site::Site,
    visit::Visit,
};

/// A fluent builder for a site's cost-per-car report.
///
/// Collects already-loaded catalog, configuration and visit records, then runs
/// the usage and allocation pipeline once per chemical. A failure for one
/// chemical lands in the report's `partial_failures` and never stops the others.
#[derive(Default)]
pub struct CostReportBuilder {
    site: Option<Site>,
    period: Option<ReportPeriod>,
    chemicals: Vec<Chemical>,
    container_profiles: Vec<ContainerProfile>,
    applications: Vec<Application>,
    visits: Vec<Visit>,
    car_counts: Vec<CarCount>,
}

impl CostReportBuilder {
    /// Creates a new, empty `CostReportBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the site the report covers; its tanks link chemicals to container profiles.
    pub fn with_site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_period(mut self, period: ReportPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Sets the chemical catalog used for unit costs.
    pub fn with_chemicals(mut self, chemicals: Vec<Chemical>) -> Self {
        self.chemicals = chemicals;
        self
    }

    pub fn with_container_profiles(mut self, profiles: Vec<ContainerProfile>) -> Self {
        self.container_profiles = profiles;
        self
    }

    /// Sets the injector applications. Applications for other sites are ignored.
    pub fn with_applications(mut self, applications: Vec<Application>) -> Self {
        self.applications = applications;
        self
    }

    /// Sets the visit history. Visits before the period are needed as prior readings.
    pub fn with_visits(mut self, visits: Vec<Visit>) -> Self {
        self.visits = visits;
        self
    }

    pub fn with_car_counts(mut self, car_counts: Vec<CarCount>) -> Self {
        self.car_counts = car_counts;
        self
    }

    /// Consumes the builder and produces the report.
    ///
    /// # Errors
    ///
    /// Returns `IncompleteReportInput` if the site or period was not provided.
    /// Everything else is reported per chemical inside the report.
    pub fn build(self) -> Result<CostPerCarReport, TrueLevelError> {
        let site = self.site.as_ref().ok_or(TrueLevelError::IncompleteReportInput("site"))?;
        let period = self.period.ok_or(TrueLevelError::IncompleteReportInput("period"))?;

        let counts = car_counts_for_period(&self.car_counts, &site.site_id, &period);
        let cars = &counts.by_package;
        info!(
            site_id = %site.site_id,
            start = %period.start,
            end = %period.end,
            total_cars = cars.values().sum::<u64>(),
            skipped_car_counts = counts.skipped.len(),
            "building cost-per-car report"
        );

        let outcomes: Vec<ChemicalOutcome> = self
            .chemical_ids(site)
            .into_iter()
            .map(|chemical_id| {
                self.run_chemical(site, &period, cars, &chemical_id)
                    .unwrap_or_else(|e| {
                        warn!(chemical_id = %chemical_id, error = %e, "chemical skipped");
                        ChemicalOutcome::Failed(PartialFailure::from_error(&chemical_id, &e))
                    })
            })
            .collect();

        let mut report = build_report_from_outcomes(period, &outcomes, cars);
        report.skipped_car_counts = counts.skipped;
        Ok(report)
    }

    /// Every chemical the site stocks, applies or recorded, in id order.
    fn chemical_ids(&self, site: &Site) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = site.tanks.iter().map(|t| t.chemical_id.clone()).collect();
        ids.extend(
            self.applications
                .iter()
                .filter(|a| a.site_id == site.site_id)
                .map(|a| a.chemical_id.clone()),
        );
        ids.extend(
            self.visits
                .iter()
                .filter(|v| v.site_id == site.site_id)
                .flat_map(|v| v.entries.iter().map(|e| e.chemical_id.clone())),
        );
        ids
    }

    fn conversion_table(&self, site: &Site, chemical_id: &str) -> Result<Option<ConversionTable>, TrueLevelError> {
        let Some(profile_id) = site
            .tank_for(chemical_id)
            .and_then(|t| t.container_profile_id.as_deref())
        else {
            return Ok(None);
        };
        let profile = self
            .container_profiles
            .iter()
            .find(|p| p.profile_id == profile_id)
            .ok_or_else(|| TrueLevelError::ContainerProfileNotFound(profile_id.to_string()))?;
        ConversionTable::from_profile(profile).map(Some)
    }

    fn run_chemical(
        &self,
        site: &Site,
        period: &ReportPeriod,
        cars: &BTreeMap<String, u64>,
        chemical_id: &str,
    ) -> Result<ChemicalOutcome, TrueLevelError> {
        let chemical = self
            .chemicals
            .iter()
            .find(|c| c.chemical_id == chemical_id)
            .ok_or_else(|| TrueLevelError::ChemicalNotFound(chemical_id.to_string()))?;
        let unit_cost = unit_cost(chemical)?;
        let table = self.conversion_table(site, chemical_id)?;

        let snapshots = self
            .visits
            .iter()
            .filter(|v| v.site_id == site.site_id && v.visited_at <= period.end)
            .filter_map(|v| snapshot_from_visit(v, chemical_id, table.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut in_period = Vec::new();
        let mut first_reading = None;
        for outcome in derive_usage_series(&snapshots)? {
            match outcome {
                UsageOutcome::Derived(record) if period.contains(record.period_end) => {
                    in_period.push(record)
                }
                UsageOutcome::Excluded { at, reason, .. } if period.contains(at) => {
                    first_reading = Some((at, reason))
                }
                _ => {}
            }
        }

        let Some(usage) = combine_usage(&in_period) else {
            let (at, reason) = first_reading.unwrap_or((period.end, ExclusionReason::NoReadingInPeriod));
            warn!(chemical_id, site_id = %site.site_id, ?reason, "period excluded from allocation");
            return Ok(ChemicalOutcome::Excluded(ExcludedPeriod {
                chemical_id: chemical_id.to_string(),
                site_id: site.site_id.clone(),
                at,
                reason,
            }));
        };
        debug!(
            chemical_id,
            gallons_consumed = usage.gallons_consumed,
            intervals = in_period.len(),
            "usage derived for period"
        );
        if usage.period_start < period.start {
            warn!(
                chemical_id,
                site_id = %site.site_id,
                usage_start = %usage.period_start,
                period_start = %period.start,
                gallons_consumed = usage.gallons_consumed,
                "usage interval starts before the period; all of it is charged to the period"
            );
        }

        let applications: Vec<ApplicationWork> = self
            .applications
            .iter()
            .filter(|a| a.site_id == site.site_id && a.chemical_id == chemical_id)
            .map(|a| ApplicationWork::from_application(a, cars))
            .collect();

        allocate(&usage, unit_cost, &applications).map(ChemicalOutcome::Allocated)
    }
}

