use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, info};
use truelevel_schemas::{
    car_count::CarCount,
    chemical::Chemical,
    container::ContainerProfile,
    file_formats::{
        ApplicationFile, ChemicalFile, ContainerProfileFile, PackageFile, SiteFile, VisitFile,
    },
    package::{Application, WashPackage},
    site::Site,
    visit::Visit,
};

/// All records loaded from the data directory: reference data keyed by id,
/// plus the visit and car-count history.
pub struct KnowledgeBase {
    pub chemicals: HashMap<String, Chemical>,
    pub container_profiles: HashMap<String, ContainerProfile>,
    pub sites: HashMap<String, Site>,
    pub packages: HashMap<String, WashPackage>,
    pub applications: HashMap<String, Application>,
    pub visits: Vec<Visit>,
    pub car_counts: Vec<CarCount>,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory. Missing subdirectories load empty.
    pub fn load<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref();
        info!("Loading knowledge base from {:?}", base_path);

        let chemicals = load_yaml_files_into_map(
            base_path.join("1_chemicals"),
            |file: ChemicalFile| file.chemicals,
            |item: &Chemical| item.chemical_id.clone(),
        )?;
        let container_profiles = load_yaml_files_into_map(
            base_path.join("2_container_profiles"),
            |file: ContainerProfileFile| file.container_profiles,
            |item: &ContainerProfile| item.profile_id.clone(),
        )?;
        let sites = load_yaml_files_into_map(
            base_path.join("3_sites"),
            |file: SiteFile| file.sites,
            |item: &Site| item.site_id.clone(),
        )?;
        let packages = load_yaml_files_into_map(
            base_path.join("4_packages"),
            |file: PackageFile| file.packages,
            |item: &WashPackage| item.package_id.clone(),
        )?;
        let applications = load_yaml_files_into_map(
            base_path.join("5_applications"),
            |file: ApplicationFile| file.applications,
            |item: &Application| item.application_id.clone(),
        )?;
        let visits = load_yaml_files(base_path.join("6_visits"), |file: VisitFile| file.visits)?;
        let car_counts = load_car_counts(base_path.join("7_car_counts"))?;

        info!(
            chemicals = chemicals.len(),
            sites = sites.len(),
            visits = visits.len(),
            car_counts = car_counts.len(),
            "Knowledge base loaded"
        );
        Ok(Self {
            chemicals,
            container_profiles,
            sites,
            packages,
            applications,
            visits,
            car_counts,
        })
    }

    pub fn site(&self, site_id: &str) -> Result<&Site> {
        self.sites
            .get(site_id)
            .with_context(|| format!("Site '{}' not found in knowledge base", site_id))
    }

    /// Values of an id-keyed map in id order, so runs are reproducible.
    pub fn sorted<T: Clone>(map: &HashMap<String, T>) -> Vec<T> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        keys.into_iter().map(|k| map[k].clone()).collect()
    }
}

/// Files with a given extension in `dir`, sorted by name. A missing directory yields none.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<std::path::PathBuf>> {
    if !dir.exists() {
        debug!("{:?} does not exist, skipping", dir);
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .map_or(false, |s| extensions.iter().any(|e| s == *e))
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Generic helper to load every YAML file in a directory and flatten the wrapped lists.
fn load_yaml_files<P, F, E, T>(dir_path: P, extract_vec: E) -> Result<Vec<T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., VisitFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
{
    let mut items = Vec::new();
    for path in files_with_extension(dir_path.as_ref(), &["yaml", "yml"])? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        items.extend(extract_vec(file_wrapper));
    }
    Ok(items)
}

/// Same as `load_yaml_files`, keyed by id. Later files win on duplicate ids.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>,
    E: Fn(F) -> Vec<T>,
    K: Fn(&T) -> String,
{
    Ok(load_yaml_files(dir_path, extract_vec)?
        .into_iter()
        .map(|item| (get_key(&item), item))
        .collect())
}

/// Loads point-of-sale car count exports (`site_id,package_id,period_start,period_end,cars`).
fn load_car_counts<P: AsRef<Path>>(dir_path: P) -> Result<Vec<CarCount>> {
    let mut counts = Vec::new();
    for path in files_with_extension(dir_path.as_ref(), &["csv"])? {
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        for record in reader.deserialize() {
            let count: CarCount =
                record.with_context(|| format!("Failed to parse car count row in {:?}", path))?;
            counts.push(count);
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_yaml_and_csv_and_tolerates_missing_dirs() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "1_chemicals/catalog.yaml",
            r#"
schema_version: "1"
chemicals:
  - chemical_id: CHEM-TRI
    chemical_name: Tri-Foam Blue
    category: tri_foam
    container_cost_usd: 210.0
    container_size_gallons: 55.0
"#,
        );
        write(
            tmp.path(),
            "3_sites/sites.yml",
            r#"
schema_version: "1"
sites:
  - site_id: SITE-1
    site_name: Main St
    tanks:
      - tank_id: T1
        chemical_id: CHEM-TRI
        capacity_gallons: 55.0
"#,
        );
        write(
            tmp.path(),
            "7_car_counts/june.csv",
            "site_id,package_id,period_start,period_end,cars\n\
             SITE-1,BASIC,2024-06-01T00:00:00Z,2024-06-30T00:00:00Z,812\n",
        );
        write(tmp.path(), "1_chemicals/README.txt", "ignored");

        let kb = KnowledgeBase::load(tmp.path()).unwrap();
        assert_eq!(kb.chemicals["CHEM-TRI"].container_size_gallons, 55.0);
        assert_eq!(kb.site("SITE-1").unwrap().tanks.len(), 1);
        assert!(kb.site("SITE-9").is_err());
        assert_eq!(kb.car_counts[0].cars, 812);
        assert!(kb.visits.is_empty());
        assert!(kb.applications.is_empty());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "5_applications/bad.yaml", "applications: [oops");
        let err = KnowledgeBase::load(tmp.path()).err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to parse YAML"));
    }
}
