use crate::{
    chemical::Chemical, container::ContainerProfile, package::{Application, WashPackage},
    site::Site, visit::Visit,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChemicalFile {
    pub schema_version: String,
    pub chemicals: Vec<Chemical>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerProfileFile {
    pub schema_version: String,
    pub container_profiles: Vec<ContainerProfile>,
}

#[derive(Debug, Deserialize)]
pub struct SiteFile {
    pub schema_version: String,
    pub sites: Vec<Site>,
}

#[derive(Debug, Deserialize)]
pub struct PackageFile {
    pub schema_version: String,
    pub packages: Vec<WashPackage>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationFile {
    pub schema_version: String,
    pub applications: Vec<Application>,
}

#[derive(Debug, Deserialize)]
pub struct VisitFile {
    pub schema_version: String,
    pub visits: Vec<Visit>,
}
