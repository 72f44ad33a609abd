use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad reference data: conversion tables, capacities, equipment rates, prices.
    Configuration,
    /// A single bad data point.
    Input,
    Io,
}

#[derive(Debug, Error)]
pub enum TrueLevelError {
    #[error("Invalid conversion table for profile '{profile_id}': {reason}")]
    InvalidConversionTable { profile_id: String, reason: String },

    #[error("Tank capacity must be positive and finite, got {0}")]
    InvalidCapacity(f64),

    #[error("Application '{application_id}' has an invalid flow rate {gpm} gpm; it must be positive and finite")]
    InvalidEquipmentRate { application_id: String, gpm: f64 },

    #[error("Chemical '{chemical_id}' has an invalid unit cost: {reason}")]
    InvalidUnitCost { chemical_id: String, reason: String },

    #[error("Chemical '{0}' not found in catalog")]
    ChemicalNotFound(String),

    #[error("Container profile '{0}' not found")]
    ContainerProfileNotFound(String),

    #[error("Report input is incomplete: {0} is missing")]
    IncompleteReportInput(&'static str),

    #[error("Invalid reading {value} for {context}")]
    InvalidReading { context: String, value: f64 },

    #[error(
        "Snapshots for chemical '{chemical_id}' at site '{site_id}' ({timestamp}) cannot be compared: {reason}"
    )]
    MismatchedSnapshots {
        chemical_id: String,
        site_id: String,
        timestamp: DateTime<Utc>,
        reason: String,
    },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to serialize report as JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl TrueLevelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConversionTable { .. }
            | Self::InvalidCapacity(_)
            | Self::InvalidEquipmentRate { .. }
            | Self::InvalidUnitCost { .. }
            | Self::ChemicalNotFound(_)
            | Self::ContainerProfileNotFound(_)
            | Self::IncompleteReportInput(_) => ErrorKind::Configuration,
            Self::InvalidReading { .. } | Self::MismatchedSnapshots { .. } => ErrorKind::Input,
            Self::FileIO(..) | Self::JsonParsing(_) | Self::CsvError(..) => ErrorKind::Io,
        }
    }
}
