use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

/// Placeholder for a record whose portal identifier could not be resolved.
pub const ID_NOT_FOUND: &str = "id not found";

/// Placeholder for any other field the portal did not populate.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonOid(String);

impl TaxonOid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonOid {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(PortalError::InvalidTaxonOid(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Assembly,
    RawReads,
    Bins,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Assembly => write!(f, "assembly"),
            Category::RawReads => write!(f, "raw-reads"),
            Category::Bins => write!(f, "bins"),
        }
    }
}

impl FromStr for Category {
    type Err = PortalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "assembly" | "assemblies" => Ok(Category::Assembly),
            "raw-reads" | "reads" => Ok(Category::RawReads),
            "bins" => Ok(Category::Bins),
            _ => Err(PortalError::InvalidCategory(value.to_string())),
        }
    }
}

/// Which raw-reads descriptors qualify beyond the `fastq.gz` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RawReadsGate {
    /// Any descriptor ending in `fastq.gz`.
    AnyLocation,
    /// Additionally require the "Raw Data" display location.
    #[default]
    RawDataOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub assemblies: bool,
    pub raw_reads: bool,
    pub bins: bool,
    pub raw_reads_gate: RawReadsGate,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            assemblies: true,
            raw_reads: true,
            bins: true,
            raw_reads_gate: RawReadsGate::default(),
        }
    }
}

impl ExtractOptions {
    pub fn without(mut self, category: Category) -> Self {
        match category {
            Category::Assembly => self.assemblies = false,
            Category::RawReads => self.raw_reads = false,
            Category::Bins => self.bins = false,
        }
        self
    }

    pub fn includes(&self, category: Category) -> bool {
        match category {
            Category::Assembly => self.assemblies,
            Category::RawReads => self.raw_reads,
            Category::Bins => self.bins,
        }
    }
}
