//! Tab-separated input and output files.
//!
//! The manifest holds one row of file descriptors per taxon and is what the
//! `submit` command reads back; the metadata table carries attribution and
//! geolocation for the same taxa.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::aggregate::{FileEntry, FileListing, parse_size, requestable_id};
use crate::domain::{TaxonOid, UNKNOWN};
use crate::error::PortalError;
use crate::extract::{ExtractedRecord, FileSlot};

const LIST_SEPARATOR: &str = ";";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub taxon_oid: String,
    pub jamo_id: String,
    pub assembly_fasta_filename: String,
    pub assembly_fasta_file_id: String,
    pub assembly_fasta_file_size: String,
    pub assembly_fasta_file_status: String,
    pub raw_reads_filename: String,
    pub raw_reads_file_id: String,
    pub raw_reads_file_size: String,
    pub raw_reads_file_status: String,
    pub bins_fasta_filename: String,
    pub bins_fasta_file_id: String,
    pub bins_fasta_file_size: String,
    pub bins_fasta_file_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub taxon_oid: String,
    #[serde(rename = "JAMO id")]
    pub jamo_id: String,
    pub agg_id: String,
    pub kingdom: String,
    pub label: String,
    pub country: String,
    pub institution: String,
    pub its_sp_id: String,
    pub its_ap_id: String,
    #[serde(rename = "PI_name")]
    pub pi_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    pub analysis_project_name: String,
    #[serde(rename = "Bin_count")]
    pub bin_count: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "External")]
    pub external: String,
}

impl ManifestRow {
    pub fn from_record(taxon: &TaxonOid, record: &ExtractedRecord) -> Self {
        let (assembly_name, assembly_id, assembly_size, assembly_status) =
            slot_columns(record.assembly.as_ref());
        let (reads_name, reads_id, reads_size, reads_status) =
            slot_columns(record.raw_reads.as_ref());
        Self {
            taxon_oid: taxon.as_str().to_string(),
            jamo_id: record.jamo_id.clone(),
            assembly_fasta_filename: assembly_name,
            assembly_fasta_file_id: assembly_id,
            assembly_fasta_file_size: assembly_size,
            assembly_fasta_file_status: assembly_status,
            raw_reads_filename: reads_name,
            raw_reads_file_id: reads_id,
            raw_reads_file_size: reads_size,
            raw_reads_file_status: reads_status,
            bins_fasta_filename: join_list(record.bin_names()),
            bins_fasta_file_id: join_list(record.bin_ids()),
            bins_fasta_file_size: join_list(record.bin_sizes()),
            bins_fasta_file_status: join_list(record.bin_statuses()),
        }
    }
}

impl MetadataRow {
    pub fn from_record(taxon: &TaxonOid, record: &ExtractedRecord) -> Self {
        let attribution = &record.attribution;
        Self {
            taxon_oid: taxon.as_str().to_string(),
            jamo_id: record.jamo_id.clone(),
            agg_id: attribution.agg_id.clone(),
            kingdom: attribution.kingdom.clone(),
            label: attribution.label.clone(),
            country: attribution.country.clone(),
            institution: attribution.institution.clone(),
            its_sp_id: attribution.its_sp_id.clone(),
            its_ap_id: attribution.its_ap_id.clone(),
            pi_name: attribution.pi_name.clone(),
            email: attribution.email.clone(),
            analysis_project_name: attribution.analysis_project_name.clone(),
            bin_count: record.bin_count().to_string(),
            latitude: record.latitude().to_string(),
            longitude: record.longitude().to_string(),
            external: if record.external { "yes" } else { "no" }.to_string(),
        }
    }
}

impl FileListing for ManifestRow {
    fn file_entries(&self) -> Vec<FileEntry> {
        let mut entries = vec![
            FileEntry {
                id: requestable_id(&self.assembly_fasta_file_id),
                size: parse_size(&self.assembly_fasta_file_size).unwrap_or(0),
            },
            FileEntry {
                id: requestable_id(&self.raw_reads_file_id),
                size: parse_size(&self.raw_reads_file_size).unwrap_or(0),
            },
        ];

        let ids = split_list(&self.bins_fasta_file_id);
        for (index, size) in split_list(&self.bins_fasta_file_size).iter().enumerate() {
            let size = parse_size(size);
            // A bin is only requestable when its size column parsed.
            let id = size.and(ids.get(index).and_then(|id| requestable_id(id)));
            entries.push(FileEntry {
                id,
                size: size.unwrap_or(0),
            });
        }
        entries
    }
}

/// Reads taxon oids from the first column of a tab-separated file with a header row.
/// Keys that are not taxon oids are logged and skipped.
pub fn read_taxon_oids(path: &Utf8Path) -> Result<Vec<TaxonOid>, PortalError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(path.as_std_path())
        .map_err(|err| table_read(path, err))?;

    let mut taxa = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| table_read(path, err))?;
        let Some(first) = row.get(0).map(str::trim).filter(|value| !value.is_empty()) else {
            continue;
        };
        match first.parse::<TaxonOid>() {
            Ok(taxon) => taxa.push(taxon),
            Err(err) => {
                tracing::warn!(input = %path, error = %err, "skipping unparseable taxon oid");
            }
        }
    }
    Ok(taxa)
}

pub fn write_manifest(path: &Utf8Path, rows: &[ManifestRow]) -> Result<(), PortalError> {
    write_rows(path, rows)
}

pub fn write_metadata(path: &Utf8Path, rows: &[MetadataRow]) -> Result<(), PortalError> {
    write_rows(path, rows)
}

pub fn read_manifest(path: &Utf8Path) -> Result<Vec<ManifestRow>, PortalError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path.as_std_path())
        .map_err(|err| table_read(path, err))?;
    reader
        .deserialize::<ManifestRow>()
        .map(|row| row.map_err(|err| table_read(path, err)))
        .collect()
}

fn write_rows<T: Serialize>(path: &Utf8Path, rows: &[T]) -> Result<(), PortalError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        std::fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PortalError::Filesystem(err.to_string()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path.as_std_path())
        .map_err(|err| table_write(path, err))?;
    for row in rows {
        writer.serialize(row).map_err(|err| table_write(path, err))?;
    }
    writer.flush().map_err(|err| table_write(path, err))?;
    Ok(())
}

fn slot_columns(slot: Option<&FileSlot>) -> (String, String, String, String) {
    match slot {
        Some(slot) => (
            slot.name.clone(),
            slot.id.clone(),
            slot.size.to_string(),
            slot.status.clone(),
        ),
        None => (
            UNKNOWN.to_string(),
            UNKNOWN.to_string(),
            UNKNOWN.to_string(),
            UNKNOWN.to_string(),
        ),
    }
}

fn join_list<T: ToString>(values: Vec<T>) -> String {
    if values.is_empty() {
        return UNKNOWN.to_string();
    }
    let values: Vec<String> = values.iter().map(ToString::to_string).collect();
    // The column cannot be split back apart if an entry holds the separator.
    if let Some(value) = values.iter().find(|value| value.contains(LIST_SEPARATOR)) {
        tracing::warn!(value = %value, "list entry contains ';' and will not read back intact");
    }
    values.join(LIST_SEPARATOR)
}

fn split_list(column: &str) -> Vec<&str> {
    let trimmed = column.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN {
        return Vec::new();
    }
    trimmed.split(LIST_SEPARATOR).collect()
}

fn table_read(path: &Utf8Path, err: impl ToString) -> PortalError {
    PortalError::TableRead {
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn table_write(path: &Utf8Path, err: impl ToString) -> PortalError {
    PortalError::TableWrite {
        path: path.to_string(),
        message: err.to_string(),
    }
}
