//! Flattening of portal search documents into one record per taxon.
//!
//! A search document carries an `organisms` array; each organism has an
//! optional `top_hit` and a `files` array of descriptors. The portal fills
//! these structures inconsistently, so every read goes through [`lookup`] and
//! resolves to a sentinel rather than failing.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{ExtractOptions, ID_NOT_FOUND, RawReadsGate, UNKNOWN};

pub const ASSEMBLY_MARKER: &str = "scaffolds.fasta";
pub const RAW_READS_SUFFIX: &str = "fastq.gz";
pub const RAW_DATA_LOCATION: &str = "Raw Data";
pub const BINS_CONTENT_TYPE: &str = "Binning Data";
pub const BINS_SUFFIX: &str = ".tar.gz";
pub const METAGENOME_PROGRAM: &str = "metagenome";

/// A singular file category (assembly or raw reads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSlot {
    pub name: String,
    pub id: String,
    pub size: u64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinFile {
    pub name: String,
    pub id: String,
    pub size: u64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributionBlock {
    pub agg_id: String,
    pub kingdom: String,
    pub label: String,
    pub country: String,
    pub institution: String,
    pub its_sp_id: String,
    pub its_ap_id: String,
    pub pi_name: String,
    pub email: String,
    pub analysis_project_name: String,
}

impl Default for AttributionBlock {
    fn default() -> Self {
        Self {
            agg_id: UNKNOWN.to_string(),
            kingdom: UNKNOWN.to_string(),
            label: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            institution: UNKNOWN.to_string(),
            its_sp_id: UNKNOWN.to_string(),
            its_ap_id: UNKNOWN.to_string(),
            pi_name: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            analysis_project_name: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub jamo_id: String,
    pub assembly: Option<FileSlot>,
    pub raw_reads: Option<FileSlot>,
    pub bins: Vec<BinFile>,
    pub external: bool,
    pub location: Option<Coordinates>,
    pub attribution: AttributionBlock,
}

impl ExtractedRecord {
    /// The record used when no document could be fetched for a taxon.
    pub fn unavailable() -> Self {
        Accumulator::default().finish(AttributionBlock::default())
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bin_names(&self) -> Vec<&str> {
        self.bins.iter().map(|bin| bin.name.as_str()).collect()
    }

    pub fn bin_ids(&self) -> Vec<&str> {
        self.bins.iter().map(|bin| bin.id.as_str()).collect()
    }

    pub fn bin_sizes(&self) -> Vec<u64> {
        self.bins.iter().map(|bin| bin.size).collect()
    }

    pub fn bin_statuses(&self) -> Vec<&str> {
        self.bins.iter().map(|bin| bin.status.as_str()).collect()
    }

    pub fn latitude(&self) -> &str {
        self.location
            .as_ref()
            .map(|coords| coords.latitude.as_str())
            .unwrap_or(UNKNOWN)
    }

    pub fn longitude(&self) -> &str {
        self.location
            .as_ref()
            .map(|coords| coords.longitude.as_str())
            .unwrap_or(UNKNOWN)
    }
}

/// Running state of a single pass over a document's descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    pub jamo_id: Option<String>,
    pub assembly: Option<FileSlot>,
    pub raw_reads: Option<FileSlot>,
    pub bins: Vec<BinFile>,
    pub external: bool,
    pub location: Option<Coordinates>,
}

impl Accumulator {
    /// Folds an organism's `top_hit` into the identifier and external flag.
    pub fn apply_top_hit(mut self, top_hit: Option<&Value>) -> Self {
        let Some(top_hit) = top_hit.filter(|hit| is_populated(hit)) else {
            return self;
        };
        self.jamo_id = text_at(top_hit, &["_id"]);
        let program = text_at(
            top_hit,
            &["metadata", "sequencing_project", "scientific_program_name"],
        );
        if program.is_some_and(|name| name.eq_ignore_ascii_case(METAGENOME_PROGRAM)) {
            self.external = true;
        }
        self
    }

    /// Folds one file descriptor into the category fields and location.
    pub fn apply_descriptor(mut self, descriptor: &Value, options: &ExtractOptions) -> Self {
        let file = DescriptorView::read(descriptor);

        if options.assemblies && file.is_assembly() {
            self.assembly = Some(file.overwrite(self.assembly.take()));
        }
        if options.raw_reads && file.is_raw_reads(options.raw_reads_gate) {
            self.raw_reads = Some(file.overwrite(self.raw_reads.take()));
        }
        if options.bins && file.is_bin() {
            self.bins.push(BinFile {
                name: file.name.clone(),
                id: file.id.clone(),
                size: file.size,
                status: file.status.clone(),
            });
        }
        if let Some(coords) = resolve_location(descriptor) {
            self.location = Some(coords);
        }
        self
    }

    pub fn finish(self, attribution: AttributionBlock) -> ExtractedRecord {
        ExtractedRecord {
            jamo_id: self.jamo_id.unwrap_or_else(|| ID_NOT_FOUND.to_string()),
            assembly: self.assembly,
            raw_reads: self.raw_reads,
            bins: self.bins,
            external: self.external,
            location: self.location,
            attribution,
        }
    }
}

pub fn extract(document: &Value, options: &ExtractOptions) -> ExtractedRecord {
    let organisms = array_at(document, &["organisms"]);
    let accumulator = organisms
        .iter()
        .fold(Accumulator::default(), |acc, organism| {
            let acc = acc.apply_top_hit(organism.get("top_hit"));
            array_at(organism, &["files"])
                .iter()
                .fold(acc, |acc, descriptor| acc.apply_descriptor(descriptor, options))
        });
    accumulator.finish(extract_attribution(organisms.first()))
}

/// Attribution comes from the first organism only; each field falls back on its own.
pub fn extract_attribution(first_organism: Option<&Value>) -> AttributionBlock {
    let Some(organism) = first_organism else {
        return AttributionBlock::default();
    };
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());
    let pi_field = |key: &str| text_at(organism, &["top_hit", "metadata", "proposal", "pi", key]);
    let its_sp_id = lookup(
        organism,
        &["top_hit", "metadata", "analysis_project", "sequencing_projects"],
    )
    .and_then(Value::as_array)
    .and_then(|projects| projects.first())
    .and_then(|project| text_at(project, &["sequencing_project_id"]));

    AttributionBlock {
        agg_id: or_unknown(text_at(organism, &["agg_id"])),
        kingdom: or_unknown(text_at(organism, &["kingdom"])),
        label: or_unknown(text_at(organism, &["label"])),
        country: or_unknown(pi_field("country")),
        institution: or_unknown(pi_field("institution")),
        its_sp_id: or_unknown(its_sp_id),
        its_ap_id: or_unknown(text_at(
            organism,
            &["top_hit", "metadata", "analysis_project_id"],
        )),
        pi_name: or_unknown(full_name(
            pi_field("first_name"),
            pi_field("middle_name"),
            pi_field("last_name"),
        )),
        email: or_unknown(pi_field("email_address")),
        analysis_project_name: or_unknown(text_at(
            organism,
            &["top_hit", "metadata", "analysis_project", "analysis_project_name"],
        )),
    }
}

/// Coordinates for one descriptor: `gold_data` wins over `sow_segment`.
pub fn resolve_location(descriptor: &Value) -> Option<Coordinates> {
    let sow_segment = coordinates_at(
        descriptor,
        &["metadata", "sow_segment"],
        "latitude_of_sample_collection",
        "longitude_of_sample_collection",
    );
    let gold_data = coordinates_at(
        descriptor,
        &["metadata", "gold_data"],
        "latitude",
        "longitude",
    );
    gold_data.or(sow_segment)
}

/// Walks `path` through nested objects, yielding `None` at the first gap.
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .filter(|found| !found.is_null())
}

fn array_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    lookup(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn coordinates_at(
    descriptor: &Value,
    path: &[&str],
    latitude_key: &str,
    longitude_key: &str,
) -> Option<Coordinates> {
    let section = lookup(descriptor, path)?;
    let latitude = section.get(latitude_key).and_then(scalar_text)?;
    let longitude = section.get(longitude_key).and_then(scalar_text)?;
    Some(Coordinates {
        latitude,
        longitude,
    })
}

fn full_name(first: Option<String>, middle: Option<String>, last: Option<String>) -> Option<String> {
    let parts = [first, middle, last]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Sizes arrive as integers, floats or numeric strings; anything else is 0.
pub fn size_value(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|size| size.is_finite() && *size > 0.0)
                    .map(|size| size as u64)
            })
            .unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

struct DescriptorView<'a> {
    name: String,
    id: String,
    size: u64,
    status: String,
    content_type: Option<String>,
    display_locations: Vec<&'a str>,
}

impl<'a> DescriptorView<'a> {
    fn read(descriptor: &'a Value) -> Self {
        let display_locations = lookup(descriptor, &["metadata", "portal", "display_location"])
            .and_then(Value::as_array)
            .map(|locations| locations.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        Self {
            name: text_at(descriptor, &["file_name"]).unwrap_or_default(),
            id: text_at(descriptor, &["_id"]).unwrap_or_else(|| UNKNOWN.to_string()),
            size: size_value(lookup(descriptor, &["file_size"])),
            status: text_at(descriptor, &["metadata", "data_utilization_status"])
                .unwrap_or_else(|| UNKNOWN.to_string()),
            content_type: text_at(descriptor, &["metadata", "content_type"]),
            display_locations,
        }
    }

    fn is_assembly(&self) -> bool {
        self.name.contains(ASSEMBLY_MARKER)
    }

    fn is_raw_reads(&self, gate: RawReadsGate) -> bool {
        if !self.name.ends_with(RAW_READS_SUFFIX) {
            return false;
        }
        match gate {
            RawReadsGate::AnyLocation => true,
            RawReadsGate::RawDataOnly => self.display_locations.contains(&RAW_DATA_LOCATION),
        }
    }

    fn is_bin(&self) -> bool {
        self.content_type.as_deref() == Some(BINS_CONTENT_TYPE) && self.name.ends_with(BINS_SUFFIX)
    }

    /// Replaces a slot, keeping the earlier size unless this one is positive.
    fn overwrite(&self, previous: Option<FileSlot>) -> FileSlot {
        let size = if self.size > 0 {
            self.size
        } else {
            previous.map(|slot| slot.size).unwrap_or(0)
        };
        FileSlot {
            name: self.name.clone(),
            id: self.id.clone(),
            size,
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_stops_at_missing_or_null() {
        let value = json!({"a": {"b": {"c": 1}}, "n": null, "s": "text"});
        assert_eq!(lookup(&value, &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(&value, &["a", "x", "c"]), None);
        assert_eq!(lookup(&value, &["n"]), None);
        assert_eq!(lookup(&value, &["s", "deeper"]), None);
    }

    #[test]
    fn size_value_tolerates_odd_shapes() {
        assert_eq!(size_value(Some(&json!(42))), 42);
        assert_eq!(size_value(Some(&json!(42.9))), 42);
        assert_eq!(size_value(Some(&json!("1024"))), 1024);
        assert_eq!(size_value(Some(&json!(-5))), 0);
        assert_eq!(size_value(Some(&json!("big"))), 0);
        assert_eq!(size_value(Some(&json!([1]))), 0);
        assert_eq!(size_value(None), 0);
    }

    #[test]
    fn full_name_skips_missing_middle() {
        assert_eq!(
            full_name(Some("Ada".into()), None, Some("Lovelace".into())),
            Some("Ada Lovelace".to_string())
        );
        assert_eq!(
            full_name(Some("Ada".into()), Some("K".into()), Some("Lovelace".into())),
            Some("Ada K Lovelace".to_string())
        );
        assert_eq!(full_name(None, None, Some("Lovelace".into())), Some("Lovelace".to_string()));
        assert_eq!(full_name(None, None, None), None);
    }

    #[test]
    fn empty_top_hit_is_ignored() {
        let acc = Accumulator {
            jamo_id: Some("keep".to_string()),
            ..Accumulator::default()
        };
        let acc = acc.apply_top_hit(Some(&json!({})));
        assert_eq!(acc.jamo_id.as_deref(), Some("keep"));
    }
}
