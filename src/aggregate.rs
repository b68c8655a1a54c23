use serde::Serialize;

use crate::domain::UNKNOWN;
use crate::extract::ExtractedRecord;

pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;
pub const BYTES_PER_TB: u64 = BYTES_PER_GB * 1024;

/// One sized file as seen by the aggregator; `id` is `None` when the file
/// cannot be requested (missing identifier or unparseable size column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: Option<String>,
    pub size: u64,
}

/// An (identifier, size) pair handed to the batch packer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadItem {
    pub id: String,
    pub size: u64,
}

impl DownloadItem {
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

/// Anything that lists the files of one taxon in assembly, reads, bins order.
pub trait FileListing {
    fn file_entries(&self) -> Vec<FileEntry>;
}

impl FileListing for ExtractedRecord {
    fn file_entries(&self) -> Vec<FileEntry> {
        let singular = [&self.assembly, &self.raw_reads]
            .into_iter()
            .flatten()
            .map(|slot| FileEntry {
                id: requestable_id(&slot.id),
                size: slot.size,
            });
        let bins = self.bins.iter().map(|bin| FileEntry {
            id: requestable_id(&bin.id),
            size: bin.size,
        });
        singular.chain(bins).collect()
    }
}

pub fn total_bytes<'a, R>(records: impl IntoIterator<Item = &'a R>) -> u64
where
    R: FileListing + 'a,
{
    records
        .into_iter()
        .flat_map(|record| record.file_entries())
        .fold(0u64, |total, entry| total.saturating_add(entry.size))
}

pub fn to_gigabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB as f64
}

pub fn terabytes_to_bytes(terabytes: f64) -> u64 {
    if !terabytes.is_finite() || terabytes <= 0.0 {
        return 0;
    }
    (terabytes * BYTES_PER_TB as f64) as u64
}

/// Requestable files in record order, ready for [`crate::batch::pack`].
pub fn download_items<'a, R>(records: impl IntoIterator<Item = &'a R>) -> Vec<DownloadItem>
where
    R: FileListing + 'a,
{
    records
        .into_iter()
        .flat_map(|record| record.file_entries())
        .filter_map(|entry| entry.id.map(|id| DownloadItem { id, size: entry.size }))
        .collect()
}

/// Parses a size column; `None` unless the text is a plain non-negative integer.
pub fn parse_size(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

pub(crate) fn requestable_id(id: &str) -> Option<String> {
    let trimmed = id.trim();
    (!trimmed.is_empty() && trimmed != UNKNOWN).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_rejects_non_digits() {
        assert_eq!(parse_size("123"), Some(123));
        assert_eq!(parse_size(" 7 "), Some(7));
        assert_eq!(parse_size("-1"), None);
        assert_eq!(parse_size("1.5"), None);
        assert_eq!(parse_size("unknown"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn gigabytes_use_binary_units() {
        assert_eq!(to_gigabytes(BYTES_PER_GB * 3), 3.0);
        assert_eq!(terabytes_to_bytes(10.0), 10 * BYTES_PER_TB);
        assert_eq!(terabytes_to_bytes(-1.0), 0);
    }
}
