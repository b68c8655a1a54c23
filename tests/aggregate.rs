use serde_json::json;

use jgi_portal_fetch::aggregate::{BYTES_PER_GB, DownloadItem, download_items, to_gigabytes, total_bytes};
use jgi_portal_fetch::domain::{ExtractOptions, TaxonOid};
use jgi_portal_fetch::extract::{ExtractedRecord, extract};
use jgi_portal_fetch::manifest::ManifestRow;

fn sample_record() -> ExtractedRecord {
    let doc = json!({"organisms": [{
        "top_hit": {"_id": "jamo"},
        "files": [
            {"file_name": "s.scaffolds.fasta", "_id": "asm", "file_size": BYTES_PER_GB},
            {
                "file_name": "r.fastq.gz", "_id": "reads", "file_size": 2 * BYTES_PER_GB,
                "metadata": {"portal": {"display_location": ["Raw Data"]}}
            },
            {"file_name": "b1.tar.gz", "_id": "bin1", "file_size": 100, "metadata": {"content_type": "Binning Data"}},
            {"file_name": "b2.tar.gz", "_id": "bin2", "file_size": 200, "metadata": {"content_type": "Binning Data"}}
        ]
    }]});
    extract(&doc, &ExtractOptions::default())
}

#[test]
fn total_sums_assembly_reads_and_bins() {
    let records = vec![sample_record(), ExtractedRecord::unavailable(), sample_record()];
    let total = total_bytes(&records);
    assert_eq!(total, 2 * (3 * BYTES_PER_GB + 300));
    assert!(to_gigabytes(total) > 6.0);
}

#[test]
fn download_items_follow_record_order() {
    let records = vec![sample_record()];
    let items = download_items(&records);
    assert_eq!(
        items,
        vec![
            DownloadItem::new("asm", BYTES_PER_GB),
            DownloadItem::new("reads", 2 * BYTES_PER_GB),
            DownloadItem::new("bin1", 100),
            DownloadItem::new("bin2", 200),
        ]
    );
}

#[test]
fn unavailable_record_contributes_nothing() {
    let records = vec![ExtractedRecord::unavailable()];
    assert_eq!(total_bytes(&records), 0);
    assert!(download_items(&records).is_empty());
}

#[test]
fn manifest_rows_agree_with_records() {
    let taxon: TaxonOid = "3300000001".parse().unwrap();
    let records = vec![sample_record()];
    let rows: Vec<ManifestRow> = records
        .iter()
        .map(|record| ManifestRow::from_record(&taxon, record))
        .collect();
    assert_eq!(total_bytes(&rows), total_bytes(&records));
    assert_eq!(download_items(&rows), download_items(&records));
}

#[test]
fn non_numeric_manifest_sizes_count_as_zero() {
    let taxon: TaxonOid = "1".parse().unwrap();
    let mut row = ManifestRow::from_record(&taxon, &sample_record());
    row.assembly_fasta_file_size = "N/A".to_string();
    row.bins_fasta_file_size = "100;lots".to_string();
    let rows = vec![row];
    assert_eq!(total_bytes(&rows), 2 * BYTES_PER_GB + 100);

    let ids: Vec<String> = download_items(&rows).into_iter().map(|item| item.id).collect();
    assert_eq!(ids, vec!["asm", "reads", "bin1"]);
}
