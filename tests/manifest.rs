use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use serde_json::json;

use jgi_portal_fetch::domain::{ExtractOptions, ID_NOT_FOUND, TaxonOid, UNKNOWN};
use jgi_portal_fetch::error::PortalError;
use jgi_portal_fetch::extract::{ExtractedRecord, extract};
use jgi_portal_fetch::manifest::{
    ManifestRow, MetadataRow, read_manifest, read_taxon_oids, write_manifest, write_metadata,
};

fn temp_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
}

fn record_with_bins() -> ExtractedRecord {
    let doc = json!({"organisms": [{
        "agg_id": "agg",
        "top_hit": {"_id": "jamo-9", "metadata": {"sequencing_project": {"scientific_program_name": "Metagenome"}}},
        "files": [
            {"file_name": "a.tar.gz", "_id": "b1", "file_size": 5, "metadata": {"content_type": "Binning Data", "data_utilization_status": "Public"}},
            {"file_name": "b.tar.gz", "_id": "b2", "file_size": 6, "metadata": {
                "content_type": "Binning Data",
                "data_utilization_status": "Public",
                "gold_data": {"latitude": 37.87, "longitude": -122.27}
            }}
        ]
    }]});
    extract(&doc, &ExtractOptions::default())
}

#[test]
fn read_taxon_oids_skips_header_and_blank_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "taxa.tsv");
    std::fs::write(path.as_std_path(), "taxon_oid\tname\n3300000001\tsoil\n\n3300000002\tlake\n").unwrap();

    let taxa = read_taxon_oids(&path).unwrap();
    let values: Vec<&str> = taxa.iter().map(TaxonOid::as_str).collect();
    assert_eq!(values, vec!["3300000001", "3300000002"]);
}

#[test]
fn read_taxon_oids_skips_bad_keys_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "taxa.tsv");
    std::fs::write(
        path.as_std_path(),
        "taxon_oid\n3300000001\nGa0123456\n3300000002\n",
    )
    .unwrap();

    let taxa = read_taxon_oids(&path).unwrap();
    let values: Vec<&str> = taxa.iter().map(TaxonOid::as_str).collect();
    assert_eq!(values, vec!["3300000001", "3300000002"]);
}

#[test]
fn missing_input_is_a_table_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_taxon_oids(&temp_path(&dir, "absent.tsv")).unwrap_err();
    assert_matches!(err, PortalError::TableRead { .. });
}

#[test]
fn manifest_row_joins_bins_and_uses_sentinels() {
    let taxon: TaxonOid = "3300000003".parse().unwrap();
    let row = ManifestRow::from_record(&taxon, &record_with_bins());
    assert_eq!(row.jamo_id, "jamo-9");
    assert_eq!(row.assembly_fasta_filename, UNKNOWN);
    assert_eq!(row.raw_reads_file_size, UNKNOWN);
    assert_eq!(row.bins_fasta_filename, "a.tar.gz;b.tar.gz");
    assert_eq!(row.bins_fasta_file_size, "5;6");
    assert_eq!(row.bins_fasta_file_status, "Public;Public");

    let empty = ManifestRow::from_record(&taxon, &ExtractedRecord::unavailable());
    assert_eq!(empty.jamo_id, ID_NOT_FOUND);
    assert_eq!(empty.bins_fasta_file_id, UNKNOWN);
}

#[test]
fn metadata_row_carries_location_and_external_flag() {
    let taxon: TaxonOid = "3300000003".parse().unwrap();
    let row = MetadataRow::from_record(&taxon, &record_with_bins());
    assert_eq!(row.agg_id, "agg");
    assert_eq!(row.bin_count, "2");
    assert_eq!(row.latitude, "37.87");
    assert_eq!(row.longitude, "-122.27");
    assert_eq!(row.external, "yes");
    assert_eq!(row.kingdom, UNKNOWN);
}

#[test]
fn manifest_file_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = temp_path(&dir, "out/manifest.tsv");
    let metadata_path = temp_path(&dir, "out/metadata.tsv");
    let taxon: TaxonOid = "3300000004".parse().unwrap();
    let rows = vec![
        ManifestRow::from_record(&taxon, &record_with_bins()),
        ManifestRow::from_record(&taxon, &ExtractedRecord::unavailable()),
    ];

    write_manifest(&manifest_path, &rows).unwrap();
    write_metadata(
        &metadata_path,
        &[MetadataRow::from_record(&taxon, &record_with_bins())],
    )
    .unwrap();

    assert_eq!(read_manifest(&manifest_path).unwrap(), rows);

    let header = std::fs::read_to_string(metadata_path.as_std_path()).unwrap();
    let first_line = header.lines().next().unwrap();
    assert!(first_line.starts_with("taxon_oid\tJAMO id\tagg_id"));
    assert!(first_line.ends_with("Bin_count\tLatitude\tLongitude\tExternal"));
}
