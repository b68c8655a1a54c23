use assert_matches::assert_matches;

use jgi_portal_fetch::aggregate::BYTES_PER_TB;
use jgi_portal_fetch::config::{
    Config, ConfigLoader, ConfigOverrides, DEFAULT_RESTORE_URL, DEFAULT_SEARCH_URL,
};
use jgi_portal_fetch::domain::{Category, RawReadsGate};
use jgi_portal_fetch::error::PortalError;

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jgi-fetch.json");
    std::fs::write(
        &path,
        r#"{
            "search_url": "http://localhost:9000/search/",
            "max_total_gb": 500,
            "max_batch_tb": 2,
            "send_mail": false,
            "raw_reads_gate": "any-location",
            "exclude": ["bins"]
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.endpoints.search_url, "http://localhost:9000/search/");
    assert_eq!(resolved.endpoints.restore_url, DEFAULT_RESTORE_URL);
    assert_eq!(resolved.thresholds.max_total_gb, 500.0);
    assert_eq!(resolved.thresholds.max_batch_bytes, 2 * BYTES_PER_TB);
    assert!(!resolved.send_mail);
    assert_eq!(resolved.extract.raw_reads_gate, RawReadsGate::AnyLocation);
    assert!(!resolved.extract.includes(Category::Bins));
    assert!(resolved.extract.includes(Category::Assembly));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, PortalError::ConfigRead(_));
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, PortalError::ConfigParse(_));
}

#[test]
fn non_positive_thresholds_are_rejected() {
    let config = Config {
        max_total_gb: Some(0.0),
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, PortalError::ConfigValue(_));

    let config = Config {
        max_batch_tb: Some(f64::NAN),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(PortalError::ConfigValue(_))
    );
}

#[test]
fn unknown_excluded_category_is_rejected() {
    let config = Config {
        exclude: vec!["proteins".to_string()],
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(PortalError::InvalidCategory(_))
    );
}

#[test]
fn command_line_overrides_win() {
    let resolved = ConfigLoader::resolve_config(Config::default())
        .unwrap()
        .apply(ConfigOverrides {
            max_total_gb: Some(1.5),
            max_batch_tb: Some(1.0),
            raw_reads_gate: Some(RawReadsGate::AnyLocation),
            exclude: vec![Category::RawReads],
            no_mail: true,
        })
        .unwrap();

    assert_eq!(resolved.endpoints.search_url, DEFAULT_SEARCH_URL);
    assert_eq!(resolved.thresholds.max_total_gb, 1.5);
    assert_eq!(resolved.thresholds.max_batch_bytes, BYTES_PER_TB);
    assert_eq!(resolved.extract.raw_reads_gate, RawReadsGate::AnyLocation);
    assert!(!resolved.extract.raw_reads);
    assert!(!resolved.send_mail);

    let err = ConfigLoader::resolve_config(Config::default())
        .unwrap()
        .apply(ConfigOverrides {
            max_batch_tb: Some(-1.0),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
    assert_matches!(err, PortalError::ConfigValue(_));
}

#[test]
fn unrecognised_config_keys_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jgi-fetch.json");
    std::fs::write(&path, r#"{"schema_version": 3, "max_total_gb": 42}"#).unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.thresholds.max_total_gb, 42.0);
    assert_eq!(resolved.endpoints.search_url, DEFAULT_SEARCH_URL);
}
