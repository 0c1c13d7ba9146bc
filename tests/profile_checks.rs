use argo_consistency::{check_file, CheckContext, FileKind, MemorySource};

const FILL: f64 = 99999.0;

/// Two profiles of three levels: the first real time, the second delayed
/// mode. TEMP carries a second sensor read per level.
fn core_profile() -> MemorySource {
    MemorySource::new()
        .with_dimension("N_PROF", 2)
        .with_dimension("N_LEVELS", 3)
        .with_char_series("DATA_MODE", b"RD")
        .with_numeric("PRES", &[2, 3], vec![5.0, 10.0, 15.0, 5.0, 10.0, FILL], FILL)
        .with_chars("PRES_QC", &[2, 3], b"111119")
        .with_numeric("PRES_ADJUSTED", &[2, 3], vec![FILL, FILL, FILL, 5.1, 10.1, FILL], FILL)
        .with_chars("PRES_ADJUSTED_QC", &[2, 3], b"   119")
        .with_numeric("PRES_ADJUSTED_ERROR", &[2, 3], vec![FILL, FILL, FILL, 2.4, 2.4, FILL], FILL)
        .with_char_series("PROFILE_PRES_QC", b"AA")
        .with_numeric(
            "TEMP",
            &[2, 3, 2],
            vec![12.0, FILL, FILL, 11.0, FILL, FILL, 12.0, 12.1, 11.0, FILL, 10.0, FILL],
            FILL,
        )
        .with_chars("TEMP_QC", &[2, 3], b"119114")
        .with_numeric("TEMP_ADJUSTED", &[2, 3], vec![FILL, FILL, FILL, 12.01, 11.01, FILL], FILL)
        .with_chars("TEMP_ADJUSTED_QC", &[2, 3], b"999114")
        .with_numeric("TEMP_ADJUSTED_ERROR", &[2, 3], vec![FILL, FILL, FILL, 0.002, 0.002, FILL], FILL)
        .with_char_series("PROFILE_TEMP_QC", b"AC")
}

fn check(src: &MemorySource) -> argo_consistency::ValidationReport {
    check_file(src, FileKind::Profile, &CheckContext::argo())
}

#[test]
fn test_consistent_profile_passes() {
    let report = check(&core_profile());
    assert!(report.is_ok(), "{:?}", report);
    assert!(report.warnings().is_empty(), "{:?}", report);
}

#[test]
fn test_realtime_adjusted_value_is_one_error() {
    let src = core_profile().with_numeric(
        "PRES_ADJUSTED",
        &[2, 3],
        vec![5.1, FILL, FILL, 5.1, 10.1, FILL],
        FILL,
    );
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &["PRES_ADJUSTED: not missing in DATA_MODE 'R': 1 levels; first 1 indices (0,0)".to_owned()]
    );
    assert_eq!(
        report.warnings(),
        &["PROFILE_PRES_QC: not compared with the level QC flags because PRES is inconsistent".to_owned()]
    );
}

#[test]
fn test_nan_sensor_read_dominates() {
    let src = core_profile().with_numeric(
        "TEMP",
        &[2, 3, 2],
        vec![f64::NAN, 12.0, FILL, 11.0, FILL, FILL, 12.0, 12.1, 11.0, FILL, 10.0, FILL],
        FILL,
    );
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &[
            "TEMP: missing data but TEMP_QC not missing: 1 levels; first 1 indices (0,0)".to_owned(),
            "TEMP: NaN values: 1 levels; first 1 indices (0,0)".to_owned(),
        ]
    );
    assert_eq!(report.warnings().len(), 2, "{:?}", report);
    assert!(report.warnings()[0].starts_with("TEMP: TEMP_ADJUSTED/"));
    assert!(report.warnings()[1].starts_with("PROFILE_TEMP_QC: not compared"));
}

#[test]
fn test_aggregate_from_adjusted_qc_in_delayed_mode() {
    // Raw QC of profile 1 is all good, but its adjusted QC still rules.
    let src = core_profile()
        .with_chars("TEMP_QC", &[2, 3], b"119111")
        .with_char_series("PROFILE_TEMP_QC", b"AA");
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &["PROFILE_TEMP_QC: does not match the level QC flags of TEMP: 1 profiles; first 1 indices 1".to_owned()]
    );
}

#[test]
fn test_per_parameter_mode_overrides_data_mode() {
    let src = core_profile()
        .with_chars("STATION_PARAMETERS", &[2, 2, 4], b"PRESTEMPPRESTEMP")
        .with_chars("PARAMETER_DATA_MODE", &[2, 2], b"RRDR");
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &[
            "TEMP_ADJUSTED: not missing in DATA_MODE 'R': 2 levels; first 2 indices (1,0), (1,1)".to_owned(),
            "TEMP_ADJUSTED_QC: not missing in DATA_MODE 'R': 3 levels; first 3 indices (1,0), (1,1), (1,2)".to_owned(),
            "TEMP_ADJUSTED_ERROR: not missing in DATA_MODE 'R': 2 levels; first 2 indices (1,0), (1,1)".to_owned(),
        ]
    );
}

#[test]
fn test_deprecated_parameter_warns() {
    let src = core_profile()
        .with_numeric("BISULFIDE", &[2, 3], vec![FILL; 6], FILL)
        .with_chars("BISULFIDE_QC", &[2, 3], b"999999")
        .with_numeric("BISULFIDE_ADJUSTED", &[2, 3], vec![FILL; 6], FILL)
        .with_chars("BISULFIDE_ADJUSTED_QC", &[2, 3], b"999999")
        .with_numeric("BISULFIDE_ADJUSTED_ERROR", &[2, 3], vec![FILL; 6], FILL)
        .with_char_series("PROFILE_BISULFIDE_QC", b"  ");
    let report = check(&src);
    assert!(report.is_ok(), "{:?}", report);
    assert_eq!(report.warnings(), &["BISULFIDE: deprecated parameter".to_owned()]);
}

#[test]
fn test_invalid_data_mode_skips_adjusted_checks() {
    let src = core_profile()
        .with_char_series("DATA_MODE", b"RX")
        .with_numeric("PRES_ADJUSTED", &[2, 3], vec![FILL, FILL, FILL, 5.1, 10.1, 3.0], FILL);
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &["DATA_MODE: invalid data mode: 1 profiles; first 1 indices 1".to_owned()]
    );
}

#[test]
fn test_missing_qc_variable_only_stops_that_parameter() {
    let src = MemorySource::new()
        .with_dimension("N_PROF", 1)
        .with_dimension("N_LEVELS", 2)
        .with_char_series("DATA_MODE", b"R")
        .with_numeric("PRES", &[1, 2], vec![5.0, 10.0], FILL)
        .with_numeric("TEMP", &[1, 2], vec![12.0, 11.0], FILL)
        .with_chars("TEMP_QC", &[1, 2], b"10")
        .with_numeric("TEMP_ADJUSTED", &[1, 2], vec![FILL, FILL], FILL)
        .with_chars("TEMP_ADJUSTED_QC", &[1, 2], b"  ")
        .with_numeric("TEMP_ADJUSTED_ERROR", &[1, 2], vec![FILL, FILL], FILL)
        .with_char_series("PROFILE_TEMP_QC", b"B");
    let report = check(&src);
    assert_eq!(
        report.errors(),
        &[
            "PRES: Could not read variable 'PRES_QC'".to_owned(),
            "TEMP: not-missing data with TEMP_QC unset: 1 levels; first 1 indices (0,1)".to_owned(),
        ]
    );
}

#[test]
fn test_repeated_runs_are_identical() {
    let src = core_profile()
        .with_chars("TEMP_QC", &[2, 3], b"1Z9114")
        .with_numeric("PRES_ADJUSTED", &[2, 3], vec![5.1, FILL, FILL, 5.1, FILL, FILL], FILL);
    let first = check(&src);
    let second = check(&src);
    assert!(!first.is_ok());
    assert_eq!(first.errors(), second.errors());
    assert_eq!(first.warnings(), second.warnings());
}
