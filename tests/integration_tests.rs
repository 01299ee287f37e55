use hplc_quant::{
    DilutionFactor, LocalStorage, QuantEngine, QuantError, ReferenceTable, RunConfig, RunInputs,
};
use std::path::Path;
use tempfile::TempDir;

const COMMA_EXPORT: &str = "\
Sample Set,Caffeine 2024-12-04
Instrument,HPLC-01
Method,isocratic 70:30
Injection Volume,10 uL
#,Sample Name,RT,Type,Height,Width,Area
1,Std 1 ppm,2.31,BB,51,0.10,100
2,Std 2 ppm,2.30,BB,99,0.10,200
3,Std 3 ppm,2.31,BB,151,0.10,300
,,,,,,
4,Coffee A,2.30,BB,75,0.10,150
5,Coffee B,2.32,BB,120,0.10,250
";

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn config_for(input: &str, output: &Path, extra: &str) -> RunConfig {
    let toml = format!(
        r#"
[run]
input = '{}'

[output]
path = '{}'
formats = ["txt", "json", "csv"]

{}
"#,
        input,
        output.display(),
        extra
    );
    RunConfig::from_toml_str(&toml).unwrap()
}

fn table(values: &[f64]) -> RunInputs<ReferenceTable, DilutionFactor> {
    RunInputs::new(ReferenceTable::new(values.to_vec()), DilutionFactor::NONE)
}

#[test]
fn test_end_to_end_comma_export() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", COMMA_EXPORT);
    let output = temp_dir.path().join("out");
    let config = config_for(&input, &output, "[calibration]\npoints = 3\n");

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let outcome = engine.run(&mut table(&[1.0, 2.0, 3.0])).unwrap();

    let report = &outcome.report;
    assert!((report.model().slope - 0.01).abs() < 1e-12);
    assert!(report.model().intercept.abs() < 1e-9);
    assert!((report.r_squared() - 1.0).abs() < 1e-12);
    assert_eq!(report.samples().len(), 2);
    assert!((report.samples()[0].estimated_concentration - 1.5).abs() < 1e-9);
    assert_eq!(report.samples()[1].sample_name, "Coffee B");
    assert!(report.skipped_rows().is_empty());

    assert_eq!(outcome.artifacts.len(), 3);
    let text = std::fs::read_to_string(output.join("report.txt")).unwrap();
    assert!(text.contains("=== AreasCon ===\n  1. 100\n  2. 200\n  3. 300\n"));
    assert!(text.contains("=== Sample Names ===\n  1. Coffee A\n  2. Coffee B\n"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("report.json")).unwrap())
            .unwrap();
    assert_eq!(json["samples"].as_array().unwrap().len(), 2);

    let csv = std::fs::read_to_string(output.join("results.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_tab_export_with_different_header_size() {
    let export = "\
Report\tHPLC
Operator\tlab
Date\t2024-12-04
Detector\tUV 273nm
Wavelength\t273
#\tSample Name\tRT\tType\tHeight\tWidth\tArea
1\tStd A\t2.3\tBB\t1\t0.1\t50
2\tStd B\t2.3\tBB\t1\t0.1\t150
3\tUnknown 1\t2.3\tBB\t1\t0.1\t100
";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.tsv", export);
    let output = temp_dir.path().join("out");
    let config = config_for(
        &input,
        &output,
        r#"
[layout]
delimiter = "tab"
header_rows = 6
section_gap_rows = 0

[calibration]
concentrations = [0.0, 10.0]

[unknowns]
count = 1
dilution_factor = 2.0
"#,
    );

    let dilution = DilutionFactor::new(config.unknowns.dilution_factor.unwrap()).unwrap();
    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let report = engine
        .analyze(&mut RunInputs::new(ReferenceTable::new(vec![0.0, 10.0]), dilution))
        .unwrap();

    // slope 0.1, intercept -5 -> 2 * (10 - 5)
    assert!((report.model().slope - 0.1).abs() < 1e-12);
    assert!((report.model().intercept + 5.0).abs() < 1e-9);
    assert!((report.samples()[0].estimated_concentration - 10.0).abs() < 1e-9);
    assert_eq!(report.dilution_factor().value(), 2.0);
}

#[test]
fn test_malformed_calibration_row_is_skipped() {
    let export = "\
h
1,Std 1,0,0,0,0,100
2,Std 2,0,0,0,0,not-a-number
3,Std 3,0,0,0,0,200
4,Std 4,0,0,0,0,300
5,Sample,0,0,0,0,250
";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", export);
    let output = temp_dir.path().join("out");
    let config = config_for(
        &input,
        &output,
        "[layout]\nheader_rows = 1\nsection_gap_rows = 0\n\n[calibration]\npoints = 3\n",
    );

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let report = engine.analyze(&mut table(&[1.0, 2.0, 3.0])).unwrap();

    assert_eq!(report.calibration_areas(), vec![100.0, 200.0, 300.0]);
    assert_eq!(report.skipped_rows().len(), 1);
    assert_eq!(report.skipped_rows()[0].row_index, 3);
    assert_eq!(report.samples().len(), 1);
    assert!((report.samples()[0].estimated_concentration - 2.5).abs() < 1e-9);
}

#[test]
fn test_malformed_rows_exhaust_calibration() {
    let export = "\
h
1,Std 1,0,0,0,0,100
2,Std 2,0,0,0,0,n/a
3,Std 3
";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", export);
    let output = temp_dir.path().join("out");
    let config = config_for(
        &input,
        &output,
        "[layout]\nheader_rows = 1\n\n[calibration]\npoints = 3\n",
    );

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let err = engine.analyze(&mut table(&[1.0, 2.0, 3.0])).unwrap_err();

    assert!(matches!(
        err,
        QuantError::InsufficientCalibrationData {
            expected: 3,
            found: 1
        }
    ));
}

#[test]
fn test_malformed_calibration_row_does_not_borrow_unknowns() {
    let export = "\
Sample Set,Caffeine 2024-12-04
Instrument,HPLC-01
Method,isocratic 70:30
Injection Volume,10 uL
#,Sample Name,RT,Type,Height,Width,Area
1,Std 1 ppm,2.31,BB,51,0.10,100
2,Std 2 ppm,2.30,BB,99,0.10,oops
3,Std 3 ppm,2.31,BB,151,0.10,300

4,Coffee A,2.30,BB,75,0.10,150
5,Coffee B,2.32,BB,120,0.10,250
6,Coffee C,2.31,BB,98,0.10,200
";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", export);
    let output = temp_dir.path().join("out");
    let config = config_for(&input, &output, "[calibration]\npoints = 3\n");

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let err = engine.run(&mut table(&[1.0, 2.0, 3.0])).unwrap_err();

    assert!(matches!(
        err,
        QuantError::InsufficientCalibrationData {
            expected: 3,
            found: 2
        }
    ));
    assert!(!output.join("report.txt").exists());
}

#[test]
fn test_unknowns_survive_missing_section_gap() {
    let export = "\
Sample Set,Caffeine 2024-12-04
Instrument,HPLC-01
Method,isocratic 70:30
Injection Volume,10 uL
#,Sample Name,RT,Type,Height,Width,Area
1,Std 1 ppm,2.31,BB,51,0.10,100
2,Std 2 ppm,2.30,BB,99,0.10,200
3,Std 3 ppm,2.31,BB,151,0.10,300
4,Coffee A,2.30,BB,75,0.10,150
5,Coffee B,2.32,BB,120,0.10,250
";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", export);
    let output = temp_dir.path().join("out");
    let config = config_for(&input, &output, "[calibration]\npoints = 3\n");

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let report = engine.analyze(&mut table(&[1.0, 2.0, 3.0])).unwrap();

    let names: Vec<&str> = report
        .samples()
        .iter()
        .map(|s| s.sample_name.as_str())
        .collect();
    assert_eq!(names, vec!["Coffee A", "Coffee B"]);
    assert!(report.skipped_rows().is_empty());
}

#[test]
fn test_missing_input_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.csv");
    let config = config_for(
        missing.to_str().unwrap(),
        temp_dir.path(),
        "[calibration]\npoints = 2\n",
    );

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let err = engine.run(&mut table(&[1.0, 2.0])).unwrap_err();

    assert!(matches!(err, QuantError::FileNotFound { .. }));
    assert!(!temp_dir.path().join("report.txt").exists());
}

#[test]
fn test_identical_areas_are_degenerate() {
    let export = "h\n1,A,0,0,0,0,100\n2,B,0,0,0,0,100\n3,U,0,0,0,0,100\n";
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", export);
    let config = config_for(
        &input,
        temp_dir.path(),
        "[layout]\nheader_rows = 1\n\n[calibration]\npoints = 2\n",
    );

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new(storage, config);
    let err = engine.run(&mut table(&[1.0, 2.0])).unwrap_err();

    assert!(matches!(err, QuantError::DegenerateFit { .. }));
    assert!(!temp_dir.path().join("report.txt").exists());
}

#[test]
fn test_zip_bundle_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "data.csv", COMMA_EXPORT);
    let output = temp_dir.path().join("out");
    let mut config = config_for(&input, &output, "[calibration]\npoints = 3\n");
    config.output.zip = true;

    let storage = LocalStorage::new(config.output_path().to_string());
    let mut engine = QuantEngine::new_with_monitoring(storage, config, false);
    let outcome = engine.run(&mut table(&[1.0, 2.0, 3.0])).unwrap();

    assert_eq!(outcome.artifacts.len(), 1);
    let zip_data = std::fs::read(output.join("hplc_report.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 3);

    let mut text = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("report.txt").unwrap(), &mut text).unwrap();
    assert!(text.starts_with("=== Analysis Report ==="));
}
