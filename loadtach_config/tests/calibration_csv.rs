use std::fs::File;
use std::io::Write;

use loadtach_config::{CalibrationRow, FittedCalibration, load_calibration_csv};
use rstest::rstest;
use tempfile::tempdir;

fn rows(pairs: &[(i64, f32)]) -> Vec<CalibrationRow> {
    pairs
        .iter()
        .map(|&(raw, grams)| CalibrationRow { raw, grams })
        .collect()
}

#[rstest]
fn two_point_fit_is_exact() {
    // Empty scale at raw=100, 100 g at raw=200
    let c = FittedCalibration::from_rows(&rows(&[(100, 0.0), (200, 100.0)])).unwrap();
    assert!((c.slope - 1.0).abs() < 1e-6);
    assert_eq!(c.tare, 100);
}

#[rstest]
fn decreasing_raw_gives_negative_slope() {
    let c = FittedCalibration::from_rows(&rows(&[(1000, 0.0), (500, 250.0), (0, 500.0)])).unwrap();
    assert!((c.slope + 0.5).abs() < 1e-6);
    assert_eq!(c.tare, 1000);
}

#[rstest]
#[case(&[(100, 0.0), (100, 10.0)], "duplicate raw")]
#[case(&[(100, 0.0), (200, 100.0), (150, 70.0)], "monotonic")]
#[case(&[(100, 50.0), (200, 50.0), (300, 50.0)], "zero or non-finite slope")]
#[case(&[(100, 0.0)], "at least two rows")]
fn rejects_degenerate_rows(#[case] pairs: &[(i64, f32)], #[case] needle: &str) {
    let err = FittedCalibration::from_rows(&rows(pairs)).expect_err("should be rejected");
    assert!(
        format!("{err}").to_lowercase().contains(needle),
        "expected {needle:?}, got: {err}"
    );
}

#[rstest]
fn outliers_are_dropped_before_refit() {
    // Ground truth: grams = 0.5 * (raw - 100)
    let mut data: Vec<CalibrationRow> = (0..50i64)
        .map(|i| {
            let raw = 50 + i * 10;
            let noise = (i as f32 * 37.0).sin() * 0.5;
            CalibrationRow {
                raw,
                grams: 0.5 * (raw as f32 - 100.0) + noise,
            }
        })
        .collect();
    data[15].grams = 500.0;
    data[35].grams = -500.0;

    let c = FittedCalibration::from_rows(&data).unwrap();
    assert!((c.slope - 0.5).abs() / 0.5 <= 0.01, "slope {}", c.slope);
    assert!((c.tare - 100).abs() <= 1, "tare {}", c.tare);
}

#[rstest]
fn setcal_line_round_trips_values() {
    let c = FittedCalibration {
        slope: 0.002,
        tare: -1234,
    };
    assert_eq!(c.setcal_line(), "SETCAL 0.002 -1234");
}

#[rstest]
fn csv_with_wrong_header_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_headers.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,value").unwrap();
    writeln!(f, "100,0.0").unwrap();
    writeln!(f, "200,1.0").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on bad headers");
    assert!(format!("{err}").contains("headers 'raw,grams'"));
}

#[rstest]
fn csv_with_non_numeric_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_numeric.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,grams").unwrap();
    writeln!(f, "abc,xyz").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on non-numeric");
    assert!(format!("{err}").contains("invalid CSV row 2"));
}

#[rstest]
fn csv_round_trip_fit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cal.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw, grams").unwrap();
    writeln!(f, "842913, 0.0").unwrap();
    writeln!(f, "1024913, 100.0").unwrap();

    let c = load_calibration_csv(&path).unwrap();
    assert_eq!(c.tare, 842_913);
    assert!((c.slope - 100.0 / 182_000.0).abs() < 1e-9);
}
