// vim: tw=80
//! Whole experiments, run against emulated zones in a regular file

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use zonebench_core::{
    driver::{ExperimentDriver, Mode, RunSummary},
    fill::FillFraction,
    recorder::CsvRecorder,
    store::ZoneStore,
    writer::FILL_PATTERN,
    zone::*,
    zoned_file::ZonedFile,
};

use super::{DeviceBuilder, ZONE_SIZE, zone_size};

fn pct(p: f64) -> FillFraction {
    FillFraction::from_percent(p).unwrap()
}

fn driver(nzones: u64, chunk: usize)
    -> (TempDir, std::path::PathBuf, ExperimentDriver<ZonedFile, CsvRecorder>)
{
    let (tempdir, path) = DeviceBuilder::new().nzones(nzones).build();
    let results = tempdir.path().join("results.csv");
    let zf = ZonedFile::open(&path, false, zone_size()).unwrap();
    let recorder = CsvRecorder::open(&results).unwrap();
    let driver = ExperimentDriver::new(zf, recorder, chunk).unwrap();
    (tempdir, results, driver)
}

#[test_log::test]
fn allocation() {
    let (_tempdir, results, mut driver) = driver(10, 4096);
    let summary = driver.run(&Mode::Allocation{percent: pct(30.0)}).unwrap();
    assert_eq!(summary, RunSummary {
        selected: 3,
        written: 3,
        reset: 3,
        recorded: 3,
        ..Default::default()
    });
    let csv = fs::read_to_string(results).unwrap();
    assert_eq!(csv, "zone_0,30%,4096\nzone_1,30%,4096\nzone_2,30%,4096\n");
    let zones = driver.store().list_zones(ReportFilter::Empty).unwrap();
    assert_eq!(zones.len(), 10);
}

#[test_log::test]
fn interference() {
    let (_tempdir, results, mut driver) = driver(4, 65536);
    driver.run(&Mode::Interference{zone: 2, percent: pct(50.0)}).unwrap();
    let csv = fs::read_to_string(results).unwrap();
    assert_eq!(csv, format!("zone_2,50%,{}\n", ZONE_SIZE / 2));
    let open = driver.store().list_zones(ReportFilter::ImplicitOpen).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].write_pointer, 2 * ZONE_SIZE + ZONE_SIZE / 2);
    let mut buf = vec![0u8; 65536];
    driver.store().read_at(&mut buf, 2 * ZONE_SIZE).unwrap();
    assert!(buf.iter().all(|b| *b == FILL_PATTERN));
}

#[test_log::test]
fn occupancy() {
    let (_tempdir, results, mut driver) = driver(2, 4096);
    let percents = vec![pct(50.0), pct(75.0), pct(100.0)];
    let summary = driver.run(&Mode::Occupancy{percents}).unwrap();
    assert_eq!(summary.finished, 2);
    let csv = fs::read_to_string(results).unwrap();
    let lines = csv.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("zone_0,50.000000%,"));
    assert!(lines[0].ends_with("(s)"));
    assert!(lines[1].starts_with("zone_1,75.000000%,"));
    let full = driver.store().list_zones(ReportFilter::Full).unwrap();
    assert_eq!(full.len(), 2);
}

/// Results from successive runs accumulate in the same file
#[test]
fn append() {
    let (_tempdir, results, mut driver) = driver(4, 4096);
    driver.run(&Mode::Allocation{percent: pct(25.0)}).unwrap();
    driver.run(&Mode::Allocation{percent: pct(50.0)}).unwrap();
    let csv = fs::read_to_string(results).unwrap();
    assert_eq!(csv,
        "zone_0,25%,4096\nzone_0,50%,4096\nzone_1,50%,4096\n");
}
