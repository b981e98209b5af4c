// vim: tw=80
use std::fs;

use nix::errno::Errno;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use zonebench_core::{
    Error,
    lifecycle,
    store::ZoneStore,
    writer::{self, FILL_PATTERN},
    zone::*,
    zoned_file::ZonedFile,
};

use super::{DeviceBuilder, ZONE_SIZE, zone_size};

struct Harness {
    zf: ZonedFile,
    path: std::path::PathBuf,
    _tempdir: TempDir
}

#[fixture]
fn harness() -> Harness {
    let (tempdir, path) = DeviceBuilder::new().build();
    let zf = ZonedFile::open(&path, false, zone_size()).unwrap();
    Harness{zf, path, _tempdir: tempdir}
}

// pet kcov
#[rstest]
fn debug(harness: Harness) {
    format!("{:?}", harness.zf);
}

/// A partial trailing zone is not usable
#[test]
fn partial_zone() {
    let (_tempdir, path) = DeviceBuilder::new()
        .nzones(3)
        .slop(ZONE_SIZE / 2)
        .build();
    let zf = ZonedFile::open(&path, false, zone_size()).unwrap();
    assert_eq!(zf.info().nr_zones, 3);
    assert_eq!(zf.info().size, 3 * ZONE_SIZE);
}

/// Written data reaches the backing file at the zone's offset
#[rstest]
fn data_on_disk(mut harness: Harness) {
    let zone = harness.zf.list_zones(ReportFilter::All).unwrap()[5];
    let n = writer::write_zone(&mut harness.zf, &zone, 4096, 16384).unwrap();
    assert_eq!(n, 16384);
    let contents = fs::read(&harness.path).unwrap();
    let start = zone.start as usize;
    assert!(contents[start..start + 16384].iter().all(|b| *b == FILL_PATTERN));
    assert!(contents[start + 16384..start + 20480].iter().all(|b| *b == 0));
    assert!(contents[..start].iter().all(|b| *b == 0));
}

#[rstest]
fn fill_then_finish(mut harness: Harness) {
    let zone = harness.zf.list_zones(ReportFilter::All).unwrap()[0];
    writer::write_zone(&mut harness.zf, &zone, 8192, ZONE_SIZE / 2).unwrap();
    let elapsed = lifecycle::finish(&mut harness.zf, &zone, true).unwrap();
    assert!(elapsed.is_some());
    let full = harness.zf.list_zones(ReportFilter::Full).unwrap();
    assert_eq!(full, vec![Zone {
        write_pointer: ZONE_SIZE,
        condition: ZoneCondition::Full,
        ..zone
    }]);
    // Full zones reject further writes
    let e = writer::write_one_page(&mut harness.zf, &full[0], 4096)
        .unwrap_err();
    assert_eq!(e, Error::WriteFailed {
        offset: 0,
        written: 0,
        errno: Some(Errno::EIO)
    });
}

#[rstest]
fn write_then_reset(mut harness: Harness) {
    let zone = harness.zf.list_zones(ReportFilter::All).unwrap()[1];
    writer::write_one_page(&mut harness.zf, &zone, 4096).unwrap();
    lifecycle::reset(&mut harness.zf, &zone).unwrap();
    let zones = harness.zf.list_zones(ReportFilter::All).unwrap();
    assert_eq!(zones[1], zone);
    // After a reset, the zone can be written from its start again
    assert_eq!(writer::write_one_page(&mut harness.zf, &zone, 4096), Ok(4096));
}

/// Writes must be multiples of the block size
#[rstest]
fn unaligned_chunk(mut harness: Harness) {
    let zone = harness.zf.list_zones(ReportFilter::All).unwrap()[0];
    let buf = vec![FILL_PATTERN; 512];
    assert_eq!(harness.zf.write_at(&buf, zone.start), Err(Errno::EINVAL));
}
