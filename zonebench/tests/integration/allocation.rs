use assert_cmd::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{Harness, zonebench};

#[test]
fn ok() {
    let h = Harness::new(8);
    h.cmd()
        .arg("allocation")
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .arg("25")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 recorded"));
    assert_eq!(h.results(), "zone_0,25%,4096\nzone_1,25%,4096\n");
}

/// A fractional number of zones rounds up
#[test]
fn rounds_up() {
    let h = Harness::new(8);
    h.cmd()
        .arg("allocation")
        .arg(&h.device)
        .arg("8192")
        .arg(&h.results)
        .arg("30")
        .assert()
        .success();
    assert_eq!(h.results().lines().count(), 3);
}

#[rstest]
#[case("0")]
#[case("101")]
#[case("half")]
fn bad_percentage(#[case] pct: &str) {
    let h = Harness::new(8);
    h.cmd()
        .arg("allocation")
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .arg(pct)
        .assert()
        .failure()
        .code(2);
    assert!(!h.results.exists());
}

/// Requests must be a multiple of the block size
#[test]
fn bad_request_size() {
    let h = Harness::new(8);
    h.cmd()
        .arg("allocation")
        .arg(&h.device)
        .arg("512")
        .arg(&h.results)
        .arg("50")
        .assert()
        .failure()
        .code(1)
        .stderr("Error: Invalid chunk size 512: must be a positive multiple \
                 of 4096 bytes\n");
}

#[test]
fn enoent() {
    let h = Harness::new(8);
    let missing = h.device.with_file_name("missing");
    h.cmd()
        .arg("allocation")
        .arg(&missing)
        .arg("4096")
        .arg(&h.results)
        .arg("50")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Cannot open"));
}

/// Regular files can only be used with emulated zones
#[test]
fn no_zone_size() {
    let h = Harness::new(8);
    zonebench()
        .args(["--buffered", "allocation"])
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .arg("50")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Cannot open"));
}
