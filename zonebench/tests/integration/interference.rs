use assert_cmd::prelude::*;
use pretty_assertions::assert_eq;

use super::Harness;

#[test]
fn ok() {
    let h = Harness::new(8);
    h.cmd()
        .arg("interference")
        .arg(&h.device)
        .arg("65536")
        .arg("3")
        .arg(&h.results)
        .arg("50")
        .assert()
        .success();
    assert_eq!(h.results(), "zone_3,50%,524288\n");
}

#[test]
fn bad_zone_index() {
    let h = Harness::new(8);
    h.cmd()
        .arg("interference")
        .arg(&h.device)
        .arg("4096")
        .arg("8")
        .arg(&h.results)
        .arg("50")
        .assert()
        .failure()
        .code(1)
        .stderr("Error: Invalid zone index 8: device has 8 zones\n");
    assert_eq!(h.results(), "");
}

/// The result file is appended to, not truncated
#[test]
fn append() {
    let h = Harness::new(8);
    for zone in ["1", "2"] {
        h.cmd()
            .arg("interference")
            .arg(&h.device)
            .arg("4096")
            .arg(zone)
            .arg(&h.results)
            .arg("10")
            .assert()
            .success();
    }
    assert_eq!(h.results(), "zone_1,10%,106496\nzone_2,10%,106496\n");
}
