use assert_cmd::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

use super::Harness;

#[test]
fn ok() {
    let h = Harness::new(8);
    h.cmd()
        .arg("occupancy")
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .args(["50", "75", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 finished"));
    let results = h.results();
    let lines = results.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    let line = predicate::str::is_match(r"^zone_\d,\d+\.\d{6}%,\d+\.\d{6}\(s\)$")
        .unwrap();
    for l in lines.iter().copied() {
        assert!(line.eval(l), "{l}");
    }
    assert!(lines[0].starts_with("zone_0,50.000000%,"));
    assert!(lines[1].starts_with("zone_1,75.000000%,"));
    assert!(lines[2].starts_with("zone_2,100.000000%,"));
}

/// Percentages past the last zone are ignored
#[test]
fn more_percentages_than_zones() {
    let h = Harness::new(2);
    h.cmd()
        .arg("occupancy")
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .args(["10", "20", "30"])
        .assert()
        .success();
    assert_eq!(h.results().lines().count(), 2);
}

#[test]
fn no_percentages() {
    let h = Harness::new(2);
    h.cmd()
        .arg("occupancy")
        .arg(&h.device)
        .arg("4096")
        .arg(&h.results)
        .assert()
        .failure()
        .code(2);
}
