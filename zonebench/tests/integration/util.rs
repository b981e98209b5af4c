use std::{
    fs,
    path::PathBuf,
    process::Command,
};

use assert_cmd::prelude::*;
use tempfile::{Builder, TempDir};

pub fn zonebench() -> Command {
    Command::cargo_bin("zonebench").unwrap()
}

/// A device image with `nzones` emulated 1 MiB zones, plus a path for the
/// result file.
pub struct Harness {
    pub device:  PathBuf,
    pub results: PathBuf,
    _tempdir:    TempDir,
}

impl Harness {
    pub fn new(nzones: u64) -> Self {
        let tempdir = Builder::new()
            .prefix("zonebench_integration_test")
            .tempdir()
            .unwrap();
        let device = tempdir.path().join("device");
        let file = fs::File::create(&device).unwrap();
        file.set_len(nzones << 20).unwrap();
        let results = tempdir.path().join("results.csv");
        Harness{device, results, _tempdir: tempdir}
    }

    /// A zonebench command that will use emulated zones on the image
    pub fn cmd(&self) -> Command {
        let mut cmd = zonebench();
        cmd.args(["--buffered", "--zone-size", "1"]);
        cmd
    }

    pub fn results(&self) -> String {
        fs::read_to_string(&self.results).unwrap()
    }
}
