// vim: tw=80
use std::{
    fs,
    num::NonZeroU64,
    path::PathBuf,
};

use tempfile::{Builder, TempDir};

/// Size of each emulated zone in the functional tests
const ZONE_SIZE: u64 = 1 << 20;

/// Helper to create a fresh device image for emulated zones
#[derive(Debug)]
struct DeviceBuilder {
    /// Number of zones
    nzones: u64,
    /// Extra bytes past the last whole zone
    slop: u64,
}

impl DeviceBuilder {
    fn build(&self) -> (TempDir, PathBuf) {
        let tempdir = Builder::new()
            .prefix("zonebench_functional_test")
            .tempdir()
            .unwrap();
        let path = tempdir.path().join("device");
        let file = fs::File::create(&path).unwrap();
        file.set_len(self.nzones * ZONE_SIZE + self.slop).unwrap();
        (tempdir, path)
    }

    fn new() -> Self {
        Self { nzones: 8, slop: 0 }
    }

    fn nzones(&mut self, nzones: u64) -> &mut Self {
        self.nzones = nzones;
        self
    }

    fn slop(&mut self, slop: u64) -> &mut Self {
        self.slop = slop;
        self
    }
}

fn zone_size() -> Option<NonZeroU64> {
    NonZeroU64::new(ZONE_SIZE)
}

mod experiment;
mod zoned_file;
