// vim: tw=80
//! Common type definitions used throughout zonebench

use nix::errno::Errno;
use std::{
    io,
    path::PathBuf,
};
use thiserror::Error;

/// Indexes a device's zones, in device order.
pub type ZoneT = u32;

/// zonebench's error type.
///
/// Device-level failures carry the errno reported by the kernel (or by the
/// emulated device).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    #[error("Invalid fill percentage {0}%: must be greater than 0 and at most 100")]
    InvalidFraction(f64),

    #[error("Invalid chunk size {size}: must be a positive multiple of {align} bytes")]
    InvalidChunkSize { size: u64, align: u64 },

    #[error("Invalid zone index {index}: device has {nr_zones} zones")]
    InvalidZoneIndex { index: ZoneT, nr_zones: ZoneT },

    #[error("Cannot open {}: {errno}", .path.display())]
    DeviceOpenFailed { path: PathBuf, errno: Errno },

    #[error("Zone query failed: {0}")]
    ZoneQueryFailed(Errno),

    #[error("Write failed at offset {offset:#x} after {written} bytes: {}",
            .errno.map_or("short write", Errno::desc))]
    WriteFailed { offset: u64, written: u64, errno: Option<Errno> },

    #[error("Failed to reset zone at {start:#x}: {errno}")]
    ResetFailed { start: u64, errno: Errno },

    #[error("Failed to finish zone at {start:#x}: {errno}")]
    FinishFailed { start: u64, errno: Errno },

    #[error("Cannot allocate a {size} byte buffer aligned to {align} bytes")]
    AllocationFailed { size: usize, align: usize },

    #[error("Cannot record result: {0}")]
    RecordFailed(Errno),
}

impl Error {
    /// Does this error abort the whole run?
    ///
    /// Per-zone errors only exclude the affected zone from later phases.
    pub fn is_fatal(&self) -> bool {
        !matches!(self,
            Error::WriteFailed{..} |
            Error::ResetFailed{..} |
            Error::FinishFailed{..} |
            Error::AllocationFailed{..}
        )
    }
}

/// Extract the errno from an `io::Error`, defaulting to `EIO`.
pub fn errno_of(e: &io::Error) -> Errno {
    e.raw_os_error()
        .map(Errno::from_raw)
        .unwrap_or(Errno::EIO)
}

pub type Result<T> = ::std::result::Result<T, Error>;

// LCOV_EXCL_STOP
