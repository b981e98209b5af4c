// vim: tw=80
//! Persisting per-zone experiment results

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
    time::Duration,
};
use crate::{
    fill::FillFraction,
    types::*,
};

/// The outcome of one zone's trip through an experiment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExperimentResult {
    /// Device-order index of the zone
    pub zone: ZoneT,
    /// Requested fill target
    pub percent: FillFraction,
    pub bytes_written: u64,
    /// The zone's writable capacity
    pub capacity: u64,
    /// Duration of the finish operation, if one was timed
    pub finish_latency: Option<Duration>,
    /// Was the zone reset after being written?
    pub reset: bool,
}

impl ExperimentResult {
    /// Fraction of the zone's capacity actually written
    pub fn fill_achieved(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.bytes_written as f64 / self.capacity as f64
        }
    }
}

/// One CSV line, without the trailing newline
impl fmt::Display for ExperimentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finish_latency {
            Some(d) => write!(f, "zone_{},{:.6}%,{:.6}(s)", self.zone,
                              self.percent.percent(), d.as_secs_f64()),
            None => write!(f, "zone_{},{}%,{}", self.zone, self.percent,
                           self.bytes_written)
        }
    }
}

/// Anything that can durably store experiment results
pub trait ResultRecorder {
    fn record(&mut self, result: &ExperimentResult) -> Result<()>;
}

/// Appends one line per result to a text file.
///
/// Each line is flushed as soon as it's recorded, so a crash loses at most the
/// zone in progress.
#[derive(Debug)]
pub struct CsvRecorder {
    writer: BufWriter<File>,
}

impl CsvRecorder {
    /// Open `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(|f| CsvRecorder { writer: BufWriter::new(f) })
            .map_err(|e| Error::RecordFailed(errno_of(&e)))
    }
}

impl ResultRecorder for CsvRecorder {
    fn record(&mut self, result: &ExperimentResult) -> Result<()> {
        writeln!(self.writer, "{result}")
            .and_then(|_| self.writer.flush())
            .map_err(|e| Error::RecordFailed(errno_of(&e)))
    }
}

/// Collects results in memory
impl ResultRecorder for Vec<ExperimentResult> {
    fn record(&mut self, result: &ExperimentResult) -> Result<()> {
        self.push(*result);
        Ok(())
    }
}

// LCOV_EXCL_STOP
