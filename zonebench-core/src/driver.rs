// vim: tw=80
//! Experiment orchestration
//!
//! Each experiment walks some of the device's zones through the same
//! lifecycle: select, fill, optionally reset or finish, and record.

use std::fmt;
use tracing::{debug, error, info, warn};
use crate::{
    fill::FillFraction,
    lifecycle,
    recorder::{ExperimentResult, ResultRecorder},
    store::ZoneStore,
    types::*,
    writer,
    zone::*,
};

/// Which experiment to run
#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    /// Write one chunk to each of the first `percent` of the zones, then reset
    /// them all.
    Allocation { percent: FillFraction },
    /// Fill a single zone to `percent` of its capacity.
    Interference { zone: ZoneT, percent: FillFraction },
    /// Fill zone `i` to `percents[i]` of its capacity, then time how long it
    /// takes to finish it.
    Occupancy { percents: Vec<FillFraction> },
}

/// Counts of what happened during one run
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Zones chosen by the experiment, including skipped ones
    pub selected: ZoneT,
    /// Zones passed over because they aren't sequential-write-required
    pub skipped: ZoneT,
    pub written: ZoneT,
    pub reset: ZoneT,
    pub finished: ZoneT,
    /// Zones that hit a per-zone error
    pub failed: ZoneT,
    pub recorded: ZoneT,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} zones selected, {} skipped, {} written, {} reset, \
               {} finished, {} failed, {} recorded",
               self.selected, self.skipped, self.written, self.reset,
               self.finished, self.failed, self.recorded)
    }
}

/// Runs experiments against one device, recording one result per zone.
#[derive(Debug)]
pub struct ExperimentDriver<S, R> {
    store: S,
    recorder: R,
    chunk_size: usize,
}

impl<S: ZoneStore, R: ResultRecorder> ExperimentDriver<S, R> {
    /// Create a driver that writes in `chunk_size` byte requests.
    ///
    /// `chunk_size` must be a positive multiple of the device's logical block
    /// size.
    pub fn new(store: S, recorder: R, chunk_size: usize) -> Result<Self> {
        let align = u64::from(store.info().logical_block_size);
        let size = chunk_size as u64;
        if size == 0 || size % align != 0 {
            return Err(Error::InvalidChunkSize{size, align});
        }
        Ok(ExperimentDriver{store, recorder, chunk_size})
    }

    pub fn into_inner(self) -> (S, R) {
        (self.store, self.recorder)
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one experiment.
    ///
    /// Per-zone failures are logged and counted in the summary.  Any other
    /// error aborts the run.
    pub fn run(&mut self, mode: &Mode) -> Result<RunSummary> {
        let zones = self.store.list_zones(ReportFilter::All)
            .map_err(Error::ZoneQueryFailed)?;
        info!(?mode, nr_zones = zones.len(), "Starting experiment");
        let mut summary = RunSummary::default();
        match mode {
            Mode::Allocation{percent} =>
                self.allocation(&zones, *percent, &mut summary)?,
            Mode::Interference{zone, percent} =>
                self.interference(&zones, *zone, *percent, &mut summary)?,
            Mode::Occupancy{percents} =>
                self.occupancy(&zones, percents, &mut summary)?,
        }
        info!(?summary, "Experiment complete");
        Ok(summary)
    }

    fn allocation(&mut self, zones: &[Zone], percent: FillFraction,
                  summary: &mut RunSummary) -> Result<()>
    {
        let n = percent.zones_of(zones.len() as ZoneT);
        debug!("Allocating {n} of {} zones", zones.len());

        // Issue every write before the first reset, so the two phases can be
        // timed separately.
        let mut written = Vec::new();
        for (i, zone) in zones.iter().enumerate().take(n as usize) {
            let idx = i as ZoneT;
            summary.selected += 1;
            if !eligible(idx, zone, summary) {
                continue;
            }
            match writer::write_one_page(&mut self.store, zone, self.chunk_size)
            {
                Ok(bytes) => {
                    summary.written += 1;
                    written.push((idx, zone, bytes));
                }
                Err(e) => zone_failed(idx, e, summary)?
            }
        }

        for (idx, zone, bytes) in written {
            match lifecycle::reset(&mut self.store, zone) {
                Ok(()) => {
                    summary.reset += 1;
                    self.record(ExperimentResult {
                        zone: idx,
                        percent,
                        bytes_written: bytes,
                        capacity: zone.capacity,
                        finish_latency: None,
                        reset: true
                    }, summary)?;
                }
                Err(e) => zone_failed(idx, e, summary)?
            }
        }
        Ok(())
    }

    fn interference(&mut self, zones: &[Zone], idx: ZoneT,
                    percent: FillFraction, summary: &mut RunSummary)
        -> Result<()>
    {
        let zone = zones.get(idx as usize)
            .ok_or(Error::InvalidZoneIndex {
                index: idx,
                nr_zones: zones.len() as ZoneT
            })?;
        summary.selected += 1;
        if !eligible(idx, zone, summary) {
            return Ok(());
        }
        self.fill(idx, zone, percent, summary)?;
        Ok(())
    }

    fn occupancy(&mut self, zones: &[Zone], percents: &[FillFraction],
                 summary: &mut RunSummary) -> Result<()>
    {
        for (i, percent) in percents.iter().enumerate() {
            let idx = i as ZoneT;
            let Some(zone) = zones.get(i) else {
                warn!("No more zones; ignoring the remaining {} percentages",
                      percents.len() - i);
                break;
            };
            summary.selected += 1;
            if !eligible(idx, zone, summary) {
                continue;
            }
            let Some(bytes) = self.fill_unrecorded(idx, zone, *percent,
                                                   summary)?
            else {
                continue;
            };
            match lifecycle::finish(&mut self.store, zone, true) {
                Ok(latency) => {
                    summary.finished += 1;
                    self.record(ExperimentResult {
                        zone: idx,
                        percent: *percent,
                        bytes_written: bytes,
                        capacity: zone.capacity,
                        finish_latency: latency,
                        reset: false
                    }, summary)?;
                }
                Err(e) => zone_failed(idx, e, summary)?
            }
        }
        Ok(())
    }

    /// Fill `zone` to `percent` of its capacity and record the result.
    fn fill(&mut self, idx: ZoneT, zone: &Zone, percent: FillFraction,
            summary: &mut RunSummary) -> Result<()>
    {
        if let Some(bytes) = self.fill_unrecorded(idx, zone, percent, summary)?
        {
            self.record(ExperimentResult {
                zone: idx,
                percent,
                bytes_written: bytes,
                capacity: zone.capacity,
                finish_latency: None,
                reset: false
            }, summary)?;
        }
        Ok(())
    }

    /// Fill `zone` to `percent` of its capacity.
    ///
    /// Returns the number of bytes written, or `None` if the write failed.
    fn fill_unrecorded(&mut self, idx: ZoneT, zone: &Zone,
                       percent: FillFraction, summary: &mut RunSummary)
        -> Result<Option<u64>>
    {
        let target = percent.bytes_for(zone.capacity,
                                       self.chunk_size as u64)?;
        debug!("zone {idx}: writing {target} bytes for {percent}% of {}",
               zone.capacity);
        match writer::write_zone(&mut self.store, zone, self.chunk_size, target)
        {
            Ok(bytes) => {
                summary.written += 1;
                Ok(Some(bytes))
            }
            Err(e) => {
                zone_failed(idx, e, summary)?;
                Ok(None)
            }
        }
    }

    fn record(&mut self, result: ExperimentResult, summary: &mut RunSummary)
        -> Result<()>
    {
        self.recorder.record(&result)?;
        summary.recorded += 1;
        Ok(())
    }
}

/// Is `zone` a valid fill target?  Logs and counts it if not.
fn eligible(idx: ZoneT, zone: &Zone, summary: &mut RunSummary) -> bool {
    if zone.is_sequential() {
        true
    } else {
        warn!("Skipping zone {idx}: {} zones are not sequential-write-required",
              zone.zone_type);
        summary.skipped += 1;
        false
    }
}

/// Handle an error affecting a single zone.
///
/// Fatal errors are passed through.  Others are logged and counted.
fn zone_failed(idx: ZoneT, e: Error, summary: &mut RunSummary) -> Result<()> {
    if e.is_fatal() {
        return Err(e);
    }
    error!("zone {idx}: {e}");
    summary.failed += 1;
    Ok(())
}

// LCOV_EXCL_STOP
