// vim: tw=80
//! Zone state transitions: reset and finish

use std::time::{Duration, Instant};
use tracing::instrument;
use crate::{
    store::ZoneStore,
    types::*,
    zone::Zone,
};

/// Return `zone` to the Empty condition, discarding its contents.
///
/// Covers the zone's whole length, not just its capacity.
#[instrument(skip(store), fields(start = zone.start))]
pub fn reset<S>(store: &mut S, zone: &Zone) -> Result<()>
    where S: ZoneStore + ?Sized
{
    store.reset_zones(zone.start, zone.length)
        .map_err(|errno| Error::ResetFailed{start: zone.start, errno})
}

/// Transition `zone` to the Full condition.
///
/// If `measure_time` is set, returns the elapsed monotonic time of the finish
/// operation itself.
#[instrument(skip(store), fields(start = zone.start))]
pub fn finish<S>(store: &mut S, zone: &Zone, measure_time: bool)
    -> Result<Option<Duration>>
    where S: ZoneStore + ?Sized
{
    let begin = Instant::now();
    store.finish_zones(zone.start, zone.capacity)
        .map_err(|errno| Error::FinishFailed{start: zone.start, errno})?;
    Ok(measure_time.then(|| begin.elapsed()))
}

// LCOV_EXCL_STOP
