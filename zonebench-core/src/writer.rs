// vim: tw=80
//! Sequential, chunked, aligned writes into a single zone

use tracing::instrument;
use crate::{
    buffer::AlignedBuf,
    store::ZoneStore,
    types::*,
    zone::Zone,
};

/// Every byte written by zonebench has this value, so it can be told apart
/// from whatever was on the device before.
pub const FILL_PATTERN: u8 = 0xAC;

/// Write at least `bytes_to_write` bytes to `zone`, in `chunk_size` pieces.
///
/// Writes start at the zone's start and proceed sequentially.  Each write is
/// exactly `chunk_size` bytes, from a single buffer aligned to `chunk_size`.
/// The first short or failed write aborts the operation; there are no
/// retries.  `chunk_size` must be a multiple of the device's logical block
/// size.
///
/// Returns the number of bytes written.
#[instrument(skip(store))]
pub fn write_zone<S>(store: &mut S, zone: &Zone, chunk_size: usize,
                     bytes_to_write: u64) -> Result<u64>
    where S: ZoneStore + ?Sized
{
    let buf = AlignedBuf::pattern(chunk_size, FILL_PATTERN)?;
    let mut written = 0u64;
    while written < bytes_to_write {
        let offset = zone.start + written;
        match store.write_at(&buf, offset) {
            Ok(n) if n == chunk_size => {
                written += n as u64;
            }
            Ok(n) => {
                return Err(Error::WriteFailed {
                    offset,
                    written: written + n as u64,
                    errno: None
                });
            }
            Err(errno) => {
                return Err(Error::WriteFailed {
                    offset,
                    written,
                    errno: Some(errno)
                });
            }
        }
    }
    Ok(written)
}

/// Write a single `chunk_size` page at the start of `zone`.
pub fn write_one_page<S>(store: &mut S, zone: &Zone, chunk_size: usize)
    -> Result<u64>
    where S: ZoneStore + ?Sized
{
    write_zone(store, zone, chunk_size, chunk_size as u64)
}

// LCOV_EXCL_STOP
