// vim: tw=80
//! An in-memory zoned device

use nix::errno::Errno;
use crate::{
    store::ZoneStore,
    types::*,
    zone::*,
    zone_table::ZoneTable,
};

/// `MemZoneStore`: RAM-backed implementation of `ZoneStore`
///
/// Zones are equally sized and start out empty and sequential.  Written data is
/// retained, so it can be read back.  Only the bytes actually written consume
/// memory.
#[derive(Clone, Debug)]
pub struct MemZoneStore {
    table: ZoneTable,
    /// Contents of each zone, from the zone's start up to the highest byte
    /// written.
    data: Vec<Vec<u8>>,
    block_size: u32,
    zone_size: u64,
}

impl MemZoneStore {
    /// Create a new store of `nr_zones` zones, each `zone_size` bytes long
    /// with `capacity` writable bytes.
    pub fn new(nr_zones: ZoneT, zone_size: u64, capacity: u64, block_size: u32)
        -> Self
    {
        MemZoneStore {
            table: ZoneTable::uniform(nr_zones, zone_size, capacity, block_size),
            data: vec![Vec::new(); nr_zones as usize],
            block_size,
            zone_size,
        }
    }

    /// Turn the zone at `idx` into a conventional zone
    pub fn set_conventional(&mut self, idx: ZoneT) {
        let z = self.table.zone_mut(idx as usize);
        *z = Zone::conventional(z.start, z.length);
    }

    /// Force the condition of the zone at `idx`, as if the device had changed
    /// it on its own.
    pub fn set_condition(&mut self, idx: ZoneT, condition: ZoneCondition) {
        self.table.zone_mut(idx as usize).condition = condition;
    }

    /// Current state of the zone at `idx`
    pub fn zone(&self, idx: ZoneT) -> Zone {
        self.table.zones()[idx as usize]
    }

    /// Clear the stored data of every sequential zone in the range.
    fn discard(&mut self, start: u64, len: u64) {
        for (i, z) in self.table.zones().iter().enumerate() {
            if z.overlaps(start, len) && z.zone_type != ZoneType::Conventional {
                self.data[i].clear();
            }
        }
    }
}

impl ZoneStore for MemZoneStore {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            logical_block_size: self.block_size,
            nr_zones: self.table.zones().len() as ZoneT,
            zone_size: self.zone_size,
            size: self.table.zones().len() as u64 * self.zone_size,
            emulated: true,
        }
    }

    fn list_zones(&self, filter: ReportFilter) -> nix::Result<Vec<Zone>> {
        Ok(self.table.report(filter))
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> nix::Result<usize> {
        let mut nread = 0;
        while nread < buf.len() {
            let off = offset + nread as u64;
            let Some(idx) = self.table.locate(off) else {
                break;
            };
            let zone = &self.table.zones()[idx];
            let rel = (off - zone.start) as usize;
            let n = (buf.len() - nread).min((zone.end() - off) as usize);
            let dst = &mut buf[nread..nread + n];
            let stored = &self.data[idx];
            let avail = stored.len().saturating_sub(rel).min(n);
            if avail > 0 {
                dst[..avail].copy_from_slice(&stored[rel..rel + avail]);
            }
            dst[avail..].fill(0);
            nread += n;
        }
        if nread == 0 && !buf.is_empty() {
            Err(Errno::ENXIO)
        } else {
            Ok(nread)
        }
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> nix::Result<usize> {
        let idx = self.table.check_write(offset, buf.len() as u64)?;
        let rel = (offset - self.table.zones()[idx].start) as usize;
        let stored = &mut self.data[idx];
        if stored.len() < rel + buf.len() {
            stored.resize(rel + buf.len(), 0);
        }
        stored[rel..rel + buf.len()].copy_from_slice(buf);
        self.table.commit_write(idx, buf.len() as u64);
        Ok(buf.len())
    }

    fn reset_zones(&mut self, start: u64, len: u64) -> nix::Result<()> {
        self.table.reset(start, len)?;
        self.discard(start, len);
        Ok(())
    }

    fn finish_zones(&mut self, start: u64, len: u64) -> nix::Result<()> {
        self.table.finish(start, len)
    }
}

// LCOV_EXCL_STOP
