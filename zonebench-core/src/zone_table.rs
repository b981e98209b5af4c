// vim: tw=80
//! Software emulation of a zoned device's write-pointer rules

use nix::errno::Errno;
use crate::zone::*;

/// Zone state for devices whose zones are emulated by zonebench.
///
/// Enforces the same rules that a host-managed device enforces, so the
/// emulated stores fail exactly where real hardware would.
#[derive(Clone, Debug)]
pub struct ZoneTable {
    zones: Vec<Zone>,
    block_size: u64,
}

impl ZoneTable {
    pub fn new(zones: Vec<Zone>, block_size: u32) -> Self {
        debug_assert!(zones.windows(2).all(|w| w[0].end() <= w[1].start));
        ZoneTable { zones, block_size: u64::from(block_size) }
    }

    /// Build `nr_zones` equally sized, empty, sequential zones.
    ///
    /// `capacity` is clipped to `zone_size`.
    pub fn uniform(nr_zones: u32, zone_size: u64, capacity: u64,
                   block_size: u32) -> Self
    {
        let capacity = capacity.min(zone_size);
        let zones = (0..u64::from(nr_zones))
            .map(|i| Zone::empty(i * zone_size, zone_size, capacity))
            .collect();
        ZoneTable::new(zones, block_size)
    }

    /// Mutable access to a zone, for constructing test scenarios.
    pub fn zone_mut(&mut self, idx: usize) -> &mut Zone {
        &mut self.zones[idx]
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones[..]
    }

    pub fn report(&self, filter: ReportFilter) -> Vec<Zone> {
        self.zones.iter()
            .filter(|z| filter.matches(z))
            .copied()
            .collect()
    }

    /// Index of the zone containing `offset`, if any
    pub fn locate(&self, offset: u64) -> Option<usize> {
        let i = self.zones.partition_point(|z| z.end() <= offset);
        if i < self.zones.len() && self.zones[i].start <= offset {
            Some(i)
        } else {
            None
        }
    }

    /// Check whether a write of `len` bytes at `offset` would be accepted.
    ///
    /// Returns the index of the zone that would receive it.
    pub fn check_write(&self, offset: u64, len: u64) -> nix::Result<usize> {
        if offset % self.block_size != 0 || len % self.block_size != 0 {
            return Err(Errno::EINVAL);
        }
        let idx = self.locate(offset).ok_or(Errno::ENXIO)?;
        let zone = &self.zones[idx];
        if offset + len > zone.end() {
            // No write may span zones
            return Err(Errno::EIO);
        }
        match zone.condition {
            ZoneCondition::ReadOnly | ZoneCondition::Offline |
                ZoneCondition::Full => return Err(Errno::EIO),
            _ => ()
        }
        if zone.zone_type != ZoneType::Conventional {
            if offset != zone.write_pointer {
                return Err(Errno::EIO);
            }
            if offset + len > zone.capacity_end() {
                return Err(Errno::EIO);
            }
        }
        Ok(idx)
    }

    /// Account for `len` bytes accepted by the zone at `idx`.
    pub fn commit_write(&mut self, idx: usize, len: u64) {
        let zone = &mut self.zones[idx];
        if zone.zone_type == ZoneType::Conventional {
            return;
        }
        zone.write_pointer += len;
        if zone.write_pointer >= zone.capacity_end() {
            zone.condition = ZoneCondition::Full;
            zone.write_pointer = zone.end();
        } else if zone.condition == ZoneCondition::Empty ||
            zone.condition == ZoneCondition::Closed
        {
            zone.condition = ZoneCondition::ImplicitOpen;
        }
    }

    /// Indices of every zone overlapping the range, after checking that each
    /// of them supports zone management commands.
    fn managed_range(&self, start: u64, len: u64) -> nix::Result<Vec<usize>> {
        let idxs = self.zones.iter()
            .enumerate()
            .filter(|(_, z)| z.overlaps(start, len))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        if idxs.is_empty() {
            return Err(Errno::EINVAL);
        }
        for i in idxs.iter() {
            let zone = &self.zones[*i];
            if zone.zone_type == ZoneType::Conventional {
                return Err(Errno::EINVAL);
            }
            match zone.condition {
                ZoneCondition::ReadOnly | ZoneCondition::Offline =>
                    return Err(Errno::EIO),
                _ => ()
            }
        }
        Ok(idxs)
    }

    /// Return every zone overlapping the range to the Empty condition.
    pub fn reset(&mut self, start: u64, len: u64) -> nix::Result<()> {
        for i in self.managed_range(start, len)? {
            let zone = &mut self.zones[i];
            zone.condition = ZoneCondition::Empty;
            zone.write_pointer = zone.start;
        }
        Ok(())
    }

    /// Force every zone overlapping the range to the Full condition.
    pub fn finish(&mut self, start: u64, len: u64) -> nix::Result<()> {
        for i in self.managed_range(start, len)? {
            let zone = &mut self.zones[i];
            zone.condition = ZoneCondition::Full;
            zone.write_pointer = zone.end();
        }
        Ok(())
    }
}

// LCOV_EXCL_STOP
