// vim: tw=80
//! The capability interface between zonebench's experiments and a device

#[cfg(test)] use mockall::automock;
use crate::zone::*;

/// A zoned storage device, or something that behaves like one.
///
/// All offsets and lengths are in bytes.  Every operation completes before it
/// returns; there is no queueing.  Errors are reported as the errno that the
/// device (or its emulation) returned.
#[cfg_attr(test, automock)]
pub trait ZoneStore {
    /// Static properties of the device
    fn info(&self) -> DeviceInfo;

    /// Report the device's zones, in device order.
    ///
    /// The result is a fresh snapshot; nothing is cached between calls.
    fn list_zones(&self, filter: ReportFilter) -> nix::Result<Vec<Zone>>;

    /// Read into `buf` from `offset`.  Return the number of bytes read.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> nix::Result<usize>;

    /// Write `buf` at `offset`.  Return the number of bytes the device accepted,
    /// which may be less than `buf.len()`.
    fn write_at(&mut self, buf: &[u8], offset: u64) -> nix::Result<usize>;

    /// Reset the write pointer of every zone overlapping `[start, start+len)`.
    fn reset_zones(&mut self, start: u64, len: u64) -> nix::Result<()>;

    /// Transition every zone overlapping `[start, start+len)` to Full.
    fn finish_zones(&mut self, start: u64, len: u64) -> nix::Result<()>;
}
