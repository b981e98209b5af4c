// vim: tw=80
//! Zoned devices, accessed through a file descriptor

use cfg_if::cfg_if;
use nix::errno::Errno;
use std::{
    fs::{File, OpenOptions},
    num::NonZeroU64,
    os::unix::{
        fs::{FileExt, FileTypeExt, OpenOptionsExt},
        io::AsRawFd
    },
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};
use crate::{
    store::ZoneStore,
    types::*,
    util::*,
    zone::*,
    zone_table::ZoneTable,
};

/// FFI definitions for Linux's `blkzoned` interface.  They aren't in libc, and
/// the ioctls can't go there because they use Nix's macros.
#[cfg(target_os = "linux")]
#[doc(hidden)]
mod ffi {
    #![allow(non_camel_case_types)]
    use nix::{
        ioctl_read,
        ioctl_read_bad,
        ioctl_readwrite,
        ioctl_write_ptr,
        libc::c_int,
        request_code_none
    };

    /// Set in `blk_zone_report::flags` when `blk_zone::capacity` is valid
    pub const BLK_ZONE_REP_CAPACITY: u32 = 1;

    // These should be pub(super), but they must be plain pub instead because
    // Nix's ioctl macros make the ioctl functions `pub`.
    #[derive(Clone, Copy, Debug, Default)]
    #[repr(C)]
    pub struct blk_zone {
        pub start: u64,
        pub len: u64,
        pub wp: u64,
        pub type_: u8,
        pub cond: u8,
        pub non_seq: u8,
        pub reset: u8,
        pub resv: [u8; 4],
        pub capacity: u64,
        pub reserved: [u8; 24],
    }

    /// Header of a zone report.  The kernel writes the zone descriptors
    /// immediately after it.
    #[derive(Clone, Copy, Debug, Default)]
    #[repr(C)]
    pub struct blk_zone_report {
        pub sector: u64,
        pub nr_zones: u32,
        pub flags: u32,
    }

    #[derive(Clone, Copy, Debug, Default)]
    #[repr(C)]
    pub struct blk_zone_range {
        pub sector: u64,
        pub nr_sectors: u64,
    }

    ioctl_read_bad! {
        /// Logical block size, in bytes
        blksszget, request_code_none!(0x12, 104), c_int
    }
    ioctl_read! {
        /// Device size, in bytes
        blkgetsize64, 0x12, 114, u64
    }
    ioctl_readwrite! {
        blkreportzone, 0x12, 130, blk_zone_report
    }
    ioctl_write_ptr! {
        blkresetzone, 0x12, 131, blk_zone_range
    }
    ioctl_read! {
        /// Zone size, in 512-byte sectors
        blkgetzonesz, 0x12, 132, u32
    }
    ioctl_read! {
        blkgetnrzones, 0x12, 133, u32
    }
    ioctl_write_ptr! {
        blkfinishzone, 0x12, 136, blk_zone_range
    }
}

cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Zone operations on devices that implement zones natively
        mod native {
            use std::{
                mem,
                os::unix::io::RawFd,
            };
            use nix::{errno::Errno, libc::c_int};
            use num_traits::FromPrimitive;
            use super::ffi::*;
            use crate::{
                util::*,
                zone::*,
            };

            /// Number of zone descriptors fetched per `BLKREPORTZONE`
            const REPORT_BATCH: usize = 256;

            #[repr(C)]
            struct ReportBuf {
                hdr: blk_zone_report,
                zones: [blk_zone; REPORT_BATCH],
            }

            /// Static zone geometry of a device.  `None` if the device isn't
            /// zoned.
            pub fn geometry(fd: RawFd) -> nix::Result<Option<(u32, u64)>> {
                let mut nr_zones = 0u32;
                let r = unsafe { blkgetnrzones(fd, &mut nr_zones) };
                match r {
                    // Kernels without zoned block device support
                    Err(Errno::ENOTTY) => return Ok(None),
                    Err(e) => return Err(e),
                    Ok(_) if nr_zones == 0 => return Ok(None),
                    Ok(_) => ()
                }
                let mut sectors = 0u32;
                unsafe { blkgetzonesz(fd, &mut sectors) }?;
                Ok(Some((nr_zones, u64::from(sectors) * BYTES_PER_SECTOR)))
            }

            /// Logical block size and total size of a block device, in bytes
            pub fn block_device_size(fd: RawFd) -> nix::Result<(u32, u64)> {
                let mut lbs: c_int = 0;
                unsafe { blksszget(fd, &mut lbs) }?;
                let mut size = 0u64;
                unsafe { blkgetsize64(fd, &mut size) }?;
                Ok((lbs as u32, size))
            }

            pub fn decode(bz: &blk_zone, has_capacity: bool) -> nix::Result<Zone>
            {
                let zone_type = ZoneType::from_u8(bz.type_)
                    .ok_or(Errno::EIO)?;
                let condition = ZoneCondition::from_u8(bz.cond)
                    .ok_or(Errno::EIO)?;
                let length = bz.len * BYTES_PER_SECTOR;
                let capacity = if has_capacity {
                    bz.capacity * BYTES_PER_SECTOR
                } else {
                    length
                };
                Ok(Zone {
                    start: bz.start * BYTES_PER_SECTOR,
                    length,
                    capacity,
                    write_pointer: bz.wp * BYTES_PER_SECTOR,
                    zone_type,
                    condition
                })
            }

            /// Fetch every zone descriptor from the device, in batches
            pub fn report(fd: RawFd, nr_zones: u32) -> nix::Result<Vec<Zone>> {
                // SAFETY: ReportBuf is plain old data
                let mut buf: Box<ReportBuf> =
                    Box::new(unsafe { mem::zeroed() });
                let mut zones = Vec::with_capacity(nr_zones as usize);
                let mut sector = 0;
                while zones.len() < nr_zones as usize {
                    buf.hdr = blk_zone_report {
                        sector,
                        nr_zones: REPORT_BATCH as u32,
                        flags: 0
                    };
                    // The kernel writes the descriptors past the header
                    let p = &mut *buf as *mut ReportBuf
                        as *mut blk_zone_report;
                    unsafe { blkreportzone(fd, p) }?;
                    let n = (buf.hdr.nr_zones as usize).min(REPORT_BATCH);
                    if n == 0 {
                        break;
                    }
                    let has_capacity =
                        buf.hdr.flags & BLK_ZONE_REP_CAPACITY != 0;
                    for bz in buf.zones[..n].iter() {
                        zones.push(decode(bz, has_capacity)?);
                    }
                    let last = &buf.zones[n - 1];
                    sector = last.start + last.len;
                }
                Ok(zones)
            }

            fn range(start: u64, len: u64) -> blk_zone_range {
                blk_zone_range {
                    sector: start / BYTES_PER_SECTOR,
                    nr_sectors: len / BYTES_PER_SECTOR
                }
            }

            pub fn reset(fd: RawFd, start: u64, len: u64) -> nix::Result<()> {
                unsafe { blkresetzone(fd, &range(start, len)) }.map(drop)
            }

            pub fn finish(fd: RawFd, start: u64, len: u64) -> nix::Result<()> {
                unsafe { blkfinishzone(fd, &range(start, len)) }.map(drop)
            }
        }
    } else {
        /// Only Linux exposes zoned block devices.  Elsewhere, every zone is
        /// emulated.
        mod native {
            use std::os::unix::io::RawFd;
            use nix::errno::Errno;
            use crate::zone::Zone;

            pub fn geometry(_fd: RawFd) -> nix::Result<Option<(u32, u64)>> {
                Ok(None)
            }

            pub fn block_device_size(_fd: RawFd) -> nix::Result<(u32, u64)> {
                Err(Errno::EOPNOTSUPP)
            }

            pub fn report(_fd: RawFd, _nr_zones: u32) -> nix::Result<Vec<Zone>>
            {
                Err(Errno::EOPNOTSUPP)
            }

            pub fn reset(_fd: RawFd, _start: u64, _len: u64) -> nix::Result<()>
            {
                Err(Errno::EOPNOTSUPP)
            }

            pub fn finish(_fd: RawFd, _start: u64, _len: u64) -> nix::Result<()>
            {
                Err(Errno::EOPNOTSUPP)
            }
        }
    }
}

/// Who keeps track of the zones?
#[derive(Debug)]
enum Backend {
    /// The device itself
    Native,
    /// zonebench, in memory.  The state is lost when the file is closed.
    Emulated(ZoneTable),
}

/// `ZonedFile`: a `ZoneStore` backed by a file or device node
///
/// Host-managed zoned block devices are driven through the kernel's zone
/// management ioctls.  Regular files and conventional block devices can stand
/// in for them, with emulated zones.
#[derive(Debug)]
pub struct ZonedFile {
    file: File,
    path: PathBuf,
    info: DeviceInfo,
    backend: Backend,
}

impl ZonedFile {
    /// Block size used for emulated zones on regular files
    const FILE_BLOCK_SIZE: u32 = BYTES_PER_LBA;

    /// Open a device for zoned I/O
    ///
    /// * `path`:           Pathname for the file.  It may be a device node.
    /// * `direct`:         Bypass the page cache with `O_DIRECT`.
    /// * `sim_zone_size`:  If specified, devices that don't have native zones
    ///                     will be divided into simulated zones of this many
    ///                     bytes.
    pub fn open<P>(path: P, direct: bool, sim_zone_size: Option<NonZeroU64>)
        -> Result<Self>
        where P: AsRef<Path>
    {
        let path = path.as_ref().to_path_buf();
        let mut oo = OpenOptions::new();
        oo.read(true).write(true);
        if direct {
            oo.custom_flags(libc::O_DIRECT);
        }
        let file = oo.open(&path)
            .map_err(|e| Error::DeviceOpenFailed {
                path: path.clone(),
                errno: errno_of(&e)
            })?;
        let md = file.metadata()
            .map_err(|e| Error::DeviceOpenFailed {
                path: path.clone(),
                errno: errno_of(&e)
            })?;
        let fd = file.as_raw_fd();

        let (info, backend) = if md.file_type().is_block_device() {
            if let Some((nr_zones, zone_size)) = native::geometry(fd)
                .map_err(Error::ZoneQueryFailed)?
            {
                let (logical_block_size, size) = native::block_device_size(fd)
                    .map_err(Error::ZoneQueryFailed)?;
                let info = DeviceInfo {
                    logical_block_size,
                    nr_zones,
                    zone_size,
                    size,
                    emulated: false
                };
                (info, Backend::Native)
            } else {
                let (lbs, size) = native::block_device_size(fd)
                    .map_err(|errno| Error::DeviceOpenFailed {
                        path: path.clone(),
                        errno
                    })?;
                Self::emulate(&path, size, lbs, sim_zone_size)?
            }
        } else if md.file_type().is_file() {
            Self::emulate(&path, md.len(), Self::FILE_BLOCK_SIZE,
                          sim_zone_size)?
        } else {
            return Err(Error::DeviceOpenFailed {
                path,
                errno: Errno::ENODEV
            });
        };
        debug!(path = %path.display(), ?info, "Opened device");
        Ok(ZonedFile{file, path, info, backend})
    }

    /// Divide a device without native zones into emulated ones
    fn emulate(path: &Path, size: u64, block_size: u32,
               sim_zone_size: Option<NonZeroU64>)
        -> Result<(DeviceInfo, Backend)>
    {
        let open_err = |errno| Error::DeviceOpenFailed {
            path: path.to_path_buf(),
            errno
        };
        let zone_size = sim_zone_size.ok_or_else(|| open_err(Errno::EOPNOTSUPP))?
            .get();
        if zone_size % u64::from(block_size) != 0 || zone_size > size {
            return Err(open_err(Errno::EINVAL));
        }
        let nr_zones = ZoneT::try_from(size / zone_size)
            .map_err(|_| open_err(Errno::EFBIG))?;
        let table = ZoneTable::uniform(nr_zones, zone_size, zone_size,
                                       block_size);
        let info = DeviceInfo {
            logical_block_size: block_size,
            nr_zones,
            zone_size,
            size: u64::from(nr_zones) * zone_size,
            emulated: true
        };
        Ok((info, Backend::Emulated(table)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Widen a byte range to whole zones, clipped to the end of the device.
    fn zone_range(&self, start: u64, len: u64) -> (u64, u64) {
        let zs = self.info.zone_size;
        let first = start / zs * zs;
        let end = round_up(start.saturating_add(len), zs).min(self.info.size);
        (first, end.saturating_sub(first))
    }
}

impl ZoneStore for ZonedFile {
    fn info(&self) -> DeviceInfo {
        self.info
    }

    #[instrument(skip(self))]
    fn list_zones(&self, filter: ReportFilter) -> nix::Result<Vec<Zone>> {
        match &self.backend {
            Backend::Native => {
                let mut zones = native::report(self.file.as_raw_fd(),
                                               self.info.nr_zones)?;
                zones.retain(|z| filter.matches(z));
                Ok(zones)
            }
            Backend::Emulated(table) => Ok(table.report(filter))
        }
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> nix::Result<usize> {
        self.file.read_at(buf, offset)
            .map_err(|e| errno_of(&e))
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> nix::Result<usize> {
        match &mut self.backend {
            Backend::Native => {
                self.file.write_at(buf, offset)
                    .map_err(|e| errno_of(&e))
            }
            Backend::Emulated(table) => {
                let idx = table.check_write(offset, buf.len() as u64)?;
                let n = self.file.write_at(buf, offset)
                    .map_err(|e| errno_of(&e))?;
                table.commit_write(idx, n as u64);
                Ok(n)
            }
        }
    }

    #[instrument(skip(self))]
    fn reset_zones(&mut self, start: u64, len: u64) -> nix::Result<()> {
        if let Backend::Emulated(table) = &mut self.backend {
            return table.reset(start, len);
        }
        let (start, len) = self.zone_range(start, len);
        native::reset(self.file.as_raw_fd(), start, len)
    }

    #[instrument(skip(self))]
    fn finish_zones(&mut self, start: u64, len: u64) -> nix::Result<()> {
        if let Backend::Emulated(table) = &mut self.backend {
            return table.finish(start, len);
        }
        let (start, len) = self.zone_range(start, len);
        native::finish(self.file.as_raw_fd(), start, len)
    }
}

// LCOV_EXCL_STOP
