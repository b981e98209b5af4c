// vim: tw=80
//! Zone directory types: per-zone metadata as reported by a device

use enum_primitive_derive::Primitive;
use std::{
    fmt,
    str::FromStr,
};
use crate::types::*;

/// Type of a zone, as encoded by the Linux `blkzoned` ABI.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Primitive)]
pub enum ZoneType {
    /// Random writes allowed.  No write pointer.
    Conventional        = 1,
    /// Writes must be sequential, at the write pointer.
    SeqWriteRequired    = 2,
    /// Sequential writes preferred, random writes tolerated.
    SeqWritePreferred   = 3,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Conventional => f.pad("CONV"),
            Self::SeqWriteRequired => f.pad("SWR"),
            Self::SeqWritePreferred => f.pad("SWP"),
        }
    }
}

/// Condition of a zone.  Maintained by the device, never by zonebench.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Primitive)]
pub enum ZoneCondition {
    /// Conventional zones have no write pointer
    NotWp           = 0x0,
    Empty           = 0x1,
    ImplicitOpen    = 0x2,
    ExplicitOpen    = 0x3,
    Closed          = 0x4,
    ReadOnly        = 0xD,
    Full            = 0xE,
    Offline         = 0xF,
}

impl fmt::Display for ZoneCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NotWp => f.pad("not-wp"),
            Self::Empty => f.pad("empty"),
            Self::ImplicitOpen => f.pad("imp-open"),
            Self::ExplicitOpen => f.pad("exp-open"),
            Self::Closed => f.pad("closed"),
            Self::ReadOnly => f.pad("ro"),
            Self::Full => f.pad("full"),
            Self::Offline => f.pad("offline"),
        }
    }
}

/// A snapshot of one zone's metadata.  All quantities are in bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Zone {
    /// Byte offset of the zone on the device
    pub start: u64,
    /// Total extent of the zone
    pub length: u64,
    /// Maximum writable bytes.  May be less than `length`.
    pub capacity: u64,
    pub write_pointer: u64,
    pub zone_type: ZoneType,
    pub condition: ZoneCondition,
}

impl Zone {
    /// Create an empty sequential-write-required zone
    pub fn empty(start: u64, length: u64, capacity: u64) -> Self {
        Zone {
            start,
            length,
            capacity,
            write_pointer: start,
            zone_type: ZoneType::SeqWriteRequired,
            condition: ZoneCondition::Empty
        }
    }

    /// Create a conventional zone
    pub fn conventional(start: u64, length: u64) -> Self {
        Zone {
            start,
            length,
            capacity: length,
            write_pointer: start,
            zone_type: ZoneType::Conventional,
            condition: ZoneCondition::NotWp
        }
    }

    /// First byte past the writable part of the zone
    pub fn capacity_end(&self) -> u64 {
        self.start + self.capacity
    }

    /// First byte past the end of the zone
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    /// Is this a valid fill target?
    pub fn is_sequential(&self) -> bool {
        self.zone_type == ZoneType::SeqWriteRequired
    }

    /// Does the zone overlap the byte range `[start, start + len)`?
    pub fn overlaps(&self, start: u64, len: u64) -> bool {
        self.start < start.saturating_add(len) && start < self.end()
    }
}

/// Static properties of an opened device
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DeviceInfo {
    /// Minimum I/O alignment, in bytes
    pub logical_block_size: u32,
    pub nr_zones: ZoneT,
    /// Size of every zone (except possibly the last), in bytes
    pub zone_size: u64,
    /// Size of the device, in bytes
    pub size: u64,
    /// Are the zones emulated by zonebench rather than the device?
    pub emulated: bool,
}

impl DeviceInfo {
    /// Device-order index of the given zone
    pub fn zone_index(&self, zone: &Zone) -> ZoneT {
        (zone.start / self.zone_size) as ZoneT
    }
}

/// Selects which zones a zone query reports
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFilter {
    #[default]
    All,
    Empty,
    ImplicitOpen,
    ExplicitOpen,
    Closed,
    Full,
    ReadOnly,
    Offline,
    NotWp,
    /// Every zone that can still be read: neither read-only nor offline
    Usable,
}

impl ReportFilter {
    pub fn matches(self, zone: &Zone) -> bool {
        let c = zone.condition;
        match self {
            Self::All => true,
            Self::Empty => c == ZoneCondition::Empty,
            Self::ImplicitOpen => c == ZoneCondition::ImplicitOpen,
            Self::ExplicitOpen => c == ZoneCondition::ExplicitOpen,
            Self::Closed => c == ZoneCondition::Closed,
            Self::Full => c == ZoneCondition::Full,
            Self::ReadOnly => c == ZoneCondition::ReadOnly,
            Self::Offline => c == ZoneCondition::Offline,
            Self::NotWp => c == ZoneCondition::NotWp,
            Self::Usable => c != ZoneCondition::ReadOnly &&
                c != ZoneCondition::Offline,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseFilterError(String);

impl fmt::Display for ParseFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid zone filter {:?}", self.0)
    }
}

impl std::error::Error for ParseFilterError {}

impl FromStr for ReportFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> std::result::Result<Self, ParseFilterError> {
        match s {
            "all" => Ok(Self::All),
            "empty" => Ok(Self::Empty),
            "imp-open" => Ok(Self::ImplicitOpen),
            "exp-open" => Ok(Self::ExplicitOpen),
            "closed" => Ok(Self::Closed),
            "full" => Ok(Self::Full),
            "ro" => Ok(Self::ReadOnly),
            "offline" => Ok(Self::Offline),
            "not-wp" => Ok(Self::NotWp),
            "usable" => Ok(Self::Usable),
            _ => Err(ParseFilterError(s.to_owned()))
        }
    }
}

// LCOV_EXCL_STOP
