// vim: tw=80
//! Fill planning: how many bytes to write to reach a target zone occupancy

use std::{
    fmt,
    str::FromStr,
};
use crate::{
    types::*,
    util::round_up,
};

/// A validated fill target: more than 0% and at most 100%.
///
/// Stored as a percentage, so whole-number percentages stay exact in
/// floating-point arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct FillFraction(f64);

impl FillFraction {
    pub fn from_percent(pct: f64) -> Result<Self> {
        if pct.is_finite() && pct > 0.0 && pct <= 100.0 {
            Ok(FillFraction(pct))
        } else {
            Err(Error::InvalidFraction(pct))
        }
    }

    pub fn from_fraction(fraction: f64) -> Result<Self> {
        if fraction.is_finite() && fraction > 0.0 && fraction <= 1.0 {
            Ok(FillFraction((fraction * 100.0).min(100.0)))
        } else {
            Err(Error::InvalidFraction(fraction * 100.0))
        }
    }

    pub fn percent(self) -> f64 {
        self.0
    }

    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }

    /// Bytes needed to fill this fraction of `capacity`, rounded up to a
    /// multiple of `alignment`.
    ///
    /// The result is not bounded by `capacity`: rounding may overshoot it by
    /// less than one `alignment` unit.
    pub fn bytes_for(self, capacity: u64, alignment: u64) -> Result<u64> {
        if alignment == 0 {
            return Err(Error::InvalidChunkSize{size: 0, align: 1});
        }
        let raw = (self.0 * capacity as f64 / 100.0).floor() as u64;
        Ok(round_up(raw, alignment))
    }

    /// How many of `total` items make up this fraction, rounded up
    pub fn zones_of(self, total: ZoneT) -> ZoneT {
        (f64::from(total) * self.0 / 100.0).ceil() as ZoneT
    }
}

impl fmt::Display for FillFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Parses a percentage, like "50" or "12.5"
impl FromStr for FillFraction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pct = s.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| Error::InvalidFraction(f64::NAN))?;
        FillFraction::from_percent(pct)
    }
}

/// Compute the exact number of bytes to write to fill `fraction` of a zone.
///
/// Like [`FillFraction::bytes_for`], but takes the target as a fraction.
///
/// * `capacity`:   Writable bytes in the zone
/// * `fraction`:   Target fill fraction, `0 < fraction <= 1`
/// * `alignment`:  I/O alignment unit.  The result is a multiple of it.
pub fn plan(capacity: u64, fraction: f64, alignment: u64) -> Result<u64> {
    FillFraction::from_fraction(fraction)?.bytes_for(capacity, alignment)
}

// LCOV_EXCL_STOP
