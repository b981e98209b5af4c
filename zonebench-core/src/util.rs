// vim: tw=80
//! Common utility functions used throughout zonebench

use std::ops::{Add, Div, Mul, Sub};

/// Linux block device ioctls always count in 512-byte sectors, regardless of
/// the device's logical block size.
pub const BYTES_PER_SECTOR: u64 = 512;

/// Logical block size used for emulated zones on regular files.
pub const BYTES_PER_LBA: u32 = 4096;

/// Divide two unsigned numbers (usually integers), rounding up.
pub fn div_roundup<T>(dividend: T, divisor: T) -> T
    where T: Add<Output=T> + Copy + Div<Output=T> + From<u8> + Sub<Output=T>
{
    (dividend + divisor - T::from(1u8)) / divisor
}

/// Round `n` up to the nearest multiple of `align`.
pub fn round_up<T>(n: T, align: T) -> T
    where T: Add<Output=T> + Copy + Div<Output=T> + From<u8> + Mul<Output=T> +
             Sub<Output=T>
{
    div_roundup(n, align) * align
}

// LCOV_EXCL_STOP
