mod allocation;
mod interference;
mod occupancy;
mod util;

use util::*;
