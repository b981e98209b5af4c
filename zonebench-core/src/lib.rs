// vim: tw=80

pub mod buffer;
pub mod driver;
pub mod fill;
pub mod lifecycle;
pub mod mem_store;
pub mod recorder;
pub mod store;
pub mod types;
pub mod util;
pub mod writer;
pub mod zone;
pub mod zone_table;
pub mod zoned_file;

pub use crate::types::*;
pub use crate::util::*;
