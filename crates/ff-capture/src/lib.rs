//! Evidence capture: memory image, disk regions or full image, native system inventory,
//! and the capture → digest → protect → duplicate → verify protocol for full images.

pub mod copier;
pub mod disk;
pub mod executor;
pub mod integrity;
pub mod memory;
pub mod sysinfo;

pub use copier::*;
pub use disk::*;
pub use executor::*;
pub use integrity::*;
pub use memory::*;
pub use sysinfo::*;
