pub mod layout;
pub mod manifest;
pub mod recorder;

pub use layout::*;
pub use manifest::*;
pub use recorder::*;
