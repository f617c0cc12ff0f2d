pub mod consolidate;
pub mod render;

pub use consolidate::*;
pub use render::*;
