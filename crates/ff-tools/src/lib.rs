pub mod catalog;
pub mod install;
pub mod locate;
pub mod manager;
pub mod process;

pub use catalog::*;
pub use install::*;
pub use locate::*;
pub use manager::*;
pub use process::*;
