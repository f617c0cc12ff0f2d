pub mod config;
pub mod doctor;
pub mod environment;
pub mod events;
pub mod journal;
pub mod phases;
pub mod sequencer;

pub use config::*;
pub use doctor::*;
pub use environment::*;
pub use events::*;
pub use journal::*;
pub use phases::*;
pub use sequencer::*;
