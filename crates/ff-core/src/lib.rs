pub mod engine;
pub mod error;
pub mod ids;
pub mod journal;
pub mod model;
pub mod outcomes;
pub mod types;

pub use engine::*;
pub use error::*;
pub use ids::*;
pub use journal::*;
pub use model::*;
pub use outcomes::*;
pub use types::*;
