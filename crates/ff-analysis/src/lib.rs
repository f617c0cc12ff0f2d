pub mod parse;
pub mod results;
pub mod tsk;
pub mod volatility;

pub use parse::*;
pub use results::*;
pub use tsk::*;
pub use volatility::*;
