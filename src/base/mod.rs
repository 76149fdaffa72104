mod log;
mod closer;

pub use log::*;
pub use closer::*;
