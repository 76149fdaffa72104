mod cell;
mod region;

pub mod config;
pub mod env;
pub mod iterator;

pub use cell::*;
pub use config::{Configuration, StatsOptions, StatsOptionsBuilder};
pub use env::*;
pub use iterator::*;
pub use region::*;
