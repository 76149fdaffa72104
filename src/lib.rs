pub mod base;
pub mod status;
pub mod storage;
pub mod stats;

pub type Result<T> = std::result::Result<T, Status>;

pub use crate::status::*;
