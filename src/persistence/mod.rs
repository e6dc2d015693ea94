//! Persistence Layer
//!
//! The accounts file is the only persistent state. It is read fully,
//! mutated in memory and written back wholesale.

pub mod json_store;
pub mod memory_store;
