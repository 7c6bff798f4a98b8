//! Row structs and DTOs, one module per table family.

pub mod audit;
pub mod item;
pub mod trigger;
