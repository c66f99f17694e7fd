//! CLI command implementations.

pub mod bind;
pub mod bt;
pub mod compile;
pub mod test;
