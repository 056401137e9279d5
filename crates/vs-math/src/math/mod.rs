//! Core math modules.

pub mod binomial;
pub mod exponential;
pub mod stable;
pub mod summary;
