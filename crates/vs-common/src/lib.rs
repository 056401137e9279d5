//! votescope common types and errors.
//!
//! This crate provides foundational types shared across vs-core modules:
//! - Observation records as fetched from the dataset
//! - The unified error type with stable codes
//! - Output formats and schema versioning

pub mod error;
pub mod observation;
pub mod output;
pub mod schema;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use observation::{Observation, ObservationId, ObservationSet};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
