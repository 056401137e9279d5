//! Schema versioning for machine-readable output.

/// Version of the JSON report envelope.
///
/// Bumped when a field is removed or changes meaning; additions keep it.
pub const SCHEMA_VERSION: &str = "1.0.0";
