//! YAML/JSON parsing support

pub mod diagnostics;

pub use diagnostics::SnapshotSyntaxError;
