//! Serializable snapshots for external export formatters.

pub mod snapshot;

pub use snapshot::{PeakRecord, SpectrumSnapshot};
