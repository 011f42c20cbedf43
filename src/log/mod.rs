//! Session provenance logging.

pub mod session;

pub use session::{LogEntry, SessionLog};
