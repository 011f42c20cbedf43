//! Format and unit adapters: textual peak-table parsing and Hz/ppm
//! conversion.

pub mod parser;
pub mod units;

pub use parser::{ParseError, ParseReport, PeakTableParser, RowError, RowFormat};
pub use units::{hz_to_ppm, ppm_to_hz, try_hz_to_ppm, try_ppm_to_hz, UnitError};
