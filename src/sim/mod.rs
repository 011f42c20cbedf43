//! Simulation façade and spectrum comparison.

pub mod simulator;

pub use simulator::{NmrSimulator, SpectrumComparison};
