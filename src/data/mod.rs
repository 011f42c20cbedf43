//! Core data model: peaks, spectra, molecules, and solvent signals.

pub mod molecule;
pub mod peak;
pub mod solvent;
pub mod spectrum;

pub use molecule::{Atom, Molecule, MoleculeKind};
pub use peak::{Multiplicity, Nucleus, Peak, PeakId};
pub use solvent::Solvent;
pub use spectrum::{NoiseConfig, NoiseModel, RenderError, Spectrum};
