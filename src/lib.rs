//! NMR spectrum simulation from peak-list data.
//!
//! This crate turns tabulated peak data (chemical shift, intensity,
//! multiplicity, coupling constants) into sampled line-shape spectra for
//! plotting and export, and reconstructs multiplet structure from
//! ungrouped line lists such as raw database tables.
//!
//! The pipeline: raw text or scraped records pass through the
//! [`import`] adapters into [`data::Peak`] lists, ungrouped lines go
//! through the [`grouping`] engine, the [`synth`] module expands each
//! peak into first-order multiplet lines and renders them as Lorentzian
//! or Gaussian curves, and [`data::Spectrum`] accumulates everything on
//! one descending ppm axis. [`export::SpectrumSnapshot`] hands the result
//! to external formatters, and the [`sim`] façade wires the steps
//! together with session logging.

pub mod data;
pub mod export;
pub mod grouping;
pub mod import;
pub mod log;
pub mod sim;
pub mod synth;

pub use crate::data::molecule::{Atom, Molecule, MoleculeKind};
pub use crate::data::peak::{Multiplicity, Nucleus, Peak, PeakId};
pub use crate::data::solvent::Solvent;
pub use crate::data::spectrum::{NoiseConfig, NoiseModel, RenderError, Spectrum};
pub use crate::export::snapshot::SpectrumSnapshot;
pub use crate::grouping::{group_lines, GroupingConfig, LineRecord, MultipletGroup};
pub use crate::import::parser::{ParseReport, PeakTableParser, RowFormat};
pub use crate::log::session::SessionLog;
pub use crate::sim::simulator::NmrSimulator;
pub use crate::synth::lineshape::LineShape;
