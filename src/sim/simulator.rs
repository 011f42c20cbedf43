//! High-level simulation façade.
//!
//! Ties the pieces together the way a front end uses them: build a
//! spectrum from a molecule's atoms or an imported peak table, overlay
//! solvent signals, render, and record every operation in the session
//! log.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::molecule::Molecule;
use crate::data::peak::{Multiplicity, Nucleus, Peak};
use crate::data::solvent::Solvent;
use crate::data::spectrum::{NoiseConfig, NoiseModel, RenderError, Spectrum};
use crate::import::parser::{ParseReport, PeakTableParser};
use crate::log::session::SessionLog;

/// Fallback shift ranges (ppm) for atoms without measured data, per
/// nucleus. Drawn from the alkyl region, the most common environment.
const H1_ALKYL_RANGE: (f64, f64) = (0.8, 2.5);
const C13_ALKYL_RANGE: (f64, f64) = (10.0, 50.0);

/// Similarity metrics between two rendered spectra
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumComparison {
    /// Pearson correlation of the intensity arrays
    pub correlation: f64,
    pub peak_count_difference: usize,
}

/// NMR simulator: owns the measurement defaults and the session log.
#[derive(Debug)]
pub struct NmrSimulator {
    field_strength: f64,
    default_linewidth: f64,
    noise_level: f64,
    log: SessionLog,
    rng: StdRng,
}

impl NmrSimulator {
    pub fn new(field_strength: f64) -> Self {
        Self {
            field_strength,
            default_linewidth: 0.01,
            noise_level: 0.001,
            log: SessionLog::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded construction for reproducible shift estimation
    pub fn with_seed(field_strength: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(field_strength)
        }
    }

    pub fn field_strength(&self) -> f64 {
        self.field_strength
    }

    pub fn set_field_strength(&mut self, field_strength: f64) {
        self.field_strength = field_strength;
    }

    pub fn set_noise_level(&mut self, noise_level: f64) {
        self.noise_level = noise_level;
    }

    pub fn set_default_linewidth(&mut self, linewidth_ppm: f64) {
        self.default_linewidth = linewidth_ppm;
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn session_log_mut(&mut self) -> &mut SessionLog {
        &mut self.log
    }

    /// Simulate a rendered spectrum for the molecule's atoms of the given
    /// nucleus. Atoms without a measured shift get one estimated from the
    /// nucleus's alkyl region.
    pub fn simulate_spectrum(
        &mut self,
        molecule: &Molecule,
        nucleus: Nucleus,
    ) -> Result<Spectrum, RenderError> {
        let mut spectrum = Spectrum::new(nucleus.clone(), self.field_strength);
        let element = nucleus.element_symbol();

        let atoms: Vec<_> = molecule
            .atoms_by_element(element)
            .into_iter()
            .cloned()
            .collect();
        for atom in atoms {
            let shift = match atom.chemical_shift {
                Some(ppm) => ppm,
                None => self.estimate_shift(&nucleus),
            };
            let integration = atom.integration.unwrap_or(1.0);
            spectrum.add_peak(
                Peak::new(shift, integration)
                    .with_width(self.default_linewidth)
                    .with_multiplicity(atom.multiplicity.unwrap_or(Multiplicity::Singlet))
                    .with_coupling(atom.coupling_constants)
                    .with_integration(integration),
            );
        }

        if self.noise_level > 0.0 {
            spectrum.set_noise(Some(NoiseConfig {
                model: NoiseModel::Gaussian,
                level: self.noise_level,
                seed: None,
            }));
        }
        spectrum.render()?;

        self.log.add_entry(
            "Simulate",
            &format!(
                "{} spectrum of {} ({} peaks)",
                spectrum.nucleus(),
                molecule.display_name(),
                spectrum.peak_count()
            ),
            &format!("field={} MHz, linewidth={} ppm", self.field_strength, self.default_linewidth),
        );
        Ok(spectrum)
    }

    /// Overlay residual solvent signals onto a spectrum
    pub fn add_solvent_signals(&mut self, spectrum: &mut Spectrum, solvent: Solvent) {
        let signals = solvent.signals(spectrum.nucleus());
        let count = signals.len();
        for peak in signals {
            spectrum.add_peak(peak);
        }
        spectrum.set_solvent(Some(solvent.to_string()));
        self.log.add_entry(
            "Solvent",
            &format!("added {} {} signal(s)", count, solvent),
            &format!("solvent={}", solvent),
        );
    }

    /// Parse a textual peak table into a new (unrendered) spectrum.
    /// Malformed rows are reported in the returned `ParseReport`.
    pub fn import_peak_table(&mut self, text: &str, nucleus: Nucleus) -> (Spectrum, ParseReport) {
        let parser =
            PeakTableParser::new(nucleus.clone()).with_field_strength(self.field_strength);
        let report = parser.parse(text);
        let mut spectrum = Spectrum::new(nucleus, self.field_strength);
        for peak in &report.peaks {
            spectrum.add_peak(peak.clone());
        }
        self.log
            .add_entry("Import", &report.summary(), "format=auto");
        (spectrum, report)
    }

    /// Estimated shift for an atom lacking measured data
    fn estimate_shift(&mut self, nucleus: &Nucleus) -> f64 {
        let (lo, hi) = match nucleus {
            Nucleus::C13 => C13_ALKYL_RANGE,
            _ => H1_ALKYL_RANGE,
        };
        self.rng.random_range(lo..hi)
    }

    /// Compare two rendered spectra. Returns `None` when either spectrum
    /// is unrendered or the resolutions differ.
    pub fn compare_spectra(a: &Spectrum, b: &Spectrum) -> Option<SpectrumComparison> {
        let x = a.intensity_axis();
        let y = b.intensity_axis();
        if x.is_empty() || x.len() != y.len() {
            return None;
        }
        Some(SpectrumComparison {
            correlation: pearson(x, y),
            peak_count_difference: a.peak_count().abs_diff(b.peak_count()),
        })
    }
}

/// Pearson correlation coefficient; 0 for degenerate inputs
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom > 0.0 {
        cov / denom
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::molecule::Atom;

    fn ethanol() -> Molecule {
        let mut molecule = Molecule::from_name("ethanol");
        molecule.add_atom(
            Atom::new("H", 1)
                .with_shift(1.25)
                .with_multiplicity(Multiplicity::Triplet)
                .with_coupling(vec![7.0])
                .with_integration(3.0),
        );
        molecule.add_atom(
            Atom::new("H", 2)
                .with_shift(3.69)
                .with_multiplicity(Multiplicity::Quartet)
                .with_coupling(vec![7.0])
                .with_integration(2.0),
        );
        molecule.add_atom(Atom::new("H", 3).with_shift(5.32).with_integration(1.0));
        molecule.add_atom(Atom::new("C", 4).with_shift(18.3));
        molecule.add_atom(Atom::new("C", 5).with_shift(58.2));
        molecule
    }

    #[test]
    fn test_simulate_proton_spectrum() {
        let mut simulator = NmrSimulator::with_seed(400.0, 7);
        simulator.set_noise_level(0.0);
        let spectrum = simulator
            .simulate_spectrum(&ethanol(), Nucleus::H1)
            .unwrap();

        assert_eq!(spectrum.peak_count(), 3);
        assert!(!spectrum.intensity_axis().is_empty());
        assert_eq!(simulator.session_log().len(), 1);
        assert_eq!(simulator.session_log().entries[0].operation, "Simulate");
    }

    #[test]
    fn test_simulate_carbon_spectrum_only_carbons() {
        let mut simulator = NmrSimulator::with_seed(100.0, 7);
        simulator.set_noise_level(0.0);
        let spectrum = simulator
            .simulate_spectrum(&ethanol(), Nucleus::C13)
            .unwrap();
        assert_eq!(spectrum.peak_count(), 2);
    }

    #[test]
    fn test_atoms_without_shift_get_estimates() {
        let mut molecule = Molecule::from_name("mystery");
        molecule.add_atom(Atom::new("H", 1));
        let mut simulator = NmrSimulator::with_seed(400.0, 99);
        simulator.set_noise_level(0.0);
        let spectrum = simulator
            .simulate_spectrum(&molecule, Nucleus::H1)
            .unwrap();
        let (_, peak) = spectrum.peaks().next().unwrap();
        assert!(peak.chemical_shift >= 0.8 && peak.chemical_shift < 2.5);
    }

    #[test]
    fn test_solvent_overlay() {
        let mut simulator = NmrSimulator::with_seed(400.0, 7);
        simulator.set_noise_level(0.0);
        let mut spectrum = simulator
            .simulate_spectrum(&ethanol(), Nucleus::H1)
            .unwrap();
        let before = spectrum.peak_count();
        simulator.add_solvent_signals(&mut spectrum, Solvent::Cdcl3);
        assert_eq!(spectrum.peak_count(), before + 1);
        assert_eq!(spectrum.solvent(), Some("CDCl3"));
        assert!(spectrum.is_dirty());
    }

    #[test]
    fn test_import_peak_table_logs_summary() {
        let mut simulator = NmrSimulator::new(400.0);
        let (spectrum, report) =
            simulator.import_peak_table("7.265 70 1\nbad row here\n2.31 300 2", Nucleus::H1);
        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(spectrum.peak_count(), 2);
        assert!(simulator.session_log().entries[0]
            .description
            .contains("2 rows accepted"));
    }

    #[test]
    fn test_compare_identical_spectra() {
        let mut simulator = NmrSimulator::with_seed(400.0, 7);
        simulator.set_noise_level(0.0);
        let a = simulator.simulate_spectrum(&ethanol(), Nucleus::H1).unwrap();
        let b = simulator.simulate_spectrum(&ethanol(), Nucleus::H1).unwrap();

        let comparison = NmrSimulator::compare_spectra(&a, &b).unwrap();
        assert!((comparison.correlation - 1.0).abs() < 1e-9);
        assert_eq!(comparison.peak_count_difference, 0);
    }

    #[test]
    fn test_compare_requires_rendered_spectra() {
        let a = Spectrum::new(Nucleus::H1, 400.0);
        let b = Spectrum::new(Nucleus::H1, 400.0);
        assert!(NmrSimulator::compare_spectra(&a, &b).is_none());
    }
}
