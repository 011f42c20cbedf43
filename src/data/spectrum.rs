//! Spectrum container and aggregation.
//!
//! A `Spectrum` owns one ppm sampling axis and one intensity array and
//! accumulates every peak's synthesized line contributions into it. The
//! axis runs from high to low ppm, the NMR plotting convention, and the
//! cached arrays are invalidated whenever peaks or sampling configuration
//! change.
//!
//! Rendering is synchronous, CPU-bound, and single-threaded. The only
//! hazard is a re-entrant render triggered from an event-loop callback,
//! which the per-instance guard rejects. A multi-threaded host must wrap
//! each `Spectrum` in its own mutex, held across a render or peak-list
//! mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use super::peak::{Nucleus, Peak, PeakId};
use crate::synth::lineshape::LineShape;
use crate::synth::multiplet;

/// Default number of sample points across the ppm range
pub const DEFAULT_RESOLUTION: usize = 8192;

/// Intensity scale applied to solvent peaks at render time
pub const SOLVENT_RENDER_SCALE: f64 = 0.5;

/// Stochastic noise distribution family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseModel {
    Uniform,
    Gaussian,
}

/// Noise added to the rendered curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub model: NoiseModel,
    /// Amplitude as a fraction of the curve maximum, 0..=1
    pub level: f64,
    /// Fixed seed for reproducible renders; unseeded renders draw from
    /// the OS entropy source
    pub seed: Option<u64>,
}

/// Configuration faults fatal to a render call. The previously rendered
/// arrays are left untouched when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("resolution must be at least 1")]
    ZeroResolution,
    #[error("field strength must be positive, got {0} MHz")]
    NonPositiveFieldStrength(f64),
    #[error("ppm range must run from high to low, got ({0}, {1})")]
    InvalidPpmRange(f64, f64),
    #[error("noise level must be within 0..=1, got {0}")]
    InvalidNoiseLevel(f64),
    #[error("a render is already in progress")]
    RenderInProgress,
    #[error("spectrum has not been rendered")]
    NotRendered,
}

/// One simulated NMR trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    nucleus: Nucleus,
    /// Magnetic field strength in MHz
    field_strength: f64,
    solvent: Option<String>,
    /// (high, low) ppm bounds, descending
    ppm_range: (f64, f64),
    resolution: usize,
    line_shape: LineShape,
    noise: Option<NoiseConfig>,
    /// Insertion-ordered peak list; order is kept for deterministic
    /// rendering and export but carries no meaning
    peaks: Vec<(PeakId, Peak)>,
    next_peak_id: u64,
    ppm_axis: Vec<f64>,
    intensity_axis: Vec<f64>,
    dirty: bool,
    #[serde(skip)]
    render_in_progress: bool,
}

impl Spectrum {
    pub fn new(nucleus: Nucleus, field_strength: f64) -> Self {
        let ppm_range = nucleus.default_ppm_range();
        Self {
            nucleus,
            field_strength,
            solvent: None,
            ppm_range,
            resolution: DEFAULT_RESOLUTION,
            line_shape: LineShape::Lorentzian,
            noise: None,
            peaks: Vec::new(),
            next_peak_id: 1,
            ppm_axis: Vec::new(),
            intensity_axis: Vec::new(),
            dirty: true,
            render_in_progress: false,
        }
    }

    pub fn nucleus(&self) -> &Nucleus {
        &self.nucleus
    }

    pub fn field_strength(&self) -> f64 {
        self.field_strength
    }

    pub fn solvent(&self) -> Option<&str> {
        self.solvent.as_deref()
    }

    pub fn ppm_range(&self) -> (f64, f64) {
        self.ppm_range
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn line_shape(&self) -> LineShape {
        self.line_shape
    }

    pub fn noise(&self) -> Option<NoiseConfig> {
        self.noise
    }

    /// Whether the cached arrays are out of date
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sampled ppm positions from the last render, descending
    pub fn ppm_axis(&self) -> &[f64] {
        &self.ppm_axis
    }

    /// Sampled intensities from the last render
    pub fn intensity_axis(&self) -> &[f64] {
        &self.intensity_axis
    }

    pub fn set_field_strength(&mut self, field_strength: f64) {
        self.field_strength = field_strength;
        self.dirty = true;
    }

    pub fn set_ppm_range(&mut self, high: f64, low: f64) {
        self.ppm_range = (high, low);
        self.dirty = true;
    }

    pub fn set_resolution(&mut self, resolution: usize) {
        self.resolution = resolution;
        self.dirty = true;
    }

    pub fn set_line_shape(&mut self, line_shape: LineShape) {
        self.line_shape = line_shape;
        self.dirty = true;
    }

    pub fn set_noise(&mut self, noise: Option<NoiseConfig>) {
        self.noise = noise;
        self.dirty = true;
    }

    /// Solvent name is provenance only and does not invalidate the render
    pub fn set_solvent(&mut self, solvent: Option<String>) {
        self.solvent = solvent;
    }

    /// Add a peak, returning its stable id
    pub fn add_peak(&mut self, peak: Peak) -> PeakId {
        let id = PeakId(self.next_peak_id);
        self.next_peak_id += 1;
        self.peaks.push((id, peak));
        self.dirty = true;
        id
    }

    /// Add a bare peak with per-nucleus default width
    pub fn add_peak_simple(&mut self, chemical_shift: f64, intensity: f64) -> PeakId {
        let width = self.nucleus.default_width();
        self.add_peak(Peak::new(chemical_shift, intensity).with_width(width))
    }

    pub fn peak(&self, id: PeakId) -> Option<&Peak> {
        self.peaks.iter().find(|(pid, _)| *pid == id).map(|(_, p)| p)
    }

    /// Replace a peak wholesale; edits always produce a fresh synthesis
    pub fn update_peak(&mut self, id: PeakId, peak: Peak) -> bool {
        for (pid, slot) in &mut self.peaks {
            if *pid == id {
                *slot = peak;
                self.dirty = true;
                return true;
            }
        }
        false
    }

    pub fn remove_peak(&mut self, id: PeakId) -> Option<Peak> {
        let idx = self.peaks.iter().position(|(pid, _)| *pid == id)?;
        let (_, peak) = self.peaks.remove(idx);
        self.dirty = true;
        Some(peak)
    }

    pub fn clear_peaks(&mut self) {
        self.peaks.clear();
        self.dirty = true;
    }

    pub fn peak_count(&self) -> usize {
        self.peaks.len()
    }

    pub fn peaks(&self) -> impl Iterator<Item = (PeakId, &Peak)> {
        self.peaks.iter().map(|(id, p)| (*id, p))
    }

    /// Total integration over non-solvent peaks
    pub fn total_integration(&self) -> f64 {
        self.peaks
            .iter()
            .filter(|(_, p)| !p.is_solvent)
            .map(|(_, p)| p.integration)
            .sum()
    }

    /// Maximum rendered intensity
    pub fn max_intensity(&self) -> f64 {
        self.intensity_axis.iter().fold(0.0f64, |a, &b| a.max(b))
    }

    /// Non-fatal plausibility warnings for peak shifts outside the
    /// nucleus's usual window
    pub fn shift_warnings(&self) -> Vec<String> {
        let Some((lo, hi)) = self.nucleus.plausible_shift_range() else {
            return Vec::new();
        };
        self.peaks
            .iter()
            .enumerate()
            .filter(|(_, (_, p))| p.chemical_shift < lo || p.chemical_shift > hi)
            .map(|(i, (_, p))| {
                format!(
                    "peak {}: unusual {} chemical shift ({:.2} ppm)",
                    i + 1,
                    self.nucleus,
                    p.chemical_shift
                )
            })
            .collect()
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.resolution == 0 {
            return Err(RenderError::ZeroResolution);
        }
        if self.field_strength <= 0.0 {
            return Err(RenderError::NonPositiveFieldStrength(self.field_strength));
        }
        let (high, low) = self.ppm_range;
        if !(high > low) {
            return Err(RenderError::InvalidPpmRange(high, low));
        }
        if let Some(noise) = self.noise {
            if !(0.0..=1.0).contains(&noise.level) {
                return Err(RenderError::InvalidNoiseLevel(noise.level));
            }
        }
        Ok(())
    }

    /// ppm sample positions, strictly descending across the range
    fn build_axis(&self) -> Vec<f64> {
        let (high, low) = self.ppm_range;
        let n = self.resolution;
        if n == 1 {
            return vec![high];
        }
        let step = (high - low) / (n - 1) as f64;
        (0..n).map(|i| high - step * i as f64).collect()
    }

    /// Recompute the intensity array as the sum of all peaks' line
    /// contributions, then apply the nucleus visibility floor and the
    /// configured noise.
    ///
    /// A nested call while a render is in flight is rejected with
    /// `RenderError::RenderInProgress` instead of overwriting the shared
    /// arrays mid-build. With noise disabled, re-rendering an unchanged
    /// spectrum reproduces the arrays bit for bit.
    pub fn render(&mut self) -> Result<(), RenderError> {
        if self.render_in_progress {
            return Err(RenderError::RenderInProgress);
        }
        self.validate()?;
        self.render_in_progress = true;

        let shape = self.line_shape;
        let field = self.field_strength;
        let axis = self.build_axis();
        let mut data = vec![0.0; axis.len()];

        for (_, peak) in &self.peaks {
            let weight = if peak.is_solvent {
                SOLVENT_RENDER_SCALE
            } else {
                1.0
            };
            for line in multiplet::expand_peak(peak, field) {
                shape.accumulate(
                    &axis,
                    &mut data,
                    line.offset_ppm,
                    line.height * weight,
                    peak.render_width(),
                );
            }
        }

        if let Some(floor) = self.nucleus.intensity_floor() {
            apply_intensity_floor(&mut data, floor);
        }
        if let Some(noise) = self.noise {
            add_noise(&mut data, noise);
        }

        self.ppm_axis = axis;
        self.intensity_axis = data;
        self.dirty = false;
        self.render_in_progress = false;
        Ok(())
    }

    /// Render only when the cached arrays are stale
    pub fn render_if_dirty(&mut self) -> Result<(), RenderError> {
        if self.dirty {
            self.render()
        } else {
            Ok(())
        }
    }
}

/// Rescale the curve so its maximum reaches `floor` when it falls short.
/// Relative peak ratios are unchanged.
fn apply_intensity_floor(data: &mut [f64], floor: f64) {
    let max = data.iter().fold(0.0f64, |a, &b| a.max(b));
    if max > 0.0 && max < floor {
        let scale = floor / max;
        for v in data.iter_mut() {
            *v *= scale;
        }
    }
}

/// Add per-sample random perturbation scaled to the curve maximum
fn add_noise(data: &mut [f64], config: NoiseConfig) {
    if config.level <= 0.0 {
        return;
    }
    let max = data.iter().fold(0.0f64, |a, &b| a.max(b));
    let amplitude = max * config.level;
    if amplitude <= 0.0 {
        return;
    }
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    match config.model {
        NoiseModel::Uniform => {
            for v in data.iter_mut() {
                *v += rng.random_range(-amplitude..amplitude);
            }
        }
        NoiseModel::Gaussian => {
            let Ok(dist) = Normal::new(0.0, amplitude) else {
                return;
            };
            for v in data.iter_mut() {
                *v += dist.sample(&mut rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::peak::Multiplicity;

    #[test]
    fn test_axis_is_strictly_descending() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(1024);
        spectrum.add_peak_simple(7.26, 1.0);
        spectrum.render().unwrap();

        let axis = spectrum.ppm_axis();
        assert_eq!(axis.len(), 1024);
        assert_eq!(axis[0], 12.0);
        assert!(axis[axis.len() - 1].abs() < 1e-9);
        for pair in axis.windows(2) {
            assert!(pair[0] > pair[1], "axis must descend: {:?}", pair);
        }
    }

    #[test]
    fn test_render_is_idempotent_without_noise() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(2048);
        spectrum.add_peak(
            Peak::new(1.25, 3.0)
                .with_multiplicity(Multiplicity::Triplet)
                .with_coupling(vec![7.0]),
        );
        spectrum.render().unwrap();
        let first = spectrum.intensity_axis().to_vec();
        spectrum.render().unwrap();
        assert_eq!(first, spectrum.intensity_axis());
    }

    #[test]
    fn test_c13_floor_rescales_to_exactly_100() {
        let mut spectrum = Spectrum::new(Nucleus::C13, 100.0);
        spectrum.set_resolution(4096);
        spectrum.add_peak_simple(128.4, 2.0);
        spectrum.add_peak_simple(21.4, 1.0);
        spectrum.render().unwrap();

        let max = spectrum.max_intensity();
        assert!((max - 100.0).abs() < 1e-9, "floored max was {}", max);

        // Ratios preserved against an unfloored render of the same peaks
        let mut reference = Spectrum::new(Nucleus::H1, 100.0);
        reference.set_ppm_range(220.0, 0.0);
        reference.set_resolution(4096);
        reference.add_peak(Peak::new(128.4, 2.0).with_width(Nucleus::C13.default_width()));
        reference.add_peak(Peak::new(21.4, 1.0).with_width(Nucleus::C13.default_width()));
        reference.render().unwrap();

        let scale = max / reference.max_intensity();
        for (a, b) in spectrum
            .intensity_axis()
            .iter()
            .zip(reference.intensity_axis())
        {
            assert!((a - b * scale).abs() < 1e-6);
        }
    }

    #[test]
    fn test_c13_floor_leaves_strong_spectra_alone() {
        let mut spectrum = Spectrum::new(Nucleus::C13, 100.0);
        spectrum.set_resolution(2048);
        spectrum.add_peak_simple(77.0, 500.0);
        spectrum.render().unwrap();
        assert!(spectrum.max_intensity() >= 400.0);
    }

    #[test]
    fn test_lorentzian_area_tracks_intensity() {
        // Trapezoid areas of two otherwise-identical peaks scale with
        // their intensities.
        let mut a = Spectrum::new(Nucleus::H1, 400.0);
        a.set_resolution(16384);
        a.add_peak(Peak::new(6.0, 1.0).with_width(0.02));
        a.render().unwrap();

        let mut b = Spectrum::new(Nucleus::H1, 400.0);
        b.set_resolution(16384);
        b.add_peak(Peak::new(6.0, 3.0).with_width(0.02));
        b.render().unwrap();

        let area = |s: &Spectrum| -> f64 {
            let step = 12.0 / 16383.0;
            s.intensity_axis().iter().sum::<f64>() * step
        };
        let ratio = area(&b) / area(&a);
        assert!((ratio - 3.0).abs() < 1e-6, "area ratio was {}", ratio);
    }

    #[test]
    fn test_invalid_config_is_fatal_and_preserves_arrays() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(512);
        spectrum.add_peak_simple(7.26, 1.0);
        spectrum.render().unwrap();
        let before = spectrum.intensity_axis().to_vec();

        spectrum.set_ppm_range(0.0, 12.0);
        assert_eq!(
            spectrum.render(),
            Err(RenderError::InvalidPpmRange(0.0, 12.0))
        );
        assert_eq!(before, spectrum.intensity_axis());

        spectrum.set_ppm_range(12.0, 0.0);
        spectrum.set_field_strength(-1.0);
        assert!(matches!(
            spectrum.render(),
            Err(RenderError::NonPositiveFieldStrength(_))
        ));

        spectrum.set_field_strength(400.0);
        spectrum.set_resolution(0);
        assert_eq!(spectrum.render(), Err(RenderError::ZeroResolution));
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let make = || {
            let mut s = Spectrum::new(Nucleus::H1, 400.0);
            s.set_resolution(1024);
            s.add_peak_simple(2.1, 1.0);
            s.set_noise(Some(NoiseConfig {
                model: NoiseModel::Gaussian,
                level: 0.05,
                seed: Some(42),
            }));
            s.render().unwrap();
            s.intensity_axis().to_vec()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_noise_level_out_of_range_rejected() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.add_peak_simple(1.0, 1.0);
        spectrum.set_noise(Some(NoiseConfig {
            model: NoiseModel::Uniform,
            level: 1.5,
            seed: None,
        }));
        assert_eq!(spectrum.render(), Err(RenderError::InvalidNoiseLevel(1.5)));
    }

    #[test]
    fn test_peak_identity_and_editing() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        let a = spectrum.add_peak_simple(1.0, 1.0);
        let b = spectrum.add_peak_simple(2.0, 1.0);
        assert_ne!(a, b);

        let edited = Peak::new(1.5, 2.0);
        assert!(spectrum.update_peak(a, edited.clone()));
        assert_eq!(spectrum.peak(a), Some(&edited));
        assert!(spectrum.is_dirty());

        assert!(spectrum.remove_peak(b).is_some());
        assert!(spectrum.remove_peak(b).is_none());
        assert_eq!(spectrum.peak_count(), 1);
    }

    #[test]
    fn test_solvent_peaks_reduced_and_excluded_from_totals() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(4096);
        spectrum.add_peak(Peak::new(7.26, 1.0).as_solvent());
        spectrum.render().unwrap();
        let solvent_max = spectrum.max_intensity();

        let mut plain = Spectrum::new(Nucleus::H1, 400.0);
        plain.set_resolution(4096);
        plain.add_peak(Peak::new(7.26, 1.0));
        plain.render().unwrap();

        assert!((solvent_max - plain.max_intensity() * SOLVENT_RENDER_SCALE).abs() < 1e-9);

        spectrum.add_peak(Peak::new(2.0, 1.0).with_integration(3.0));
        assert_eq!(spectrum.total_integration(), 3.0);
    }

    #[test]
    fn test_shift_warnings() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.add_peak_simple(7.2, 1.0);
        spectrum.add_peak_simple(25.0, 1.0);
        let warnings = spectrum.shift_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("25.00"));
    }

    #[test]
    fn test_gaussian_shape_selectable() {
        let mut gaussian = Spectrum::new(Nucleus::H1, 400.0);
        gaussian.set_resolution(4096);
        gaussian.set_line_shape(LineShape::Gaussian);
        gaussian.add_peak_simple(6.0, 1.0);
        gaussian.render().unwrap();

        let mut lorentzian = gaussian.clone();
        lorentzian.set_line_shape(LineShape::Lorentzian);
        lorentzian.render().unwrap();

        // Gaussian tails decay faster than Lorentzian ones
        let far = gaussian
            .ppm_axis()
            .iter()
            .position(|&p| p < 5.0)
            .unwrap_or(0);
        assert!(gaussian.intensity_axis()[far] < lorentzian.intensity_axis()[far]);
    }
}
