//! Export snapshot.
//!
//! External writers (CSV/TXT tables, JCAMP-DX, Bruker-style lists, static
//! images) consume this serializable capture of a rendered spectrum: the
//! axis pair plus the full peak table. Nothing here reaches back into the
//! synthesizer.

use serde::{Deserialize, Serialize};

use crate::data::peak::{Peak, PeakId};
use crate::data::spectrum::{RenderError, Spectrum};

/// One peak-table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub peak_id: u64,
    pub chemical_shift: f64,
    pub intensity: f64,
    pub width: f64,
    /// Short abbreviation ("s", "t", "dd", ...)
    pub multiplicity: String,
    pub coupling_constants: Vec<f64>,
    pub integration: f64,
    pub is_solvent: bool,
    pub assignment: Option<String>,
}

impl PeakRecord {
    fn from_peak(id: PeakId, peak: &Peak) -> Self {
        Self {
            peak_id: id.0,
            chemical_shift: peak.chemical_shift,
            intensity: peak.intensity,
            width: peak.width,
            multiplicity: peak.multiplicity.abbreviation().to_string(),
            coupling_constants: peak.coupling_constants.clone(),
            integration: peak.integration,
            is_solvent: peak.is_solvent,
            assignment: peak.assignment.clone(),
        }
    }
}

/// Serializable capture of a rendered spectrum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumSnapshot {
    pub nucleus: String,
    pub field_strength: f64,
    pub solvent: Option<String>,
    /// Descending ppm sample positions
    pub ppm_axis: Vec<f64>,
    pub intensity_axis: Vec<f64>,
    pub peaks: Vec<PeakRecord>,
}

impl SpectrumSnapshot {
    /// Capture a rendered spectrum. Fails with `NotRendered` when the
    /// cached arrays are stale or missing.
    pub fn capture(spectrum: &Spectrum) -> Result<Self, RenderError> {
        if spectrum.is_dirty() || spectrum.intensity_axis().is_empty() {
            return Err(RenderError::NotRendered);
        }
        Ok(Self {
            nucleus: spectrum.nucleus().to_string(),
            field_strength: spectrum.field_strength(),
            solvent: spectrum.solvent().map(str::to_string),
            ppm_axis: spectrum.ppm_axis().to_vec(),
            intensity_axis: spectrum.intensity_axis().to_vec(),
            peaks: spectrum
                .peaks()
                .map(|(id, peak)| PeakRecord::from_peak(id, peak))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::peak::{Multiplicity, Nucleus};

    #[test]
    fn test_capture_requires_render() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.add_peak_simple(7.26, 1.0);
        assert!(matches!(
            SpectrumSnapshot::capture(&spectrum),
            Err(RenderError::NotRendered)
        ));
        spectrum.render().unwrap();
        assert!(SpectrumSnapshot::capture(&spectrum).is_ok());
    }

    #[test]
    fn test_snapshot_carries_axis_pair_and_peak_table() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(512);
        spectrum.add_peak(
            Peak::new(1.25, 3.0)
                .with_multiplicity(Multiplicity::Triplet)
                .with_coupling(vec![7.0])
                .with_integration(3.0),
        );
        spectrum.render().unwrap();

        let snapshot = SpectrumSnapshot::capture(&spectrum).unwrap();
        assert_eq!(snapshot.nucleus, "1H");
        assert_eq!(snapshot.ppm_axis.len(), 512);
        assert_eq!(snapshot.intensity_axis.len(), 512);
        assert_eq!(snapshot.peaks.len(), 1);
        assert_eq!(snapshot.peaks[0].multiplicity, "t");
        assert_eq!(snapshot.peaks[0].coupling_constants, vec![7.0]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut spectrum = Spectrum::new(Nucleus::H1, 400.0);
        spectrum.set_resolution(64);
        spectrum.add_peak_simple(2.1, 1.0);
        spectrum.render().unwrap();

        let snapshot = SpectrumSnapshot::capture(&spectrum).unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: SpectrumSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.peaks.len(), 1);
        assert_eq!(parsed.ppm_axis.len(), 64);
    }
}
