//! Peak model: nuclei, multiplicities, and individual resonances.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Minimum visible curve maximum for 13C spectra, in relative units.
/// Uncoupled carbon data carries systematically weak intensities; after
/// summation the whole curve is rescaled up to this floor when its maximum
/// falls short (relative peak ratios are preserved).
pub const C13_INTENSITY_FLOOR: f64 = 100.0;

/// Width multiplier applied when rendering broad labels.
pub const BROAD_WIDTH_FACTOR: f64 = 4.0;

/// Nucleus type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Nucleus {
    H1,
    C13,
    N15,
    F19,
    P31,
    Other(String),
}

impl Nucleus {
    /// Default plot range as (high, low) ppm, descending per NMR convention
    pub fn default_ppm_range(&self) -> (f64, f64) {
        match self {
            Nucleus::H1 => (12.0, 0.0),
            Nucleus::C13 => (220.0, 0.0),
            _ => (15.0, 0.0),
        }
    }

    /// Default linewidth at half height, in ppm
    pub fn default_width(&self) -> f64 {
        match self {
            Nucleus::C13 => 0.5,
            _ => 0.01,
        }
    }

    /// Minimum visibility floor for the rendered curve, if any
    pub fn intensity_floor(&self) -> Option<f64> {
        match self {
            Nucleus::C13 => Some(C13_INTENSITY_FLOOR),
            _ => None,
        }
    }

    /// Element symbol observed by this nucleus ("H", "C", ...)
    pub fn element_symbol(&self) -> &str {
        match self {
            Nucleus::H1 => "H",
            Nucleus::C13 => "C",
            Nucleus::N15 => "N",
            Nucleus::F19 => "F",
            Nucleus::P31 => "P",
            Nucleus::Other(_) => "",
        }
    }

    /// Plausible chemical-shift bounds (ppm) for sanity warnings
    pub fn plausible_shift_range(&self) -> Option<(f64, f64)> {
        match self {
            Nucleus::H1 => Some((-5.0, 20.0)),
            Nucleus::C13 => Some((-20.0, 250.0)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Nucleus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nucleus::H1 => write!(f, "1H"),
            Nucleus::C13 => write!(f, "13C"),
            Nucleus::N15 => write!(f, "15N"),
            Nucleus::F19 => write!(f, "19F"),
            Nucleus::P31 => write!(f, "31P"),
            Nucleus::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for Nucleus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "1H" | "H1" | "H" => Nucleus::H1,
            "13C" | "C13" | "C" => Nucleus::C13,
            "15N" | "N15" | "N" => Nucleus::N15,
            "19F" | "F19" | "F" => Nucleus::F19,
            "31P" | "P31" | "P" => Nucleus::P31,
            other => Nucleus::Other(other.to_string()),
        })
    }
}

/// Line-splitting pattern of a resonance.
///
/// Unknown labels are carried as `Other` and render as singlets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Multiplicity {
    Singlet,
    BroadSinglet,
    Doublet,
    Triplet,
    Quartet,
    Quintet,
    Sextet,
    Septet,
    DoubletOfDoublets,
    DoubletOfTriplets,
    TripletOfDoublets,
    DoubletOfQuartets,
    Multiplet,
    Other(String),
}

impl Multiplicity {
    /// Line counts of the nested first-order pattern, outermost first.
    ///
    /// A doublet of triplets is `[2, 3]`; a plain quartet is `[4]`.
    /// Labels that do not split (singlet, multiplet, unknown) are empty.
    pub fn branch_counts(&self) -> &'static [usize] {
        match self {
            Multiplicity::Doublet => &[2],
            Multiplicity::Triplet => &[3],
            Multiplicity::Quartet => &[4],
            Multiplicity::Quintet => &[5],
            Multiplicity::Sextet => &[6],
            Multiplicity::Septet => &[7],
            Multiplicity::DoubletOfDoublets => &[2, 2],
            Multiplicity::DoubletOfTriplets => &[2, 3],
            Multiplicity::TripletOfDoublets => &[3, 2],
            Multiplicity::DoubletOfQuartets => &[2, 4],
            _ => &[],
        }
    }

    /// Whether this label implies coupling-driven splitting
    pub fn splits(&self) -> bool {
        !self.branch_counts().is_empty()
    }

    /// Broad labels render with an enlarged width
    pub fn is_broad(&self) -> bool {
        matches!(self, Multiplicity::BroadSinglet)
    }

    /// Short SDBS-style abbreviation ("s", "dd", "quin", ...)
    pub fn abbreviation(&self) -> &str {
        match self {
            Multiplicity::Singlet => "s",
            Multiplicity::BroadSinglet => "bs",
            Multiplicity::Doublet => "d",
            Multiplicity::Triplet => "t",
            Multiplicity::Quartet => "q",
            Multiplicity::Quintet => "quin",
            Multiplicity::Sextet => "sext",
            Multiplicity::Septet => "sept",
            Multiplicity::DoubletOfDoublets => "dd",
            Multiplicity::DoubletOfTriplets => "dt",
            Multiplicity::TripletOfDoublets => "td",
            Multiplicity::DoubletOfQuartets => "dq",
            Multiplicity::Multiplet => "m",
            Multiplicity::Other(s) => s,
        }
    }

    /// Name for a grouped line count; five or more lines are reported as
    /// an unresolved multiplet.
    pub fn from_line_count(n: usize) -> Multiplicity {
        match n {
            0 | 1 => Multiplicity::Singlet,
            2 => Multiplicity::Doublet,
            3 => Multiplicity::Triplet,
            4 => Multiplicity::Quartet,
            _ => Multiplicity::Multiplet,
        }
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Multiplicity::Singlet => write!(f, "singlet"),
            Multiplicity::BroadSinglet => write!(f, "broad singlet"),
            Multiplicity::Doublet => write!(f, "doublet"),
            Multiplicity::Triplet => write!(f, "triplet"),
            Multiplicity::Quartet => write!(f, "quartet"),
            Multiplicity::Quintet => write!(f, "quintet"),
            Multiplicity::Sextet => write!(f, "sextet"),
            Multiplicity::Septet => write!(f, "septet"),
            Multiplicity::DoubletOfDoublets => write!(f, "doublet of doublets"),
            Multiplicity::DoubletOfTriplets => write!(f, "doublet of triplets"),
            Multiplicity::TripletOfDoublets => write!(f, "triplet of doublets"),
            Multiplicity::DoubletOfQuartets => write!(f, "doublet of quartets"),
            Multiplicity::Multiplet => write!(f, "multiplet"),
            Multiplicity::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Multiplicity {
    fn from(label: &str) -> Self {
        let norm = label.trim().to_lowercase().replace(' ', "");
        match norm.as_str() {
            "s" | "singlet" => Multiplicity::Singlet,
            "br" | "bs" | "brs" | "broad" | "broadsinglet" => Multiplicity::BroadSinglet,
            "d" | "doublet" => Multiplicity::Doublet,
            "t" | "triplet" => Multiplicity::Triplet,
            "q" | "quartet" => Multiplicity::Quartet,
            "quin" | "qui" | "quint" | "quintet" | "p" => Multiplicity::Quintet,
            "sext" | "sex" | "sextet" => Multiplicity::Sextet,
            "sept" | "sep" | "hept" | "septet" => Multiplicity::Septet,
            "dd" => Multiplicity::DoubletOfDoublets,
            "dt" => Multiplicity::DoubletOfTriplets,
            "td" => Multiplicity::TripletOfDoublets,
            "dq" => Multiplicity::DoubletOfQuartets,
            "m" | "multiplet" => Multiplicity::Multiplet,
            _ => Multiplicity::Other(label.trim().to_string()),
        }
    }
}

/// Stable handle for a peak held by a `Spectrum`. Peaks are addressed by
/// id, never by matching field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeakId(pub u64);

impl std::fmt::Display for PeakId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One reported resonance, possibly a multiplet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Chemical shift in ppm
    pub chemical_shift: f64,
    /// Relative intensity
    pub intensity: f64,
    /// Linewidth at half height, in ppm
    pub width: f64,
    pub multiplicity: Multiplicity,
    /// J values in Hz, one per coupling partner
    pub coupling_constants: Vec<f64>,
    /// Relative nucleus count, annotation only
    pub integration: f64,
    /// Solvent peaks render at reduced weight and are excluded from
    /// integration totals
    pub is_solvent: bool,
    /// Optional assignment label from teaching-style tables ("A", "B", ...)
    #[serde(default)]
    pub assignment: Option<String>,
}

impl Peak {
    /// A bare singlet with default 1H width
    pub fn new(chemical_shift: f64, intensity: f64) -> Self {
        Self {
            chemical_shift,
            intensity,
            width: 0.01,
            multiplicity: Multiplicity::Singlet,
            coupling_constants: Vec::new(),
            integration: 1.0,
            is_solvent: false,
            assignment: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn with_coupling(mut self, coupling_hz: Vec<f64>) -> Self {
        self.coupling_constants = coupling_hz;
        self
    }

    pub fn with_integration(mut self, integration: f64) -> Self {
        self.integration = integration;
        self
    }

    pub fn as_solvent(mut self) -> Self {
        self.is_solvent = true;
        self
    }

    /// Effective rendering width; broad labels are widened
    pub fn render_width(&self) -> f64 {
        if self.multiplicity.is_broad() {
            self.width * BROAD_WIDTH_FACTOR
        } else {
            self.width
        }
    }

    /// Display-formatted annotation label, e.g.
    /// `δ 1.25 (triplet, 3H, J = 7.0 Hz)`
    pub fn label(&self) -> String {
        let mut out = format!(
            "δ {:.2} ({}, {:.0}H",
            self.chemical_shift, self.multiplicity, self.integration
        );
        if !self.coupling_constants.is_empty() {
            let js = self
                .coupling_constants
                .iter()
                .map(|j| format!("{:.1}", j))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(", J = {} Hz", js));
        }
        out.push(')');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplicity_abbreviations_round_trip() {
        for label in ["s", "d", "t", "q", "quin", "sext", "sept", "dd", "dt", "td", "dq", "m"] {
            let m = Multiplicity::from(label);
            assert!(
                !matches!(m, Multiplicity::Other(_)),
                "{} should map to a known multiplicity",
                label
            );
        }
        assert_eq!(Multiplicity::from("br s"), Multiplicity::BroadSinglet);
        assert_eq!(Multiplicity::from("T"), Multiplicity::Triplet);
        assert!(matches!(Multiplicity::from("xyz"), Multiplicity::Other(_)));
    }

    #[test]
    fn test_branch_counts() {
        assert_eq!(Multiplicity::Triplet.branch_counts(), &[3]);
        assert_eq!(Multiplicity::DoubletOfTriplets.branch_counts(), &[2, 3]);
        assert!(Multiplicity::Singlet.branch_counts().is_empty());
        assert!(Multiplicity::Multiplet.branch_counts().is_empty());
    }

    #[test]
    fn test_nucleus_defaults() {
        assert_eq!(Nucleus::H1.default_ppm_range(), (12.0, 0.0));
        assert_eq!(Nucleus::C13.default_ppm_range(), (220.0, 0.0));
        assert!(Nucleus::C13.default_width() > Nucleus::H1.default_width());
        assert_eq!(Nucleus::C13.intensity_floor(), Some(100.0));
        assert_eq!(Nucleus::H1.intensity_floor(), None);
    }

    #[test]
    fn test_peak_label() {
        let peak = Peak::new(1.25, 3.0)
            .with_multiplicity(Multiplicity::Triplet)
            .with_coupling(vec![7.0])
            .with_integration(3.0);
        assert_eq!(peak.label(), "δ 1.25 (triplet, 3H, J = 7.0 Hz)");
    }

    #[test]
    fn test_broad_render_width() {
        let peak = Peak::new(8.1, 1.0).with_multiplicity(Multiplicity::BroadSinglet);
        assert!((peak.render_width() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_nucleus_from_str() {
        assert_eq!("1h".parse::<Nucleus>().ok(), Some(Nucleus::H1));
        assert_eq!("C13".parse::<Nucleus>().ok(), Some(Nucleus::C13));
    }
}
