//! Coupling-pattern expansion.
//!
//! A declared multiplicity is lowered to a sequence of binomial doublet
//! splittings, one per coupling partner. Each splitting divides every
//! existing line in two at ±J/2 (converted to ppm) with half the height;
//! coincident lines merge. Repeating a constant reproduces the classic
//! binomial patterns (two equal splittings give a 1:2:1 triplet), and
//! chaining unequal constants gives the nested patterns (dd, dt, ...)
//! without special-casing each combination.

use crate::data::peak::{Multiplicity, Peak};

/// Tolerance for merging coincident lines, in ppm
const MERGE_EPS: f64 = 1e-9;

/// One elementary resonance line produced by multiplet expansion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Absolute position in ppm
    pub offset_ppm: f64,
    /// Height in the same relative units as the parent peak intensity
    pub height: f64,
}

/// Lower a multiplicity and its coupling constants to doublet splittings
/// in Hz.
///
/// An n-line branch contributes n-1 equal splittings of its constant.
/// Branches consume constants in order; when the list runs short the
/// remaining branches collapse, and when it runs long each extra constant
/// keeps splitting as one more doublet. An empty constant list collapses
/// the whole pattern to a singlet.
pub fn splitting_pattern(multiplicity: &Multiplicity, coupling_hz: &[f64]) -> Vec<f64> {
    let counts = multiplicity.branch_counts();
    if counts.is_empty() || coupling_hz.is_empty() {
        return Vec::new();
    }
    let mut splits = Vec::new();
    for (i, &n) in counts.iter().enumerate() {
        match coupling_hz.get(i) {
            Some(&j) => splits.extend(std::iter::repeat(j).take(n.saturating_sub(1))),
            None => break,
        }
    }
    for &j in coupling_hz.iter().skip(counts.len()) {
        splits.push(j);
    }
    splits
}

/// Expand a peak into elementary lines at the given field strength.
///
/// Pure in its inputs: the same peak and field strength always produce
/// the same lines, and the line heights sum to the peak intensity.
/// Unrecognized multiplicity labels fall back to a single line.
pub fn expand_peak(peak: &Peak, field_strength_mhz: f64) -> Vec<Line> {
    if let Multiplicity::Other(label) = &peak.multiplicity {
        log::warn!("unrecognized multiplicity '{}', rendering as singlet", label);
    }
    let splits = splitting_pattern(&peak.multiplicity, &peak.coupling_constants);

    let mut lines = vec![Line {
        offset_ppm: peak.chemical_shift,
        height: peak.intensity,
    }];
    for j in splits {
        let delta = j / field_strength_mhz;
        let mut next = Vec::with_capacity(lines.len() * 2);
        for line in &lines {
            next.push(Line {
                offset_ppm: line.offset_ppm - delta / 2.0,
                height: line.height / 2.0,
            });
            next.push(Line {
                offset_ppm: line.offset_ppm + delta / 2.0,
                height: line.height / 2.0,
            });
        }
        lines = merge_coincident(next);
    }
    lines
}

/// Merge lines whose positions coincide, summing their heights
fn merge_coincident(mut lines: Vec<Line>) -> Vec<Line> {
    lines.sort_by(|a, b| a.offset_ppm.total_cmp(&b.offset_ppm));
    let mut merged: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.last_mut() {
            Some(last) if (line.offset_ppm - last.offset_ppm).abs() < MERGE_EPS => {
                last.height += line.height;
            }
            _ => merged.push(line),
        }
    }
    merged
}
