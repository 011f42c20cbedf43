//! Multiplet reconstruction from ungrouped line lists.
//!
//! Tabulated or scraped spectra often report every multiplet line as its
//! own row. This module walks the sorted line positions, clusters lines
//! whose gaps stay within a region-aware tolerance, and checks each
//! cluster's intensity profile against the binomial envelope expected of a
//! first-order multiplet. Clusters that fail the check are split at the
//! worst-fitting boundary, so two accidentally-adjacent singlets do not
//! masquerade as a doublet.
//!
//! The heuristic is approximate: it recovers the common first-order
//! cases (doublet through quartet) and reports everything else as an
//! unresolved multiplet. Each group carries its binomial-fit residual so
//! a consumer can flag low-confidence assignments instead of trusting
//! them silently.

use serde::{Deserialize, Serialize};

use crate::data::peak::{Multiplicity, Peak};

/// One ungrouped spectral line, as imported from tabulated data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub position_ppm: f64,
    pub intensity: f64,
}

impl LineRecord {
    pub fn new(position_ppm: f64, intensity: f64) -> Self {
        Self {
            position_ppm,
            intensity,
        }
    }
}

/// Grouping tolerances. Aromatic multiplets sit closer together than
/// aliphatic ones, so the gap window narrows above 7 ppm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Gap tolerance above 7 ppm, in ppm
    pub aromatic_window: f64,
    /// Gap tolerance below 3 ppm, in ppm
    pub aliphatic_window: f64,
    /// Maximum per-line deviation from the binomial envelope before a
    /// cluster is split
    pub ratio_tolerance: f64,
    /// Maximum relative spread (std/mean) of adjacent gaps before a
    /// cluster is reported as an unresolved multiplet
    pub spacing_tolerance: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            aromatic_window: 0.05,
            aliphatic_window: 0.1,
            ratio_tolerance: 0.3,
            spacing_tolerance: 0.4,
        }
    }
}

impl GroupingConfig {
    /// Gap window at the given chemical shift
    fn window_at(&self, shift_ppm: f64) -> f64 {
        if shift_ppm > 7.0 {
            self.aromatic_window
        } else if shift_ppm > 3.0 {
            (self.aromatic_window + self.aliphatic_window) / 2.0
        } else {
            self.aliphatic_window
        }
    }
}

/// A reconstructed multiplet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipletGroup {
    /// Member lines, ascending by position
    pub lines: Vec<LineRecord>,
    /// Intensity-weighted mean position, ppm
    pub center_ppm: f64,
    pub multiplicity: Multiplicity,
    /// Mean adjacent spacing converted to Hz; absent for single lines
    /// and coincident stacks
    pub coupling_hz: Option<f64>,
    /// RMS deviation from the binomial envelope; lower is more confident
    pub ratio_residual: f64,
    /// Estimated relative nucleus count
    pub integration: f64,
    /// Suggested linewidth for re-synthesis, ppm
    pub linewidth: f64,
}

impl MultipletGroup {
    /// Total intensity of the member lines
    pub fn total_intensity(&self) -> f64 {
        self.lines.iter().map(|l| l.intensity).sum()
    }

    /// Position span of the member lines, ppm
    pub fn span_ppm(&self) -> f64 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => last.position_ppm - first.position_ppm,
            _ => 0.0,
        }
    }

    /// Bridge back into the peak model for re-synthesis
    pub fn to_peak(&self) -> Peak {
        Peak::new(self.center_ppm, self.total_intensity())
            .with_width(self.linewidth)
            .with_multiplicity(self.multiplicity.clone())
            .with_coupling(self.coupling_hz.into_iter().collect())
            .with_integration(self.integration)
    }
}

/// Partition ungrouped lines into multiplets.
///
/// Never fails: an empty input yields an empty output, and degenerate
/// clusters (all lines coincident) come back as a single group.
pub fn group_lines(
    lines: &[LineRecord],
    field_strength_mhz: f64,
    config: &GroupingConfig,
) -> Vec<MultipletGroup> {
    if lines.is_empty() {
        return Vec::new();
    }
    let mut sorted = lines.to_vec();
    sorted.sort_by(|a, b| a.position_ppm.total_cmp(&b.position_ppm));
    let total_intensity: f64 = sorted.iter().map(|l| l.intensity).sum();

    // Gap walk over the sorted positions
    let mut clusters: Vec<Vec<LineRecord>> = Vec::new();
    let mut current: Vec<LineRecord> = Vec::new();
    let mut prev_position = f64::NEG_INFINITY;
    for line in sorted {
        let window = config.window_at(line.position_ppm);
        if current.is_empty() || line.position_ppm - prev_position <= window {
            prev_position = line.position_ppm;
            current.push(line);
        } else {
            clusters.push(std::mem::take(&mut current));
            prev_position = line.position_ppm;
            current.push(line);
        }
    }
    clusters.push(current);

    // Intensity-ratio refinement
    let mut refined: Vec<Vec<LineRecord>> = Vec::new();
    for cluster in clusters {
        split_by_ratio(cluster, config, &mut refined);
    }

    refined
        .into_iter()
        .map(|cluster| annotate(cluster, field_strength_mhz, config, total_intensity))
        .collect()
}

/// Convenience wrapper producing peaks directly
pub fn group_lines_to_peaks(
    lines: &[LineRecord],
    field_strength_mhz: f64,
    config: &GroupingConfig,
) -> Vec<Peak> {
    group_lines(lines, field_strength_mhz, config)
        .iter()
        .map(MultipletGroup::to_peak)
        .collect()
}

/// Fit quality of a cluster against the binomial envelope for its size
struct BinomialFit {
    rms_residual: f64,
    max_deviation: f64,
}

fn binomial_fit(lines: &[LineRecord]) -> BinomialFit {
    let n = lines.len();
    if n < 2 {
        return BinomialFit {
            rms_residual: 0.0,
            max_deviation: 0.0,
        };
    }
    let coeffs = binomial_row(n - 1);
    let max_coeff = coeffs.iter().fold(0.0f64, |a, &b| a.max(b));
    let max_height = lines.iter().fold(0.0f64, |a, l| a.max(l.intensity));
    if max_height <= 0.0 {
        return BinomialFit {
            rms_residual: 0.0,
            max_deviation: 0.0,
        };
    }
    let mut sum_sq = 0.0;
    let mut max_deviation = 0.0f64;
    for (line, coeff) in lines.iter().zip(&coeffs) {
        let deviation = (line.intensity / max_height - coeff / max_coeff).abs();
        sum_sq += deviation * deviation;
        max_deviation = max_deviation.max(deviation);
    }
    BinomialFit {
        rms_residual: (sum_sq / n as f64).sqrt(),
        max_deviation,
    }
}

/// Row k of Pascal's triangle as floats: k=2 → [1, 2, 1]
fn binomial_row(k: usize) -> Vec<f64> {
    let mut row = vec![1.0];
    for _ in 0..k {
        let mut next = vec![1.0; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

/// Recursively split clusters whose intensity profile does not match a
/// binomial pattern. The split lands at the boundary of maximal ratio
/// deviation; ties go to the split with the smaller span-to-gap variance,
/// since natural coupling patterns are evenly spaced.
fn split_by_ratio(cluster: Vec<LineRecord>, config: &GroupingConfig, out: &mut Vec<Vec<LineRecord>>) {
    if cluster.len() < 2 {
        out.push(cluster);
        return;
    }
    // A stack of coincident lines is degenerate but still one group
    let span = cluster[cluster.len() - 1].position_ppm - cluster[0].position_ppm;
    if span < 1e-12 {
        out.push(cluster);
        return;
    }
    let fit = binomial_fit(&cluster);
    if fit.max_deviation <= config.ratio_tolerance {
        out.push(cluster);
        return;
    }
    let split_idx = choose_split(&cluster);
    if split_idx == 0 || split_idx >= cluster.len() {
        out.push(cluster);
        return;
    }
    let mut left = cluster;
    let right = left.split_off(split_idx);
    split_by_ratio(left, config, out);
    split_by_ratio(right, config, out);
}

/// Boundary whose adjacent intensity ratio deviates most from the
/// binomial expectation
fn choose_split(lines: &[LineRecord]) -> usize {
    let n = lines.len();
    let coeffs = binomial_row(n - 1);
    let mut deviations = Vec::with_capacity(n - 1);
    for i in 1..n {
        let expected = coeffs[i] / coeffs[i - 1];
        let actual = if lines[i - 1].intensity > 0.0 {
            lines[i].intensity / lines[i - 1].intensity
        } else {
            f64::INFINITY
        };
        let deviation = if actual.is_finite() && actual > 0.0 {
            (actual.ln() - expected.ln()).abs()
        } else {
            f64::INFINITY
        };
        deviations.push((i, deviation));
    }
    let max_deviation = deviations
        .iter()
        .map(|(_, d)| *d)
        .fold(f64::NEG_INFINITY, f64::max);
    let candidates: Vec<usize> = deviations
        .iter()
        .filter(|(_, d)| *d >= max_deviation - 1e-9)
        .map(|(i, _)| *i)
        .collect();
    if candidates.len() == 1 {
        return candidates[0];
    }
    candidates
        .into_iter()
        .min_by(|&a, &b| {
            split_gap_variance(lines, a).total_cmp(&split_gap_variance(lines, b))
        })
        .unwrap_or(1)
}

/// Combined relative gap variance of the two sides of a candidate split
fn split_gap_variance(lines: &[LineRecord], idx: usize) -> f64 {
    relative_gap_variance(&lines[..idx]) + relative_gap_variance(&lines[idx..])
}

fn relative_gap_variance(lines: &[LineRecord]) -> f64 {
    let gaps: Vec<f64> = lines
        .windows(2)
        .map(|w| w[1].position_ppm - w[0].position_ppm)
        .collect();
    if gaps.len() < 2 {
        return 0.0;
    }
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let var = gaps.iter().map(|g| (g - mean) * (g - mean)).sum::<f64>() / gaps.len() as f64;
    var / (mean * mean)
}

fn annotate(
    lines: Vec<LineRecord>,
    field_strength_mhz: f64,
    config: &GroupingConfig,
    total_intensity: f64,
) -> MultipletGroup {
    let n = lines.len();
    let group_intensity: f64 = lines.iter().map(|l| l.intensity).sum();

    let center_ppm = if group_intensity > 0.0 {
        lines
            .iter()
            .map(|l| l.position_ppm * l.intensity)
            .sum::<f64>()
            / group_intensity
    } else {
        lines.iter().map(|l| l.position_ppm).sum::<f64>() / n as f64
    };

    let gaps: Vec<f64> = lines
        .windows(2)
        .map(|w| w[1].position_ppm - w[0].position_ppm)
        .collect();
    let mean_gap = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f64>() / gaps.len() as f64
    };

    let irregular = if gaps.len() >= 2 && mean_gap > 0.0 {
        let var = gaps.iter().map(|g| (g - mean_gap) * (g - mean_gap)).sum::<f64>()
            / gaps.len() as f64;
        var.sqrt() / mean_gap > config.spacing_tolerance
    } else {
        false
    };

    let multiplicity = if irregular {
        Multiplicity::Multiplet
    } else {
        Multiplicity::from_line_count(n)
    };
    let coupling_hz = if n >= 2 && mean_gap > 0.0 {
        Some(mean_gap * field_strength_mhz)
    } else {
        None
    };

    let fit = binomial_fit(&lines);

    MultipletGroup {
        center_ppm,
        multiplicity,
        coupling_hz,
        ratio_residual: fit.rms_residual,
        integration: estimate_integration(group_intensity, total_intensity),
        linewidth: estimate_linewidth(center_ppm),
        lines,
    }
}

/// Share of total intensity against a nominal 15-proton spectrum,
/// rounded, with a floor of 1
fn estimate_integration(group_intensity: f64, total_intensity: f64) -> f64 {
    const TYPICAL_TOTAL_PROTONS: f64 = 15.0;
    if total_intensity <= 0.0 {
        return 1.0;
    }
    let protons = group_intensity / total_intensity * TYPICAL_TOTAL_PROTONS;
    protons.round().max(1.0)
}

/// Region-based linewidth suggestion: aromatic multiplets are narrow,
/// NH and aliphatic signals slightly broader
fn estimate_linewidth(center_ppm: f64) -> f64 {
    if center_ppm > 8.0 {
        0.003
    } else if center_ppm > 7.0 {
        0.002
    } else {
        0.003
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet_lines(center: f64, delta: f64, scale: f64) -> Vec<LineRecord> {
        vec![
            LineRecord::new(center - delta, scale),
            LineRecord::new(center, 2.0 * scale),
            LineRecord::new(center + delta, scale),
        ]
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(group_lines(&[], 400.0, &GroupingConfig::default()).is_empty());
    }

    #[test]
    fn test_triplet_round_trip() {
        let delta = 7.0 / 400.0;
        let lines = triplet_lines(1.25, delta, 70.0);
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.lines.len(), 3);
        assert_eq!(group.multiplicity, Multiplicity::Triplet);
        let j = group.coupling_hz.unwrap();
        assert!((j - 7.0).abs() < 0.1, "inferred J was {}", j);
        assert!((group.center_ppm - 1.25).abs() < 1e-9);
        assert!(group.ratio_residual < 0.05);
    }

    #[test]
    fn test_quartet_recognized() {
        let delta = 7.0 / 400.0;
        let lines = vec![
            LineRecord::new(3.70 - 1.5 * delta, 25.0),
            LineRecord::new(3.70 - 0.5 * delta, 75.0),
            LineRecord::new(3.70 + 0.5 * delta, 75.0),
            LineRecord::new(3.70 + 1.5 * delta, 25.0),
        ];
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].multiplicity, Multiplicity::Quartet);
    }

    #[test]
    fn test_five_or_more_lines_reported_as_multiplet() {
        let delta = 2.0 / 400.0;
        let lines: Vec<LineRecord> = [1.0, 4.0, 6.0, 4.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &h)| LineRecord::new(2.5 + i as f64 * delta, h * 10.0))
            .collect();
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].multiplicity, Multiplicity::Multiplet);
    }

    #[test]
    fn test_adjacent_singlets_split_by_ratio_check() {
        // Two nearby lines with a 10:1 intensity ratio cannot be one
        // doublet
        let lines = vec![
            LineRecord::new(2.00, 300.0),
            LineRecord::new(2.04, 30.0),
        ];
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 2);
        assert!(groups
            .iter()
            .all(|g| g.multiplicity == Multiplicity::Singlet));
    }

    #[test]
    fn test_distant_lines_not_grouped() {
        let lines = vec![
            LineRecord::new(1.25, 100.0),
            LineRecord::new(2.31, 100.0),
            LineRecord::new(7.26, 100.0),
        ];
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_coincident_lines_form_single_group() {
        let lines = vec![
            LineRecord::new(3.0, 10.0),
            LineRecord::new(3.0, 10.0),
            LineRecord::new(3.0, 10.0),
        ];
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].coupling_hz, None);
    }

    #[test]
    fn test_irregular_spacing_demoted_to_multiplet() {
        let lines = vec![
            LineRecord::new(1.200, 100.0),
            LineRecord::new(1.205, 200.0),
            LineRecord::new(1.250, 100.0),
        ];
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].multiplicity, Multiplicity::Multiplet);
    }

    #[test]
    fn test_aromatic_window_tighter_than_aliphatic() {
        // 0.07 ppm apart: grouped in the aliphatic region, separate in
        // the aromatic region
        let aliphatic = vec![LineRecord::new(1.20, 100.0), LineRecord::new(1.27, 100.0)];
        let aromatic = vec![LineRecord::new(7.20, 100.0), LineRecord::new(7.27, 100.0)];
        let config = GroupingConfig::default();
        assert_eq!(group_lines(&aliphatic, 400.0, &config).len(), 1);
        assert_eq!(group_lines(&aromatic, 400.0, &config).len(), 2);
    }

    #[test]
    fn test_integration_estimate_scales_with_share() {
        let delta = 7.0 / 400.0;
        let mut lines = triplet_lines(1.25, delta, 100.0);
        lines.push(LineRecord::new(7.26, 100.0));
        let groups = group_lines(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(groups.len(), 2);
        // The triplet carries 4x the intensity of the singlet
        assert!(groups[0].integration > groups[1].integration);
    }

    #[test]
    fn test_group_to_peak_bridge() {
        let delta = 7.0 / 400.0;
        let lines = triplet_lines(1.25, delta, 70.0);
        let peaks = group_lines_to_peaks(&lines, 400.0, &GroupingConfig::default());
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].multiplicity, Multiplicity::Triplet);
        assert!((peaks[0].chemical_shift - 1.25).abs() < 1e-9);
        assert_eq!(peaks[0].coupling_constants.len(), 1);
    }
}
