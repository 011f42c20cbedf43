//! Textual peak-table parsing.
//!
//! Peak tables arrive in several coexisting layouts with no format tag:
//!
//! - `shift intensity peak#`: `7.265 70 1`
//! - `Hz ppm intensity`: `2903.20 7.265 70`
//! - assignment letter then shift: `A 7.6`
//! - literature notation: `7.36 (s, 5H)`, `1.25 (t, J = 7.0 Hz, 3H)`
//!
//! The three-number layouts are told apart by magnitude: a leading value
//! above 50 with a second value below 20 reads as a frequency offset in
//! Hz, while a leading value below 50 followed by a larger second value
//! reads as a chemical shift with its intensity. This is a documented
//! heuristic, not a guarantee; rows that fit no layout are reported back
//! with their content rather than silently misassigned, and parsing of
//! the remaining rows continues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::peak::{Multiplicity, Nucleus, Peak};
use crate::import::units;

/// Base intensity assigned to assignment-letter rows, scaled by the
/// region's nominal integration
const ASSIGNMENT_BASE_INTENSITY: f64 = 1000.0;

/// Recognized row layouts. The layout is a construction-time choice;
/// auto-detection classifies each row independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowFormat {
    /// `shift intensity peak#`, e.g. `7.265 70 1`
    ShiftIntensityIndex,
    /// `Hz ppm intensity`, e.g. `2903.20 7.265 70`
    HzPpmIntensity,
    /// Assignment letter then shift, e.g. `A 7.6`
    Assignment,
    /// Literature notation, e.g. `1.25 (t, J = 7.0 Hz, 3H)`
    Literature,
}

/// Why a row was rejected
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseError {
    #[error("row matches no recognized layout")]
    UnrecognizedLayout,
    #[error("row does not match the requested layout")]
    LayoutMismatch,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("ambiguous numeric layout: values fit no magnitude heuristic")]
    AmbiguousLayout,
}

/// A rejected row with its original content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row number after line/semicolon splitting
    pub row_number: usize,
    pub content: String,
    pub error: ParseError,
}

/// Outcome of parsing one peak table. Malformed rows never abort the
/// table; they are collected here alongside the accepted peaks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseReport {
    pub peaks: Vec<Peak>,
    pub rejected: Vec<RowError>,
}

impl ParseReport {
    pub fn accepted_count(&self) -> usize {
        self.peaks.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows accepted, {} rejected",
            self.peaks.len(),
            self.rejected.len()
        )
    }
}

/// Parses free-form textual peak tables into peaks.
#[derive(Debug, Clone)]
pub struct PeakTableParser {
    nucleus: Nucleus,
    field_strength: Option<f64>,
    format: Option<RowFormat>,
}

impl PeakTableParser {
    /// Auto-detecting parser with no field strength
    pub fn new(nucleus: Nucleus) -> Self {
        Self {
            nucleus,
            field_strength: None,
            format: None,
        }
    }

    pub fn with_field_strength(mut self, field_strength_mhz: f64) -> Self {
        self.field_strength = Some(field_strength_mhz);
        self
    }

    /// Pin the row layout instead of auto-detecting
    pub fn with_format(mut self, format: RowFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Parse a whole table, splitting rows on newlines and semicolons.
    pub fn parse(&self, text: &str) -> ParseReport {
        let mut report = ParseReport::default();
        let mut row_number = 0;
        for raw in text.split(['\n', ';']) {
            let row = strip_row_prefixes(raw);
            if row.is_empty() {
                continue;
            }
            row_number += 1;
            match self.parse_row(row) {
                Ok(peak) => report.peaks.push(peak),
                Err(error) => {
                    log::warn!("peak table row {} rejected ({}): {}", row_number, error, row);
                    report.rejected.push(RowError {
                        row_number,
                        content: row.to_string(),
                        error,
                    });
                }
            }
        }
        log::info!("peak table parsed: {}", report.summary());
        report
    }

    fn parse_row(&self, row: &str) -> Result<Peak, ParseError> {
        match self.format {
            Some(RowFormat::ShiftIntensityIndex) => self.parse_shift_intensity(row),
            Some(RowFormat::HzPpmIntensity) => self.parse_hz_ppm(row),
            Some(RowFormat::Assignment) => self.parse_assignment(row),
            Some(RowFormat::Literature) => self.parse_literature(row),
            None => self.detect_and_parse(row),
        }
    }

    fn detect_and_parse(&self, row: &str) -> Result<Peak, ParseError> {
        if row.contains('(') && row.contains(')') {
            return self.parse_literature(row);
        }

        let tokens: Vec<&str> = row.split_whitespace().collect();

        // Assignment rows: an alphabetic label then a shift
        if tokens.len() >= 2
            && tokens[0].chars().all(|c| c.is_ascii_alphabetic())
            && tokens[1].parse::<f64>().is_ok()
        {
            return self.parse_assignment(row);
        }

        if tokens.len() >= 3 {
            let values: Option<Vec<f64>> = tokens[..3]
                .iter()
                .map(|t| t.parse::<f64>().ok())
                .collect();
            if let Some(values) = values {
                let (v1, v2) = (values[0], values[1]);
                if v1 > 50.0 && v2 < 20.0 {
                    return self.parse_hz_ppm(row);
                }
                if v1 < 50.0 && v2 > 30.0 {
                    return self.parse_shift_intensity(row);
                }
                return Err(ParseError::AmbiguousLayout);
            }
        }

        Err(ParseError::UnrecognizedLayout)
    }

    /// `shift intensity peak#`
    fn parse_shift_intensity(&self, row: &str) -> Result<Peak, ParseError> {
        let values = numeric_tokens(row, 2)?;
        Ok(self.tabulated_peak(values[0], values[1]))
    }

    /// `Hz ppm intensity`. The ppm column carries the shift; the Hz
    /// column repeats the same position as a frequency offset and is
    /// redundant once the shift is known.
    fn parse_hz_ppm(&self, row: &str) -> Result<Peak, ParseError> {
        let values = numeric_tokens(row, 3)?;
        // Cross-check the redundant Hz column when a field strength is known
        if let Ok(from_hz) = units::try_hz_to_ppm(values[0], self.field_strength) {
            if (from_hz - values[1]).abs() > 1.0 {
                log::warn!(
                    "Hz column ({:.1} Hz = {:.3} ppm) disagrees with ppm column ({:.3})",
                    values[0],
                    from_hz,
                    values[1]
                );
            }
        }
        Ok(self.tabulated_peak(values[1], values[2]))
    }

    /// Default peak for a tabulated row, with per-nucleus width and an
    /// intensity-derived integration estimate
    fn tabulated_peak(&self, shift: f64, intensity: f64) -> Peak {
        let integration = match self.nucleus {
            Nucleus::C13 => 1.0,
            _ => {
                if intensity > 10.0 {
                    (intensity / 100.0).round().max(1.0)
                } else {
                    1.0
                }
            }
        };
        Peak::new(shift, intensity)
            .with_width(self.nucleus.default_width())
            .with_integration(integration)
    }

    /// Assignment letter then shift, with region heuristics for the
    /// default multiplicity, integration, and width
    fn parse_assignment(&self, row: &str) -> Result<Peak, ParseError> {
        let mut tokens = row.split_whitespace();
        let label = tokens.next().ok_or(ParseError::LayoutMismatch)?;
        if !label.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ParseError::LayoutMismatch);
        }
        let shift_token = tokens.next().ok_or(ParseError::LayoutMismatch)?;
        let shift: f64 = shift_token
            .parse()
            .map_err(|_| ParseError::InvalidNumber(shift_token.to_string()))?;

        let (multiplicity, integration, width) = if shift > 6.0 {
            // Aromatic and NH signals: complex splitting, one proton each
            (Multiplicity::Multiplet, 1.0, 0.003)
        } else if shift > 3.0 {
            // CH2/CH3 next to electronegative atoms: often quartets
            (Multiplicity::Quartet, 2.0, 0.002)
        } else if shift > 1.0 {
            // Alkyl region: often triplets
            (Multiplicity::Triplet, 3.0, 0.002)
        } else {
            (Multiplicity::Singlet, 1.0, 0.002)
        };

        let mut peak = Peak::new(shift, ASSIGNMENT_BASE_INTENSITY * integration)
            .with_width(width)
            .with_multiplicity(multiplicity)
            .with_integration(integration);
        peak.assignment = Some(label.to_string());
        Ok(peak)
    }

    /// Literature notation: `shift (multiplicity, J = ... Hz, nH, ...)`
    fn parse_literature(&self, row: &str) -> Result<Peak, ParseError> {
        let open = row.find('(').ok_or(ParseError::LayoutMismatch)?;
        let close = row.rfind(')').ok_or(ParseError::LayoutMismatch)?;
        if close < open {
            return Err(ParseError::LayoutMismatch);
        }
        let shift_text = row[..open].trim();
        let shift: f64 = shift_text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(shift_text.to_string()))?;
        let body = &row[open + 1..close];

        let coupling = extract_coupling(body);
        let mut multiplicity: Option<Multiplicity> = None;
        let mut integration = 1.0;
        for part in body.split(',') {
            let part = part.trim();
            if part.is_empty()
                || part.starts_with('J')
                || part.starts_with('j')
                || part.contains("Hz")
            {
                continue;
            }
            if let Some(rest) = part.strip_suffix('H').or_else(|| part.strip_suffix('h')) {
                if let Ok(v) = rest.trim().parse::<f64>() {
                    integration = v;
                    continue;
                }
            }
            if multiplicity.is_none() {
                if let Some(m) = multiplicity_token(part) {
                    multiplicity = Some(m);
                }
            }
        }

        Ok(Peak::new(shift, integration.max(0.1))
            .with_width(self.nucleus.default_width())
            .with_multiplicity(multiplicity.unwrap_or(Multiplicity::Singlet))
            .with_coupling(coupling)
            .with_integration(integration))
    }
}

/// First `count` whitespace tokens parsed as numbers
fn numeric_tokens(row: &str, count: usize) -> Result<Vec<f64>, ParseError> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    if tokens.len() < count {
        return Err(ParseError::LayoutMismatch);
    }
    tokens[..count]
        .iter()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(t.to_string()))
        })
        .collect()
}

/// Strip `δ`/`delta` prefixes and `1H NMR ...:`-style headers from a row
fn strip_row_prefixes(raw: &str) -> &str {
    let mut row = raw.trim();
    if let Some(pos) = row.find(':') {
        if row[..pos].to_uppercase().contains("NMR") {
            row = row[pos + 1..].trim();
        }
    }
    if let Some(rest) = row.strip_prefix('δ') {
        row = rest.trim();
    } else if row
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("delta"))
    {
        row = row[5..].trim();
    }
    row
}

/// Pull `J = 7.0, 3.1 Hz`-style coupling constants out of a descriptor
fn extract_coupling(body: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let mut in_j = false;
    for token in body.split(|c: char| c.is_whitespace() || c == ',' || c == '=') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token == "J" || token == "j" {
            in_j = true;
            continue;
        }
        if in_j {
            let token = token.trim_end_matches("Hz").trim_end_matches("hz");
            if token.is_empty() {
                continue;
            }
            match token.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => in_j = false,
            }
        }
    }
    values
}

/// Map a descriptor token to a known multiplicity, if it is one
fn multiplicity_token(token: &str) -> Option<Multiplicity> {
    match Multiplicity::from(token) {
        Multiplicity::Other(_) => None,
        m => Some(m),
    }
}
