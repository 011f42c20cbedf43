//! Hz/ppm conversion.
//!
//! Coupling constants are reported in Hz and are field-independent; ppm
//! offsets scale with the spectrometer frequency. Conversion therefore
//! always needs the field strength in MHz, and the checked variants fail
//! explicitly rather than assuming a default.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitError {
    #[error("field strength required for Hz/ppm conversion but none is set")]
    MissingFieldStrength,
    #[error("field strength must be positive")]
    NonPositiveFieldStrength,
}

/// Δppm = ΔHz / field strength
pub fn hz_to_ppm(hz: f64, field_strength_mhz: f64) -> f64 {
    hz / field_strength_mhz
}

/// ΔHz = Δppm × field strength
pub fn ppm_to_hz(ppm: f64, field_strength_mhz: f64) -> f64 {
    ppm * field_strength_mhz
}

/// Checked conversion for callers whose field strength is optional
pub fn try_hz_to_ppm(hz: f64, field_strength_mhz: Option<f64>) -> Result<f64, UnitError> {
    match field_strength_mhz {
        Some(f) if f > 0.0 => Ok(hz / f),
        Some(_) => Err(UnitError::NonPositiveFieldStrength),
        None => Err(UnitError::MissingFieldStrength),
    }
}

/// Checked conversion for callers whose field strength is optional
pub fn try_ppm_to_hz(ppm: f64, field_strength_mhz: Option<f64>) -> Result<f64, UnitError> {
    match field_strength_mhz {
        Some(f) if f > 0.0 => Ok(ppm * f),
        Some(_) => Err(UnitError::NonPositiveFieldStrength),
        None => Err(UnitError::MissingFieldStrength),
    }
}
