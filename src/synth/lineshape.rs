//! Elementary line-shape functions.
//!
//! Both shapes are height-normalized: the value at the line center equals
//! the line height, and `width` is the full width at half maximum in ppm,
//! so Lorentzian and Gaussian rendering are interchangeable by
//! configuration without changing any other contract.

use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;

/// Selectable line-shape function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineShape {
    Lorentzian,
    Gaussian,
}

impl std::fmt::Display for LineShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineShape::Lorentzian => write!(f, "Lorentzian"),
            LineShape::Gaussian => write!(f, "Gaussian"),
        }
    }
}

impl LineShape {
    /// Evaluate the shape at `ppm` for one line
    pub fn eval(&self, ppm: f64, center: f64, height: f64, width: f64) -> f64 {
        let hwhm = width / 2.0;
        if hwhm <= 0.0 {
            return 0.0;
        }
        let d = ppm - center;
        match self {
            LineShape::Lorentzian => height * hwhm * hwhm / (d * d + hwhm * hwhm),
            LineShape::Gaussian => {
                let u = d / hwhm;
                height * (-LN_2 * u * u).exp()
            }
        }
    }

    /// Accumulate one line's contribution over the sampled axis
    pub fn accumulate(&self, axis: &[f64], out: &mut [f64], center: f64, height: f64, width: f64) {
        for (y, &x) in out.iter_mut().zip(axis.iter()) {
            *y += self.eval(x, center, height, width);
        }
    }
}
