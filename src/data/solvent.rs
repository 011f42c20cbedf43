//! Residual solvent signal catalogue.
//!
//! Reference shifts for the common deuterated NMR solvents. Values are the
//! usual residual-protio and carbon signals quoted against TMS.

use serde::{Deserialize, Serialize};

use super::peak::{Multiplicity, Nucleus, Peak};

/// Common deuterated NMR solvents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solvent {
    Cdcl3,
    DmsoD6,
    D2o,
    Cd3od,
}

impl std::fmt::Display for Solvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solvent::Cdcl3 => write!(f, "CDCl3"),
            Solvent::DmsoD6 => write!(f, "DMSO-d6"),
            Solvent::D2o => write!(f, "D2O"),
            Solvent::Cd3od => write!(f, "CD3OD"),
        }
    }
}

impl Solvent {
    /// Look up a solvent by its common name
    pub fn from_name(name: &str) -> Option<Solvent> {
        match name.trim().to_uppercase().replace('-', "").as_str() {
            "CDCL3" | "CHLOROFORMD" => Some(Solvent::Cdcl3),
            "DMSOD6" | "DMSO" => Some(Solvent::DmsoD6),
            "D2O" | "WATER" => Some(Solvent::D2o),
            "CD3OD" | "MEOD" | "METHANOLD4" => Some(Solvent::Cd3od),
            _ => None,
        }
    }

    /// Residual solvent peaks for the given nucleus, flagged `is_solvent`
    pub fn signals(&self, nucleus: &Nucleus) -> Vec<Peak> {
        match (self, nucleus) {
            (Solvent::Cdcl3, Nucleus::H1) => {
                vec![residual(7.26, Multiplicity::Singlet, &[], 0.2, nucleus)]
            }
            (Solvent::Cdcl3, Nucleus::C13) => {
                vec![residual(77.16, Multiplicity::Triplet, &[32.0], 0.3, nucleus)]
            }
            (Solvent::DmsoD6, Nucleus::H1) => {
                vec![residual(2.50, Multiplicity::Quintet, &[1.9], 0.1, nucleus)]
            }
            (Solvent::DmsoD6, Nucleus::C13) => {
                vec![residual(39.52, Multiplicity::Septet, &[1.3], 0.2, nucleus)]
            }
            (Solvent::D2o, Nucleus::H1) => {
                vec![residual(4.79, Multiplicity::Singlet, &[], 0.5, nucleus)]
            }
            (Solvent::Cd3od, Nucleus::H1) => vec![
                residual(3.31, Multiplicity::Quintet, &[1.1], 0.1, nucleus),
                // HOD
                residual(4.87, Multiplicity::Singlet, &[], 0.3, nucleus),
            ],
            (Solvent::Cd3od, Nucleus::C13) => {
                vec![residual(49.00, Multiplicity::Septet, &[21.4], 0.2, nucleus)]
            }
            _ => Vec::new(),
        }
    }
}

fn residual(
    shift: f64,
    multiplicity: Multiplicity,
    coupling_hz: &[f64],
    integration: f64,
    nucleus: &Nucleus,
) -> Peak {
    // Weak intensity proportional to the nominal residual integration
    let intensity = integration * 0.8 + 0.2;
    Peak::new(shift, intensity)
        .with_width(nucleus.default_width())
        .with_multiplicity(multiplicity)
        .with_coupling(coupling_hz.to_vec())
        .with_integration(integration)
        .as_solvent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdcl3_signals() {
        let h1 = Solvent::Cdcl3.signals(&Nucleus::H1);
        assert_eq!(h1.len(), 1);
        assert_eq!(h1[0].chemical_shift, 7.26);
        assert!(h1[0].is_solvent);

        let c13 = Solvent::Cdcl3.signals(&Nucleus::C13);
        assert_eq!(c13[0].multiplicity, Multiplicity::Triplet);
        assert_eq!(c13[0].coupling_constants, vec![32.0]);
    }

    #[test]
    fn test_d2o_has_no_carbon_signal() {
        assert!(Solvent::D2o.signals(&Nucleus::C13).is_empty());
    }

    #[test]
    fn test_solvent_lookup() {
        assert_eq!(Solvent::from_name("CDCl3"), Some(Solvent::Cdcl3));
        assert_eq!(Solvent::from_name("dmso-d6"), Some(Solvent::DmsoD6));
        assert_eq!(Solvent::from_name("benzene-d6"), None);
    }
}
