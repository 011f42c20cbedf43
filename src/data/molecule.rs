//! Molecular context for the import and simulation paths.
//!
//! Structure here is deliberately shallow: atoms carry the NMR-relevant
//! annotations (shift, multiplicity, couplings, integration) and nothing
//! else. Full structure elucidation is out of scope.

use serde::{Deserialize, Serialize};

use super::peak::Multiplicity;

/// An atom with NMR-relevant properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    /// 1-based position index within the molecule
    pub position: usize,
    pub chemical_shift: Option<f64>,
    pub multiplicity: Option<Multiplicity>,
    /// J values in Hz
    pub coupling_constants: Vec<f64>,
    pub integration: Option<f64>,
}

impl Atom {
    pub fn new(element: &str, position: usize) -> Self {
        Self {
            element: element.to_string(),
            position,
            chemical_shift: None,
            multiplicity: None,
            coupling_constants: Vec::new(),
            integration: None,
        }
    }

    pub fn with_shift(mut self, ppm: f64) -> Self {
        self.chemical_shift = Some(ppm);
        self
    }

    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = Some(multiplicity);
        self
    }

    pub fn with_coupling(mut self, coupling_hz: Vec<f64>) -> Self {
        self.coupling_constants = coupling_hz;
        self
    }

    pub fn with_integration(mut self, integration: f64) -> Self {
        self.integration = Some(integration);
        self
    }
}

/// How a molecule identifier should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoleculeKind {
    Formula,
    Smiles,
    Name,
}

/// A molecule as an ordered collection of atoms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub identifier: String,
    pub kind: MoleculeKind,
    pub name: Option<String>,
    pub atoms: Vec<Atom>,
}

impl Molecule {
    /// Build from a molecular formula like `C2H6O`, one atom per count
    pub fn from_formula(formula: &str) -> Self {
        let mut molecule = Self {
            identifier: formula.to_string(),
            kind: MoleculeKind::Formula,
            name: None,
            atoms: Vec::new(),
        };
        for (element, count) in parse_formula(formula) {
            for _ in 0..count {
                let position = molecule.atoms.len() + 1;
                molecule.atoms.push(Atom::new(&element, position));
            }
        }
        molecule
    }

    /// Build an empty molecule identified by name
    pub fn from_name(name: &str) -> Self {
        Self {
            identifier: name.to_string(),
            kind: MoleculeKind::Name,
            name: Some(name.to_string()),
            atoms: Vec::new(),
        }
    }

    /// Carry a SMILES string without interpreting it; structure parsing
    /// belongs to an external chemistry toolkit
    pub fn from_smiles(smiles: &str) -> Self {
        Self {
            identifier: smiles.to_string(),
            kind: MoleculeKind::Smiles,
            name: None,
            atoms: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.identifier)
    }

    pub fn add_atom(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn atoms_by_element(&self, element: &str) -> Vec<&Atom> {
        self.atoms
            .iter()
            .filter(|a| a.element == element)
            .collect()
    }

    pub fn atom_count(&self, element: &str) -> usize {
        self.atoms.iter().filter(|a| a.element == element).count()
    }
}

/// Split a formula into (element, count) pairs: `C6H12O6` →
/// [("C", 6), ("H", 12), ("O", 6)]
fn parse_formula(formula: &str) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    let mut chars = formula.chars().peekable();
    while let Some(c) = chars.next() {
        if !c.is_ascii_uppercase() {
            continue;
        }
        let mut element = c.to_string();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_lowercase() {
                element.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let mut digits = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_digit() {
                digits.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let count = digits.parse::<usize>().unwrap_or(1);
        out.push((element, count));
    }
    out
}
