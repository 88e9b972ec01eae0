use std::{fmt::Display, io, str::FromStr};

use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};

use crate::masses::MASSES;

/// A single atomic site: element, Cartesian position in Å, and optional
/// per-site mass (amu) and initial magnetic moment (μB) overrides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Atom {
    pub atomic_number: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magmom: Option<f64>,
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.abs_diff_eq(other, 1e-8)
    }
}

impl AbsDiffEq for Atom {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        1e-8
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < epsilon;
        self.atomic_number == other.atomic_number
            && close(self.x, other.x)
            && close(self.y, other.y)
            && close(self.z, other.z)
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:2} {:15.10} {:15.10} {:15.10}",
            self.symbol(),
            self.x,
            self.y,
            self.z
        )
    }
}

impl FromStr for Atom {
    type Err = io::Error;

    /// parse an Atom from a line like
    ///  O 0.0 0.0 0.1197
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<_> = s.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(io::Error::other("wrong number of fields in Atom"));
        }
        let mut coord = [0.0; 3];
        for (c, f) in coord.iter_mut().zip(&fields[1..]) {
            *c = f.parse().map_err(|_| {
                io::Error::other("failed to parse coordinate field as f64")
            })?;
        }
        Self::from_symbol(fields[0], coord[0], coord[1], coord[2])
            .ok_or_else(|| {
                io::Error::other(format!("unknown element symbol {}", fields[0]))
            })
    }
}

pub const SYMBOLS: [&str; 87] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg",
    "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn",
    "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb",
    "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm",
    "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta",
    "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At",
    "Rn",
];

fn symbol_to_number(s: &str) -> Option<usize> {
    SYMBOLS.iter().position(|&x| x == s)
}

fn titlecase(s: &str) -> String {
    let mut cs = s.chars();
    let Some(first) = cs.next() else {
        return String::new();
    };
    first.to_uppercase().chain(cs.flat_map(char::to_lowercase)).collect()
}

impl Atom {
    pub fn new(atomic_number: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            atomic_number,
            x,
            y,
            z,
            mass: None,
            magmom: None,
        }
    }

    /// construct an [Atom] from an element symbol, accepting any
    /// capitalization. returns None for an unrecognized symbol
    pub fn from_symbol(symbol: &str, x: f64, y: f64, z: f64) -> Option<Self> {
        let z_num = symbol_to_number(symbol)
            .or_else(|| symbol_to_number(&titlecase(symbol)))?;
        Some(Self::new(z_num, x, y, z))
    }

    #[inline]
    pub const fn symbol(&self) -> &str {
        debug_assert!(self.atomic_number != 0 && self.atomic_number < 87);
        SYMBOLS[self.atomic_number]
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// the mass in amu, either the per-site override or the standard atomic
    /// weight for the element
    pub fn mass(&self) -> f64 {
        self.mass.unwrap_or(MASSES[self.atomic_number])
    }
}
