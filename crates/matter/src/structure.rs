use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::Atom;

pub type Vec3 = na::Vector3<f64>;
pub type Mat3 = na::Matrix3<f64>;
type Dvec = na::DVector<f64>;

/// A collection of atomic sites with an optional periodic cell.
///
/// The cell rows are lattice vectors in Å. `pbc` marks which axes are
/// periodic; a cell without any periodic axis is treated as decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub atoms: Vec<Atom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<[[f64; 3]; 3]>,
    #[serde(default)]
    pub pbc: [bool; 3],
}

impl Structure {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self {
            atoms,
            cell: None,
            pbc: [false; 3],
        }
    }

    pub fn with_cell(mut self, cell: [[f64; 3]; 3], pbc: [bool; 3]) -> Self {
        self.cell = Some(cell);
        self.pbc = pbc;
        self
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// whether any axis is periodic. a pbc flag without a cell does not count
    pub fn is_periodic(&self) -> bool {
        self.cell.is_some() && self.pbc.iter().any(|&b| b)
    }

    pub fn cell_matrix(&self) -> Option<Mat3> {
        self.cell.map(|c| {
            Mat3::from_rows(&[
                na::RowVector3::from_row_slice(&c[0]),
                na::RowVector3::from_row_slice(&c[1]),
                na::RowVector3::from_row_slice(&c[2]),
            ])
        })
    }

    /// the sum of the atomic numbers
    pub fn nuclear_charge(&self) -> usize {
        self.atoms.iter().map(|a| a.atomic_number).sum()
    }

    /// the number of electrons for a total molecular charge of `charge`. may
    /// be negative for a nonsensical charge; the caller validates
    pub fn electrons(&self, charge: isize) -> isize {
        self.nuclear_charge() as isize - charge
    }

    /// chemical formula in Hill order: C first, then H, then the remaining
    /// elements alphabetically. without carbon, everything is alphabetical
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for a in &self.atoms {
            *counts.entry(a.symbol()).or_default() += 1;
        }
        let mut parts = Vec::new();
        let mut push = |sym: &str, counts: &mut BTreeMap<&str, usize>| {
            if let Some(n) = counts.remove(sym) {
                parts.push(if n == 1 {
                    sym.to_string()
                } else {
                    format!("{sym}{n}")
                });
            }
        };
        if counts.contains_key("C") {
            push("C", &mut counts);
            push("H", &mut counts);
        }
        let rest: Vec<_> = counts.keys().copied().collect();
        for sym in rest {
            push(sym, &mut counts);
        }
        parts.concat()
    }

    /// the positions flattened into a 3N vector
    pub fn positions(&self) -> Dvec {
        Dvec::from_iterator(
            3 * self.len(),
            self.atoms.iter().flat_map(|a| a.position()),
        )
    }

    /// update the positions from a flat 3N vector
    pub fn set_positions(&mut self, x: &Dvec) {
        assert_eq!(x.len(), 3 * self.len(), "position vector length mismatch");
        for (i, a) in self.atoms.iter_mut().enumerate() {
            a.x = x[3 * i];
            a.y = x[3 * i + 1];
            a.z = x[3 * i + 2];
        }
    }

    pub fn masses(&self) -> Vec<f64> {
        self.atoms.iter().map(Atom::mass).collect()
    }

    pub fn initial_magmoms(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.magmom.unwrap_or(0.0)).collect()
    }

    /// center of mass in Å
    pub fn com(&self) -> Vec3 {
        let mut sum = 0.0;
        let mut com = Vec3::zeros();
        for atom in &self.atoms {
            let w = atom.mass();
            sum += w;
            com += w * Vec3::from_row_slice(&atom.position());
        }
        com / sum
    }

    /// moment of inertia tensor about the center of mass, in amu·Å²
    pub fn moi(&self) -> Mat3 {
        let com = self.com();
        let mut ret = Mat3::zeros();
        for atom in &self.atoms {
            let w = atom.mass();
            let x = atom.x - com[0];
            let y = atom.y - com[1];
            let z = atom.z - com[2];
            ret[(0, 0)] += w * (y * y + z * z);
            ret[(1, 1)] += w * (x * x + z * z);
            ret[(2, 2)] += w * (x * x + y * y);
            ret[(1, 0)] -= w * x * y;
            ret[(2, 0)] -= w * x * z;
            ret[(2, 1)] -= w * y * z;
        }
        ret.fill_upper_triangle_with_lower_triangle();
        ret
    }

    /// principal moments of inertia in amu·Å², sorted ascending
    pub fn principal_moments(&self) -> Vec3 {
        let eig = na::SymmetricEigen::new(self.moi());
        let mut moms: Vec<f64> = eig.eigenvalues.iter().copied().collect();
        moms.sort_by(|a, b| a.total_cmp(b));
        Vec3::from_row_slice(&moms)
    }
}

impl Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for atom in &self.atoms {
            writeln!(f, "{atom}")?;
        }
        Ok(())
    }
}

impl FromStr for Structure {
    type Err = std::io::Error;

    /// parse a block of `symbol x y z` lines. an XYZ-style header (atom count
    /// followed by a comment line) is skipped if present
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut atoms = Vec::new();
        let mut skip = 0;
        for line in s.lines() {
            let fields: Vec<_> = line.split_whitespace().collect();
            if skip > 0 {
                skip -= 1;
            } else if fields.is_empty() {
                continue;
            } else if fields.len() == 1 && fields[0].parse::<usize>().is_ok() {
                // xyz header: natoms, then a comment line
                skip = 1;
            } else {
                atoms.push(line.parse()?);
            }
        }
        Ok(Self::new(atoms))
    }
}
