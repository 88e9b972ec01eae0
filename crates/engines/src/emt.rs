//! Effective-medium-theory potential.
//!
//! The Jacobsen–Stoltze–Nørskov form with the standard fcc-metal parameter
//! set plus the light-element extensions, so small molecular structures work
//! out of the box. The energy is zero for every element at its bulk fcc
//! equilibrium; isolated atoms sit at minus their cohesive energy above it.
//! Forces come from central differences of the energy, which keeps them
//! exactly consistent with the cutoff smoothing.

use std::{collections::BTreeMap, time::Instant};

use matter::Structure;
use serde_json::{Value, json};

use crate::{
    BOHR_TO_ANGSTROM as BOHR, CalcResult, Calculator, EngineError,
    neighbors::pairs_within, numerical_forces,
};

/// (16 π / 3)^(1/3) / √2: the fcc nearest-neighbor distance per Wigner-Seitz
/// radius
const BETA: f64 = 1.809;

/// E0 (eV), s0 (bohr), V0 (eV), eta2 (1/bohr), kappa (1/bohr),
/// lambda (1/bohr), n0 (1/bohr³)
#[rustfmt::skip]
const RAW: [(usize, [f64; 7]); 11] = [
    (13, [-3.28, 3.00, 1.493, 1.240, 2.000, 1.169, 0.00700]), // Al
    (29, [-3.51, 2.67, 2.476, 1.652, 2.740, 1.906, 0.00910]), // Cu
    (47, [-2.96, 3.01, 2.132, 1.652, 2.790, 1.892, 0.00547]), // Ag
    (79, [-3.80, 3.00, 2.321, 1.674, 2.873, 2.182, 0.00703]), // Au
    (28, [-4.44, 2.60, 3.673, 1.669, 2.757, 1.948, 0.01030]), // Ni
    (46, [-3.90, 2.87, 2.773, 1.818, 3.107, 2.155, 0.00688]), // Pd
    (78, [-5.85, 2.90, 4.067, 1.812, 3.145, 2.192, 0.00802]), // Pt
    (1,  [-3.21, 1.31, 0.132, 2.652, 2.790, 3.892, 0.00547]), // H
    (6,  [-3.50, 1.81, 0.332, 1.652, 2.790, 1.892, 0.01322]), // C
    (7,  [-5.10, 1.88, 0.132, 1.652, 2.790, 1.892, 0.01222]), // N
    (8,  [-4.60, 1.95, 0.332, 1.652, 2.790, 1.892, 0.00850]), // O
];

/// per-element parameters in eV/Å units, with the neighbor-shell
/// normalization factors for the cutoff of the current system
#[derive(Debug, Clone, Copy)]
struct Par {
    e0: f64,
    s0: f64,
    v0: f64,
    eta2: f64,
    kappa: f64,
    lambda: f64,
    n0: f64,
    gamma1: f64,
    gamma2: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emt {
    /// displacement for the force differences, in Å
    pub fd_step: f64,
}

impl Default for Emt {
    fn default() -> Self {
        Self { fd_step: 1e-4 }
    }
}

impl Emt {
    pub fn from_params(
        params: &serde_json::Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let mut emt = Self::default();
        for (k, v) in params {
            match k.as_str() {
                "fd_step" => {
                    emt.fd_step = v.as_f64().ok_or_else(|| {
                        EngineError::BadKeywordValue {
                            program: "emt".to_string(),
                            keyword: k.clone(),
                        }
                    })?;
                }
                _ => {
                    return Err(EngineError::BadKeyword {
                        program: "emt".to_string(),
                        keyword: k.clone(),
                    });
                }
            }
        }
        Ok(emt)
    }

    fn energy(&self, s: &Structure) -> Result<f64, EngineError> {
        if s.is_empty() {
            return Ok(0.0);
        }
        let mut elements: BTreeMap<usize, [f64; 7]> = BTreeMap::new();
        for a in &s.atoms {
            if !elements.contains_key(&a.atomic_number) {
                let raw = RAW
                    .iter()
                    .find(|(z, _)| *z == a.atomic_number)
                    .map(|(_, p)| *p)
                    .ok_or_else(|| EngineError::UnknownElement {
                        program: "emt".to_string(),
                        symbol: a.symbol().to_string(),
                    })?;
                elements.insert(a.atomic_number, raw);
            }
        }
        // the cutoff sits between the third and fourth fcc shells of the
        // largest atom in the system
        let maxseq = elements
            .values()
            .map(|p| p[1] * BOHR)
            .fold(0.0, f64::max);
        let rc = BETA * maxseq * 0.5 * (3f64.sqrt() + 2.0);
        let rr = rc * 4.0 / (3f64.sqrt() + 2.0);
        let acut = 9999f64.ln() / (rr - rc);
        let par: BTreeMap<usize, Par> = elements
            .into_iter()
            .map(|(z, p)| {
                let s0 = p[1] * BOHR;
                let eta2 = p[3] / BOHR;
                let kappa = p[4] / BOHR;
                let mut gamma1 = 0.0;
                let mut gamma2 = 0.0;
                for (shell, n) in [12.0, 6.0, 24.0].into_iter().enumerate() {
                    let r = s0 * BETA * ((shell + 1) as f64).sqrt();
                    let w = n / (12.0 * (1.0 + (acut * (r - rc)).exp()));
                    gamma1 += w * (-eta2 * (r - BETA * s0)).exp();
                    gamma2 += w * (-kappa / BETA * (r - BETA * s0)).exp();
                }
                let par = Par {
                    e0: p[0],
                    s0,
                    v0: p[2],
                    eta2,
                    kappa,
                    lambda: p[5] / BOHR,
                    n0: p[6] / (BOHR * BOHR * BOHR),
                    gamma1,
                    gamma2,
                };
                (z, par)
            })
            .collect();

        let mut sigma1 = vec![0.0; s.len()];
        let mut energy = 0.0;
        for pair in pairs_within(s, rc + 0.5) {
            let p1 = &par[&s.atoms[pair.i].atomic_number];
            let p2 = &par[&s.atoms[pair.j].atomic_number];
            let ksi = p2.n0 / p1.n0;
            let r = pair.r;
            let theta = 1.0 / (1.0 + (acut * (r - rc)).exp());
            let y1 = 0.5 * p1.v0 * (-p2.kappa * (r / BETA - p2.s0)).exp()
                * ksi
                / p1.gamma2
                * theta;
            let y2 = 0.5 * p2.v0 * (-p1.kappa * (r / BETA - p1.s0)).exp()
                / ksi
                / p2.gamma2
                * theta;
            energy -= y1 + y2;
            sigma1[pair.i] +=
                (-p2.eta2 * (r - BETA * p2.s0)).exp() * ksi * theta
                    / p1.gamma1;
            sigma1[pair.j] +=
                (-p1.eta2 * (r - BETA * p1.s0)).exp() / ksi * theta
                    / p2.gamma1;
        }
        for (a, sig) in sigma1.iter().enumerate() {
            let p = &par[&s.atoms[a].atomic_number];
            if *sig <= 0.0 {
                // no neighbors: the isolated-atom limit of the cohesive term
                energy -= p.e0;
                continue;
            }
            let ds = -(sig / 12.0).ln() / (BETA * p.eta2);
            let x = p.lambda * ds;
            let y = (-x).exp();
            let z = 6.0 * p.v0 * (-p.kappa * ds).exp();
            energy += p.e0 * ((1.0 + x) * y - 1.0) + z;
        }
        Ok(energy)
    }
}

impl Calculator for Emt {
    fn name(&self) -> &'static str {
        "emt"
    }

    fn parameters(&self) -> Value {
        json!({ "fd_step": self.fd_step })
    }

    fn compute(&self, structure: &Structure) -> Result<CalcResult, EngineError> {
        let start = Instant::now();
        let energy = self.energy(structure)?;
        let forces =
            numerical_forces(structure, self.fd_step, |s| self.energy(s))?;
        Ok(CalcResult {
            energy,
            forces,
            time: start.elapsed().as_secs_f64(),
            dir: None,
        })
    }
}
