//! Lennard-Jones pair potential with analytic forces.

use std::time::Instant;

use matter::Structure;
use serde_json::{Value, json};

use crate::{
    CalcResult, Calculator, EngineError, neighbors::pairs_within,
};

/// element-blind 12-6 pair potential. under periodic boundaries the energy is
/// shifted to vanish at the cutoff so images entering and leaving the list do
/// not jump the total
#[derive(Debug, Clone, PartialEq)]
pub struct LennardJones {
    /// well depth in eV
    pub epsilon: f64,
    /// zero-crossing distance in Å
    pub sigma: f64,
    /// pair cutoff in Å. `None` means unbounded, which periodic structures
    /// replace with 3σ
    pub cutoff: Option<f64>,
}

impl Default for LennardJones {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            sigma: 1.0,
            cutoff: None,
        }
    }
}

impl LennardJones {
    /// build from a free-form keyword table; unknown keys are rejected here,
    /// on the engine side of the recipe contract
    pub fn from_params(
        params: &serde_json::Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let mut lj = Self::default();
        for (k, v) in params {
            let num = v.as_f64().ok_or_else(|| {
                EngineError::BadKeywordValue {
                    program: "lennard-jones".to_string(),
                    keyword: k.clone(),
                }
            });
            match k.as_str() {
                "epsilon" => lj.epsilon = num?,
                "sigma" => lj.sigma = num?,
                "cutoff" => lj.cutoff = Some(num?),
                _ => {
                    return Err(EngineError::BadKeyword {
                        program: "lennard-jones".to_string(),
                        keyword: k.clone(),
                    });
                }
            }
        }
        Ok(lj)
    }

    fn pair_energy(&self, r: f64) -> f64 {
        let sr6 = (self.sigma / r).powi(6);
        4.0 * self.epsilon * (sr6 * sr6 - sr6)
    }

    /// dE/dr
    fn pair_derivative(&self, r: f64) -> f64 {
        let sr6 = (self.sigma / r).powi(6);
        4.0 * self.epsilon * (-12.0 * sr6 * sr6 + 6.0 * sr6) / r
    }
}

impl Calculator for LennardJones {
    fn name(&self) -> &'static str {
        "lennard-jones"
    }

    fn parameters(&self) -> Value {
        json!({
            "epsilon": self.epsilon,
            "sigma": self.sigma,
            "cutoff": self.cutoff,
        })
    }

    fn compute(&self, structure: &Structure) -> Result<CalcResult, EngineError> {
        let start = Instant::now();
        let periodic = structure.is_periodic();
        let cutoff = match (self.cutoff, periodic) {
            (Some(rc), _) => rc,
            (None, true) => 3.0 * self.sigma,
            (None, false) => f64::INFINITY,
        };
        let shift = if cutoff.is_finite() {
            self.pair_energy(cutoff)
        } else {
            0.0
        };
        let mut energy = 0.0;
        let mut forces = vec![[0.0; 3]; structure.len()];
        for p in pairs_within(structure, cutoff) {
            energy += self.pair_energy(p.r) - shift;
            let de = self.pair_derivative(p.r);
            for (k, d) in p.dx.iter().enumerate() {
                // force on j is -dE/dr * dx/r; i gets the reaction
                let f = -de * d / p.r;
                forces[p.j][k] += f;
                forces[p.i][k] -= f;
            }
        }
        Ok(CalcResult {
            energy,
            forces,
            time: start.elapsed().as_secs_f64(),
            dir: None,
        })
    }
}
