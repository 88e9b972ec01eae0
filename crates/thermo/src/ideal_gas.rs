//! Rigid-rotor / harmonic-oscillator thermochemistry for an ideal gas.

use std::f64::consts::PI;

use matter::Structure;
use serde::{Deserialize, Serialize};

use crate::{
    Harmonic,
    consts::{AMU, AMU_A2, H_J, KB_EV, KB_J},
};

/// moments this small (relative to the largest) mark a linear rotor
const LINEAR_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Monatomic,
    Linear,
    Nonlinear,
}

impl Geometry {
    pub fn classify(s: &Structure) -> Self {
        if s.len() == 1 {
            return Geometry::Monatomic;
        }
        let moms = s.principal_moments();
        if moms[0] < LINEAR_EPS * moms[2].max(1.0) {
            Geometry::Linear
        } else {
            Geometry::Nonlinear
        }
    }

    /// translational plus rotational mode count excluded from the vibrations
    pub fn dropped_modes(self) -> usize {
        match self {
            Geometry::Monatomic => 3,
            Geometry::Linear => 5,
            Geometry::Nonlinear => 6,
        }
    }
}

/// the inputs to the partition functions, in eV/amu/Å² units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealGas {
    /// electronic energy underneath the thermal corrections, eV. zero gives
    /// bare corrections
    pub potential_energy: f64,
    pub geometry: Geometry,
    pub symmetry_number: usize,
    /// spin multiplicity, for the electronic entropy
    pub multiplicity: usize,
    /// total mass in amu
    pub mass: f64,
    /// principal moments of inertia in amu·Å², ascending
    pub moments: [f64; 3],
    /// retained vibrational quanta ħω in eV
    pub vib_energies: Vec<f64>,
}

impl IdealGas {
    /// Assemble the model from a structure and its normal-mode analysis.
    ///
    /// The 3 translational and 2 or 3 rotational modes are removed by
    /// dropping the lowest-energy modes; any imaginary mode that survives
    /// the cut is discarded with a warning rather than an error, so
    /// transition states still get a (partial) thermal report.
    pub fn new(
        s: &Structure,
        harmonic: &Harmonic,
        potential_energy: f64,
        symmetry_number: usize,
        multiplicity: usize,
    ) -> Self {
        let geometry = Geometry::classify(s);
        let keep = (3 * s.len()).saturating_sub(geometry.dropped_modes());
        let mut es = harmonic.energies_ev.clone();
        es.sort_by(f64::total_cmp);
        let mut vib = es.split_off(es.len().saturating_sub(keep));
        let bad = vib.iter().filter(|&&e| e <= 0.0).count();
        if bad > 0 {
            log::warn!(
                "dropping {bad} non-real vibrational modes from the \
                 thermochemistry"
            );
            vib.retain(|&e| e > 0.0);
        }
        let moms = s.principal_moments();
        Self {
            potential_energy,
            geometry,
            symmetry_number,
            multiplicity,
            mass: s.masses().iter().sum(),
            moments: [moms[0], moms[1], moms[2]],
            vib_energies: vib,
        }
    }

    /// zero-point energy in eV
    pub fn zpe(&self) -> f64 {
        0.5 * self.vib_energies.iter().sum::<f64>()
    }

    fn vib_heat(&self, t: f64) -> f64 {
        self.vib_energies
            .iter()
            .map(|e| e / (e / (KB_EV * t)).exp_m1())
            .sum()
    }

    /// U(T) in eV
    pub fn internal_energy(&self, t: f64) -> f64 {
        let rot = match self.geometry {
            Geometry::Monatomic => 0.0,
            Geometry::Linear => KB_EV * t,
            Geometry::Nonlinear => 1.5 * KB_EV * t,
        };
        self.potential_energy
            + self.zpe()
            + 1.5 * KB_EV * t
            + rot
            + self.vib_heat(t)
    }

    /// H(T) in eV
    pub fn enthalpy(&self, t: f64) -> f64 {
        self.internal_energy(t) + KB_EV * t
    }

    /// S(T, p) in eV/K, with the pressure in Pa
    pub fn entropy(&self, t: f64, p_pa: f64) -> f64 {
        let sigma = self.symmetry_number as f64;
        // translational, Sackur-Tetrode
        let m = self.mass * AMU;
        let q_trans = (2.0 * PI * m * KB_J * t / (H_J * H_J)).powf(1.5)
            * KB_J
            * t
            / p_pa;
        let mut s = KB_EV * (q_trans.ln() + 2.5);
        // rotational
        s += match self.geometry {
            Geometry::Monatomic => 0.0,
            Geometry::Linear => {
                let i = self.moments[2] * AMU_A2;
                let q_rot =
                    8.0 * PI * PI * i * KB_J * t / (sigma * H_J * H_J);
                KB_EV * (q_rot.ln() + 1.0)
            }
            Geometry::Nonlinear => {
                let [ia, ib, ic] = self.moments.map(|i| i * AMU_A2);
                let q_rot = (PI * ia * ib * ic).sqrt() / sigma
                    * (8.0 * PI * PI * KB_J * t / (H_J * H_J)).powf(1.5);
                KB_EV * (q_rot.ln() + 1.5)
            }
        };
        // vibrational
        for e in &self.vib_energies {
            let x = e / (KB_EV * t);
            s += KB_EV * (x / x.exp_m1() - (-(-x).exp()).ln_1p());
        }
        // electronic
        s += KB_EV * (self.multiplicity as f64).ln();
        s
    }

    /// G(T, p) in eV, with the pressure in Pa
    pub fn gibbs(&self, t: f64, p_pa: f64) -> f64 {
        self.enthalpy(t) - t * self.entropy(t, p_pa)
    }
}
