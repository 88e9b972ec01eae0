//! Harmonic vibrational analysis and ideal-gas thermochemistry.
//!
//! [harmonic] turns a Cartesian Hessian into normal-mode frequencies;
//! [IdealGas] feeds them into the rigid-rotor/harmonic-oscillator partition
//! functions for ZPE, internal energy, enthalpy, entropy, and free energy.

use std::f64::consts::PI;

use nalgebra::SymmetricEigen;
use serde::{Deserialize, Serialize};

pub mod consts;
pub mod ideal_gas;

pub use ideal_gas::{Geometry, IdealGas};

type Dmat = nalgebra::DMatrix<f64>;

/// the result of a normal-mode analysis, sorted by ascending eigenvalue so
/// imaginary modes lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    /// frequencies in cm⁻¹; imaginary modes are reported as negative
    pub freqs_cm: Vec<f64>,
    /// mode quanta ħω in eV, negative for imaginary modes
    pub energies_ev: Vec<f64>,
    /// how many modes have imaginary frequencies
    pub n_imaginary: usize,
}

/// Mass-weight `hessian` (eV/Å², one row/column triple per atom) with
/// `masses` (amu) and diagonalize.
pub fn harmonic(hessian: &Dmat, masses: &[f64]) -> Harmonic {
    let n = hessian.nrows();
    assert_eq!(n, 3 * masses.len(), "hessian/mass dimension mismatch");
    let mut weighted = hessian.clone();
    for i in 0..n {
        for j in 0..n {
            weighted[(i, j)] /= (masses[i / 3] * masses[j / 3]).sqrt();
        }
    }
    let mut eigs: Vec<f64> =
        SymmetricEigen::new(weighted).eigenvalues.iter().copied().collect();
    eigs.sort_by(f64::total_cmp);

    let omega = consts::omega_per_sqrt_eig();
    let to_cm = omega / (2.0 * PI * consts::C_CM);
    let to_ev = consts::HBAR_EV * omega;
    let signed_sqrt = |l: f64| l.abs().sqrt().copysign(l);
    Harmonic {
        freqs_cm: eigs.iter().map(|&l| signed_sqrt(l) * to_cm).collect(),
        energies_ev: eigs.iter().map(|&l| signed_sqrt(l) * to_ev).collect(),
        // strictly negative, below the eigensolver noise floor
        n_imaginary: eigs.iter().filter(|&&l| l < -1e-12).count(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn unit_eigenvalue_reference_frequency() {
        // a 1 eV/Å² mode on a 1 amu particle is 521.47 cm⁻¹
        let h = Dmat::from_row_slice(3, 3, &[
            1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ]);
        let got = harmonic(&h, &[1.0]);
        assert_abs_diff_eq!(got.freqs_cm[2], 521.47, epsilon = 0.05);
        assert_eq!(got.n_imaginary, 0);
        // ħω for the same mode
        assert_abs_diff_eq!(got.energies_ev[2], 0.06465, epsilon = 1e-4);
    }

    #[test]
    fn mass_weighting() {
        let h = Dmat::from_row_slice(3, 3, &[
            4.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ]);
        // twice the force constant root, halved by a 4x mass
        let got = harmonic(&h, &[4.0]);
        assert_abs_diff_eq!(got.freqs_cm[2], 521.47, epsilon = 0.05);
    }

    #[test]
    fn saddle_hessian_counts_imaginary() {
        let h = Dmat::from_row_slice(3, 3, &[
            -0.5, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 2.0,
        ]);
        let got = harmonic(&h, &[1.0]);
        assert_eq!(got.n_imaginary, 1);
        assert!(got.freqs_cm[0] < 0.0);
        assert!(got.freqs_cm[1] > 0.0);
    }
}
