//! Physical constants, CODATA 2018. The working units upstream are eV, Å,
//! and amu; the SI values only appear inside the partition-function
//! formulas.

/// J per eV
pub const EV: f64 = 1.602176634e-19;

/// kg per amu
pub const AMU: f64 = 1.66053906660e-27;

/// Boltzmann constant in eV/K
pub const KB_EV: f64 = 8.617333262e-5;

/// Boltzmann constant in J/K
pub const KB_J: f64 = 1.380649e-23;

/// Planck constant in J·s
pub const H_J: f64 = 6.62607015e-34;

/// reduced Planck constant in eV·s
pub const HBAR_EV: f64 = 6.582119569e-16;

/// speed of light in cm/s
pub const C_CM: f64 = 2.99792458e10;

/// amu·Å² in kg·m²
pub const AMU_A2: f64 = AMU * 1e-20;

/// angular frequency in 1/s per sqrt of an eV/(Å²·amu) Hessian eigenvalue
pub fn omega_per_sqrt_eig() -> f64 {
    (EV / AMU_A2).sqrt()
}
