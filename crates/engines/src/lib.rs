//! Energy and force engines.
//!
//! Two in-process potentials (effective medium theory and Lennard-Jones) and
//! two subprocess drivers (the `tblite` tight-binding program and the `orca`
//! quantum chemistry program) behind one [Calculator] trait. All engines
//! report energies in eV and forces in eV/Å regardless of the native units
//! of the backend.

use std::{error::Error, fmt::Display, path::PathBuf, process::Command};

use matter::Structure;

pub mod emt;
pub mod lj;
pub mod orca;
pub mod tblite;

mod neighbors;

pub use emt::Emt;
pub use lj::LennardJones;
pub use orca::Orca;
pub use tblite::Tblite;

pub const HARTREE_TO_EV: f64 = 27.211386245988;
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;

/// one energy/force evaluation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalcResult {
    /// eV
    pub energy: f64,
    /// eV/Å, one triple per atom
    pub forces: Vec<[f64; 3]>,
    /// wall seconds spent in the engine
    pub time: f64,
    /// the scratch directory an external engine ran in
    pub dir: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    /// the backing executable is not installed or not on PATH. raised when
    /// the engine is invoked, never at construction
    MissingExecutable { program: String, hint: String },
    /// the engine does not parameterize this element
    UnknownElement { program: String, symbol: String },
    /// an unrecognized keyword was passed through from a recipe override
    BadKeyword { program: String, keyword: String },
    /// a keyword was recognized but its value had the wrong shape
    BadKeywordValue { program: String, keyword: String },
    /// both implicit-solvation schemes were requested at once
    ConflictingSolvation,
    /// the subprocess exited unsuccessfully
    Failed { program: String, stderr: String },
    ErrorInOutput(String),
    EnergyNotFound(String),
    GradientNotFound(String),
    ReadFileError(String, std::io::ErrorKind),
    WriteFileError(String, std::io::ErrorKind),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExecutable { program, hint } => {
                write!(f, "{program} must be installed. {hint}")
            }
            Self::UnknownElement { program, symbol } => {
                write!(f, "{program} has no parameters for element {symbol}")
            }
            Self::BadKeyword { program, keyword } => {
                write!(f, "unknown {program} keyword {keyword}")
            }
            Self::BadKeywordValue { program, keyword } => {
                write!(f, "bad value for {program} keyword {keyword}")
            }
            Self::ConflictingSolvation => write!(
                f,
                "cpcm_dielectric and smd_solvent request conflicting \
                 implicit-solvation schemes; pick one"
            ),
            Self::Failed { program, stderr } => {
                write!(f, "{program} exited with an error: {stderr}")
            }
            Self::ErrorInOutput(path) => {
                write!(f, "error reported in output file {path}")
            }
            Self::EnergyNotFound(path) => {
                write!(f, "no energy found in {path}")
            }
            Self::GradientNotFound(path) => {
                write!(f, "no gradient found in {path}")
            }
            Self::ReadFileError(path, kind) => {
                write!(f, "failed to read {path}: {kind}")
            }
            Self::WriteFileError(path, kind) => {
                write!(f, "failed to write {path}: {kind}")
            }
        }
    }
}

impl Error for EngineError {}

/// An engine that evaluates the energy and forces of a structure.
///
/// Implementations are `Sync`: a single configured engine may be shared by
/// parallel displacement evaluations, so any scratch state must be per-call.
pub trait Calculator: Sync {
    /// short engine name used in logs, errors, and result records
    fn name(&self) -> &'static str;

    /// the effective parameters, echoed verbatim into result records
    fn parameters(&self) -> serde_json::Value;

    /// capability probe run before any numerical work. the default is
    /// available; subprocess engines check for their executable here
    fn check_available(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn compute(&self, structure: &Structure) -> Result<CalcResult, EngineError>;
}

/// probe for `cmd` by asking it for its version, mapping a spawn failure to
/// [EngineError::MissingExecutable]
pub(crate) fn probe_executable(
    program: &str,
    cmd: &str,
    hint: &str,
) -> Result<(), EngineError> {
    match Command::new(cmd).arg("--version").output() {
        Ok(_) => Ok(()),
        Err(_) => Err(EngineError::MissingExecutable {
            program: program.to_string(),
            hint: hint.to_string(),
        }),
    }
}

/// central-difference forces from an energy-only functional form
pub(crate) fn numerical_forces<F>(
    structure: &Structure,
    step: f64,
    energy: F,
) -> Result<Vec<[f64; 3]>, EngineError>
where
    F: Fn(&Structure) -> Result<f64, EngineError>,
{
    let mut forces = vec![[0.0; 3]; structure.len()];
    let mut moved = structure.clone();
    let mut x = structure.positions();
    for i in 0..x.len() {
        let orig = x[i];
        x[i] = orig + step;
        moved.set_positions(&x);
        let ep = energy(&moved)?;
        x[i] = orig - step;
        moved.set_positions(&x);
        let em = energy(&moved)?;
        x[i] = orig;
        forces[i / 3][i % 3] = -(ep - em) / (2.0 * step);
    }
    Ok(forces)
}
