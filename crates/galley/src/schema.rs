//! Result records and the summarizers that produce them.
//!
//! Every recipe returns a record carrying enough to replay or audit the run:
//! the input structure echo, the final structure, the parameters the engine
//! actually received, and a name tag identifying the recipe. Records are
//! plain data; once returned they are never mutated.

use std::sync::atomic::{AtomicU64, Ordering};

use descent::{Direction, Halt, Outcome};
use engines::{CalcResult, Calculator};
use matter::Structure;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thermo::{Geometry, Harmonic, IdealGas};

use crate::{OptAlgo, OptFlags, RecipeError, settings};

static RECORD_ID: AtomicU64 = AtomicU64::new(0);

/// a unique node identifier for the external store: pid plus a per-process
/// counter
fn next_id() -> String {
    format!(
        "{}-{:06}",
        std::process::id(),
        RECORD_ID.fetch_add(1, Ordering::Relaxed)
    )
}

/// the outcome of a single static evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    /// which recipe produced this
    pub name: String,
    pub formula: String,
    pub natoms: usize,
    /// eV
    pub energy: f64,
    /// eV/Å
    pub forces: Vec<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<isize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spin_multiplicity: Option<usize>,
    /// the parameters the engine actually received
    pub parameters: Value,
    pub input_structure: Structure,
    pub structure: Structure,
    /// scratch directory of an external engine run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// engine wall seconds
    pub time: f64,
}

/// the outcome of an optimization, one static record plus walk metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptRecord {
    #[serde(flatten)]
    pub run: RunRecord,
    pub optimizer: OptAlgo,
    pub fmax_target: f64,
    pub max_steps: usize,
    pub steps: usize,
    pub halt: Halt,
    pub converged: bool,
    /// the largest force component when the walk halted
    pub fmax: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// provenance of the exploratory stage of a composed recipe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_irc: Option<Box<OptRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibRecord {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub natoms: usize,
    pub parameters: Value,
    pub structure: Structure,
    /// cm⁻¹, imaginary modes negative, ascending
    pub frequencies: Vec<f64>,
    /// ħω in eV
    pub energies: Vec<f64>,
    pub n_imaginary: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermoRecord {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
    pub symmetry_number: usize,
    pub spin_multiplicity: usize,
    /// K
    pub temperature: f64,
    /// bar
    pub pressure: f64,
    /// all energies in eV, entropy in eV/K
    pub potential_energy: f64,
    pub zpe: f64,
    pub internal_energy: f64,
    pub enthalpy: f64,
    pub entropy: f64,
    pub gibbs: f64,
}

/// a vibrational analysis with its thermochemistry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqRecord {
    pub vib: VibRecord,
    pub thermo: ThermoRecord,
}

pub fn summarize_run(
    name: &str,
    calc: &dyn Calculator,
    input_structure: &Structure,
    structure: Structure,
    result: &CalcResult,
    charge_and_multiplicity: Option<(isize, usize)>,
) -> RunRecord {
    RunRecord {
        id: next_id(),
        name: name.to_string(),
        formula: structure.formula(),
        natoms: structure.len(),
        energy: result.energy,
        forces: result.forces.clone(),
        charge: charge_and_multiplicity.map(|cm| cm.0),
        spin_multiplicity: charge_and_multiplicity.map(|cm| cm.1),
        parameters: calc.parameters(),
        input_structure: input_structure.clone(),
        structure,
        dir: result.dir.as_ref().map(|d| d.display().to_string()),
        time: result.time,
    }
}

/// Summarize a walk, applying the process-wide convergence gate: an
/// unconverged walk is an error unless the gate is off, in which case the
/// non-convergence travels as metadata instead.
#[allow(clippy::too_many_arguments)]
pub fn summarize_opt(
    name: &str,
    calc: &dyn Calculator,
    input_structure: &Structure,
    structure: Structure,
    outcome: &Outcome,
    flags: &OptFlags,
    direction: Option<Direction>,
    charge_and_multiplicity: Option<(isize, usize)>,
) -> Result<OptRecord, RecipeError> {
    let converged = outcome.halt == Halt::Converged;
    if settings::current().check_convergence && !converged {
        return Err(RecipeError::Unconverged {
            name: name.to_string(),
            steps: outcome.steps,
            fmax: outcome.fmax,
            fmax_target: flags.fmax,
        });
    }
    let natoms = structure.len();
    let forces = outcome
        .gradient
        .iter()
        .take(3 * natoms)
        .copied()
        .collect::<Vec<f64>>()
        .chunks_exact(3)
        .map(|g| [-g[0], -g[1], -g[2]])
        .collect();
    Ok(OptRecord {
        run: RunRecord {
            id: next_id(),
            name: name.to_string(),
            formula: structure.formula(),
            natoms,
            energy: outcome.energy,
            forces,
            charge: charge_and_multiplicity.map(|cm| cm.0),
            spin_multiplicity: charge_and_multiplicity.map(|cm| cm.1),
            parameters: calc.parameters(),
            input_structure: input_structure.clone(),
            structure,
            dir: None,
            time: 0.0,
        },
        optimizer: flags.optimizer,
        fmax_target: flags.fmax,
        max_steps: flags.max_steps,
        steps: outcome.steps,
        halt: outcome.halt,
        converged,
        fmax: outcome.fmax,
        direction,
        initial_irc: None,
    })
}

pub fn summarize_vib(
    name: &str,
    calc: &dyn Calculator,
    structure: &Structure,
    harmonic: &Harmonic,
) -> VibRecord {
    VibRecord {
        id: next_id(),
        name: name.to_string(),
        formula: structure.formula(),
        natoms: structure.len(),
        parameters: calc.parameters(),
        structure: structure.clone(),
        frequencies: harmonic.freqs_cm.clone(),
        energies: harmonic.energies_ev.clone(),
        n_imaginary: harmonic.n_imaginary,
    }
}

pub fn summarize_thermo(
    name: &str,
    ig: &IdealGas,
    temperature: f64,
    pressure_bar: f64,
) -> ThermoRecord {
    let p_pa = pressure_bar * 1e5;
    ThermoRecord {
        id: next_id(),
        name: name.to_string(),
        geometry: ig.geometry,
        symmetry_number: ig.symmetry_number,
        spin_multiplicity: ig.multiplicity,
        temperature,
        pressure: pressure_bar,
        potential_energy: ig.potential_energy,
        zpe: ig.zpe(),
        internal_energy: ig.internal_energy(temperature),
        enthalpy: ig.enthalpy(temperature),
        entropy: ig.entropy(temperature, p_pa),
        gibbs: ig.gibbs(temperature, p_pa),
    }
}
