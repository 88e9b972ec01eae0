//! Declarative recipes over the energy/force engines.
//!
//! A recipe takes a structure (or the record of a previous stage), merges
//! its configuration defaults with caller overrides, hands the numerical
//! work to an engine and a walker, and normalizes the outcome into a result
//! record. Recipes are synchronous, single-flight units of work meant to be
//! scheduled as opaque tasks by an external workflow engine; nothing here
//! retries, times out, or persists.

use std::{error::Error, fmt::Display};

use engines::EngineError;
use matter::ChargeSpinError;

pub mod config;
pub mod input;
pub mod opt;
pub mod params;
pub mod recipes;
pub mod run;
pub mod schema;
pub mod settings;

pub use descent::{Direction, Halt};
pub use input::Input;
pub use opt::{OptAlgo, OptFlags, OptSwaps};
pub use params::{Params, merge};
pub use schema::{FreqRecord, OptRecord, RunRecord, ThermoRecord, VibRecord};

#[derive(Debug)]
pub enum RecipeError {
    Engine(EngineError),
    ChargeSpin(ChargeSpinError),
    /// the recipe is pinned to one walker and the caller picked another.
    /// raised before any engine evaluation
    WrongOptimizer {
        recipe: &'static str,
        expected: OptAlgo,
        got: OptAlgo,
    },
    /// the walk ran out of steps while the convergence gate was enabled
    Unconverged {
        name: String,
        steps: usize,
        fmax: f64,
        fmax_target: f64,
    },
    /// a walker failed for a reason other than an engine error
    Walk(String),
}

impl Display for RecipeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{e}"),
            Self::ChargeSpin(e) => write!(f, "{e}"),
            Self::WrongOptimizer {
                recipe,
                expected,
                got,
            } => write!(
                f,
                "the {recipe} recipe only runs with the {expected} \
                 optimizer, not {got}"
            ),
            Self::Unconverged {
                name,
                steps,
                fmax,
                fmax_target,
            } => write!(
                f,
                "{name} failed to converge in {steps} steps \
                 (fmax {fmax:.2e}, target {fmax_target:.2e})"
            ),
            Self::Walk(msg) => write!(f, "{msg}"),
        }
    }
}

impl Error for RecipeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::ChargeSpin(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for RecipeError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<ChargeSpinError> for RecipeError {
    fn from(e: ChargeSpinError) -> Self {
        Self::ChargeSpin(e)
    }
}

impl RecipeError {
    /// recover the engine error smuggled through a walker's opaque
    /// evaluation error, if that is what it was
    pub(crate) fn from_eval(e: descent::EvalError) -> Self {
        match e.downcast::<EngineError>() {
            Ok(engine) => Self::Engine(*engine),
            Err(other) => Self::Walk(other.to_string()),
        }
    }
}
