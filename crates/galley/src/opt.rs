//! Optimizer selection and the typed default/override merge for walker
//! configuration.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// the closed set of walkers a recipe can be pointed at. TS and IRC recipes
/// each accept exactly one member and reject the rest before any engine work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptAlgo {
    /// FIRE minimization
    Fire,
    /// rational-function saddle search
    Rfo,
    /// reaction-path walk
    Irc,
}

impl Display for OptAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptAlgo::Fire => write!(f, "fire"),
            OptAlgo::Rfo => write!(f, "rfo"),
            OptAlgo::Irc => write!(f, "irc"),
        }
    }
}

/// fully resolved walker configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptFlags {
    pub optimizer: OptAlgo,
    /// convergence threshold on the largest force component, eV/Å
    pub fmax: f64,
    pub max_steps: usize,
}

impl OptFlags {
    pub fn relax_defaults() -> Self {
        Self {
            optimizer: OptAlgo::Fire,
            fmax: 0.01,
            max_steps: 1000,
        }
    }

    pub fn ts_defaults() -> Self {
        Self {
            optimizer: OptAlgo::Rfo,
            ..Self::relax_defaults()
        }
    }

    pub fn irc_defaults() -> Self {
        Self {
            optimizer: OptAlgo::Irc,
            ..Self::relax_defaults()
        }
    }

    /// overlay caller swaps, field-wise, override wins
    pub fn merge(self, swaps: &OptSwaps) -> Self {
        Self {
            optimizer: swaps.optimizer.unwrap_or(self.optimizer),
            fmax: swaps.fmax.unwrap_or(self.fmax),
            max_steps: swaps.max_steps.unwrap_or(self.max_steps),
        }
    }
}

/// caller-side overrides for [OptFlags]; unset fields keep the recipe
/// default
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize,
)]
#[serde(deny_unknown_fields)]
pub struct OptSwaps {
    pub optimizer: Option<OptAlgo>,
    pub fmax: Option<f64>,
    pub max_steps: Option<usize>,
}

impl OptSwaps {
    /// overlay `self` on `base`: the composed swaps of a staged recipe,
    /// where the caller's choices beat the stage's own loose defaults
    pub fn over(self, base: OptSwaps) -> OptSwaps {
        OptSwaps {
            optimizer: self.optimizer.or(base.optimizer),
            fmax: self.fmax.or(base.fmax),
            max_steps: self.max_steps.or(base.max_steps),
        }
    }
}
