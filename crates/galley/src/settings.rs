//! Process-wide execution settings.
//!
//! Two knobs cross recipe boundaries: whether the summarizer rejects
//! unconverged optimizations, and how many cores external engines may use.
//! [scoped] applies a temporary override whose restoration is structural:
//! the prior settings come back when the guard drops, on every path out,
//! including panics and early `?` returns.
//!
//! The read-modify-restore cycle is still shared mutable state: concurrent
//! scoped overrides from multiple threads of one process interleave
//! arbitrarily. Recipes that use [scoped] (quasi-IRC) are single-flight per
//! process; workflow engines that want more parallelism run recipes in
//! separate processes, which is how they are scheduled anyway.

use std::{sync::RwLock, thread};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// reject unconverged optimizations at the summarizer
    pub check_convergence: bool,
    /// cores handed to external engines. `None` falls back to the host's
    /// available parallelism
    pub cores: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_convergence: true,
            cores: None,
        }
    }
}

impl Settings {
    pub fn effective_cores(&self) -> usize {
        self.cores.unwrap_or_else(|| {
            thread::available_parallelism().map(usize::from).unwrap_or(1)
        })
    }
}

static SETTINGS: RwLock<Settings> = RwLock::new(Settings {
    check_convergence: true,
    cores: None,
});

/// a snapshot of the current settings
pub fn current() -> Settings {
    *SETTINGS.read().unwrap()
}

/// replace the settings outright, for process setup (the CLI does this once
/// before dispatching)
pub fn set(settings: Settings) {
    *SETTINGS.write().unwrap() = settings;
}

/// restores the settings it displaced when dropped
#[must_use = "the override ends when the guard drops"]
pub struct Scoped {
    prior: Settings,
}

/// Apply `f` to the settings and hold the change until the returned guard
/// drops.
pub fn scoped(f: impl FnOnce(&mut Settings)) -> Scoped {
    let mut guard = SETTINGS.write().unwrap();
    let prior = *guard;
    f(&mut guard);
    Scoped { prior }
}

impl Drop for Scoped {
    fn drop(&mut self) {
        *SETTINGS.write().unwrap() = self.prior;
    }
}
