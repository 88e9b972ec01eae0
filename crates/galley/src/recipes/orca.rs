//! Core recipes for DFT through the ORCA program.
//!
//! These expose the full transition-state tool chain: static, relax, saddle
//! search, IRC walk, and the composed quasi-IRC protocol. Engine selection
//! knobs (functional, basis, SCF algorithm, implicit solvation, core count)
//! are grouped in [OrcaOpts]; free-form `overwrite_inputs` entries pass
//! through to the input deck for anything the knobs do not cover.

use descent::Direction;
use engines::Orca;
use matter::{Structure, resolve_charge_spin};

use crate::{
    Input, OptSwaps, Params, RecipeError,
    recipes::{irc_core, quasi_irc_core, relax_core, static_core, ts_core},
    schema::{OptRecord, RunRecord},
    settings,
};

/// engine selection for the ORCA recipes
#[derive(Debug, Clone, PartialEq)]
pub struct OrcaOpts {
    /// exchange-correlation functional or other electronic structure method
    pub method: String,
    pub basis: String,
    /// SCF convergence algorithm; "gdm" also raises the cycle limit to 200
    pub scf_algorithm: String,
    /// dielectric constant of the polarizable-continuum model
    pub cpcm_dielectric: Option<f64>,
    /// named solvent for the SMD model; mutually exclusive with the above
    pub smd_solvent: Option<String>,
    /// cores for the run; defaults to the process-wide settings, then to
    /// the host's available parallelism
    pub n_cores: Option<usize>,
    /// extra input-deck keywords and blocks, merged over the recipe's
    /// rendering
    pub overwrite_inputs: Params,
}

impl Default for OrcaOpts {
    fn default() -> Self {
        Self {
            method: "wb97m-v".to_string(),
            basis: "def2-tzvpd".to_string(),
            scf_algorithm: "diis".to_string(),
            cpcm_dielectric: None,
            smd_solvent: None,
            n_cores: None,
            overwrite_inputs: Params::new(),
        }
    }
}

fn build(
    structure: &Structure,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
) -> Result<(Orca, (isize, usize)), RecipeError> {
    let resolved = resolve_charge_spin(structure, charge, spin_multiplicity)?;
    let mut calc = Orca::new(resolved.0, resolved.1);
    calc.method = opts.method.clone();
    calc.basis = opts.basis.clone();
    calc.scf_algorithm = opts.scf_algorithm.clone();
    if opts.scf_algorithm.eq_ignore_ascii_case("gdm") {
        calc.scf_max_cycles = Some(200);
    }
    calc.cpcm_dielectric = opts.cpcm_dielectric;
    calc.smd_solvent = opts.smd_solvent.clone();
    calc.nprocs = opts
        .n_cores
        .unwrap_or_else(|| settings::current().effective_cores());
    let calc = calc.apply_params(&opts.overwrite_inputs)?;
    // configuration contract violations surface here, before any engine run
    calc.validate()?;
    Ok((calc, resolved))
}

/// Carry out a single-point calculation.
pub fn static_job(
    input: impl Into<Input>,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
) -> Result<RunRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, charge, spin_multiplicity, opts)?;
    static_core(
        "ORCA Static",
        &calc,
        Input::Structure(structure),
        Some(resolved),
    )
}

/// Optimize a molecular structure.
pub fn relax_job(
    input: impl Into<Input>,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, charge, spin_multiplicity, opts)?;
    relax_core(
        "ORCA Optimization",
        &calc,
        Input::Structure(structure),
        false,
        opt_swaps,
        Some(resolved),
    )
}

/// Search for a first-order saddle point. Only the designated saddle
/// algorithm is accepted.
pub fn ts_job(
    input: impl Into<Input>,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, charge, spin_multiplicity, opts)?;
    ts_core(
        "ORCA TS Optimization",
        &calc,
        Input::Structure(structure),
        opt_swaps,
        Some(resolved),
    )
}

/// Walk the intrinsic reaction coordinate away from a saddle point.
pub fn irc_job(
    input: impl Into<Input>,
    direction: Direction,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, charge, spin_multiplicity, opts)?;
    irc_core(
        "ORCA IRC Optimization",
        &calc,
        Input::Structure(structure),
        direction,
        opt_swaps,
        Some(resolved),
    )
}

/// Quasi-IRC: a loose IRC kick, then a full relaxation, with the IRC record
/// embedded in the result for provenance.
#[allow(clippy::too_many_arguments)]
pub fn quasi_irc_job(
    input: impl Into<Input>,
    direction: Direction,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    opts: &OrcaOpts,
    irc_swaps: &OptSwaps,
    relax_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, charge, spin_multiplicity, opts)?;
    quasi_irc_core(
        "ORCA IRC Optimization",
        "ORCA Optimization",
        &calc,
        Input::Structure(structure),
        direction,
        irc_swaps,
        relax_swaps,
        Some(resolved),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OptAlgo;

    fn water() -> Structure {
        "O 0.0 0.0 0.1197
         H 0.0 0.7616 -0.4786
         H 0.0 -0.7616 -0.4786"
            .parse()
            .unwrap()
    }

    #[test]
    fn ts_rejects_non_saddle_optimizers_before_any_engine_work() {
        // no orca installation is needed to observe this failure
        let got = ts_job(
            water(),
            None,
            None,
            &OrcaOpts::default(),
            &OptSwaps {
                optimizer: Some(OptAlgo::Fire),
                ..Default::default()
            },
        );
        assert!(matches!(
            got,
            Err(RecipeError::WrongOptimizer {
                recipe: "ts",
                expected: OptAlgo::Rfo,
                got: OptAlgo::Fire,
            })
        ));
    }

    #[test]
    fn conflicting_solvation_rejected() {
        let opts = OrcaOpts {
            cpcm_dielectric: Some(78.4),
            smd_solvent: Some("water".to_string()),
            ..Default::default()
        };
        let got = static_job(water(), None, None, &opts);
        assert!(matches!(
            got,
            Err(RecipeError::Engine(
                engines::EngineError::ConflictingSolvation
            ))
        ));
    }

    #[test]
    fn missing_executable_fails_at_call_time() {
        let mut overwrite = Params::new();
        overwrite.insert("cmd".to_string(), json!("surely-no-such-orca"));
        let opts = OrcaOpts {
            overwrite_inputs: overwrite,
            ..Default::default()
        };
        let got = static_job(water(), None, None, &opts);
        assert!(matches!(
            got,
            Err(RecipeError::Engine(
                engines::EngineError::MissingExecutable { .. }
            ))
        ));
    }

    #[test]
    fn charge_spin_resolution_happens_first() {
        let got = static_job(water(), Some(100), None, &OrcaOpts::default());
        assert!(matches!(got, Err(RecipeError::ChargeSpin(_))));
    }

    #[test]
    fn gdm_raises_the_cycle_limit() {
        let opts = OrcaOpts {
            scf_algorithm: "gdm".to_string(),
            ..Default::default()
        };
        let (calc, resolved) = build(&water(), None, None, &opts).unwrap();
        assert_eq!(resolved, (0, 1));
        assert_eq!(calc.scf_max_cycles, Some(200));
        assert!(calc.nprocs >= 1);
    }
}
