//! Core recipes for the Lennard-Jones potential.
//!
//! The full job surface is available here, including the saddle-point and
//! reaction-path recipes: LJ cluster rearrangements are the cheapest real
//! systems those walkers apply to, which also makes this module the
//! reference harness for the engine-independent cores.

use descent::Direction;
use engines::LennardJones;
use serde_json::json;

use crate::{
    Input, OptSwaps, Params, RecipeError, merge,
    recipes::{
        VibSwaps, freq_core, irc_core, quasi_irc_core, relax_core,
        static_core, ts_core,
    },
    schema::{FreqRecord, OptRecord, RunRecord},
};

fn engine(calc_kwargs: &Params) -> Result<LennardJones, RecipeError> {
    let mut defaults = Params::new();
    defaults.insert("epsilon".to_string(), json!(1.0));
    defaults.insert("sigma".to_string(), json!(1.0));
    Ok(LennardJones::from_params(&merge(defaults, calc_kwargs))?)
}

/// Carry out a static calculation.
pub fn static_job(
    input: impl Into<Input>,
    calc_kwargs: &Params,
) -> Result<RunRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    static_core("LJ Static", &calc, input.into(), None)
}

/// Carry out a geometry optimization.
pub fn relax_job(
    input: impl Into<Input>,
    calc_kwargs: &Params,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    relax_core("LJ Relax", &calc, input.into(), false, opt_swaps, None)
}

/// Carry out a saddle-point search.
pub fn ts_job(
    input: impl Into<Input>,
    calc_kwargs: &Params,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    ts_core("LJ TS", &calc, input.into(), opt_swaps, None)
}

/// Walk the reaction path away from a saddle point in the given direction.
pub fn irc_job(
    input: impl Into<Input>,
    direction: Direction,
    calc_kwargs: &Params,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    irc_core("LJ IRC", &calc, input.into(), direction, opt_swaps, None)
}

/// A short, loosely converged IRC kick followed by a full relaxation.
pub fn quasi_irc_job(
    input: impl Into<Input>,
    direction: Direction,
    calc_kwargs: &Params,
    irc_swaps: &OptSwaps,
    relax_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    quasi_irc_core(
        "LJ IRC",
        "LJ Relax",
        &calc,
        input.into(),
        direction,
        irc_swaps,
        relax_swaps,
        None,
    )
}

/// Run a frequency job and calculate the ideal-gas thermochemistry.
pub fn freq_job(
    input: impl Into<Input>,
    energy: f64,
    temperature: f64,
    pressure_bar: f64,
    calc_kwargs: &Params,
    vib_swaps: &VibSwaps,
) -> Result<FreqRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    freq_core(
        "LJ Vibrations",
        "LJ Thermo",
        &calc,
        input.into(),
        energy,
        temperature,
        pressure_bar,
        1,
        vib_swaps,
    )
}

#[cfg(test)]
mod tests {
    use matter::{Atom, Structure};

    use super::*;
    use crate::OptAlgo;

    fn dimer(r: f64) -> Structure {
        Structure::new(vec![
            Atom::new(18, 0.0, 0.0, 0.0),
            Atom::new(18, r, 0.0, 0.0),
        ])
    }

    #[test]
    fn relax_finds_the_pair_minimum() {
        let rec = relax_job(
            dimer(1.4),
            &Params::new(),
            &OptSwaps {
                fmax: Some(1e-4),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(rec.converged);
        assert!((rec.run.energy - -1.0).abs() < 1e-6);
        let a = &rec.run.structure.atoms;
        let bond = (a[1].x - a[0].x).abs();
        assert!((bond - 2f64.powf(1.0 / 6.0)).abs() < 1e-2);
    }

    #[test]
    fn ts_rejects_other_optimizers() {
        let got = ts_job(
            dimer(1.4),
            &Params::new(),
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
    fn irc_rejects_other_optimizers() {
        let got = irc_job(
            dimer(1.4),
            Direction::Forward,
            &Params::new(),
            &OptSwaps {
                optimizer: Some(OptAlgo::Rfo),
                ..Default::default()
            },
        );
        assert!(matches!(got, Err(RecipeError::WrongOptimizer { .. })));
    }

    #[test]
    fn freq_of_the_dimer() {
        let r0 = 2f64.powf(1.0 / 6.0);
        let rec = freq_job(
            dimer(r0),
            -1.0,
            298.15,
            1.0,
            &Params::new(),
            &VibSwaps::default(),
        )
        .unwrap();
        assert_eq!(rec.vib.natoms, 2);
        assert_eq!(rec.vib.frequencies.len(), 6);
        // one real stretch above the five trivial modes
        let top = rec.vib.frequencies[5];
        assert!(top > 10.0, "stretch = {top}");
        assert_eq!(rec.thermo.potential_energy, -1.0);
        assert!(rec.thermo.zpe > 0.0);
    }
}
