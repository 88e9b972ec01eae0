//! Core recipes for the effective-medium potential.
//!
//! Mostly useful for demonstrations and for exercising workflows without an
//! external engine.

use engines::Emt;
use serde_json::json;

use crate::{
    Input, OptSwaps, Params, RecipeError, merge,
    recipes::{relax_core, static_core},
    schema::{OptRecord, RunRecord},
};

fn engine(calc_kwargs: &Params) -> Result<Emt, RecipeError> {
    let mut defaults = Params::new();
    defaults.insert("fd_step".to_string(), json!(1e-4));
    Ok(Emt::from_params(&merge(defaults, calc_kwargs))?)
}

/// Carry out a static calculation.
pub fn static_job(
    input: impl Into<Input>,
    calc_kwargs: &Params,
) -> Result<RunRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    static_core("EMT Static", &calc, input.into(), None)
}

/// Carry out a geometry optimization, optionally relaxing the cell along
/// with the atoms.
pub fn relax_job(
    input: impl Into<Input>,
    relax_cell: bool,
    calc_kwargs: &Params,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let calc = engine(calc_kwargs)?;
    relax_core("EMT Relax", &calc, input.into(), relax_cell, opt_swaps, None)
}

#[cfg(test)]
mod tests {
    use matter::Structure;

    use super::*;

    fn water() -> Structure {
        "O 0.0 0.0 0.1197
         H 0.0 0.7616 -0.4786
         H 0.0 -0.7616 -0.4786"
            .parse()
            .unwrap()
    }

    #[test]
    fn static_water() {
        let rec = static_job(water(), &Params::new()).unwrap();
        assert_eq!(rec.name, "EMT Static");
        assert_eq!(rec.natoms, 3);
        assert!(rec.energy.is_finite());
    }

    #[test]
    fn bad_kwarg_propagates() {
        let mut kwargs = Params::new();
        kwargs.insert("asap_cutoff".to_string(), serde_json::json!(true));
        assert!(matches!(
            static_job(water(), &kwargs),
            Err(RecipeError::Engine(_))
        ));
    }

    #[test]
    fn relax_water() {
        let start = static_job(water(), &Params::new()).unwrap();
        let rec = relax_job(
            water(),
            false,
            &Params::new(),
            &OptSwaps {
                fmax: Some(0.05),
                max_steps: Some(500),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rec.run.name, "EMT Relax");
        assert!(rec.converged);
        assert!(rec.fmax <= 0.05);
        assert!(rec.run.energy <= start.energy + 1e-8);
    }
}
