//! Core recipes for the tblite tight-binding code.
//!
//! All of these require the `tblite` executable; the capability probe runs
//! when a job is invoked, so the rest of the crate works without it.

use engines::{Tblite, tblite::Method};
use matter::resolve_charge_spin;

use crate::{
    Input, OptSwaps, Params, RecipeError,
    recipes::{VibSwaps, freq_core, relax_core, static_core},
    schema::{FreqRecord, OptRecord, RunRecord},
};

fn build(
    structure: &matter::Structure,
    method: Method,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    calc_kwargs: &Params,
) -> Result<(Tblite, (isize, usize)), RecipeError> {
    let resolved = resolve_charge_spin(structure, charge, spin_multiplicity)?;
    let calc = Tblite::new(method, resolved.0, resolved.1)
        .apply_params(calc_kwargs)?;
    Ok((calc, resolved))
}

/// Carry out a single-point calculation.
pub fn static_job(
    input: impl Into<Input>,
    method: Method,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    calc_kwargs: &Params,
) -> Result<RunRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, method, charge, spin_multiplicity, calc_kwargs)?;
    static_core(
        "TBLite Static",
        &calc,
        Input::Structure(structure),
        Some(resolved),
    )
}

/// Relax a structure.
pub fn relax_job(
    input: impl Into<Input>,
    method: Method,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    calc_kwargs: &Params,
    opt_swaps: &OptSwaps,
) -> Result<OptRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, method, charge, spin_multiplicity, calc_kwargs)?;
    relax_core(
        "TBLite Relax",
        &calc,
        Input::Structure(structure),
        false,
        opt_swaps,
        Some(resolved),
    )
}

/// Run a frequency job and calculate thermochemistry.
#[allow(clippy::too_many_arguments)]
pub fn freq_job(
    input: impl Into<Input>,
    method: Method,
    energy: f64,
    temperature: f64,
    pressure_bar: f64,
    charge: Option<isize>,
    spin_multiplicity: Option<usize>,
    calc_kwargs: &Params,
    vib_swaps: &VibSwaps,
) -> Result<FreqRecord, RecipeError> {
    let structure = input.into().into_structure();
    let (calc, resolved) =
        build(&structure, method, charge, spin_multiplicity, calc_kwargs)?;
    freq_core(
        "TBLite Vibrations",
        "TBLite Thermo",
        &calc,
        Input::Structure(structure),
        energy,
        temperature,
        pressure_bar,
        resolved.1,
        vib_swaps,
    )
}
