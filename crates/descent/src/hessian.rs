//! Numerical second derivatives by central differences of the gradient.

use rayon::prelude::*;

use crate::{Dmat, Dvec, EvalError, Surface};

/// Build the Hessian at `x` from central differences of the surface gradient
/// with displacement `step`.
///
/// The 2n displaced evaluations are independent and run on the rayon pool.
/// The result is explicitly symmetrized.
pub fn hessian(
    surface: &dyn Surface,
    x: &Dvec,
    step: f64,
) -> Result<Dmat, EvalError> {
    let n = x.len();
    let cols = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[i] += step;
            xm[i] -= step;
            let gp = surface.eval(&xp)?.gradient;
            let gm = surface.eval(&xm)?.gradient;
            Ok((gp - gm) / (2.0 * step))
        })
        .collect::<Result<Vec<Dvec>, EvalError>>()?;
    let h = Dmat::from_columns(&cols);
    Ok((&h + h.transpose()) * 0.5)
}
