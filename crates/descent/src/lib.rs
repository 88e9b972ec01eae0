//! Iterative walkers over a potential energy surface: a FIRE minimizer, an
//! eigenvector-following saddle search, and an IRC-style downhill walker.
//!
//! Every walker operates on a flat vector of degrees of freedom through the
//! [Surface] trait and reports the same [Outcome], including which of the two
//! termination conditions fired.

use serde::{Deserialize, Serialize};

pub mod fire;
pub mod hessian;
pub mod irc;
pub mod rfo;

pub use fire::Fire;
pub use hessian::hessian;
pub use irc::{Direction, Irc};
pub use rfo::Rfo;

pub type Dvec = nalgebra::DVector<f64>;
pub type Dmat = nalgebra::DMatrix<f64>;

/// errors from a surface evaluation are opaque to the walkers and propagate
/// unchanged
pub type EvalError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// call `rayon::ThreadPoolBuilder` to set `num_threads` to `n`. Discards the
/// error returned by `build_global` if the thread pool has already been
/// initialized
pub fn max_threads(n: usize) {
    let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
}

/// one evaluation of the surface: the energy and its gradient with respect to
/// the degrees of freedom
#[derive(Debug, Clone)]
pub struct Eval {
    pub energy: f64,
    pub gradient: Dvec,
}

/// a potential energy surface over a flat vector of degrees of freedom.
/// `Sync` so the numerical Hessian can evaluate displacements in parallel
pub trait Surface: Sync {
    fn eval(&self, x: &Dvec) -> Result<Eval, EvalError>;
}

impl<F> Surface for F
where
    F: Fn(&Dvec) -> Result<Eval, EvalError> + Sync,
{
    fn eval(&self, x: &Dvec) -> Result<Eval, EvalError> {
        self(x)
    }
}

/// which termination condition ended a walk
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Halt {
    Converged,
    MaxSteps,
}

/// the state of a walk when it halted
#[derive(Debug, Clone)]
pub struct Outcome {
    pub x: Dvec,
    pub energy: f64,
    pub gradient: Dvec,
    pub fmax: f64,
    pub steps: usize,
    pub halt: Halt,
    /// the displacement taken before the first downhill step, for
    /// mode-following walkers
    pub first_step: Option<Dvec>,
}

impl Outcome {
    pub fn converged(&self) -> bool {
        self.halt == Halt::Converged
    }
}

/// the largest absolute gradient component, the convergence measure shared by
/// all walkers
pub fn fmax(gradient: &Dvec) -> f64 {
    gradient.iter().fold(0.0, |acc, g| g.abs().max(acc))
}

/// eigendecompose a symmetric matrix, returning (values, vectors-as-columns)
/// sorted by ascending eigenvalue
pub(crate) fn sorted_eigs(h: &Dmat) -> (Vec<f64>, Dmat) {
    let eig = nalgebra::SymmetricEigen::new(h.clone());
    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));
    let vals = order.iter().map(|&i| eig.eigenvalues[i]).collect();
    let cols: Vec<_> =
        order.iter().map(|&i| eig.eigenvectors.column(i).into_owned()).collect();
    (vals, Dmat::from_columns(&cols))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmax_is_largest_component() {
        let g = Dvec::from_row_slice(&[0.1, -0.7, 0.3]);
        assert_eq!(fmax(&g), 0.7);
        assert_eq!(fmax(&Dvec::zeros(3)), 0.0);
    }

    #[test]
    fn eigs_sorted_ascending() {
        let h = Dmat::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -2.0]);
        let (vals, vecs) = sorted_eigs(&h);
        assert!((vals[0] + 2.0).abs() < 1e-12);
        assert!((vals[1] - 1.0).abs() < 1e-12);
        // lowest mode points along y
        assert!(vecs[(1, 0)].abs() > 0.99);
    }
}
