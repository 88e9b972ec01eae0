//! Rational-function saddle search.
//!
//! Partitioned eigenvector following: the step maximizes the energy along the
//! lowest Hessian mode and minimizes it along the rest, with the two
//! rational-function shifts of Banerjee et al. The Hessian is rebuilt
//! numerically every iteration, which is affordable at recipe scale and
//! avoids stale-update surprises near the saddle.

use crate::{
    Dvec, Eval, EvalError, Halt, Outcome, Surface, fmax, hessian, sorted_eigs,
};

/// modes flatter than this with no gradient along them are frozen instead of
/// stepped, which keeps rigid-body null modes from amplifying noise
const NULL_MODE_EPS: f64 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct Rfo {
    /// cap on the norm of a single step
    pub max_step: f64,
    /// displacement used for the numerical Hessian
    pub hess_step: f64,
}

impl Default for Rfo {
    fn default() -> Self {
        Self {
            max_step: 0.2,
            hess_step: 1e-3,
        }
    }
}

impl Rfo {
    pub fn run(
        &self,
        surface: &dyn Surface,
        x0: Dvec,
        fmax_tol: f64,
        max_steps: usize,
    ) -> Result<Outcome, EvalError> {
        let mut x = x0;
        let mut steps = 0;
        loop {
            let Eval { energy, gradient } = surface.eval(&x)?;
            let fm = fmax(&gradient);
            log::trace!("rfo step {steps}: e = {energy:.8}, fmax = {fm:.2e}");
            let halt = if fm <= fmax_tol {
                Some(Halt::Converged)
            } else if steps >= max_steps {
                Some(Halt::MaxSteps)
            } else {
                None
            };
            if let Some(halt) = halt {
                return Ok(Outcome {
                    x,
                    energy,
                    gradient,
                    fmax: fm,
                    steps,
                    halt,
                    first_step: None,
                });
            }
            let h = hessian(surface, &x, self.hess_step)?;
            let (vals, vecs) = sorted_eigs(&h);
            // gradient in the eigenbasis
            let gbar = vecs.transpose() * &gradient;

            // shift that walks uphill along the lowest mode
            let (h0, g0) = (vals[0], gbar[0]);
            let lambda_up = 0.5 * (h0 + (h0 * h0 + 4.0 * g0 * g0).sqrt());
            // shift that keeps every other mode downhill; built from the
            // lowest remaining eigenvalue so the denominators stay positive
            let (h1, g1) = (vals[1], gbar[1]);
            let lambda_down = 0.5 * (h1 - (h1 * h1 + 4.0 * g1 * g1).sqrt());

            let mut sbar = Dvec::zeros(vals.len());
            sbar[0] = -g0 / (h0 - lambda_up).min(-NULL_MODE_EPS);
            for i in 1..vals.len() {
                if vals[i].abs() < NULL_MODE_EPS
                    && gbar[i].abs() < NULL_MODE_EPS
                {
                    continue;
                }
                sbar[i] = -gbar[i] / (vals[i] - lambda_down).max(NULL_MODE_EPS);
            }
            let mut dx = vecs * sbar;
            let dnorm = dx.norm();
            if dnorm > self.max_step {
                dx *= self.max_step / dnorm;
            }
            x += dx;
            steps += 1;
        }
    }
}
