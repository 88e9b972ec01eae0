//! FIRE: fast inertial relaxation engine.
//!
//! Velocity-mixing minimizer of Bitzek et al. The velocity is nudged toward
//! the force direction while the power F·v stays positive and is zeroed on an
//! uphill step, with the timestep adapted in both cases.

use crate::{Dvec, Eval, EvalError, Halt, Outcome, Surface, fmax};

#[derive(Debug, Clone, PartialEq)]
pub struct Fire {
    pub dt: f64,
    pub dt_max: f64,
    pub n_min: usize,
    pub f_inc: f64,
    pub f_dec: f64,
    pub alpha_start: f64,
    pub f_alpha: f64,
    /// cap on the norm of a single step
    pub max_step: f64,
}

impl Default for Fire {
    fn default() -> Self {
        Self {
            dt: 0.1,
            dt_max: 1.0,
            n_min: 5,
            f_inc: 1.1,
            f_dec: 0.5,
            alpha_start: 0.1,
            f_alpha: 0.99,
            max_step: 0.2,
        }
    }
}

impl Fire {
    pub fn run(
        &self,
        surface: &dyn Surface,
        x0: Dvec,
        fmax_tol: f64,
        max_steps: usize,
    ) -> Result<Outcome, EvalError> {
        let mut x = x0;
        let mut v = Dvec::zeros(x.len());
        let mut dt = self.dt;
        let mut alpha = self.alpha_start;
        let mut uphill_free = 0;
        let mut steps = 0;
        loop {
            let Eval { energy, gradient } = surface.eval(&x)?;
            let fm = fmax(&gradient);
            log::trace!("fire step {steps}: e = {energy:.8}, fmax = {fm:.2e}");
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
            let f = -&gradient;
            if f.dot(&v) > 0.0 {
                let (vnorm, fnorm) = (v.norm(), f.norm());
                v = (1.0 - alpha) * v + alpha * vnorm / fnorm * &f;
                if uphill_free > self.n_min {
                    dt = (dt * self.f_inc).min(self.dt_max);
                    alpha *= self.f_alpha;
                }
                uphill_free += 1;
            } else {
                v.fill(0.0);
                alpha = self.alpha_start;
                dt *= self.f_dec;
                uphill_free = 0;
            }
            v += dt * &f;
            let mut dx = dt * &v;
            let dnorm = dx.norm();
            if dnorm > self.max_step {
                dx *= self.max_step / dnorm;
            }
            x += dx;
            steps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bowl(x: &Dvec) -> Result<Eval, EvalError> {
        // E = (x - 1)^2 + 2 y^2
        let (a, b) = (x[0] - 1.0, x[1]);
        Ok(Eval {
            energy: a * a + 2.0 * b * b,
            gradient: Dvec::from_row_slice(&[2.0 * a, 4.0 * b]),
        })
    }

    #[test]
    fn converges_on_quadratic_bowl() {
        let out = Fire::default()
            .run(&bowl, Dvec::from_row_slice(&[-0.5, 0.8]), 1e-6, 2000)
            .unwrap();
        assert_eq!(out.halt, Halt::Converged);
        assert!((out.x[0] - 1.0).abs() < 1e-4);
        assert!(out.x[1].abs() < 1e-4);
        assert!(out.energy < 1e-8);
    }

    #[test]
    fn reports_step_exhaustion() {
        let out = Fire::default()
            .run(&bowl, Dvec::from_row_slice(&[-0.5, 0.8]), 1e-6, 3)
            .unwrap();
        assert_eq!(out.halt, Halt::MaxSteps);
        assert_eq!(out.steps, 3);
        assert!(!out.converged());
    }
}
