//! Reaction-path walker.
//!
//! From a saddle point, displace along the imaginary (lowest-curvature) mode
//! in the requested direction, then follow the force downhill with damped
//! Euler steps. The direction is a per-invocation argument of [Irc::run],
//! not a constructor field: one walker instance serves both path branches.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Dvec, Eval, EvalError, Halt, Outcome, Surface, fmax, hessian, sorted_eigs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Reverse => write!(f, "reverse"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "reverse" => Ok(Direction::Reverse),
            _ => Err(format!("no such direction {s}, expected forward or reverse")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Irc {
    /// the size of the initial displacement off the saddle
    pub displacement: f64,
    /// the arc length of one downhill step
    pub step: f64,
    /// displacement used for the numerical Hessian
    pub hess_step: f64,
}

impl Default for Irc {
    fn default() -> Self {
        Self {
            displacement: 0.05,
            step: 0.05,
            hess_step: 1e-3,
        }
    }
}

impl Irc {
    pub fn run(
        &self,
        surface: &dyn Surface,
        x0: Dvec,
        direction: Direction,
        fmax_tol: f64,
        max_steps: usize,
    ) -> Result<Outcome, EvalError> {
        let h = hessian(surface, &x0, self.hess_step)?;
        let (vals, vecs) = sorted_eigs(&h);
        let mut mode: Dvec = vecs.column(0).into_owned();
        log::debug!(
            "irc {direction}: lowest mode eigenvalue {:.6}",
            vals[0]
        );
        // fix the arbitrary eigenvector orientation so that forward and
        // reverse are deterministic opposites across invocations
        let lead = mode
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .map(|(i, _)| i)
            .unwrap_or(0);
        if mode[lead] < 0.0 {
            mode.neg_mut();
        }
        let kick = direction.sign() * self.displacement * mode;
        let mut x = x0 + &kick;
        let mut steps = 0;
        loop {
            let Eval { energy, gradient } = surface.eval(&x)?;
            let fm = fmax(&gradient);
            log::trace!("irc step {steps}: e = {energy:.8}, fmax = {fm:.2e}");
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
                    first_step: Some(kick),
                });
            }
            let f = -&gradient;
            let fnorm = f.norm();
            // damped Euler: full force step when small, arc-length capped
            // otherwise
            x += &f * (self.step / fnorm).min(1.0);
            steps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// saddle at the origin: E = -x^2/2 + y^2/2
    fn ridge(x: &Dvec) -> Result<Eval, EvalError> {
        Ok(Eval {
            energy: 0.5 * (x[1] * x[1] - x[0] * x[0]),
            gradient: Dvec::from_row_slice(&[-x[0], x[1]]),
        })
    }

    #[test]
    fn directions_are_opposite() {
        let irc = Irc::default();
        let x0 = Dvec::zeros(2);
        let fwd = irc
            .run(&ridge, x0.clone(), Direction::Forward, 100.0, 10)
            .unwrap();
        let rev = irc
            .run(&ridge, x0, Direction::Reverse, 100.0, 10)
            .unwrap();
        let (a, b) = (fwd.first_step.unwrap(), rev.first_step.unwrap());
        assert!(a.dot(&b) < 0.0);
        assert_eq!(a, -b);
        // the unstable mode is x, so the kick is along x
        assert!(a[0].abs() > 1e-3);
        assert!(a[1].abs() < 1e-10);
    }

    #[test]
    fn walks_downhill() {
        let out = Irc::default()
            .run(&ridge, Dvec::zeros(2), Direction::Forward, 1e-8, 40)
            .unwrap();
        // the ridge has no minimum; the walker runs out of steps with the
        // energy strictly below the saddle
        assert_eq!(out.halt, Halt::MaxSteps);
        assert!(out.energy < 0.0);
        assert!(out.x[0] > 0.0);
    }

    #[test]
    fn direction_round_trips_through_strings() {
        for d in [Direction::Forward, Direction::Reverse] {
            assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
        }
        assert!("sideways".parse::<Direction>().is_err());
    }
}
