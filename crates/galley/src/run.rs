//! Adapters between structures, engines, and walkers, and the three
//! operations every recipe is built from: one static evaluation, one walk,
//! one Hessian.

use descent::{
    Direction, Dvec, Eval, EvalError, Fire, Irc, Outcome, Rfo, Surface,
};
use engines::{CalcResult, Calculator};
use matter::{Mat3, Structure};
use thermo::Harmonic;

use crate::{OptAlgo, OptFlags, RecipeError};

pub(crate) fn forces_to_gradient(forces: &[[f64; 3]]) -> Dvec {
    Dvec::from_iterator(
        3 * forces.len(),
        forces.iter().flat_map(|f| f.iter().map(|c| -c)),
    )
}

/// a structure with an engine attached, exposed to the walkers as a surface
/// over the flat position vector
pub(crate) struct MolSurface<'a> {
    pub base: Structure,
    pub calc: &'a dyn Calculator,
}

impl Surface for MolSurface<'_> {
    fn eval(&self, x: &Dvec) -> Result<Eval, EvalError> {
        let mut s = self.base.clone();
        s.set_positions(x);
        let r = self.calc.compute(&s)?;
        Ok(Eval {
            energy: r.energy,
            gradient: forces_to_gradient(&r.forces),
        })
    }
}

/// the cell-relaxation filter: nine deformation components appended to the
/// position vector. atomic gradients come from the engine forces by the
/// chain rule through the deformation; strain gradients by central
/// differences of the energy
pub(crate) struct CellSurface<'a> {
    base: Structure,
    cell0: Mat3,
    calc: &'a dyn Calculator,
    strain_step: f64,
}

impl<'a> CellSurface<'a> {
    pub fn new(base: Structure, calc: &'a dyn Calculator) -> Self {
        let cell0 = base
            .cell_matrix()
            .expect("cell relaxation requires a cell");
        Self {
            base,
            cell0,
            calc,
            strain_step: 1e-4,
        }
    }

    pub fn initial_dof(&self) -> Dvec {
        let n = 3 * self.base.len();
        let mut x = Dvec::zeros(n + 9);
        x.rows_mut(0, n).copy_from(&self.base.positions());
        x
    }

    fn deformation(&self, x: &Dvec) -> Mat3 {
        let n = 3 * self.base.len();
        let mut f = Mat3::identity();
        for a in 0..3 {
            for b in 0..3 {
                f[(a, b)] += x[n + 3 * a + b];
            }
        }
        f
    }

    /// the structure described by a DOF vector: positions and cell both
    /// carried through the deformation
    pub fn rebuild(&self, x: &Dvec) -> Structure {
        let f = self.deformation(x);
        let mut s = self.base.clone();
        for (i, a) in s.atoms.iter_mut().enumerate() {
            let p = f * matter::Vec3::new(x[3 * i], x[3 * i + 1], x[3 * i + 2]);
            (a.x, a.y, a.z) = (p[0], p[1], p[2]);
        }
        let cell = self.cell0 * f.transpose();
        let mut rows = [[0.0; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                rows[a][b] = cell[(a, b)];
            }
        }
        s.cell = Some(rows);
        s
    }
}

impl Surface for CellSurface<'_> {
    fn eval(&self, x: &Dvec) -> Result<Eval, EvalError> {
        let n = 3 * self.base.len();
        let s = self.rebuild(x);
        let r = self.calc.compute(&s)?;
        let f = self.deformation(x);
        let mut gradient = Dvec::zeros(n + 9);
        for (i, force) in r.forces.iter().enumerate() {
            let g = f.transpose()
                * matter::Vec3::new(-force[0], -force[1], -force[2]);
            gradient[3 * i] = g[0];
            gradient[3 * i + 1] = g[1];
            gradient[3 * i + 2] = g[2];
        }
        for k in 0..9 {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[n + k] += self.strain_step;
            xm[n + k] -= self.strain_step;
            let ep = self.calc.compute(&self.rebuild(&xp))?.energy;
            let em = self.calc.compute(&self.rebuild(&xm))?.energy;
            gradient[n + k] = (ep - em) / (2.0 * self.strain_step);
        }
        Ok(Eval {
            energy: r.energy,
            gradient,
        })
    }
}

/// one static evaluation, after the capability probe
pub fn run_calc(
    structure: &Structure,
    calc: &dyn Calculator,
) -> Result<CalcResult, RecipeError> {
    calc.check_available()?;
    Ok(calc.compute(structure)?)
}

/// One walk: dispatch on the optimizer, return the walked structure and the
/// walker's outcome.
///
/// `relax_cell` only applies to minimization and requires periodicity;
/// the caller has already downgraded it otherwise. `direction` is required
/// by (and only by) the IRC walker.
pub(crate) fn run_opt(
    structure: Structure,
    calc: &dyn Calculator,
    flags: &OptFlags,
    relax_cell: bool,
    direction: Option<Direction>,
) -> Result<(Structure, Outcome), RecipeError> {
    calc.check_available()?;
    let mut s = structure;
    match flags.optimizer {
        OptAlgo::Fire if relax_cell => {
            let surf = CellSurface::new(s.clone(), calc);
            let out = Fire::default()
                .run(&surf, surf.initial_dof(), flags.fmax, flags.max_steps)
                .map_err(RecipeError::from_eval)?;
            s = surf.rebuild(&out.x);
            Ok((s, out))
        }
        OptAlgo::Fire => {
            let surf = MolSurface {
                base: s.clone(),
                calc,
            };
            let out = Fire::default()
                .run(&surf, s.positions(), flags.fmax, flags.max_steps)
                .map_err(RecipeError::from_eval)?;
            s.set_positions(&out.x);
            Ok((s, out))
        }
        OptAlgo::Rfo => {
            let surf = MolSurface {
                base: s.clone(),
                calc,
            };
            let out = Rfo::default()
                .run(&surf, s.positions(), flags.fmax, flags.max_steps)
                .map_err(RecipeError::from_eval)?;
            s.set_positions(&out.x);
            Ok((s, out))
        }
        OptAlgo::Irc => {
            let direction = direction.ok_or_else(|| {
                RecipeError::Walk(
                    "the irc walker requires a direction".to_string(),
                )
            })?;
            let surf = MolSurface {
                base: s.clone(),
                calc,
            };
            let out = Irc::default()
                .run(
                    &surf,
                    s.positions(),
                    direction,
                    flags.fmax,
                    flags.max_steps,
                )
                .map_err(RecipeError::from_eval)?;
            s.set_positions(&out.x);
            Ok((s, out))
        }
    }
}

/// one numerical Hessian plus normal-mode analysis
pub(crate) fn run_vib(
    structure: &Structure,
    calc: &dyn Calculator,
    step: f64,
) -> Result<Harmonic, RecipeError> {
    calc.check_available()?;
    let surf = MolSurface {
        base: structure.clone(),
        calc,
    };
    let hess = descent::hessian(&surf, &structure.positions(), step)
        .map_err(RecipeError::from_eval)?;
    Ok(thermo::harmonic(&hess, &structure.masses()))
}

#[cfg(test)]
mod tests {
    use engines::LennardJones;
    use matter::Atom;

    use super::*;

    #[test]
    fn surface_negates_forces() {
        let lj = LennardJones::default();
        let s = Structure::new(vec![
            Atom::new(18, 0.0, 0.0, 0.0),
            Atom::new(18, 1.5, 0.0, 0.0),
        ]);
        let surf = MolSurface {
            base: s.clone(),
            calc: &lj,
        };
        let eval = surf.eval(&s.positions()).unwrap();
        let forces = lj.compute(&s).unwrap().forces;
        assert_eq!(eval.gradient[0], -forces[0][0]);
        assert_eq!(eval.gradient[3], -forces[1][0]);
    }

    #[test]
    fn cell_surface_round_trips_at_zero_strain() {
        let lj = LennardJones::default();
        let s = Structure::new(vec![Atom::new(18, 0.1, 0.2, 0.3)]).with_cell(
            [[1.5, 0.0, 0.0], [0.0, 1.5, 0.0], [0.0, 0.0, 1.5]],
            [true; 3],
        );
        let surf = CellSurface::new(s.clone(), &lj);
        let rebuilt = surf.rebuild(&surf.initial_dof());
        assert_eq!(rebuilt, s);
    }

    #[test]
    fn cell_strain_gradient_sees_pressure() {
        // a compressed cubic crystal pushes outward: the trace of the strain
        // gradient is negative (energy falls as the cell expands)
        let lj = LennardJones::default();
        let s = Structure::new(vec![Atom::new(18, 0.0, 0.0, 0.0)]).with_cell(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [true; 3],
        );
        let surf = CellSurface::new(s.clone(), &lj);
        let eval = surf.eval(&surf.initial_dof()).unwrap();
        let n = 3 * s.len();
        let trace =
            eval.gradient[n] + eval.gradient[n + 4] + eval.gradient[n + 8];
        assert!(trace < 0.0, "trace = {trace}");
    }
}
