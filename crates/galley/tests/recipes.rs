//! End-to-end recipe properties that only need the in-process engines.

use approx::assert_abs_diff_eq;
use galley::{OptSwaps, Params, recipes};
use matter::{Atom, Structure};

fn lj_pair_energy(r: f64) -> f64 {
    4.0 * ((1.0 / r).powi(12) - (1.0 / r).powi(6))
}

/// three atoms in a line at the pair-minimum spacing
fn trimer() -> Structure {
    let d = 2f64.powf(1.0 / 6.0);
    Structure::new(vec![
        Atom::new(18, -d, 0.0, 0.0),
        Atom::new(18, 0.0, 0.0, 0.0),
        Atom::new(18, d, 0.0, 0.0),
    ])
}

#[test]
fn static_energy_matches_the_pair_sum() {
    let d = 2f64.powf(1.0 / 6.0);
    let rec = recipes::lj::static_job(trimer(), &Params::new()).unwrap();
    assert_eq!(rec.natoms, 3);
    assert_eq!(rec.name, "LJ Static");
    let want = 2.0 * lj_pair_energy(d) + lj_pair_energy(2.0 * d);
    assert_abs_diff_eq!(rec.energy, want, epsilon = 1e-8);
    // the two short bonds sit at the pair minimum
    assert_abs_diff_eq!(rec.energy, -2.0310058593750, epsilon = 1e-6);
}

#[test]
fn record_replays_inputs() {
    let rec = recipes::lj::static_job(trimer(), &Params::new()).unwrap();
    assert_eq!(rec.input_structure, trimer());
    assert_eq!(rec.parameters["epsilon"], 1.0);
    assert!(!rec.id.is_empty());
}

#[test]
fn cell_downgrade_equals_plain_relax() {
    // water has no periodic boundaries, so relax_cell must quietly reduce
    // to an atoms-only relaxation
    let water: Structure = "O 0.0 0.0 0.1197
        H 0.0 0.7616 -0.4786
        H 0.0 -0.7616 -0.4786"
        .parse()
        .unwrap();
    let swaps = OptSwaps {
        fmax: Some(0.05),
        max_steps: Some(500),
        ..Default::default()
    };
    let with_cell = recipes::emt::relax_job(
        water.clone(),
        true,
        &Params::new(),
        &swaps,
    )
    .unwrap();
    let without = recipes::emt::relax_job(
        water,
        false,
        &Params::new(),
        &swaps,
    )
    .unwrap();
    assert_eq!(with_cell.run.energy, without.run.energy);
    assert_eq!(with_cell.run.structure, without.run.structure);
    assert_eq!(with_cell.steps, without.steps);
}

#[test]
fn periodic_cell_relaxation_moves_the_cell() {
    // a copper chain, periodic along x only, with the wrong spacing: the
    // cell-relaxation filter has to find a better lattice constant
    let chain = Structure::new(vec![Atom::new(29, 0.0, 0.0, 0.0)]).with_cell(
        [[2.5, 0.0, 0.0], [0.0, 20.0, 0.0], [0.0, 0.0, 20.0]],
        [true, false, false],
    );
    let before = recipes::emt::static_job(chain.clone(), &Params::new())
        .unwrap()
        .energy;
    let rec = recipes::emt::relax_job(
        chain,
        true,
        &Params::new(),
        &OptSwaps {
            fmax: Some(0.02),
            max_steps: Some(500),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(rec.converged);
    assert!(rec.run.energy < before);
    let a = rec.run.structure.cell.unwrap()[0][0];
    assert!((a - 2.5).abs() > 1e-3, "lattice constant stayed at {a}");
}

#[test]
fn chained_records_feed_the_next_stage() {
    let first = recipes::lj::relax_job(
        trimer(),
        &Params::new(),
        &OptSwaps {
            fmax: Some(0.5),
            ..Default::default()
        },
    )
    .unwrap();
    let second =
        recipes::lj::static_job(first.clone(), &Params::new()).unwrap();
    assert_eq!(second.input_structure, first.run.structure);
}
