//! The saddle-point tool chain on the cheapest real system that has one:
//! three Lennard-Jones atoms, whose linear arrangement is a first-order
//! saddle between the two equivalent triangular minima.
//!
//! These tests manipulate the process-wide convergence gate through the
//! quasi-IRC recipe, so they live in their own test binary (their own
//! process), away from tests that read the gate.

use descent::Direction;
use galley::{OptSwaps, Params, RecipeError, recipes::lj, settings};
use matter::{Atom, Structure};

/// the quasi-IRC recipe toggles the process-wide gate, so the tests in this
/// binary run one at a time
static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// near the linear saddle: the short bonds slightly inside the pair minimum
/// to balance the attraction of the long 1-3 pair
fn linear_saddle() -> Structure {
    let d = 1.1211;
    Structure::new(vec![
        Atom::new(18, -d, 0.0, 0.0),
        Atom::new(18, 0.0, 0.0, 0.0),
        Atom::new(18, d, 0.0, 0.0),
    ])
}

fn displacement(rec: &galley::OptRecord, from: &Structure) -> Vec<f64> {
    let a = rec.run.structure.positions();
    let b = from.positions();
    (a - b).iter().copied().collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn ts_search_recovers_the_linear_saddle() {
    let _lock = LOCK.lock();
    // start bent; the saddle search has to climb back to collinear
    let mut bent = linear_saddle();
    bent.atoms[1].y = 0.15;
    let rec = lj::ts_job(
        bent,
        &Params::new(),
        &OptSwaps {
            fmax: Some(1e-5),
            max_steps: Some(300),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(rec.converged);
    let a = &rec.run.structure.atoms;
    // collinear: the middle atom back on the line through the ends
    let v1 = [a[0].x - a[1].x, a[0].y - a[1].y, a[0].z - a[1].z];
    let v2 = [a[2].x - a[1].x, a[2].y - a[1].y, a[2].z - a[1].z];
    let c = [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ];
    let cross = (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt();
    assert!(cross < 1e-2, "cross norm = {cross}");
}

#[test]
fn irc_directions_displace_oppositely() {
    let _lock = LOCK.lock();
    let saddle = linear_saddle();
    // a huge fmax halts the walk right after the kick, isolating the
    // initial displacement
    let swaps = OptSwaps {
        fmax: Some(100.0),
        max_steps: Some(10),
        ..Default::default()
    };
    let fwd = lj::irc_job(
        saddle.clone(),
        Direction::Forward,
        &Params::new(),
        &swaps,
    )
    .unwrap();
    let rev = lj::irc_job(
        saddle.clone(),
        Direction::Reverse,
        &Params::new(),
        &swaps,
    )
    .unwrap();
    assert_eq!(fwd.direction, Some(Direction::Forward));
    let df = displacement(&fwd, &saddle);
    let dr = displacement(&rev, &saddle);
    assert!(dot(&df, &df) > 1e-6, "forward walk never moved");
    assert!(dot(&df, &dr) < 0.0, "directions displaced the same way");
}

#[test]
fn quasi_irc_relaxes_to_the_triangle_and_restores_the_gate() {
    let _lock = LOCK.lock();
    assert!(settings::current().check_convergence);
    let saddle = linear_saddle();
    // an unsatisfiable IRC stage: without the scoped gate override, the
    // composed recipe could never get past it
    let irc_swaps = OptSwaps {
        fmax: Some(1e-12),
        max_steps: Some(5),
        ..Default::default()
    };
    let relax_swaps = OptSwaps {
        fmax: Some(1e-3),
        max_steps: Some(2000),
        ..Default::default()
    };
    let rec = lj::quasi_irc_job(
        saddle.clone(),
        Direction::Forward,
        &Params::new(),
        &irc_swaps,
        &relax_swaps,
    )
    .unwrap();
    // the gate is back on afterwards
    assert!(settings::current().check_convergence);

    // the refinement stage found the triangular minimum of three bonds
    assert_eq!(rec.run.name, "LJ Relax");
    assert!(rec.converged);
    assert!(rec.run.energy < -2.9, "energy = {}", rec.run.energy);

    // the embedded provenance is the unconverged exploratory stage
    let irc = rec.initial_irc.as_ref().expect("provenance embedded");
    assert_eq!(irc.run.name, "LJ IRC");
    assert!(!irc.converged);
    assert_eq!(irc.steps, 5);
    assert_eq!(irc.direction, Some(Direction::Forward));

    // and it matches what a standalone IRC run with the same swaps
    // produces, up to the record identity
    let standalone = {
        let _gate = settings::scoped(|s| s.check_convergence = false);
        lj::irc_job(
            saddle,
            Direction::Forward,
            &Params::new(),
            &irc_swaps,
        )
        .unwrap()
    };
    assert_eq!(irc.run.structure, standalone.run.structure);
    assert_eq!(irc.run.energy, standalone.run.energy);
    assert_eq!(irc.halt, standalone.halt);
    assert_eq!(irc.steps, standalone.steps);
    assert_eq!(irc.fmax, standalone.fmax);
}

#[test]
fn gate_restored_even_when_the_refinement_fails() {
    let _lock = LOCK.lock();
    assert!(settings::current().check_convergence);
    let got = lj::quasi_irc_job(
        linear_saddle(),
        Direction::Reverse,
        &Params::new(),
        &OptSwaps::default(),
        // one step cannot reach convergence
        &OptSwaps {
            fmax: Some(1e-9),
            max_steps: Some(1),
            ..Default::default()
        },
    );
    assert!(matches!(got, Err(RecipeError::Unconverged { .. })));
    assert!(settings::current().check_convergence);
}
