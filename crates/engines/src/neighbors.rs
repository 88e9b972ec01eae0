//! Pair enumeration with minimum-image handling for the in-process
//! potentials.

use matter::Structure;

/// a pair of sites within the cutoff: the displacement runs from `i` to `j`
/// and includes any periodic image shift
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pair {
    pub i: usize,
    pub j: usize,
    pub dx: [f64; 3],
    pub r: f64,
}

/// Enumerate each interacting pair once.
///
/// For a periodic structure the image shifts span enough cells to cover
/// `cutoff` along every periodic axis; only the lexicographically positive
/// half of shift space is visited so a bond and its mirror image are not
/// double counted. Self pairs (an atom with its own image) appear once.
pub(crate) fn pairs_within(s: &Structure, cutoff: f64) -> Vec<Pair> {
    let n = s.len();
    let pos: Vec<[f64; 3]> = s.atoms.iter().map(|a| a.position()).collect();
    let mut pairs = Vec::new();

    let mut push = |i: usize, j: usize, dx: [f64; 3]| {
        let r = (dx[0] * dx[0] + dx[1] * dx[1] + dx[2] * dx[2]).sqrt();
        if r < cutoff && r > 1e-12 {
            pairs.push(Pair { i, j, dx, r });
        }
    };

    // the home cell
    for i in 0..n {
        for j in i + 1..n {
            let dx = [
                pos[j][0] - pos[i][0],
                pos[j][1] - pos[i][1],
                pos[j][2] - pos[i][2],
            ];
            push(i, j, dx);
        }
    }

    if !s.is_periodic() {
        return pairs;
    }
    let cell = s.cell.expect("periodic structure must carry a cell");
    let reps = repeats(s, cutoff);
    for n0 in -reps[0]..=reps[0] {
        for n1 in -reps[1]..=reps[1] {
            for n2 in -reps[2]..=reps[2] {
                if (n0, n1, n2) <= (0, 0, 0) {
                    // the home cell is done and mirror shifts would double
                    // count
                    continue;
                }
                let shift = [
                    n0 as f64 * cell[0][0]
                        + n1 as f64 * cell[1][0]
                        + n2 as f64 * cell[2][0],
                    n0 as f64 * cell[0][1]
                        + n1 as f64 * cell[1][1]
                        + n2 as f64 * cell[2][1],
                    n0 as f64 * cell[0][2]
                        + n1 as f64 * cell[1][2]
                        + n2 as f64 * cell[2][2],
                ];
                for i in 0..n {
                    for j in 0..n {
                        let dx = [
                            pos[j][0] + shift[0] - pos[i][0],
                            pos[j][1] + shift[1] - pos[i][1],
                            pos[j][2] + shift[2] - pos[i][2],
                        ];
                        push(i, j, dx);
                    }
                }
            }
        }
    }
    pairs
}

/// image repetitions needed along each periodic axis to reach `cutoff`,
/// from the perpendicular heights of the cell
fn repeats(s: &Structure, cutoff: f64) -> [i32; 3] {
    let cell = s.cell_matrix().expect("periodic structure must carry a cell");
    let volume = cell.determinant().abs();
    let rows: Vec<matter::Vec3> =
        (0..3).map(|i| cell.row(i).transpose()).collect();
    let mut reps = [0i32; 3];
    for k in 0..3 {
        if !s.pbc[k] {
            continue;
        }
        let area = rows[(k + 1) % 3].cross(&rows[(k + 2) % 3]).norm();
        let height = volume / area;
        reps[k] = (cutoff / height).ceil() as i32;
    }
    reps
}

#[cfg(test)]
mod tests {
    use matter::Atom;

    use super::*;

    #[test]
    fn molecular_pairs() {
        let s = Structure::new(vec![
            Atom::new(18, 0.0, 0.0, 0.0),
            Atom::new(18, 1.0, 0.0, 0.0),
            Atom::new(18, 9.0, 0.0, 0.0),
        ]);
        let pairs = pairs_within(&s, 2.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].i, pairs[0].j), (0, 1));
        assert_eq!(pairs[0].r, 1.0);
    }

    #[test]
    fn self_images_counted_once() {
        // one atom in a cubic cell: 6 nearest images = 3 unique bonds
        let s = Structure::new(vec![Atom::new(18, 0.0, 0.0, 0.0)]).with_cell(
            [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
            [true; 3],
        );
        let pairs = pairs_within(&s, 2.1);
        assert_eq!(pairs.len(), 3);
        for p in pairs {
            assert_eq!(p.r, 2.0);
        }
    }

    #[test]
    fn aperiodic_axis_not_replicated() {
        let s = Structure::new(vec![Atom::new(18, 0.0, 0.0, 0.0)]).with_cell(
            [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
            [true, true, false],
        );
        let pairs = pairs_within(&s, 2.1);
        assert_eq!(pairs.len(), 2);
    }
}
