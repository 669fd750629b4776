//! Linear algebra utilities.
//!
//! Partial-pivot LU solves on the leading blocks of a 6x6 system, used
//! by the closed-orbit Newton searches.

use accel_types::error::{TrackError, TrackResult};
use accel_types::matrix::Matrix6;
use accel_types::pos::{Pos, PHASE_DIM};

/// Pivot magnitude below which the system is treated as singular.
const SINGULAR_PIVOT: f64 = 1e-30;

/// Solve `M x = b` on the transverse block (indices 0..4).
///
/// The energy and longitudinal components of `b` pass through to `x`
/// unchanged; rows and columns 4..6 of `M` are ignored.
pub fn solve_4x4(m: &Matrix6, b: &Pos) -> TrackResult<Pos> {
    solve_block(m, b, 4)
}

/// Solve `M x = b` on the full 6-D system.
pub fn solve_6x6(m: &Matrix6, b: &Pos) -> TrackResult<Pos> {
    solve_block(m, b, PHASE_DIM)
}

fn solve_block(m: &Matrix6, b: &Pos, n: usize) -> TrackResult<Pos> {
    let mut a = m.0;
    let mut x = [0.0; PHASE_DIM];
    for (i, xi) in x.iter_mut().enumerate() {
        *xi = b[i];
    }

    // Forward elimination with row pivoting on the leading n x n block.
    for k in 0..n {
        let mut piv = k;
        for r in (k + 1)..n {
            if a[r][k].abs() > a[piv][k].abs() {
                piv = r;
            }
        }
        if a[piv][k].abs() < SINGULAR_PIVOT {
            return Err(TrackError::NewtonNotConverged { iterations: 0 });
        }
        if piv != k {
            a.swap(piv, k);
            x.swap(piv, k);
        }
        for r in (k + 1)..n {
            let f = a[r][k] / a[k][k];
            a[r][k] = 0.0;
            for c in (k + 1)..n {
                a[r][c] -= f * a[k][c];
            }
            x[r] -= f * x[k];
        }
    }

    // Back substitution.
    for k in (0..n).rev() {
        let mut acc = x[k];
        for c in (k + 1)..n {
            acc -= a[k][c] * x[c];
        }
        x[k] = acc / a[k][k];
    }

    Ok(Pos::new(x[0], x[1], x[2], x[3], x[4], x[5]))
}
