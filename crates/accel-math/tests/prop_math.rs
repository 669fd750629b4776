// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Property-Based Tests (proptest) for accel-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for accel-math using proptest.
//!
//! Covers: LU solve residuals on the transverse and full blocks,
//! bilinear kicktable interpolation.

use accel_math::interp::kicktable_kicks;
use accel_math::linalg::{solve_4x4, solve_6x6};
use accel_types::kicktable::Kicktable;
use accel_types::matrix::Matrix6;
use accel_types::pos::{Pos, PHASE_DIM};
use ndarray::Array2;
use proptest::prelude::*;

/// Diagonally dominant 6x6 system (guaranteed non-singular).
fn system_strategy() -> impl Strategy<Value = (Matrix6, Pos)> {
    (
        proptest::collection::vec(-1.0f64..1.0, PHASE_DIM * PHASE_DIM),
        proptest::collection::vec(-10.0f64..10.0, PHASE_DIM),
    )
        .prop_map(|(entries, rhs)| {
            let mut m = Matrix6::zeros();
            for i in 0..PHASE_DIM {
                for j in 0..PHASE_DIM {
                    m[(i, j)] = entries[i * PHASE_DIM + j];
                }
                m[(i, i)] += 8.0;
            }
            let b = Pos::new(rhs[0], rhs[1], rhs[2], rhs[3], rhs[4], rhs[5]);
            (m, b)
        })
}

fn residual(m: &Matrix6, x: &Pos, b: &Pos, n: usize) -> f64 {
    let mut max = 0.0_f64;
    for i in 0..n {
        let mut acc = 0.0;
        for j in 0..n {
            acc += m[(i, j)] * x[j];
        }
        max = max.max((acc - b[i]).abs());
    }
    max
}

// ── LU solves ────────────────────────────────────────────────────────

proptest! {
    /// x = solve_6x6(M, b) satisfies M x = b within floating tolerance.
    #[test]
    fn solve_6x6_satisfies_system((m, b) in system_strategy()) {
        let x = solve_6x6(&m, &b).unwrap();
        let res = residual(&m, &x, &b, PHASE_DIM);
        prop_assert!(res < 1e-10, "residual = {res}");
    }

    /// The transverse solve satisfies the 4x4 block and passes the
    /// longitudinal components through untouched.
    #[test]
    fn solve_4x4_block_and_passthrough((m, b) in system_strategy()) {
        let x = solve_4x4(&m, &b).unwrap();
        let res = residual(&m, &x, &b, 4);
        prop_assert!(res < 1e-10, "residual = {res}");
        prop_assert_eq!(x.de, b.de);
        prop_assert_eq!(x.dl, b.dl);
    }

    /// Row scaling does not change the solution.
    #[test]
    fn solve_6x6_scale_invariance((m, b) in system_strategy(), scale in 1e-3f64..1e3) {
        let x = solve_6x6(&m, &b).unwrap();
        let mut m2 = m;
        let mut b2 = b;
        for j in 0..PHASE_DIM {
            m2[(2, j)] *= scale;
        }
        b2[2] *= scale;
        let y = solve_6x6(&m2, &b2).unwrap();
        for i in 0..PHASE_DIM {
            let tol = 1e-8 * (1.0 + x[i].abs());
            prop_assert!((x[i] - y[i]).abs() < tol, "component {}: {} vs {}", i, x[i], y[i]);
        }
    }
}

// ── Bilinear interpolation ───────────────────────────────────────────

fn affine_table(ax: f64, bx: f64, ay: f64, by: f64) -> Kicktable {
    let (nx, ny) = (9, 7);
    let coord =
        |min: f64, max: f64, i: usize, n: usize| min + (max - min) * i as f64 / (n - 1) as f64;
    let x_kick = Array2::from_shape_fn((ny, nx), |(j, i)| {
        ax * coord(-0.02, 0.02, i, nx) + bx * coord(-0.01, 0.01, j, ny)
    });
    let y_kick = Array2::from_shape_fn((ny, nx), |(j, i)| {
        ay * coord(-0.02, 0.02, i, nx) + by * coord(-0.01, 0.01, j, ny)
    });
    Kicktable::from_grids("affine", 1.0, (-0.02, 0.02), (-0.01, 0.01), x_kick, y_kick).unwrap()
}

proptest! {
    /// Bilinear interpolation reproduces affine kick maps exactly.
    #[test]
    fn interpolation_exact_on_affine_maps(
        ax in -1.0f64..1.0,
        bx in -1.0f64..1.0,
        x in -0.02f64..0.02,
        y in -0.01f64..0.01,
    ) {
        let table = affine_table(ax, bx, 0.3, -0.7);
        let (kx, ky) = kicktable_kicks(&table, x, y).unwrap();
        prop_assert!((kx - (ax * x + bx * y)).abs() < 1e-12,
            "kx at ({x}, {y}) = {kx}");
        prop_assert!((ky - (0.3 * x - 0.7 * y)).abs() < 1e-12,
            "ky at ({x}, {y}) = {ky}");
    }

    /// Interpolated values stay inside the range spanned by the grid.
    #[test]
    fn interpolation_is_bounded_by_grid(
        x in -0.02f64..0.02,
        y in -0.01f64..0.01,
    ) {
        let table = affine_table(0.9, -0.4, -0.2, 0.6);
        let (kx, _) = kicktable_kicks(&table, x, y).unwrap();
        let lo = table.x_kick.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = table.x_kick.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(kx >= lo - 1e-12 && kx <= hi + 1e-12);
    }

    /// Points outside the rectangle are rejected, points inside accepted.
    #[test]
    fn domain_check_is_sharp(x in -0.05f64..0.05, y in -0.05f64..0.05) {
        let table = affine_table(1.0, 0.0, 0.0, 1.0);
        let inside = (-0.02..=0.02).contains(&x) && (-0.01..=0.01).contains(&y);
        prop_assert_eq!(kicktable_kicks(&table, x, y).is_ok(), inside);
    }
}
