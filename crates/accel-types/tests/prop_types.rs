// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Property-Based Tests (proptest) for accel-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for accel-types using proptest.
//!
//! Covers: phase-space vector algebra, matrix identities, multipole
//! coefficient padding, element equality semantics.

use accel_types::element::{Element, Polynoms};
use accel_types::matrix::Matrix6;
use accel_types::pos::{Pos, PHASE_DIM};
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -1.0e3..1.0e3
}

fn pos_strategy() -> impl Strategy<Value = Pos> {
    (finite(), finite(), finite(), finite(), finite(), finite())
        .prop_map(|(rx, px, ry, py, de, dl)| Pos::new(rx, px, ry, py, de, dl))
}

// ── Phase-space vector algebra ───────────────────────────────────────

proptest! {
    /// Addition and subtraction are inverse operations componentwise.
    #[test]
    fn pos_add_sub_roundtrip(a in pos_strategy(), b in pos_strategy()) {
        let back = (a + b) - b;
        for i in 0..PHASE_DIM {
            prop_assert!((back[i] - a[i]).abs() <= 1e-9 * (1.0 + a[i].abs()),
                "component {}: {} vs {}", i, back[i], a[i]);
        }
    }

    /// Scalar multiplication distributes over addition.
    #[test]
    fn pos_scalar_distributes(a in pos_strategy(), b in pos_strategy(), s in finite()) {
        let lhs = (a + b) * s;
        let rhs = a * s + b * s;
        for i in 0..PHASE_DIM {
            let scale = 1.0 + lhs[i].abs().max(rhs[i].abs());
            prop_assert!((lhs[i] - rhs[i]).abs() <= 1e-9 * scale);
        }
    }

    /// Indexed writes land in the matching named field.
    #[test]
    fn pos_index_mut_matches_fields(mut p in pos_strategy(), v in finite()) {
        p[0] = v;
        p[5] = -v;
        prop_assert_eq!(p.rx, v);
        prop_assert_eq!(p.dl, -v);
        prop_assert!(p.is_finite());
    }
}

// ── Matrix identities ────────────────────────────────────────────────

proptest! {
    /// Applying a matrix to a vector agrees with matrix multiplication
    /// against the canonical basis.
    #[test]
    fn matrix_apply_matches_columns(p in pos_strategy()) {
        let mut m = Matrix6::identity();
        m[(0, 1)] = 0.5;
        m[(3, 2)] = -2.0;
        m[(5, 4)] = 1.5;
        let q = m.apply(p);
        prop_assert!((q.rx - (p.rx + 0.5 * p.px)).abs() < 1e-9 * (1.0 + p.px.abs()));
        prop_assert!((q.py - (p.py - 2.0 * p.ry)).abs() < 1e-9 * (1.0 + p.ry.abs()));
        prop_assert!((q.dl - (p.dl + 1.5 * p.de)).abs() < 1e-9 * (1.0 + p.de.abs()));
    }

    /// Transposition swaps the off-diagonal entries.
    #[test]
    fn matrix_transpose_swaps(i in 0usize..6, j in 0usize..6, v in finite()) {
        let mut m = Matrix6::zeros();
        m[(i, j)] = v;
        prop_assert_eq!(m.transpose()[(j, i)], v);
    }
}

// ── Multipole coefficient pairs ──────────────────────────────────────

proptest! {
    /// The constructor always leaves both vectors the same length.
    #[test]
    fn polynoms_share_length(
        a in proptest::collection::vec(finite(), 0..12),
        b in proptest::collection::vec(finite(), 0..12),
    ) {
        let expected = a.len().max(b.len());
        let p = Polynoms::new(a.clone(), b.clone());
        prop_assert_eq!(p.a().len(), expected);
        prop_assert_eq!(p.b().len(), expected);
        for (i, v) in a.iter().enumerate() {
            prop_assert_eq!(p.a()[i], *v);
        }
        for i in a.len()..expected {
            prop_assert_eq!(p.a()[i], 0.0, "padding must be zero");
        }
        for (i, v) in b.iter().enumerate() {
            prop_assert_eq!(p.b()[i], *v);
        }
    }

    /// Sparse writes keep the shared-length invariant.
    #[test]
    fn polynoms_set_keeps_sync(order in 0usize..16, v in finite()) {
        let mut p = Polynoms::default();
        p.set_b(order, v);
        prop_assert_eq!(p.a().len(), p.b().len());
        prop_assert_eq!(p.b()[order], v);
        p.set_a(order / 2, -v);
        prop_assert_eq!(p.a().len(), p.b().len());
    }
}

// ── Element equality semantics ───────────────────────────────────────

proptest! {
    /// Drift elements compare physically equal whenever the geometric
    /// header matches, regardless of entry/exit transform differences.
    #[test]
    fn drift_physical_equality_ignores_transforms(len in 0.0f64..10.0, shift in finite()) {
        let a = Element::drift("d", len);
        let mut b = Element::drift("d", len);
        b.t_in[0] = shift;
        b.r_in[(0, 2)] = 0.25;
        prop_assert!(a.physically_eq(&b));
        prop_assert!(b.physically_eq(&a));
        if shift != 0.0 {
            prop_assert_ne!(a, b, "structural equality must still see the difference");
        }
    }

    /// Aperture differences are never physically equal.
    #[test]
    fn aperture_breaks_physical_equality(len in 0.0f64..10.0, hmax in 1e-3f64..1.0) {
        let a = Element::drift("d", len);
        let mut b = Element::drift("d", len);
        b.hmax = hmax;
        prop_assert!(!a.physically_eq(&b));
    }
}
