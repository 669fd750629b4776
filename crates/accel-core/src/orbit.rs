// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Closed Orbit
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-orbit fixed points and linearized one-turn maps.
//!
//! Newton searches with finite-difference Jacobians about the one-turn
//! map, and the per-element transfer matrix factorization of the 6x6
//! one-turn matrix.

use accel_math::linalg::{solve_4x4, solve_6x6};
use accel_types::accelerator::Accelerator;
use accel_types::config::OrbitNumerics;
use accel_types::element::Element;
use accel_types::error::{TrackError, TrackResult};
use accel_types::matrix::Matrix6;
use accel_types::pos::{Pos, PHASE_DIM};
use rayon::prelude::*;

use crate::passmethods::element_pass;
use crate::tracking::line_pass;

/// Linearized one-turn map about the 6-D closed orbit.
#[derive(Debug, Clone)]
pub struct OneTurnMap {
    /// Closed orbit at the entry of every element.
    pub closed_orbit: Vec<Pos>,
    /// `cumulative[i]`: transfer matrix from the ring start to the
    /// entry of element `i` (`cumulative[0]` is the identity).
    pub cumulative: Vec<Matrix6>,
    /// Full one-turn matrix, the product of all element Jacobians in
    /// lattice order.
    pub m66: Matrix6,
    /// Closed orbit at the ring start.
    pub fixed_point: Pos,
}

/// 4-D closed orbit (transverse block, `de` pinned at zero) with
/// default numerics. Returns the orbit at every element entry.
pub fn find_orbit4(acc: &Accelerator, guess: Pos) -> TrackResult<Vec<Pos>> {
    find_orbit4_with(acc, guess, &OrbitNumerics::default())
}

pub fn find_orbit4_with(
    acc: &Accelerator,
    guess: Pos,
    cfg: &OrbitNumerics,
) -> TrackResult<Vec<Pos>> {
    let mut start = guess;
    start.de = 0.0;
    start.dl = 0.0;
    let fixed = newton_fixed_point(acc, start, cfg, 4)?;
    entry_orbit(acc, fixed, cfg)
}

/// 6-D closed orbit with default numerics. The longitudinal fixed
/// point is only well posed with an active rf cavity.
pub fn find_orbit6(acc: &Accelerator, guess: Pos) -> TrackResult<Vec<Pos>> {
    find_orbit6_with(acc, guess, &OrbitNumerics::default())
}

pub fn find_orbit6_with(
    acc: &Accelerator,
    guess: Pos,
    cfg: &OrbitNumerics,
) -> TrackResult<Vec<Pos>> {
    if !acc.cavity_on {
        return Err(TrackError::CavityRequired);
    }
    let fixed = newton_fixed_point(acc, guess, cfg, PHASE_DIM)?;
    entry_orbit(acc, fixed, cfg)
}

/// Extract the one-turn matrix and its per-element factorization with
/// default numerics.
pub fn find_m66(acc: &Accelerator) -> TrackResult<OneTurnMap> {
    find_m66_with(acc, &OrbitNumerics::default())
}

pub fn find_m66_with(acc: &Accelerator, cfg: &OrbitNumerics) -> TrackResult<OneTurnMap> {
    let closed_orbit = find_orbit6_with(acc, Pos::zero(), cfg)?;

    // Per-element Jacobians about the local closed orbit. Each element
    // is independent, so the columns fan out in parallel.
    let jacobians: Vec<TrackResult<Matrix6>> = acc
        .lattice
        .par_iter()
        .zip(closed_orbit.par_iter())
        .map(|(el, p0)| element_jacobian(el, acc, *p0, cfg.fd_step))
        .collect();

    let mut cumulative = Vec::with_capacity(acc.len());
    let mut m66 = Matrix6::identity();
    for jac in jacobians {
        let jac = jac?;
        cumulative.push(m66);
        m66 = jac * m66;
    }

    let fixed_point = closed_orbit.first().copied().unwrap_or_else(Pos::zero);
    Ok(OneTurnMap {
        closed_orbit,
        cumulative,
        m66,
        fixed_point,
    })
}

/// Central-difference 6x6 Jacobian of one element's map about `p0`.
pub fn element_jacobian(
    el: &Element,
    acc: &Accelerator,
    p0: Pos,
    fd_step: f64,
) -> TrackResult<Matrix6> {
    let mut jac = Matrix6::zeros();
    for col in 0..PHASE_DIM {
        let mut fwd = p0;
        fwd[col] += fd_step;
        element_pass(el, &mut fwd, acc)?;
        let mut bwd = p0;
        bwd[col] -= fd_step;
        element_pass(el, &mut bwd, acc)?;
        for row in 0..PHASE_DIM {
            jac[(row, col)] = (fwd[row] - bwd[row]) / (2.0 * fd_step);
        }
    }
    Ok(jac)
}

/// One revolution of the map; `None` when the particle is lost.
fn one_turn(acc: &Accelerator, p: Pos) -> TrackResult<Option<Pos>> {
    let mut q = p;
    let res = line_pass(acc, &mut q, 0, false)?;
    if res.loss.is_some() {
        return Ok(None);
    }
    Ok(Some(q))
}

/// Newton iteration on the leading `dims` components of the fixed-point
/// residual `p - M(p)`, with a forward-difference Jacobian of the
/// one-turn map. Any evaluation that loses the particle counts as
/// non-convergence.
fn newton_fixed_point(
    acc: &Accelerator,
    start: Pos,
    cfg: &OrbitNumerics,
    dims: usize,
) -> TrackResult<Pos> {
    let mut p = start;

    for it in 0..cfg.max_iterations {
        let lost = || TrackError::NewtonNotConverged { iterations: it };
        let m0 = one_turn(acc, p)?.ok_or_else(lost)?;

        let mut jac = Matrix6::zeros();
        for col in 0..dims {
            let mut pert = p;
            pert[col] += cfg.fd_step;
            let m = one_turn(acc, pert)?.ok_or_else(lost)?;
            for row in 0..dims {
                let delta = if row == col { 1.0 } else { 0.0 };
                jac[(row, col)] = (m[row] - m0[row]) / cfg.fd_step - delta;
            }
        }

        let residual = p - m0;
        let solve = if dims == 4 { solve_4x4 } else { solve_6x6 };
        let correction = solve(&jac, &residual)
            .map_err(|_| TrackError::NewtonNotConverged { iterations: it })?;

        let mut step = 0.0_f64;
        for i in 0..dims {
            p[i] += correction[i];
            step = step.max(correction[i].abs());
        }
        if step < cfg.tolerance {
            return Ok(p);
        }
    }

    Err(TrackError::NewtonNotConverged {
        iterations: cfg.max_iterations,
    })
}

/// Record the converged orbit at the entry of every element.
fn entry_orbit(acc: &Accelerator, fixed: Pos, cfg: &OrbitNumerics) -> TrackResult<Vec<Pos>> {
    let mut p = fixed;
    let res = line_pass(acc, &mut p, 0, true)?;
    if res.loss.is_some() {
        return Err(TrackError::NewtonNotConverged {
            iterations: cfg.max_iterations,
        });
    }
    Ok(res.trajectory[..acc.len()].to_vec())
}
