//! Lattice traversal: line and ring passes with aperture checks, loss
//! detection and trajectory capture.

use accel_types::accelerator::Accelerator;
use accel_types::error::TrackResult;
use accel_types::pos::Pos;
use rayon::prelude::*;

use crate::passmethods::element_pass;

/// Transverse plane in which a particle was lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LostPlane {
    X,
    Y,
}

/// Loss record of a line pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loss {
    /// Lattice index of the element at which the particle was lost.
    pub element: usize,
    pub plane: LostPlane,
}

/// Loss record of a ring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnLoss {
    pub turn: usize,
    pub element: usize,
    pub plane: LostPlane,
}

/// Outcome of [`line_pass`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinePassResult {
    /// With trajectory recording: the entry position of every traversed
    /// element followed by the final position (`N + 1` entries).
    /// Without: the final position only. A lost particle leaves a NaN
    /// sentinel as the last entry and NaN placeholders for the elements
    /// it never reached.
    pub trajectory: Vec<Pos>,
    /// One past the last completed element, modulo the lattice length;
    /// on loss, the index of the offending element.
    pub element_offset: usize,
    pub loss: Option<Loss>,
}

/// Outcome of [`ring_pass`].
#[derive(Debug, Clone, PartialEq)]
pub struct RingPassResult {
    /// With trajectory recording: the end-of-ring position of every
    /// completed turn. Without: the final position only. Nothing is
    /// recorded for the turn in which the particle was lost.
    pub turns: Vec<Pos>,
    pub element_offset: usize,
    pub loss: Option<TurnLoss>,
}

/// Track one particle along the lattice for a single pass.
///
/// The traversal starts at `element_offset` and wraps modulo the
/// lattice length through all `N` elements, so the line begins at the
/// chosen offset and ends one element before it.
///
/// Hard kernel failures (a dangling kicktable handle) surface as `Err`.
/// Particle loss is a physical outcome, reported in the `Ok` payload:
/// after every element the driver checks `rx` for finiteness and, with
/// `vchamber_on`, against `[hmin, hmax]` (loss in plane x), then `ry`
/// against `[vmin, vmax]` (plane y).
pub fn line_pass(
    acc: &Accelerator,
    pos: &mut Pos,
    element_offset: usize,
    trajectory: bool,
) -> TrackResult<LinePassResult> {
    let n = acc.len();
    let mut out = if trajectory {
        vec![Pos::nan(); n]
    } else {
        Vec::with_capacity(1)
    };
    let mut offset = if n > 0 { element_offset % n } else { 0 };

    for i in 0..n {
        let element = &acc.lattice[offset];
        if trajectory {
            out[i] = *pos;
        }

        element_pass(element, pos, acc)?;

        if !pos.rx.is_finite()
            || (acc.vchamber_on && (pos.rx < element.hmin || pos.rx > element.hmax))
        {
            out.push(Pos::nan());
            return Ok(LinePassResult {
                trajectory: out,
                element_offset: offset,
                loss: Some(Loss {
                    element: offset,
                    plane: LostPlane::X,
                }),
            });
        }
        if !pos.ry.is_finite()
            || (acc.vchamber_on && (pos.ry < element.vmin || pos.ry > element.vmax))
        {
            out.push(Pos::nan());
            return Ok(LinePassResult {
                trajectory: out,
                element_offset: offset,
                loss: Some(Loss {
                    element: offset,
                    plane: LostPlane::Y,
                }),
            });
        }

        offset = (offset + 1) % n;
    }

    out.push(*pos);
    Ok(LinePassResult {
        trajectory: out,
        element_offset: offset,
        loss: None,
    })
}

/// Track one particle around the ring for `nr_turns` turns.
pub fn ring_pass(
    acc: &Accelerator,
    pos: &mut Pos,
    nr_turns: usize,
    trajectory: bool,
) -> TrackResult<RingPassResult> {
    let mut turns = Vec::new();
    let mut offset = 0;

    for turn in 0..nr_turns {
        let line = line_pass(acc, pos, offset, false)?;
        offset = line.element_offset;
        if let Some(loss) = line.loss {
            return Ok(RingPassResult {
                turns,
                element_offset: loss.element,
                loss: Some(TurnLoss {
                    turn,
                    element: loss.element,
                    plane: loss.plane,
                }),
            });
        }
        if trajectory {
            turns.push(*pos);
        }
    }

    if !trajectory {
        turns.push(*pos);
    }
    Ok(RingPassResult {
        turns,
        element_offset: offset,
        loss: None,
    })
}

/// Track a bunch of independent particles around the ring in parallel.
///
/// The accelerator is shared read-only; each particle is tracked on its
/// own phase-space state, so results are bit-identical to serial calls.
pub fn ring_pass_bunch(
    acc: &Accelerator,
    bunch: &[Pos],
    nr_turns: usize,
    trajectory: bool,
) -> Vec<TrackResult<(Pos, RingPassResult)>> {
    bunch
        .par_iter()
        .map(|p0| {
            let mut p = *p0;
            ring_pass(acc, &mut p, nr_turns, trajectory).map(|r| (p, r))
        })
        .collect()
}

/// Parallel single-pass variant of [`ring_pass_bunch`].
pub fn line_pass_bunch(
    acc: &Accelerator,
    bunch: &[Pos],
    trajectory: bool,
) -> Vec<TrackResult<(Pos, LinePassResult)>> {
    bunch
        .par_iter()
        .map(|p0| {
            let mut p = *p0;
            line_pass(acc, &mut p, 0, trajectory).map(|r| (p, r))
        })
        .collect()
}
