//! Element pass-method kernels.
//!
//! Symplectic in-place propagators for the supported element types.
//! Every kernel applies the entry misalignment/rotation, the physical
//! map, then the exit transform. Aperture and finiteness checks belong
//! to the tracking driver; kernels signal unphysical motion by flooding
//! the coordinates with NaN.

use accel_math::interp::kicktable_kicks;
use accel_types::accelerator::Accelerator;
use accel_types::constants::{CGAMMA, LIGHT_SPEED, TWOPI};
use accel_types::element::{Element, ElementKind, Polynoms};
use accel_types::error::{TrackError, TrackResult};
use accel_types::kicktable::KicktableId;
use accel_types::pos::Pos;
use num_complex::Complex64;

// Forest-Ruth 4th-order splitting coefficients.
const DRIFT1: f64 = 0.675_603_595_979_829;
const DRIFT2: f64 = -0.175_603_595_979_829;
const KICK1: f64 = 1.351_207_191_959_658;
const KICK2: f64 = -1.702_414_383_919_316;

/// Propagate a particle through one element.
///
/// The only hard failure is a dangling kicktable handle; all physical
/// failure modes (unphysical drift, kicktable domain exit) leave NaN
/// coordinates for the driver's loss check.
pub fn element_pass(el: &Element, pos: &mut Pos, acc: &Accelerator) -> TrackResult<()> {
    enter_element(pos, el);
    match &el.kind {
        ElementKind::Marker => {}
        ElementKind::Drift => drift(pos, el.length),
        ElementKind::Multipole { polynoms } => str_mpole(pos, el, polynoms, acc),
        ElementKind::Bend {
            angle,
            angle_in,
            angle_out,
            gap,
            fint_in,
            fint_out,
            polynoms,
        } => bnd_mpole(
            pos, el, *angle, *angle_in, *angle_out, *gap, *fint_in, *fint_out, polynoms, acc,
        ),
        ElementKind::Corrector { hkick, vkick } => corrector(pos, el.length, *hkick, *vkick),
        ElementKind::Cavity { frequency, voltage } => {
            cavity(pos, el.length, *frequency, *voltage, acc)
        }
        ElementKind::ThinQuad { kl } => {
            pos.px -= kl * pos.rx;
            pos.py += kl * pos.ry;
        }
        ElementKind::ThinSext { sl } => {
            pos.px -= sl * (pos.rx * pos.rx - pos.ry * pos.ry) / 2.0;
            pos.py += sl * pos.rx * pos.ry;
        }
        ElementKind::Kicktable { table } => kicktable_pass(pos, el, *table, acc)?,
    }
    leave_element(pos, el);
    Ok(())
}

/// Exact canonical drift over `length`.
pub fn drift(pos: &mut Pos, length: f64) {
    let arg = (1.0 + pos.de) * (1.0 + pos.de) - pos.px * pos.px - pos.py * pos.py;
    if arg <= 0.0 {
        *pos = Pos::nan();
        return;
    }
    let pnorm = 1.0 / arg.sqrt();
    pos.rx += length * pos.px * pnorm;
    pos.ry += length * pos.py * pnorm;
    pos.dl += length * ((1.0 + pos.de) * pnorm - 1.0);
}

/// Entry transform: `p <- r_in (p - t_in)`.
fn enter_element(pos: &mut Pos, el: &Element) {
    for (i, t) in el.t_in.iter().enumerate() {
        pos[i] -= *t;
    }
    *pos = el.r_in.apply(*pos);
}

/// Exit transform: `p <- r_out p + t_out`.
fn leave_element(pos: &mut Pos, el: &Element) {
    *pos = el.r_out.apply(*pos);
    for (i, t) in el.t_out.iter().enumerate() {
        pos[i] += *t;
    }
}

fn radiation_constant(acc: &Accelerator) -> f64 {
    if acc.radiation_on {
        CGAMMA * (acc.energy / 1e9).powi(3) / TWOPI
    } else {
        0.0
    }
}

/// Horner evaluation of `sum (b_n + i a_n)(rx + i ry)^n`.
fn polynomial_field(polys: &Polynoms, rx: f64, ry: f64) -> (f64, f64) {
    if polys.is_empty() {
        return (0.0, 0.0);
    }
    let z = Complex64::new(rx, ry);
    let order = polys.max_order();
    let (a, b) = (polys.a(), polys.b());
    let mut sum = Complex64::new(b[order], a[order]);
    for i in (0..order).rev() {
        sum = sum * z + Complex64::new(b[i], a[i]);
    }
    (sum.re, sum.im)
}

/// Transverse field magnitude squared perpendicular to the velocity,
/// for the radiation energy loss.
fn b2_perp(bx: f64, by: f64, irho: f64, rx: f64, xpr: f64, ypr: f64) -> f64 {
    let curv = 1.0 + rx * irho;
    let v_norm2 = 1.0 / (curv * curv + xpr * xpr + ypr * ypr);
    ((by * curv) * (by * curv) + (bx * curv) * (bx * curv) + (bx * ypr - by * xpr).powi(2))
        * v_norm2
}

/// Classical radiation energy loss over a slice, preserving the
/// geometric angles across the momentum rescale.
fn radiate(pos: &mut Pos, bx: f64, by: f64, irho: f64, rad_const: f64, length: f64) {
    let pnorm = 1.0 / (1.0 + pos.de);
    let xpr = pos.px * pnorm;
    let ypr = pos.py * pnorm;
    let b2p = b2_perp(bx, by, irho, pos.rx, xpr, ypr);
    pos.de -= rad_const
        * (1.0 + pos.de)
        * (1.0 + pos.de)
        * b2p
        * (1.0 + pos.rx * irho + (xpr * xpr + ypr * ypr) / 2.0)
        * length;
    pos.px = xpr * (1.0 + pos.de);
    pos.py = ypr * (1.0 + pos.de);
}

/// Thin multipole kick of integrated strength `length` in a straight
/// element.
fn str_thin_kick(pos: &mut Pos, polys: &Polynoms, length: f64, rad_const: f64) {
    let (re_sum, im_sum) = polynomial_field(polys, pos.rx, pos.ry);
    if rad_const != 0.0 {
        radiate(pos, im_sum, re_sum, 0.0, rad_const, length);
    }
    pos.px -= length * re_sum;
    pos.py += length * im_sum;
}

/// Thin multipole kick in a sector bend of curvature `irho`, including
/// the weak-focusing, dispersion and path-length terms.
fn bnd_thin_kick(pos: &mut Pos, polys: &Polynoms, length: f64, irho: f64, rad_const: f64) {
    let (re_sum, im_sum) = polynomial_field(polys, pos.rx, pos.ry);
    if rad_const != 0.0 {
        // The radiation integrand sees the full field, curvature included.
        radiate(pos, im_sum, re_sum + irho, irho, rad_const, length);
    }
    pos.px -= length * (re_sum - (pos.de - pos.rx * irho) * irho);
    pos.py += length * im_sum;
    pos.dl += length * irho * pos.rx;
}

/// Dipole edge: horizontal focusing `h tan(beta)`, vertical defocusing
/// reduced by the gap/fringe-integral correction inside the tangent.
fn edge_fringe(pos: &mut Pos, irho: f64, edge_angle: f64, fint: f64, gap: f64) {
    let fx = irho * edge_angle.tan();
    let psi =
        edge_angle - irho * gap * fint * (1.0 + edge_angle.sin().powi(2)) / edge_angle.cos();
    let fy = irho * psi.tan();
    pos.px += pos.rx * fx;
    pos.py -= pos.ry * fy;
}

/// Forest-Ruth integrator for a straight multipole.
fn str_mpole(pos: &mut Pos, el: &Element, polys: &Polynoms, acc: &Accelerator) {
    let rad_const = radiation_constant(acc);
    let sl = el.length / el.nr_steps as f64;
    let (l1, l2) = (sl * DRIFT1, sl * DRIFT2);
    let (k1, k2) = (sl * KICK1, sl * KICK2);
    for _ in 0..el.nr_steps {
        drift(pos, l1);
        str_thin_kick(pos, polys, k1, rad_const);
        drift(pos, l2);
        str_thin_kick(pos, polys, k2, rad_const);
        drift(pos, l2);
        str_thin_kick(pos, polys, k1, rad_const);
        drift(pos, l1);
    }
}

/// Forest-Ruth integrator for a sector bend with edge fringes.
#[allow(clippy::too_many_arguments)]
fn bnd_mpole(
    pos: &mut Pos,
    el: &Element,
    angle: f64,
    angle_in: f64,
    angle_out: f64,
    gap: f64,
    fint_in: f64,
    fint_out: f64,
    polys: &Polynoms,
    acc: &Accelerator,
) {
    let irho = angle / el.length;
    let rad_const = radiation_constant(acc);
    let sl = el.length / el.nr_steps as f64;
    let (l1, l2) = (sl * DRIFT1, sl * DRIFT2);
    let (k1, k2) = (sl * KICK1, sl * KICK2);

    edge_fringe(pos, irho, angle_in, fint_in, gap);
    for _ in 0..el.nr_steps {
        drift(pos, l1);
        bnd_thin_kick(pos, polys, k1, irho, rad_const);
        drift(pos, l2);
        bnd_thin_kick(pos, polys, k2, irho, rad_const);
        drift(pos, l2);
        bnd_thin_kick(pos, polys, k1, irho, rad_const);
        drift(pos, l1);
    }
    edge_fringe(pos, irho, angle_out, fint_out, gap);
}

/// Thin corrector with drift bookkeeping: equivalent to a half-drift,
/// the kick, and a second half-drift, with the second-order path-length
/// term `L (hkick^2 + vkick^2)/6` folded into the closed form.
fn corrector(pos: &mut Pos, length: f64, hkick: f64, vkick: f64) {
    if length == 0.0 {
        pos.px += hkick;
        pos.py += vkick;
        return;
    }
    let pnorm = 1.0 / (1.0 + pos.de);
    let norml = length * pnorm;
    pos.dl += norml
        * pnorm
        * (hkick * hkick / 3.0
            + vkick * vkick / 3.0
            + pos.px * pos.px
            + pos.py * pos.py
            + pos.px * hkick
            + pos.py * vkick)
        / 2.0;
    pos.rx += norml * (pos.px + hkick / 2.0);
    pos.px += hkick;
    pos.ry += norml * (pos.py + vkick / 2.0);
    pos.py += vkick;
}

/// RF cavity: a pure drift while the cavity is off, otherwise the
/// idealized zero-synchronous-phase energy kick between half-drifts.
fn cavity(pos: &mut Pos, length: f64, frequency: f64, voltage: f64, acc: &Accelerator) {
    if !acc.cavity_on {
        drift(pos, length);
        return;
    }
    let nv = voltage / acc.energy;
    if length == 0.0 {
        pos.de += nv * (TWOPI * frequency * pos.dl / LIGHT_SPEED).sin();
    } else {
        drift(pos, length / 2.0);
        pos.de += nv * (TWOPI * frequency * pos.dl / LIGHT_SPEED).sin();
        drift(pos, length / 2.0);
    }
}

/// Insertion device kick map: half-drift, interpolated kick scaled by
/// `1/(1+de)^2`, half-drift. Leaving the table domain is a particle
/// loss: the offending coordinate is marked NaN for the driver.
fn kicktable_pass(
    pos: &mut Pos,
    el: &Element,
    id: KicktableId,
    acc: &Accelerator,
) -> TrackResult<()> {
    let table = acc
        .kicktables
        .get(id)
        .ok_or(TrackError::MissingKicktable(id.index()))?;
    drift(pos, el.length / 2.0);
    match kicktable_kicks(table, pos.rx, pos.ry) {
        Ok((kx, ky)) => {
            let pnorm = 1.0 / (1.0 + pos.de);
            pos.px += kx * pnorm * pnorm;
            pos.py += ky * pnorm * pnorm;
            drift(pos, el.length / 2.0);
        }
        Err(TrackError::KicktableOutOfRange { .. }) => {
            if !(pos.rx >= table.x_min && pos.rx <= table.x_max) {
                pos.rx = f64::NAN;
            } else {
                pos.ry = f64::NAN;
            }
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
