// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Phase Space
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// Number of canonical phase-space coordinates.
pub const PHASE_DIM: usize = 6;

/// Canonical 6-D phase-space coordinates of a single particle.
///
/// Transverse offsets `rx`, `ry` [m], conjugate momenta `px`, `py`
/// [rad, scaled], fractional energy deviation `de = (E - E0)/E0` and
/// path-length lag `dl` [m]. An on-momentum particle in a straight
/// drift keeps `de` and `dl` constant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pos {
    pub rx: f64,
    pub px: f64,
    pub ry: f64,
    pub py: f64,
    pub de: f64,
    pub dl: f64,
}

impl Pos {
    pub const fn new(rx: f64, px: f64, ry: f64, py: f64, de: f64, dl: f64) -> Self {
        Pos {
            rx,
            px,
            ry,
            py,
            de,
            dl,
        }
    }

    pub const fn zero() -> Self {
        Pos::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Broadcast a scalar into all six components.
    pub const fn fill(value: f64) -> Self {
        Pos::new(value, value, value, value, value, value)
    }

    /// Sentinel used for lost particles in trajectory output.
    pub const fn nan() -> Self {
        Pos::fill(f64::NAN)
    }

    pub fn is_finite(&self) -> bool {
        self.rx.is_finite()
            && self.px.is_finite()
            && self.ry.is_finite()
            && self.py.is_finite()
            && self.de.is_finite()
            && self.dl.is_finite()
    }

    /// Largest absolute component, the norm used by the Newton searches.
    pub fn max_abs(&self) -> f64 {
        self.rx
            .abs()
            .max(self.px.abs())
            .max(self.ry.abs())
            .max(self.py.abs())
            .max(self.de.abs())
            .max(self.dl.abs())
    }
}

impl Index<usize> for Pos {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.rx,
            1 => &self.px,
            2 => &self.ry,
            3 => &self.py,
            4 => &self.de,
            5 => &self.dl,
            _ => panic!("phase-space index out of range: {i}"),
        }
    }
}

impl IndexMut<usize> for Pos {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.rx,
            1 => &mut self.px,
            2 => &mut self.ry,
            3 => &mut self.py,
            4 => &mut self.de,
            5 => &mut self.dl,
            _ => panic!("phase-space index out of range: {i}"),
        }
    }
}

impl Add for Pos {
    type Output = Pos;

    fn add(self, o: Pos) -> Pos {
        Pos::new(
            self.rx + o.rx,
            self.px + o.px,
            self.ry + o.ry,
            self.py + o.py,
            self.de + o.de,
            self.dl + o.dl,
        )
    }
}

impl AddAssign for Pos {
    fn add_assign(&mut self, o: Pos) {
        *self = *self + o;
    }
}

impl Sub for Pos {
    type Output = Pos;

    fn sub(self, o: Pos) -> Pos {
        Pos::new(
            self.rx - o.rx,
            self.px - o.px,
            self.ry - o.ry,
            self.py - o.py,
            self.de - o.de,
            self.dl - o.dl,
        )
    }
}

impl SubAssign for Pos {
    fn sub_assign(&mut self, o: Pos) {
        *self = *self - o;
    }
}

impl Neg for Pos {
    type Output = Pos;

    fn neg(self) -> Pos {
        self * -1.0
    }
}

impl Mul<f64> for Pos {
    type Output = Pos;

    fn mul(self, s: f64) -> Pos {
        Pos::new(
            self.rx * s,
            self.px * s,
            self.ry * s,
            self.py * s,
            self.de * s,
            self.dl * s,
        )
    }
}

impl Mul<Pos> for f64 {
    type Output = Pos;

    fn mul(self, p: Pos) -> Pos {
        p * self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_matches_fields() {
        let p = Pos::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        for i in 0..PHASE_DIM {
            assert_eq!(p[i], (i + 1) as f64, "component {i}");
        }
    }

    #[test]
    fn test_elementwise_arithmetic() {
        let a = Pos::new(1.0, -2.0, 0.5, 0.0, 1e-3, -1e-3);
        let b = Pos::fill(0.25);
        let sum = a + b;
        assert_eq!(sum.rx, 1.25);
        assert_eq!(sum.px, -1.75);
        assert_eq!(sum - b, a);
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!((-a) + a, Pos::zero());
    }

    #[test]
    fn test_nan_sentinel_is_not_finite() {
        assert!(!Pos::nan().is_finite());
        let mut p = Pos::zero();
        assert!(p.is_finite());
        p.py = f64::INFINITY;
        assert!(!p.is_finite());
    }

    #[test]
    fn test_max_abs() {
        let p = Pos::new(1e-6, -3e-2, 0.0, 2e-3, 0.0, 1e-9);
        assert_eq!(p.max_abs(), 3e-2);
    }
}
