// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Element
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{TrackError, TrackResult};
use crate::kicktable::KicktableId;
use crate::matrix::Matrix6;

/// Length both multipole coefficient vectors are padded to at minimum,
/// so that dipole, quadrupole and sextupole terms always have a slot.
pub const DEFAULT_POLYNOM_LEN: usize = 3;

/// Serialization names of the pass methods, in tag order.
pub const PASS_METHODS: [&str; 9] = [
    "identity_pass",
    "drift_pass",
    "str_mpole_symplectic4_pass",
    "bnd_mpole_symplectic4_pass",
    "corrector_pass",
    "cavity_pass",
    "thinquad_pass",
    "thinsext_pass",
    "kicktable_pass",
];

/// Paired multipole coefficient vectors, skew (`a`) and normal (`b`).
///
/// Index 0 is the dipole coefficient, index 1 the quadrupole strength
/// K, index 2 the sextupole strength S. Both vectors always share the
/// same length; the constructor zero-pads the shorter one so kernel
/// code can iterate a single index range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynoms {
    a: Vec<f64>,
    b: Vec<f64>,
}

impl Polynoms {
    pub fn new(mut a: Vec<f64>, mut b: Vec<f64>) -> Self {
        let len = a.len().max(b.len());
        a.resize(len, 0.0);
        b.resize(len, 0.0);
        Polynoms { a, b }
    }

    /// Zeroed pair of default length.
    pub fn with_default_len() -> Self {
        Polynoms::new(
            vec![0.0; DEFAULT_POLYNOM_LEN],
            vec![0.0; DEFAULT_POLYNOM_LEN],
        )
    }

    pub fn quadrupole(k: f64) -> Self {
        let mut p = Polynoms::with_default_len();
        p.b[1] = k;
        p
    }

    pub fn sextupole(s: f64) -> Self {
        let mut p = Polynoms::with_default_len();
        p.b[2] = s;
        p
    }

    pub fn a(&self) -> &[f64] {
        &self.a
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Set a skew coefficient, growing both vectors if needed.
    pub fn set_a(&mut self, order: usize, value: f64) {
        self.grow(order + 1);
        self.a[order] = value;
    }

    /// Set a normal coefficient, growing both vectors if needed.
    pub fn set_b(&mut self, order: usize, value: f64) {
        self.grow(order + 1);
        self.b[order] = value;
    }

    fn grow(&mut self, len: usize) {
        if len > self.a.len() {
            self.a.resize(len, 0.0);
            self.b.resize(len, 0.0);
        }
    }

    /// Index of the highest non-zero coefficient in either vector.
    pub fn max_order(&self) -> usize {
        let mut order = 0;
        for i in 0..self.len() {
            if self.a[i] != 0.0 || self.b[i] != 0.0 {
                order = i;
            }
        }
        order
    }
}

/// Physics payload of an element, one variant per pass method.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Marker,
    Drift,
    Multipole {
        polynoms: Polynoms,
    },
    Bend {
        angle: f64,
        angle_in: f64,
        angle_out: f64,
        gap: f64,
        fint_in: f64,
        fint_out: f64,
        polynoms: Polynoms,
    },
    Corrector {
        hkick: f64,
        vkick: f64,
    },
    Cavity {
        frequency: f64,
        voltage: f64,
    },
    ThinQuad {
        kl: f64,
    },
    ThinSext {
        sl: f64,
    },
    Kicktable {
        table: KicktableId,
    },
}

impl ElementKind {
    /// Serialization name of the pass method this payload belongs to.
    pub fn pass_method(&self) -> &'static str {
        match self {
            ElementKind::Marker => PASS_METHODS[0],
            ElementKind::Drift => PASS_METHODS[1],
            ElementKind::Multipole { .. } => PASS_METHODS[2],
            ElementKind::Bend { .. } => PASS_METHODS[3],
            ElementKind::Corrector { .. } => PASS_METHODS[4],
            ElementKind::Cavity { .. } => PASS_METHODS[5],
            ElementKind::ThinQuad { .. } => PASS_METHODS[6],
            ElementKind::ThinSext { .. } => PASS_METHODS[7],
            ElementKind::Kicktable { .. } => PASS_METHODS[8],
        }
    }

    pub fn is_geometry_only(&self) -> bool {
        matches!(self, ElementKind::Marker | ElementKind::Drift)
    }
}

/// A single lattice element: shared geometric header plus the tagged
/// physics payload. Immutable during tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub fam_name: String,
    pub length: f64,
    pub nr_steps: usize,
    pub hmin: f64,
    pub hmax: f64,
    pub vmin: f64,
    pub vmax: f64,
    pub t_in: [f64; 6],
    pub t_out: [f64; 6],
    pub r_in: Matrix6,
    pub r_out: Matrix6,
    pub kind: ElementKind,
}

impl Element {
    pub fn new(fam_name: &str, length: f64, kind: ElementKind) -> Self {
        Element {
            fam_name: fam_name.to_string(),
            length,
            nr_steps: 1,
            hmin: f64::NEG_INFINITY,
            hmax: f64::INFINITY,
            vmin: f64::NEG_INFINITY,
            vmax: f64::INFINITY,
            t_in: [0.0; 6],
            t_out: [0.0; 6],
            r_in: Matrix6::identity(),
            r_out: Matrix6::identity(),
            kind,
        }
    }

    pub fn marker(fam_name: &str) -> Self {
        Element::new(fam_name, 0.0, ElementKind::Marker)
    }

    pub fn bpm(fam_name: &str) -> Self {
        Element::marker(fam_name)
    }

    pub fn drift(fam_name: &str, length: f64) -> Self {
        Element::new(fam_name, length, ElementKind::Drift)
    }

    pub fn hcorrector(fam_name: &str, length: f64, hkick: f64) -> Self {
        Element::corrector(fam_name, length, hkick, 0.0)
    }

    pub fn vcorrector(fam_name: &str, length: f64, vkick: f64) -> Self {
        Element::corrector(fam_name, length, 0.0, vkick)
    }

    pub fn corrector(fam_name: &str, length: f64, hkick: f64, vkick: f64) -> Self {
        Element::new(fam_name, length, ElementKind::Corrector { hkick, vkick })
    }

    pub fn quadrupole(fam_name: &str, length: f64, k: f64, nr_steps: usize) -> Self {
        let mut e = Element::new(
            fam_name,
            length,
            ElementKind::Multipole {
                polynoms: Polynoms::quadrupole(k),
            },
        );
        e.nr_steps = nr_steps;
        e
    }

    pub fn sextupole(fam_name: &str, length: f64, s: f64, nr_steps: usize) -> Self {
        let mut e = Element::new(
            fam_name,
            length,
            ElementKind::Multipole {
                polynoms: Polynoms::sextupole(s),
            },
        );
        e.nr_steps = nr_steps;
        e
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rbend(
        fam_name: &str,
        length: f64,
        angle: f64,
        angle_in: f64,
        angle_out: f64,
        gap: f64,
        fint_in: f64,
        fint_out: f64,
        polynoms: Polynoms,
        k: f64,
        s: f64,
        nr_steps: usize,
    ) -> Self {
        let mut polynoms = polynoms;
        polynoms.set_b(1, k);
        polynoms.set_b(2, s);
        let mut e = Element::new(
            fam_name,
            length,
            ElementKind::Bend {
                angle,
                angle_in,
                angle_out,
                gap,
                fint_in,
                fint_out,
                polynoms,
            },
        );
        e.nr_steps = nr_steps;
        e
    }

    pub fn rfcavity(fam_name: &str, length: f64, frequency: f64, voltage: f64) -> Self {
        Element::new(fam_name, length, ElementKind::Cavity { frequency, voltage })
    }

    pub fn thin_quad(fam_name: &str, kl: f64) -> Self {
        Element::new(fam_name, 0.0, ElementKind::ThinQuad { kl })
    }

    pub fn thin_sext(fam_name: &str, sl: f64) -> Self {
        Element::new(fam_name, 0.0, ElementKind::ThinSext { sl })
    }

    pub fn from_kicktable(fam_name: &str, table: KicktableId, length: f64) -> Self {
        Element::new(fam_name, length, ElementKind::Kicktable { table })
    }

    /// Serialization name of this element's pass method.
    pub fn pass_method(&self) -> &'static str {
        self.kind.pass_method()
    }

    /// Validate the header invariants enforced at load time.
    pub fn validate(&self) -> TrackResult<()> {
        if self.nr_steps < 1 {
            return Err(TrackError::InvalidElement(format!(
                "{}: nr_steps must be >= 1",
                self.fam_name
            )));
        }
        if !self.length.is_finite() || self.length < 0.0 {
            return Err(TrackError::InvalidElement(format!(
                "{}: length must be finite and >= 0",
                self.fam_name
            )));
        }
        Ok(())
    }

    /// Physical equivalence: for drift and identity elements only the
    /// geometric header is compared, so elements that track identically
    /// compare equal regardless of stale payload data. Distinct from
    /// the structural `PartialEq`.
    pub fn physically_eq(&self, other: &Element) -> bool {
        if self.fam_name != other.fam_name {
            return false;
        }
        if self.pass_method() != other.pass_method() {
            return false;
        }
        if self.length != other.length
            || self.nr_steps != other.nr_steps
            || self.hmin != other.hmin
            || self.hmax != other.hmax
            || self.vmin != other.vmin
            || self.vmax != other.vmax
        {
            return false;
        }
        if self.kind.is_geometry_only() {
            return true;
        }
        self.kind == other.kind
            && self.t_in == other.t_in
            && self.t_out == other.t_out
            && self.r_in == other.r_in
            && self.r_out == other.r_out
    }
}
