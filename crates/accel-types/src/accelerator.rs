// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Accelerator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::element::Element;
use crate::kicktable::KicktableRegistry;

/// Machine model: the ordered lattice plus the global tracking flags.
///
/// Immutable for the duration of a tracking call; kernels receive it by
/// shared reference and mutate only the particle's phase-space state.
#[derive(Debug, Clone, PartialEq)]
pub struct Accelerator {
    /// Beam energy [eV].
    pub energy: f64,
    pub harmonic_number: i32,
    pub cavity_on: bool,
    pub radiation_on: bool,
    pub vchamber_on: bool,
    pub lattice: Vec<Element>,
    pub kicktables: KicktableRegistry,
}

impl Accelerator {
    pub fn new(energy: f64) -> Self {
        Accelerator {
            energy,
            harmonic_number: 0,
            cavity_on: false,
            radiation_on: false,
            vchamber_on: false,
            lattice: Vec::new(),
            kicktables: KicktableRegistry::new(),
        }
    }

    /// Number of elements in the lattice.
    pub fn len(&self) -> usize {
        self.lattice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lattice.is_empty()
    }

    /// Sum of element lengths [m].
    pub fn circumference(&self) -> f64 {
        self.lattice.iter().map(|e| e.length).sum()
    }
}

impl Default for Accelerator {
    fn default() -> Self {
        Accelerator::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_clean_flags() {
        let acc = Accelerator::new(3e9);
        assert_eq!(acc.energy, 3e9);
        assert!(!acc.cavity_on && !acc.radiation_on && !acc.vchamber_on);
        assert!(acc.is_empty());
        assert!(acc.kicktables.is_empty());
    }

    #[test]
    fn test_circumference_sums_lengths() {
        let mut acc = Accelerator::new(3e9);
        acc.lattice.push(Element::drift("d1", 0.5));
        acc.lattice.push(Element::quadrupole("qf", 0.25, 1.2, 10));
        acc.lattice.push(Element::marker("m"));
        assert_eq!(acc.len(), 3);
        assert!((acc.circumference() - 0.75).abs() < 1e-15);
    }
}
