// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Tracking Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 6-D charged-particle tracking engine.
//!
//! Symplectic pass-method kernels, the line/ring lattice drivers with
//! loss detection, closed-orbit Newton searches with one-turn map
//! extraction, and flat-file lattice IO.

pub mod flat_file;
pub mod orbit;
pub mod passmethods;
pub mod tracking;
