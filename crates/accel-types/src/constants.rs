// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

/// Speed of light [m/s].
pub const LIGHT_SPEED: f64 = 299_792_458.0;

/// Sands radiation constant C_gamma [m/GeV^3].
pub const CGAMMA: f64 = 8.846_056_192e-5;

/// Full circle in radians.
pub const TWOPI: f64 = 2.0 * std::f64::consts::PI;
