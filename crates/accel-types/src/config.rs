// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::TrackResult;

/// Top-level machine configuration, loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    pub machine_name: String,
    /// Flat lattice file, resolved relative to the process directory.
    pub lattice_file: String,
    /// Beam energy [eV].
    pub energy: f64,
    pub harmonic_number: i32,
    #[serde(default)]
    pub cavity_on: bool,
    #[serde(default)]
    pub radiation_on: bool,
    #[serde(default)]
    pub vchamber_on: bool,
    #[serde(default)]
    pub orbit: OrbitNumerics,
}

/// Convergence machinery of the closed-orbit Newton searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrbitNumerics {
    /// Finite-difference step for the one-turn Jacobian.
    pub fd_step: f64,
    /// Newton termination threshold on the correction max-norm.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for OrbitNumerics {
    fn default() -> Self {
        OrbitNumerics {
            fd_step: 1e-8,
            tolerance: 1e-12,
            max_iterations: 50,
        }
    }
}

impl MachineConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> TrackResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "machine_name": "demo-ring",
        "lattice_file": "demo.flat",
        "energy": 3e9,
        "harmonic_number": 864,
        "cavity_on": true
    }"#;

    #[test]
    fn test_deserialize_with_defaults() {
        let cfg: MachineConfig = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.machine_name, "demo-ring");
        assert_eq!(cfg.harmonic_number, 864);
        assert!(cfg.cavity_on);
        assert!(!cfg.radiation_on);
        assert!(!cfg.vchamber_on);
        assert_eq!(cfg.orbit.max_iterations, 50);
        assert!((cfg.orbit.fd_step - 1e-8).abs() < 1e-20);
        assert!((cfg.orbit.tolerance - 1e-12).abs() < 1e-24);
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg: MachineConfig = serde_json::from_str(SAMPLE).unwrap();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2: MachineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.machine_name, cfg2.machine_name);
        assert_eq!(cfg.energy, cfg2.energy);
        assert_eq!(cfg.orbit.max_iterations, cfg2.orbit.max_iterations);
    }

    #[test]
    fn test_from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("machine.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = MachineConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.lattice_file, "demo.flat");
    }
}
