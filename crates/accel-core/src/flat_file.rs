// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Flat File
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flat-file lattice serialization.
//!
//! The native line-oriented format (`%` globals, `fam_name` blocks,
//! sparse polynomials) plus a reader for the legacy Tracy machine
//! files. Parse failures are fatal for the current file; the partially
//! built accelerator is discarded.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use accel_types::accelerator::Accelerator;
use accel_types::config::MachineConfig;
use accel_types::constants::{LIGHT_SPEED, TWOPI};
use accel_types::element::{Element, ElementKind, Polynoms, PASS_METHODS};
use accel_types::error::{TrackError, TrackResult};
use accel_types::matrix::Matrix6;
use accel_types::pos::PHASE_DIM;

/// Numeric tags of the legacy Tracy element records.
mod tracy_type {
    pub const MARKER: i64 = -1;
    pub const DRIFT: i64 = 0;
    pub const MPOLE: i64 = 1;
    pub const CAVITY: i64 = 2;
    pub const CORRECTOR: i64 = 3;
    pub const KICKTABLE: i64 = 6;
}

/// Build an accelerator from a machine configuration: the configured
/// lattice file provides the elements, the configuration overrides the
/// global flags.
pub fn load_machine(cfg: &MachineConfig) -> TrackResult<Accelerator> {
    let mut acc = read_flat_file(&cfg.lattice_file)?;
    acc.energy = cfg.energy;
    acc.harmonic_number = cfg.harmonic_number;
    acc.cavity_on = cfg.cavity_on;
    acc.radiation_on = cfg.radiation_on;
    acc.vchamber_on = cfg.vchamber_on;
    Ok(acc)
}

// ── native format ────────────────────────────────────────────────────

/// Per-block accumulator for the native reader. Keys may arrive in any
/// order; the element is assembled when the block closes.
#[derive(Debug, Clone)]
struct RawElement {
    fam_name: String,
    length: f64,
    nr_steps: usize,
    hmin: f64,
    hmax: f64,
    vmin: f64,
    vmax: f64,
    found_hmin: bool,
    found_vmin: bool,
    hkick: f64,
    vkick: f64,
    angle: f64,
    angle_in: f64,
    angle_out: f64,
    gap: f64,
    fint_in: f64,
    fint_out: f64,
    voltage: f64,
    frequency: f64,
    thin_kl: f64,
    thin_sl: f64,
    t_in: [f64; 6],
    t_out: [f64; 6],
    r_in: Matrix6,
    r_out: Matrix6,
    polynom_a: Vec<f64>,
    polynom_b: Vec<f64>,
    pass_method: Option<String>,
}

impl RawElement {
    fn new(fam_name: &str) -> Self {
        RawElement {
            fam_name: fam_name.to_string(),
            length: 0.0,
            nr_steps: 1,
            hmin: f64::NEG_INFINITY,
            hmax: f64::INFINITY,
            vmin: f64::NEG_INFINITY,
            vmax: f64::INFINITY,
            found_hmin: false,
            found_vmin: false,
            hkick: 0.0,
            vkick: 0.0,
            angle: 0.0,
            angle_in: 0.0,
            angle_out: 0.0,
            gap: 0.0,
            fint_in: 0.0,
            fint_out: 0.0,
            voltage: 0.0,
            frequency: 0.0,
            thin_kl: 0.0,
            thin_sl: 0.0,
            t_in: [0.0; 6],
            t_out: [0.0; 6],
            r_in: Matrix6::identity(),
            r_out: Matrix6::identity(),
            polynom_a: vec![0.0; 3],
            polynom_b: vec![0.0; 3],
            pass_method: None,
        }
    }

    fn into_element(
        self,
        registry_dir: &Path,
        acc: &mut Accelerator,
        line: usize,
    ) -> TrackResult<Element> {
        let pass_method = self.pass_method.as_deref().unwrap_or("drift_pass");
        let kind = match pass_method {
            "identity_pass" => ElementKind::Marker,
            "drift_pass" => ElementKind::Drift,
            "str_mpole_symplectic4_pass" => ElementKind::Multipole {
                polynoms: Polynoms::new(self.polynom_a, self.polynom_b),
            },
            "bnd_mpole_symplectic4_pass" => ElementKind::Bend {
                angle: self.angle,
                angle_in: self.angle_in,
                angle_out: self.angle_out,
                gap: self.gap,
                fint_in: self.fint_in,
                fint_out: self.fint_out,
                polynoms: Polynoms::new(self.polynom_a, self.polynom_b),
            },
            "corrector_pass" => ElementKind::Corrector {
                hkick: self.hkick,
                vkick: self.vkick,
            },
            "cavity_pass" => ElementKind::Cavity {
                frequency: self.frequency,
                voltage: self.voltage,
            },
            "thinquad_pass" => ElementKind::ThinQuad { kl: self.thin_kl },
            "thinsext_pass" => ElementKind::ThinSext { sl: self.thin_sl },
            "kicktable_pass" => {
                let path = registry_dir.join(format!("{}.txt", self.fam_name));
                let table = acc.kicktables.add(path)?;
                ElementKind::Kicktable { table }
            }
            other => return Err(TrackError::PassMethodNotDefined(other.to_string())),
        };

        let mut el = Element::new(&self.fam_name, self.length, kind);
        el.nr_steps = self.nr_steps;
        el.hmin = self.hmin;
        el.hmax = self.hmax;
        el.vmin = self.vmin;
        el.vmax = self.vmax;
        el.t_in = self.t_in;
        el.t_out = self.t_out;
        el.r_in = self.r_in;
        el.r_out = self.r_out;
        el.validate().map_err(|e| TrackError::FlatFileError {
            line,
            message: e.to_string(),
        })?;
        Ok(el)
    }
}

fn parse_f64(tok: &str, line: usize) -> TrackResult<f64> {
    tok.parse().map_err(|_| TrackError::FlatFileError {
        line,
        message: format!("expected a number, found '{tok}'"),
    })
}

fn parse_vec6(tokens: &mut std::str::SplitWhitespace, line: usize) -> TrackResult<[f64; 6]> {
    let mut out = [0.0; 6];
    for v in out.iter_mut() {
        let tok = tokens.next().ok_or_else(|| TrackError::FlatFileError {
            line,
            message: "expected 6 values".to_string(),
        })?;
        *v = parse_f64(tok, line)?;
    }
    Ok(out)
}

/// Sparse `(order, value)` pairs; the vector is resized to the highest
/// order seen on this line, zero filled.
fn parse_polynom(
    tokens: &mut std::str::SplitWhitespace,
    poly: &mut Vec<f64>,
    line: usize,
) -> TrackResult<()> {
    let mut orders = Vec::new();
    let mut values = Vec::new();
    let mut size = 0usize;
    while let Some(tok) = tokens.next() {
        let order: usize = tok.parse().map_err(|_| TrackError::FlatFileError {
            line,
            message: format!("expected a polynomial order, found '{tok}'"),
        })?;
        let val_tok = tokens.next().ok_or_else(|| TrackError::FlatFileError {
            line,
            message: "dangling polynomial order without value".to_string(),
        })?;
        let value = parse_f64(val_tok, line)?;
        orders.push(order);
        values.push(value);
        size = size.max(order + 1);
    }
    if size > 0 {
        poly.resize(size, 0.0);
        for v in poly.iter_mut() {
            *v = 0.0;
        }
        for (o, v) in orders.into_iter().zip(values) {
            poly[o] = v;
        }
    }
    Ok(())
}

/// Read a lattice in the native flat format.
pub fn read_flat_file(path: impl AsRef<Path>) -> TrackResult<Accelerator> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TrackError::FileNotFound(path.display().to_string())
        } else {
            TrackError::Io(e)
        }
    })?;
    let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut acc = Accelerator::default();
    let mut raw: Option<RawElement> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();
        let Some(cmd) = tokens.next() else { continue };

        if cmd.starts_with('#') {
            continue;
        }
        if cmd.starts_with('%') {
            let key = if cmd.len() > 1 {
                &cmd[1..]
            } else {
                tokens.next().unwrap_or("")
            };
            let mut value = || {
                tokens.next().ok_or_else(|| TrackError::FlatFileError {
                    line: line_no,
                    message: format!("missing value for global '{key}'"),
                })
            };
            match key {
                "energy" => acc.energy = parse_f64(value()?, line_no)?,
                "harmonic_number" => {
                    acc.harmonic_number =
                        value()?.parse().map_err(|_| TrackError::FlatFileError {
                            line: line_no,
                            message: "harmonic_number must be an integer".to_string(),
                        })?
                }
                "cavity_on" => acc.cavity_on = value()? == "true",
                "radiation_on" => acc.radiation_on = value()? == "true",
                "vchamber_on" => acc.vchamber_on = value()? == "true",
                _ => {}
            }
            continue;
        }

        if cmd == "fam_name" {
            if let Some(done) = raw.take() {
                let el = done.into_element(&dir, &mut acc, line_no)?;
                acc.lattice.push(el);
            }
            let name = tokens.next().ok_or_else(|| TrackError::FlatFileError {
                line: line_no,
                message: "fam_name without a name".to_string(),
            })?;
            raw = Some(RawElement::new(name));
            continue;
        }

        let Some(e) = raw.as_mut() else {
            if line.trim().len() < 2 {
                continue;
            }
            return Err(TrackError::FlatFileError {
                line: line_no,
                message: format!("'{cmd}' before any fam_name"),
            });
        };

        match cmd {
            "length" => e.length = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "nr_steps" => {
                e.nr_steps = next_tok(&mut tokens, line_no)?.parse().map_err(|_| {
                    TrackError::FlatFileError {
                        line: line_no,
                        message: "nr_steps must be a positive integer".to_string(),
                    }
                })?
            }
            "hmin" => {
                e.hmin = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?;
                e.found_hmin = true;
            }
            "hmax" => {
                e.hmax = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?;
                if !e.found_hmin {
                    e.hmin = -e.hmax;
                }
                e.found_hmin = false;
            }
            "vmin" => {
                e.vmin = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?;
                e.found_vmin = true;
            }
            "vmax" => {
                e.vmax = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?;
                if !e.found_vmin {
                    e.vmin = -e.vmax;
                }
                e.found_vmin = false;
            }
            "hkick" => e.hkick = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "vkick" => e.vkick = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "angle" => e.angle = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "angle_in" => e.angle_in = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "angle_out" => e.angle_out = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "gap" => e.gap = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "fint_in" => e.fint_in = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "fint_out" => e.fint_out = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "voltage" => e.voltage = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "frequency" => e.frequency = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "thin_kl" => e.thin_kl = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "thin_sl" => e.thin_sl = parse_f64(next_tok(&mut tokens, line_no)?, line_no)?,
            "t_in" => e.t_in = parse_vec6(&mut tokens, line_no)?,
            "t_out" => e.t_out = parse_vec6(&mut tokens, line_no)?,
            "polynom_a" => parse_polynom(&mut tokens, &mut e.polynom_a, line_no)?,
            "polynom_b" => parse_polynom(&mut tokens, &mut e.polynom_b, line_no)?,
            "pass_method" => {
                let name = next_tok(&mut tokens, line_no)?;
                if !PASS_METHODS.contains(&name) {
                    return Err(TrackError::PassMethodNotDefined(name.to_string()));
                }
                e.pass_method = Some(name.to_string());
            }
            _ => {
                if let Some((coord, matrix)) = parse_matrix_row_key(cmd) {
                    let row = parse_vec6(&mut tokens, line_no)?;
                    let m = if matrix == "r_in" {
                        &mut e.r_in
                    } else {
                        &mut e.r_out
                    };
                    for (j, v) in row.iter().enumerate() {
                        m[(coord, j)] = *v;
                    }
                } else if line.trim().len() < 2 {
                    continue;
                } else {
                    return Err(TrackError::FlatFileError {
                        line: line_no,
                        message: format!("unrecognized key '{cmd}'"),
                    });
                }
            }
        }
    }

    if let Some(done) = raw.take() {
        let count = text.lines().count();
        let el = done.into_element(&dir, &mut acc, count)?;
        acc.lattice.push(el);
    }
    Ok(acc)
}

fn next_tok<'a>(
    tokens: &mut std::str::SplitWhitespace<'a>,
    line: usize,
) -> TrackResult<&'a str> {
    tokens.next().ok_or_else(|| TrackError::FlatFileError {
        line,
        message: "missing value".to_string(),
    })
}

/// `rx|r_in` style keys addressing one row of an entry/exit rotation.
fn parse_matrix_row_key(key: &str) -> Option<(usize, &str)> {
    let (coord, matrix) = key.split_once('|')?;
    if matrix != "r_in" && matrix != "r_out" {
        return None;
    }
    let row = match coord {
        "rx" => 0,
        "px" => 1,
        "ry" => 2,
        "py" => 3,
        "de" => 4,
        "dl" => 5,
        _ => return None,
    };
    Some((row, matrix))
}

const MATRIX_ROW_LABELS: [&str; PHASE_DIM] = ["rx", "px", "ry", "py", "de", "dl"];

fn fmt_sci(v: f64) -> String {
    format!("{v:+.17E}")
}

fn write_param(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key:<16}{value}");
}

fn write_vec6(out: &mut String, key: &str, values: &[f64; 6]) {
    let mut rendered = String::new();
    for v in values {
        rendered.push_str(&fmt_sci(*v));
        rendered.push_str("  ");
    }
    write_param(out, key, rendered.trim_end());
}

fn write_matrix(out: &mut String, name: &str, m: &Matrix6) {
    for (i, label) in MATRIX_ROW_LABELS.iter().enumerate() {
        let mut row = [0.0; 6];
        for (j, v) in row.iter_mut().enumerate() {
            *v = m[(i, j)];
        }
        write_vec6(out, &format!("{label}|{name}"), &row);
    }
}

fn write_polynom(out: &mut String, key: &str, poly: &[f64]) {
    if poly.iter().all(|v| *v == 0.0) {
        return;
    }
    let mut rendered = String::new();
    for (i, v) in poly.iter().enumerate() {
        if *v != 0.0 {
            let _ = write!(rendered, "{i} {} ", fmt_sci(*v));
        }
    }
    write_param(out, key, rendered.trim_end());
}

fn write_scalar_if(out: &mut String, key: &str, v: f64) {
    if v != 0.0 {
        write_param(out, key, &fmt_sci(v));
    }
}

/// Write a lattice in the native flat format.
pub fn write_flat_file(acc: &Accelerator, path: impl AsRef<Path>) -> TrackResult<()> {
    let mut out = String::new();
    let _ = writeln!(out, "{:<18}{} eV", "% energy", fmt_sci(acc.energy));
    let _ = writeln!(out, "{:<18}{}", "% harmonic_number", acc.harmonic_number);
    let _ = writeln!(out, "{:<18}{}", "% cavity_on", bool_str(acc.cavity_on));
    let _ = writeln!(out, "{:<18}{}", "% radiation_on", bool_str(acc.radiation_on));
    let _ = writeln!(out, "{:<18}{}", "% vchamber_on", bool_str(acc.vchamber_on));
    out.push('\n');

    for (i, e) in acc.lattice.iter().enumerate() {
        let _ = writeln!(out, "### {i:04} ###");
        write_param(&mut out, "fam_name", &e.fam_name);
        write_param(&mut out, "length", &fmt_sci(e.length));
        write_param(&mut out, "pass_method", e.pass_method());
        if e.nr_steps != 1 {
            write_param(&mut out, "nr_steps", &e.nr_steps.to_string());
        }
        if let ElementKind::Multipole { polynoms } | ElementKind::Bend { polynoms, .. } = &e.kind
        {
            write_polynom(&mut out, "polynom_a", polynoms.a());
            write_polynom(&mut out, "polynom_b", polynoms.b());
        }
        if e.hmin.is_finite() {
            write_param(&mut out, "hmin", &fmt_sci(e.hmin));
        }
        if e.hmax.is_finite() {
            write_param(&mut out, "hmax", &fmt_sci(e.hmax));
        }
        if e.vmin.is_finite() {
            write_param(&mut out, "vmin", &fmt_sci(e.vmin));
        }
        if e.vmax.is_finite() {
            write_param(&mut out, "vmax", &fmt_sci(e.vmax));
        }
        match &e.kind {
            ElementKind::Corrector { hkick, vkick } => {
                write_scalar_if(&mut out, "hkick", *hkick);
                write_scalar_if(&mut out, "vkick", *vkick);
            }
            ElementKind::Bend {
                angle,
                angle_in,
                angle_out,
                gap,
                fint_in,
                fint_out,
                ..
            } => {
                write_scalar_if(&mut out, "angle", *angle);
                write_scalar_if(&mut out, "gap", *gap);
                write_scalar_if(&mut out, "fint_in", *fint_in);
                write_scalar_if(&mut out, "fint_out", *fint_out);
                write_scalar_if(&mut out, "angle_in", *angle_in);
                write_scalar_if(&mut out, "angle_out", *angle_out);
            }
            ElementKind::Cavity { frequency, voltage } => {
                write_scalar_if(&mut out, "voltage", *voltage);
                write_scalar_if(&mut out, "frequency", *frequency);
            }
            ElementKind::ThinQuad { kl } => write_scalar_if(&mut out, "thin_kl", *kl),
            ElementKind::ThinSext { sl } => write_scalar_if(&mut out, "thin_sl", *sl),
            _ => {}
        }
        if e.t_in.iter().any(|v| *v != 0.0) {
            write_vec6(&mut out, "t_in", &e.t_in);
        }
        if e.t_out.iter().any(|v| *v != 0.0) {
            write_vec6(&mut out, "t_out", &e.t_out);
        }
        if !e.r_in.is_identity() {
            write_matrix(&mut out, "r_in", &e.r_in);
        }
        if !e.r_out.is_identity() {
            write_matrix(&mut out, "r_out", &e.r_out);
        }
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

// ── tracy format ─────────────────────────────────────────────────────

struct TokenStream<'a> {
    tokens: Vec<&'a str>,
    next: usize,
}

impl<'a> TokenStream<'a> {
    fn new(text: &'a str) -> Self {
        TokenStream {
            tokens: text.split_whitespace().collect(),
            next: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.next).copied()
    }

    fn next_str(&mut self) -> TrackResult<&'a str> {
        let tok = self.tokens.get(self.next).ok_or(TrackError::FlatFileError {
            line: 0,
            message: "unexpected end of tracy file".to_string(),
        })?;
        self.next += 1;
        Ok(tok)
    }

    fn next_f64(&mut self) -> TrackResult<f64> {
        let tok = self.next_str()?;
        tok.parse().map_err(|_| TrackError::FlatFileError {
            line: 0,
            message: format!("expected a number, found '{tok}'"),
        })
    }

    fn next_i64(&mut self) -> TrackResult<i64> {
        let tok = self.next_str()?;
        tok.parse().map_err(|_| TrackError::FlatFileError {
            line: 0,
            message: format!("expected an integer, found '{tok}'"),
        })
    }

    fn next_usize(&mut self) -> TrackResult<usize> {
        let tok = self.next_str()?;
        tok.parse().map_err(|_| TrackError::FlatFileError {
            line: 0,
            message: format!("expected a count, found '{tok}'"),
        })
    }
}

/// Read a lattice in the legacy Tracy machine format.
///
/// Reproduced legacy behavior: the horizontal corrector kick is negated
/// on ingest, and the synthetic leading `begin` record contributes only
/// its length, entering the lattice as the zero-th drift.
pub fn read_flat_file_tracy(path: impl AsRef<Path>) -> TrackResult<Accelerator> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TrackError::FileNotFound(path.display().to_string())
        } else {
            TrackError::Io(e)
        }
    })?;
    let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut acc = Accelerator::default();
    let mut ts = TokenStream::new(&text);

    while ts.peek().is_some() {
        let fam_name = ts.next_str()?.to_string();
        if fam_name == "prtmfile:" {
            return Err(TrackError::FlatFileError {
                line: 0,
                message: "tracy dump header in lattice position".to_string(),
            });
        }
        let _fnum = ts.next_i64()?;
        let _knum = ts.next_i64()?;
        let _idx = ts.next_i64()?;

        let el_type = ts.next_i64()?;
        let _method = ts.next_i64()?;
        let nr_steps = ts.next_i64()?.max(1) as usize;
        let hmin = ts.next_f64()?;
        let hmax = ts.next_f64()?;
        let vmin = ts.next_f64()?;
        let vmax = ts.next_f64()?;

        if fam_name == "begin" {
            let length = ts.next_f64()?;
            acc.lattice.insert(0, Element::drift("begin", length));
            continue;
        }

        let mut el = match el_type {
            tracy_type::MARKER => Element::marker(&fam_name),
            tracy_type::DRIFT => {
                let length = ts.next_f64()?;
                Element::drift(&fam_name, length)
            }
            tracy_type::CORRECTOR => {
                for _ in 0..3 {
                    ts.next_f64()?;
                }
                for _ in 0..3 {
                    ts.next_i64()?;
                }
                let hkick = ts.next_f64()?;
                let vkick = ts.next_f64()?;
                // Legacy sign convention for horizontal correctors.
                Element::corrector(&fam_name, 0.0, -hkick, vkick)
            }
            tracy_type::CAVITY => {
                let voltage = ts.next_f64()?;
                let frequency = ts.next_f64()?;
                let hnumber = ts.next_i64()?;
                let energy = ts.next_f64()?;
                acc.harmonic_number = hnumber as i32;
                acc.energy = energy;
                // Normalized voltage and wave number in the legacy dump.
                Element::rfcavity(
                    &fam_name,
                    0.0,
                    frequency * LIGHT_SPEED / TWOPI,
                    voltage * energy,
                )
            }
            tracy_type::MPOLE => read_tracy_mpole(&mut ts, &fam_name)?,
            tracy_type::KICKTABLE => {
                ts.next_f64()?;
                ts.next_f64()?;
                let filename = ts.next_str()?;
                let id = acc.kicktables.add(dir.join(filename))?;
                let length = acc
                    .kicktables
                    .get(id)
                    .map(|t| t.length)
                    .unwrap_or_default();
                Element::from_kicktable(&fam_name, id, length)
            }
            other => {
                return Err(TrackError::FlatFileError {
                    line: 0,
                    message: format!("unknown tracy element type {other}"),
                })
            }
        };

        el.nr_steps = nr_steps;
        el.hmin = hmin;
        el.hmax = hmax;
        el.vmin = vmin;
        el.vmax = vmax;
        acc.lattice.push(el);
    }

    Ok(acc)
}

fn read_tracy_mpole(ts: &mut TokenStream, fam_name: &str) -> TrackResult<Element> {
    let dx = ts.next_f64()?;
    let dy = ts.next_f64()?;
    let roll_design = ts.next_f64()?;
    let roll_error = ts.next_f64()?;

    let length = ts.next_f64()?;
    let angle_per_length = ts.next_f64()?;
    let angle_in_deg = ts.next_f64()?;
    let angle_out_deg = ts.next_f64()?;
    let gap = ts.next_f64()?;

    let angle = angle_per_length * length;
    let angle_in = angle_in_deg * std::f64::consts::PI / 180.0;
    let angle_out = angle_out_deg * std::f64::consts::PI / 180.0;

    let nr_monomials = ts.next_usize()?;
    let _n_design = ts.next_i64()?;
    let mut polynoms = Polynoms::with_default_len();
    for _ in 0..nr_monomials {
        let order = ts.next_usize()?;
        if order == 0 {
            return Err(TrackError::FlatFileError {
                line: 0,
                message: "tracy monomial order must be >= 1".to_string(),
            });
        }
        let b = ts.next_f64()?;
        let a = ts.next_f64()?;
        polynoms.set_b(order - 1, b);
        polynoms.set_a(order - 1, a);
    }

    let kind = if angle != 0.0 {
        ElementKind::Bend {
            angle,
            angle_in,
            angle_out,
            gap,
            fint_in: 0.0,
            fint_out: 0.0,
            polynoms,
        }
    } else {
        ElementKind::Multipole { polynoms }
    };

    let mut el = Element::new(fam_name, length, kind);
    // Entry subtracts the transverse offset, exit restores it.
    el.t_in = [dx, 0.0, dy, 0.0, 0.0, 0.0];
    el.t_out = [dx, 0.0, dy, 0.0, 0.0, 0.0];

    let roll = (roll_design + roll_error) * std::f64::consts::PI / 180.0;
    let (s, c) = roll.sin_cos();
    el.r_in[(0, 0)] = c;
    el.r_in[(0, 2)] = s;
    el.r_in[(2, 0)] = -s;
    el.r_in[(2, 2)] = c;
    el.r_in[(1, 1)] = c;
    el.r_in[(1, 3)] = s;
    el.r_in[(3, 1)] = -s;
    el.r_in[(3, 3)] = c;
    el.r_out[(0, 0)] = c;
    el.r_out[(0, 2)] = -s;
    el.r_out[(2, 0)] = s;
    el.r_out[(2, 2)] = c;
    el.r_out[(1, 1)] = c;
    el.r_out[(1, 3)] = -s;
    el.r_out[(3, 1)] = s;
    el.r_out[(3, 3)] = c;
    Ok(el)
}
