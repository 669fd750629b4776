// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Kicktable
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::error::{TrackError, TrackResult};

/// Stable handle into a [`KicktableRegistry`]. Handles are plain
/// indices; they never dangle while the owning registry is alive
/// because the registry is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KicktableId(pub(crate) usize);

impl KicktableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Tabulated insertion-device kick map on a uniform transverse grid.
///
/// Kick arrays are stored `[iy, ix]` with row 0 at `y_min`; the file
/// layout lists rows from `y_max` downwards and is reordered on load.
#[derive(Debug, Clone, PartialEq)]
pub struct Kicktable {
    pub filename: String,
    pub length: f64,
    pub x_nrpts: usize,
    pub y_nrpts: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_kick: Array2<f64>,
    pub y_kick: Array2<f64>,
}

impl Kicktable {
    /// Build a kicktable from in-memory grids, validating shapes.
    #[allow(clippy::too_many_arguments)]
    pub fn from_grids(
        filename: &str,
        length: f64,
        x_range: (f64, f64),
        y_range: (f64, f64),
        x_kick: Array2<f64>,
        y_kick: Array2<f64>,
    ) -> TrackResult<Self> {
        let (y_nrpts, x_nrpts) = x_kick.dim();
        if y_kick.dim() != (y_nrpts, x_nrpts) {
            return Err(TrackError::InvalidElement(format!(
                "kicktable {filename}: kick map shapes differ: {:?} vs {:?}",
                x_kick.dim(),
                y_kick.dim()
            )));
        }
        if x_nrpts < 2 || y_nrpts < 2 {
            return Err(TrackError::InvalidElement(format!(
                "kicktable {filename}: grid needs at least 2 points per axis"
            )));
        }
        if x_range.0 >= x_range.1 || y_range.0 >= y_range.1 {
            return Err(TrackError::InvalidElement(format!(
                "kicktable {filename}: degenerate grid extents"
            )));
        }
        Ok(Kicktable {
            filename: filename.to_string(),
            length,
            x_nrpts,
            y_nrpts,
            x_min: x_range.0,
            x_max: x_range.1,
            y_min: y_range.0,
            y_max: y_range.1,
            x_kick,
            y_kick,
        })
    }

    /// Load a kick map from its text representation: two title lines,
    /// the labeled device length and point counts, then a horizontal
    /// and a vertical block each holding a coordinate row followed by
    /// one row per vertical grid line, top down.
    pub fn load(path: impl AsRef<Path>) -> TrackResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TrackError::FileNotFound(path.display().to_string())
            } else {
                TrackError::Io(e)
            }
        })?;
        let mut cursor = KickmapCursor::new(&text);

        cursor.skip_line()?; // table name
        cursor.skip_line()?; // author
        cursor.skip_line()?; // length label
        let length = cursor.next_number()?;
        cursor.skip_line()?; // horizontal point count label
        let x_nrpts = cursor.next_number()? as usize;
        cursor.skip_line()?; // vertical point count label
        let y_nrpts = cursor.next_number()? as usize;
        if x_nrpts < 2 || y_nrpts < 2 {
            return Err(cursor.error("grid needs at least 2 points per axis"));
        }

        let mut x_min = f64::NAN;
        let mut x_max = f64::NAN;
        let mut y_min = f64::NAN;
        let mut y_max = f64::NAN;
        let mut x_kick = Array2::zeros((y_nrpts, x_nrpts));
        let mut y_kick = Array2::zeros((y_nrpts, x_nrpts));

        for (block, kicks) in [(0, &mut x_kick), (1, &mut y_kick)] {
            cursor.skip_line()?; // block label
            cursor.skip_line()?; // START
            for _ in 0..x_nrpts {
                let posx = cursor.next_number()?;
                if block == 0 {
                    if x_min.is_nan() || posx < x_min {
                        x_min = posx;
                    }
                    if x_max.is_nan() || posx > x_max {
                        x_max = posx;
                    }
                }
            }
            for j in (0..y_nrpts).rev() {
                let posy = cursor.next_number()?;
                if block == 0 {
                    if y_min.is_nan() || posy < y_min {
                        y_min = posy;
                    }
                    if y_max.is_nan() || posy > y_max {
                        y_max = posy;
                    }
                }
                for i in 0..x_nrpts {
                    kicks[[j, i]] = cursor.next_number()?;
                }
            }
        }

        Kicktable::from_grids(
            &path.display().to_string(),
            length,
            (x_min, x_max),
            (y_min, y_max),
            x_kick,
            y_kick,
        )
    }

    /// Horizontal coordinate of grid column `i`.
    pub fn x_coord(&self, i: usize) -> f64 {
        self.x_min + (self.x_max - self.x_min) * i as f64 / (self.x_nrpts - 1) as f64
    }

    /// Vertical coordinate of grid row `j` (row 0 at `y_min`).
    pub fn y_coord(&self, j: usize) -> f64 {
        self.y_min + (self.y_max - self.y_min) * j as f64 / (self.y_nrpts - 1) as f64
    }
}

/// Line/token cursor over a kick map file: labels are consumed as whole
/// lines, numbers as whitespace tokens that may wrap across lines.
struct KickmapCursor<'a> {
    lines: Vec<&'a str>,
    next: usize,
    tokens: VecDeque<f64>,
}

impl<'a> KickmapCursor<'a> {
    fn new(text: &'a str) -> Self {
        KickmapCursor {
            lines: text.lines().collect(),
            next: 0,
            tokens: VecDeque::new(),
        }
    }

    fn error(&self, message: &str) -> TrackError {
        TrackError::FlatFileError {
            line: self.next,
            message: message.to_string(),
        }
    }

    fn skip_line(&mut self) -> TrackResult<()> {
        while self.next < self.lines.len() {
            let line = self.lines[self.next];
            self.next += 1;
            if !line.trim().is_empty() {
                return Ok(());
            }
        }
        Err(self.error("unexpected end of kicktable file"))
    }

    fn next_number(&mut self) -> TrackResult<f64> {
        loop {
            if let Some(v) = self.tokens.pop_front() {
                return Ok(v);
            }
            if self.next >= self.lines.len() {
                return Err(self.error("unexpected end of kicktable file"));
            }
            let line = self.lines[self.next];
            self.next += 1;
            for tok in line.split_whitespace() {
                let v: f64 = tok
                    .parse()
                    .map_err(|_| self.error(&format!("expected a number, found '{tok}'")))?;
                self.tokens.push_back(v);
            }
        }
    }
}

/// Append-only, filename-deduplicated store of kick maps. Elements hold
/// [`KicktableId`] handles; the registry owns the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KicktableRegistry {
    tables: Vec<Kicktable>,
}

impl KicktableRegistry {
    pub fn new() -> Self {
        KicktableRegistry::default()
    }

    /// Load a kick map file, or return the existing handle if a table
    /// with the same filename is already present.
    pub fn add(&mut self, path: impl AsRef<Path>) -> TrackResult<KicktableId> {
        let name = path.as_ref().display().to_string();
        if let Some(i) = self.tables.iter().position(|t| t.filename == name) {
            return Ok(KicktableId(i));
        }
        let table = Kicktable::load(path)?;
        Ok(self.push(table))
    }

    /// Insert an in-memory table, deduplicating by filename.
    pub fn insert(&mut self, table: Kicktable) -> KicktableId {
        if let Some(i) = self
            .tables
            .iter()
            .position(|t| t.filename == table.filename)
        {
            return KicktableId(i);
        }
        self.push(table)
    }

    fn push(&mut self, table: Kicktable) -> KicktableId {
        self.tables.push(table);
        KicktableId(self.tables.len() - 1)
    }

    pub fn get(&self, id: KicktableId) -> Option<&Kicktable> {
        self.tables.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_kickmap_text() -> String {
        let mut s = String::new();
        s.push_str("# Test undulator kick map\n");
        s.push_str("# Author: beam physics group\n");
        s.push_str("# ID length [m]\n");
        s.push_str("1.4\n");
        s.push_str("# Number of horizontal points\n");
        s.push_str("3\n");
        s.push_str("# Number of vertical points\n");
        s.push_str("3\n");
        for block in 0..2 {
            if block == 0 {
                s.push_str("# Horizontal kick table\n");
            } else {
                s.push_str("# Vertical kick table\n");
            }
            s.push_str("START\n");
            s.push_str(" -0.01 0.0 0.01\n");
            // rows from y_max down to y_min
            for (row, y) in [(2, "0.005"), (1, "0.0"), (0, "-0.005")] {
                let base = if block == 0 { 10.0 } else { 100.0 };
                s.push_str(&format!(
                    "{y} {} {} {}\n",
                    base + row as f64,
                    base + row as f64 + 0.1,
                    base + row as f64 + 0.2
                ));
            }
        }
        s
    }

    fn write_sample(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_kickmap_text().as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_parses_header_and_extents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir, "kmap.txt");
        let kt = Kicktable::load(&path).unwrap();
        assert_eq!(kt.length, 1.4);
        assert_eq!((kt.x_nrpts, kt.y_nrpts), (3, 3));
        assert_eq!((kt.x_min, kt.x_max), (-0.01, 0.01));
        assert_eq!((kt.y_min, kt.y_max), (-0.005, 0.005));
    }

    #[test]
    fn test_load_reorders_rows_bottom_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir, "kmap.txt");
        let kt = Kicktable::load(&path).unwrap();
        // File rows are written top-down; storage row 0 must be y_min.
        assert_eq!(kt.x_kick[[0, 0]], 10.0);
        assert_eq!(kt.x_kick[[2, 0]], 12.0);
        assert_eq!(kt.x_kick[[1, 2]], 11.2);
        assert_eq!(kt.y_kick[[2, 1]], 102.1);
        assert_eq!(kt.x_coord(2), 0.01);
        assert_eq!(kt.y_coord(0), -0.005);
    }

    #[test]
    fn test_load_missing_file_is_file_not_found() {
        let err = Kicktable::load("/nonexistent/kmap.txt").unwrap_err();
        match err {
            TrackError::FileNotFound(p) => assert!(p.contains("kmap.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_truncated_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.txt");
        std::fs::write(&path, "# name\n# author\n# length\n1.0\n").unwrap();
        let err = Kicktable::load(&path).unwrap_err();
        assert!(matches!(err, TrackError::FlatFileError { .. }));
    }

    #[test]
    fn test_registry_deduplicates_by_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(&dir, "kmap.txt");
        let other = write_sample(&dir, "other.txt");
        let mut reg = KicktableRegistry::new();
        let a = reg.add(&path).unwrap();
        let b = reg.add(&path).unwrap();
        let c = reg.add(&other).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(reg.len(), 2);
        assert!(reg.get(a).is_some());
    }

    #[test]
    fn test_from_grids_rejects_shape_mismatch() {
        let err = Kicktable::from_grids(
            "mem",
            1.0,
            (-0.01, 0.01),
            (-0.005, 0.005),
            Array2::zeros((3, 3)),
            Array2::zeros((3, 4)),
        )
        .unwrap_err();
        assert!(matches!(err, TrackError::InvalidElement(_)));
    }
}
