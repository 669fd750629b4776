//! Bilinear interpolation on kicktable grids.

use accel_types::error::{TrackError, TrackResult};
use accel_types::kicktable::Kicktable;
use ndarray::Array2;

/// Bilinear interpolation of both kick maps at `(x, y)`.
///
/// Returns `(kick_x, kick_y)` [rad] at the nominal energy, or
/// `KicktableOutOfRange` when the point falls outside the table's
/// rectangular domain (non-finite coordinates count as out of range).
pub fn kicktable_kicks(table: &Kicktable, x: f64, y: f64) -> TrackResult<(f64, f64)> {
    if !(x >= table.x_min && x <= table.x_max && y >= table.y_min && y <= table.y_max) {
        return Err(TrackError::KicktableOutOfRange { x, y });
    }

    let dx = (table.x_max - table.x_min) / (table.x_nrpts - 1) as f64;
    let dy = (table.y_max - table.y_min) / (table.y_nrpts - 1) as f64;

    // Fractional grid indices, clamped so the upper boundary lands in
    // the last cell.
    let fx = (x - table.x_min) / dx;
    let fy = (y - table.y_min) / dy;
    let ix = (fx.floor() as usize).min(table.x_nrpts - 2);
    let iy = (fy.floor() as usize).min(table.y_nrpts - 2);
    let tx = (fx - ix as f64).clamp(0.0, 1.0);
    let ty = (fy - iy as f64).clamp(0.0, 1.0);

    let blend = |kick: &Array2<f64>| -> f64 {
        let v00 = kick[[iy, ix]];
        let v01 = kick[[iy, ix + 1]];
        let v10 = kick[[iy + 1, ix]];
        let v11 = kick[[iy + 1, ix + 1]];
        (1.0 - ty) * ((1.0 - tx) * v00 + tx * v01) + ty * ((1.0 - tx) * v10 + tx * v11)
    };

    Ok((blend(&table.x_kick), blend(&table.y_kick)))
}
