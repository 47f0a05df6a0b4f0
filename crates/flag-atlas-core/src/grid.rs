//! Unit grid model.
//!
//! Layout math happens in abstract units derived from [`Ratios`] and is only
//! converted to atlas pixels at the very end, so the ratios stay independent
//! of the atlas resolution.

use crate::config::{Ratios, ScaleMode};
use serde::{Deserialize, Serialize};

/// Size of a grid of `n_cells` cells laid out in `n_columns` columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridUnits {
    pub n_cells: usize,
    pub n_columns: u32,
    pub n_rows: u32,
    pub width_units: u32,
    pub height_units: u32,
}

impl GridUnits {
    /// Cells in the (possibly partial) last row.
    pub fn last_row_len(&self) -> u32 {
        let full = self.n_cells as u32 % self.n_columns;
        if full == 0 { self.n_columns } else { full }
    }

    /// Empty slots at the end of the last row.
    pub fn empty_slots(&self) -> u32 {
        self.n_columns - self.last_row_len()
    }

    /// True when the grid is proportionally wider than a `width x height` atlas.
    pub fn is_wider_than(&self, width: u32, height: u32) -> bool {
        // width_units / height_units > width / height, without division
        self.width_units as u64 * height as u64 > width as u64 * self.height_units as u64
    }
}

/// Computes the unit dimensions of a grid.
///
/// Padding is charged between cells only; the outer edges rely on texture
/// clamping instead. `n_columns` is clamped to at least 1 and `n_cells` is
/// treated as at least 1 (the border cell always exists).
pub fn grid_units(ratios: &Ratios, n_columns: u32, n_cells: usize) -> GridUnits {
    let n_columns = n_columns.max(1);
    let n_cells = n_cells.max(1);
    let n_rows = (n_cells as u32).div_ceil(n_columns);
    let width_units = n_columns * ratios.pitch_x() - ratios.padding_x * 2;
    let height_units = n_rows * ratios.pitch_y() - ratios.padding_y * 2;
    GridUnits {
        n_cells,
        n_columns,
        n_rows,
        width_units,
        height_units,
    }
}

/// Pixels per unit along each axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct UnitScale {
    pub x: f64,
    pub y: f64,
}

impl UnitScale {
    /// Pixel coordinate of a unit coordinate along x, rounded to the nearest pixel.
    pub fn px_x(&self, units: u32) -> u32 {
        (units as f64 * self.x).round() as u32
    }
    /// Pixel coordinate of a unit coordinate along y, rounded to the nearest pixel.
    pub fn px_y(&self, units: u32) -> u32 {
        (units as f64 * self.y).round() as u32
    }
}

/// Largest single pixels-per-unit value for which the grid fits the atlas.
///
/// If the grid is proportionally wider than the atlas the width binds,
/// otherwise the height does.
pub fn fit_unit_size(grid: &GridUnits, width: u32, height: u32) -> f64 {
    if grid.is_wider_than(width, height) {
        width as f64 / grid.width_units as f64
    } else {
        height as f64 / grid.height_units as f64
    }
}

/// Unit-to-pixel scale for a grid under the given mode.
pub fn unit_scale(grid: &GridUnits, width: u32, height: u32, mode: ScaleMode) -> UnitScale {
    match mode {
        ScaleMode::Uniform => {
            let u = fit_unit_size(grid, width, height);
            UnitScale { x: u, y: u }
        }
        ScaleMode::Stretch => UnitScale {
            x: width as f64 / grid.width_units as f64,
            y: height as f64 / grid.height_units as f64,
        },
    }
}
