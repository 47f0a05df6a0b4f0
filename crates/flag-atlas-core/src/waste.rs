use crate::config::Ratios;
use crate::grid::{GridUnits, fit_unit_size, grid_units};
use serde::{Deserialize, Serialize};

/// Breakdown of the wasted-space estimate for one candidate column count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WasteEstimate {
    pub grid: GridUnits,
    /// Uniform pixels per unit.
    pub unit_size: f64,
    /// Area of the whole unit grid once scaled (pixels²).
    pub grid_area: f64,
    /// Padded footprint of the empty slots in the last row (pixels²).
    pub empty_area: f64,
    /// Atlas area not covered by any cell (pixels²). Never negative.
    pub wasted: f64,
}

/// Estimates how much of a `width x height` atlas a grid of `n_cells` cells in
/// `n_columns` columns leaves unused.
pub fn estimate_waste(
    ratios: &Ratios,
    n_columns: u32,
    n_cells: usize,
    width: u32,
    height: u32,
) -> WasteEstimate {
    let grid = grid_units(ratios, n_columns, n_cells);
    let unit_size = fit_unit_size(&grid, width, height);
    let (aw, ah) = (width as f64, height as f64);

    // width_units * height_units * unit_size², arranged so the result never
    // exceeds the atlas area after rounding: the ratio on the non-binding axis
    // is below the atlas extent, and multiplication rounds monotonically.
    let grid_area = if grid.is_wider_than(width, height) {
        aw * ((width as u64 * grid.height_units as u64) as f64 / grid.width_units as f64)
    } else {
        ah * ((height as u64 * grid.width_units as u64) as f64 / grid.height_units as f64)
    };

    let footprint = (ratios.pitch_x() as u64 * ratios.pitch_y() as u64) as f64;
    let empty_area = grid.empty_slots() as f64 * footprint * unit_size * unit_size;

    let wasted = aw * ah - grid_area + empty_area;
    WasteEstimate {
        grid,
        unit_size,
        grid_area,
        empty_area,
        wasted,
    }
}

/// Wasted atlas area (pixels²) for a candidate column count.
pub fn wasted_space(ratios: &Ratios, n_columns: u32, n_cells: usize, width: u32, height: u32) -> f64 {
    estimate_waste(ratios, n_columns, n_cells, width, height).wasted
}
