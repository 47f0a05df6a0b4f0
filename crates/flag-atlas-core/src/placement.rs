use crate::config::Ratios;
use crate::grid::{GridUnits, UnitScale};
use crate::model::{CellPlacement, Rect};

/// Maps cell `index` to its row/column and pixel rectangles.
///
/// Cells fill row-major. Unit coordinates are exact integers and are rounded
/// to pixels edge by edge, so the padded rectangles of neighbouring cells meet
/// without overlapping. Returns `None` when `index` is outside the grid.
pub fn place_cell(
    ratios: &Ratios,
    grid: &GridUnits,
    scale: &UnitScale,
    atlas: (u32, u32),
    index: usize,
) -> Option<CellPlacement> {
    if index >= grid.n_cells {
        return None;
    }
    let column = index as u32 % grid.n_columns;
    let row = index as u32 / grid.n_columns;

    let off_x = column * ratios.pitch_x();
    let off_y = row * ratios.pitch_y();

    let px_x = |u: u32| scale.px_x(u).min(atlas.0);
    let px_y = |u: u32| scale.px_y(u).min(atlas.1);

    let content = Rect::from_edges(
        px_x(off_x),
        px_y(off_y),
        px_x(off_x + ratios.flag_x),
        px_y(off_y + ratios.flag_y),
    );
    // no padding past the outer grid edges; clamp-to-edge sampling covers those
    let padded = Rect::from_edges(
        px_x(off_x.saturating_sub(ratios.padding_x)),
        px_y(off_y.saturating_sub(ratios.padding_y)),
        px_x((off_x + ratios.flag_x + ratios.padding_x).min(grid.width_units)),
        px_y((off_y + ratios.flag_y + ratios.padding_y).min(grid.height_units)),
    );

    Some(CellPlacement {
        index,
        row,
        column,
        content,
        padded,
    })
}

/// Placements for every cell of the grid, in index order.
pub fn place_all(
    ratios: &Ratios,
    grid: &GridUnits,
    scale: &UnitScale,
    atlas: (u32, u32),
) -> Vec<CellPlacement> {
    (0..grid.n_cells)
        .filter_map(|i| place_cell(ratios, grid, scale, atlas, i))
        .collect()
}
