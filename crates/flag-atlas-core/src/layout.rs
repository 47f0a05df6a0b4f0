use crate::config::{AtlasConfig, Ratios, ScaleMode};
use crate::error::{FlagAtlasError, Result};
use crate::grid::{GridUnits, UnitScale, unit_scale};
use crate::model::{CellKind, CellPlacement, FlagId, LayoutStats};
use crate::optimizer::choose_columns;
use crate::placement::{place_all, place_cell};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// The computed atlas layout: everything a renderer needs to find a flag.
///
/// Cells `0..flags.len()` hold the flags in ascending id order; the border
/// occupies the cell right after them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagLayout {
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub ratios: Ratios,
    pub scale_mode: ScaleMode,
    pub grid: GridUnits,
    pub unit_scale: UnitScale,
    /// Wasted area of the chosen grid, as estimated by the column search.
    pub estimated_waste: f64,
    pub flags: Vec<FlagId>,
}

#[instrument(skip_all)]
/// Lays out `flags` plus one border cell on the configured atlas.
///
/// Ids are sorted ascending; duplicates are rejected. Fails with
/// `CellTooSmall` if a cell would end up less than one pixel wide or tall.
pub fn plan_layout(mut flags: Vec<FlagId>, cfg: &AtlasConfig) -> Result<FlagLayout> {
    cfg.validate_for(flags.len() + 1)?;

    flags.sort_unstable();
    if let Some(w) = flags.windows(2).find(|w| w[0] == w[1]) {
        return Err(FlagAtlasError::DuplicateFlag(w[0]));
    }

    let n_cells = flags.len() + 1;
    let best = choose_columns(cfg, n_cells);
    let scale = unit_scale(&best.grid, cfg.width, cfg.height, cfg.scale_mode);

    let layout = FlagLayout {
        atlas_width: cfg.width,
        atlas_height: cfg.height,
        ratios: cfg.ratios,
        scale_mode: cfg.scale_mode,
        grid: best.grid,
        unit_scale: scale,
        estimated_waste: best.wasted,
        flags,
    };

    if layout
        .placements()
        .iter()
        .any(|p| p.content.w == 0 || p.content.h == 0)
    {
        return Err(FlagAtlasError::CellTooSmall {
            width: cfg.width,
            height: cfg.height,
            n_cells,
        });
    }

    debug!(
        n_flags = layout.flags.len(),
        n_columns = layout.grid.n_columns,
        n_rows = layout.grid.n_rows,
        width_units = layout.grid.width_units,
        height_units = layout.grid.height_units,
        unit_x = layout.unit_scale.x,
        unit_y = layout.unit_scale.y,
        "planned layout"
    );
    Ok(layout)
}

impl FlagLayout {
    /// Number of grid cells (flags plus the border).
    pub fn n_cells(&self) -> usize {
        self.grid.n_cells
    }

    pub fn grid(&self) -> &GridUnits {
        &self.grid
    }

    /// Index of the border cell.
    pub fn border_index(&self) -> usize {
        self.flags.len()
    }

    /// Cell index of a flag, by binary search over the sorted id table.
    pub fn index_of(&self, id: FlagId) -> Option<usize> {
        self.flags.binary_search(&id).ok()
    }

    pub fn cell_kind(&self, index: usize) -> Option<CellKind> {
        match self.flags.get(index) {
            Some(id) => Some(CellKind::Flag(*id)),
            None if index == self.border_index() => Some(CellKind::Border),
            None => None,
        }
    }

    pub fn placement(&self, index: usize) -> Option<CellPlacement> {
        place_cell(
            &self.ratios,
            &self.grid,
            &self.unit_scale,
            (self.atlas_width, self.atlas_height),
            index,
        )
    }

    pub fn placements(&self) -> Vec<CellPlacement> {
        place_all(
            &self.ratios,
            &self.grid,
            &self.unit_scale,
            (self.atlas_width, self.atlas_height),
        )
    }

    /// Normalized `[u0, v0, u1, v1]` texture coordinates of a cell's content.
    pub fn uv(&self, index: usize) -> Option<[f32; 4]> {
        let p = self.placement(index)?;
        let (w, h) = (self.atlas_width as f32, self.atlas_height as f32);
        Some([
            p.content.x as f32 / w,
            p.content.y as f32 / h,
            (p.content.x + p.content.w) as f32 / w,
            (p.content.y + p.content.h) as f32 / h,
        ])
    }

    /// Computes coverage statistics for this layout.
    pub fn stats(&self) -> LayoutStats {
        let atlas_area = self.atlas_width as u64 * self.atlas_height as u64;
        let covered_area: u64 = self.placements().iter().map(|p| p.padded.area()).sum();
        let occupancy = if atlas_area > 0 {
            covered_area as f64 / atlas_area as f64
        } else {
            0.0
        };
        LayoutStats {
            n_cells: self.n_cells(),
            n_columns: self.grid.n_columns,
            n_rows: self.grid.n_rows,
            atlas_area,
            covered_area,
            estimated_waste: self.estimated_waste,
            occupancy,
        }
    }
}
