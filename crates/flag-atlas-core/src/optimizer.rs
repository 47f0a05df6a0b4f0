use crate::config::AtlasConfig;
use crate::waste::{WasteEstimate, estimate_waste};
use tracing::{debug, trace};

/// Evaluates every column count in `1..=n_cells`, in ascending order.
pub fn evaluate_columns(cfg: &AtlasConfig, n_cells: usize) -> Vec<WasteEstimate> {
    let n_cells = n_cells.max(1);
    (1..=n_cells as u32)
        .map(|c| estimate_waste(&cfg.ratios, c, n_cells, cfg.width, cfg.height))
        .collect()
}

/// Picks the column count that wastes the least atlas area.
///
/// Waste is not guaranteed to fall and rise only once as columns grow, so every
/// candidate is checked. Ties keep the smallest column count.
pub fn choose_columns(cfg: &AtlasConfig, n_cells: usize) -> WasteEstimate {
    let n_cells = n_cells.max(1);
    let mut best: Option<WasteEstimate> = None;
    for n_columns in 1..=n_cells as u32 {
        let est = estimate_waste(&cfg.ratios, n_columns, n_cells, cfg.width, cfg.height);
        trace!(n_columns, wasted = est.wasted, "column candidate");
        match &best {
            Some(b) if est.wasted >= b.wasted => {}
            _ => best = Some(est),
        }
    }
    // n_cells >= 1, so the loop ran at least once
    let best = best.unwrap_or_else(|| estimate_waste(&cfg.ratios, 1, n_cells, cfg.width, cfg.height));
    debug!(
        n_cells,
        n_columns = best.grid.n_columns,
        n_rows = best.grid.n_rows,
        wasted = best.wasted,
        "chose column count"
    );
    best
}
