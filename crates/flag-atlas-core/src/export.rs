use crate::config::{AtlasConfig, Ratios, ScaleMode};
use crate::error::{FlagAtlasError, Result};
use crate::grid::{grid_units, unit_scale};
use crate::layout::FlagLayout;
use crate::model::{CellKind, FlagId};
use serde::Deserialize;
use serde_json::{Value, json};

/// Schema version of the JSON produced by [`to_json`].
pub const SCHEMA_VERSION: &str = "1";

/// Serialize a layout as the JSON object consumed by the runtime flag painter.
///
/// Shape: `{ meta, ratios, grid, unitScale, flags, cells }` where `flags` lists
/// ids in cell order and `cells` carries each cell's rectangles.
pub fn to_json(layout: &FlagLayout) -> Value {
    let cells: Vec<Value> = layout
        .placements()
        .iter()
        .map(|p| {
            let kind = match layout.cell_kind(p.index) {
                Some(CellKind::Flag(id)) => json!({"flag": id.to_string()}),
                _ => json!("border"),
            };
            let content = json!({"x": p.content.x, "y": p.content.y, "w": p.content.w, "h": p.content.h});
            let padded = json!({"x": p.padded.x, "y": p.padded.y, "w": p.padded.w, "h": p.padded.h});
            json!({
                "index": p.index,
                "row": p.row,
                "column": p.column,
                "kind": kind,
                "content": content,
                "padded": padded,
            })
        })
        .collect();

    let r = &layout.ratios;
    json!({
        "meta": {
            "schemaVersion": SCHEMA_VERSION,
            "app": "flag-atlas",
            "version": env!("CARGO_PKG_VERSION"),
            "format": "RGBA8888",
            "size": {"w": layout.atlas_width, "h": layout.atlas_height},
            "scaleMode": layout.scale_mode,
        },
        "ratios": {
            "flag": {"x": r.flag_x, "y": r.flag_y},
            "padding": {"x": r.padding_x, "y": r.padding_y},
            "border": r.border,
        },
        "grid": {
            "widthUnits": layout.grid.width_units,
            "heightUnits": layout.grid.height_units,
            "columns": layout.grid.n_columns,
            "rows": layout.grid.n_rows,
            "cells": layout.grid.n_cells,
            "borderIndex": layout.border_index(),
        },
        "unitScale": {"x": layout.unit_scale.x, "y": layout.unit_scale.y},
        "flags": layout.flags.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
        "cells": cells,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLayout {
    meta: JsonMeta,
    ratios: JsonRatios,
    grid: JsonGrid,
    flags: Vec<FlagId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonMeta {
    size: JsonSize,
    scale_mode: ScaleMode,
}

#[derive(Deserialize)]
struct JsonSize {
    w: u32,
    h: u32,
}

#[derive(Deserialize)]
struct JsonXY {
    x: u32,
    y: u32,
}

#[derive(Deserialize)]
struct JsonRatios {
    flag: JsonXY,
    padding: JsonXY,
    border: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonGrid {
    width_units: u32,
    height_units: u32,
    columns: u32,
    rows: u32,
}

/// Rebuilds a layout from JSON written by [`to_json`].
///
/// Only the constants, the grid summary and the id table are read; unit scale
/// and rectangles are recomputed from them. Fails if the constants are not a
/// valid configuration, if the column count is outside `1..=cells`, or if the
/// stored grid does not match what the constants imply.
pub fn from_json(value: &Value) -> Result<FlagLayout> {
    let doc: JsonLayout = serde_json::from_value(value.clone())
        .map_err(|e| FlagAtlasError::InvalidConfig(format!("layout json: {e}")))?;
    let cfg = AtlasConfig {
        width: doc.meta.size.w,
        height: doc.meta.size.h,
        ratios: Ratios {
            flag_x: doc.ratios.flag.x,
            flag_y: doc.ratios.flag.y,
            padding_x: doc.ratios.padding.x,
            padding_y: doc.ratios.padding.y,
            border: doc.ratios.border,
        },
        scale_mode: doc.meta.scale_mode,
        ..AtlasConfig::default()
    };
    let n_cells = doc.flags.len() + 1;
    cfg.validate_for(n_cells)?;
    if doc.flags.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FlagAtlasError::InvalidConfig(
            "flag ids are not strictly ascending".into(),
        ));
    }
    if doc.grid.columns == 0 || doc.grid.columns as usize > n_cells {
        return Err(FlagAtlasError::InvalidConfig(format!(
            "{} columns is outside 1..={n_cells}",
            doc.grid.columns
        )));
    }

    let ratios = cfg.ratios;
    let grid = grid_units(&ratios, doc.grid.columns, n_cells);
    if grid.n_columns != doc.grid.columns
        || grid.n_rows != doc.grid.rows
        || grid.width_units != doc.grid.width_units
        || grid.height_units != doc.grid.height_units
    {
        return Err(FlagAtlasError::InvalidConfig(format!(
            "grid {}x{} units ({} rows) does not match {} columns of {} cells",
            doc.grid.width_units,
            doc.grid.height_units,
            doc.grid.rows,
            doc.grid.columns,
            grid.n_cells
        )));
    }
    let scale = unit_scale(&grid, cfg.width, cfg.height, cfg.scale_mode);
    let estimated_waste =
        crate::waste::wasted_space(&ratios, grid.n_columns, grid.n_cells, cfg.width, cfg.height);
    Ok(FlagLayout {
        atlas_width: cfg.width,
        atlas_height: cfg.height,
        ratios,
        scale_mode: cfg.scale_mode,
        grid,
        unit_scale: scale,
        estimated_waste,
        flags: doc.flags,
    })
}
