//! Core library for packing flags into one fixed-size texture atlas.
//!
//! - Grid: every cell has the same `flag_x : flag_y` aspect plus padding, so
//!   packing reduces to choosing a column count
//! - Search: every column count is tried and the one wasting the least atlas
//!   area wins (`choose_columns`)
//! - Pipeline: `build_atlas` takes in-memory flags and returns the composited
//!   RGBA atlas plus a `FlagLayout`; `plan_layout` computes the layout only
//! - One extra cell after the flags holds a decorative border
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use flag_atlas_core::{AtlasConfig, FlagImage, build_atlas};
//! # fn main() -> anyhow::Result<()> {
//! let img = ImageReader::open("0a1b2c3d.png")?.decode()?;
//! let inputs = vec![FlagImage { id: "0a1b2c3d".parse()?, image: img }];
//! let cfg = AtlasConfig::builder().with_dimensions(1024, 1024).build();
//! let out = build_atlas(inputs, cfg)?;
//! println!("columns: {}", out.layout.grid.n_columns);
//! # Ok(()) }
//! ```

pub mod border;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod layout;
pub mod model;
pub mod optimizer;
pub mod pipeline;
pub mod placement;
pub mod waste;

pub use config::*;
pub use error::*;
pub use export::*;
pub use grid::*;
pub use layout::*;
pub use model::*;
pub use optimizer::*;
pub use pipeline::*;
pub use placement::*;
pub use waste::*;

/// Convenience prelude for common types and functions.
/// Importing `flag_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::border::{BorderShape, border_shape};
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, Ratios, ResampleFilter, ScaleMode};
    pub use crate::grid::{GridUnits, UnitScale, grid_units};
    pub use crate::layout::{FlagLayout, plan_layout};
    pub use crate::model::{CellKind, CellPlacement, FlagId, LayoutStats, Rect};
    pub use crate::optimizer::choose_columns;
    pub use crate::waste::{WasteEstimate, wasted_space};
    pub use crate::{AtlasOutput, FlagImage, build_atlas};
}
