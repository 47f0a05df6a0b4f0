use crate::error::FlagAtlasError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Builds a rectangle from exclusive right/bottom edges.
    pub fn from_edges(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        self.x < r.x + r.w && r.x < self.x + self.w && self.y < r.y + r.h && r.y < self.y + self.h
    }
}

/// Stable content hash identifying one flag.
///
/// Written as exactly eight hex digits (e.g. `0a1b2c3d`), which is also how
/// source files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlagId(pub u32);

impl FromStr for FlagId {
    type Err = FlagAtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FlagAtlasError::InvalidFlagId(s.to_string()));
        }
        u32::from_str_radix(s, 16)
            .map(FlagId)
            .map_err(|_| FlagAtlasError::InvalidFlagId(s.to_string()))
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl TryFrom<String> for FlagId {
    type Error = FlagAtlasError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FlagId> for String {
    fn from(id: FlagId) -> Self {
        id.to_string()
    }
}

/// What a grid cell is filled with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Flag(FlagId),
    Border,
}

/// Pixel placement of one grid cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellPlacement {
    pub index: usize,
    pub row: u32,
    pub column: u32,
    /// Where the cell's `flag_x : flag_y` content lands in the atlas.
    pub content: Rect,
    /// `content` grown by the padding ratio on each side, clipped to the grid.
    /// Filled by clamping `content` at its edges.
    pub padded: Rect,
}

/// Statistics about how well a layout covers the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutStats {
    /// Number of cells (flags plus the border cell).
    pub n_cells: usize,
    pub n_columns: u32,
    pub n_rows: u32,
    /// Atlas width * height.
    pub atlas_area: u64,
    /// Sum of padded cell areas actually written.
    pub covered_area: u64,
    /// Wasted area as estimated by the column-count search.
    pub estimated_waste: f64,
    /// covered_area / atlas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl LayoutStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Cells: {}, Grid: {}x{}, Occupancy: {:.2}%, Atlas Area: {} px², Covered Area: {} px², Estimated Waste: {:.0} px²",
            self.n_cells,
            self.n_columns,
            self.n_rows,
            self.occupancy * 100.0,
            self.atlas_area,
            self.covered_area,
            self.estimated_waste,
        )
    }

    /// Returns uncovered space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.atlas_area.saturating_sub(self.covered_area)
    }

    /// Returns uncovered space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.atlas_area > 0 {
            (self.wasted_area() as f64 / self.atlas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
