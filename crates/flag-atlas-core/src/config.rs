use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Layout ratios, all in abstract units.
///
/// Every flag is centered into a `flag_x : flag_y` rectangle regardless of its
/// own aspect; excess space stays transparent. `padding_*` is reserved on each
/// side of a cell (except at the outer edges of the grid, where texture clamping
/// takes over) so filtering never pulls in texels from a neighbouring flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ratios {
    pub flag_x: u32,
    pub flag_y: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    /// Thickness of the decorative border drawn into the spare cell.
    pub border: u32,
}

impl Default for Ratios {
    fn default() -> Self {
        Self {
            flag_x: 12,
            flag_y: 8,
            padding_x: 3,
            padding_y: 2,
            border: 4,
        }
    }
}

impl Ratios {
    /// Horizontal distance between the origins of two neighbouring cells.
    pub fn pitch_x(&self) -> u32 {
        self.flag_x + self.padding_x * 2
    }

    /// Vertical distance between the origins of two neighbouring rows.
    pub fn pitch_y(&self) -> u32 {
        self.flag_y + self.padding_y * 2
    }

    /// `(pitch_x, pitch_y)`, or `None` if either overflows `u32`.
    pub fn checked_pitch(&self) -> Option<(u32, u32)> {
        let px = self.padding_x.checked_mul(2)?.checked_add(self.flag_x)?;
        let py = self.padding_y.checked_mul(2)?.checked_add(self.flag_y)?;
        Some((px, py))
    }

    /// Checks that any grid of `n_cells` cells fits in `u32` units.
    ///
    /// The extremes are a single row (`n_cells` pitches wide) and a single
    /// column (`n_cells` pitches tall); every other column count lies between.
    pub fn check_capacity(&self, n_cells: usize) -> crate::error::Result<()> {
        let overflow = || {
            crate::error::FlagAtlasError::InvalidConfig(format!(
                "{n_cells} cells of {}:{} flags with {}:{} padding overflow the unit grid",
                self.flag_x, self.flag_y, self.padding_x, self.padding_y
            ))
        };
        let (px, py) = self.checked_pitch().ok_or_else(overflow)?;
        let n = u32::try_from(n_cells.max(1)).map_err(|_| overflow())?;
        n.checked_mul(px).ok_or_else(overflow)?;
        n.checked_mul(py).ok_or_else(overflow)?;
        Ok(())
    }
}

/// How units are converted to atlas pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// One pixels-per-unit scalar, fitted to whichever axis binds. The grid is
    /// anchored at the top-left corner.
    Uniform,
    /// Independent x/y scales so the grid covers the whole atlas.
    Stretch,
}

impl FromStr for ScaleMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(Self::Uniform),
            "stretch" => Ok(Self::Stretch),
            _ => Err(()),
        }
    }
}

/// Resampling filter used when scaling flags into their cells.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "linear" => Ok(Self::Triangle),
            "catmull_rom" | "catmullrom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasConfig {
    /// Atlas width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Atlas height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub ratios: Ratios,
    #[serde(default = "default_scale_mode")]
    pub scale_mode: ScaleMode,
    #[serde(default = "default_filter")]
    pub filter: ResampleFilter,
    /// Draw red outlines around each cell's content area (debug).
    #[serde(default)]
    pub texture_outlines: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            ratios: Ratios::default(),
            scale_mode: default_scale_mode(),
            filter: default_filter(),
            texture_outlines: false,
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Either atlas dimension is zero
    /// - A flag ratio is zero
    /// - The border decoration would not fit inside one flag cell
    /// - The cell pitch (flag plus padding on both sides) overflows `u32`
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::FlagAtlasError;

        if self.width == 0 || self.height == 0 {
            return Err(FlagAtlasError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let r = &self.ratios;
        if r.flag_x == 0 || r.flag_y == 0 {
            return Err(FlagAtlasError::InvalidConfig(format!(
                "flag ratio must be non-zero on both axes (got {}:{})",
                r.flag_x, r.flag_y
            )));
        }

        // Both rounded corners sit side by side along x, and each arc reaches
        // `border` units down from the top.
        if r.border.saturating_mul(2) > r.flag_x || r.border > r.flag_y {
            return Err(FlagAtlasError::InvalidConfig(format!(
                "border ratio {} does not fit a {}:{} flag cell",
                r.border, r.flag_x, r.flag_y
            )));
        }

        if r.checked_pitch().is_none() {
            return Err(FlagAtlasError::InvalidConfig(format!(
                "padding ratio {}:{} around a {}:{} flag overflows the cell pitch",
                r.padding_x, r.padding_y, r.flag_x, r.flag_y
            )));
        }

        Ok(())
    }

    /// Validates the configuration for a layout of `n_cells` cells.
    pub fn validate_for(&self, n_cells: usize) -> crate::error::Result<()> {
        self.validate()?;
        self.ratios.check_capacity(n_cells)
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_width() -> u32 {
    1024
}
fn default_height() -> u32 {
    1024
}
fn default_scale_mode() -> ScaleMode {
    ScaleMode::Uniform
}
fn default_filter() -> ResampleFilter {
    ResampleFilter::CatmullRom
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.width = w;
        self.cfg.height = h;
        self
    }
    pub fn ratios(mut self, v: Ratios) -> Self {
        self.cfg.ratios = v;
        self
    }
    pub fn flag_ratio(mut self, x: u32, y: u32) -> Self {
        self.cfg.ratios.flag_x = x;
        self.cfg.ratios.flag_y = y;
        self
    }
    pub fn padding_ratio(mut self, x: u32, y: u32) -> Self {
        self.cfg.ratios.padding_x = x;
        self.cfg.ratios.padding_y = y;
        self
    }
    pub fn border_ratio(mut self, v: u32) -> Self {
        self.cfg.ratios.border = v;
        self
    }
    pub fn scale_mode(mut self, v: ScaleMode) -> Self {
        self.cfg.scale_mode = v;
        self
    }
    pub fn filter(mut self, v: ResampleFilter) -> Self {
        self.cfg.filter = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.texture_outlines = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
