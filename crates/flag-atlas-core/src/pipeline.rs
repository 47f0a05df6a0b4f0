use crate::border::border_shape;
use crate::compositing::{blit_clamped, render_border_tile, render_flag_tile};
use crate::config::AtlasConfig;
use crate::error::{FlagAtlasError, Result};
use crate::layout::{FlagLayout, plan_layout};
use crate::model::{CellPlacement, FlagId, LayoutStats};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, instrument};

/// In-memory flag to place (id + decoded image).
pub struct FlagImage {
    pub id: FlagId,
    pub image: DynamicImage,
}

/// Output of an atlas run: layout metadata, per-cell placements and the RGBA atlas.
pub struct AtlasOutput {
    pub layout: FlagLayout,
    /// Placements used for compositing, in cell order (border last).
    pub placements: Vec<CellPlacement>,
    pub rgba: RgbaImage,
}

impl AtlasOutput {
    /// Computes coverage statistics for this output.
    /// This is a convenience method that delegates to `layout.stats()`.
    pub fn stats(&self) -> LayoutStats {
        self.layout.stats()
    }
}

#[instrument(skip_all)]
/// Composes every flag plus the border cell into one atlas.
///
/// Notes:
/// - Flags are placed in ascending id order, row-major; the border comes last.
/// - Any bad input (duplicate id, empty image, atlas too small) fails the whole
///   run; nothing partial is returned.
pub fn build_atlas(mut inputs: Vec<FlagImage>, cfg: AtlasConfig) -> Result<AtlasOutput> {
    cfg.validate()?;

    for inp in &inputs {
        if inp.image.width() == 0 || inp.image.height() == 0 {
            return Err(FlagAtlasError::EmptyImage(inp.id));
        }
    }

    inputs.sort_by_key(|inp| inp.id);
    let layout = plan_layout(inputs.iter().map(|inp| inp.id).collect(), &cfg)?;
    let placements = layout.placements();

    let mut canvas = RgbaImage::new(cfg.width, cfg.height);

    for (inp, placement) in inputs.iter().zip(&placements) {
        let rgba = inp.image.to_rgba8();
        let tile = render_flag_tile(
            &rgba,
            &placement.content,
            &layout.ratios,
            &layout.unit_scale,
            cfg.filter,
        );
        blit_clamped(&tile, &mut canvas, placement, cfg.texture_outlines);
    }

    let border = placements
        .get(layout.border_index())
        .ok_or_else(|| FlagAtlasError::Render("layout has no border cell".into()))?;
    let tile = render_border_tile(
        &border_shape(&layout.ratios),
        &layout.ratios,
        border.content.w,
        border.content.h,
    )?;
    blit_clamped(&tile, &mut canvas, border, cfg.texture_outlines);

    debug!(cells = placements.len(), "composited atlas");
    Ok(AtlasOutput {
        layout,
        placements,
        rgba: canvas,
    })
}
