use crate::border::{BorderShape, PathSegment};
use crate::config::{Ratios, ResampleFilter};
use crate::error::{FlagAtlasError, Result};
use crate::grid::UnitScale;
use crate::model::{CellPlacement, Rect};
use image::{Rgba, RgbaImage, imageops};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// Size in units of an `src_w x src_h` image aspect-fitted into a flag cell.
///
/// The binding axis is filled; the other is scaled proportionally.
pub fn fit_units(src_w: u32, src_h: u32, ratios: &Ratios) -> (f64, f64) {
    let (fx, fy) = (ratios.flag_x as f64, ratios.flag_y as f64);
    if src_w as u64 * ratios.flag_y as u64 > src_h as u64 * ratios.flag_x as u64 {
        (fx, fx * src_h as f64 / src_w as f64)
    } else {
        (fy * src_w as f64 / src_h as f64, fy)
    }
}

/// Renders one flag into a transparent tile the size of `content`, scaled to
/// fit and centered on the free axis.
pub fn render_flag_tile(
    src: &RgbaImage,
    content: &Rect,
    ratios: &Ratios,
    scale: &UnitScale,
    filter: ResampleFilter,
) -> RgbaImage {
    let mut tile = RgbaImage::new(content.w, content.h);
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 || content.w == 0 || content.h == 0 {
        return tile;
    }
    let (uw, uh) = fit_units(sw, sh, ratios);
    let tw = ((uw * scale.x).round() as u32).clamp(1, content.w);
    let th = ((uh * scale.y).round() as u32).clamp(1, content.h);
    let scaled = imageops::resize(src, tw, th, filter.filter_type());
    let ox = (content.w - tw) / 2;
    let oy = (content.h - th) / 2;
    imageops::replace(&mut tile, &scaled, ox as i64, oy as i64);
    tile
}

/// Rasterizes the border decoration into a `w x h` tile covering one flag cell.
pub fn render_border_tile(shape: &BorderShape, ratios: &Ratios, w: u32, h: u32) -> Result<RgbaImage> {
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| FlagAtlasError::Render(format!("cannot allocate {w}x{h} border tile")))?;
    let transform = Transform::from_scale(
        w as f32 / ratios.flag_x as f32,
        h as f32 / ratios.flag_y as f32,
    );

    for layer in shape.layers() {
        let mut pb = PathBuilder::new();
        for seg in &layer.segments {
            match *seg {
                PathSegment::MoveTo { x, y } => pb.move_to(x as f32, y as f32),
                PathSegment::LineTo { x, y } => pb.line_to(x as f32, y as f32),
                PathSegment::Arc { .. } => {
                    if let Some((x, y)) = seg.start_point() {
                        pb.line_to(x as f32, y as f32);
                    }
                    for [_, c1, c2, p] in seg.arc_cubics() {
                        pb.cubic_to(
                            c1.0 as f32,
                            c1.1 as f32,
                            c2.0 as f32,
                            c2.1 as f32,
                            p.0 as f32,
                            p.1 as f32,
                        );
                    }
                }
                PathSegment::Close => pb.close(),
            }
        }
        // degenerate ratios can collapse a layer to nothing
        let Some(path) = pb.finish() else {
            continue;
        };
        let [r, g, b, a] = layer.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    let mut tile = RgbaImage::new(w, h);
    for (src, dst) in pixmap.pixels().iter().zip(tile.pixels_mut()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(tile)
}

/// Copies `tile` into `canvas` over the cell's padded rectangle.
///
/// The tile maps onto `placement.content`; pixels of the padded border outside
/// it repeat the nearest tile edge pixel, so bilinear sampling near the cell
/// edge never reaches a neighbouring flag.
///
/// - outlines: if true, draw a red 1px outline around the content area
pub fn blit_clamped(tile: &RgbaImage, canvas: &mut RgbaImage, placement: &CellPlacement, outlines: bool) {
    let (cw, ch) = canvas.dimensions();
    let (tw, th) = tile.dimensions();
    if tw == 0 || th == 0 {
        return;
    }
    let content = placement.content;
    let padded = placement.padded;

    for y in padded.y..padded.y + padded.h {
        if y >= ch {
            break;
        }
        let sy = (y as i64 - content.y as i64).clamp(0, th as i64 - 1) as u32;
        for x in padded.x..padded.x + padded.w {
            if x >= cw {
                break;
            }
            let sx = (x as i64 - content.x as i64).clamp(0, tw as i64 - 1) as u32;
            canvas.put_pixel(x, y, *tile.get_pixel(sx, sy));
        }
    }

    if outlines {
        // red outline on content bounds
        let red = Rgba([255, 0, 0, 255]);
        let (dx, dy, rw, rh) = (content.x, content.y, content.w, content.h);
        for xx in 0..rw {
            if dx + xx < cw && dy < ch {
                canvas.put_pixel(dx + xx, dy, red);
            }
            let by = dy + rh.saturating_sub(1);
            if dx + xx < cw && by < ch {
                canvas.put_pixel(dx + xx, by, red);
            }
        }
        for yy in 0..rh {
            if dx < cw && dy + yy < ch {
                canvas.put_pixel(dx, dy + yy, red);
            }
            let rx = dx + rw.saturating_sub(1);
            if rx < cw && dy + yy < ch {
                canvas.put_pixel(rx, dy + yy, red);
            }
        }
    }
}
