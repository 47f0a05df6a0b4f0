//! Decorative border drawn into the spare grid cell.
//!
//! The shape is a bracket with rounded top corners: an inner band of radius
//! `border / 2` filled with a light tone, framed by an outer band of radius
//! `border` filled with a darker tone. Coordinates are in units relative to
//! the cell's content origin, with y pointing down.

use crate::config::Ratios;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// One path command. Angles are in radians, measured from +x towards +y.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    /// Circular arc from `start` to `end`; the sweep direction follows the sign
    /// of `end - start`.
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
    },
    Close,
}

/// A cubic Bézier piece: start, two control points, end.
pub type Cubic = [(f64, f64); 4];

impl PathSegment {
    /// Approximates an arc by cubics of at most a quarter turn each.
    /// Non-arc segments yield nothing.
    pub fn arc_cubics(&self) -> Vec<Cubic> {
        let PathSegment::Arc {
            cx,
            cy,
            radius,
            start,
            end,
        } = *self
        else {
            return Vec::new();
        };
        let sweep = end - start;
        // tolerance keeps an exact quarter turn from splitting in two
        let n = ((sweep.abs() / FRAC_PI_2 - 1e-9).ceil() as usize).max(1);
        let step = sweep / n as f64;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        (0..n)
            .map(|i| {
                let a0 = start + step * i as f64;
                let a1 = a0 + step;
                let (s0, c0) = a0.sin_cos();
                let (s1, c1) = a1.sin_cos();
                let p0 = (cx + radius * c0, cy + radius * s0);
                let p3 = (cx + radius * c1, cy + radius * s1);
                let p1 = (p0.0 - k * radius * s0, p0.1 + k * radius * c0);
                let p2 = (p3.0 + k * radius * s1, p3.1 - k * radius * c1);
                [p0, p1, p2, p3]
            })
            .collect()
    }

    /// Point where the segment starts drawing, if it has one of its own.
    pub fn start_point(&self) -> Option<(f64, f64)> {
        match *self {
            PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => Some((x, y)),
            PathSegment::Arc {
                cx,
                cy,
                radius,
                start,
                ..
            } => Some((cx + radius * start.cos(), cy + radius * start.sin())),
            PathSegment::Close => None,
        }
    }
}

/// One filled pass of the border decoration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BorderLayer {
    pub segments: Vec<PathSegment>,
    /// Straight (non-premultiplied) RGBA.
    pub color: [u8; 4],
}

impl BorderLayer {
    /// Polyline through the path, with each arc sampled `arc_steps` times.
    pub fn flatten(&self, arc_steps: usize) -> Vec<(f64, f64)> {
        let mut pts = Vec::new();
        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo { x, y } | PathSegment::LineTo { x, y } => pts.push((x, y)),
                PathSegment::Arc {
                    cx,
                    cy,
                    radius,
                    start,
                    end,
                } => {
                    let steps = arc_steps.max(1);
                    for i in 0..=steps {
                        let a = start + (end - start) * i as f64 / steps as f64;
                        pts.push((cx + radius * a.cos(), cy + radius * a.sin()));
                    }
                }
                PathSegment::Close => {}
            }
        }
        pts
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of the flattened path.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let pts = self.flatten(16);
        let (first, rest) = pts.split_first()?;
        Some(rest.iter().fold(
            (first.0, first.1, first.0, first.1),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        ))
    }
}

/// Both fill passes, in paint order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BorderShape {
    /// Inner band, painted first.
    pub inner: BorderLayer,
    /// Outer frame between the two arcs, painted on top.
    pub frame: BorderLayer,
}

impl BorderShape {
    pub fn layers(&self) -> [&BorderLayer; 2] {
        [&self.inner, &self.frame]
    }
}

pub const INNER_COLOR: [u8; 4] = [104, 231, 226, 153];
pub const FRAME_COLOR: [u8; 4] = [0, 128, 128, 153];

/// Builds the border decoration for one `flag_x : flag_y` cell.
pub fn border_shape(ratios: &Ratios) -> BorderShape {
    let fx = ratios.flag_x as f64;
    let fy = ratios.flag_y as f64;
    let b = ratios.border as f64;
    let half = b / 2.0;

    let inner_path = vec![
        PathSegment::MoveTo { x: fx - half, y: fy },
        PathSegment::LineTo { x: fx - half, y: b },
        PathSegment::Arc {
            cx: fx - b,
            cy: b,
            radius: half,
            start: PI * 2.0,
            end: PI * 1.5,
        },
        PathSegment::LineTo { x: b, y: half },
        PathSegment::Arc {
            cx: b,
            cy: b,
            radius: half,
            start: PI * 1.5,
            end: PI,
        },
        PathSegment::LineTo { x: half, y: fy },
    ];

    // The frame keeps tracing from where the inner band stopped, out to the
    // cell edge and back round the outer arcs, giving one closed ring.
    let mut frame_path = inner_path.clone();
    frame_path.extend([
        PathSegment::LineTo { x: 0.0, y: fy },
        PathSegment::LineTo { x: 0.0, y: b },
        PathSegment::Arc {
            cx: b,
            cy: b,
            radius: b,
            start: PI,
            end: PI * 1.5,
        },
        PathSegment::LineTo { x: fx - b, y: 0.0 },
        PathSegment::Arc {
            cx: fx - b,
            cy: b,
            radius: b,
            start: PI * 1.5,
            end: PI * 2.0,
        },
        PathSegment::LineTo { x: fx, y: fy },
        PathSegment::Close,
    ]);

    let mut inner_closed = inner_path;
    inner_closed.push(PathSegment::Close);

    BorderShape {
        inner: BorderLayer {
            segments: inner_closed,
            color: INNER_COLOR,
        },
        frame: BorderLayer {
            segments: frame_path,
            color: FRAME_COLOR,
        },
    }
}
