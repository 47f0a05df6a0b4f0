use flag_atlas_core::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn ids(n: usize) -> Vec<FlagId> {
    (0..n).map(|i| FlagId(i as u32 * 7 + 1)).collect()
}

fn assert_well_formed(layout: &FlagLayout) {
    let atlas = Rect::new(0, 0, layout.atlas_width, layout.atlas_height);
    let cells = layout.placements();
    assert_eq!(cells.len(), layout.flags.len() + 1);

    let mut seen = HashSet::new();
    let mut total = 0u64;
    for (i, p) in cells.iter().enumerate() {
        assert_eq!(p.index, i);
        assert!(seen.insert((p.row, p.column)), "cell {i} reuses a grid slot");
        assert!(p.column < layout.grid.n_columns);
        assert!(p.row < layout.grid.n_rows);
        assert!(atlas.contains(&p.padded), "cell {i} leaves the atlas: {:?}", p.padded);
        assert!(p.padded.contains(&p.content), "cell {i} content outside padding");
        total += p.padded.area();
    }
    assert!(total <= atlas.area());

    for a in 0..cells.len() {
        for b in (a + 1)..cells.len() {
            assert!(
                !cells[a].padded.intersects(&cells[b].padded),
                "cells {a} and {b} overlap: {:?} {:?}",
                cells[a].padded,
                cells[b].padded
            );
        }
    }
}

#[test]
fn four_flags_on_default_atlas() {
    let layout = plan_layout(ids(4), &AtlasConfig::default()).expect("plan");
    assert_eq!(layout.grid.n_columns, 2);
    assert_eq!(layout.grid.n_rows, 3);
    assert_eq!(layout.unit_scale.x, 32.0);

    let p0 = layout.placement(0).expect("cell 0");
    assert_eq!((p0.row, p0.column), (0, 0));
    assert_eq!(p0.content, Rect::new(0, 0, 384, 256));
    // padding only towards the neighbours
    assert_eq!(p0.padded, Rect::new(0, 0, 480, 320));

    let p1 = layout.placement(1).expect("cell 1");
    assert_eq!((p1.row, p1.column), (0, 1));
    assert_eq!(p1.content, Rect::new(576, 0, 384, 256));
    assert_eq!(p1.padded, Rect::new(480, 0, 480, 320));

    let border = layout.placement(layout.border_index()).expect("border");
    assert_eq!(border.index, 4);
    assert_eq!((border.row, border.column), (2, 0));
    assert_eq!(border.content, Rect::new(0, 768, 384, 256));
    assert_eq!(border.padded, Rect::new(0, 704, 480, 320));

    assert!(layout.placement(5).is_none());
    assert_well_formed(&layout);
}

#[test]
fn zero_flags_place_only_the_border() {
    let layout = plan_layout(Vec::new(), &AtlasConfig::default()).expect("plan");
    assert_eq!(layout.n_cells(), 1);
    assert_eq!(layout.grid.n_columns, 1);
    assert_eq!(layout.grid.n_rows, 1);
    assert_eq!(layout.border_index(), 0);
    assert_eq!(layout.cell_kind(0), Some(CellKind::Border));

    // 12x8 units on 1024x1024: width binds
    let p = layout.placement(0).expect("border");
    assert_eq!(p.content, Rect::new(0, 0, 1024, 683));
    assert_eq!(p.padded, p.content);
}

#[test]
fn row_major_order() {
    let layout = plan_layout(ids(20), &AtlasConfig::default()).expect("plan");
    let c = layout.grid.n_columns as usize;
    for p in layout.placements() {
        assert_eq!(p.row as usize, p.index / c);
        assert_eq!(p.column as usize, p.index % c);
    }
}

#[test]
fn random_layouts_are_disjoint_and_inside() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..40 {
        let mode = if rng.gen_bool(0.5) {
            ScaleMode::Uniform
        } else {
            ScaleMode::Stretch
        };
        let cfg = AtlasConfig::builder()
            .with_dimensions(rng.gen_range(256..=2048), rng.gen_range(256..=2048))
            .flag_ratio(rng.gen_range(4..=16), rng.gen_range(4..=16))
            .padding_ratio(rng.gen_range(0..=4), rng.gen_range(0..=4))
            .border_ratio(1)
            .scale_mode(mode)
            .build();
        let layout = plan_layout(ids(rng.gen_range(0..=60)), &cfg).expect("plan");
        assert_well_formed(&layout);
    }
}

#[test]
fn ids_map_to_cells_in_sorted_order() {
    let shuffled = vec![FlagId(0x30), FlagId(0x10), FlagId(0x20)];
    let layout = plan_layout(shuffled, &AtlasConfig::default()).expect("plan");
    assert_eq!(layout.flags, vec![FlagId(0x10), FlagId(0x20), FlagId(0x30)]);
    assert_eq!(layout.index_of(FlagId(0x10)), Some(0));
    assert_eq!(layout.index_of(FlagId(0x30)), Some(2));
    assert_eq!(layout.index_of(FlagId(0x40)), None);
    assert_eq!(layout.cell_kind(1), Some(CellKind::Flag(FlagId(0x20))));
    assert_eq!(layout.cell_kind(3), Some(CellKind::Border));
    assert_eq!(layout.cell_kind(4), None);
}

#[test]
fn uv_matches_content_rect() {
    let layout = plan_layout(ids(4), &AtlasConfig::default()).expect("plan");
    let uv = layout.uv(1).expect("uv");
    assert_eq!(uv, [576.0 / 1024.0, 0.0, 960.0 / 1024.0, 0.25]);
    assert!(layout.uv(9).is_none());
}

#[test]
fn stats_account_for_covered_area() {
    let layout = plan_layout(ids(4), &AtlasConfig::default()).expect("plan");
    let stats = layout.stats();
    assert_eq!(stats.n_cells, 5);
    assert_eq!(stats.atlas_area, 1024 * 1024);
    let covered: u64 = layout.placements().iter().map(|p| p.padded.area()).sum();
    assert_eq!(stats.covered_area, covered);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
    assert_eq!(stats.wasted_area(), stats.atlas_area - covered);
    assert!(stats.summary().contains("Grid: 2x3"));
}
