use flag_atlas_core::config::{AtlasConfig, Ratios};
use flag_atlas_core::optimizer::{choose_columns, evaluate_columns};
use flag_atlas_core::waste::wasted_space;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_optimal(cfg: &AtlasConfig, n: usize) {
    let best = choose_columns(cfg, n);
    let c = best.grid.n_columns;
    assert!(c >= 1 && c as usize <= n);
    for other in 1..=n as u32 {
        let w = wasted_space(&cfg.ratios, other, n, cfg.width, cfg.height);
        assert!(best.wasted <= w, "n={n}: c={c} wastes {} but c={other} wastes {w}", best.wasted);
        // ties go to the smallest column count
        if other < c {
            assert!(w > best.wasted, "n={n}: earlier c={other} ties with chosen c={c}");
        }
    }
}

#[test]
fn single_cell_uses_one_column() {
    let cfg = AtlasConfig::default();
    let best = choose_columns(&cfg, 1);
    assert_eq!(best.grid.n_columns, 1);
    assert_eq!(best.grid.n_rows, 1);
    assert_eq!(best.grid.n_cells, 1);
}

#[test]
fn five_cells_on_default_atlas() {
    let cfg = AtlasConfig::default();
    let best = choose_columns(&cfg, 5);
    assert_eq!(best.grid.n_columns, 2);
    assert_eq!(best.grid.n_rows, 3);
    assert_eq!(best.wasted, 286_720.0);
}

#[test]
fn optimal_for_all_small_counts() {
    let cfg = AtlasConfig::default();
    for n in 1..=250 {
        assert_optimal(&cfg, n);
    }
}

#[test]
fn optimal_for_random_configs() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..60 {
        let cfg = AtlasConfig::builder()
            .with_dimensions(rng.gen_range(64..=4096), rng.gen_range(64..=4096))
            .ratios(Ratios {
                flag_x: rng.gen_range(1..=24),
                flag_y: rng.gen_range(1..=24),
                padding_x: rng.gen_range(0..=5),
                padding_y: rng.gen_range(0..=5),
                border: 0,
            })
            .build();
        let n = rng.gen_range(1..=150);
        assert_optimal(&cfg, n);
    }
}

#[test]
fn evaluation_covers_every_candidate_in_order() {
    let cfg = AtlasConfig::default();
    let all = evaluate_columns(&cfg, 17);
    assert_eq!(all.len(), 17);
    for (i, est) in all.iter().enumerate() {
        assert_eq!(est.grid.n_columns as usize, i + 1);
        assert_eq!(est.grid.n_cells, 17);
    }
    let best = choose_columns(&cfg, 17);
    let min = all
        .iter()
        .map(|e| e.wasted)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.wasted, min);
}
