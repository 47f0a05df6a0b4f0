use flag_atlas_core::config::Ratios;
use flag_atlas_core::waste::{estimate_waste, wasted_space};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn full_rows_have_no_empty_area() {
    let r = Ratios::default();
    // 2 columns x 3 rows of 6 cells: 30x32 units, height binds at 32 px/unit
    let est = estimate_waste(&r, 2, 6, 1024, 1024);
    assert_eq!(est.grid.n_rows, 3);
    assert_eq!(est.unit_size, 32.0);
    assert_eq!(est.empty_area, 0.0);
    assert_eq!(est.grid_area, 30.0 * 32.0 * 32.0 * 32.0);
    assert_eq!(est.wasted, 1024.0 * 1024.0 - 983_040.0);
}

#[test]
fn partial_last_row_subtracts_exactly_one_footprint() {
    let r = Ratios::default();
    // 5 cells in 3 columns: 2 rows, last row has 2 filled + 1 empty
    let five = estimate_waste(&r, 3, 5, 1024, 1024);
    assert_eq!(five.grid.n_rows, 2);
    assert_eq!(five.grid.last_row_len(), 2);
    assert_eq!(five.grid.empty_slots(), 1);

    let unit = 1024.0 / 48.0;
    let footprint = (12.0 + 6.0) * (8.0 + 4.0) * unit * unit;
    assert!(close(five.empty_area, footprint));

    // same grid with the row completed differs by exactly that footprint
    let six = estimate_waste(&r, 3, 6, 1024, 1024);
    assert_eq!(six.grid.width_units, five.grid.width_units);
    assert_eq!(six.grid.height_units, five.grid.height_units);
    assert!(close(five.wasted - six.wasted, footprint));
}

#[test]
fn exact_values_for_five_cells() {
    let r = Ratios::default();
    assert_eq!(wasted_space(&r, 2, 5, 1024, 1024), 286_720.0);
    let w3 = wasted_space(&r, 3, 5, 1024, 1024);
    assert!(close(w3, 1_048_576.0 - 436_906.666_666_666_7 + 98_304.0));
}

#[test]
fn wasted_space_is_never_negative() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..300 {
        let r = Ratios {
            flag_x: rng.gen_range(1..=32),
            flag_y: rng.gen_range(1..=32),
            padding_x: rng.gen_range(0..=6),
            padding_y: rng.gen_range(0..=6),
            border: 0,
        };
        let w = rng.gen_range(1..=4096);
        let h = rng.gen_range(1..=4096);
        let n = rng.gen_range(1..=120usize);
        for c in 1..=n as u32 {
            let est = estimate_waste(&r, c, n, w, h);
            assert!(
                est.wasted >= 0.0,
                "negative waste {} for {:?} c={c} n={n} atlas={w}x{h}",
                est.wasted,
                r
            );
            assert!(est.grid_area <= w as f64 * h as f64);
        }
    }
}

#[test]
fn default_atlas_never_negative() {
    let r = Ratios::default();
    for n in 1..=400usize {
        for c in 1..=n as u32 {
            assert!(wasted_space(&r, c, n, 1024, 1024) >= 0.0, "c={c} n={n}");
        }
    }
}
