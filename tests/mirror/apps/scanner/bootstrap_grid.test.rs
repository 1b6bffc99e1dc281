use geoscan_core_geo::{partition, GridSpec, Point};
use geoscan_scanner::bootstrap::interior_grid;

#[test]
fn interior_grid_scales_both_axes_by_the_density_multiplier() {
    let grid = GridSpec::new(2, 3, Point::flat(0.0, 0.0), Point::flat(1.0, 1.0));
    let interior = interior_grid(grid, 2);
    assert_eq!(interior.rows, 4);
    assert_eq!(interior.cols, 6);
    assert_eq!(interior.cell_count(), 24);
}

#[test]
fn a_density_multiplier_of_zero_is_floored_to_one() {
    let grid = GridSpec::new(2, 2, Point::flat(0.0, 0.0), Point::flat(1.0, 1.0));
    let interior = interior_grid(grid, 0);
    assert_eq!(interior.cell_count(), grid.cell_count());
}

#[test]
fn interior_grid_bounds_match_the_original_map_extent() {
    let grid = GridSpec::new(2, 2, Point::flat(10.0, 20.0), Point::flat(11.0, 21.0));
    let interior = interior_grid(grid, 3);
    assert_eq!(interior.map_start, grid.map_start);
    assert_eq!(interior.map_end, grid.map_end);
}

#[test]
fn partitioning_the_interior_grid_yields_one_point_per_cell() {
    let grid = GridSpec::new(2, 2, Point::flat(0.0, 0.0), Point::flat(1.0, 1.0));
    let interior = interior_grid(grid, 2);
    let points = partition(&interior, interior.cell_count());
    assert_eq!(points.len(), interior.cell_count());
}
