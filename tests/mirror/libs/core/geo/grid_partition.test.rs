use geoscan_core_geo::{partition, GridSpec, Point};

#[test]
fn four_by_four_grid_has_sixteen_distinct_centers() {
    let spec = GridSpec::new(4, 4, Point::flat(-1.0, -1.0), Point::flat(1.0, 1.0));
    let centers = partition(&spec, 16);
    assert_eq!(centers.len(), 16);

    let mut seen = std::collections::HashSet::new();
    for c in &centers {
        assert!(c.lat > -1.0 && c.lat < 1.0);
        assert!(c.lon > -1.0 && c.lon < 1.0);
        seen.insert(c.rounded_key());
    }
    assert_eq!(seen.len(), 16, "every worker should get a distinct cell center");
}

#[test]
fn bootstrap_stage_one_dispatches_exactly_grid_cell_count_visits() {
    let spec = GridSpec::new(3, 5, Point::flat(0.0, 0.0), Point::flat(3.0, 5.0));
    let centers = partition(&spec, spec.cell_count());
    assert_eq!(centers.len(), spec.rows * spec.cols);
}
