use crate::point::Point;
use serde::{Deserialize, Serialize};

/// Rows x columns partition of a `[start, end]` bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub map_start: Point,
    pub map_end: Point,
}

impl GridSpec {
    pub fn new(rows: usize, cols: usize, map_start: Point, map_end: Point) -> Self {
        Self { rows, cols, map_start, map_end }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Center point of the cell assigned to `worker_no` out of `total_workers`,
    /// following the original partition formula: columns cycle fastest, so
    /// `worker_no` wraps row-major across a `total_workers / rows`-wide band.
    pub fn worker_cell_center(&self, worker_no: usize, total_workers: usize) -> Point {
        let per_column = (total_workers / self.rows).max(1);
        let column = worker_no % per_column;
        let row = worker_no / per_column;

        let part_lat = (self.map_end.lat - self.map_start.lat) / self.rows as f64;
        let part_lon = (self.map_end.lon - self.map_start.lon) / self.cols as f64;

        let lat = self.map_start.lat + part_lat * row as f64 + part_lat / 2.0;
        let lon = self.map_start.lon + part_lon * column as f64 + part_lon / 2.0;
        Point::flat(lat, lon)
    }
}

/// Returns the cell-center point for every worker, in worker-index order.
pub fn partition(spec: &GridSpec, total_workers: usize) -> Vec<Point> {
    (0..total_workers)
        .map(|worker_no| spec.worker_cell_center(worker_no, total_workers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_partition_scenario_from_spec() {
        let spec = GridSpec::new(2, 2, Point::flat(0.0, 0.0), Point::flat(1.0, 1.0));
        let centers = partition(&spec, 4);
        assert_eq!(centers[0], Point::flat(0.25, 0.25));
        assert_eq!(centers[1], Point::flat(0.25, 0.75));
        assert_eq!(centers[2], Point::flat(0.75, 0.25));
        assert_eq!(centers[3], Point::flat(0.75, 0.75));
    }
}
