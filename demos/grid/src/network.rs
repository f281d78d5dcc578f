//! Synthetic lattice road network.
//!
//! `size × size` intersections `spacing` metres apart, joined by straight
//! links.  Horizontal links come first, row by row, then vertical links
//! column-major within each row gap.  With `oneway_rows`, odd rows only
//! allow eastbound travel, like a downtown one-way grid.

use rp_core::{CoordinateSystem, LinkId, NodeId, PlanarPoint};
use rp_network::{IndexConfig, LinkRecord, NetworkResult, RoadNetwork};

/// Build the lattice.
pub fn build_grid(
    size:        i64,
    spacing:     f64,
    oneway_rows: bool,
    config:      IndexConfig,
) -> NetworkResult<RoadNetwork> {
    let crs = CoordinateSystem::KOREA_2000_UNIFIED;
    let node = |i: i64, j: i64| NodeId(j * size + i + 1);
    let at = |i: i64, j: i64| PlanarPoint::new(i as f64 * spacing, j as f64 * spacing);

    let mut records = Vec::with_capacity((2 * size * (size - 1)).max(0) as usize);
    let mut next_id = 1;

    for j in 0..size {
        let oneway = oneway_rows && j % 2 == 1;
        for i in 0..size - 1 {
            records.push(LinkRecord::from_points(
                LinkId(next_id),
                oneway,
                crs,
                vec![at(i, j), at(i + 1, j)],
                node(i, j),
                node(i + 1, j),
            )?);
            next_id += 1;
        }
    }
    for j in 0..size - 1 {
        for i in 0..size {
            records.push(LinkRecord::from_points(
                LinkId(next_id),
                false,
                crs,
                vec![at(i, j), at(i, j + 1)],
                node(i, j),
                node(i, j + 1),
            )?);
            next_id += 1;
        }
    }

    RoadNetwork::build_with(format!("grid {size}x{size}"), records, config)
}
