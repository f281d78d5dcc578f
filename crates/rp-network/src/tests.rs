//! Unit tests for rp-network.
//!
//! All tests use hand-crafted links in planar metres.

#[cfg(test)]
mod helpers {
    use rp_core::{CoordinateSystem, LinkId, NodeId, PlanarPoint};

    use crate::LinkRecord;

    pub const CRS: CoordinateSystem = CoordinateSystem::KOREA_2000_UNIFIED;

    pub fn record(
        id:     i64,
        oneway: bool,
        nodes:  (i64, i64),
        points: &[(f64, f64)],
    ) -> LinkRecord {
        LinkRecord::from_points(
            LinkId(id),
            oneway,
            CRS,
            points.iter().map(|&(x, y)| PlanarPoint::new(x, y)).collect(),
            NodeId(nodes.0),
            NodeId(nodes.1),
        )
        .unwrap()
    }

    /// Three two-way links meeting at node 2:
    ///
    /// ```text
    ///   n1 ──1──► n2 ──2──► n3
    ///             ▲
    ///             3
    ///             │
    ///             n4
    /// ```
    pub fn junction() -> Vec<LinkRecord> {
        vec![
            record(1, false, (1, 2), &[(0.0, 0.0), (100.0, 0.0)]),
            record(2, false, (2, 3), &[(100.0, 0.0), (200.0, 0.0)]),
            record(3, false, (4, 2), &[(100.0, -100.0), (100.0, 0.0)]),
        ]
    }
}

// ── Connectivity ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod connectivity {
    use rp_core::{DirectionalLinkId as D, LinkId};

    use super::helpers::{junction, record};
    use crate::RoadNetwork;

    #[test]
    fn junction_sets_are_sorted_and_complete() {
        let net = RoadNetwork::build(junction()).unwrap();

        // Arriving at n2 on link 1: continue onto 2 forwards or 3 backwards.
        assert_eq!(net.link(LinkId(1)).unwrap().end_connected(), &[D(-3), D(2)]);
        // Arriving at n2 backwards on link 2: 1 backwards or 3 backwards.
        assert_eq!(net.link(LinkId(2)).unwrap().start_connected(), &[D(-3), D(-1)]);
        // Arriving at n2 on link 3: 1 backwards or 2 forwards.
        assert_eq!(net.link(LinkId(3)).unwrap().end_connected(), &[D(-1), D(2)]);
    }

    #[test]
    fn two_way_links_are_symmetric() {
        let net = RoadNetwork::build(junction()).unwrap();
        for link in net.links() {
            for &next in link.end_connected() {
                // If +A may continue onto X, then -X may continue onto -A.
                let back = net.neighbors(next.reversed()).unwrap();
                assert!(
                    back.contains(&D::backward(link.id())),
                    "{next} → {} missing",
                    D::backward(link.id())
                );
            }
        }
    }

    #[test]
    fn dead_ends_get_a_u_turn() {
        let net = RoadNetwork::build(junction()).unwrap();
        // n1 is only touched by link 1.
        assert_eq!(net.link(LinkId(1)).unwrap().start_connected(), &[D(1)]);
        // n3 is only touched by link 2.
        assert_eq!(net.link(LinkId(2)).unwrap().end_connected(), &[D(-2)]);
        assert_eq!(net.connectivity_stats().dead_ends_repaired, 3);
    }

    #[test]
    fn oneway_links_are_never_entered_backwards() {
        let net = RoadNetwork::build([
            record(1, false, (1, 2), &[(0.0, 0.0), (100.0, 0.0)]),
            record(2, true, (3, 2), &[(100.0, 100.0), (100.0, 0.0)]),
            record(3, true, (2, 4), &[(100.0, 0.0), (200.0, 0.0)]),
        ])
        .unwrap();

        for link in net.links() {
            for set in [link.start_connected(), link.end_connected()] {
                for &d in set {
                    let target = net.link(d.link()).unwrap();
                    assert!(target.allows(d), "{d} enters a oneway link backwards");
                }
            }
        }
        // Link 1 arriving at n2: only link 3 forwards (link 2 ends there).
        assert_eq!(net.link(LinkId(1)).unwrap().end_connected(), &[D(3)]);
    }

    #[test]
    fn oneway_dead_end_stays_dead() {
        let net = RoadNetwork::build([record(7, true, (1, 2), &[(0.0, 0.0), (50.0, 0.0)])]).unwrap();
        let link = net.link(LinkId(7)).unwrap();
        assert!(link.end_connected().is_empty());
        assert!(link.start_connected().is_empty());
        assert_eq!(net.connectivity_stats().dead_ends_repaired, 0);
    }

    #[test]
    fn neighbors_follow_the_sign() {
        let net = RoadNetwork::build(junction()).unwrap();
        let link = net.link(LinkId(1)).unwrap();
        assert_eq!(net.neighbors(D(1)).unwrap(), link.end_connected());
        assert_eq!(net.neighbors(D(-1)).unwrap(), link.start_connected());
    }

    #[test]
    fn neighbors_of_unknown_link() {
        let net = RoadNetwork::build(junction()).unwrap();
        assert!(matches!(
            net.neighbors(D(-99)),
            Err(crate::NetworkError::DirectionalLinkNotFound(D(-99)))
        ));
    }
}

// ── Build validation ──────────────────────────────────────────────────────────

#[cfg(test)]
mod build {
    use rp_core::{CoordinateSystem, LinkId, NodeId, PlanarPoint};

    use super::helpers::{junction, record};
    use crate::{LinkRecord, NetworkError, RoadNetwork};

    #[test]
    fn info_reflects_input() {
        let net = RoadNetwork::build_with("junction", junction(), Default::default()).unwrap();
        assert_eq!(net.info().name, "junction");
        assert_eq!(net.info().link_count, 3);
        assert_eq!(net.crs(), super::helpers::CRS);
        assert_eq!(net.len(), 3);
        assert!(net.contains(LinkId(2)));
        assert!(!net.contains(LinkId(4)));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(RoadNetwork::build(Vec::new()), Err(NetworkError::Empty)));
    }

    #[test]
    fn duplicate_id() {
        let mut links = junction();
        links.push(record(2, false, (5, 6), &[(0.0, 0.0), (1.0, 1.0)]));
        assert!(matches!(
            RoadNetwork::build(links),
            Err(NetworkError::DuplicateLinkId(LinkId(2)))
        ));
    }

    #[test]
    fn non_positive_id() {
        let links = vec![record(0, false, (1, 2), &[(0.0, 0.0), (1.0, 0.0)])];
        assert!(matches!(
            RoadNetwork::build(links),
            Err(NetworkError::InvalidLinkId(LinkId(0)))
        ));
    }

    #[test]
    fn mixed_coordinate_systems() {
        let mut links = junction();
        links.push(
            LinkRecord::from_points(
                LinkId(9),
                false,
                CoordinateSystem::WEB_MERCATOR,
                vec![PlanarPoint::new(0.0, 0.0), PlanarPoint::new(1.0, 0.0)],
                NodeId(8),
                NodeId(9),
            )
            .unwrap(),
        );
        match RoadNetwork::build(links) {
            Err(NetworkError::MixedCoordinateSystems { expected, found }) => {
                assert_eq!(expected, super::helpers::CRS);
                assert_eq!(found, CoordinateSystem::WEB_MERCATOR);
            }
            other => panic!("expected MixedCoordinateSystems, got {other:?}"),
        }
    }

    #[test]
    fn bad_geometry_surfaces_as_network_error() {
        let err = LinkRecord::from_points(
            LinkId(1),
            false,
            super::helpers::CRS,
            vec![PlanarPoint::new(0.0, 0.0)],
            NodeId(1),
            NodeId(2),
        )
        .unwrap_err();
        assert!(matches!(err, NetworkError::Geometry(_)));
    }

    #[test]
    fn network_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RoadNetwork>();
    }
}

// ── Spatial index ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod index {
    use std::sync::Arc;
    use std::time::Duration;

    use rp_core::{LinkId, PlanarPoint};
    use rp_sync::{CancelToken, MutexSet, WaitConfig};

    use super::helpers::{junction, record};
    use crate::index::{finalize_tiles, link_tiles, stage_tiles};
    use crate::link::RoadLink;
    use crate::{BuildReport, IndexConfig, IndexState, NetworkError, RoadNetwork, SpatialIndex, TileKey};

    fn long_link() -> RoadNetwork {
        RoadNetwork::build([record(1, false, (1, 2), &[(0.0, 0.0), (500.0, 0.0)])]).unwrap()
    }

    #[test]
    fn tile_key_floors_negative_coordinates() {
        assert_eq!(TileKey::of(PlanarPoint::new(-0.5, 199.9), 100.0), TileKey { ix: -1, iy: 1 });
        assert_eq!(TileKey::of(PlanarPoint::new(100.0, 0.0), 100.0), TileKey { ix: 1, iy: 0 });
    }

    #[test]
    fn queries_need_a_ready_index() {
        let net = long_link();
        assert_eq!(net.index_state(), IndexState::NotBuilt);
        assert!(matches!(
            net.nearest_links(PlanarPoint::new(0.0, 0.0), 10.0),
            Err(NetworkError::IndexNotReady)
        ));
    }

    #[test]
    fn init_then_already_done() {
        let net = long_link();
        let report = net.init(false, 4);
        assert!(matches!(report, BuildReport::Built { links: 1, .. }), "{report}");
        assert_eq!(net.index_state(), IndexState::Ready);
        assert!(net.is_ready());
        assert_eq!(net.init(false, 4), BuildReport::AlreadyDone);
        // A refresh rebuilds.
        assert!(matches!(net.init(true, 1), BuildReport::Built { .. }));
    }

    #[test]
    fn long_link_found_from_any_tile() {
        let net = long_link();
        net.init(false, 2);
        for ix in 0..=5 {
            assert_eq!(net.links_in_tile(TileKey { ix, iy: 0 }), vec![LinkId(1)], "tile {ix},0");
        }
        assert!(net.links_in_tile(TileKey { ix: 2, iy: 3 }).is_empty());
        let near = net.nearest_links(PlanarPoint::new(250.0, 1.0), 1.0).unwrap();
        assert_eq!(near, vec![(1.0, vec![LinkId(1)])]);
    }

    #[test]
    fn points_around_the_link_find_it_across_tile_borders() {
        let net = long_link();
        net.init(false, 2);
        // Midpoint, a tile corner on the link, and both ends.
        for (cx, cy) in [(250.0, 0.0), (300.0, 0.0), (0.0, 0.0), (500.0, 0.0)] {
            for step in 0..16 {
                let angle = step as f64 * std::f64::consts::TAU / 16.0;
                let p = PlanarPoint::new(cx + 0.999 * angle.cos(), cy + 0.999 * angle.sin());
                let near = net.nearest_links(p, 1.0).unwrap();
                assert_eq!(near.len(), 1, "nothing found from {p}");
                assert_eq!(near[0].1, vec![LinkId(1)], "from {p}");
                assert!(near[0].0 <= 1.0);
            }
        }
    }

    #[test]
    fn ties_share_a_group_sorted_by_id() {
        let net = RoadNetwork::build([
            record(5, false, (1, 2), &[(0.0, 5.0), (100.0, 5.0)]),
            record(2, false, (3, 4), &[(0.0, -5.0), (100.0, -5.0)]),
            record(9, false, (5, 6), &[(0.0, 8.0), (100.0, 8.0)]),
        ])
        .unwrap();
        net.init(false, 2);

        let near = net.nearest_links(PlanarPoint::new(50.0, 0.0), 10.0).unwrap();
        assert_eq!(near, vec![(5.0, vec![LinkId(2), LinkId(5)]), (8.0, vec![LinkId(9)])]);
    }

    #[test]
    fn distance_filter_is_exact() {
        let net = RoadNetwork::build(junction()).unwrap();
        net.init(false, 2);
        // (150, 30) is 30 m from link 2 and about 58 m from the others.
        let near = net.nearest_links(PlanarPoint::new(150.0, 30.0), 40.0).unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].1, vec![LinkId(2)]);
        assert!(net.nearest_links(PlanarPoint::new(150.0, 30.0), 29.0).unwrap().is_empty());
    }

    #[test]
    fn large_radius_returns_everything() {
        let net = RoadNetwork::build(junction()).unwrap();
        net.init(false, 2);
        let near = net.nearest_links(PlanarPoint::new(0.0, 0.0), 1.0e12).unwrap();
        let count: usize = near.iter().map(|(_, ids)| ids.len()).sum();
        assert_eq!(count, 3);
    }

    #[test]
    fn invalid_query_arguments() {
        let net = long_link();
        net.init(false, 1);
        assert!(matches!(
            net.nearest_links(PlanarPoint::new(0.0, 0.0), -1.0),
            Err(NetworkError::InvalidDistance(_))
        ));
        assert!(matches!(
            net.nearest_links(PlanarPoint::new(f64::NAN, 0.0), 1.0),
            Err(NetworkError::InvalidPoint { .. })
        ));
    }

    #[test]
    fn snap_picks_the_closest_link() {
        let net = RoadNetwork::build(junction()).unwrap();
        net.init(false, 2);
        assert_eq!(net.snap(PlanarPoint::new(102.0, -60.0), 10.0).unwrap(), Some(LinkId(3)));
        assert_eq!(net.snap(PlanarPoint::new(1_000.0, 1_000.0), 10.0).unwrap(), None);
    }

    #[test]
    fn diagonal_link_covers_every_crossed_tile() {
        let link = RoadLink::from_record(record(1, false, (1, 2), &[(10.0, 10.0), (290.0, 190.0)]));
        let tiles = link_tiles(&link, 100.0);
        // The segment crosses these tiles; extras are allowed, gaps are not.
        for (ix, iy) in [(0, 0), (1, 0), (1, 1), (2, 1)] {
            assert!(tiles.contains(&TileKey { ix, iy }), "missing tile {ix},{iy}");
        }
        let mut sorted = tiles.clone();
        sorted.dedup();
        assert_eq!(sorted, tiles);
    }

    #[test]
    fn staging_is_independent_of_worker_count() {
        let links: Vec<RoadLink> = junction().into_iter().map(RoadLink::from_record).collect();
        let mut one: Vec<_> = stage_tiles(&links, 50.0, 1).into_iter().collect();
        let mut many: Vec<_> = stage_tiles(&links, 50.0, 8).into_iter().collect();
        for (_, ids) in one.iter_mut().chain(many.iter_mut()) {
            ids.sort_unstable();
        }
        one.sort();
        many.sort();
        assert_eq!(one, many);
    }

    #[test]
    fn duplicate_tile_keys_are_conflicts() {
        let key = TileKey { ix: 3, iy: -2 };
        let (grid, conflicts) = finalize_tiles(vec![(key, vec![0, 1]), (key, vec![1])]);
        assert_eq!(conflicts, 1);
        assert!(grid.get(&key).is_some());

        let (_, conflicts) = finalize_tiles(vec![(key, vec![2, 0, 2])]);
        assert_eq!(conflicts, 0);
    }

    #[test]
    fn failed_refresh_keeps_serving_the_previous_grid() {
        let index = SpatialIndex::new(IndexConfig::default());
        let links: Vec<RoadLink> = junction().into_iter().map(RoadLink::from_record).collect();
        assert!(index.init(&links, false, 2, None).is_success());
        let tiles = index.tile_count();
        let center = PlanarPoint::new(150.0, 30.0);
        let before = index.search_within_distance(&links, center, 40.0).unwrap();
        assert_eq!(before, vec![(30.0, vec![LinkId(2)])]);

        let key = TileKey { ix: 0, iy: 0 };
        let report = index.build_with(&links, true, None, || vec![(key, vec![0]), (key, vec![1])]);
        assert_eq!(report, BuildReport::Failed { conflicts: 1 });
        assert!(!report.is_success());
        assert_eq!(index.state(), IndexState::Ready);
        assert!(index.is_ready());
        assert!(!index.is_building());
        assert_eq!(index.tile_count(), tiles);
        assert_eq!(index.search_within_distance(&links, center, 40.0).unwrap(), before);
    }

    #[test]
    fn failed_first_build_leaves_the_index_unusable() {
        let index = SpatialIndex::new(IndexConfig::default());
        let links: Vec<RoadLink> = junction().into_iter().map(RoadLink::from_record).collect();

        let key = TileKey { ix: 1, iy: 0 };
        let report = index.build_with(&links, false, None, || vec![(key, vec![0, 1]), (key, vec![2])]);
        assert_eq!(report, BuildReport::Failed { conflicts: 1 });
        assert_eq!(index.state(), IndexState::Failed);
        assert!(!index.is_ready());
        assert_eq!(index.tile_count(), 0);
        assert!(matches!(
            index.search_within_distance(&links, PlanarPoint::new(0.0, 0.0), 10.0),
            Err(NetworkError::IndexNotReady)
        ));
        assert!(index.links_in_tile(key, &links).is_empty());

        // A failed index is rebuilt without asking for a refresh.
        assert!(matches!(index.init(&links, false, 2, None), BuildReport::Built { links: 3, .. }));
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[test]
    fn held_build_lock_reports_in_progress() {
        let locks = Arc::new(MutexSet::new());
        let config = IndexConfig {
            build_wait: WaitConfig::new(Duration::from_millis(1), Duration::from_millis(20)),
            ..IndexConfig::default()
        };
        let index = SpatialIndex::with_build_locks(config, Arc::clone(&locks));
        let links: Vec<RoadLink> = junction().into_iter().map(RoadLink::from_record).collect();

        let guard = locks.try_lock(index.key()).unwrap();
        assert!(index.is_building());
        assert_eq!(
            index.init(&links, false, 2, None),
            BuildReport::AlreadyInProgress { timed_out: true }
        );

        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            index.init(&links, false, 2, Some(&cancel)),
            BuildReport::AlreadyInProgress { timed_out: false }
        );
        assert_eq!(index.state(), IndexState::NotBuilt);

        drop(guard);
        assert!(index.init(&links, false, 2, None).is_success());
        assert!(!index.is_building());
    }

    #[test]
    fn report_into_result() {
        assert!(matches!(
            BuildReport::AlreadyInProgress { timed_out: true }.into_result(),
            Err(NetworkError::BuildTimeout)
        ));
        assert!(matches!(
            BuildReport::AlreadyInProgress { timed_out: false }.into_result(),
            Err(NetworkError::BuildCancelled)
        ));
        assert!(matches!(
            BuildReport::Failed { conflicts: 2 }.into_result(),
            Err(NetworkError::BuildConflict { conflicts: 2 })
        ));
        assert_eq!(BuildReport::AlreadyDone.into_result().unwrap(), BuildReport::AlreadyDone);
    }
}
