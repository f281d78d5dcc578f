//! grid — end-to-end walkthrough of the roadpath crates.
//!
//! Builds a synthetic lattice network, indexes it on a worker pool, snaps a
//! coordinate to its nearest link and finds shortest paths, including a
//! batch of concurrent queries over one shared network.
//!
//! ```text
//! RUST_LOG=debug cargo run -p grid -- --size 40 --workers 8 --oneway-rows
//! ```

mod network;

use std::thread;
use std::time::Instant;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use log::info;

use rp_core::{LinkId, PlanarPoint};
use rp_network::IndexConfig;
use rp_search::{AStar, FindPath, PathFinder};

use network::build_grid;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Shortest paths on a synthetic lattice road network")]
struct Args {
    /// Intersections per side.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(2..=2_000))]
    size: i64,

    /// Distance between neighbouring intersections, in metres.
    #[arg(long, default_value_t = 120.0)]
    spacing: f64,

    /// Spatial index tile side, in metres.
    #[arg(long, default_value_t = IndexConfig::DEFAULT_TILE_SIDE)]
    tile_side: f64,

    /// Worker threads for the index build.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Make every odd row eastbound-only.
    #[arg(long)]
    oneway_rows: bool,

    /// Origin link id.
    #[arg(long, default_value_t = 1)]
    from: i64,

    /// Destination link id; defaults to the last horizontal link.
    #[arg(long)]
    to: Option<i64>,

    /// Snap radius for the proximity query, in metres.
    #[arg(long, default_value_t = 50.0)]
    radius: f64,

    /// Concurrent queries to run against the shared network.
    #[arg(long, default_value_t = 8)]
    parallel: usize,
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // 1. Build the network.
    let config = IndexConfig { tile_side: args.tile_side, ..IndexConfig::default() };
    let t0 = Instant::now();
    let network = build_grid(args.size, args.spacing, args.oneway_rows, config)?;
    let stats = network.connectivity_stats();
    info!(
        "{}: {} links, {} connections, {} dead ends repaired ({:?})",
        network.info().name,
        network.len(),
        stats.connections,
        stats.dead_ends_repaired,
        t0.elapsed()
    );

    // 2. Index it.
    let report = network.init(false, args.workers).into_result()?;
    info!("{report}");

    // 3. Snap the middle of the map to a link.
    let extent = (args.size - 1) as f64 * args.spacing;
    let probe = PlanarPoint::new(extent * 0.5 + args.spacing * 0.3, extent * 0.5 + args.spacing * 0.1);
    let nearest = network.nearest_links(probe, args.radius)?;
    for (distance, ids) in nearest.iter().take(3) {
        info!("  {distance:>8.2} m  {ids:?}");
    }
    match network.snap(probe, args.radius)? {
        Some(id) => info!("({:.1}, {:.1}) snaps to {id}", probe.x, probe.y),
        None => info!("nothing within {} m of ({:.1}, {:.1})", args.radius, probe.x, probe.y),
    }

    // 4. One path.
    let from = LinkId(args.from);
    let to = LinkId(args.to.unwrap_or(args.size * (args.size - 1)));
    if !network.contains(from) || !network.contains(to) {
        bail!("link ids must be between 1 and {}", network.len());
    }
    let t0 = Instant::now();
    let path = network.find_path(from, to)?;
    info!(
        "{from} → {to}: {} links, {:.1} m, {} expanded ({:?})",
        path.len(),
        path.total_length,
        path.stats.expanded,
        t0.elapsed()
    );

    // 5. The same query from many threads at once.
    let finder: &dyn PathFinder = &AStar;
    let shared = &network;
    let t0 = Instant::now();
    let lengths = thread::scope(|s| -> Result<Vec<f64>> {
        let handles: Vec<_> = (0..args.parallel.max(1))
            .map(|_| s.spawn(move || finder.find_path(shared, from, to)))
            .collect();
        let mut lengths = Vec::with_capacity(handles.len());
        for h in handles {
            let found = h.join().map_err(|_| anyhow!("query thread panicked"))??;
            lengths.push(found.total_length);
        }
        Ok(lengths)
    })?;
    if lengths.iter().any(|&l| l != path.total_length) {
        bail!("concurrent queries disagree: {lengths:?}");
    }
    info!("{} concurrent queries agree ({:?})", lengths.len(), t0.elapsed());

    Ok(())
}
