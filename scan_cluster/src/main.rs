// This file is an example of how to use the `scan_cluster` library.
// The main library entry point is `src/lib.rs`; `scan_tester` replays real recordings.

use scan_cluster::{ClusteringEngine, EngineConfig, Point};

fn main() {
    println!("Scan Cluster Engine - Example Runner");

    // Two people standing a few metres apart, plus a stray return.
    let points = vec![
        Point::new(0, 100.0, 200.0),
        Point::new(1, 104.0, 198.0),
        Point::new(2, 102.0, 205.0),
        Point::new(3, 300.0, 210.0),
        Point::new(4, 296.0, 214.0),
        Point::new(5, 600.0, 40.0),
    ];

    let mut engine = ClusteringEngine::with_seed(EngineConfig::default(), 7);
    match engine.run_default(&points) {
        Ok(clustering) => {
            println!(
                "{} clusters after {} passes (converged: {})",
                clustering.len(),
                clustering.iterations(),
                clustering.converged()
            );
            for (index, cluster) in clustering.clusters().iter().enumerate() {
                println!(
                    "  [{index}] {} at ({:.1}, {:.1}) with {} points",
                    cluster.handle,
                    cluster.centroid.x,
                    cluster.centroid.y,
                    cluster.member_count()
                );
            }
        }
        Err(err) => eprintln!("clustering failed: {err}"),
    }
}
