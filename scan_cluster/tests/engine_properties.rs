use approx::assert_abs_diff_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scan_cluster::{Clustering, ClusterError, ClusteringEngine, EngineConfig, Point, PointId, Vec2};
use std::collections::{BTreeSet, HashSet};

fn engine(max_clusters: usize, max_iterations: usize, seed: u64) -> ClusteringEngine {
    let config = EngineConfig {
        max_clusters,
        max_iterations,
        ..EngineConfig::default()
    };
    ClusteringEngine::with_seed(config, seed)
}

fn points(coords: &[(f64, f64)]) -> Vec<Point> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Point::new(i as u32, x, y))
        .collect()
}

/// A few blobs of points scattered over a 1000x1000 scene, plus loose noise.
fn random_scene(rng: &mut ChaCha8Rng) -> Vec<Point> {
    let mut out = Vec::new();
    let blobs = rng.gen_range(1..6);
    for _ in 0..blobs {
        let cx = rng.gen_range(0.0..1000.0);
        let cy = rng.gen_range(0.0..1000.0);
        for _ in 0..rng.gen_range(1..20) {
            let x = cx + rng.gen_range(-15.0..15.0);
            let y = cy + rng.gen_range(-15.0..15.0);
            out.push(Point::new(out.len() as u32, x, y));
        }
    }
    for _ in 0..rng.gen_range(0..10) {
        let x = rng.gen_range(0.0..1000.0);
        let y = rng.gen_range(0.0..1000.0);
        out.push(Point::new(out.len() as u32, x, y));
    }
    out
}

fn member_ids(cluster: &scan_cluster::Cluster) -> BTreeSet<u32> {
    cluster.members.iter().map(|id| id.0).collect()
}

fn check_invariants(result: &Clustering, max_clusters: usize) {
    // Every returned cluster is non-empty.
    assert!(result.clusters().iter().all(|c| c.member_count() > 0));

    // The cap holds, with the forced seed cluster as the only exception.
    assert!(result.len() <= max_clusters.max(1));

    // No point sits in two clusters.
    let mut seen = HashSet::new();
    for cluster in result.clusters() {
        for id in &cluster.members {
            assert!(seen.insert(*id), "{id} appears in two clusters");
        }
    }

    // Membership and assignments describe the same relation.
    let assigned: HashSet<PointId> = result.points().iter().filter(|p| p.is_assigned()).map(|p| p.id).collect();
    assert_eq!(seen, assigned);
    for point in result.points() {
        if let Some(handle) = point.assignment {
            let cluster = result.clusters().iter().find(|c| c.handle == handle).unwrap();
            assert!(cluster.contains(point.id));
        }
    }

    // Every centroid is the mean of its members.
    for cluster in result.clusters() {
        let n = cluster.member_count() as f64;
        let (sx, sy) = cluster
            .members
            .iter()
            .map(|id| result.points().iter().find(|p| p.id == *id).unwrap().position)
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        assert_abs_diff_eq!(cluster.centroid.x, sx / n, epsilon = 1e-9);
        assert_abs_diff_eq!(cluster.centroid.y, sy / n, epsilon = 1e-9);
        assert!(!cluster.dirty);
    }
}

#[test]
fn invariants_hold_on_random_scenes() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for round in 0..200 {
        let scene = random_scene(&mut rng);
        let max_clusters = rng.gen_range(0..8);
        let max_iterations = rng.gen_range(0..8);
        let threshold = rng.gen_range(5.0..80.0);

        let result = engine(max_clusters, max_iterations, round)
            .run(&scene, threshold)
            .unwrap();
        assert_eq!(result.points().len(), scene.len());
        check_invariants(&result, max_clusters);
        assert!(result.iterations() <= max_iterations);
    }
}

#[test]
fn refining_converged_results_changes_nothing() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut checked = 0;
    for round in 0..100 {
        let scene = random_scene(&mut rng);
        let mut engine = engine(8, 20, round);
        let first = engine.run(&scene, 30.0).unwrap();
        if !first.converged() {
            continue;
        }
        checked += 1;

        let second = engine.refine(first.clone(), 30.0).unwrap();
        assert_eq!(second.iterations(), 1);
        assert!(second.converged());
        assert_eq!(second.clusters(), first.clusters());
        assert_eq!(second.points(), first.points());
    }
    assert!(checked > 0);
}

#[test]
fn separated_pairs() {
    let pts = points(&[(0.0, 0.0), (0.1, 0.1), (50.0, 50.0), (50.1, 50.1)]);
    let result = engine(4, 6, 12345).run(&pts, 5.0).unwrap();

    assert_eq!(result.len(), 2);
    let near = result.cluster_of(PointId(1)).unwrap();
    let far = result.cluster_of(PointId(3)).unwrap();
    assert_eq!(member_ids(near), BTreeSet::from([0, 1]));
    assert_eq!(member_ids(far), BTreeSet::from([2, 3]));
    assert_abs_diff_eq!(near.centroid.x, 0.05, epsilon = 1e-9);
    assert_abs_diff_eq!(far.centroid.y, 50.05, epsilon = 1e-9);
}

#[test]
fn single_cluster_cap_takes_the_mean_of_everything() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for round in 0..20 {
        let scene = random_scene(&mut rng);
        let result = engine(1, 6, round).run(&scene, 10.0).unwrap();
        assert_eq!(result.len(), 1);

        let cluster = &result.clusters()[0];
        assert_eq!(cluster.member_count(), scene.len());
        let n = scene.len() as f64;
        let mean_x = scene.iter().map(|p| p.position.x).sum::<f64>() / n;
        let mean_y = scene.iter().map(|p| p.position.y).sum::<f64>() / n;
        assert_abs_diff_eq!(cluster.centroid.x, mean_x, epsilon = 1e-9);
        assert_abs_diff_eq!(cluster.centroid.y, mean_y, epsilon = 1e-9);
    }
}

#[test]
fn empty_input_fails_before_seeding() {
    let result = engine(4, 6, 0).run(&[], 30.0);
    assert_eq!(result, Err(ClusterError::EmptyInput));
}

#[test]
fn zero_cap_keeps_only_the_seed() {
    let pts = points(&[(0.0, 0.0), (200.0, 0.0), (400.0, 0.0), (600.0, 0.0), (800.0, 0.0)]);
    for seed in 0..5 {
        let result = engine(0, 6, seed).run(&pts, 30.0).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.clusters()[0].member_count(), 1);
        assert_eq!(result.unassigned().count(), 4);
    }
}

#[test]
fn failed_runs_do_not_affect_the_next_call() {
    let mut engine = engine(4, 6, 3);
    assert!(engine.run(&[], 30.0).is_err());
    let dup = vec![Point::new(1, 0.0, 0.0), Point::new(1, 1.0, 1.0)];
    assert_eq!(engine.run(&dup, 30.0), Err(ClusterError::DuplicatePointId(PointId(1))));

    let result = engine.run(&points(&[(5.0, 5.0), (6.0, 5.0)]), 30.0).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.clusters()[0].centroid, Vec2::new(5.5, 5.0));
}
