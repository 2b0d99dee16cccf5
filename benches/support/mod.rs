//! Synthetic point sets for benchmarks.

use phtree_rs::PhPoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Points per cluster for [`TestGenerator::Cluster`].
const CLUSTER_SIZE: usize = 100;
/// Edge length of a cluster relative to the world edge.
const CLUSTER_EXTENT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestGenerator {
    /// Uniformly distributed over the whole world cube.
    Cube,
    /// Dense clusters with uniformly distributed centers.
    Cluster,
}

impl TestGenerator {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cube => "CU",
            Self::Cluster => "CL",
        }
    }
}

/// Generates `n` points in `[min, max]` on every axis. Deterministic for a seed.
pub fn create_point_data<const D: usize>(
    generator: TestGenerator,
    n: usize,
    seed: u64,
    min: i64,
    max: i64,
) -> Vec<PhPoint<D>> {
    let mut rng = StdRng::seed_from_u64(seed);
    match generator {
        TestGenerator::Cube => (0..n)
            .map(|_| PhPoint::new(std::array::from_fn(|_| rng.gen_range(min..=max))))
            .collect(),
        TestGenerator::Cluster => {
            let half = ((max - min) as f64 * CLUSTER_EXTENT / 2.0).max(1.0) as i64;
            let mut points = Vec::with_capacity(n);
            while points.len() < n {
                let center: [i64; D] = std::array::from_fn(|_| rng.gen_range(min..=max));
                for _ in 0..CLUSTER_SIZE.min(n - points.len()) {
                    let p = std::array::from_fn(|d| {
                        (center[d] + rng.gen_range(-half..=half)).clamp(min, max)
                    });
                    points.push(PhPoint::new(p));
                }
            }
            points
        }
    }
}
