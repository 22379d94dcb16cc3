//! Representative-chunk selection via embedding clustering.
//!
//! Chunk embeddings are clustered with a seeded k-means pass; for every
//! centroid the single nearest chunk (searched over the full set, not just
//! cluster members) becomes a representative. The result is a small subset
//! spanning the paper's semantic space, cheaper than pairwise-similarity
//! ranking over all chunks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Refinement iterations for the centroid-update loop.
const KMEANS_ITERATIONS: usize = 20;

/// Fixed seed for centroid initialization; selection must be reproducible
/// for identical inputs.
const KMEANS_SEED: u64 = 42;

/// Picks up to `k` chunks that stand in for the whole document.
#[derive(Debug, Clone)]
pub struct RepresentativeSelector {
    iterations: usize,
    seed: u64,
}

impl Default for RepresentativeSelector {
    fn default() -> Self {
        Self {
            iterations: KMEANS_ITERATIONS,
            seed: KMEANS_SEED,
        }
    }
}

impl RepresentativeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects up to `k` representative chunks.
    ///
    /// With `k` or fewer chunks (or no embeddings) there is nothing to
    /// choose between and the input is returned unchanged, order preserved.
    /// Otherwise the embeddings are clustered into `min(k, n)` groups and
    /// the chunk nearest each centroid is taken; duplicate picks are
    /// deduplicated and the set is backfilled with unused indices until `k`
    /// chunks are collected.
    pub fn select(&self, chunks: &[String], embeddings: &[Vec<f32>], k: usize) -> Vec<String> {
        if chunks.len() <= k || embeddings.is_empty() {
            return chunks.to_vec();
        }

        let cluster_count = k.min(chunks.len());
        let centroids = self.cluster(embeddings, cluster_count);

        let mut selected: Vec<usize> = Vec::with_capacity(k);
        for centroid in &centroids {
            let nearest = nearest_index(embeddings, centroid);
            if !selected.contains(&nearest) {
                selected.push(nearest);
            }
        }

        // Small or overlapping clusters can resolve to the same chunk; pad
        // with unused indices so the prompt still sees k excerpts.
        if selected.len() < k {
            for index in 0..chunks.len() {
                if selected.len() == k {
                    break;
                }
                if !selected.contains(&index) {
                    selected.push(index);
                }
            }
        }

        debug!(
            total = chunks.len(),
            selected = selected.len(),
            "selected representative chunks"
        );
        selected.into_iter().map(|index| chunks[index].clone()).collect()
    }

    /// Seeded k-means over the embeddings, returning the final centroids.
    ///
    /// Initialization is greedy farthest-point: a seeded random first pick,
    /// then each further centroid maximizes its distance to the nearest one
    /// already chosen. Identical inputs always yield identical centroids.
    fn cluster(&self, embeddings: &[Vec<f32>], cluster_count: usize) -> Vec<Vec<f32>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut chosen = vec![rng.gen_range(0..embeddings.len())];
        while chosen.len() < cluster_count {
            let mut best_index = None;
            let mut best_distance = -1.0f64;
            for (index, embedding) in embeddings.iter().enumerate() {
                if chosen.contains(&index) {
                    continue;
                }
                let nearest = chosen
                    .iter()
                    .map(|&center| squared_l2(embedding, &embeddings[center]))
                    .fold(f64::MAX, f64::min);
                if nearest > best_distance {
                    best_distance = nearest;
                    best_index = Some(index);
                }
            }
            match best_index {
                Some(index) => chosen.push(index),
                None => break,
            }
        }
        let mut centroids: Vec<Vec<f32>> = chosen
            .into_iter()
            .map(|index| embeddings[index].clone())
            .collect();

        let dim = embeddings[0].len();
        let mut assignments = vec![0usize; embeddings.len()];

        for _ in 0..self.iterations {
            for (index, embedding) in embeddings.iter().enumerate() {
                assignments[index] = nearest_index(&centroids, embedding);
            }

            let mut sums = vec![vec![0.0f64; dim]; cluster_count];
            let mut counts = vec![0usize; cluster_count];
            for (embedding, &cluster) in embeddings.iter().zip(&assignments) {
                counts[cluster] += 1;
                for (slot, &value) in sums[cluster].iter_mut().zip(embedding) {
                    *slot += f64::from(value);
                }
            }

            for (cluster, count) in counts.iter().enumerate() {
                // An empty cluster keeps its previous centroid.
                if *count == 0 {
                    continue;
                }
                centroids[cluster] = sums[cluster]
                    .iter()
                    .map(|&sum| (sum / *count as f64) as f32)
                    .collect();
            }
        }

        centroids
    }
}

/// Index of the vector nearest to `target`, by squared Euclidean distance.
fn nearest_index(vectors: &[Vec<f32>], target: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_distance = f64::MAX;
    for (index, vector) in vectors.iter().enumerate() {
        let distance = squared_l2(vector, target);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = f64::from(*x) - f64::from(*y);
            diff * diff
        })
        .sum()
}
