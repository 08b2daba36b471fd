//! Full-covariance Gaussian mixture over RGB colours.

use nalgebra::{Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type Color = Vector3<f64>;

pub const COMPONENTS: usize = 5;

const KMEANS_ITERATIONS: usize = 10;
const KMEANS_SEED: u64 = 0x5eed_9ca7;
const SINGULAR_EPS: f64 = f64::EPSILON;
const REGULARIZATION: f64 = 0.01;

#[derive(Debug, Clone)]
struct Component {
    weight: f64,
    mean: Color,
    inverse: Matrix3<f64>,
    determinant: f64,
}

impl Component {
    fn empty() -> Self {
        Self {
            weight: 0.0,
            mean: Color::zeros(),
            inverse: Matrix3::identity(),
            determinant: 1.0,
        }
    }

    /// Unnormalised Gaussian density (the 2π factor cancels in every use)
    fn density(&self, color: &Color) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = color - self.mean;
        let mahalanobis = d.dot(&(self.inverse * d));
        (-0.5 * mahalanobis).exp() / self.determinant.sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct Gmm {
    components: Vec<Component>,
}

impl Gmm {
    /// Fit a mixture from samples that already carry a component index each
    pub fn learn(samples: &[Color], assignments: &[usize]) -> Self {
        let mut sums = [Color::zeros(); COMPONENTS];
        let mut products = [Matrix3::<f64>::zeros(); COMPONENTS];
        let mut counts = [0usize; COMPONENTS];

        for (color, &ci) in samples.iter().zip(assignments) {
            sums[ci] += color;
            products[ci] += color * color.transpose();
            counts[ci] += 1;
        }

        let total = samples.len();
        let components = (0..COMPONENTS)
            .map(|ci| {
                let n = counts[ci];
                if n == 0 || total == 0 {
                    return Component::empty();
                }
                let mean = sums[ci] / n as f64;
                let mut covariance = products[ci] / n as f64 - mean * mean.transpose();
                let mut determinant = covariance.determinant();
                if determinant <= SINGULAR_EPS {
                    covariance += Matrix3::identity() * REGULARIZATION;
                    determinant = covariance.determinant();
                }
                let inverse = covariance.try_inverse().unwrap_or_else(Matrix3::identity);
                Component {
                    weight: n as f64 / total as f64,
                    mean,
                    inverse,
                    determinant,
                }
            })
            .collect();

        Self { components }
    }

    /// Seed a mixture by clustering `samples` into `COMPONENTS` groups
    pub fn from_samples(samples: &[Color]) -> Self {
        let assignments = kmeans(samples, COMPONENTS);
        Self::learn(samples, &assignments)
    }

    pub fn probability(&self, color: &Color) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.density(color))
            .sum()
    }

    pub fn most_likely_component(&self, color: &Color) -> usize {
        let mut best = 0;
        let mut best_p = f64::NEG_INFINITY;
        for (ci, c) in self.components.iter().enumerate() {
            let p = c.density(color);
            if p > best_p {
                best = ci;
                best_p = p;
            }
        }
        best
    }

    pub fn weights(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.weight).collect()
    }
}

fn distance2(a: &Color, b: &Color) -> f64 {
    (a - b).norm_squared()
}

fn nearest(centers: &[Color], color: &Color) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = distance2(c, color);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

/// k-means++ seeding followed by Lloyd iterations. Deterministic for a given input.
pub fn kmeans(samples: &[Color], k: usize) -> Vec<usize> {
    if samples.is_empty() {
        return Vec::new();
    }
    if samples.len() <= k {
        return (0..samples.len()).collect();
    }

    let mut rng = StdRng::seed_from_u64(KMEANS_SEED);
    let mut centers: Vec<Color> = Vec::with_capacity(k);
    centers.push(samples[rng.random_range(0..samples.len())]);

    let mut closest: Vec<f64> = samples.iter().map(|s| distance2(s, &centers[0])).collect();
    while centers.len() < k {
        let total: f64 = closest.iter().sum();
        let chosen = if total <= 0.0 {
            rng.random_range(0..samples.len())
        } else {
            let mut target = rng.random::<f64>() * total;
            let mut idx = samples.len() - 1;
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    idx = i;
                    break;
                }
                target -= d;
            }
            idx
        };
        let center = samples[chosen];
        for (d, s) in closest.iter_mut().zip(samples) {
            *d = (*d).min(distance2(s, &center));
        }
        centers.push(center);
    }

    let mut labels: Vec<usize> = samples.iter().map(|s| nearest(&centers, s)).collect();
    for _ in 0..KMEANS_ITERATIONS {
        let mut sums = vec![Color::zeros(); k];
        let mut counts = vec![0usize; k];
        for (s, &l) in samples.iter().zip(&labels) {
            sums[l] += s;
            counts[l] += 1;
        }
        for i in 0..k {
            if counts[i] > 0 {
                centers[i] = sums[i] / counts[i] as f64;
            }
        }

        let mut changed = false;
        for (s, l) in samples.iter().zip(labels.iter_mut()) {
            let n = nearest(&centers, s);
            if n != *l {
                *l = n;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(r: f64, g: f64, b: f64) -> Color {
        Color::new(r, g, b)
    }

    #[test]
    fn test_kmeans_separates_clusters() {
        let mut samples = Vec::new();
        for i in 0..20 {
            samples.push(c(10.0 + (i % 3) as f64, 10.0, 10.0));
            samples.push(c(240.0, 240.0 - (i % 2) as f64, 240.0));
        }
        let labels = kmeans(&samples, 2);
        assert_eq!(labels.len(), samples.len());
        assert_ne!(labels[0], labels[1]);
        for pair in labels.chunks(2) {
            assert_eq!(pair[0], labels[0]);
            assert_eq!(pair[1], labels[1]);
        }
    }

    #[test]
    fn test_kmeans_fewer_samples_than_clusters() {
        let samples = vec![c(1.0, 2.0, 3.0), c(4.0, 5.0, 6.0)];
        assert_eq!(kmeans(&samples, COMPONENTS), vec![0, 1]);
    }

    #[test]
    fn test_gmm_prefers_matching_model() {
        let dark: Vec<Color> = (0..50).map(|i| c(20.0 + (i % 5) as f64, 25.0, 30.0)).collect();
        let light: Vec<Color> = (0..50).map(|i| c(220.0, 210.0 + (i % 4) as f64, 200.0)).collect();
        let dark_gmm = Gmm::from_samples(&dark);
        let light_gmm = Gmm::from_samples(&light);

        let probe = c(22.0, 25.0, 30.0);
        assert!(dark_gmm.probability(&probe) > light_gmm.probability(&probe));

        let weight_sum: f64 = dark_gmm.weights().iter().sum();
        assert!((weight_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_samples_are_regularized() {
        let flat = vec![c(100.0, 100.0, 100.0); 30];
        let gmm = Gmm::from_samples(&flat);
        let p = gmm.probability(&c(100.0, 100.0, 100.0));
        assert!(p.is_finite() && p > 0.0);
    }
}
