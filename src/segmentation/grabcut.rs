use image::RgbImage;
use log::debug;

use super::gmm::{Color, Gmm};
use super::graph::FlowGraph;
use crate::error::FeatureError;
use crate::models::{Label, Roi, SegmentationMask};

const GAMMA: f64 = 50.0;
const LAMBDA: f64 = 9.0 * GAMMA;

/// Smoothness weights towards the left, up-left, up and up-right neighbour of each pixel
struct NeighborWeights {
    left: Vec<f64>,
    up_left: Vec<f64>,
    up: Vec<f64>,
    up_right: Vec<f64>,
}

/// Iterative graph-cut foreground extraction seeded with a rectangle.
///
/// Pixels outside `roi` are fixed background; pixels inside start as probable
/// foreground and are relabelled on each of the `iterations` rounds.
pub fn grabcut(image: &RgbImage, roi: &Roi, iterations: u32) -> Result<SegmentationMask, FeatureError> {
    let (width, height) = image.dimensions();
    if !roi.fits_within(width, height) {
        return Err(FeatureError::InvalidRoi(format!(
            "{:?} does not fit in a {}x{} image",
            roi, width, height
        )));
    }

    let mut mask = SegmentationMask::from_roi(width, height, roi);
    let colors: Vec<Color> = image
        .pixels()
        .map(|p| Color::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();

    let (mut bgd, mut fgd) = init_models(&colors, &mask)?;
    if iterations == 0 {
        return Ok(mask);
    }

    let beta = compute_beta(&colors, width as usize, height as usize);
    let weights = neighbor_weights(&colors, width as usize, height as usize, beta);
    debug!("GrabCut on {}x{} image, roi {:?}, beta {:.6}", width, height, roi, beta);

    let mut components = vec![0usize; colors.len()];
    for iteration in 0..iterations {
        assign_components(&colors, &mask, &bgd, &fgd, &mut components);
        (bgd, fgd) = learn_models(&colors, &mask, &components);

        let mut graph = build_graph(&colors, &mask, &bgd, &fgd, &weights, width as usize, height as usize);
        let flow = graph.max_flow();
        let changed = estimate_segmentation(&graph, &mut mask);
        debug!(
            "iteration {}: flow {:.2}, {} labels changed",
            iteration + 1,
            flow,
            changed
        );
    }

    Ok(mask)
}

fn split_samples(colors: &[Color], mask: &SegmentationMask) -> (Vec<Color>, Vec<Color>) {
    let mut background = Vec::new();
    let mut foreground = Vec::new();
    for (color, label) in colors.iter().zip(mask.labels()) {
        if label.is_foreground() {
            foreground.push(*color);
        } else {
            background.push(*color);
        }
    }
    (background, foreground)
}

fn init_models(colors: &[Color], mask: &SegmentationMask) -> Result<(Gmm, Gmm), FeatureError> {
    let (background, foreground) = split_samples(colors, mask);
    if background.is_empty() {
        return Err(FeatureError::NoSamples("background"));
    }
    if foreground.is_empty() {
        return Err(FeatureError::NoSamples("foreground"));
    }
    Ok((Gmm::from_samples(&background), Gmm::from_samples(&foreground)))
}

fn assign_components(
    colors: &[Color],
    mask: &SegmentationMask,
    bgd: &Gmm,
    fgd: &Gmm,
    components: &mut [usize],
) {
    for ((color, label), component) in colors.iter().zip(mask.labels()).zip(components.iter_mut()) {
        *component = if label.is_foreground() {
            fgd.most_likely_component(color)
        } else {
            bgd.most_likely_component(color)
        };
    }
}

fn learn_models(colors: &[Color], mask: &SegmentationMask, components: &[usize]) -> (Gmm, Gmm) {
    let mut bgd_samples = Vec::new();
    let mut bgd_components = Vec::new();
    let mut fgd_samples = Vec::new();
    let mut fgd_components = Vec::new();
    for ((color, label), &component) in colors.iter().zip(mask.labels()).zip(components) {
        if label.is_foreground() {
            fgd_samples.push(*color);
            fgd_components.push(component);
        } else {
            bgd_samples.push(*color);
            bgd_components.push(component);
        }
    }
    (
        Gmm::learn(&bgd_samples, &bgd_components),
        Gmm::learn(&fgd_samples, &fgd_components),
    )
}

/// β = 1 / (2 · mean squared colour difference between 8-neighbours)
fn compute_beta(colors: &[Color], width: usize, height: usize) -> f64 {
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for y in 0..height {
        for x in 0..width {
            let c = &colors[y * width + x];
            if x > 0 {
                sum += (c - colors[y * width + x - 1]).norm_squared();
                pairs += 1;
            }
            if y > 0 {
                if x > 0 {
                    sum += (c - colors[(y - 1) * width + x - 1]).norm_squared();
                    pairs += 1;
                }
                sum += (c - colors[(y - 1) * width + x]).norm_squared();
                pairs += 1;
                if x + 1 < width {
                    sum += (c - colors[(y - 1) * width + x + 1]).norm_squared();
                    pairs += 1;
                }
            }
        }
    }
    if sum <= f64::EPSILON || pairs == 0 {
        0.0
    } else {
        1.0 / (2.0 * sum / pairs as f64)
    }
}

fn neighbor_weights(colors: &[Color], width: usize, height: usize, beta: f64) -> NeighborWeights {
    let diagonal = GAMMA / std::f64::consts::SQRT_2;
    let n = colors.len();
    let mut weights = NeighborWeights {
        left: vec![0.0; n],
        up_left: vec![0.0; n],
        up: vec![0.0; n],
        up_right: vec![0.0; n],
    };
    let weight = |a: &Color, b: &Color, scale: f64| scale * (-beta * (a - b).norm_squared()).exp();

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let c = &colors[i];
            if x > 0 {
                weights.left[i] = weight(c, &colors[i - 1], GAMMA);
            }
            if y > 0 {
                if x > 0 {
                    weights.up_left[i] = weight(c, &colors[i - width - 1], diagonal);
                }
                weights.up[i] = weight(c, &colors[i - width], GAMMA);
                if x + 1 < width {
                    weights.up_right[i] = weight(c, &colors[i - width + 1], diagonal);
                }
            }
        }
    }
    weights
}

/// Negative log-likelihood, bounded so that an underflowed density stays finite
fn data_cost(gmm: &Gmm, color: &Color) -> f64 {
    -gmm.probability(color).max(f64::MIN_POSITIVE).ln()
}

fn build_graph(
    colors: &[Color],
    mask: &SegmentationMask,
    bgd: &Gmm,
    fgd: &Gmm,
    weights: &NeighborWeights,
    width: usize,
    height: usize,
) -> FlowGraph {
    let n = colors.len();
    let edge_pairs = 2 * n + 4 * n;
    let mut graph = FlowGraph::new(n, edge_pairs);

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let label = mask.labels()[i];
            let (from_source, to_sink) = match label {
                Label::Background => (0.0, LAMBDA),
                Label::Foreground => (LAMBDA, 0.0),
                Label::ProbableBackground | Label::ProbableForeground => {
                    (data_cost(bgd, &colors[i]), data_cost(fgd, &colors[i]))
                }
            };
            graph.add_terminal_weights(i, from_source, to_sink);

            if x > 0 {
                let w = weights.left[i];
                graph.add_edge(i, i - 1, w, w);
            }
            if y > 0 {
                if x > 0 {
                    let w = weights.up_left[i];
                    graph.add_edge(i, i - width - 1, w, w);
                }
                let w = weights.up[i];
                graph.add_edge(i, i - width, w, w);
                if x + 1 < width {
                    let w = weights.up_right[i];
                    graph.add_edge(i, i - width + 1, w, w);
                }
            }
        }
    }
    graph
}

/// Relabel probable pixels from the cut; fixed labels never change
fn estimate_segmentation(graph: &FlowGraph, mask: &mut SegmentationMask) -> usize {
    let source_side = graph.source_side();
    let mut changed = 0;
    for (label, in_source) in mask.labels_mut().iter_mut().zip(source_side) {
        if !label.is_probable() {
            continue;
        }
        let next = if in_source {
            Label::ProbableForeground
        } else {
            Label::ProbableBackground
        };
        if *label != next {
            *label = next;
            changed += 1;
        }
    }
    changed
}
