use crate::error::{Result, SegmentationError};
use crate::image::{check_image, pixel, to_row_major, Mask};
use aci_graph::WeightedGraph;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Pixel neighbourhood of grid graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

impl Connectivity {
    /// `(row, col)` offsets of the neighbours after a pixel in row-major order
    fn forward_offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &[(1, 0), (0, 1)],
            Self::Eight => &[(1, -1), (1, 0), (1, 1), (0, 1)],
        }
    }
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Unit weight, for graphs where only the structure matters
pub fn constant_one(_: &[f64], _: &[f64]) -> f64 {
    1.0
}

/// Graph over all pixels joining neighbouring foreground pixels, weighted by
/// `distance` between their colors.
///
/// Vertex `j + cols * i` is pixel `(i, j)`. Each neighbour pair is added once
/// in row-major order, or in both directions when `bidirectional`.
pub fn grid_graph<A, D>(
    image: &Array3<A>,
    connectivity: Connectivity,
    mask: &Mask,
    distance: D,
    bidirectional: bool,
) -> Result<WeightedGraph>
where
    A: Copy + Into<f64>,
    D: Fn(&[f64], &[f64]) -> f64,
{
    check_image(image, mask)?;
    let (rows, cols, _) = image.dim();
    let offsets = connectivity.forward_offsets();
    let degree = offsets.len() * if bidirectional { 2 } else { 1 };
    let mut grid = WeightedGraph::with_max_degree(rows * cols, degree);

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] {
                continue;
            }
            let center = to_row_major(cols, j, i);
            let center_color = pixel(image, i, j);

            for &(row_offset, col_offset) in offsets {
                let (Some(row), Some(col)) = (
                    i.checked_add_signed(row_offset),
                    j.checked_add_signed(col_offset),
                ) else {
                    continue;
                };
                if row >= rows || col >= cols || !mask[[row, col]] {
                    continue;
                }

                let neighbor = to_row_major(cols, col, row);
                let weight = distance(&center_color, &pixel(image, row, col)) as f32;
                grid.add_edge(center, neighbor, weight);
                if bidirectional {
                    grid.add_edge(neighbor, center, weight);
                }
            }
        }
    }

    Ok(grid)
}

/// Foreground pixels in row-major order with their vertex and `(i, j, c0, c1, c2)` features
fn feature_vectors<A: Copy + Into<f64>>(image: &Array3<A>, mask: &Mask) -> Vec<(usize, [f64; 5])> {
    let (rows, cols, _) = image.dim();
    let mut features = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if mask[[i, j]] {
                let [c0, c1, c2] = pixel(image, i, j);
                features.push((to_row_major(cols, j, i), [i as f64, j as f64, c0, c1, c2]));
            }
        }
    }
    features
}

/// One row `(i, j, c0, c1, c2)` per foreground pixel, in row-major order
pub fn pixel_features<A: Copy + Into<f64>>(image: &Array3<A>, mask: &Mask) -> Result<Array2<f64>> {
    check_image(image, mask)?;
    let features = feature_vectors(image, mask);
    let mut matrix = Array2::zeros((features.len(), 5));
    for (row, (_, feature)) in features.iter().enumerate() {
        for (col, &value) in feature.iter().enumerate() {
            matrix[[row, col]] = value;
        }
    }
    Ok(matrix)
}

fn by_distance(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

fn add_neighbor_edges<D>(
    graph: &mut WeightedGraph,
    added: &mut HashSet<(usize, usize)>,
    features: &[(usize, [f64; 5])],
    source: usize,
    neighbors: &[(f64, usize)],
    distance: &D,
    bidirectional: bool,
) where
    D: Fn(&[f64], &[f64]) -> f64,
{
    let (source_vertex, source_features) = &features[source];
    for &(_, neighbor) in neighbors {
        let (destination_vertex, destination_features) = &features[neighbor];
        let key = (
            (*source_vertex).min(*destination_vertex),
            (*source_vertex).max(*destination_vertex),
        );
        if !added.insert(key) {
            continue;
        }

        let weight = distance(source_features, destination_features) as f32;
        graph.add_edge(*source_vertex, *destination_vertex, weight);
        if bidirectional {
            graph.add_edge(*destination_vertex, *source_vertex, weight);
        }
    }
}

/// Graph joining each foreground pixel to its `k` nearest foreground pixels
/// in `(i, j, c0, c1, c2)` feature space, weighted by `distance` between
/// features. Each pair is added once (twice when `bidirectional`).
pub fn k_nearest_graph<A, D>(
    image: &Array3<A>,
    mask: &Mask,
    k: usize,
    distance: D,
    bidirectional: bool,
) -> Result<WeightedGraph>
where
    A: Copy + Into<f64>,
    D: Fn(&[f64], &[f64]) -> f64,
{
    check_image(image, mask)?;
    if k == 0 {
        return Err(SegmentationError::InvalidParameter(
            "k nearest graph needs k > 0".into(),
        ));
    }

    let (rows, cols, _) = image.dim();
    let features = feature_vectors(image, mask);
    let mut graph = WeightedGraph::with_max_degree(rows * cols, k);
    let mut added = HashSet::new();

    for (i, (_, feature)) in features.iter().enumerate() {
        let mut candidates: Vec<(f64, usize)> = features
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, (_, other))| (euclidean_distance(feature, other), j))
            .collect();

        if candidates.len() > k {
            candidates.select_nth_unstable_by(k - 1, by_distance);
            candidates.truncate(k);
        }
        candidates.sort_by(by_distance);

        add_neighbor_edges(
            &mut graph,
            &mut added,
            &features,
            i,
            &candidates,
            &distance,
            bidirectional,
        );
    }

    log::debug!(
        "{k} nearest graph over {} pixels with {} edges",
        features.len(),
        graph.number_of_edges()
    );
    Ok(graph)
}

/// Graph joining each foreground pixel to at most `k` of the nearest
/// foreground pixels within `radius` in position space, weighted by `distance`
/// between `(i, j, c0, c1, c2)` features
pub fn radius_graph<A, D>(
    image: &Array3<A>,
    mask: &Mask,
    k: usize,
    radius: f64,
    distance: D,
    bidirectional: bool,
) -> Result<WeightedGraph>
where
    A: Copy + Into<f64>,
    D: Fn(&[f64], &[f64]) -> f64,
{
    check_image(image, mask)?;
    if !(radius >= 0.0) {
        return Err(SegmentationError::InvalidParameter(format!(
            "invalid radius {radius}"
        )));
    }

    let (rows, cols, _) = image.dim();
    let features = feature_vectors(image, mask);
    let mut feature_index = vec![None; rows * cols];
    for (index, (vertex, _)) in features.iter().enumerate() {
        feature_index[*vertex] = Some(index);
    }

    let reach = radius.floor() as usize;
    let mut graph = WeightedGraph::with_max_degree(rows * cols, k);
    let mut added = HashSet::new();

    for (index, (_, feature)) in features.iter().enumerate() {
        let (i, j) = (feature[0] as usize, feature[1] as usize);
        let mut candidates = Vec::new();

        for row in i.saturating_sub(reach)..=(i + reach).min(rows - 1) {
            for col in j.saturating_sub(reach)..=(j + reach).min(cols - 1) {
                let Some(other) = feature_index[to_row_major(cols, col, row)] else {
                    continue;
                };
                let position_distance = euclidean_distance(&feature[..2], &features[other].1[..2]);
                if other != index && position_distance <= radius {
                    candidates.push((position_distance, other));
                }
            }
        }

        candidates.sort_by(by_distance);
        candidates.truncate(k);
        add_neighbor_edges(
            &mut graph,
            &mut added,
            &features,
            index,
            &candidates,
            &distance,
            bidirectional,
        );
    }

    Ok(graph)
}
