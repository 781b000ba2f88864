use crate::config::AciConfig;
use crate::dataset::{load_samples, Sample, AREA_LABEL, CENTER_LABELS};
use aci_classify::{PlanarGraph, TreeWalkSpectralClustering};
use aci_clustering::SpectrumDistanceClustering;
use aci_graph::WeightedGraph;
use anyhow::{bail, Context as AnyhowContext, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Similarity between whole segmentation graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterMethod {
    /// Distance between the smallest eigenvalues of the graph matrices
    #[default]
    Spectrum,
    /// Tree-walk kernel between planar segmentation graphs
    TreeWalk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteredImage {
    pub image: PathBuf,
    pub character: String,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    pub method: ClusterMethod,
    pub classes: usize,
    /// Fraction of images sharing the majority character of their cluster
    pub purity: f64,
    pub images: Vec<ClusteredImage>,
}

/// Majority class count summed over clusters, over the number of samples
pub(crate) fn purity(clusters: &[usize], classes: &[usize]) -> f64 {
    if clusters.is_empty() {
        return 0.0;
    }
    let mut counts: BTreeMap<usize, BTreeMap<usize, usize>> = BTreeMap::new();
    for (&cluster, &class) in clusters.iter().zip(classes) {
        *counts.entry(cluster).or_default().entry(class).or_default() += 1;
    }
    let majority: usize = counts
        .values()
        .map(|per_class| per_class.values().copied().max().unwrap_or(0))
        .sum();
    majority as f64 / clusters.len() as f64
}

/// Segment graph with `(L, a, b, area)` labels and segment centers
fn planar_graph(sample: &Sample) -> Result<PlanarGraph> {
    let mut graph = sample.graph.clone();
    let mut positions = Vec::with_capacity(graph.number_of_vertices());
    for vertex in 0..graph.number_of_vertices() {
        let Some(label) = sample.graph.label(vertex) else {
            bail!("Segment {vertex} of {} has no label", sample.image.display());
        };
        let (Some(color), Some(center), Some(&area)) = (
            label.get(0..3),
            label.get(CENTER_LABELS),
            label.get(AREA_LABEL),
        ) else {
            bail!("Segment {vertex} of {} has incomplete labels", sample.image.display());
        };
        graph.set_label(vertex, vec![color[0], color[1], color[2], area]);
        positions.push([center[0], center[1]]);
    }
    Ok(PlanarGraph::new(graph, positions))
}

fn cluster_graphs(samples: &[Sample], method: ClusterMethod, classes: usize, config: &AciConfig) -> Result<Vec<usize>> {
    match method {
        ClusterMethod::Spectrum => {
            let graphs: Vec<WeightedGraph> = samples
                .iter()
                .map(|sample| sample.graph.graph().clone())
                .collect();
            let clustering = SpectrumDistanceClustering::new(config.spectra.matrix_rep, config.spectra.k);
            clustering
                .cluster(&graphs, classes)
                .context("Spectrum distance clustering failed")
        }
        ClusterMethod::TreeWalk => {
            let graphs = samples.iter().map(planar_graph).collect::<Result<Vec<_>>>()?;
            let settings = &config.tree_walk;
            let clustering = TreeWalkSpectralClustering::new(settings.kernel, settings.depth, settings.arity)?;
            clustering
                .cluster(&graphs, classes)
                .context("Tree-walk spectral clustering failed")
        }
    }
}

/// Cluster the segmentation graphs of a dataset
pub fn run_cluster(dataset: &Path, classes: usize, method: ClusterMethod, config: &AciConfig) -> Result<ClusterReport> {
    if classes == 0 {
        bail!("The number of classes must be positive");
    }
    let samples = load_samples(dataset, config)?;
    let clusters = cluster_graphs(&samples, method, classes, config)?;

    let characters: Vec<usize> = samples.iter().map(|sample| sample.class).collect();
    let purity = purity(&clusters, &characters);
    log::info!("{method:?} clustering of {} images, purity {purity:.3}", samples.len());

    Ok(ClusterReport {
        method,
        classes,
        purity,
        images: samples
            .into_iter()
            .zip(clusters)
            .map(|(sample, cluster)| ClusteredImage {
                image: sample.image,
                character: sample.character,
                cluster,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_graph::LabeledGraph;

    #[test]
    fn test_purity() {
        assert_eq!(purity(&[0, 0, 1, 1], &[5, 5, 6, 6]), 1.0);
        assert_eq!(purity(&[0, 0, 0, 1], &[5, 5, 6, 6]), 0.75);
        assert_eq!(purity(&[], &[]), 0.0);
    }

    #[test]
    fn test_planar_graph_keeps_color_and_area() {
        let mut graph = LabeledGraph::new(2);
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 0, 1.0);
        graph.set_label(0, vec![50.0, 1.0, 2.0, 3.5, 4.5, 0.25]);
        graph.set_label(1, vec![60.0, 3.0, 4.0, 3.5, 12.5, 0.75]);
        let mut sample = Sample {
            character: "rei".into(),
            class: 0,
            image: PathBuf::from("rei.ppm"),
            graph,
        };

        let planar = planar_graph(&sample).unwrap();
        assert_eq!(planar.graph.label(1), Some(&vec![60.0, 3.0, 4.0, 0.75]));
        assert_eq!(planar.positions, vec![[3.5, 4.5], [3.5, 12.5]]);
        assert_eq!(planar.graph.number_of_edges(), 2);

        sample.graph.set_label(1, vec![60.0, 3.0]);
        assert!(planar_graph(&sample).is_err());
    }
}
