use crate::config::AciConfig;
use crate::dataset::{load_samples, Sample, AREA_LABEL};
use aci_classify::{
    DirichletEigenSubspaceClassifier, GraphClassifier, KNearestModel, MultipleGraphsClassifier,
    PrincipalAnglesClassifier, RootedGraph, SpectrumDistanceClassifier,
};
use anyhow::{Context as AnyhowContext, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

/// Graph classifier evaluated by leave one out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    /// Nearest neighbours on kernel weighted Laplacian spectra
    #[default]
    SpectrumDistance,
    /// Nearest neighbours on pattern vectors of color, position and area graphs
    MultipleGraphs,
    /// Principal angles between Laplacian eigenspaces
    PrincipalAngles,
    /// Dirichlet eigenvectors of subgraphs around the largest segment
    Dirichlet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluateReport {
    pub classifier: ClassifierKind,
    pub images: usize,
    pub characters: usize,
    pub neighbors: usize,
    pub recognition_rate: f64,
}

/// Vertex with the largest area label, the first one on ties
fn largest_segment(sample: &Sample) -> usize {
    let mut largest: Option<(usize, f32)> = None;
    for (vertex, label) in sample.graph.labels().iter().enumerate() {
        let area = label
            .as_ref()
            .and_then(|label| label.get(AREA_LABEL))
            .copied()
            .unwrap_or(0.0);
        if largest.map_or(true, |(_, best)| area > best) {
            largest = Some((vertex, area));
        }
    }
    largest.map_or(0, |(vertex, _)| vertex)
}

/// Leave one out recognition rate of a graph classifier over the images of
/// a dataset
pub fn run_evaluate(dataset: &Path, classifier: ClassifierKind, config: &AciConfig) -> Result<EvaluateReport> {
    let samples = load_samples(dataset, config)?;
    let classes: Vec<usize> = samples.iter().map(|sample| sample.class).collect();
    let settings = &config.classification;
    let images = samples.len();

    let recognition_rate = match graph_classifier(classifier, config)? {
        None => {
            let graphs: Vec<_> = samples.into_iter().map(|sample| sample.graph).collect();
            let mut classifier = SpectrumDistanceClassifier::new(
                settings.kernel,
                Box::new(KNearestModel::new(settings.neighbors)),
                settings.matrix_rep,
                settings.mu,
            )?;
            classifier.leave_one_out_recognition_rate(&graphs, &classes)
        }
        Some(mut classifier) => {
            let graphs: Vec<RootedGraph> = samples
                .into_iter()
                .map(|sample| {
                    let root = largest_segment(&sample);
                    RootedGraph::new(sample.graph, root)
                })
                .collect();
            classifier.leave_one_out_recognition_rate(&graphs, &classes)
        }
    }
    .context("Leave one out evaluation failed")?;
    log::info!("{classifier:?} recognition rate {recognition_rate:.3} on {images} images");

    Ok(EvaluateReport {
        classifier,
        images,
        characters: classes.iter().collect::<BTreeSet<_>>().len(),
        neighbors: settings.neighbors,
        recognition_rate,
    })
}

/// Classifier of rooted graphs, none for the spectrum distance classifier
fn graph_classifier(kind: ClassifierKind, config: &AciConfig) -> Result<Option<Box<dyn GraphClassifier>>> {
    let kernel = config.classification.kernel;
    let classifier: Box<dyn GraphClassifier> = match kind {
        ClassifierKind::SpectrumDistance => return Ok(None),
        ClassifierKind::MultipleGraphs => {
            let settings = &config.multiple_graphs;
            Box::new(MultipleGraphsClassifier::new(
                settings.feature_spaces(),
                settings.eigenvectors,
                config.classification.neighbors,
            )?)
        }
        ClassifierKind::PrincipalAngles => Box::new(PrincipalAnglesClassifier::new(
            kernel,
            config.classification.matrix_rep,
            config.principal_angles.similarity,
        )),
        ClassifierKind::Dirichlet => {
            let settings = &config.dirichlet;
            Box::new(DirichletEigenSubspaceClassifier::new(
                kernel,
                settings.eigenvectors,
                settings.min_subgraph_size,
                settings.similarity,
            )?)
        }
    };
    Ok(Some(classifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aci_graph::LabeledGraph;
    use std::path::PathBuf;

    #[test]
    fn test_largest_segment_is_root() {
        let mut graph = LabeledGraph::new(3);
        graph.set_label(0, vec![50.0, 0.0, 0.0, 1.0, 1.0, 0.25]);
        graph.set_label(1, vec![50.0, 0.0, 0.0, 2.0, 1.0, 0.5]);
        graph.set_label(2, vec![50.0, 0.0, 0.0, 3.0, 1.0, 0.5]);
        let sample = Sample {
            character: "rei".into(),
            class: 0,
            image: PathBuf::from("rei.ppm"),
            graph,
        };
        assert_eq!(largest_segment(&sample), 1);
    }
}
