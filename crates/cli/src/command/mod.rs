mod check_index;
mod cluster;
mod evaluate;
mod segment;

pub use check_index::{run_check_index, CheckIndexReport, ShardReport};
pub use cluster::{run_cluster, ClusterMethod, ClusterReport, ClusteredImage};
pub use evaluate::{run_evaluate, ClassifierKind, EvaluateReport};
pub use segment::{run_segment, SegmentReport};

use anyhow::Result;
use serde::Serialize;

/// Reports go to stdout as JSON, logs stay on stderr
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
