use autodeps_bazel::BuildGraph;
use autodeps_core::{expand_home, Result};
use std::path::PathBuf;
use tracing::info;

/// Where the dependency graph description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphSource {
    /// Build the seed target, then query everything it depends on.
    Seed(String),
    /// A previously captured `cquery --output=jsonproto` document.
    Snapshot(PathBuf),
}

pub fn load_graph(source: &GraphSource, graph: &dyn BuildGraph) -> Result<String> {
    match source {
        GraphSource::Snapshot(path) => {
            let path = expand_home(path);
            info!("loading from {}", path.display());
            Ok(std::fs::read_to_string(path)?)
        }
        GraphSource::Seed(seed) => {
            graph.build(&[seed.as_str()])?;
            graph.deps_graph(seed)
        }
    }
}
