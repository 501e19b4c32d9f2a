use crate::graph::{BuildGraph, OutputRoots};
use autodeps_core::{expand_home, Result, WorkspaceConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// Filesystem context for resolving symbolic outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    output_base: PathBuf,
    bazel_bin: PathBuf,
}

impl Workspace {
    pub fn new(
        root: impl Into<PathBuf>,
        output_base: impl Into<PathBuf>,
        bazel_bin: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            output_base: output_base.into(),
            bazel_bin: bazel_bin.into(),
        }
    }

    /// Uses configured roots where present and asks the build tool only
    /// when one of them is missing.
    pub fn discover(root: &Path, config: &WorkspaceConfig, graph: &dyn BuildGraph) -> Result<Self> {
        let (output_base, bazel_bin) = match (&config.output_base, &config.bazel_bin) {
            (Some(base), Some(bin)) => (expand_home(base), expand_home(bin)),
            (base, bin) => {
                let OutputRoots {
                    output_base,
                    bazel_bin,
                } = graph.output_roots()?;
                (
                    base.as_deref().map(expand_home).unwrap_or(output_base),
                    bin.as_deref().map(expand_home).unwrap_or(bazel_bin),
                )
            }
        };
        info!(
            "bazel-bin: {}, output_base: {}",
            bazel_bin.display(),
            output_base.display()
        );
        Ok(Self::new(root, output_base, bazel_bin))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    pub fn bazel_bin(&self) -> &Path {
        &self.bazel_bin
    }

    /// Probe order for relative outputs: workspace, output base, bazel-bin.
    pub fn candidate_roots(&self) -> [&Path; 3] {
        [&self.root, &self.output_base, &self.bazel_bin]
    }
}
