use autodeps_core::Result;
use std::path::PathBuf;

/// Output trees reported by the build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRoots {
    pub output_base: PathBuf,
    pub bazel_bin: PathBuf,
}

/// The build tool as seen by the indexer and the resolver.
///
/// Every call may spawn an external process and block until it finishes.
pub trait BuildGraph {
    /// Output base and binary output root of the workspace.
    fn output_roots(&self) -> Result<OutputRoots>;

    /// jsonproto description of `deps(seed)` without implicit deps.
    fn deps_graph(&self, seed: &str) -> Result<String>;

    /// Builds the targets. A failed build is an error.
    fn build(&self, targets: &[&str]) -> Result<()>;

    /// Files generated for `target`, as printed by the build tool.
    fn output_files(&self, target: &str) -> Result<Vec<String>>;

    /// Source files listed in the `srcs` of `target`.
    fn source_files(&self, target: &str) -> Result<Vec<PathBuf>>;
}
