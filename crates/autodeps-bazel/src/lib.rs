//! Bazel integration for autodeps: the `BuildGraph` seam, jsonproto decoding,
//! the process-backed client and the workspace path context.

pub mod client;
pub mod graph;
pub mod query;
pub mod workspace;

pub use client::BazelClient;
pub use graph::{BuildGraph, OutputRoots};
pub use query::{parse_query_output, RawAttribute, RawRule, RawSourceFile, Target};
pub use workspace::Workspace;
