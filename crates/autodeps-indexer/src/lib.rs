//! Builds the autodeps class index: walks the rules of a dependency graph,
//! finds each JVM rule's jar on disk and records the classes it contains.

pub mod builder;
pub mod paths;
pub mod rules;
pub mod source;

pub use builder::{IndexBuilder, IndexOutcome, IndexReport, LibraryFailure};
pub use paths::{PathResolver, ReferenceForm};
pub use rules::{Extraction, JvmRule, RuleExtractor, RuleKind};
pub use source::{load_graph, GraphSource};
