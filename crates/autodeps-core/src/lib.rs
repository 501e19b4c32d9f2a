//! Core types for autodeps: the class index model, its gzip/JSON persistence,
//! jar inspection and configuration shared by the indexer and the resolver.

pub mod archive;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;

pub use archive::{collect_classes, list_classes, ArchiveClasses};
pub use config::{
    expand_home, AutodepsConfig, BazelConfig, ConfigManager, IndexConfig, LoggingConfig,
    RuleKindTable, WorkspaceConfig,
};
pub use error::{AutodepsError, Result};
pub use model::{AliasMap, ClassIndex, Index, LibraryBuilder, LibraryDescriptor};
pub use storage::{load_index, save_index};

/// Suffix of JVM archives.
pub const ARCHIVE_SUFFIX: &str = ".jar";
/// Suffix of compiled class entries inside an archive.
pub const CLASS_SUFFIX: &str = ".class";
/// Source jars emitted next to class jars.
pub const SOURCE_ARCHIVE_SUFFIXES: &[&str] = &["-src.jar", "-sources.jar"];
/// Self-contained jar of worker-compiled rules.
pub const DEPLOY_ARCHIVE_SUFFIX: &str = "_deploy.jar";
/// Interface-only jar (method bodies stripped).
pub const INTERFACE_ARCHIVE_SUFFIX: &str = "_ijar.jar";
