//! Reads a persisted class index and suggests the Bazel deps a JVM target
//! needs, based on the classes its sources import.

pub mod imports;
pub mod resolver;

pub use imports::{parse_import_line, scan_file, scan_imports};
pub use resolver::{is_class_name, render, Dependency, Resolution, Resolver};
