use crate::paths::PathResolver;
use crate::rules::{Extraction, RuleExtractor};
use autodeps_bazel::{parse_query_output, BuildGraph, Target, Workspace};
use autodeps_core::{
    list_classes, AliasMap, AutodepsConfig, Index, LibraryBuilder, Result,
};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFailure {
    pub library: String,
    pub reason: String,
}

/// What happened to the rules that did not end up as scanned libraries.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Rule classes with no extraction strategy, each listed once.
    pub skipped_kinds: BTreeSet<String>,
    /// Libraries on the exclusion list: kept with their declared refs, never scanned.
    pub excluded: Vec<String>,
    pub duplicates: Vec<String>,
    /// Supported rules that could not be used, such as an alias without `actual`.
    pub malformed: Vec<String>,
    pub failures: Vec<LibraryFailure>,
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skipped rule kinds, {} malformed rules, {} excluded, {} duplicate, {} failed libraries",
            self.skipped_kinds.len(),
            self.malformed.len(),
            self.excluded.len(),
            self.duplicates.len(),
            self.failures.len()
        )
    }
}

#[derive(Debug)]
pub struct IndexOutcome {
    pub index: Index,
    pub report: IndexReport,
}

pub struct IndexBuilder<'a> {
    graph: &'a dyn BuildGraph,
    workspace: &'a Workspace,
    config: &'a AutodepsConfig,
    progress: ProgressBar,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        graph: &'a dyn BuildGraph,
        workspace: &'a Workspace,
        config: &'a AutodepsConfig,
    ) -> Self {
        Self {
            graph,
            workspace,
            config,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.config.index.exclude.iter().any(|e| e == name)
    }

    pub fn build_from_json(&self, json: &str) -> Result<IndexOutcome> {
        let targets = parse_query_output(json)?;
        self.build(&targets)
    }

    pub fn build(&self, targets: &[Target]) -> Result<IndexOutcome> {
        let resolver = PathResolver::new(self.workspace, self.graph);
        let extractor = RuleExtractor::new(&resolver, self.graph, &self.config.rules);

        let mut aliases = AliasMap::new();
        let mut libraries: IndexMap<String, LibraryBuilder> = IndexMap::new();
        let mut report = IndexReport::default();

        for target in targets {
            let Target::Rule { rule } = target else {
                continue;
            };
            let excluded = self.is_excluded(&rule.name);
            let extraction = if excluded {
                extractor.extract_declared(rule)?
            } else {
                extractor.extract(rule)?
            };
            match extraction {
                Extraction::Alias { alias, actual } => {
                    aliases.insert(alias, actual);
                }
                Extraction::Library(library) => {
                    if libraries.contains_key(library.name()) {
                        warn!("Duplicate rule {}, keeping the first one", library.name());
                        report.duplicates.push(library.name().to_string());
                    } else {
                        if excluded {
                            info!("Skip {}", library.name());
                            report.excluded.push(library.name().to_string());
                        }
                        libraries.insert(library.name().to_string(), library);
                    }
                }
                Extraction::Skip { rule_class } => {
                    if report.skipped_kinds.insert(rule_class.clone()) {
                        info!("Skipping rules of kind {}", rule_class);
                    }
                }
                Extraction::Malformed { name, reason } => {
                    warn!("Ignoring {}: {}", name, reason);
                    report.malformed.push(name);
                }
            }
        }

        info!(
            "Found {} libraries and {} aliases",
            libraries.len(),
            aliases.len()
        );
        self.progress.set_length(libraries.len() as u64);

        for library in libraries.values_mut() {
            self.progress.set_message(library.name().to_string());
            if report.excluded.iter().any(|e| e == library.name()) {
                self.progress.inc(1);
                continue;
            }

            info!("check {} with {:?}", library.name(), library.archive_refs());
            if let Err(err) = scan_library(&resolver, library) {
                if !err.is_library_local() {
                    self.progress.abandon();
                    return Err(err);
                }
                warn!("Dropping classes of {}: {}", library.name(), err);
                library.clear_classes();
                report.failures.push(LibraryFailure {
                    library: library.name().to_string(),
                    reason: err.to_string(),
                });
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        let libraries = libraries
            .into_iter()
            .map(|(name, library)| (name, library.finish()))
            .collect();
        let index = Index::new(aliases, libraries);
        info!(
            "Indexed {} classes ({}), {} builds triggered",
            index.class_count(),
            report,
            resolver.built_rules()
        );
        Ok(IndexOutcome { index, report })
    }
}

fn scan_library(resolver: &PathResolver<'_>, library: &mut LibraryBuilder) -> Result<()> {
    for reference in library.archive_refs().to_vec() {
        let path = if Path::new(&reference).is_absolute() {
            PathBuf::from(&reference)
        } else {
            resolver.resolve(&reference, library.name())?
        };
        info!("jar is found in {}", path.display());
        for class in list_classes(&path)? {
            library.add_class(class?);
        }
    }
    Ok(())
}
