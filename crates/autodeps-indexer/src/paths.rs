// ABOUTME: Maps symbolic archive references (labels, output paths) to files on disk
// ABOUTME: Guess under the candidate roots, then build the rule, then ask the build tool

use autodeps_bazel::{BuildGraph, Workspace};
use autodeps_core::{AutodepsError, Result};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a reference is turned into a path relative to the candidate roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceForm {
    /// `//pkg:file` -> `pkg/file`
    WorkspaceLocal(PathBuf),
    /// `@repo//pkg:file` -> `external/repo/pkg/file`
    External(PathBuf),
    /// Already a relative output path such as `bazel-out/.../lib.jar`
    Generated(PathBuf),
    Absolute(PathBuf),
    Unsupported,
}

impl ReferenceForm {
    pub fn classify(reference: &str) -> Self {
        if let Some(rest) = reference.strip_prefix("//") {
            return ReferenceForm::WorkspaceLocal(label_path(rest));
        }

        if reference.starts_with('@') {
            let unprefixed = reference.trim_start_matches('@');
            return match unprefixed.split_once("//") {
                Some((repo, rest)) if !repo.is_empty() => {
                    ReferenceForm::External(Path::new("external").join(repo).join(label_path(rest)))
                }
                _ => ReferenceForm::Unsupported,
            };
        }

        let path = Path::new(reference);
        if path.is_absolute() {
            return ReferenceForm::Absolute(path.to_path_buf());
        }
        if reference.is_empty() || reference.contains(':') {
            return ReferenceForm::Unsupported;
        }
        ReferenceForm::Generated(path.to_path_buf())
    }
}

/// `pkg/sub:dir/file.jar` -> `pkg/sub/dir/file.jar`
fn label_path(label: &str) -> PathBuf {
    PathBuf::from(label.replace(':', "/").trim_start_matches('/'))
}

pub struct PathResolver<'a> {
    workspace: &'a Workspace,
    graph: &'a dyn BuildGraph,
    built: RefCell<HashSet<String>>,
}

impl<'a> PathResolver<'a> {
    pub fn new(workspace: &'a Workspace, graph: &'a dyn BuildGraph) -> Self {
        Self {
            workspace,
            graph,
            built: RefCell::new(HashSet::new()),
        }
    }

    /// First candidate root under which `relative` exists.
    fn probe(&self, relative: &Path) -> Option<PathBuf> {
        self.workspace.candidate_roots().into_iter().find_map(|root| {
            let candidate = root.join(relative);
            debug!("check {}", candidate.display());
            candidate.exists().then_some(candidate)
        })
    }

    /// Filesystem-only lookup, no builds and no queries.
    pub fn guess(&self, reference: &str) -> Option<PathBuf> {
        match ReferenceForm::classify(reference) {
            ReferenceForm::WorkspaceLocal(relative)
            | ReferenceForm::External(relative)
            | ReferenceForm::Generated(relative) => self.probe(&relative),
            ReferenceForm::Absolute(path) => path.exists().then_some(path),
            ReferenceForm::Unsupported => None,
        }
    }

    /// Locates `reference`, building `rule` once if the file is not there yet.
    pub fn resolve(&self, reference: &str, rule: &str) -> Result<PathBuf> {
        if let Some(path) = self.guess(reference) {
            return Ok(path);
        }

        if self.built.borrow_mut().insert(rule.to_string()) {
            info!(
                "output file {} doesn't exist, try bazel build {}",
                reference, rule
            );
            self.graph.build(&[rule])?;
            if let Some(path) = self.guess(reference) {
                return Ok(path);
            }
        }

        if let Some(path) = self.locate(reference) {
            return Ok(path);
        }

        Err(AutodepsError::UnresolvableArchive {
            reference: reference.to_string(),
            rule: rule.to_string(),
        })
    }

    /// Asks the build tool where `reference` lives; only a single answer is used.
    fn locate(&self, reference: &str) -> Option<PathBuf> {
        let located = match self.graph.output_files(reference) {
            Ok(files) => files,
            Err(err) => {
                warn!("Failed to get location of {}: {}", reference, err);
                return None;
            }
        };

        if located.len() != 1 {
            let err = AutodepsError::AmbiguousOutputQuery {
                reference: reference.to_string(),
                count: located.len(),
            };
            warn!("{}", err);
            return None;
        }

        let only = &located[0];
        match ReferenceForm::classify(only) {
            ReferenceForm::Absolute(path) => path.exists().then_some(path),
            ReferenceForm::Generated(relative) => self.probe(&relative),
            _ => None,
        }
    }

    pub fn built_rules(&self) -> usize {
        self.built.borrow().len()
    }
}
