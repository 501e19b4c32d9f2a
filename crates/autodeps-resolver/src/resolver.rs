// ABOUTME: Suggests the deps of a target from the classes its sources import
// ABOUTME: Providers are grouped, displayed under their alias and sorted for stable output

use crate::imports::scan_file;
use autodeps_bazel::BuildGraph;
use autodeps_core::{ClassIndex, Index, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// One suggested dependency and the imported classes that justify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name to write in the BUILD file: the alias when there is one.
    pub target: String,
    /// Library that actually provides the classes.
    pub real: String,
    pub classes: Vec<String>,
    /// Other aliases of `real`, besides `target`.
    pub also_known_as: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub dependencies: Vec<Dependency>,
    /// Imported classes that no indexed library provides.
    pub unresolved: Vec<String>,
}

impl Resolution {
    pub fn targets(&self) -> Vec<&str> {
        self.dependencies.iter().map(|d| d.target.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.unresolved.is_empty()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dep in &self.dependencies {
            writeln!(f, "# {}", dep.classes.join(" "))?;
            if !dep.also_known_as.is_empty() {
                writeln!(f, "# also available as: {}", dep.also_known_as.join(", "))?;
            }
            writeln!(f, "\"{}\",", dep.target)?;
        }
        for class in &self.unresolved {
            writeln!(f, "# unresolved: {}", class)?;
        }
        Ok(())
    }
}

/// Text printed for a resolution: one `"target",` line per dependency,
/// each preceded by the classes it provides.
pub fn render(resolution: &Resolution) -> String {
    resolution.to_string()
}

/// `com.x.Foo` is a class; `//a:a`, `@r//a` and `:a` are targets.
pub fn is_class_name(target: &str) -> bool {
    target.contains('.') && !target.contains(':')
}

pub struct Resolver<'a> {
    classes: ClassIndex,
    /// Real target -> every alias that ends up at it, sorted.
    aliases: BTreeMap<&'a str, Vec<&'a str>>,
    source_root: Option<PathBuf>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self {
            classes: index.class_index(),
            aliases: index.alias().reverse(),
            source_root: None,
        }
    }

    /// Directory that relative source paths reported by the build tool are read from.
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn classes_for(&self, target: &str, graph: &dyn BuildGraph) -> Result<BTreeSet<String>> {
        if is_class_name(target) {
            return Ok(BTreeSet::from([target.to_string()]));
        }

        let sources = graph.source_files(target)?;
        info!("Get sources {:?}", sources);
        let mut classes = BTreeSet::new();
        for source in sources {
            let path = match &self.source_root {
                Some(root) if source.is_relative() => root.join(&source),
                _ => source,
            };
            classes.extend(scan_file(&path)?);
        }
        Ok(classes)
    }

    pub fn resolve(&self, target: &str, graph: &dyn BuildGraph) -> Result<Resolution> {
        let classes = self.classes_for(target, graph)?;
        info!("classes {:?}", classes);
        Ok(self.resolve_classes(&classes))
    }

    /// Every provider of every class is kept, ambiguous or not.
    pub fn resolve_classes<I, S>(&self, classes: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_provider: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        let mut unresolved = BTreeSet::new();

        for class in classes {
            let class = class.as_ref();
            let Some((binary, providers)) = self.lookup(class) else {
                debug!("No library provides {}", class);
                unresolved.insert(class.to_string());
                continue;
            };
            if providers.len() > 1 {
                info!(
                    "{} is provided by {} libraries: {:?}",
                    binary,
                    providers.len(),
                    providers
                );
            }
            for provider in providers {
                by_provider
                    .entry(provider.as_str())
                    .or_default()
                    .insert(binary.clone());
            }
        }

        let mut dependencies: Vec<Dependency> = by_provider
            .into_iter()
            .map(|(real, classes)| self.dependency(real, classes))
            .collect();
        dependencies.sort_by(|a, b| a.target.cmp(&b.target).then_with(|| a.real.cmp(&b.real)));

        Resolution {
            dependencies,
            unresolved: unresolved.into_iter().collect(),
        }
    }

    /// Providers of `class`. An import of a nested class names it with dots
    /// (`a.Outer.Inner`) while the archive holds `a.Outer$Inner`, so on a miss
    /// the rightmost dots after a capitalized segment are turned into `$`.
    fn lookup(&self, class: &str) -> Option<(String, &[String])> {
        let mut candidate = class.to_string();
        loop {
            let providers = self.classes.providers(&candidate);
            if !providers.is_empty() {
                return Some((candidate, providers));
            }
            let nested = nested_binary_name(&candidate)?;
            debug!("{} not indexed, trying {}", candidate, nested);
            candidate = nested;
        }
    }

    fn dependency(&self, real: &str, classes: BTreeSet<String>) -> Dependency {
        let aliases = self.aliases.get(real).map(Vec::as_slice).unwrap_or(&[]);
        let (target, also_known_as) = match aliases.split_first() {
            Some((shown, rest)) => (
                shown.to_string(),
                rest.iter().map(|a| a.to_string()).collect(),
            ),
            None => (real.to_string(), Vec::new()),
        };
        Dependency {
            target,
            real: real.to_string(),
            classes: classes.into_iter().collect(),
            also_known_as,
        }
    }
}

/// `a.Outer.Inner` -> `a.Outer$Inner`, as long as the part before the last
/// dot names a class rather than a package.
fn nested_binary_name(class: &str) -> Option<String> {
    let (outer, inner) = class.rsplit_once('.')?;
    let outer_simple = outer.rsplit(['.', '$']).next().unwrap_or(outer);
    if !outer_simple.starts_with(|c: char| c.is_uppercase()) {
        return None;
    }
    Some(format!("{outer}${inner}"))
}
