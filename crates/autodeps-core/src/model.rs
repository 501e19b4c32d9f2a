// ABOUTME: Index data model: library descriptors, alias map and the derived class index
// ABOUTME: Libraries are assembled through LibraryBuilder and frozen before readers see them

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// A JVM-producing rule and the classes found in its archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDescriptor {
    name: String,
    archive_refs: Vec<String>,
    exports: Option<Vec<String>>,
    visibility: Option<Vec<String>>,
    classes: Vec<String>,
}

impl LibraryDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_refs(&self) -> &[String] {
        &self.archive_refs
    }

    pub fn exports(&self) -> Option<&[String]> {
        self.exports.as_deref()
    }

    pub fn visibility(&self) -> Option<&[String]> {
        self.visibility.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Mutable side of a library, only alive while an index is being assembled.
#[derive(Debug, Clone)]
pub struct LibraryBuilder {
    name: String,
    archive_refs: Vec<String>,
    exports: Option<Vec<String>>,
    visibility: Option<Vec<String>>,
    classes: Vec<String>,
    seen: HashSet<String>,
}

impl LibraryBuilder {
    pub fn new(name: impl Into<String>, archive_refs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            archive_refs,
            exports: None,
            visibility: None,
            classes: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn with_exports(mut self, exports: Option<Vec<String>>) -> Self {
        self.exports = exports;
        self
    }

    pub fn with_visibility(mut self, visibility: Option<Vec<String>>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_refs(&self) -> &[String] {
        &self.archive_refs
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Appends a class unless this library already has it. Returns whether it was added.
    pub fn add_class(&mut self, class: impl Into<String>) -> bool {
        let class = class.into();
        if !self.seen.insert(class.clone()) {
            return false;
        }
        self.classes.push(class);
        true
    }

    pub fn clear_classes(&mut self) {
        self.classes.clear();
        self.seen.clear();
    }

    pub fn finish(self) -> LibraryDescriptor {
        LibraryDescriptor {
            name: self.name,
            archive_refs: self.archive_refs,
            exports: self.exports,
            visibility: self.visibility,
            classes: self.classes,
        }
    }
}

/// Longest alias chain followed before giving up on a cycle.
const MAX_ALIAS_HOPS: usize = 16;

/// Alias target -> real target, as declared (one hop).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasMap(BTreeMap<String, String>);

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `alias -> real`. Self-referencing aliases are refused.
    pub fn insert(&mut self, alias: impl Into<String>, real: impl Into<String>) -> bool {
        let alias = alias.into();
        let real = real.into();
        if alias == real {
            warn!("Ignoring alias {} pointing at itself", alias);
            return false;
        }
        if let Some(previous) = self.0.insert(alias.clone(), real.clone()) {
            if previous != real {
                warn!("Alias {} redefined: {} -> {}", alias, previous, real);
            }
        }
        true
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.0.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, r)| (a.as_str(), r.as_str()))
    }

    /// Real target -> every alias that ends up at it, following alias-to-alias
    /// chains. Aliases within each entry are sorted.
    pub fn reverse(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut reverse: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (alias, first) in self.iter() {
            let mut real = first;
            let mut hops = 1;
            while let Some(next) = self.get(real) {
                if hops == MAX_ALIAS_HOPS || next == alias {
                    warn!("Alias {} does not lead to a real target", alias);
                    break;
                }
                real = next;
                hops += 1;
            }
            if hops > 1 {
                debug!("Alias {} reaches {} through {} hops", alias, real, hops);
            }
            reverse.entry(real).or_default().push(alias);
        }
        reverse
    }
}

/// The persisted artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    alias: AliasMap,
    libraries: IndexMap<String, LibraryDescriptor>,
}

impl Index {
    pub fn new(alias: AliasMap, libraries: IndexMap<String, LibraryDescriptor>) -> Self {
        Self { alias, libraries }
    }

    pub fn alias(&self) -> &AliasMap {
        &self.alias
    }

    pub fn libraries(&self) -> &IndexMap<String, LibraryDescriptor> {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&LibraryDescriptor> {
        self.libraries.get(name)
    }

    pub fn class_count(&self) -> usize {
        self.libraries.values().map(|l| l.classes.len()).sum()
    }

    pub fn class_index(&self) -> ClassIndex {
        ClassIndex::from_index(self)
    }
}

/// Class name -> providing libraries, in library insertion order.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    providers: HashMap<String, Vec<String>>,
}

impl ClassIndex {
    pub fn from_index(index: &Index) -> Self {
        let mut providers: HashMap<String, Vec<String>> = HashMap::new();
        for library in index.libraries.values() {
            for class in &library.classes {
                providers
                    .entry(class.clone())
                    .or_default()
                    .push(library.name.clone());
            }
        }
        Self { providers }
    }

    pub fn providers(&self, class: &str) -> &[String] {
        self.providers.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Classes offered by more than one library.
    pub fn ambiguous(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.providers
            .iter()
            .filter(|(_, p)| p.len() > 1)
            .map(|(c, p)| (c.as_str(), p.as_slice()))
    }
}
