// ABOUTME: Classifies graph rules by kind and decodes each kind's attributes into typed fields
// ABOUTME: Produces library builders, alias entries or skips for the index builder

use crate::paths::PathResolver;
use autodeps_bazel::{BuildGraph, RawRule};
use autodeps_core::{
    LibraryBuilder, Result, RuleKindTable, ARCHIVE_SUFFIX, DEPLOY_ARCHIVE_SUFFIX,
    INTERFACE_ARCHIVE_SUFFIX, SOURCE_ARCHIVE_SUFFIXES,
};
use tracing::{debug, warn};

/// Interface jars lack private members but are cheaper to produce. Scanning
/// them is switched off: the deploy jar is always used when present.
const PREFER_INTERFACE_JARS: bool = false;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Alias,
    Import,
    Library,
    GeneratedLibrary,
    JarGenerator,
}

impl RuleKind {
    pub fn of(rule_class: &str, table: &RuleKindTable) -> Option<Self> {
        let listed = |classes: &[String]| classes.iter().any(|c| c == rule_class);
        if listed(&table.alias) {
            Some(RuleKind::Alias)
        } else if listed(&table.import) {
            Some(RuleKind::Import)
        } else if listed(&table.library) {
            Some(RuleKind::Library)
        } else if listed(&table.generated_library) {
            Some(RuleKind::GeneratedLibrary)
        } else if listed(&table.jar_generator) {
            Some(RuleKind::JarGenerator)
        } else {
            None
        }
    }
}

/// Re-export and access metadata carried by every library kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declared {
    pub exports: Option<Vec<String>>,
    pub visibility: Option<Vec<String>>,
}

impl Declared {
    fn decode(rule: &RawRule) -> Self {
        Self {
            exports: rule.string_list("exports").map(<[String]>::to_vec),
            visibility: rule.string_list("visibility").map(<[String]>::to_vec),
        }
    }
}

/// A graph rule decoded according to its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmRule {
    Alias {
        name: String,
        actual: Option<String>,
    },
    Import {
        name: String,
        jars: Vec<String>,
        declared: Declared,
    },
    Library {
        name: String,
        outputs: Vec<String>,
        declared: Declared,
    },
    GeneratedLibrary {
        name: String,
        outputs: Vec<String>,
        emit_ijar: bool,
        declared: Declared,
    },
    JarGenerator {
        name: String,
        declared: Declared,
    },
    Unsupported {
        name: String,
        rule_class: String,
    },
}

impl JvmRule {
    pub fn decode(rule: &RawRule, table: &RuleKindTable) -> Self {
        match RuleKind::of(&rule.rule_class, table) {
            Some(RuleKind::Alias) => decode_alias(rule),
            Some(RuleKind::Import) => decode_import(rule),
            Some(RuleKind::Library) => decode_library(rule),
            Some(RuleKind::GeneratedLibrary) => decode_generated_library(rule),
            Some(RuleKind::JarGenerator) => decode_jar_generator(rule),
            None => JvmRule::Unsupported {
                name: rule.name.clone(),
                rule_class: rule.rule_class.clone(),
            },
        }
    }
}

fn decode_alias(rule: &RawRule) -> JvmRule {
    JvmRule::Alias {
        name: rule.name.clone(),
        actual: rule.string("actual").map(str::to_string),
    }
}

fn decode_import(rule: &RawRule) -> JvmRule {
    JvmRule::Import {
        name: rule.name.clone(),
        jars: rule.string_list("jars").map(<[String]>::to_vec).unwrap_or_default(),
        declared: Declared::decode(rule),
    }
}

fn decode_library(rule: &RawRule) -> JvmRule {
    JvmRule::Library {
        name: rule.name.clone(),
        outputs: rule.rule_output.clone(),
        declared: Declared::decode(rule),
    }
}

fn decode_generated_library(rule: &RawRule) -> JvmRule {
    JvmRule::GeneratedLibrary {
        name: rule.name.clone(),
        outputs: rule.rule_output.clone(),
        emit_ijar: rule.boolean("emit_ijar").unwrap_or(true),
        declared: Declared::decode(rule),
    }
}

fn decode_jar_generator(rule: &RawRule) -> JvmRule {
    JvmRule::JarGenerator {
        name: rule.name.clone(),
        declared: Declared::decode(rule),
    }
}

/// What one rule contributes to the index.
#[derive(Debug)]
pub enum Extraction {
    Alias { alias: String, actual: String },
    Library(LibraryBuilder),
    Skip { rule_class: String },
    /// A supported rule missing an attribute it cannot do without.
    Malformed { name: String, reason: String },
}

/// Primary class jar of a library: first `.jar` output that is not a source jar.
pub fn primary_library_jar(outputs: &[String]) -> Option<&String> {
    outputs.iter().find(|output| {
        output.ends_with(ARCHIVE_SUFFIX)
            && !SOURCE_ARCHIVE_SUFFIXES
                .iter()
                .any(|suffix| output.ends_with(suffix))
    })
}

pub fn generated_library_jar(outputs: &[String], emit_ijar: bool) -> Option<&String> {
    let suffix = if PREFER_INTERFACE_JARS && emit_ijar {
        INTERFACE_ARCHIVE_SUFFIX
    } else {
        DEPLOY_ARCHIVE_SUFFIX
    };
    outputs.iter().find(|output| output.ends_with(suffix))
}

pub struct RuleExtractor<'a> {
    resolver: &'a PathResolver<'a>,
    graph: &'a dyn BuildGraph,
    table: &'a RuleKindTable,
}

impl<'a> RuleExtractor<'a> {
    pub fn new(
        resolver: &'a PathResolver<'a>,
        graph: &'a dyn BuildGraph,
        table: &'a RuleKindTable,
    ) -> Self {
        Self {
            resolver,
            graph,
            table,
        }
    }

    pub fn extract(&self, rule: &RawRule) -> Result<Extraction> {
        self.extract_with(rule, true)
    }

    /// Extraction from the rule's declared attributes alone, without any
    /// graph query: imports keep their `jars` and jar generators get none.
    pub fn extract_declared(&self, rule: &RawRule) -> Result<Extraction> {
        self.extract_with(rule, false)
    }

    fn extract_with(&self, rule: &RawRule, query: bool) -> Result<Extraction> {
        let extraction = match JvmRule::decode(rule, self.table) {
            JvmRule::Alias { name, actual } => match actual {
                Some(actual) => Extraction::Alias {
                    alias: name,
                    actual,
                },
                None => {
                    warn!("Alias {} has no actual target", name);
                    Extraction::Malformed {
                        name,
                        reason: "alias without an actual target".to_string(),
                    }
                }
            },
            JvmRule::Import {
                name,
                jars,
                declared,
            } => {
                let on_disk = || {
                    !jars.is_empty() && jars.iter().all(|j| self.resolver.guess(j).is_some())
                };
                let jars = if !query || on_disk() {
                    jars
                } else {
                    debug!("{} jars are not on disk, querying its outputs", name);
                    self.generated_jars(&name)?
                };
                library(name, jars, declared)
            }
            JvmRule::Library {
                name,
                outputs,
                declared,
            } => {
                let jars = primary_library_jar(&outputs).cloned().into_iter().collect();
                library(name, jars, declared)
            }
            JvmRule::GeneratedLibrary {
                name,
                outputs,
                emit_ijar,
                declared,
            } => {
                let jars = generated_library_jar(&outputs, emit_ijar)
                    .cloned()
                    .into_iter()
                    .collect();
                library(name, jars, declared)
            }
            JvmRule::JarGenerator { name, declared } => {
                let jars = if query {
                    self.generated_jars(&name)?
                } else {
                    Vec::new()
                };
                library(name, jars, declared)
            }
            JvmRule::Unsupported { rule_class, .. } => Extraction::Skip { rule_class },
        };
        Ok(extraction)
    }

    fn generated_jars(&self, name: &str) -> Result<Vec<String>> {
        Ok(self
            .graph
            .output_files(name)?
            .into_iter()
            .filter(|file| file.ends_with(ARCHIVE_SUFFIX))
            .collect())
    }
}

fn library(name: String, jars: Vec<String>, declared: Declared) -> Extraction {
    if jars.is_empty() {
        debug!("{} has no archive to scan", name);
    }
    Extraction::Library(
        LibraryBuilder::new(name, jars)
            .with_exports(declared.exports)
            .with_visibility(declared.visibility),
    )
}
