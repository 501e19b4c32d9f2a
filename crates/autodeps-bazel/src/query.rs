// ABOUTME: Decodes `--output=jsonproto` query results into rule and source-file nodes
// ABOUTME: Accepts both cquery (`results[].target`) and query (`target[]`) documents

use autodeps_core::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct QueryOutput {
    #[serde(default)]
    results: Vec<ConfiguredTarget>,

    #[serde(default)]
    target: Vec<Target>,
}

impl QueryOutput {
    /// Targets in document order.
    pub fn into_targets(self) -> Vec<Target> {
        self.results
            .into_iter()
            .map(|configured| configured.target)
            .chain(self.target)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ConfiguredTarget {
    target: Target,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Target {
    #[serde(rename = "RULE")]
    Rule { rule: RawRule },

    #[serde(rename = "SOURCE_FILE", rename_all = "camelCase")]
    SourceFile { source_file: RawSourceFile },

    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    pub name: String,
    pub rule_class: String,
    #[serde(default)]
    pub attribute: Vec<RawAttribute>,
    #[serde(default)]
    pub rule_output: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttribute {
    pub name: String,
    #[serde(default)]
    pub string_value: Option<String>,
    #[serde(default)]
    pub string_list_value: Option<Vec<String>>,
    #[serde(default)]
    pub boolean_value: Option<bool>,
}

impl RawRule {
    pub fn attribute(&self, name: &str) -> Option<&RawAttribute> {
        self.attribute.iter().find(|a| a.name == name)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.attribute(name)?.string_value.as_deref()
    }

    /// List attribute; `None` when the attribute is absent or not a list.
    pub fn string_list(&self, name: &str) -> Option<&[String]> {
        self.attribute(name)?.string_list_value.as_deref()
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        let attr = self.attribute(name)?;
        attr.boolean_value
            .or_else(|| attr.string_value.as_deref().map(|v| v == "true" || v == "1"))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSourceFile {
    #[serde(default)]
    pub name: Option<String>,
    pub location: String,
}

impl RawSourceFile {
    /// Filesystem path part of a `path:line:column` location.
    pub fn path(&self) -> PathBuf {
        let location = self.location.as_str();
        let path = location.split(':').next().unwrap_or(location);
        PathBuf::from(path)
    }
}

pub fn parse_query_output(json: &str) -> Result<Vec<Target>> {
    let output: QueryOutput = serde_json::from_str(json)?;
    Ok(output.into_targets())
}

pub fn source_file_paths(targets: &[Target]) -> Vec<PathBuf> {
    targets
        .iter()
        .filter_map(|target| match target {
            Target::SourceFile { source_file } => Some(source_file.path()),
            _ => None,
        })
        .collect()
}
