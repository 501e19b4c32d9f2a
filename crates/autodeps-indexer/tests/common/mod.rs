#![allow(dead_code)]

use autodeps_bazel::{BuildGraph, OutputRoots, Workspace};
use autodeps_core::{AutodepsError, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub fn write_jar(path: &Path, classes: &[&str]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    writer
        .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
    for class in classes {
        let entry = format!("{}.class", class.replace('.', "/"));
        writer
            .start_file(entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"\xca\xfe\xba\xbe").unwrap();
    }
    writer.finish().unwrap();
}

/// Three empty roots laid out like a workspace, an output base and bazel-bin.
pub struct Layout {
    _dir: TempDir,
    pub workspace: Workspace,
}

impl Layout {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("ws");
        let base = dir.path().join("output_base");
        let bin = dir.path().join("bin");
        for d in [&root, &base, &bin] {
            fs::create_dir_all(d).unwrap();
        }
        Self {
            workspace: Workspace::new(root, base, bin),
            _dir: dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.root()
    }

    pub fn base(&self) -> &Path {
        self.workspace.output_base()
    }

    pub fn bin(&self) -> &Path {
        self.workspace.bazel_bin()
    }
}

/// In-memory build tool. Builds "produce" jars registered with `on_build`.
#[derive(Default)]
pub struct FakeGraph {
    pub builds: RefCell<Vec<String>>,
    pub output_queries: RefCell<Vec<String>>,
    outputs: HashMap<String, Vec<String>>,
    artifacts: HashMap<String, Vec<(PathBuf, Vec<String>)>>,
    failing_builds: Vec<String>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outputs(mut self, target: &str, files: &[&str]) -> Self {
        self.outputs
            .insert(target.to_string(), files.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn on_build(mut self, target: &str, jar: PathBuf, classes: &[&str]) -> Self {
        self.artifacts
            .entry(target.to_string())
            .or_default()
            .push((jar, classes.iter().map(|c| c.to_string()).collect()));
        self
    }

    pub fn failing_build(mut self, target: &str) -> Self {
        self.failing_builds.push(target.to_string());
        self
    }
}

impl BuildGraph for FakeGraph {
    fn output_roots(&self) -> Result<OutputRoots> {
        Err(AutodepsError::GraphQueryFailed {
            command: "info".into(),
            stderr: "not available in tests".into(),
        })
    }

    fn deps_graph(&self, seed: &str) -> Result<String> {
        Err(AutodepsError::GraphQueryFailed {
            command: format!("cquery deps({seed})"),
            stderr: "not available in tests".into(),
        })
    }

    fn build(&self, targets: &[&str]) -> Result<()> {
        for target in targets {
            self.builds.borrow_mut().push(target.to_string());
            if self.failing_builds.iter().any(|t| t == target) {
                return Err(AutodepsError::BuildFailed {
                    targets: target.to_string(),
                    status: "exit status: 1".into(),
                });
            }
            for (jar, classes) in self.artifacts.get(*target).into_iter().flatten() {
                let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
                write_jar(jar, &classes);
            }
        }
        Ok(())
    }

    fn output_files(&self, target: &str) -> Result<Vec<String>> {
        self.output_queries.borrow_mut().push(target.to_string());
        Ok(self.outputs.get(target).cloned().unwrap_or_default())
    }

    fn source_files(&self, _target: &str) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

pub fn rule(name: &str, class: &str, attrs: Vec<Value>, outputs: &[&str]) -> Value {
    json!({
        "target": {
            "type": "RULE",
            "rule": {
                "name": name,
                "ruleClass": class,
                "attribute": attrs,
                "ruleOutput": outputs,
            }
        }
    })
}

pub fn list_attr(name: &str, values: &[&str]) -> Value {
    json!({"name": name, "type": "STRING_LIST", "stringListValue": values})
}

pub fn string_attr(name: &str, value: &str) -> Value {
    json!({"name": name, "type": "STRING", "stringValue": value})
}

pub fn source_file(label: &str, location: &str) -> Value {
    json!({
        "target": {
            "type": "SOURCE_FILE",
            "sourceFile": {"name": label, "location": location}
        }
    })
}

pub fn snapshot(results: Vec<Value>) -> String {
    json!({ "results": results }).to_string()
}
