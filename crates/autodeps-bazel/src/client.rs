// ABOUTME: BuildGraph backed by the bazel binary, one blocking process per call
// ABOUTME: Query stdout is returned as-is; a non-zero exit becomes GraphQueryFailed

use crate::graph::{BuildGraph, OutputRoots};
use crate::query::{parse_query_output, source_file_paths};
use autodeps_core::{AutodepsError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub struct BazelClient {
    binary: String,
    workspace: PathBuf,
}

impl BazelClient {
    pub fn new(binary: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            workspace: workspace.into(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    fn command_line(&self, args: &[&str]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs bazel with `args` and returns its stdout.
    fn check_output(&self, args: &[&str]) -> Result<String> {
        let command = self.command_line(args);
        info!("Running {}", command);

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.workspace)
            .output()
            .map_err(|e| AutodepsError::GraphQueryFailed {
                command: command.clone(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AutodepsError::GraphQueryFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn cquery(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["cquery"];
        full.extend_from_slice(args);
        self.check_output(&full)
    }
}

impl BuildGraph for BazelClient {
    fn output_roots(&self) -> Result<OutputRoots> {
        let output = self.check_output(&["info", "bazel-bin", "output_base"])?;
        parse_info(&output).ok_or_else(|| AutodepsError::GraphQueryFailed {
            command: self.command_line(&["info", "bazel-bin", "output_base"]),
            stderr: format!("unexpected output: {}", output.trim()),
        })
    }

    fn deps_graph(&self, seed: &str) -> Result<String> {
        let expr = format!("deps({})", seed);
        self.cquery(&["--noimplicit_deps", "--output=jsonproto", expr.as_str()])
    }

    fn build(&self, targets: &[&str]) -> Result<()> {
        let mut args = vec!["build"];
        args.extend_from_slice(targets);
        let command = self.command_line(&args);
        info!("{}", command);

        // Progress goes straight to the terminal.
        let status = Command::new(&self.binary)
            .args(&args)
            .current_dir(&self.workspace)
            .status()?;
        if !status.success() {
            return Err(AutodepsError::BuildFailed {
                targets: targets.join(" "),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn output_files(&self, target: &str) -> Result<Vec<String>> {
        let output = self.cquery(&["--output=files", target])?;
        let files = parse_files_output(&output);
        debug!("{} generates {:?}", target, files);
        Ok(files)
    }

    fn source_files(&self, target: &str) -> Result<Vec<PathBuf>> {
        let expr = format!("labels(srcs, {})", target);
        let output = self.cquery(&["--output=jsonproto", expr.as_str()])?;
        let targets = parse_query_output(&output)?;
        Ok(source_file_paths(&targets))
    }
}

/// Reads `bazel-bin: ...` and `output_base: ...` lines.
pub fn parse_info(output: &str) -> Option<OutputRoots> {
    let mut bazel_bin = None;
    let mut output_base = None;
    for line in output.lines() {
        let Some((key, value)) = line.split_once(": ") else {
            continue;
        };
        match key.trim() {
            "bazel-bin" => bazel_bin = Some(PathBuf::from(value.trim())),
            "output_base" => output_base = Some(PathBuf::from(value.trim())),
            _ => {}
        }
    }
    Some(OutputRoots {
        output_base: output_base?,
        bazel_bin: bazel_bin?,
    })
}

pub fn parse_files_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
