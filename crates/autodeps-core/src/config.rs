// ABOUTME: Configuration for indexing and resolving, loaded from TOML and environment
// ABOUTME: Precedence: environment variables > config file > defaults

use crate::error::{AutodepsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = ".autodeps.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AutodepsConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub bazel: BazelConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub rules: RuleKindTable,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the workspace and its output trees live. Unset roots are asked from `bazel info`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub output_base: Option<PathBuf>,

    #[serde(default)]
    pub bazel_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BazelConfig {
    #[serde(default = "default_bazel_binary")]
    pub binary: String,
}

impl Default for BazelConfig {
    fn default() -> Self {
        Self {
            binary: default_bazel_binary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Gzip-compressed database file
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Target whose transitive deps are indexed when no snapshot is given
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Libraries never scanned for classes: compile-time-only aggregates
    /// whose jars would show up as misleading candidates
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            seed: default_seed(),
            exclude: default_exclude(),
        }
    }
}

/// Which rule classes belong to which extraction strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleKindTable {
    #[serde(default = "default_alias_rules")]
    pub alias: Vec<String>,

    /// Pre-built jars declared through a `jars` attribute
    #[serde(default = "default_import_rules")]
    pub import: Vec<String>,

    /// Compiled from sources, primary output is the class jar
    #[serde(default = "default_library_rules")]
    pub library: Vec<String>,

    /// Worker-compiled or link-aggregated rules exposing a deploy jar
    #[serde(default = "default_generated_library_rules")]
    pub generated_library: Vec<String>,

    /// Rules emitting jars without declaring them as rule outputs
    #[serde(default = "default_jar_generator_rules")]
    pub jar_generator: Vec<String>,
}

impl Default for RuleKindTable {
    fn default() -> Self {
        Self {
            alias: default_alias_rules(),
            import: default_import_rules(),
            library: default_library_rules(),
            generated_library: default_generated_library_rules(),
            jar_generator: default_jar_generator_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact", "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_bazel_binary() -> String {
    "bazel".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("~/.cache/autodeps/autodeps-db.json.gz")
}

fn default_seed() -> String {
    "//common:common".to_string()
}

fn default_exclude() -> Vec<String> {
    vec!["@debezium_1_7//:compile_time_only_dependencies".to_string()]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_alias_rules() -> Vec<String> {
    strings(&["alias"])
}

fn default_import_rules() -> Vec<String> {
    strings(&["java_import", "jvm_import", "scala_import"])
}

fn default_library_rules() -> Vec<String> {
    strings(&["java_library", "scala_library", "kt_jvm_library"])
}

fn default_generated_library_rules() -> Vec<String> {
    strings(&["generic_scala_worker"])
}

fn default_jar_generator_rules() -> Vec<String> {
    strings(&[
        "java_proto_library",
        "java_lite_proto_library",
        "java_grpc_library",
        "jar_jar",
    ])
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

pub struct ConfigManager {
    config: AutodepsConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Loads the configuration. An explicit path must exist; otherwise
    /// `./.autodeps.toml` then `~/.autodeps/config.toml` are tried.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (config, config_path) = match explicit {
            Some(path) => (Self::read_toml_file(&expand_home(path))?, Some(path.to_path_buf())),
            None => Self::find_config_file()?,
        };

        let config = Self::apply_env_overrides(config, |key| std::env::var(key).ok());
        Self::validate_config(&config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn from_config(config: AutodepsConfig) -> Result<Self> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn find_config_file() -> Result<(AutodepsConfig, Option<PathBuf>)> {
        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok((Self::read_toml_file(local)?, Some(local.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".autodeps").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((AutodepsConfig::default(), None))
    }

    pub fn read_toml_file(path: &Path) -> Result<AutodepsConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AutodepsError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<AutodepsConfig> {
        toml::from_str(content).map_err(|e| AutodepsError::Config(e.to_string()))
    }

    fn apply_env_overrides(
        mut config: AutodepsConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> AutodepsConfig {
        if let Some(root) = env("AUTODEPS_WORKSPACE") {
            config.workspace.root = Some(PathBuf::from(root));
        }
        if let Some(db) = env("AUTODEPS_DB") {
            config.index.database = PathBuf::from(db);
        }
        if let Some(binary) = env("AUTODEPS_BAZEL") {
            config.bazel.binary = binary;
        }
        if let Some(seed) = env("AUTODEPS_SEED") {
            config.index.seed = seed;
        }
        if let Some(level) = env("RUST_LOG") {
            // Only plain levels; filter directives are left to the EnvFilter.
            if matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
                config.logging.level = level;
            }
        }
        config
    }

    fn validate_config(config: &AutodepsConfig) -> Result<()> {
        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(AutodepsError::Config(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => {
                return Err(AutodepsError::Config(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact, json",
                    other
                )))
            }
        }

        if config.bazel.binary.trim().is_empty() {
            return Err(AutodepsError::Config("bazel.binary must not be empty".into()));
        }

        Ok(())
    }

    pub fn config(&self) -> &AutodepsConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn database_path(&self) -> PathBuf {
        expand_home(&self.config.index.database)
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.config.workspace.root.as_deref().map(expand_home)
    }
}
