// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::Error;
use crate::runtime::LaunchOptions;
use anyhow::Context;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the CoreNLP installation root when none is configured.
pub const CORENLP_ENV: &str = "CORENLP";
pub const DEFAULT_MEMORY_SIZE: &str = "3g";

/// Engine property forced on every configuration; the normalizer only understands XML.
pub const OUTPUT_FORMAT_KEY: &str = "outputFormat";
pub const OUTPUT_FORMAT: &str = "xml";

/// Installation files, in classpath order. Patterns without a match are skipped.
const CLASSPATH_PATTERNS: [&str; 5] = [
    "stanford-corenlp-?.?.?-models.jar",
    "stanford-corenlp-?.?.?.jar",
    "joda-time.jar",
    "jollyday.jar",
    "xom.jar",
];

const DEFAULT_PORT: u16 = 9000;
const DEFAULT_READY_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;
/// Largest value the server's `-timeout` flag accepts; annotations are not cut short.
const DEFAULT_ANNOTATION_TIMEOUT_MS: u64 = 2_147_483_647;

/// Engine parameters, as accepted by the CoreNLP command line (`annotators`, `ner.model`, ...).
pub type Properties = BTreeMap<String, String>;

fn default_memory_size() -> String {
    DEFAULT_MEMORY_SIZE.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ready_timeout_secs() -> u64 {
    DEFAULT_READY_TIMEOUT_SECS
}

fn default_stop_timeout_secs() -> u64 {
    DEFAULT_STOP_TIMEOUT_SECS
}

fn default_annotation_timeout_ms() -> u64 {
    DEFAULT_ANNOTATION_TIMEOUT_MS
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatorConfig {
    /// CoreNLP installation root. Falls back to `$CORENLP`.
    #[serde(default)]
    pub corenlp_home: Option<PathBuf>,
    #[serde(default = "default_memory_size")]
    pub memory_size: String,
    /// `java` executable. Defaults to `$JAVA_HOME/bin/java`, then `java` on `PATH`.
    #[serde(default)]
    pub java_path: Option<PathBuf>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings of the JVM-hosted CoreNLP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
    /// Per-request annotation limit enforced by the server itself.
    #[serde(default = "default_annotation_timeout_ms")]
    pub annotation_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
            annotation_timeout_ms: DEFAULT_ANNOTATION_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            corenlp_home: None,
            memory_size: default_memory_size(),
            java_path: None,
            properties: Properties::new(),
            server: ServerConfig::default(),
        }
    }
}

/// Resolved, immutable settings owned by the annotator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub corenlp_home: PathBuf,
    pub launch: LaunchOptions,
    /// Always contains `outputFormat=xml`.
    pub properties: Properties,
}

impl AnnotatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corenlp_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.corenlp_home = Some(path.into());
        self
    }

    pub fn with_memory_size(mut self, size: impl Into<String>) -> Self {
        self.memory_size = size.into();
        self
    }

    pub fn with_java_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.java_path = Some(path.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Parse a YAML configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: AnnotatorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the installation root and classpath, and pin the output format.
    ///
    /// Reads `$CORENLP` and `$JAVA_HOME` and globs the installation root, nothing else.
    pub fn resolve(&self) -> Result<Settings, Error> {
        let corenlp_home = self
            .corenlp_home
            .clone()
            .or_else(|| {
                std::env::var_os(CORENLP_ENV)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "CoreNLP installation not found: set corenlp_home or the {CORENLP_ENV} environment variable"
                ))
            })?;

        validate_memory_size(&self.memory_size)?;
        let classpath = resolve_classpath(&corenlp_home)?;
        let java = self.java_path.clone().unwrap_or_else(default_java_path);

        Ok(Settings {
            corenlp_home,
            launch: LaunchOptions {
                java,
                memory_size: self.memory_size.clone(),
                classpath,
            },
            properties: pin_output_format(&self.properties),
        })
    }
}

/// Glob each installation file pattern under `home`, keeping pattern order.
pub fn resolve_classpath(home: &Path) -> Result<Vec<PathBuf>, Error> {
    let home_str = home.to_str().ok_or_else(|| {
        Error::Configuration(format!(
            "installation root is not valid UTF-8: {}",
            home.display()
        ))
    })?;
    let root = PathBuf::from(glob::Pattern::escape(home_str));

    let mut classpath = Vec::new();
    for pattern in CLASSPATH_PATTERNS {
        let full = root.join(pattern);
        let Some(full) = full.to_str() else {
            continue;
        };
        let paths = glob::glob(full)
            .map_err(|e| Error::Configuration(format!("invalid pattern {full}: {e}")))?;
        let before = classpath.len();
        for entry in paths {
            match entry {
                Ok(path) => classpath.push(path),
                Err(e) => warn!("skipping unreadable classpath entry: {e}"),
            }
        }
        if classpath.len() == before {
            debug!("no match for {pattern} in {}", home.display());
        }
    }
    Ok(classpath)
}

fn pin_output_format(properties: &Properties) -> Properties {
    let mut pinned = properties.clone();
    if let Some(previous) = pinned.insert(OUTPUT_FORMAT_KEY.to_string(), OUTPUT_FORMAT.to_string())
        && previous != OUTPUT_FORMAT
    {
        warn!("overriding {OUTPUT_FORMAT_KEY}={previous} with {OUTPUT_FORMAT}");
    }
    pinned
}

/// Accepts what `-Xmx` accepts: digits with an optional k, m, g or t suffix.
fn validate_memory_size(size: &str) -> Result<(), Error> {
    let digits = size.trim_end_matches(['k', 'K', 'm', 'M', 'g', 'G', 't', 'T']);
    let suffix_len = size.len() - digits.len();
    if digits.is_empty() || suffix_len > 1 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Configuration(format!(
            "invalid memory size {size:?}, expected e.g. 512m or 3g"
        )));
    }
    Ok(())
}

fn default_java_path() -> PathBuf {
    match std::env::var_os("JAVA_HOME").filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home).join("bin").join("java"),
        None => PathBuf::from("java"),
    }
}
