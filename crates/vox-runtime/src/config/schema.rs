//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillConfig {
    /// Identity of the skill.
    #[serde(default)]
    pub skill: SkillInfo,

    /// Argument binding defaults.
    #[serde(default)]
    pub binder: BinderConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity of the skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Skill name, used in log spans.
    #[serde(default = "default_skill_name")]
    pub name: String,

    /// Skill version, reported at startup.
    #[serde(default = "default_skill_version")]
    pub version: String,

    /// Locales the skill answers in. Requests for other locales are still
    /// handled, with a warning.
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

impl Default for SkillInfo {
    fn default() -> Self {
        Self {
            name: default_skill_name(),
            version: default_skill_version(),
            locales: default_locales(),
        }
    }
}

fn default_skill_name() -> String {
    "vox-skill".to_string()
}

fn default_skill_version() -> String {
    "0.1.0".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string()]
}

/// Argument binding defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinderConfig {
    /// Policy of intents registered without an explicit one: conversion
    /// failures are delivered as values when `true`, raised when `false`.
    #[serde(default = "default_silent")]
    pub silent: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            silent: default_silent(),
        }
    }
}

fn default_silent() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Written to `logging.file_path`.
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    /// A span was created.
    #[serde(default)]
    pub new: bool,
    /// A span was entered.
    #[serde(default)]
    pub enter: bool,
    /// A span was exited.
    #[serde(default)]
    pub exit: bool,
    /// A span was closed, with its busy and idle time.
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format of every event.
    #[serde(default)]
    pub format: LogFormat,

    /// Where log lines are written.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Span lifecycle events to log, all off by default.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include the id of the emitting thread.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `vox_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
