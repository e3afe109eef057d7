//! Logging setup for Vox skills.
//!
//! One `tracing-subscriber` registry with an [`EnvFilter`] and a single fmt
//! layer whose format and destination come from [`LoggingConfig`]. The binder
//! emits a `debug` span named `invoke` per invocation and [`Skill`](crate::Skill)
//! an `info` span named `skill.handle` per request; [`SpanEvents`] selects
//! which of their lifecycle events are printed.
//!
//! ```rust,ignore
//! use vox_runtime::logging::{LoggingBuilder, SpanEvents};
//! use vox_runtime::config::LogLevel;
//!
//! LoggingBuilder::new()
//!     .level(LogLevel::Debug)
//!     .filter("vox_framework", LogLevel::Trace)
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    /// Includes the span's busy and idle time.
    pub close: bool,
}

impl SpanEvents {
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// When each invocation starts and how long it took.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };
}

impl From<SpanEvents> for FmtSpan {
    fn from(events: SpanEvents) -> Self {
        [
            (events.new, FmtSpan::NEW),
            (events.enter, FmtSpan::ENTER),
            (events.exit, FmtSpan::EXIT),
            (events.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// A subscriber that is already installed is left in place.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Builder for the global subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: LogLevel,
    filters: Vec<(String, LogLevel)>,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    target: bool,
    thread_ids: bool,
    file_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            level: LogLevel::Info,
            filters: Vec::new(),
            directives: Vec::new(),
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            target: true,
            thread_ids: false,
            file_location: false,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut filters: Vec<_> = config
            .filters
            .iter()
            .map(|(module, level)| (module.clone(), *level))
            .collect();
        filters.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            level: config.level,
            filters,
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            thread_ids: config.thread_ids,
            file_location: config.file_location,
            ..Self::new()
        }
    }

    /// Base level for every target without a more specific filter.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the level of one module, e.g. `vox_framework`.
    pub fn filter(mut self, module: impl Into<String>, level: LogLevel) -> Self {
        self.filters.push((module.into(), level));
        self
    }

    /// Adds a raw `EnvFilter` directive such as `vox_framework::binder=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn target(mut self, enabled: bool) -> Self {
        self.target = enabled;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Prints the source file and line of every event.
    pub fn file_location(mut self, enabled: bool) -> Self {
        self.file_location = enabled;
        self
    }

    /// Module filters followed by raw directives, in the order they apply.
    fn directive_strings(&self) -> Vec<String> {
        self.filters
            .iter()
            .map(|(module, level)| format!("{module}={level}"))
            .chain(self.directives.iter().cloned())
            .collect()
    }

    fn build_filter(&self) -> EnvFilter {
        // RUST_LOG directives win over the configured base level
        let base = LevelFilter::from_level(self.level.to_tracing_level());
        let mut filter = EnvFilter::builder()
            .with_default_directive(base.into())
            .from_env_lossy();

        for directive in self.directive_strings() {
            match directive.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(e) => warn!(directive = %directive, error = %e, "Ignoring invalid log directive"),
            }
        }
        filter
    }

    fn make_writer(&self) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => BoxMakeWriter::new(tracing_appender::rolling::never(
                path.parent().unwrap_or_else(|| Path::new(".")),
                path.file_name().unwrap_or_else(|| OsStr::new("vox.log")),
            )),
            (LogOutput::File, None) => {
                warn!("File output requested without a file path, logging to stdout");
                BoxMakeWriter::new(std::io::stdout)
            }
        }
    }

    fn fmt_layer(&self) -> BoxedLayer {
        let layer = fmt::layer::<Registry>()
            .with_writer(self.make_writer())
            .with_span_events(self.span_events.into())
            .with_target(self.target)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(self.build_filter())
            .try_init()
    }
}
