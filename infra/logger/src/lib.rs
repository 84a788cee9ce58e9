//! # Logger
//!
//! Installs the global `tracing` subscriber for Warren hosts: an `EnvFilter`, a console
//! layer and an optional non-blocking rolling file layer.
//!
//! * Filtering starts from a default level, adds any number of
//!   [`directives`](LoggerBuilder::directive) and finally honours `RUST_LOG`.
//! * Console output is compact by default; [`ConsoleFormat`] switches it to pretty or JSON.
//! * File output is described by [`FileOutput`] and keeps its own worker thread alive
//!   through the returned [`Logger`] handle.
//!
//! ## Example
//!
//! ```rust
//! # use warren_logger::{ConsoleFormat, LevelFilter, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("warren-demo")
//!     .level(LevelFilter::DEBUG)
//!     .directive("warren_kernel=trace")
//!     .console(ConsoleFormat::Compact)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// Console rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Rolling file destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl FileOutput {
    /// Daily rotation, ten files kept, plain text.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), rotation: Rotation::DAILY, max_files: DEFAULT_MAX_FILES, json: false }
    }

    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[derive(Debug, Clone)]
struct Settings {
    level: LevelFilter,
    directives: Vec<String>,
    console: Option<ConsoleFormat>,
    file: Option<FileOutput>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            directives: Vec::new(),
            console: Some(ConsoleFormat::Compact),
            file: None,
        }
    }
}

/// Builder state before a name is given.
#[derive(Debug)]
pub struct Unnamed;

/// Builder state once the log name is known.
#[derive(Debug)]
pub struct Named(String);

/// A builder for the global tracing subscriber. [`init`](LoggerBuilder::init) is only
/// available once a [`name`](LoggerBuilder::name) is set.
#[derive(Debug)]
pub struct LoggerBuilder<N = Unnamed> {
    settings: Settings,
    name: N,
}

impl LoggerBuilder<Unnamed> {
    /// Names the log stream. Also used as the rolling file prefix.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named> {
        LoggerBuilder { settings: self.settings, name: Named(name.into()) }
    }
}

impl<N> LoggerBuilder<N> {
    #[must_use = "The builder must be initialized to install the subscriber."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Adds one filter directive such as `warren_kernel=debug`.
    ///
    /// Several directives may be joined with commas. Invalid ones fail
    /// [`LoggerBuilder::init`].
    #[must_use = "The builder must be initialized to install the subscriber."]
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        let directive = directive.into();
        self.settings.directives.extend(
            directive.split(',').map(str::trim).filter(|d| !d.is_empty()).map(ToOwned::to_owned),
        );
        self
    }

    #[must_use = "The builder must be initialized to install the subscriber."]
    pub const fn console(mut self, format: ConsoleFormat) -> Self {
        self.settings.console = Some(format);
        self
    }

    #[must_use = "The builder must be initialized to install the subscriber."]
    pub const fn without_console(mut self) -> Self {
        self.settings.console = None;
        self
    }

    #[must_use = "The builder must be initialized to install the subscriber."]
    pub fn file(mut self, output: FileOutput) -> Self {
        self.settings.file = Some(output);
        self
    }
}

impl LoggerBuilder<Named> {
    /// Installs the subscriber globally.
    ///
    /// # Returns
    /// A [`Logger`] handle. Keep it alive for the lifetime of the process: dropping it
    /// stops the background file writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, a file output keeping
    ///   zero files, a bad directive, or no enabled output at all.
    /// * [`LoggerError::Appender`] if the rolling file cannot be opened.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: Named(name) } = self;
        validate(&settings, &name)?;

        let filter = env_filter(&settings)?;
        let mut layers = Vec::new();

        match settings.console {
            Some(ConsoleFormat::Compact) => layers.push(layer().compact().with_ansi(true).boxed()),
            Some(ConsoleFormat::Pretty) => layers.push(layer().pretty().boxed()),
            Some(ConsoleFormat::Json) => layers.push(layer().json().boxed()),
            None => {},
        }

        let guard = match settings.file {
            Some(output) => {
                fs::create_dir_all(&output.dir).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Failed to create {}", output.dir.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(output.rotation)
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(output.max_files)
                    .build(&output.dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if output.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No output enabled, configure console or file logging".into(),
                context: Some(name.into()),
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { name, guard })
    }
}

/// Handle to the installed logging system.
#[must_use = "Dropping this handle stops the background file writer."]
#[derive(Debug)]
pub struct Logger {
    name: String,
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring the global subscriber.
    ///
    /// ```rust
    /// use warren_logger::{FileOutput, Logger};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let logger = Logger::builder()
    ///     .name("warren-doc")
    ///     .without_console()
    ///     .file(FileOutput::new(dir.path()).json(true))
    ///     .init()
    ///     .unwrap();
    /// assert!(logger.writes_files());
    /// ```
    #[must_use = "The builder must be initialized to install the subscriber."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: Unnamed }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a rolling file writer is attached.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!(logger = %self.name, "Flushing log files");
        }
    }
}

/// Parses a level name (`trace`..`error`, `off`), case-insensitively.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for unknown names.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim()).map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("Unknown log level '{level}': {e}").into(),
        context: None,
    })
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if settings.file.as_ref().is_some_and(|f| f.max_files == 0) {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: Some(name.to_owned().into()),
        });
    }
    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let mut filter =
        EnvFilter::builder().with_default_directive(settings.level.into()).from_env_lossy();
    for directive in &settings.directives {
        let parsed = directive.parse::<Directive>().map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Invalid filter directive '{directive}': {e}").into(),
            context: None,
        })?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_are_split() {
        let builder = Logger::builder().directive("warren_kernel=debug, tower_http=info,");
        assert_eq!(builder.settings.directives, ["warren_kernel=debug", "tower_http=info"]);
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        let settings = Settings { directives: vec!["warren_kernel=verbose".to_owned()], ..Settings::default() };
        let err = env_filter(&settings).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_zero_max_files_is_rejected() {
        let settings =
            Settings { file: Some(FileOutput::new("logs").max_files(0)), ..Settings::default() };
        assert!(validate(&settings, "warren").is_err());
        assert!(validate(&Settings::default(), " ").is_err());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_no_output_is_rejected() {
        let err = Logger::builder().name("silent").without_console().init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
