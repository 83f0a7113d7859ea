// (C) 2025 - Enzo Lombardi

//! Error types for engine operations.
//!
//! This module provides the main error types used throughout the crate,
//! with backtrace support and context preservation.

use std::backtrace::Backtrace;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Error type for engine operations.
///
/// Wraps error kinds with backtrace support for debugging.
///
/// # Examples
///
/// ```rust,no_run
/// use termsplash::core::error::Result;
///
/// fn init_engine() -> Result<()> {
///     // Operations that can fail
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct SplashError {
    kind: ErrorKind,
    backtrace: Backtrace,
}

/// The specific kind of error that occurred.
#[derive(Debug)]
pub(crate) enum ErrorKind {
    /// I/O operation failed
    Io(std::io::Error),

    /// Terminal initialization failed (non-TTY, raw mode refused)
    TerminalInit(String),

    /// Invalid input provided (bad fps, unknown theme on the CLI, ...)
    InvalidInput(String),

    /// A scene-graph layer name was registered twice
    DuplicateLayer(String),

    /// Config file operation failed
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SplashError {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates a terminal initialization error.
    pub(crate) fn terminal_init(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TerminalInit(msg.into()))
    }

    /// Creates an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput(msg.into()))
    }

    /// Creates a duplicate-layer error.
    pub(crate) fn duplicate_layer(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateLayer(name.into()))
    }

    /// Creates a config file error.
    pub(crate) fn config_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::ConfigFile {
            path: path.into(),
            source,
        })
    }

    /// Returns `true` if this error is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io(_))
    }

    /// Returns `true` if this error is a terminal initialization error.
    pub fn is_terminal_init(&self) -> bool {
        matches!(self.kind, ErrorKind::TerminalInit(_))
    }

    /// Returns `true` if this error is an invalid input error.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidInput(_))
    }

    /// Returns `true` if this error is a duplicate-layer error.
    pub fn is_duplicate_layer(&self) -> bool {
        matches!(self.kind, ErrorKind::DuplicateLayer(_))
    }

    /// Returns the config file path if this is a config file error.
    pub fn config_path(&self) -> Option<&std::path::Path> {
        match &self.kind {
            ErrorKind::ConfigFile { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl Display for SplashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Io(e) => write!(f, "I/O error: {}", e)?,
            ErrorKind::TerminalInit(msg) => write!(f, "Terminal initialization failed: {}", msg)?,
            ErrorKind::InvalidInput(msg) => write!(f, "Invalid input: {}", msg)?,
            ErrorKind::DuplicateLayer(name) => write!(f, "Duplicate scene layer: '{}'", name)?,
            ErrorKind::ConfigFile { path, source } => {
                write!(f, "Config file operation failed for '{}': {}", path.display(), source)?;
            }
        }

        // Include backtrace if captured
        if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            write!(f, "\n\nBacktrace:\n{}", self.backtrace)?;
        }

        Ok(())
    }
}

impl std::error::Error for SplashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::ConfigFile { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SplashError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(e))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SplashError>;
