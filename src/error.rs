//! Error types for LaTeX rendering and measurement

use std::fmt;

use thiserror::Error;

/// Result type alias for render and measure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Context marker carried by every failure that Render or Measure reports.
pub const LATEX_FAILURE: &str = "latex failed to parse";

/// Step of the engine bootstrap sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    /// Creating the sandbox instance itself
    Create,
    /// Running the compatibility/polyfill payload
    Polyfills,
    /// Running the typesetting engine bundle
    Typesetter,
    /// Running the setup script that wires up the adaptor
    Setup,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapStage::Create => "sandbox creation",
            BootstrapStage::Polyfills => "polyfills",
            BootstrapStage::Typesetter => "typesetting bundle",
            BootstrapStage::Setup => "setup script",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while rendering or measuring LaTeX
#[derive(Error, Debug)]
pub enum Error {
    /// A script in the bootstrap sequence failed
    #[error("latex failed to parse: engine bootstrap failed at {stage}: {message}")]
    EngineBootstrap {
        stage: BootstrapStage,
        message: String,
    },

    /// The typesetting call or its stringification failed
    #[error("latex failed to parse: conversion failed: {0}")]
    Conversion(String),

    /// The rendered document had no single usable width/height declaration
    #[error("latex failed to parse: svg parsing failed for latex: {0}")]
    SvgParse(String),

    /// Low-level sandbox failure (script threw, worker died)
    #[error("Script execution failed: {0}")]
    Script(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-imposed deadline elapsed
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// Whether the error carries the [`LATEX_FAILURE`] marker.
    pub fn is_latex_failure(&self) -> bool {
        matches!(
            self,
            Error::EngineBootstrap { .. } | Error::Conversion(_) | Error::SvgParse(_)
        )
    }

    pub(crate) fn bootstrap(stage: BootstrapStage, err: impl fmt::Display) -> Self {
        Error::EngineBootstrap {
            stage,
            message: err.to_string(),
        }
    }
}
