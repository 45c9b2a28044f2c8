//! Error types for the application crate.

use std::path::PathBuf;

use motion_core::CoreError;
use motion_synth::SynthError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Problems with the configuration file or command-line overrides.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialise config: {0}")]
    Serialise(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error("window error: {0}")]
    Window(String),

    #[error("no image files in {0}")]
    EmptySequence(PathBuf),
}
