//! Error types for the coverage navigator

use thiserror::Error;

/// Navigator error type
#[derive(Error, Debug)]
pub enum StcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The robot did not come up within the configured retry window.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A motion or sensor request was rejected by the robot.
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Map error: {0}")]
    Map(String),
}

impl From<toml::de::Error> for StcError {
    fn from(e: toml::de::Error) -> Self {
        StcError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StcError>;
