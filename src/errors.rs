// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChainwatchError {
    /// Process exit code for this error when it escapes `run`.
    ///
    /// Startup configuration problems exit with 2; anything that goes wrong
    /// after the pipeline is up exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ChainwatchError::ConfigError(_) | ChainwatchError::JsonError(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChainwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let err = ChainwatchError::ConfigError("no command chain".into());
        assert_eq!(err.exit_code(), 2);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ChainwatchError::from(json_err).exit_code(), 2);
    }

    #[test]
    fn runtime_errors_exit_with_one() {
        let err = ChainwatchError::from(std::io::Error::other("boom"));
        assert_eq!(err.exit_code(), 1);
    }
}
