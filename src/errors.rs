// src/errors.rs
use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data directory error: {0}")]
    DataDir(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error accessing path '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("Console I/O error: {0}")]
    Console(#[from] std::io::Error),

    #[error("Incident file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io { path: path.into(), source }
    }
}

pub type AppResult<T> = Result<T, AppError>;
