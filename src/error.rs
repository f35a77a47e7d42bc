/*
 * Error Module
 *
 * Errors that can stop the simulation from starting. Nothing in the per-frame
 * path returns an error: the integrators are pure numerical code and guard
 * their own degenerate cases.
 */

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for logomorph operations
#[derive(Debug, Error)]
pub enum MorphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode logo image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Logo '{name}' produced no visible points")]
    EmptyLogo { name: String },

    #[error("Logo '{logo}' has {got} points, expected {expected}")]
    PointCountMismatch {
        logo: String,
        expected: usize,
        got: usize,
    },
}

/// Result type alias for logomorph operations
pub type Result<T> = std::result::Result<T, MorphError>;
