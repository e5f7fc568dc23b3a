//! Typed failures. Only load-time and depth-guard failures exist; everything
//! else that can go wrong while walking a model is recovered where it happens.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("glob pattern matched no files: {0}")]
    NoMatches(String),

    #[error("unreadable glob entry: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("jq filter failed on {path}: {message}")]
    Jq { path: PathBuf, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("widget configuration nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },
}

#[derive(Debug, Error)]
pub enum ModelXrefError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

pub type Result<T, E = ModelXrefError> = std::result::Result<T, E>;
