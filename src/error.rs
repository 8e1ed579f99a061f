//! crate wide error type

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the vectorizer, the database store and the search orchestrator.
/// Vectorizer and store errors are returned to the caller immediately, there is no retry.
#[derive(Error, Debug)]
pub enum CompError {
    /// a sequence has no residue left once foreign symbols are stripped (or was empty to begin with)
    #[error("sequence '{label}' is empty after foreign symbol removal")]
    EmptySequence { label: String },

    /// a persisted database line could not be parsed
    #[error("corrupt database {path:?} line {line} : {reason}")]
    CorruptDatabase {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// a loaded vector does not have the dimension of the current alphabet
    #[error("database dimension mismatch : expected {expected} frequency fields, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("fasta parse error in {path:?} : {msg}")]
    Fasta { path: PathBuf, msg: String },

    #[error("io error : {0}")]
    Io(#[from] std::io::Error),

    #[error("json error : {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error : {0}")]
    Csv(#[from] csv::Error),
} // end of CompError
