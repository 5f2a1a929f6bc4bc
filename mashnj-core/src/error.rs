use std::io;
use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MashError {
    #[error("cannot read distance directory {path}: {source}")]
    DirRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open distance file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot create {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("tsv parse error in {path}: {source}")]
    TsvParse {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: missing {field} field (line has {found} fields, expected at least 3)")]
    MissingField {
        path: String,
        line: u64,
        field: &'static str,
        found: usize,
    },

    #[error("{path}:{line}: invalid distance '{value}': {source}")]
    InvalidDistance {
        path: String,
        line: u64,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("no distance recorded between '{a}' and '{b}'")]
    UnmeasuredPair { a: String, b: String },

    #[error("need at least 2 taxa to build a tree, got {n}")]
    TooFewTaxa { n: usize },

    #[error("distance matrix shape mismatch: {msg}")]
    ShapeMismatch { msg: String },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type MashResult<T> = Result<T, MashError>;
