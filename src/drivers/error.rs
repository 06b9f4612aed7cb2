use std::io;
use thiserror::Error;
/// A line that could not be turned into a sweep segment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected at least 6 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: String, value: String },
    #[error("line carries no power values")]
    NoPowerValues,
}
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("sweep tool stdout was not captured")]
    MissingStdout,
    #[error("sweep stream i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0} lock poisoned")]
    Synchronization(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("ingestion worker panicked")]
    WorkerPanicked,
}
