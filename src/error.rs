//! Error type shared by the broadcaster and the aggregator.

use thiserror::Error;

use crate::mapsort::SortError;

#[derive(Debug, Error)]
pub enum Error {
    /// The broadcaster could not bind its listener.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// A `name=endpoint` argument was malformed.
    #[error("invalid source {0:?}: expected NAME=ENDPOINT")]
    InvalidSource(String),

    /// Two sources share a name and would overwrite each other's readings.
    #[error("source name {0:?} given more than once")]
    DuplicateSource(String),

    /// None of the configured sources accepted a connection.
    #[error("no source could be reached ({})", .0.join(", "))]
    NoReachableSources(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sort(#[from] SortError),
}

pub type Result<T> = std::result::Result<T, Error>;
