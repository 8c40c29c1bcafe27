//! Error types for the isolation engine

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown search variant '{0}' (expected 'minimax' or 'alphabeta')")]
    UnknownSearch(String),

    #[error("unknown heuristic '{0}' (expected 'liberties' or 'area')")]
    UnknownHeuristic(String),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("illegal move: {action}")]
    IllegalMove { action: String },

    /// The stop flag was raised while a depth was still being searched.
    #[error("search interrupted")]
    Interrupted,

    #[error("move sink closed")]
    SinkClosed,

    #[error("search worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
