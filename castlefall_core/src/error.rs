use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read word list directory {path}: {source}")]
    WordListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read word list {path}: {source}")]
    WordListFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a room refused to start the next round.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("round out of sync (room is at {current}, request was for {requested:?})")]
    RoundOutOfSync {
        current: u64,
        requested: Option<u64>,
    },

    #[error("too soon after the previous start")]
    TooSoon,

    #[error("no word list was named")]
    MissingWordList,

    #[error("unknown word list '{0}'")]
    UnknownWordList(String),

    #[error("word list '{name}' has {available} words, at least 2 are needed")]
    NotEnoughWords { name: String, available: usize },
}
