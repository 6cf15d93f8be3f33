//! Top level error type for the fatal cases that abort the whole parse.
//!
//! Per-cell and per-page corruption is not represented here: it is handled
//! locally (the offending cell or page is dropped and a `log::warn!` is
//! emitted when `--debug` is on) so that one bad record never aborts
//! recovery of the rest of the file. See `database.rs`.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error reading database file: {0}")]
    FileIo(#[from] std::io::Error),
    #[error("Not a SQLite database: missing or wrong magic header string.")]
    NotADatabase,
    #[error("Unsupported combination of configuration options: {0}")]
    UnsupportedConfiguration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
