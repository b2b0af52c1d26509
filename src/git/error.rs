use thiserror::Error;

/// An entry that cannot be placed in the file tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("malformed entry {path:?}: {reason}")]
    MalformedEntry { path: String, reason: &'static str },
}

/// A tree listing that cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("invalid ls-tree record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}
