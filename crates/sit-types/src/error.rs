use thiserror::Error;

/// A string that does not parse as a 40-character hex id.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("not a hex id: {input:?}")]
    NotHex { input: String },

    #[error("id has {digits} hex digits, expected 40")]
    WrongLength { digits: usize },
}
