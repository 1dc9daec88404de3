use sit_types::ObjectId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object {0} is not in the store")]
    NotFound(ObjectId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The bytes decompressed but do not parse as the requested kind.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The all-zero id is reserved for "no content".
    #[error("refusing to store an object under the empty id")]
    EmptyObjectId,
}

impl From<sit_crypto::HasherError> for StoreError {
    fn from(err: sit_crypto::HasherError) -> Self {
        match err {
            sit_crypto::HasherError::Io(e) => Self::Io(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
