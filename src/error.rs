pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
pub enum Error {
    /// The member key does not exist (unpinned) or does not exist at the
    /// pinned transaction (pinned) at ZAdd time. Caller-correctable.
    ReferenceMismatch,
    /// The referenced key is absent at the resolution point.
    KeyNotFound,
    /// The requested transaction id was never committed.
    TxNotFound(u64),
    /// Content hash of a random-access read did not match the stored digest.
    /// Data-integrity failure; never retried.
    HashMismatch,
    /// Stored bytes (value pointer, reference payload, encoded value) could
    /// not be decoded.
    Corrupted(String),
    /// Typed values of different non-null variants cannot be compared.
    NotComparable,
    /// Declared operation that this version does not implement.
    Unsupported(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ReferenceMismatch => write!(f, "Reference key mismatch"),
            Error::KeyNotFound => write!(f, "Key not found"),
            Error::TxNotFound(id) => write!(f, "Transaction {} not found", id),
            Error::HashMismatch => write!(f, "Content hash mismatch"),
            Error::Corrupted(msg) => write!(f, "Corrupted data: {}", msg),
            Error::NotComparable => write!(f, "Values are not comparable"),
            Error::Unsupported(op) => write!(f, "Functionality not yet supported: {}", op),
        }
    }
}

impl std::error::Error for Error {}
