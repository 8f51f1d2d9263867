//! Level error types.

use thiserror::Error;

/// Level persistence error type.
#[derive(Debug, Error)]
pub enum LevelError {
    /// `level.dat` is not a document, its root is not a compound, or it has
    /// no `Data` compound.
    #[error("invalid level.dat: {0}")]
    InvalidFormat(String),

    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A required field holds a different tag type.
    #[error("field {field} is not a {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Document encoding failed.
    #[error("nbt error: {0}")]
    Nbt(#[from] mc_nbt::NbtError),

    /// Chunk worker used out of order (started twice, or after stop).
    #[error("chunk worker {0}")]
    WorkerState(&'static str),
}

/// Result type for level operations.
pub type LevelResult<T> = Result<T, LevelError>;
