//! NBT error types.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Error produced while encoding or decoding NBT.
#[derive(Debug, Error)]
pub enum NbtError {
    /// Underlying reader/writer failed, including truncated input.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Tag id outside the known range.
    #[error("unknown tag type: {0}")]
    UnknownTag(u8),

    /// Array, list, or string length was negative.
    #[error("negative length: {0}")]
    NegativeLength(i32),

    /// Compounds/lists nested beyond the decoder limit.
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),

    /// String payload was not valid UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// String does not fit the `u16` length prefix.
    #[error("string too long: {len} > {max}")]
    StringTooLong { len: usize, max: usize },

    /// A document cannot start with `TAG_End`.
    #[error("root tag cannot be TAG_End")]
    RootEnd,

    /// Non-empty list declared with element type `TAG_End`.
    #[error("list of TAG_End with {0} elements")]
    UntypedList(i32),

    /// Input is neither gzip nor zlib.
    #[error("unrecognised compression header")]
    UnknownCompression,
}

/// Result type for NBT operations.
pub type Result<T> = std::result::Result<T, NbtError>;
