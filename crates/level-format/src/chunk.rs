//! Chunks as seen by the I/O layer: an opaque payload at a coordinate.

use bytes::Bytes;

use crate::{ChunkPos, LevelError};

/// Serialized chunk contents.
///
/// The payload is immutable once built, so a chunk handed to the worker
/// cannot be changed underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub pos: ChunkPos,
    pub payload: Bytes,
}

impl Chunk {
    #[must_use]
    pub fn new(pos: ChunkPos, payload: impl Into<Bytes>) -> Self {
        Self {
            pos,
            payload: payload.into(),
        }
    }
}

/// Outcome of one load request, taken from the worker's completion queue.
#[derive(Debug)]
pub enum ChunkLoad {
    /// The chunk was stored and has been read.
    Loaded(Chunk),
    /// Nothing is stored at this coordinate yet.
    Absent(ChunkPos),
    /// Reading the chunk failed.
    Failed { pos: ChunkPos, error: LevelError },
}

impl ChunkLoad {
    /// Coordinate this result answers.
    #[must_use]
    pub fn pos(&self) -> ChunkPos {
        match self {
            Self::Loaded(chunk) => chunk.pos,
            Self::Absent(pos) | Self::Failed { pos, .. } => *pos,
        }
    }

    /// The loaded chunk, if there was one.
    #[must_use]
    pub fn into_chunk(self) -> Option<Chunk> {
        match self {
            Self::Loaded(chunk) => Some(chunk),
            Self::Absent(_) | Self::Failed { .. } => None,
        }
    }
}
