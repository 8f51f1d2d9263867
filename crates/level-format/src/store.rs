//! Chunk storage backends, driven from the worker thread.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::fs::write_atomic;
use crate::{Chunk, ChunkPos, LevelResult};

/// Reads and writes single chunks.
///
/// Implementations run on the chunk worker thread and may block.
pub trait ChunkStore: Send + 'static {
    /// Load the chunk at `pos`, or `None` if nothing is stored there.
    fn load(&mut self, pos: ChunkPos) -> LevelResult<Option<Chunk>>;

    /// Persist `chunk`, replacing any previous contents at its coordinate.
    fn save(&mut self, chunk: &Chunk) -> LevelResult<()>;

    /// Make every completed save durable.
    fn flush(&mut self) -> LevelResult<()>;
}

/// One file per chunk: `<dir>/c.<x>.<z>.bin`.
#[derive(Debug, Clone)]
pub struct FileChunkStore {
    dir: PathBuf,
}

impl FileChunkStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> LevelResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn chunk_path(&self, pos: ChunkPos) -> PathBuf {
        self.dir.join(format!("c.{}.{}.bin", pos.x, pos.z))
    }
}

impl ChunkStore for FileChunkStore {
    fn load(&mut self, pos: ChunkPos) -> LevelResult<Option<Chunk>> {
        match fs::read(self.chunk_path(pos)) {
            Ok(bytes) => {
                trace!("Read chunk {} ({} bytes)", pos, bytes.len());
                Ok(Some(Chunk::new(pos, bytes)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, chunk: &Chunk) -> LevelResult<()> {
        write_atomic(&self.chunk_path(chunk.pos), &chunk.payload)?;
        trace!("Wrote chunk {} ({} bytes)", chunk.pos, chunk.payload.len());
        Ok(())
    }

    fn flush(&mut self) -> LevelResult<()> {
        // each save is synced before its rename
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileChunkStore::open(dir.path().join("chunks")).unwrap();

        let chunk = Chunk::new(ChunkPos::new(-1, 4), vec![1u8, 2, 3]);
        store.save(&chunk).unwrap();

        assert_eq!(store.load(ChunkPos::new(-1, 4)).unwrap(), Some(chunk));
        assert!(store.chunk_path(ChunkPos::new(-1, 4)).ends_with("c.-1.4.bin"));
    }

    #[test]
    fn test_missing_chunk_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileChunkStore::open(dir.path()).unwrap();
        assert_eq!(store.load(ChunkPos::new(9, 9)).unwrap(), None);
    }
}
