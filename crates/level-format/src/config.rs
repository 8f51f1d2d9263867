use std::path::PathBuf;

use mc_nbt::Compression;

/// Default gzip level for `level.dat`.
pub const DEFAULT_COMPRESSION: u32 = 6;

/// Subdirectory holding chunk files.
pub const DEFAULT_CHUNK_DIR: &str = "chunks";

/// Where a level lives and how it is written.
#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// Level directory; `level.dat` is stored directly inside.
    pub dir: PathBuf,
    /// gzip level (0-9) for `level.dat`.
    pub compression: u32,
    /// Chunk subdirectory, relative to `dir`.
    pub chunk_dir: String,
}

impl LevelConfig {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            compression: DEFAULT_COMPRESSION,
            chunk_dir: DEFAULT_CHUNK_DIR.to_string(),
        }
    }

    /// Read `LEVEL_DIR` and `LEVEL_COMPRESSION`, falling back to `world`
    /// and the default level.
    #[must_use]
    pub fn from_env() -> Self {
        let dir = std::env::var("LEVEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("world"));

        let compression: u32 = std::env::var("LEVEL_COMPRESSION")
            .ok()
            .and_then(|c| c.parse().ok())
            .unwrap_or(DEFAULT_COMPRESSION);

        Self::new(dir).with_compression(compression)
    }

    /// Set the gzip level, clamped to 0-9.
    #[must_use]
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = level.min(9);
        self
    }

    #[must_use]
    pub fn compression(&self) -> Compression {
        Compression::new(self.compression)
    }

    #[must_use]
    pub fn chunk_path(&self) -> PathBuf {
        self.dir.join(&self.chunk_dir)
    }
}
