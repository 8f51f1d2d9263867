//! A level on disk: metadata plus a running chunk worker.

use std::fs;
use std::path::Path;

use tracing::{info, trace};

use crate::{
    BlockPos, BuiltinGenerators, Chunk, ChunkIo, ChunkLoad, ChunkPos, ChunkWorker,
    FileChunkStore, GeneratorRegistry, LevelConfig, LevelData, LevelResult, LevelSettings,
};

/// An open level.
///
/// Opening loads and repairs `level.dat` and starts the chunk worker.
/// [`LevelProvider::close`] (or dropping the provider) stops the worker after
/// it finishes queued saves. Metadata is only written by
/// [`LevelProvider::save_metadata`].
pub struct LevelProvider<W: ChunkIo = ChunkWorker<FileChunkStore>> {
    level: LevelData,
    chunks: W,
}

impl LevelProvider {
    /// Open the level in `dir` with the builtin generators and per-file chunk
    /// storage.
    pub fn open(dir: impl AsRef<Path>) -> LevelResult<Self> {
        Self::open_config(&LevelConfig::new(dir.as_ref()))
    }

    /// The chunk directory is only created once `level.dat` has loaded.
    pub fn open_config(config: &LevelConfig) -> LevelResult<Self> {
        let level = load_level(config, &BuiltinGenerators::new())?;
        let store = FileChunkStore::open(config.chunk_path())?;
        Self::with_level(level, ChunkWorker::new(store))
    }

    /// Write a new `level.dat` into `config.dir`, then open it.
    pub fn create(config: &LevelConfig, settings: &LevelSettings) -> LevelResult<Self> {
        LevelData::create(config, settings, &BuiltinGenerators::new())?;
        Self::open_config(config)
    }
}

impl<W: ChunkIo> LevelProvider<W> {
    /// Open with an explicit registry and chunk worker.
    ///
    /// `chunks` must not have been started; it is started once metadata has
    /// loaded.
    pub fn open_with(
        config: &LevelConfig,
        registry: &dyn GeneratorRegistry,
        chunks: W,
    ) -> LevelResult<Self> {
        let level = load_level(config, registry)?;
        Self::with_level(level, chunks)
    }

    fn with_level(level: LevelData, mut chunks: W) -> LevelResult<Self> {
        chunks.start()?;

        info!(
            "Opened level {} at {}",
            level.name().unwrap_or("<unnamed>"),
            level.dir().display()
        );
        Ok(Self { level, chunks })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.level.dir()
    }

    pub fn name(&self) -> LevelResult<&str> {
        self.level.name()
    }

    #[must_use]
    pub fn time(&self) -> i64 {
        self.level.time()
    }

    pub fn set_time(&mut self, ticks: i64) {
        self.level.set_time(ticks);
    }

    pub fn seed(&self) -> LevelResult<i64> {
        self.level.seed()
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.level.set_seed(seed);
    }

    pub fn spawn(&self) -> LevelResult<BlockPos> {
        self.level.spawn()
    }

    pub fn set_spawn(&mut self, pos: impl Into<BlockPos>) {
        self.level.set_spawn(pos);
    }

    pub fn generator_name(&self) -> LevelResult<&str> {
        self.level.generator_name()
    }

    pub fn generator_options(&self) -> LevelResult<&str> {
        self.level.generator_options()
    }

    #[must_use]
    pub fn level_data(&self) -> &LevelData {
        &self.level
    }

    pub fn level_data_mut(&mut self) -> &mut LevelData {
        &mut self.level
    }

    /// Persist the in-memory metadata to `level.dat`.
    pub fn save_metadata(&self) -> LevelResult<()> {
        self.level.save()
    }

    pub fn request_chunk_load(&self, x: i32, z: i32) {
        self.chunks.request_load(ChunkPos::new(x, z));
    }

    pub fn request_chunk_save(&self, chunk: Chunk) {
        self.chunks.request_save(chunk);
    }

    /// Take one finished chunk load, if any is ready.
    pub fn buffered_chunk(&self) -> Option<ChunkLoad> {
        self.chunks.poll_completed_load()
    }

    #[must_use]
    pub fn has_buffered_chunks(&self) -> bool {
        self.chunks.has_pending()
    }

    /// Periodic maintenance hook. Nothing to reclaim yet.
    pub fn garbage_collection(&mut self) {
        trace!("Level garbage collection for {}", self.path().display());
    }

    #[must_use]
    pub fn chunk_io(&self) -> &W {
        &self.chunks
    }

    /// Stop the chunk worker, waiting for queued saves. Does not save
    /// metadata.
    pub fn close(mut self) {
        self.chunks.stop();
        info!("Closed level at {}", self.path().display());
    }
}

/// Create the level directory if missing, then load and repair `level.dat`.
fn load_level(config: &LevelConfig, registry: &dyn GeneratorRegistry) -> LevelResult<LevelData> {
    if !config.dir.exists() {
        fs::create_dir_all(&config.dir)?;
    }
    LevelData::load(config, registry)
}

impl<W: ChunkIo> Drop for LevelProvider<W> {
    fn drop(&mut self) {
        self.chunks.stop();
    }
}
