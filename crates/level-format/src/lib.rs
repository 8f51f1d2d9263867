//! Level storage: `level.dat` metadata and background chunk I/O.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  LevelProvider                                                      │
//! │    - Owns the level directory                                       │
//! │    - Loads + repairs level.dat on open                              │
//! │    - Forwards chunk requests to the worker                          │
//! └─────────────────────────────────────────────────────────────────────┘
//!            │                                     │
//!            ▼                                     ▼
//! ┌──────────────────────────────┐   ┌──────────────────────────────────┐
//! │  LevelData                   │   │  ChunkWorker (ChunkIo)           │
//! │    - Data compound in memory │   │    - chunk-io thread             │
//! │    - typed field access      │   │    - request / completion queues │
//! │    - explicit save           │   │    - drives a ChunkStore         │
//! └──────────────────────────────┘   └──────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use level_format::{Chunk, ChunkPos, LevelProvider};
//!
//! let mut level = LevelProvider::open("world")?;
//! level.set_time(level.time() + 20);
//!
//! level.request_chunk_save(Chunk::new(ChunkPos::new(0, 0), vec![0u8; 16]));
//! level.request_chunk_load(1, 0);
//! while let Some(result) = level.buffered_chunk() {
//!     println!("chunk {} ready", result.pos());
//! }
//!
//! level.save_metadata()?;
//! level.close();
//! # Ok::<(), level_format::LevelError>(())
//! ```

mod chunk;
mod config;
mod error;
mod fs;
mod generator;
mod level_data;
mod pos;
mod provider;
mod store;
mod worker;

pub use chunk::{Chunk, ChunkLoad};
pub use config::{DEFAULT_CHUNK_DIR, DEFAULT_COMPRESSION, LevelConfig};
pub use error::{LevelError, LevelResult};
pub use generator::{BuiltinGenerators, DEFAULT_GENERATOR, GeneratorRegistry};
pub use level_data::{LEVEL_FILE, LEVEL_VERSION, LevelData, LevelSettings};
pub use pos::{BlockPos, ChunkPos};
pub use provider::LevelProvider;
pub use store::{ChunkStore, FileChunkStore};
pub use worker::{ChunkIo, ChunkWorker};
