//! NBT (Named Binary Tag) documents.
//!
//! Provides the tag tree ([`NbtValue`], [`NbtList`], [`NbtCompound`]), the
//! big-endian binary encoding used by Java-edition files, and gzip/zlib
//! framing for compressed documents such as `level.dat`.
//!
//! ```
//! use mc_nbt::{Compression, NbtValue, nbt, read_compressed, write_compressed};
//!
//! let doc = NbtValue::Compound(nbt! {
//!     "Data" => nbt! { "LevelName" => "world" },
//! });
//! let bytes = write_compressed("", &doc, Compression::default()).unwrap();
//! let (_, decoded) = read_compressed(&bytes).unwrap();
//! assert_eq!(decoded, doc);
//! ```

mod compression;
mod error;
mod read;
mod value;

pub use compression::{read_compressed, write_compressed};
pub use error::{NbtError, Result};
pub use flate2::Compression;
pub use read::{MAX_DEPTH, read_named, write_named};
pub use value::{NbtCompound, NbtList, NbtValue};
