//! Compressed documents, as stored in `level.dat` and similar files.

use std::io::{BufReader, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;

use crate::{NbtError, NbtValue, Result, read_named, write_named};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZLIB_CMF: u8 = 0x78;

/// Inflate and decode a named root tag.
///
/// Accepts gzip (the usual on-disk framing) and zlib streams.
pub fn read_compressed(bytes: &[u8]) -> Result<(String, NbtValue)> {
    match bytes {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => {
            read_named(&mut BufReader::new(GzDecoder::new(bytes)))
        }
        [ZLIB_CMF, ..] => read_named(&mut BufReader::new(ZlibDecoder::new(bytes))),
        _ => Err(NbtError::UnknownCompression),
    }
}

/// Encode a named root tag and gzip it.
pub fn write_compressed(name: &str, value: &NbtValue, level: Compression) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), level);
    write_named(&mut encoder, name, value)?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use flate2::write::ZlibEncoder;

    use super::*;
    use crate::nbt;

    #[test]
    fn test_gzip_header_on_write() {
        let value = NbtValue::Compound(nbt! { "Data" => nbt! {} });
        let bytes = write_compressed("", &value, Compression::default()).unwrap();
        assert_eq!(bytes[..2], GZIP_MAGIC);

        let (name, decoded) = read_compressed(&bytes).unwrap();
        assert_eq!(name, "");
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_zlib_stream_accepted() {
        let value = NbtValue::Compound(nbt! { "Time" => 5i32 });
        let mut raw = Vec::new();
        write_named(&mut raw, "", &value).unwrap();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&raw).unwrap();
        let bytes = encoder.finish().unwrap();

        let (_, decoded) = read_compressed(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_uncompressed_input_rejected() {
        let mut raw = Vec::new();
        write_named(&mut raw, "", &NbtValue::Compound(nbt! {})).unwrap();
        assert!(matches!(
            read_compressed(&raw),
            Err(NbtError::UnknownCompression)
        ));
        assert!(matches!(
            read_compressed(&[]),
            Err(NbtError::UnknownCompression)
        ));
    }

    #[test]
    fn test_corrupt_gzip_body() {
        let value = NbtValue::Compound(nbt! { "LevelName" => "world" });
        let mut bytes = write_compressed("", &value, Compression::default()).unwrap();
        bytes.truncate(12);
        assert!(read_compressed(&bytes).is_err());
    }
}
