//! Big-endian NBT decoder.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt};

use crate::value::tag_type;
use crate::{NbtCompound, NbtError, NbtList, NbtValue, Result};

/// Deepest compound/list nesting accepted by the decoder.
pub const MAX_DEPTH: usize = 512;

/// Upper bound on elements reserved up front for a declared length.
///
/// Lengths come from untrusted input, so vectors grow as elements actually
/// arrive instead of trusting the header.
const PREALLOC_LIMIT: usize = 4096;

/// Read one named root tag.
///
/// The root may be any tag type except `TAG_End`.
pub fn read_named<R: Read>(reader: &mut R) -> Result<(String, NbtValue)> {
    let id = reader.read_u8()?;
    if id == tag_type::END {
        return Err(NbtError::RootEnd);
    }
    let name = read_string(reader)?;
    let value = read_payload(reader, id, 0)?;
    Ok((name, value))
}

/// Write one named root tag.
pub fn write_named<W: Write>(writer: &mut W, name: &str, value: &NbtValue) -> Result<()> {
    value.write_named(writer, name)
}

fn read_payload<R: Read>(reader: &mut R, id: u8, depth: usize) -> Result<NbtValue> {
    if depth > MAX_DEPTH {
        return Err(NbtError::TooDeep(MAX_DEPTH));
    }

    let value = match id {
        tag_type::BYTE => NbtValue::Byte(reader.read_i8()?),
        tag_type::SHORT => NbtValue::Short(reader.read_i16::<BigEndian>()?),
        tag_type::INT => NbtValue::Int(reader.read_i32::<BigEndian>()?),
        tag_type::LONG => NbtValue::Long(reader.read_i64::<BigEndian>()?),
        tag_type::FLOAT => NbtValue::Float(reader.read_f32::<BigEndian>()?),
        tag_type::DOUBLE => NbtValue::Double(reader.read_f64::<BigEndian>()?),
        tag_type::BYTE_ARRAY => NbtValue::ByteArray(read_byte_array(reader)?),
        tag_type::STRING => NbtValue::String(read_string(reader)?),
        tag_type::LIST => NbtValue::List(read_list(reader, depth)?),
        tag_type::COMPOUND => NbtValue::Compound(read_compound(reader, depth)?),
        tag_type::INT_ARRAY => NbtValue::IntArray(read_int_array(reader)?),
        tag_type::LONG_ARRAY => NbtValue::LongArray(read_long_array(reader)?),
        other => return Err(NbtError::UnknownTag(other)),
    };
    Ok(value)
}

fn read_compound<R: Read>(reader: &mut R, depth: usize) -> Result<NbtCompound> {
    let mut compound = NbtCompound::new();
    loop {
        let id = reader.read_u8()?;
        if id == tag_type::END {
            return Ok(compound);
        }
        let name = read_string(reader)?;
        let value = read_payload(reader, id, depth + 1)?;
        compound.insert(name, value);
    }
}

fn read_list<R: Read>(reader: &mut R, depth: usize) -> Result<NbtList> {
    if depth > MAX_DEPTH {
        return Err(NbtError::TooDeep(MAX_DEPTH));
    }

    let element = reader.read_u8()?;
    let raw_len = reader.read_i32::<BigEndian>()?;
    let len = checked_len(raw_len)?;

    let list = match element {
        tag_type::END if len == 0 => NbtList::Empty,
        tag_type::END => return Err(NbtError::UntypedList(raw_len)),
        tag_type::BYTE => NbtList::Byte(read_elements(reader, len, |r| Ok(r.read_i8()?))?),
        tag_type::SHORT => {
            NbtList::Short(read_elements(reader, len, |r| Ok(r.read_i16::<BigEndian>()?))?)
        }
        tag_type::INT => {
            NbtList::Int(read_elements(reader, len, |r| Ok(r.read_i32::<BigEndian>()?))?)
        }
        tag_type::LONG => {
            NbtList::Long(read_elements(reader, len, |r| Ok(r.read_i64::<BigEndian>()?))?)
        }
        tag_type::FLOAT => {
            NbtList::Float(read_elements(reader, len, |r| Ok(r.read_f32::<BigEndian>()?))?)
        }
        tag_type::DOUBLE => {
            NbtList::Double(read_elements(reader, len, |r| Ok(r.read_f64::<BigEndian>()?))?)
        }
        tag_type::BYTE_ARRAY => NbtList::ByteArray(read_elements(reader, len, read_byte_array)?),
        tag_type::STRING => NbtList::String(read_elements(reader, len, read_string)?),
        tag_type::LIST => NbtList::List(read_elements(reader, len, |r| read_list(r, depth + 1))?),
        tag_type::COMPOUND => {
            NbtList::Compound(read_elements(reader, len, |r| read_compound(r, depth + 1))?)
        }
        tag_type::INT_ARRAY => NbtList::IntArray(read_elements(reader, len, read_int_array)?),
        tag_type::LONG_ARRAY => NbtList::LongArray(read_elements(reader, len, read_long_array)?),
        other => return Err(NbtError::UnknownTag(other)),
    };
    Ok(list)
}

fn read_elements<R, T, F>(reader: &mut R, len: usize, mut read_one: F) -> Result<Vec<T>>
where
    R: Read,
    F: FnMut(&mut R) -> Result<T>,
{
    let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    for _ in 0..len {
        out.push(read_one(reader)?);
    }
    Ok(out)
}

fn read_byte_array<R: Read>(reader: &mut R) -> Result<Vec<i8>> {
    let len = checked_len(reader.read_i32::<BigEndian>()?)?;
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(bytes.into_iter().map(|b| b as i8).collect())
}

fn read_int_array<R: Read>(reader: &mut R) -> Result<Vec<i32>> {
    let len = checked_len(reader.read_i32::<BigEndian>()?)?;
    read_elements(reader, len, |r| Ok(r.read_i32::<BigEndian>()?))
}

fn read_long_array<R: Read>(reader: &mut R) -> Result<Vec<i64>> {
    let len = checked_len(reader.read_i32::<BigEndian>()?)?;
    read_elements(reader, len, |r| Ok(r.read_i64::<BigEndian>()?))
}

/// Read an NBT string (u16 length + UTF-8)
fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

fn checked_len(raw: i32) -> Result<usize> {
    usize::try_from(raw).map_err(|_| NbtError::NegativeLength(raw))
}
