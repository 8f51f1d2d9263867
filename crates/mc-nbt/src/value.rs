//! In-memory NBT tree and its big-endian writer.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{NbtError, Result};

/// NBT tag type IDs
pub(crate) mod tag_type {
    pub const END: u8 = 0;
    pub const BYTE: u8 = 1;
    pub const SHORT: u8 = 2;
    pub const INT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FLOAT: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const BYTE_ARRAY: u8 = 7;
    pub const STRING: u8 = 8;
    pub const LIST: u8 = 9;
    pub const COMPOUND: u8 = 10;
    pub const INT_ARRAY: u8 = 11;
    pub const LONG_ARRAY: u8 = 12;
}

/// An NBT value
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// An NBT list (all elements must be same type)
#[derive(Debug, Clone, PartialEq)]
pub enum NbtList {
    Empty,
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<Vec<i8>>),
    String(Vec<String>),
    List(Vec<NbtList>),
    Compound(Vec<NbtCompound>),
    IntArray(Vec<Vec<i32>>),
    LongArray(Vec<Vec<i64>>),
}

/// An NBT compound: string keys to values, in insertion order.
///
/// A key appears at most once; inserting an existing key replaces its value
/// without moving it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NbtCompound {
    entries: Vec<(String, NbtValue)>,
}

impl NbtCompound {
    /// Create a new empty compound
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a compound from entries. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: Vec<(String, NbtValue)>) -> Self {
        let mut compound = Self::new();
        for (key, value) in entries {
            compound.insert(key, value);
        }
        compound
    }

    /// Insert a value, returning the value previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<NbtValue>) -> Option<NbtValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NbtValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn get_byte(&self, key: &str) -> Option<i8> {
        match self.get(key)? {
            NbtValue::Byte(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_short(&self, key: &str) -> Option<i16> {
        match self.get(key)? {
            NbtValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            NbtValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            NbtValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            NbtValue::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_compound(&self, key: &str) -> Option<&NbtCompound> {
        match self.get(key)? {
            NbtValue::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound_mut(&mut self, key: &str) -> Option<&mut NbtCompound> {
        match self.get_mut(key)? {
            NbtValue::Compound(v) => Some(v),
            _ => None,
        }
    }

    /// Write compound content (entries + end tag)
    pub(crate) fn write_content<W: Write>(&self, w: &mut W) -> Result<()> {
        for (name, value) in &self.entries {
            value.write_named(w, name)?;
        }
        w.write_u8(tag_type::END)?;
        Ok(())
    }
}

impl NbtValue {
    /// Get the type ID for this value
    #[must_use]
    pub fn type_id(&self) -> u8 {
        match self {
            Self::Byte(_) => tag_type::BYTE,
            Self::Short(_) => tag_type::SHORT,
            Self::Int(_) => tag_type::INT,
            Self::Long(_) => tag_type::LONG,
            Self::Float(_) => tag_type::FLOAT,
            Self::Double(_) => tag_type::DOUBLE,
            Self::ByteArray(_) => tag_type::BYTE_ARRAY,
            Self::String(_) => tag_type::STRING,
            Self::List(_) => tag_type::LIST,
            Self::Compound(_) => tag_type::COMPOUND,
            Self::IntArray(_) => tag_type::INT_ARRAY,
            Self::LongArray(_) => tag_type::LONG_ARRAY,
        }
    }

    /// Human-readable tag name, as used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Byte(_) => "TAG_Byte",
            Self::Short(_) => "TAG_Short",
            Self::Int(_) => "TAG_Int",
            Self::Long(_) => "TAG_Long",
            Self::Float(_) => "TAG_Float",
            Self::Double(_) => "TAG_Double",
            Self::ByteArray(_) => "TAG_Byte_Array",
            Self::String(_) => "TAG_String",
            Self::List(_) => "TAG_List",
            Self::Compound(_) => "TAG_Compound",
            Self::IntArray(_) => "TAG_Int_Array",
            Self::LongArray(_) => "TAG_Long_Array",
        }
    }

    /// Widen any integer tag to `i64`.
    ///
    /// Older documents sometimes stored long-valued fields in a narrower tag.
    #[must_use]
    pub fn as_i64_lenient(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Write a named tag (type + name + value)
    pub(crate) fn write_named<W: Write>(&self, w: &mut W, name: &str) -> Result<()> {
        w.write_u8(self.type_id())?;
        write_nbt_string(w, name)?;
        self.write_content(w)
    }

    /// Write the tag content (no type, no name)
    fn write_content<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            Self::Byte(v) => w.write_i8(*v)?,
            Self::Short(v) => w.write_i16::<BigEndian>(*v)?,
            Self::Int(v) => w.write_i32::<BigEndian>(*v)?,
            Self::Long(v) => w.write_i64::<BigEndian>(*v)?,
            Self::Float(v) => w.write_f32::<BigEndian>(*v)?,
            Self::Double(v) => w.write_f64::<BigEndian>(*v)?,
            Self::ByteArray(v) => write_byte_array(w, v)?,
            Self::String(v) => write_nbt_string(w, v)?,
            Self::List(list) => list.write_content(w)?,
            Self::Compound(compound) => compound.write_content(w)?,
            Self::IntArray(v) => write_int_array(w, v)?,
            Self::LongArray(v) => write_long_array(w, v)?,
        }
        Ok(())
    }
}

impl NbtList {
    /// Get the element type ID
    fn element_type_id(&self) -> u8 {
        match self {
            Self::Empty => tag_type::END,
            Self::Byte(_) => tag_type::BYTE,
            Self::Short(_) => tag_type::SHORT,
            Self::Int(_) => tag_type::INT,
            Self::Long(_) => tag_type::LONG,
            Self::Float(_) => tag_type::FLOAT,
            Self::Double(_) => tag_type::DOUBLE,
            Self::ByteArray(_) => tag_type::BYTE_ARRAY,
            Self::String(_) => tag_type::STRING,
            Self::List(_) => tag_type::LIST,
            Self::Compound(_) => tag_type::COMPOUND,
            Self::IntArray(_) => tag_type::INT_ARRAY,
            Self::LongArray(_) => tag_type::LONG_ARRAY,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::ByteArray(v) => v.len(),
            Self::String(v) => v.len(),
            Self::List(v) => v.len(),
            Self::Compound(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::LongArray(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write list content (element type + length + elements)
    fn write_content<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_u8(self.element_type_id())?;
        w.write_i32::<BigEndian>(self.len() as i32)?;

        match self {
            Self::Empty => {}
            Self::Byte(v) => {
                for b in v {
                    w.write_i8(*b)?;
                }
            }
            Self::Short(v) => {
                for s in v {
                    w.write_i16::<BigEndian>(*s)?;
                }
            }
            Self::Int(v) => {
                for i in v {
                    w.write_i32::<BigEndian>(*i)?;
                }
            }
            Self::Long(v) => {
                for l in v {
                    w.write_i64::<BigEndian>(*l)?;
                }
            }
            Self::Float(v) => {
                for f in v {
                    w.write_f32::<BigEndian>(*f)?;
                }
            }
            Self::Double(v) => {
                for d in v {
                    w.write_f64::<BigEndian>(*d)?;
                }
            }
            Self::ByteArray(v) => {
                for arr in v {
                    write_byte_array(w, arr)?;
                }
            }
            Self::String(v) => {
                for s in v {
                    write_nbt_string(w, s)?;
                }
            }
            Self::List(v) => {
                for list in v {
                    list.write_content(w)?;
                }
            }
            Self::Compound(v) => {
                for compound in v {
                    compound.write_content(w)?;
                }
            }
            Self::IntArray(v) => {
                for arr in v {
                    write_int_array(w, arr)?;
                }
            }
            Self::LongArray(v) => {
                for arr in v {
                    write_long_array(w, arr)?;
                }
            }
        }
        Ok(())
    }
}

/// Maximum byte length of an NBT string.
pub(crate) const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Write an NBT string (u16 length + UTF-8)
fn write_nbt_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > MAX_STRING_LEN {
        return Err(NbtError::StringTooLong {
            len: bytes.len(),
            max: MAX_STRING_LEN,
        });
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(())
}

fn write_byte_array<W: Write>(w: &mut W, v: &[i8]) -> Result<()> {
    w.write_i32::<BigEndian>(v.len() as i32)?;
    for b in v {
        w.write_i8(*b)?;
    }
    Ok(())
}

fn write_int_array<W: Write>(w: &mut W, v: &[i32]) -> Result<()> {
    w.write_i32::<BigEndian>(v.len() as i32)?;
    for i in v {
        w.write_i32::<BigEndian>(*i)?;
    }
    Ok(())
}

fn write_long_array<W: Write>(w: &mut W, v: &[i64]) -> Result<()> {
    w.write_i32::<BigEndian>(v.len() as i32)?;
    for l in v {
        w.write_i64::<BigEndian>(*l)?;
    }
    Ok(())
}

// Convenient From implementations
impl From<bool> for NbtValue {
    fn from(v: bool) -> Self {
        Self::Byte(if v { 1 } else { 0 })
    }
}

impl From<i8> for NbtValue {
    fn from(v: i8) -> Self {
        Self::Byte(v)
    }
}

impl From<i16> for NbtValue {
    fn from(v: i16) -> Self {
        Self::Short(v)
    }
}

impl From<i32> for NbtValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for NbtValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f32> for NbtValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for NbtValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for NbtValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for NbtValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NbtCompound> for NbtValue {
    fn from(v: NbtCompound) -> Self {
        Self::Compound(v)
    }
}

impl From<NbtList> for NbtValue {
    fn from(v: NbtList) -> Self {
        Self::List(v)
    }
}

/// Macro for building NBT compounds ergonomically
///
/// # Example
/// ```
/// use mc_nbt::nbt;
///
/// let compound = nbt! {
///     "LevelName" => "world",
///     "RandomSeed" => 42i64,
///     "Data" => nbt! {
///         "initialized" => true,
///     },
/// };
/// assert_eq!(compound.get_string("LevelName"), Some("world"));
/// ```
#[macro_export]
macro_rules! nbt {
    () => {
        $crate::NbtCompound::new()
    };

    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut compound = $crate::NbtCompound::new();
        $(
            compound.insert($key, $value);
        )*
        compound
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut compound = nbt! {
            "a" => 1i32,
            "b" => 2i32,
        };

        let old = compound.insert("a", 5i64);
        assert_eq!(old, Some(NbtValue::Int(1)));
        assert_eq!(compound.len(), 2);

        let keys: Vec<&str> = compound.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(compound.get_long("a"), Some(5));
    }

    #[test]
    fn test_typed_getters_reject_other_types() {
        let compound = nbt! {
            "time" => 12i32,
            "name" => "world",
        };

        assert_eq!(compound.get_long("time"), None);
        assert_eq!(compound.get_int("time"), Some(12));
        assert_eq!(compound.get_string("time"), None);
        assert_eq!(compound.get_string("name"), Some("world"));
        assert!(compound.get_compound("name").is_none());
    }

    #[test]
    fn test_lenient_integer_widening() {
        assert_eq!(NbtValue::Byte(-3).as_i64_lenient(), Some(-3));
        assert_eq!(NbtValue::Int(i32::MAX).as_i64_lenient(), Some(i64::from(i32::MAX)));
        assert_eq!(NbtValue::Long(1 << 40).as_i64_lenient(), Some(1 << 40));
        assert_eq!(NbtValue::Double(1.0).as_i64_lenient(), None);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut compound = nbt! {
            "a" => 1i8,
            "b" => 2i8,
            "c" => 3i8,
        };

        assert_eq!(compound.remove("b"), Some(NbtValue::Byte(2)));
        assert_eq!(compound.remove("b"), None);
        let keys: Vec<&str> = compound.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn test_bool_as_byte() {
        let mut buf = Vec::new();
        NbtValue::from(true).write_named(&mut buf, "flag").unwrap();

        // type, name length (2), name (4), payload
        assert_eq!(buf[0], tag_type::BYTE);
        assert_eq!(buf.len(), 1 + 2 + 4 + 1);
        assert_eq!(buf[buf.len() - 1], 1);
    }

    #[test]
    fn test_string_too_long() {
        let long = "x".repeat(MAX_STRING_LEN + 1);
        let mut buf = Vec::new();
        let err = NbtValue::from(long).write_named(&mut buf, "s").unwrap_err();
        assert!(matches!(err, NbtError::StringTooLong { .. }));
    }
}
