//! NBT (Named Binary Tag) parsing for Minecraft chunk data.
//!
//! Every value on the wire is preceded by its type code (and a name, inside
//! compounds), so the parser needs no schema. Robustness rests on the
//! bounds-checked [`ByteCursor`] and the nesting limit [`MAX_DEPTH`].

use std::collections::HashMap;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Maximum nesting depth of lists and compounds.
pub const MAX_DEPTH: usize = 512;

/// Numeric type codes of the 13 NBT tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagType {
    pub fn from_u8(code: u8) -> Result<Self> {
        Ok(match code {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            _ => return Err(Error::UnknownTagType(code)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::End => TagType::End,
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List(_) => TagType::List,
            Tag::Compound(_) => TagType::Compound,
            Tag::IntArray(_) => TagType::IntArray,
            Tag::LongArray(_) => TagType::LongArray,
        }
    }

    /// Look up a child of a compound. `None` for any other tag kind.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.as_compound()?.get(name)
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Any integer tag widened to `i64`.
    ///
    /// Writers disagree on the width of some fields (section `Y` is a Byte in
    /// vanilla, an Int in some tools), so readers of those fields use this.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Tag::Byte(n) => Some(*n as i64),
            Tag::Short(n) => Some(*n as i64),
            Tag::Int(n) => Some(*n as i64),
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }
}

/// Read an i32 element count, rejecting negative values.
fn read_count(cursor: &mut ByteCursor, what: &str) -> Result<usize> {
    let count = cursor.read_i32()?;
    usize::try_from(count)
        .map_err(|_| Error::Corrupt(format!("negative {} length {}", what, count)))
}

/// Parse one tag of a known type.
///
/// Returns the tag's name (empty when `named` is false) and its value.
/// `depth` is the nesting level of this tag; the root is at depth 0.
pub fn parse_tag(
    cursor: &mut ByteCursor,
    tag_type: TagType,
    named: bool,
    depth: usize,
) -> Result<(String, Tag)> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthExceeded(MAX_DEPTH));
    }

    let name = if named {
        let length = cursor.read_u16()? as usize;
        if length == 0 {
            String::new()
        } else {
            cursor.read_string(length)?
        }
    } else {
        String::new()
    };

    let tag = match tag_type {
        TagType::End => Tag::End,
        TagType::Byte => Tag::Byte(cursor.read_i8()?),
        TagType::Short => Tag::Short(cursor.read_i16()?),
        TagType::Int => Tag::Int(cursor.read_i32()?),
        TagType::Long => Tag::Long(cursor.read_i64()?),
        TagType::Float => Tag::Float(cursor.read_f32()?),
        TagType::Double => Tag::Double(cursor.read_f64()?),
        TagType::ByteArray => {
            let count = read_count(cursor, "byte array")?;
            Tag::ByteArray(cursor.read_array::<i8>(count)?)
        }
        TagType::String => {
            let length = cursor.read_u16()? as usize;
            Tag::String(cursor.read_string(length)?)
        }
        TagType::List => {
            let element_type = TagType::from_u8(cursor.read_u8()?)?;
            let count = read_count(cursor, "list")?;
            // End elements carry no payload; any other element takes at
            // least one byte, so the count can never exceed what is left.
            if element_type == TagType::End && count > 0 {
                return Err(Error::Corrupt(format!("list of {} End tags", count)));
            }
            if count > cursor.remaining() {
                return Err(Error::Corrupt(format!(
                    "list of {} elements with {} bytes left",
                    count,
                    cursor.remaining()
                )));
            }
            let mut list = Vec::with_capacity(count);
            for _ in 0..count {
                let (_, element) = parse_tag(cursor, element_type, false, depth + 1)?;
                list.push(element);
            }
            Tag::List(list)
        }
        TagType::Compound => {
            let mut compound = HashMap::new();
            loop {
                let child_type = TagType::from_u8(cursor.read_u8()?)?;
                if child_type == TagType::End {
                    break;
                }
                let (child_name, child) = parse_tag(cursor, child_type, true, depth + 1)?;
                compound.insert(child_name, child);
            }
            Tag::Compound(compound)
        }
        TagType::IntArray => {
            let count = read_count(cursor, "int array")?;
            Tag::IntArray(cursor.read_array::<i32>(count)?)
        }
        TagType::LongArray => {
            // Element count is 4 bytes wide, like the other array kinds.
            let count = read_count(cursor, "long array")?;
            Tag::LongArray(cursor.read_array::<i64>(count)?)
        }
    };

    Ok((name, tag))
}

/// Parse a complete NBT document whose root must be a compound.
pub fn parse_nbt(cursor: &mut ByteCursor) -> Result<Tag> {
    let code = cursor.read_u8()?;
    if code != TagType::Compound as u8 {
        return Err(Error::InvalidRoot(code));
    }
    let (_, root) = parse_tag(cursor, TagType::Compound, true, 0)?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    /// Hand-written writer helpers for building payloads byte by byte.
    fn named(buf: &mut Vec<u8>, tag_type: TagType, name: &str) {
        buf.push(tag_type as u8);
        buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
        buf.extend_from_slice(name.as_bytes());
    }

    fn parse_bytes(bytes: Vec<u8>) -> Result<Tag> {
        parse_nbt(&mut ByteCursor::new(bytes))
    }

    #[test]
    fn test_tag_type_codes() {
        for code in 0u8..=12 {
            assert_eq!(TagType::from_u8(code).unwrap() as u8, code);
        }
        assert!(matches!(TagType::from_u8(13), Err(Error::UnknownTagType(13))));
        assert_eq!(Tag::LongArray(vec![]).tag_type(), TagType::LongArray);
    }

    #[test]
    fn test_single_int_in_root() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::Int, "x");
        buf.extend_from_slice(&42i32.to_be_bytes());
        buf.push(TagType::End as u8);

        let root = parse_bytes(buf).unwrap();
        assert_eq!(root.get("x").and_then(Tag::as_i32), Some(42));
    }

    #[derive(Serialize)]
    struct Sample {
        x: i32,
        name: String,
        heights: fastnbt::LongArray,
        nested: Nested,
        list: Vec<i16>,
    }

    #[derive(Serialize)]
    struct Nested {
        flag: i8,
        ratio: f64,
    }

    #[test]
    fn test_parses_fastnbt_output() {
        let sample = Sample {
            x: 42,
            name: "minecraft:stone".to_string(),
            heights: fastnbt::LongArray::new(vec![1, -2, i64::MAX]),
            nested: Nested { flag: -1, ratio: 0.5 },
            list: vec![3, 4, 5],
        };
        let bytes = fastnbt::to_bytes(&sample).unwrap();

        let root = parse_bytes(bytes).unwrap();
        assert_eq!(root.get("x").and_then(Tag::as_i32), Some(42));
        assert_eq!(root.get("name").and_then(Tag::as_str), Some("minecraft:stone"));
        assert_eq!(
            root.get("heights").and_then(Tag::as_long_array),
            Some(&[1, -2, i64::MAX][..])
        );
        let nested = root.get("nested").unwrap();
        assert_eq!(nested.get("flag").and_then(Tag::as_i8), Some(-1));
        assert_eq!(nested.get("ratio").and_then(Tag::as_f64), Some(0.5));
        assert_eq!(
            root.get("list").and_then(Tag::as_list),
            Some(&[Tag::Short(3), Tag::Short(4), Tag::Short(5)][..])
        );
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "root");
        named(&mut buf, TagType::Byte, "v");
        buf.push(1);
        named(&mut buf, TagType::Byte, "v");
        buf.push(2);
        buf.push(0);

        let root = parse_bytes(buf).unwrap();
        assert_eq!(root.as_compound().unwrap().len(), 1);
        assert_eq!(root.get("v"), Some(&Tag::Byte(2)));
    }

    #[test]
    fn test_invalid_root() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Int, "");
        buf.extend_from_slice(&1i32.to_be_bytes());
        assert!(matches!(parse_bytes(buf), Err(Error::InvalidRoot(3))));
    }

    #[test]
    fn test_truncated_input_fails() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::Long, "big");
        buf.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(parse_bytes(buf), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_huge_array_count_does_not_allocate() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::LongArray, "data");
        buf.extend_from_slice(&i32::MAX.to_be_bytes());
        assert!(matches!(parse_bytes(buf), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_end_list_with_elements_is_corrupt() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::List, "l");
        buf.push(TagType::End as u8);
        buf.extend_from_slice(&i32::MAX.to_be_bytes());
        buf.push(0);
        assert!(matches!(parse_bytes(buf), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_empty_end_list_parses() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::List, "l");
        buf.push(TagType::End as u8);
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.push(0);
        let root = parse_bytes(buf).unwrap();
        assert_eq!(root.get("l").and_then(Tag::as_list), Some(&[][..]));
    }

    #[test]
    fn test_list_count_past_input_is_corrupt() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::List, "l");
        buf.push(TagType::Compound as u8);
        buf.extend_from_slice(&1_000_000i32.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(parse_bytes(buf), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_negative_list_count_is_corrupt() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::List, "items");
        buf.push(TagType::Int as u8);
        buf.extend_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(parse_bytes(buf), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_unknown_child_type() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        buf.push(99);
        assert!(matches!(parse_bytes(buf), Err(Error::UnknownTagType(99))));
    }

    #[test]
    fn test_depth_guard() {
        // Root plus MAX_DEPTH + 1 nested compounds, each opened and never closed.
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        for _ in 0..=MAX_DEPTH {
            named(&mut buf, TagType::Compound, "c");
        }
        assert!(matches!(parse_bytes(buf), Err(Error::DepthExceeded(MAX_DEPTH))));
    }

    #[test]
    fn test_depth_limit_is_inclusive() {
        // Exactly MAX_DEPTH levels below the root still parse.
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        for _ in 0..MAX_DEPTH {
            named(&mut buf, TagType::Compound, "c");
        }
        buf.extend(std::iter::repeat_n(0u8, MAX_DEPTH + 1));

        let mut node = &parse_bytes(buf).unwrap();
        let mut levels = 0;
        while let Some(child) = node.get("c") {
            node = child;
            levels += 1;
        }
        assert_eq!(levels, MAX_DEPTH);
    }

    #[test]
    fn test_nested_lists_count_toward_depth() {
        let mut buf = Vec::new();
        named(&mut buf, TagType::Compound, "");
        named(&mut buf, TagType::List, "l");
        for _ in 0..MAX_DEPTH + 8 {
            buf.push(TagType::List as u8);
            buf.extend_from_slice(&1i32.to_be_bytes());
        }
        assert!(matches!(parse_bytes(buf), Err(Error::DepthExceeded(_))));
    }

    #[test]
    fn test_as_integer_widens() {
        assert_eq!(Tag::Byte(-4).as_integer(), Some(-4));
        assert_eq!(Tag::Short(300).as_integer(), Some(300));
        assert_eq!(Tag::Int(-70000).as_integer(), Some(-70000));
        assert_eq!(Tag::Long(1 << 40).as_integer(), Some(1 << 40));
        assert_eq!(Tag::Float(1.0).as_integer(), None);
    }
}
