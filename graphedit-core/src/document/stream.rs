//! Big-endian wire primitives for the binary item stream
//!
//! The format has no self-describing field tags; readers and writers must
//! agree on field order and version gates exactly or the stream desyncs.
//! Strings are a u32 byte length followed by UTF-8 bytes; attribute maps a
//! u32 entry count followed by (key, value tag, payload) triples.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use hashbrown::HashMap;
use itertools::Itertools;

use crate::Error;
use crate::model::attribute::{AttrValue, Color};

const TAG_STR: u8 = 1;
const TAG_NUMBER: u8 = 2;
const TAG_BOOL: u8 = 3;
const TAG_COLOR: u8 = 4;
const TAG_ENUM: u8 = 5;

/// True when the read cursor has consumed every byte.
pub(crate) fn at_end(input: &Cursor<&[u8]>) -> bool {
    input.position() >= input.get_ref().len() as u64
}

fn eof_as_exhausted(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::StreamExhausted
    } else {
        Error::IoError(err)
    }
}

// primitives

pub(crate) fn write_u8(out: &mut Vec<u8>, value: u8) -> Result<(), Error> {
    out.write_u8(value)?;
    Ok(())
}

pub(crate) fn read_u8(input: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    input.read_u8().map_err(eof_as_exhausted)
}

pub(crate) fn write_u32(out: &mut Vec<u8>, value: u32) -> Result<(), Error> {
    out.write_u32::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn read_u32(input: &mut Cursor<&[u8]>) -> Result<u32, Error> {
    input.read_u32::<BigEndian>().map_err(eof_as_exhausted)
}

pub(crate) fn write_u64(out: &mut Vec<u8>, value: u64) -> Result<(), Error> {
    out.write_u64::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn read_u64(input: &mut Cursor<&[u8]>) -> Result<u64, Error> {
    input.read_u64::<BigEndian>().map_err(eof_as_exhausted)
}

pub(crate) fn write_f64(out: &mut Vec<u8>, value: f64) -> Result<(), Error> {
    out.write_f64::<BigEndian>(value)?;
    Ok(())
}

pub(crate) fn read_f64(input: &mut Cursor<&[u8]>) -> Result<f64, Error> {
    input.read_f64::<BigEndian>().map_err(eof_as_exhausted)
}

pub(crate) fn write_bool(out: &mut Vec<u8>, value: bool) -> Result<(), Error> {
    write_u8(out, u8::from(value))
}

pub(crate) fn read_bool(input: &mut Cursor<&[u8]>) -> Result<bool, Error> {
    Ok(read_u8(input)? != 0)
}

pub(crate) fn write_string(out: &mut Vec<u8>, value: &str) -> Result<(), Error> {
    write_u32(out, value.len() as u32)?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

pub(crate) fn read_string(input: &mut Cursor<&[u8]>) -> Result<String, Error> {
    let len = read_u32(input)? as usize;
    let mut bytes = vec![0_u8; len];
    input.read_exact(&mut bytes).map_err(eof_as_exhausted)?;
    Ok(String::from_utf8(bytes)?)
}

fn write_color(out: &mut Vec<u8>, color: Color) -> Result<(), Error> {
    write_u8(out, color.r)?;
    write_u8(out, color.g)?;
    write_u8(out, color.b)?;
    write_u8(out, color.a)
}

fn read_color(input: &mut Cursor<&[u8]>) -> Result<Color, Error> {
    Ok(Color {
        r: read_u8(input)?,
        g: read_u8(input)?,
        b: read_u8(input)?,
        a: read_u8(input)?,
    })
}

// attribute values

pub(crate) fn write_attr_value(out: &mut Vec<u8>, value: &AttrValue) -> Result<(), Error> {
    match value {
        AttrValue::Str(s) => {
            write_u8(out, TAG_STR)?;
            write_string(out, s)
        }
        AttrValue::Number(n) => {
            write_u8(out, TAG_NUMBER)?;
            write_f64(out, *n)
        }
        AttrValue::Bool(b) => {
            write_u8(out, TAG_BOOL)?;
            write_bool(out, *b)
        }
        AttrValue::Color(c) => {
            write_u8(out, TAG_COLOR)?;
            write_color(out, *c)
        }
        AttrValue::Enum(s) => {
            write_u8(out, TAG_ENUM)?;
            write_string(out, s)
        }
    }
}

pub(crate) fn read_attr_value(input: &mut Cursor<&[u8]>) -> Result<AttrValue, Error> {
    let tag = read_u8(input)?;
    match tag {
        TAG_STR => Ok(AttrValue::Str(read_string(input)?)),
        TAG_NUMBER => Ok(AttrValue::Number(read_f64(input)?)),
        TAG_BOOL => Ok(AttrValue::Bool(read_bool(input)?)),
        TAG_COLOR => Ok(AttrValue::Color(read_color(input)?)),
        TAG_ENUM => Ok(AttrValue::Enum(read_string(input)?)),
        other => Err(Error::UnknownValueTag(other)),
    }
}

/// Writes the attribute map with keys in sorted order so identical models
/// produce identical documents.
pub(crate) fn write_attr_map(
    out: &mut Vec<u8>,
    attributes: &HashMap<String, AttrValue>,
) -> Result<(), Error> {
    write_u32(out, attributes.len() as u32)?;
    for key in attributes.keys().sorted() {
        write_string(out, key)?;
        write_attr_value(out, &attributes[key])?;
    }
    Ok(())
}

pub(crate) fn read_attr_map(
    input: &mut Cursor<&[u8]>,
) -> Result<HashMap<String, AttrValue>, Error> {
    let count = read_u32(input)?;
    let mut attributes = HashMap::with_capacity(count as usize);
    for _ in 0..count {
        let key = read_string(input)?;
        let value = read_attr_value(input)?;
        attributes.insert(key, value);
    }
    Ok(attributes)
}
