// src/bank/composite.rs
//! The composite leaf type (0xf): a TAGSEGMENT holding an ASCII format
//! descriptor, followed by a BANK holding raw bytes that the descriptor
//! drives. The descriptor is compiled once per node into a small
//! instruction tree, then run over the data blob; when the format runs dry
//! before the data does, scanning resumes from the last parenthesized
//! group, or from the start of the format when there is none.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::bank::header::{parse_bank_header, parse_tagsegment_header};
use crate::error::{EvioError, Result};
use crate::types::{ContentType, Endianness};
use crate::utils::words::slice_at;

/// Scalar types a composite descriptor can emit. `N`/`n`/`m` counts are
/// emitted into the output stream as i32/i16/i8 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeDtype {
    U32,
    I32,
    F32,
    F64,
    I64,
    U64,
    I16,
    U16,
    I8,
    U8,
    /// `a`: a single ASCII byte.
    Char,
    /// `A`: an i32 holding 4 ASCII characters.
    Hollerit,
}

impl CompositeDtype {
    pub fn size(self) -> usize {
        match self {
            CompositeDtype::I8 | CompositeDtype::U8 | CompositeDtype::Char => 1,
            CompositeDtype::I16 | CompositeDtype::U16 => 2,
            CompositeDtype::U32
            | CompositeDtype::I32
            | CompositeDtype::F32
            | CompositeDtype::Hollerit => 4,
            CompositeDtype::F64 | CompositeDtype::I64 | CompositeDtype::U64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompositeDtype::U32 => "u32",
            CompositeDtype::I32 => "i32",
            CompositeDtype::F32 => "f32",
            CompositeDtype::F64 => "f64",
            CompositeDtype::I64 => "i64",
            CompositeDtype::U64 => "u64",
            CompositeDtype::I16 => "i16",
            CompositeDtype::U16 => "u16",
            CompositeDtype::I8 => "i8",
            CompositeDtype::U8 => "u8",
            CompositeDtype::Char => "char",
            CompositeDtype::Hollerit => "hollerit",
        }
    }

    fn from_token(c: char) -> Option<Self> {
        match c {
            'i' => Some(CompositeDtype::U32),
            'I' => Some(CompositeDtype::I32),
            'F' => Some(CompositeDtype::F32),
            'D' => Some(CompositeDtype::F64),
            'L' => Some(CompositeDtype::I64),
            'l' => Some(CompositeDtype::U64),
            'S' => Some(CompositeDtype::I16),
            's' => Some(CompositeDtype::U16),
            'C' => Some(CompositeDtype::I8),
            'c' => Some(CompositeDtype::U8),
            'a' => Some(CompositeDtype::Char),
            'A' => Some(CompositeDtype::Hollerit),
            _ => None,
        }
    }
}

impl fmt::Display for CompositeDtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a token's repeat count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Fixed(u32),
    /// `N`: i32 read from the data stream.
    CountI32,
    /// `n`: i16 read from the data stream.
    CountI16,
    /// `m`: i8 read from the data stream.
    CountI8,
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Scalar { dtype: CompositeDtype, repeat: Repeat },
    Group { items: Vec<Item>, repeat: Repeat },
}

/// A compiled format descriptor.
#[derive(Debug, Clone)]
pub struct CompositeFormat {
    items: Vec<Item>,
    source: String,
}

impl CompositeFormat {
    /// Compile a descriptor such as `i,L,2(s,2D,mF)`.
    pub fn compile(source: &str) -> Result<CompositeFormat> {
        let mut chars = source.chars().peekable();
        let items = parse_items(&mut chars, false)?;
        if items.is_empty() {
            return Err(EvioError::BadComposite("empty format descriptor".into()));
        }
        Ok(CompositeFormat {
            items,
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The unit reapplied when the format ends before the data: the last
    /// parenthesized group, or the whole format when there is none.
    fn tail(&self) -> &[Item] {
        self.items
            .iter()
            .rposition(|item| matches!(item, Item::Group { .. }))
            .map(|i| &self.items[i..=i])
            .unwrap_or(&self.items)
    }
}

fn parse_items(chars: &mut Peekable<Chars<'_>>, in_group: bool) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    loop {
        while matches!(chars.peek(), Some(',') | Some(' ')) {
            chars.next();
        }
        let c = match chars.peek() {
            None => {
                if in_group {
                    return Err(EvioError::BadComposite("unmatched '('".into()));
                }
                return Ok(items);
            }
            Some(&c) => c,
        };
        if c == ')' {
            chars.next();
            if !in_group {
                return Err(EvioError::BadComposite("unmatched ')'".into()));
            }
            if items.is_empty() {
                return Err(EvioError::BadComposite("empty group".into()));
            }
            return Ok(items);
        }

        let repeat = parse_repeat(chars)?;
        match chars.next() {
            Some('(') => {
                let group = parse_items(chars, true)?;
                items.push(Item::Group {
                    items: group,
                    repeat,
                });
            }
            Some(token) => {
                let dtype = CompositeDtype::from_token(token).ok_or_else(|| {
                    EvioError::BadComposite(format!("illegal character '{token}'"))
                })?;
                items.push(Item::Scalar { dtype, repeat });
            }
            None => {
                return Err(EvioError::BadComposite(
                    "multiplier with no token after it".into(),
                ))
            }
        }
    }
}

fn parse_repeat(chars: &mut Peekable<Chars<'_>>) -> Result<Repeat> {
    match chars.peek() {
        Some('N') => {
            chars.next();
            Ok(Repeat::CountI32)
        }
        Some('n') => {
            chars.next();
            Ok(Repeat::CountI16)
        }
        Some('m') => {
            chars.next();
            Ok(Repeat::CountI8)
        }
        Some(c) if c.is_ascii_digit() => {
            let mut value: u32 = 0;
            while let Some(c) = chars.peek().copied().filter(|c| c.is_ascii_digit()) {
                chars.next();
                value = value
                    .saturating_mul(10)
                    .saturating_add(c.to_digit(10).unwrap_or(0));
            }
            if !(2..=15).contains(&value) {
                return Err(EvioError::BadComposite(format!(
                    "multiplier {value} outside 2..15"
                )));
            }
            Ok(Repeat::Fixed(value))
        }
        _ => Ok(Repeat::Fixed(1)),
    }
}

/// One emitted value: a dtype plus its absolute byte range in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeField {
    pub dtype: CompositeDtype,
    pub offset: usize,
    pub len: usize,
}

/// A decoded scalar, byte-swapped to host order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompositeValue {
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    U64(u64),
    I16(i16),
    U16(u16),
    I8(i8),
    U8(u8),
    Char(u8),
    Hollerit(i32),
}

struct Scanner<'a> {
    blob: &'a [u8],
    base: usize,
    pos: usize,
    endian: Endianness,
    fields: Vec<CompositeField>,
}

impl<'a> Scanner<'a> {
    fn remaining(&self) -> usize {
        self.blob.len() - self.pos
    }

    /// Claim `size` bytes for one value. `None` means the data ran out
    /// cleanly at a token boundary; a partial token is an error.
    fn take(&mut self, size: usize, what: &str) -> Result<Option<usize>> {
        let rem = self.remaining();
        if rem == 0 {
            return Ok(None);
        }
        if rem < size {
            return Err(EvioError::BadComposite(format!(
                "data exhausted mid-{what}: {rem} bytes left, {size} needed"
            )));
        }
        let offset = self.pos;
        self.pos += size;
        Ok(Some(offset))
    }

    fn emit(&mut self, dtype: CompositeDtype, rel_offset: usize) {
        self.fields.push(CompositeField {
            dtype,
            offset: self.base + rel_offset,
            len: dtype.size(),
        });
    }

    fn resolve(&mut self, repeat: Repeat) -> Result<Option<u64>> {
        let (dtype, what) = match repeat {
            Repeat::Fixed(n) => return Ok(Some(n as u64)),
            Repeat::CountI32 => (CompositeDtype::I32, "N count"),
            Repeat::CountI16 => (CompositeDtype::I16, "n count"),
            Repeat::CountI8 => (CompositeDtype::I8, "m count"),
        };
        let offset = match self.take(dtype.size(), what)? {
            Some(offset) => offset,
            None => return Ok(None),
        };
        let count: i64 = match repeat {
            Repeat::CountI32 => self.endian.read_u32(&self.blob[offset..]) as i32 as i64,
            Repeat::CountI16 => self.endian.read_u16(&self.blob[offset..]) as i16 as i64,
            Repeat::CountI8 => self.blob[offset] as i8 as i64,
            Repeat::Fixed(_) => unreachable!(),
        };
        if count < 0 {
            return Err(EvioError::BadComposite(format!(
                "negative repeat count {count}"
            )));
        }
        self.emit(dtype, offset);
        Ok(Some(count as u64))
    }

    /// Run a list of items once. Returns false when the data ran out.
    fn run(&mut self, items: &[Item]) -> Result<bool> {
        for item in items {
            match item {
                Item::Scalar { dtype, repeat } => {
                    let count = match self.resolve(*repeat)? {
                        Some(count) => count,
                        None => return Ok(false),
                    };
                    for _ in 0..count {
                        match self.take(dtype.size(), dtype.name())? {
                            Some(offset) => self.emit(*dtype, offset),
                            None => return Ok(false),
                        }
                    }
                }
                Item::Group { items, repeat } => {
                    let count = match self.resolve(*repeat)? {
                        Some(count) => count,
                        None => return Ok(false),
                    };
                    for _ in 0..count {
                        if !self.run(items)? {
                            return Ok(false);
                        }
                    }
                }
            }
        }
        Ok(true)
    }
}

fn execute(
    format: &CompositeFormat,
    blob: &[u8],
    base: usize,
    endian: Endianness,
) -> Result<Vec<CompositeField>> {
    let mut scanner = Scanner {
        blob,
        base,
        pos: 0,
        endian,
        fields: Vec::new(),
    };
    let complete = scanner.run(&format.items)?;
    if complete {
        let tail = format.tail();
        while scanner.remaining() > 0 {
            let before = scanner.pos;
            let complete = scanner.run(tail)?;
            if scanner.pos == before {
                return Err(EvioError::BadComposite(
                    "repeatable tail consumes no data".into(),
                ));
            }
            if !complete {
                break;
            }
        }
    }
    Ok(scanner.fields)
}

/// One (format descriptor, data blob) pair within a composite payload.
#[derive(Debug, Clone)]
pub struct CompositeSection {
    pub format: CompositeFormat,
    pub data_offset: usize,
    pub data_len: usize,
    pub fields: Vec<CompositeField>,
}

/// A decoded composite leaf: its sections, in payload order, with every
/// emitted value as an absolute (dtype, byte-range) pair.
#[derive(Debug, Clone)]
pub struct CompositeData<'a> {
    data: &'a [u8],
    endian: Endianness,
    sections: Vec<CompositeSection>,
}

impl<'a> CompositeData<'a> {
    pub(crate) fn parse(
        data: &'a [u8],
        offset: usize,
        payload_bytes: usize,
        endian: Endianness,
    ) -> Result<CompositeData<'a>> {
        let end = offset + payload_bytes;
        let mut cursor = offset;
        let mut sections = Vec::new();

        while cursor < end {
            let descriptor = parse_tagsegment_header(data, cursor, endian)?;
            if ContentType::from_code(descriptor.type_code) != Some(ContentType::StringArray) {
                return Err(EvioError::BadComposite(format!(
                    "format descriptor at byte offset {cursor} is not a string tagsegment"
                )));
            }
            let format_offset = cursor + 4;
            let format_len = descriptor.payload_words as usize * 4;
            if format_offset + format_len > end {
                return Err(EvioError::BadComposite(
                    "format descriptor overshoots composite payload".into(),
                ));
            }
            let raw = slice_at(data, format_offset, format_len)?;
            let text = raw
                .iter()
                .position(|&b| b == 0 || b == 0x04)
                .map_or(raw, |i| &raw[..i]);
            let source = std::str::from_utf8(text)
                .map_err(|_| EvioError::BadComposite("format descriptor is not ASCII".into()))?;
            let format = CompositeFormat::compile(source)?;

            let bank_offset = format_offset + format_len;
            let blob_header = parse_bank_header(data, bank_offset, endian)?;
            let blob_offset = bank_offset + 8;
            let blob_payload = blob_header.payload_words as usize * 4;
            if blob_offset + blob_payload > end {
                return Err(EvioError::BadComposite(
                    "composite data bank overshoots composite payload".into(),
                ));
            }
            if blob_header.pad as usize > blob_payload {
                return Err(EvioError::BadComposite(
                    "composite data bank pad exceeds its payload".into(),
                ));
            }
            let data_len = blob_payload - blob_header.pad as usize;

            let blob = slice_at(data, blob_offset, data_len)?;
            let fields = execute(&format, blob, blob_offset, endian)?;
            sections.push(CompositeSection {
                format,
                data_offset: blob_offset,
                data_len,
                fields,
            });
            cursor = blob_offset + blob_payload;
        }

        Ok(CompositeData {
            data,
            endian,
            sections,
        })
    }

    pub fn sections(&self) -> &[CompositeSection] {
        &self.sections
    }

    /// All emitted fields across sections, in order.
    pub fn fields(&self) -> impl Iterator<Item = &CompositeField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Decode one field to a host-order scalar.
    pub fn value(&self, field: &CompositeField) -> CompositeValue {
        let bytes = &self.data[field.offset..field.offset + field.len];
        match field.dtype {
            CompositeDtype::U32 => CompositeValue::U32(self.endian.read_u32(bytes)),
            CompositeDtype::I32 => CompositeValue::I32(self.endian.read_u32(bytes) as i32),
            CompositeDtype::F32 => CompositeValue::F32(f32::from_bits(self.endian.read_u32(bytes))),
            CompositeDtype::F64 => CompositeValue::F64(f64::from_bits(self.endian.read_u64(bytes))),
            CompositeDtype::I64 => CompositeValue::I64(self.endian.read_u64(bytes) as i64),
            CompositeDtype::U64 => CompositeValue::U64(self.endian.read_u64(bytes)),
            CompositeDtype::I16 => CompositeValue::I16(self.endian.read_u16(bytes) as i16),
            CompositeDtype::U16 => CompositeValue::U16(self.endian.read_u16(bytes)),
            CompositeDtype::I8 => CompositeValue::I8(bytes[0] as i8),
            CompositeDtype::U8 => CompositeValue::U8(bytes[0]),
            CompositeDtype::Char => CompositeValue::Char(bytes[0]),
            CompositeDtype::Hollerit => {
                CompositeValue::Hollerit(self.endian.read_u32(bytes) as i32)
            }
        }
    }

    /// Decode every field in order.
    pub fn values(&self) -> impl Iterator<Item = (CompositeDtype, CompositeValue)> + '_ {
        self.fields().map(|f| (f.dtype, self.value(f)))
    }
}
