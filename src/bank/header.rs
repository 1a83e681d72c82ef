// src/bank/header.rs
//! The three container-header unpackers. Each shape packs its bit-fields
//! differently; all widths are stated here and nowhere else.
//!
//! BANK (2 words):       word0 = length (exclusive of word0 itself),
//!                       word1 = tag:16 | pad:2 | type:6 | num:8
//! SEGMENT (1 word):     tag:8 | pad:2 | type:6 | length:16
//! TAGSEGMENT (1 word):  tag:12 | type:4 | length:16

use crate::error::{EvioError, Result};
use crate::types::{ContentType, Endianness};
use crate::utils::words::{bitfield, read_u32};

/// Header form of a bank node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankShape {
    Bank,
    Segment,
    TagSegment,
}

impl BankShape {
    pub fn header_words(self) -> usize {
        match self {
            BankShape::Bank => 2,
            BankShape::Segment | BankShape::TagSegment => 1,
        }
    }

    /// Shape of the children of a container with this content type.
    pub fn of_children(content: ContentType) -> Option<BankShape> {
        match content {
            ContentType::Bank | ContentType::BankAlias => Some(BankShape::Bank),
            ContentType::Segment | ContentType::SegmentAlias => Some(BankShape::Segment),
            ContentType::TagSegment => Some(BankShape::TagSegment),
            _ => None,
        }
    }
}

/// Shape-independent header fields. `length_field` is the length exactly
/// as stored (exclusive of the length word itself for a BANK, exclusive of
/// the single header word for the others); `payload_words` excludes the
/// header words entirely for every shape.
#[derive(Debug, Clone, Copy)]
pub struct RawBankHeader {
    pub shape: BankShape,
    pub tag: u16,
    pub num: u8,
    pub pad: u8,
    pub type_code: u8,
    pub length_field: u32,
    pub payload_words: u32,
}

impl RawBankHeader {
    pub fn header_words(&self) -> usize {
        self.shape.header_words()
    }

    /// Full node span in bytes, header included.
    pub fn total_span(&self) -> usize {
        (self.header_words() + self.payload_words as usize) * 4
    }
}

pub fn parse_bank_header(
    data: &[u8],
    offset: usize,
    endian: Endianness,
) -> Result<RawBankHeader> {
    let length = read_u32(data, offset, endian)?;
    if length < 1 {
        return Err(EvioError::Corruption(format!(
            "bank length {length} at byte offset {offset} is below its own header size"
        )));
    }
    let info = read_u32(data, offset + 4, endian)?;
    Ok(RawBankHeader {
        shape: BankShape::Bank,
        tag: bitfield(info, 16, 31) as u16,
        pad: bitfield(info, 14, 15) as u8,
        type_code: bitfield(info, 8, 13) as u8,
        num: bitfield(info, 0, 7) as u8,
        length_field: length,
        payload_words: length - 1,
    })
}

pub fn parse_segment_header(
    data: &[u8],
    offset: usize,
    endian: Endianness,
) -> Result<RawBankHeader> {
    let word = read_u32(data, offset, endian)?;
    let length = bitfield(word, 0, 15);
    Ok(RawBankHeader {
        shape: BankShape::Segment,
        tag: bitfield(word, 24, 31) as u16,
        pad: bitfield(word, 22, 23) as u8,
        type_code: bitfield(word, 16, 21) as u8,
        num: 0,
        length_field: length,
        payload_words: length,
    })
}

pub fn parse_tagsegment_header(
    data: &[u8],
    offset: usize,
    endian: Endianness,
) -> Result<RawBankHeader> {
    let word = read_u32(data, offset, endian)?;
    let length = bitfield(word, 0, 15);
    Ok(RawBankHeader {
        shape: BankShape::TagSegment,
        tag: bitfield(word, 20, 31) as u16,
        pad: 0,
        type_code: bitfield(word, 16, 19) as u8,
        num: 0,
        length_field: length,
        payload_words: length,
    })
}

pub fn parse_header(
    data: &[u8],
    offset: usize,
    endian: Endianness,
    shape: BankShape,
) -> Result<RawBankHeader> {
    match shape {
        BankShape::Bank => parse_bank_header(data, offset, endian),
        BankShape::Segment => parse_segment_header(data, offset, endian),
        BankShape::TagSegment => parse_tagsegment_header(data, offset, endian),
    }
}
