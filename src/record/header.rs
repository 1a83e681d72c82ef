// src/record/header.rs
use crate::error::{EvioError, Result};
use crate::types::{
    CompressionType, Endianness, EventCategory, RecordKind, EVIO_VERSION, MIN_HEADER_WORDS,
    RECORD_MAGIC,
};
use crate::utils::words::{bitfield, read_u32, read_u64};

/// Parsed 14-word EVIO v6 record header.
///
/// Word layout: 0 record-length-words (inclusive of the header),
/// 1 record-number, 2 header-length-words, 3 event-count, 4 index-array
/// byte length, 5 bit-info + version, 6 user-header byte length, 7 magic,
/// 8 uncompressed byte length, 9 compression + compressed word length,
/// 10-11 user-register-1, 12-13 user-register-2.
#[derive(Debug, Clone)]
pub struct RecordHeader {
    pub record_length: u32,
    pub record_number: u32,
    pub header_length: u32,
    pub event_count: u32,
    pub index_array_length: u32,
    pub version: u32,
    pub kind: RecordKind,
    pub has_dictionary: bool,
    pub is_last_record: bool,
    pub has_first_event: bool,
    pub event_category: EventCategory,
    pub pad1: u32,
    pub pad2: u32,
    pub pad3: u32,
    pub user_header_length: u32,
    pub uncompressed_data_length: u32,
    pub compression_type: CompressionType,
    pub compressed_data_words: u32,
    pub user_register1: u64,
    pub user_register2: u64,
}

impl RecordHeader {
    pub const HEADER_SIZE: usize = MIN_HEADER_WORDS as usize * 4;

    /// Parse a record header at `offset` using the byte order elected from
    /// the file header. A magic mismatch here is corruption, not a reason
    /// to re-elect the order.
    pub fn parse(data: &[u8], offset: usize, endian: Endianness) -> Result<RecordHeader> {
        let word = |i: usize| read_u32(data, offset + i * 4, endian);

        let magic = word(7)?;
        if magic != RECORD_MAGIC {
            return Err(EvioError::Corruption(format!(
                "record magic 0x{magic:08x} at byte offset {} (expected 0x{RECORD_MAGIC:08x})",
                offset + 7 * 4
            )));
        }

        let record_length = word(0)?;
        let header_length = word(2)?;
        if header_length < MIN_HEADER_WORDS {
            return Err(EvioError::BadHeader(format!(
                "record header length {header_length} words, expected at least {MIN_HEADER_WORDS}"
            )));
        }
        if record_length < header_length {
            return Err(EvioError::Corruption(format!(
                "record length {record_length} words is shorter than its header ({header_length})"
            )));
        }

        let bit_info = word(5)?;
        let version = bitfield(bit_info, 0, 7);
        if version != EVIO_VERSION {
            return Err(EvioError::UnsupportedVersion(version));
        }
        let kind_code = bitfield(bit_info, 28, 31) as u8;
        let kind = RecordKind::from_code(kind_code).ok_or_else(|| {
            EvioError::BadHeader(format!("unknown record header kind {kind_code}"))
        })?;

        let compression_word = word(9)?;

        Ok(RecordHeader {
            record_length,
            record_number: word(1)?,
            header_length,
            event_count: word(3)?,
            index_array_length: word(4)?,
            version,
            kind,
            has_dictionary: bitfield(bit_info, 8, 8) != 0,
            is_last_record: bitfield(bit_info, 9, 9) != 0,
            has_first_event: bitfield(bit_info, 14, 14) != 0,
            event_category: EventCategory::from_code(bitfield(bit_info, 10, 13) as u8),
            pad1: bitfield(bit_info, 20, 21),
            pad2: bitfield(bit_info, 22, 23),
            pad3: bitfield(bit_info, 24, 25),
            user_header_length: word(6)?,
            uncompressed_data_length: word(8)?,
            compression_type: CompressionType::from_code(bitfield(compression_word, 28, 31) as u8),
            compressed_data_words: bitfield(compression_word, 0, 27),
            user_register1: read_u64(data, offset + 10 * 4, endian)?,
            user_register2: read_u64(data, offset + 12 * 4, endian)?,
        })
    }

    pub fn is_trailer(&self) -> bool {
        self.kind.is_trailer()
    }

    /// Total record span in bytes, header included.
    pub fn byte_len(&self) -> usize {
        self.record_length as usize * 4
    }
}
