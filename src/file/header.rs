// src/file/header.rs
use crate::error::{EvioError, Result};
use crate::types::{
    Endianness, FileKind, EVIO_VERSION, FILE_MAGIC, MIN_HEADER_WORDS, RECORD_MAGIC,
};
use crate::utils::words::{bitfield, read_u32, read_u64};

/// Word index of the magic number within both header layouts.
const MAGIC_WORD: usize = 7;

/// Parsed 14-word EVIO v6 file header.
///
/// Word layout: 0 file-type-id, 1 file-number, 2 header-length-words,
/// 3 record-count, 4 index-array byte length, 5 bit-info + version,
/// 6 user-header byte length, 7 magic, 8-9 user register, 10-11 trailer
/// position, 12-13 user ints. Extended headers (kind 2 or 6) may carry
/// more than 14 words; the declared length is honored and the extra words
/// are skipped.
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub endian: Endianness,
    pub file_type_id: u32,
    pub file_number: u32,
    pub header_length: u32,
    pub record_count: u32,
    pub index_array_length: u32,
    pub version: u32,
    pub kind: FileKind,
    pub has_dictionary: bool,
    pub has_first_event: bool,
    pub trailer_has_index: bool,
    pub user_header_length: u32,
    pub user_header_pad: u32,
    pub user_register: u64,
    pub trailer_position: u64,
    pub user_int1: u32,
    pub user_int2: u32,
}

impl FileHeader {
    pub const HEADER_SIZE: usize = MIN_HEADER_WORDS as usize * 4;

    /// Elect the byte order by reading the magic word both ways.
    pub fn detect_endianness(data: &[u8]) -> Result<Endianness> {
        let offset = MAGIC_WORD * 4;
        let le = read_u32(data, offset, Endianness::Little)?;
        if le == RECORD_MAGIC {
            return Ok(Endianness::Little);
        }
        let be = read_u32(data, offset, Endianness::Big)?;
        if be == RECORD_MAGIC {
            return Ok(Endianness::Big);
        }
        Err(EvioError::BadMagic {
            offset,
            found: le,
            expected: RECORD_MAGIC,
        })
    }

    pub fn parse(data: &[u8]) -> Result<FileHeader> {
        let endian = Self::detect_endianness(data)?;
        let word = |i: usize| read_u32(data, i * 4, endian);

        let file_type_id = word(0)?;
        if file_type_id != FILE_MAGIC {
            return Err(EvioError::BadMagic {
                offset: 0,
                found: file_type_id,
                expected: FILE_MAGIC,
            });
        }

        let header_length = word(2)?;
        if header_length < MIN_HEADER_WORDS {
            return Err(EvioError::BadHeader(format!(
                "file header length {header_length} words, expected at least {MIN_HEADER_WORDS}"
            )));
        }

        let bit_info = word(5)?;
        let version = bitfield(bit_info, 0, 7);
        if version != EVIO_VERSION {
            return Err(EvioError::UnsupportedVersion(version));
        }
        let kind_code = bitfield(bit_info, 28, 31) as u8;
        let kind = FileKind::from_code(kind_code).ok_or_else(|| {
            EvioError::BadHeader(format!("unknown file header kind {kind_code}"))
        })?;

        Ok(FileHeader {
            endian,
            file_type_id,
            file_number: word(1)?,
            header_length,
            record_count: word(3)?,
            index_array_length: word(4)?,
            version,
            kind,
            has_dictionary: bitfield(bit_info, 8, 8) != 0,
            has_first_event: bitfield(bit_info, 9, 9) != 0,
            trailer_has_index: bitfield(bit_info, 10, 10) != 0,
            user_header_length: word(6)?,
            user_header_pad: bitfield(bit_info, 20, 21),
            user_register: read_u64(data, 8 * 4, endian)?,
            trailer_position: read_u64(data, 10 * 4, endian)?,
            user_int1: word(12)?,
            user_int2: word(13)?,
        })
    }

    /// Byte offset of the index array, immediately after the header.
    pub fn index_array_offset(&self) -> usize {
        self.header_length as usize * 4
    }

    /// Byte offset of the user header, after the index array.
    pub fn user_header_offset(&self) -> usize {
        self.index_array_offset() + self.index_array_length as usize
    }

    /// Byte offset of the first record, past the padded user header.
    pub fn first_record_offset(&self) -> usize {
        self.user_header_offset()
            + self.user_header_length as usize
            + self.user_header_pad as usize
    }
}
