// src/record/mod.rs
mod header;

pub use header::RecordHeader;

use std::sync::Arc;

use crate::error::{EvioError, Result};
use crate::event::Event;
use crate::types::{CompressionType, Endianness, EventCategory};
use crate::utils::words::{read_u32, slice_at};

/// One entry of a record index: a record length in words and, when the
/// index stores (length, event-count) pairs, the record's event count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIndexEntry {
    pub length_words: u32,
    pub event_count: Option<u32>,
}

/// A record materialized from the mapping: its parsed header plus the
/// validated event-length index. Compressed records parse their header
/// but stay opaque; a trailer carries a record index instead of events.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    data: &'a [u8],
    endian: Endianness,
    offset: usize,
    header: RecordHeader,
    events: Arc<[(usize, usize)]>,
}

impl<'a> Record<'a> {
    pub fn parse(data: &'a [u8], offset: usize, endian: Endianness) -> Result<Record<'a>> {
        let header = RecordHeader::parse(data, offset, endian)?;
        slice_at(data, offset, header.byte_len())?;

        let mut record = Record {
            data,
            endian,
            offset,
            header,
            events: Arc::from(Vec::new()),
        };

        if !record.header.is_trailer() && record.header.compression_type.is_none() {
            record.events = record.scan_events()?.into();
        }
        Ok(record)
    }

    /// Rebuild a record from parts cached by a previous parse of the same
    /// offset. Skips all header and index validation; the parts were
    /// validated when first parsed.
    pub(crate) fn from_parts(
        data: &'a [u8],
        endian: Endianness,
        offset: usize,
        header: RecordHeader,
        events: Arc<[(usize, usize)]>,
    ) -> Record<'a> {
        Record {
            data,
            endian,
            offset,
            header,
            events,
        }
    }

    /// The memoizable outcome of a parse: the header and the validated
    /// event table.
    pub(crate) fn parts(&self) -> (RecordHeader, Arc<[(usize, usize)]>) {
        (self.header.clone(), self.events.clone())
    }

    /// Build the event (offset, length) table from the event-length index
    /// and check it tiles the event region exactly.
    fn scan_events(&self) -> Result<Vec<(usize, usize)>> {
        let header = &self.header;
        let index_len = header.index_array_length as usize;
        if index_len % 4 != 0 {
            return Err(EvioError::Corruption(format!(
                "event index length {index_len} bytes is not a whole number of words"
            )));
        }
        let entries = index_len / 4;
        if entries != header.event_count as usize {
            return Err(EvioError::Corruption(format!(
                "event index holds {entries} entries but the header counts {} events",
                header.event_count
            )));
        }

        let index_start = self.offset + header.header_length as usize * 4;
        let content_start =
            index_start + index_len + header.user_header_length as usize + header.pad1 as usize;
        let record_end = self.offset + header.byte_len();
        if content_start > record_end {
            return Err(EvioError::Corruption(format!(
                "record content starts at {content_start}, past the record end {record_end}"
            )));
        }

        let mut events = Vec::with_capacity(entries);
        let mut cursor = content_start;
        for i in 0..entries {
            let length = read_u32(self.data, index_start + i * 4, self.endian)? as usize;
            events.push((cursor, length));
            cursor = cursor.checked_add(length).ok_or_else(|| {
                EvioError::Corruption(format!("event {i} length {length} overflows the cursor"))
            })?;
        }
        if cursor + header.pad2 as usize != record_end {
            return Err(EvioError::Corruption(format!(
                "event lengths sum to byte offset {cursor} plus pad {} but the record ends at {record_end}",
                header.pad2
            )));
        }
        Ok(events)
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    /// Byte offset of the record within the mapping.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total record span in bytes, header included.
    pub fn byte_len(&self) -> usize {
        self.header.byte_len()
    }

    pub fn event_count(&self) -> usize {
        self.header.event_count as usize
    }

    pub fn compression_type(&self) -> CompressionType {
        self.header.compression_type
    }

    pub fn event_category(&self) -> EventCategory {
        self.header.event_category
    }

    pub fn is_trailer(&self) -> bool {
        self.header.is_trailer()
    }

    pub fn is_last(&self) -> bool {
        self.header.is_last_record
    }

    fn check_uncompressed(&self) -> Result<()> {
        if self.header.compression_type.is_none() {
            Ok(())
        } else {
            Err(EvioError::UnsupportedCompression(
                self.header.compression_type,
            ))
        }
    }

    pub fn event(&self, index: usize) -> Result<Event<'a>> {
        self.check_uncompressed()?;
        let &(offset, byte_len) = self.events.get(index).ok_or(EvioError::OutOfRange {
            index,
            count: self.events.len(),
        })?;
        Ok(Event::new(self.data, self.endian, offset, byte_len, index))
    }

    pub fn events(&self) -> Result<impl Iterator<Item = Event<'a>> + '_> {
        self.check_uncompressed()?;
        Ok(self
            .events
            .iter()
            .enumerate()
            .map(|(i, &(offset, byte_len))| {
                Event::new(self.data, self.endian, offset, byte_len, i)
            }))
    }

    /// The validated event (offset, byte-length) table.
    pub fn event_spans(&self) -> Result<&[(usize, usize)]> {
        self.check_uncompressed()?;
        Ok(&self.events)
    }

    /// The record's user header bytes, unpadded.
    pub fn user_header_bytes(&self) -> Result<&'a [u8]> {
        self.check_uncompressed()?;
        let start = self.offset
            + self.header.header_length as usize * 4
            + self.header.index_array_length as usize;
        slice_at(self.data, start, self.header.user_header_length as usize)
    }

    /// Decode a trailer's index of all records in the file. The region
    /// holds either plain length-words entries or (length, event-count)
    /// pairs; `expected_records` (the file header's record count)
    /// disambiguates, and a region fitting neither reading is corruption.
    pub fn record_index(&self, expected_records: Option<u32>) -> Result<Vec<RecordIndexEntry>> {
        if !self.is_trailer() {
            return Err(EvioError::TypeMismatch {
                expected: "trailer record".to_string(),
                found: "data record".to_string(),
            });
        }
        let index_start = self.offset + self.header.header_length as usize * 4;
        parse_record_index(
            self.data,
            index_start,
            self.header.index_array_length as usize,
            self.endian,
            expected_records,
        )
    }
}

/// Shared decoder for the record indexes carried by the file header and
/// by a trailer.
pub(crate) fn parse_record_index(
    data: &[u8],
    offset: usize,
    byte_len: usize,
    endian: Endianness,
    expected_records: Option<u32>,
) -> Result<Vec<RecordIndexEntry>> {
    let pairs = match expected_records {
        Some(count) => {
            let count = count as usize;
            if byte_len == count * 8 {
                true
            } else if byte_len == count * 4 {
                false
            } else {
                return Err(EvioError::Corruption(format!(
                    "record index of {byte_len} bytes fits neither {count} pairs nor {count} lengths"
                )));
            }
        }
        None => {
            if byte_len % 8 == 0 {
                true
            } else if byte_len % 4 == 0 {
                false
            } else {
                return Err(EvioError::Corruption(format!(
                    "record index length {byte_len} bytes is not a whole number of entries"
                )));
            }
        }
    };

    let stride = if pairs { 8 } else { 4 };
    let mut entries = Vec::with_capacity(byte_len / stride);
    let mut cursor = offset;
    while cursor < offset + byte_len {
        let length_words = read_u32(data, cursor, endian)?;
        let event_count = if pairs {
            Some(read_u32(data, cursor + 4, endian)?)
        } else {
            None
        };
        entries.push(RecordIndexEntry {
            length_words,
            event_count,
        });
        cursor += stride;
    }
    Ok(entries)
}
