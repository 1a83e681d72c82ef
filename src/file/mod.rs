// src/file/mod.rs
mod header;

pub use header::FileHeader;

use std::fs::File;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use memmap2::Mmap;
use tracing::debug;

use crate::error::{EvioError, Result};
use crate::record::{parse_record_index, Record, RecordHeader, RecordIndexEntry};
use crate::types::Endianness;
use crate::utils::words::slice_at;

/// Backing storage for an open file: a read-only mapping, or an owned
/// buffer for byte-slice opens. The descriptor is held for the mapping's
/// lifetime and released when the `EvioFile` is dropped.
enum Mapping {
    Mapped { _file: File, map: Mmap },
    Owned(Vec<u8>),
}

impl Mapping {
    fn bytes(&self) -> &[u8] {
        match self {
            Mapping::Mapped { map, .. } => map,
            Mapping::Owned(bytes) => bytes,
        }
    }
}

/// Memoized outcome of a record parse: the header and the validated
/// event table.
type RecordParts = (RecordHeader, Arc<[(usize, usize)]>);

/// An open EVIO v6 file: the mapping, the parsed file header, and the
/// discovered record offsets. Immutable after open; the per-record parse
/// cache is write-once and safe to share between readers.
pub struct EvioFile {
    mapping: Mapping,
    header: FileHeader,
    record_offsets: Vec<usize>,
    record_cache: Vec<OnceLock<RecordParts>>,
    /// Offset of the record where a linear scan stopped on a bad header,
    /// surfaced once by the record iterator after the good records.
    scan_failure: Option<usize>,
}

impl EvioFile {
    /// Open and map a file, parse its header, and locate its records.
    pub fn open(path: impl AsRef<Path>) -> Result<EvioFile> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };
        Self::from_mapping(Mapping::Mapped { _file: file, map })
    }

    /// Decode an in-memory byte buffer instead of a mapped file.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<EvioFile> {
        Self::from_mapping(Mapping::Owned(bytes.into()))
    }

    fn from_mapping(mapping: Mapping) -> Result<EvioFile> {
        let header = FileHeader::parse(mapping.bytes())?;
        let (record_offsets, scan_failure) = discover_records(mapping.bytes(), &header)?;
        let record_cache = record_offsets.iter().map(|_| OnceLock::new()).collect();
        Ok(EvioFile {
            mapping,
            header,
            record_offsets,
            record_cache,
            scan_failure,
        })
    }

    /// The raw mapped bytes.
    pub fn data(&self) -> &[u8] {
        self.mapping.bytes()
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The byte order elected from the file-header magic.
    pub fn endianness(&self) -> Endianness {
        self.header.endian
    }

    /// Number of records located in the file.
    pub fn record_count(&self) -> usize {
        self.record_offsets.len()
    }

    /// Get a record by index. The header and event index are parsed and
    /// validated on first access and memoized; later accesses rebuild the
    /// record from the cached parts.
    pub fn record(&self, index: usize) -> Result<Record<'_>> {
        let &offset = self
            .record_offsets
            .get(index)
            .ok_or(EvioError::OutOfRange {
                index,
                count: self.record_offsets.len(),
            })?;
        let slot = &self.record_cache[index];
        if let Some((header, events)) = slot.get() {
            return Ok(Record::from_parts(
                self.data(),
                self.header.endian,
                offset,
                header.clone(),
                events.clone(),
            ));
        }
        let record = Record::parse(self.data(), offset, self.header.endian)?;
        let _ = slot.set(record.parts());
        Ok(record)
    }

    /// Iterate records in file order. A corrupt record is surfaced as an
    /// error for its index, after which the iterator ends; records before
    /// it remain accessible through `record`.
    pub fn records(&self) -> Records<'_> {
        Records {
            file: self,
            index: 0,
            done: false,
        }
    }

    /// The file's user header bytes, unpadded. Not interpreted by the
    /// decoder beyond locating it.
    pub fn user_header_bytes(&self) -> Result<&[u8]> {
        slice_at(
            self.data(),
            self.header.user_header_offset(),
            self.header.user_header_length as usize,
        )
    }

    /// The XML dictionary region, when the header flags one. The
    /// dictionary travels in the user header; parsing it is left to the
    /// caller.
    pub fn dictionary_bytes(&self) -> Result<Option<&[u8]>> {
        if self.header.has_dictionary {
            self.user_header_bytes().map(Some)
        } else {
            Ok(None)
        }
    }

    /// The first-event region, when the header flags one. Carried in the
    /// user header and not interpreted structurally.
    pub fn first_event_bytes(&self) -> Result<Option<&[u8]>> {
        if self.header.has_first_event {
            self.user_header_bytes().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parse the trailer record, when the header records its position.
    pub fn trailer_record(&self) -> Result<Option<Record<'_>>> {
        if self.header.trailer_position == 0 {
            return Ok(None);
        }
        Record::parse(
            self.data(),
            self.header.trailer_position as usize,
            self.header.endian,
        )
        .map(Some)
    }
}

/// Locate every record. Priority: the file-header index, then the trailer
/// index, then a linear scan. When both indexes exist they must agree.
fn discover_records(
    data: &[u8],
    header: &FileHeader,
) -> Result<(Vec<usize>, Option<usize>)> {
    let first = header.first_record_offset();

    let from_file_index = if header.index_array_length > 0 {
        let entries = parse_record_index(
            data,
            header.index_array_offset(),
            header.index_array_length as usize,
            header.endian,
            Some(header.record_count),
        )?;
        Some(offsets_from_entries(first, &entries))
    } else {
        None
    };

    let from_trailer = if header.trailer_has_index && header.trailer_position != 0 {
        let trailer = Record::parse(data, header.trailer_position as usize, header.endian)?;
        let entries = trailer.record_index(Some(header.record_count))?;
        Some(offsets_from_entries(first, &entries))
    } else {
        None
    };

    match (from_file_index, from_trailer) {
        (Some(from_file), Some(from_trailer)) => {
            if from_file != from_trailer {
                return Err(EvioError::Corruption(
                    "file-header and trailer record indexes disagree".into(),
                ));
            }
            debug!(records = from_file.len(), "record discovery via file-header index");
            Ok((from_file, None))
        }
        (Some(offsets), None) => {
            debug!(records = offsets.len(), "record discovery via file-header index");
            Ok((offsets, None))
        }
        (None, Some(offsets)) => {
            debug!(records = offsets.len(), "record discovery via trailer index");
            Ok((offsets, None))
        }
        (None, None) => {
            let (offsets, failure) = linear_scan(data, first, header.endian);
            debug!(records = offsets.len(), "record discovery via linear scan");
            Ok((offsets, failure))
        }
    }
}

fn offsets_from_entries(first: usize, entries: &[RecordIndexEntry]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(entries.len());
    let mut offset = first;
    for entry in entries {
        offsets.push(offset);
        offset += entry.length_words as usize * 4;
    }
    offsets
}

/// Step record headers from the first record to the end of the mapping.
/// Stops at the last-record flag, a trailer, or the first bad header; the
/// bad offset is kept so the iterator can surface the error.
fn linear_scan(
    data: &[u8],
    first: usize,
    endian: Endianness,
) -> (Vec<usize>, Option<usize>) {
    let mut offsets = Vec::new();
    let mut offset = first;
    while offset < data.len() {
        let header = match RecordHeader::parse(data, offset, endian) {
            Ok(header) => header,
            Err(_) => return (offsets, Some(offset)),
        };
        offsets.push(offset);
        let next = offset + header.byte_len();
        if header.is_last_record || header.is_trailer() || next > data.len() {
            break;
        }
        offset = next;
    }
    (offsets, None)
}

/// Iterator over a file's records.
pub struct Records<'a> {
    file: &'a EvioFile,
    index: usize,
    done: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.index < self.file.record_offsets.len() {
            let record = self.file.record(self.index);
            self.index += 1;
            if record.is_err() {
                self.done = true;
            }
            return Some(record);
        }
        self.done = true;
        if let Some(offset) = self.file.scan_failure {
            // Re-parse the bad header to reproduce the scan error.
            return match RecordHeader::parse(self.file.data(), offset, self.file.header.endian) {
                Err(err) => Some(Err(err)),
                Ok(_) => Some(Err(EvioError::Corruption(format!(
                    "record scan stopped at byte offset {offset}"
                )))),
            };
        }
        None
    }
}
