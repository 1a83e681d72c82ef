// tests/common/mod.rs
//! Synthetic EVIO v6 file builder for integration tests. Writes headers,
//! records, and banks in either byte order.
#![allow(dead_code)]

use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub const RECORD_MAGIC: u32 = 0xc0da_0100;
pub const FILE_MAGIC: u32 = 0x4556_494f;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Little,
    Big,
}

/// A growable byte buffer writing multi-byte values in one order.
pub struct Buf {
    pub order: Order,
    pub bytes: Vec<u8>,
}

impl Buf {
    pub fn new(order: Order) -> Buf {
        Buf {
            order,
            bytes: Vec::new(),
        }
    }

    pub fn u32(&mut self, value: u32) {
        let mut word = [0u8; 4];
        match self.order {
            Order::Little => LittleEndian::write_u32(&mut word, value),
            Order::Big => BigEndian::write_u32(&mut word, value),
        }
        self.bytes.extend_from_slice(&word);
    }

    pub fn u64(&mut self, value: u64) {
        let mut word = [0u8; 8];
        match self.order {
            Order::Little => LittleEndian::write_u64(&mut word, value),
            Order::Big => BigEndian::write_u64(&mut word, value),
        }
        self.bytes.extend_from_slice(&word);
    }

    pub fn u16(&mut self, value: u16) {
        let mut word = [0u8; 2];
        match self.order {
            Order::Little => LittleEndian::write_u16(&mut word, value),
            Order::Big => BigEndian::write_u16(&mut word, value),
        }
        self.bytes.extend_from_slice(&word);
    }

    pub fn words(&mut self, words: &[u32]) {
        for &w in words {
            self.u32(w);
        }
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        match self.order {
            Order::Little => LittleEndian::write_u32(&mut self.bytes[offset..], value),
            Order::Big => BigEndian::write_u32(&mut self.bytes[offset..], value),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Pack the second word of a BANK header.
pub fn bank_info(tag: u16, pad: u8, ty: u8, num: u8) -> u32 {
    ((tag as u32) << 16) | ((pad as u32) << 14) | ((ty as u32) << 8) | num as u32
}

/// Pack a SEGMENT header word.
pub fn segment_word(tag: u8, pad: u8, ty: u8, length: u16) -> u32 {
    ((tag as u32) << 24) | ((pad as u32) << 22) | ((ty as u32) << 16) | length as u32
}

/// Pack a TAGSEGMENT header word.
pub fn tagsegment_word(tag: u16, ty: u8, length: u16) -> u32 {
    ((tag as u32) << 20) | ((ty as u32) << 16) | length as u32
}

/// A leaf BANK of u32 values.
pub fn u32_bank(order: Order, tag: u16, num: u8, values: &[u32]) -> Vec<u8> {
    let mut buf = Buf::new(order);
    buf.u32(values.len() as u32 + 1);
    buf.u32(bank_info(tag, 0, 0x1, num));
    buf.words(values);
    buf.bytes
}

/// A leaf BANK of u16 values, padded to the word boundary.
pub fn u16_bank(order: Order, tag: u16, num: u8, values: &[u16]) -> Vec<u8> {
    let byte_len = values.len() * 2;
    let pad = (4 - byte_len % 4) % 4;
    let payload_words = (byte_len + pad) / 4;
    let mut buf = Buf::new(order);
    buf.u32(payload_words as u32 + 1);
    buf.u32(bank_info(tag, pad as u8, 0x5, num));
    for &v in values {
        buf.u16(v);
    }
    buf.raw(&vec![0u8; pad]);
    buf.bytes
}

/// A leaf BANK of u8 values, padded to the word boundary.
pub fn u8_bank(order: Order, tag: u16, num: u8, values: &[u8]) -> Vec<u8> {
    let pad = (4 - values.len() % 4) % 4;
    let payload_words = (values.len() + pad) / 4;
    let mut buf = Buf::new(order);
    buf.u32(payload_words as u32 + 1);
    buf.u32(bank_info(tag, pad as u8, 0x7, num));
    buf.raw(values);
    buf.raw(&vec![0u8; pad]);
    buf.bytes
}

/// A string-array BANK over a pre-padded raw payload.
pub fn string_bank(order: Order, tag: u16, num: u8, payload: &[u8]) -> Vec<u8> {
    assert_eq!(payload.len() % 4, 0, "string payload must be word-aligned");
    let mut buf = Buf::new(order);
    buf.u32(payload.len() as u32 / 4 + 1);
    buf.u32(bank_info(tag, 0, 0x3, num));
    buf.raw(payload);
    buf.bytes
}

/// A container BANK wrapping pre-encoded children. `ty` picks the child
/// shape (0xe/0x10 banks, 0xd/0x20 segments, 0xc tagsegments).
pub fn container_bank(order: Order, tag: u16, ty: u8, num: u8, children: &[Vec<u8>]) -> Vec<u8> {
    let payload: usize = children.iter().map(|c| c.len()).sum();
    assert_eq!(payload % 4, 0);
    let mut buf = Buf::new(order);
    buf.u32(payload as u32 / 4 + 1);
    buf.u32(bank_info(tag, 0, ty, num));
    for child in children {
        buf.raw(child);
    }
    buf.bytes
}

/// Append a 14-word file header. `extra_bits` ORs into word 5 (flags,
/// user-header pad); the version and evio-file kind are always set.
pub fn file_header(
    buf: &mut Buf,
    record_count: u32,
    index_array_len: u32,
    user_header_len: u32,
    extra_bits: u32,
    trailer_position: u64,
) {
    buf.words(&[FILE_MAGIC, 1, 14, record_count, index_array_len]);
    buf.u32(6 | (1 << 28) | extra_bits);
    buf.u32(user_header_len);
    buf.u32(RECORD_MAGIC);
    buf.u64(0);
    buf.u64(trailer_position);
    buf.words(&[0, 0]);
}

/// Append a data record holding pre-encoded events. `extra_bits` ORs into
/// word 5 (last-record flag, event type, pads); `compression` fills the
/// high nibble of word 9.
pub fn record(buf: &mut Buf, number: u32, events: &[Vec<u8>], extra_bits: u32, compression: u32) {
    let event_bytes: usize = events.iter().map(|e| e.len()).sum();
    let record_words = 14 + events.len() + event_bytes / 4;
    buf.words(&[
        record_words as u32,
        number,
        14,
        events.len() as u32,
        events.len() as u32 * 4,
    ]);
    buf.u32(6 | extra_bits);
    buf.u32(0);
    buf.u32(RECORD_MAGIC);
    buf.u32(event_bytes as u32);
    buf.u32(compression << 28);
    buf.u64(0);
    buf.u64(0);
    for event in events {
        buf.u32(event.len() as u32);
    }
    for event in events {
        buf.raw(event);
    }
}

/// Append a trailer whose index region holds (length-words, event-count)
/// pairs for the whole file.
pub fn trailer(buf: &mut Buf, number: u32, pairs: &[(u32, u32)]) {
    let record_words = 14 + pairs.len() * 2;
    buf.words(&[
        record_words as u32,
        number,
        14,
        0,
        pairs.len() as u32 * 8,
    ]);
    buf.u32(6 | (1 << 9) | (3 << 28));
    buf.u32(0);
    buf.u32(RECORD_MAGIC);
    buf.u32(0);
    buf.u32(0);
    buf.u64(0);
    buf.u64(0);
    for &(length_words, event_count) in pairs {
        buf.u32(length_words);
        buf.u32(event_count);
    }
}
