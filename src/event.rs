// src/event.rs
use crate::bank::{Bank, BankShape};
use crate::error::{EvioError, Result};
use crate::types::Endianness;
use crate::utils::words::slice_at;

/// One event within a record: a byte span taken from the record's
/// event-length index. Its content is a single top-level BANK.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    data: &'a [u8],
    endian: Endianness,
    offset: usize,
    byte_len: usize,
    index: usize,
}

impl<'a> Event<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        endian: Endianness,
        offset: usize,
        byte_len: usize,
        index: usize,
    ) -> Event<'a> {
        Event {
            data,
            endian,
            offset,
            byte_len,
            index,
        }
    }

    /// Byte offset of the event within the mapping.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Position of the event within its record.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bytes(&self) -> Result<&'a [u8]> {
        slice_at(self.data, self.offset, self.byte_len)
    }

    /// Parse the event's top-level bank. The first container of an event
    /// is always a BANK.
    pub fn root(&self) -> Result<Bank<'a>> {
        let bank = Bank::parse(self.data, self.offset, self.endian, BankShape::Bank)?;
        if bank.total_span() > self.byte_len {
            return Err(EvioError::Corruption(format!(
                "event {} root bank spans {} bytes but the event index grants {}",
                self.index,
                bank.total_span(),
                self.byte_len
            )));
        }
        Ok(bank)
    }
}
