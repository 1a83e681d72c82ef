// src/raw_data/mod.rs
//! Materialization of leaf payloads as typed arrays. The decoder itself
//! never copies; a [`TypedSlice`] is the (dtype, byte range, byte order)
//! contract, and [`TypedSlice::values`] is the one place bytes are copied
//! and swapped to host order.

use bytemuck::AnyBitPattern;

use crate::error::{EvioError, Result};
use crate::types::{ContentType, Endianness};
use crate::utils::words::swap_elements;

/// A typed view over a leaf's data bytes. Holds a borrow of the mapping;
/// nothing is copied until `values` is called.
#[derive(Debug, Clone, Copy)]
pub struct TypedSlice<'a> {
    dtype: ContentType,
    bytes: &'a [u8],
    endian: Endianness,
}

impl<'a> TypedSlice<'a> {
    pub(crate) fn new(dtype: ContentType, bytes: &'a [u8], endian: Endianness) -> TypedSlice<'a> {
        TypedSlice {
            dtype,
            bytes,
            endian,
        }
    }

    pub fn dtype(&self) -> ContentType {
        self.dtype
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn endianness(&self) -> Endianness {
        self.endian
    }

    pub fn element_size(&self) -> usize {
        self.dtype.element_size().unwrap_or(1)
    }

    pub fn element_count(&self) -> usize {
        self.bytes.len() / self.element_size()
    }

    /// Whether materialization swaps bytes: the file order differs from the
    /// host and the content is not unknown-32, which is surfaced verbatim.
    pub fn needs_swap(&self) -> bool {
        !self.endian.is_native()
            && self.dtype != ContentType::Unknown32
            && self.element_size() > 1
    }

    /// Copy the slice out as host-order values. `T` must match the
    /// element size of the dtype.
    pub fn values<T: AnyBitPattern + bytemuck::Pod>(&self) -> Result<Vec<T>> {
        let size = self.element_size();
        if std::mem::size_of::<T>() != size {
            return Err(EvioError::TypeMismatch {
                expected: format!("{}-byte elements ({})", size, self.dtype.name()),
                found: format!("{}-byte type", std::mem::size_of::<T>()),
            });
        }
        let mut bytes = self.bytes.to_vec();
        if self.needs_swap() {
            swap_elements(&mut bytes, size);
        }
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}
