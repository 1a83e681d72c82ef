// src/lib.rs
//! # evio-rs
//!
//! A read-only decoder for EVIO v6 files, the structured, hierarchical,
//! event-oriented binary container format used in nuclear-physics data
//! acquisition (CODA).
//!
//! The decoder is layered: a memory-mapped file yields records, a record
//! yields events through its event-length index, and an event is a tree
//! of tagged banks whose typed leaves can be materialized as host-order
//! arrays. Everything is lazy; no payload bytes are copied during parse.
//!
//! ## Reading a file
//!
//! ```rust,no_run
//! use evio_rs::*;
//!
//! fn main() -> Result<()> {
//!     let file = EvioFile::open("run42.evio")?;
//!     println!("{} records, {}", file.record_count(), file.endianness());
//!
//!     for record in file.records() {
//!         let record = record?;
//!         for event in record.events()? {
//!             let root = event.root()?;
//!             println!("event {}: tag 0x{:04x}", event.index(), root.tag());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Walking a bank tree
//!
//! ```rust,no_run
//! use evio_rs::*;
//!
//! fn walk(bank: &Bank, depth: usize) -> Result<()> {
//!     println!("{:indent$}{} tag=0x{:04x}", "", bank.content_type().name(),
//!              bank.tag(), indent = depth * 2);
//!     if bank.is_container() {
//!         for child in bank.children()? {
//!             walk(&child?, depth + 1)?;
//!         }
//!     } else if bank.content_type() == ContentType::Uint16 {
//!         let samples: Vec<u16> = bank.as_typed_slice()?.values()?;
//!         println!("{} samples", samples.len());
//!     }
//!     Ok(())
//! }
//! # fn main() {}
//! ```

pub mod bank;
pub mod error;
pub mod event;
pub mod file;
pub mod raw_data;
pub mod record;
pub mod types;

mod utils;

pub use error::{EvioError, Result};

pub use types::{
    CompressionType, ContentType, Endianness, EventCategory, FileKind, RecordKind, EVIO_VERSION,
    FILE_MAGIC, RECORD_MAGIC,
};

pub use file::{EvioFile, FileHeader, Records};

pub use record::{Record, RecordHeader, RecordIndexEntry};

pub use event::Event;

pub use bank::{
    Bank, BankKind, BankShape, Children, CompositeData, CompositeDtype, CompositeField,
    CompositeValue,
};

pub use raw_data::TypedSlice;

pub use utils::hex_dump;

/// Convenient imports for common use cases.
///
/// ```rust
/// use evio_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bank::{Bank, BankKind, BankShape};
    pub use crate::error::{EvioError, Result};
    pub use crate::event::Event;
    pub use crate::file::EvioFile;
    pub use crate::record::Record;
    pub use crate::types::{CompressionType, ContentType, Endianness};
}

/// The library version.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
