// src/error.rs
use std::io;
use thiserror::Error;

use crate::types::CompressionType;

#[derive(Error, Debug)]
pub enum EvioError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("magic number 0x{found:08x} at byte offset {offset} matches 0x{expected:08x} in neither byte order")]
    BadMagic {
        offset: usize,
        found: u32,
        expected: u32,
    },

    #[error("unsupported EVIO version {0}, expected 6")]
    UnsupportedVersion(u32),

    #[error("bad header: {0}")]
    BadHeader(String),

    #[error("span [{offset}, {offset}+{needed}) exceeds mapped length {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("corrupt structure: {0}")]
    Corruption(String),

    #[error("compressed records ({0}) are not supported")]
    UnsupportedCompression(CompressionType),

    #[error("bad composite format: {0}")]
    BadComposite(String),

    #[error("index {index} out of range (0-{count})")]
    OutOfRange { index: usize, count: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("invalid UTF-8 in string data")]
    InvalidUtf8,
}

pub type Result<T> = std::result::Result<T, EvioError>;
