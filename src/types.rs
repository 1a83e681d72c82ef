// src/types.rs
use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Magic constant in word 7 of the file header and of every record header.
pub const RECORD_MAGIC: u32 = 0xc0da_0100;

/// File-type id in word 0 of the file header (ASCII "EVIO").
pub const FILE_MAGIC: u32 = 0x4556_494f;

/// The only container format version this crate decodes.
pub const EVIO_VERSION: u32 = 6;

/// Minimum header length, in 32-bit words, for both file and record headers.
pub const MIN_HEADER_WORDS: u32 = 14;

/// Byte order elected from the file-header magic and threaded into every
/// decoder call. Never a process-wide global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn is_native(self) -> bool {
        #[cfg(target_endian = "little")]
        {
            self == Endianness::Little
        }
        #[cfg(target_endian = "big")]
        {
            self == Endianness::Big
        }
    }

    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            Endianness::Little => LittleEndian::read_u16(bytes),
            Endianness::Big => BigEndian::read_u16(bytes),
        }
    }

    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            Endianness::Little => LittleEndian::read_u32(bytes),
            Endianness::Big => BigEndian::read_u32(bytes),
        }
    }

    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            Endianness::Little => LittleEndian::read_u64(bytes),
            Endianness::Big => BigEndian::read_u64(bytes),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => write!(f, "little-endian"),
            Endianness::Big => write!(f, "big-endian"),
        }
    }
}

/// Bank content-type codes. The table is exhaustive; it drives all leaf
/// versus container dispatch. Codes 0x21-0x24 (Hollerit, N, n, m) are only
/// legal inside composite format descriptors and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    /// 32-bit values of unknown interpretation, surfaced verbatim, never swapped.
    Unknown32 = 0x0,
    Uint32 = 0x1,
    Float32 = 0x2,
    /// NUL-separated ASCII strings terminated by a run of 0x04 padding.
    StringArray = 0x3,
    Int16 = 0x4,
    Uint16 = 0x5,
    Int8 = 0x6,
    Uint8 = 0x7,
    Float64 = 0x8,
    Int64 = 0x9,
    Uint64 = 0xa,
    Int32 = 0xb,
    TagSegment = 0xc,
    Segment = 0xd,
    Bank = 0xe,
    Composite = 0xf,
    BankAlias = 0x10,
    SegmentAlias = 0x20,
}

impl ContentType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x0 => Some(ContentType::Unknown32),
            0x1 => Some(ContentType::Uint32),
            0x2 => Some(ContentType::Float32),
            0x3 => Some(ContentType::StringArray),
            0x4 => Some(ContentType::Int16),
            0x5 => Some(ContentType::Uint16),
            0x6 => Some(ContentType::Int8),
            0x7 => Some(ContentType::Uint8),
            0x8 => Some(ContentType::Float64),
            0x9 => Some(ContentType::Int64),
            0xa => Some(ContentType::Uint64),
            0xb => Some(ContentType::Int32),
            0xc => Some(ContentType::TagSegment),
            0xd => Some(ContentType::Segment),
            0xe => Some(ContentType::Bank),
            0xf => Some(ContentType::Composite),
            0x10 => Some(ContentType::BankAlias),
            0x20 => Some(ContentType::SegmentAlias),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Element size in bytes for leaf types, None for containers and composite.
    pub fn element_size(self) -> Option<usize> {
        match self {
            ContentType::StringArray | ContentType::Int8 | ContentType::Uint8 => Some(1),
            ContentType::Int16 | ContentType::Uint16 => Some(2),
            ContentType::Unknown32
            | ContentType::Uint32
            | ContentType::Float32
            | ContentType::Int32 => Some(4),
            ContentType::Float64 | ContentType::Int64 | ContentType::Uint64 => Some(8),
            ContentType::TagSegment
            | ContentType::Segment
            | ContentType::Bank
            | ContentType::Composite
            | ContentType::BankAlias
            | ContentType::SegmentAlias => None,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            ContentType::TagSegment
                | ContentType::Segment
                | ContentType::Bank
                | ContentType::BankAlias
                | ContentType::SegmentAlias
        )
    }

    pub fn is_composite(self) -> bool {
        self == ContentType::Composite
    }

    /// Whether the bank-header pad field trims this type's data slice.
    pub fn pad_applies(self) -> bool {
        matches!(
            self,
            ContentType::Int8 | ContentType::Uint8 | ContentType::Int16 | ContentType::Uint16
        )
    }

    pub fn is_signed(self) -> Option<bool> {
        match self {
            ContentType::Int8 | ContentType::Int16 | ContentType::Int32 | ContentType::Int64 => {
                Some(true)
            }
            ContentType::Uint8
            | ContentType::Uint16
            | ContentType::Uint32
            | ContentType::Uint64 => Some(false),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Unknown32 => "unknown32",
            ContentType::Uint32 => "u32",
            ContentType::Float32 => "f32",
            ContentType::StringArray => "string",
            ContentType::Int16 => "i16",
            ContentType::Uint16 => "u16",
            ContentType::Int8 => "i8",
            ContentType::Uint8 => "u8",
            ContentType::Float64 => "f64",
            ContentType::Int64 => "i64",
            ContentType::Uint64 => "u64",
            ContentType::Int32 => "i32",
            ContentType::TagSegment => "tagsegment",
            ContentType::Segment => "segment",
            ContentType::Bank => "bank",
            ContentType::Composite => "composite",
            ContentType::BankAlias => "bank",
            ContentType::SegmentAlias => "segment",
        }
    }
}

/// Record compression code from the high 4 bits of record-header word 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Lz4Fast,
    Lz4Best,
    Gzip,
    Unknown(u8),
}

impl CompressionType {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => CompressionType::None,
            1 => CompressionType::Lz4Fast,
            2 => CompressionType::Lz4Best,
            3 => CompressionType::Gzip,
            other => CompressionType::Unknown(other),
        }
    }

    pub fn is_none(self) -> bool {
        self == CompressionType::None
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionType::None => write!(f, "None"),
            CompressionType::Lz4Fast => write!(f, "LZ4 (fast)"),
            CompressionType::Lz4Best => write!(f, "LZ4 (best)"),
            CompressionType::Gzip => write!(f, "gzip"),
            CompressionType::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

/// Header-kind code from bits 28-31 of file-header word 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Evio,
    EvioExtended,
    Hipo,
    HipoExtended,
}

impl FileKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(FileKind::Evio),
            2 => Some(FileKind::EvioExtended),
            5 => Some(FileKind::Hipo),
            6 => Some(FileKind::HipoExtended),
            _ => None,
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, FileKind::EvioExtended | FileKind::HipoExtended)
    }
}

/// Header-kind code from bits 28-31 of record-header word 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Record,
    Trailer,
    HipoRecord,
    HipoTrailer,
}

impl RecordKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RecordKind::Record),
            3 => Some(RecordKind::Trailer),
            4 => Some(RecordKind::HipoRecord),
            7 => Some(RecordKind::HipoTrailer),
            _ => None,
        }
    }

    pub fn is_trailer(self) -> bool {
        matches!(self, RecordKind::Trailer | RecordKind::HipoTrailer)
    }
}

/// CODA event category from bits 10-13 of record-header word 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    RocRaw,
    Physics,
    PartialPhysics,
    DisentangledPhysics,
    User,
    Control,
    Mixed,
    RocRawStreaming,
    PhysicsStreaming,
    Other,
    Unknown(u8),
}

impl EventCategory {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => EventCategory::RocRaw,
            1 => EventCategory::Physics,
            2 => EventCategory::PartialPhysics,
            3 => EventCategory::DisentangledPhysics,
            4 => EventCategory::User,
            5 => EventCategory::Control,
            6 => EventCategory::Mixed,
            8 => EventCategory::RocRawStreaming,
            9 => EventCategory::PhysicsStreaming,
            15 => EventCategory::Other,
            other => EventCategory::Unknown(other),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventCategory::RocRaw => "ROC Raw",
            EventCategory::Physics => "Physics",
            EventCategory::PartialPhysics => "Partial Physics",
            EventCategory::DisentangledPhysics => "Disentangled Physics",
            EventCategory::User => "User",
            EventCategory::Control => "Control",
            EventCategory::Mixed => "Mixed",
            EventCategory::RocRawStreaming => "ROC Raw Streaming",
            EventCategory::PhysicsStreaming => "Physics Streaming",
            EventCategory::Other => "Other",
            EventCategory::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventCategory::Unknown(code) => write!(f, "Unknown ({code})"),
            other => write!(f, "{}", other.name()),
        }
    }
}
