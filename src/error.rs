//! Error taxonomy for region decoding.
//!
//! Only [`Error::Io`] (and a file too short to hold a location table) aborts a
//! whole region read. Everything else is scoped to a single chunk and ends up
//! in [`crate::reader::DecodeReport`].

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Read of {requested} bytes at position {position} is out of range (length {length})")]
    OutOfRange {
        position: usize,
        requested: usize,
        length: usize,
    },

    #[error("Unsupported chunk compression: scheme {scheme}, length {length}")]
    UnsupportedCompression { length: i32, scheme: u8 },

    #[error("Decompression failed: {0}")]
    Decompress(std::io::Error),

    #[error("NBT nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("NBT root must be a compound, found type {0}")]
    InvalidRoot(u8),

    #[error("Unknown NBT tag type {0}")]
    UnknownTagType(u8),

    #[error("Missing or mistyped field '{0}'")]
    MissingField(&'static str),

    #[error("Chunk does not belong here: {0}")]
    Mismatch(String),

    #[error("Block dictionary error: {0}")]
    Dictionary(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
