//! Chunk decoding.
//!
//! This module handles:
//! - The per-chunk payload header (length + compression scheme)
//! - Zlib decompression
//! - Turning the chunk's NBT into a [`ChunkGrid`]

pub mod section;

use std::collections::BTreeSet;
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::config::WorldHeight;
use crate::cursor::ByteCursor;
use crate::dictionary::BlockDictionary;
use crate::error::{Error, Result};
use crate::grid::ChunkGrid;
use crate::nbt::{self, Tag};
use crate::region::chunk_to_local;

pub use section::{bit_width, decode_block_states, unpack_indices, Palette};

/// Compression scheme ids used in the Anvil format.
pub mod compression {
    pub const GZIP: u8 = 1;
    pub const ZLIB: u8 = 2;
    pub const NONE: u8 = 3;
    pub const LZ4: u8 = 4;
}

/// A chunk's payload header and its still-compressed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    pub scheme: u8,
    pub compressed: Vec<u8>,
}

impl ChunkPayload {
    /// Parse `[length: 4][scheme: 1][data: length - 1]` from a chunk's sectors.
    ///
    /// Only zlib is supported; any other scheme, or a non-positive length, is
    /// rejected.
    pub fn read(sectors: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(sectors.to_vec());
        let length = cursor.read_i32()?;
        let scheme = cursor.read_u8()?;
        if length <= 0 || scheme != compression::ZLIB {
            return Err(Error::UnsupportedCompression { length, scheme });
        }
        // The length counts the scheme byte.
        let compressed = cursor.read_bytes(length as usize - 1)?;
        Ok(Self { scheme, compressed })
    }

    pub fn decompress(&self) -> Result<Vec<u8>> {
        inflate(&self.compressed)
    }
}

/// Inflate a zlib stream into a fresh buffer.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut nbt_bytes = Vec::new();
    decoder
        .read_to_end(&mut nbt_bytes)
        .map_err(Error::Decompress)?;
    Ok(nbt_bytes)
}

/// A fully decoded chunk column.
#[derive(Debug)]
pub struct DecodedChunk {
    /// Chunk coordinates inside the region (0-31).
    pub local: (i32, i32),
    /// Absolute chunk coordinates from `xPos`/`zPos`.
    pub world: (i32, i32),
    pub grid: ChunkGrid,
    /// Bare names the dictionary could not resolve.
    pub unknown_blocks: BTreeSet<String>,
    pub unresolved_cells: usize,
}

/// Fields live at the root since 1.18 and under `Level` before that.
fn field<'a>(root: &'a Tag, name: &str) -> Option<&'a Tag> {
    root.get(name)
        .or_else(|| root.get("Level").and_then(|level| level.get(name)))
}

fn chunk_coord(root: &Tag, name: &'static str) -> Result<i32> {
    field(root, name)
        .and_then(Tag::as_i32)
        .ok_or(Error::MissingField(name))
}

/// Decode a chunk from its raw sectors (header, compressed NBT and padding).
pub fn decode_chunk(
    sectors: &[u8],
    dictionary: &BlockDictionary,
    world: WorldHeight,
) -> Result<DecodedChunk> {
    let payload = ChunkPayload::read(sectors)?;
    let nbt_bytes = payload.decompress()?;
    let root = nbt::parse_nbt(&mut ByteCursor::new(nbt_bytes))?;
    decode_chunk_nbt(&root, dictionary, world)
}

/// Decode an already parsed chunk root compound.
pub fn decode_chunk_nbt(
    root: &Tag,
    dictionary: &BlockDictionary,
    world: WorldHeight,
) -> Result<DecodedChunk> {
    let world_x = chunk_coord(root, "xPos")?;
    let world_z = chunk_coord(root, "zPos")?;

    let mut grid = ChunkGrid::new(world.section_count());
    let mut unknown_blocks = BTreeSet::new();
    let mut unresolved_cells = 0;

    let sections = field(root, "sections").and_then(Tag::as_list).unwrap_or_default();
    if sections.is_empty() {
        log::debug!("Chunk ({}, {}) has no sections", world_x, world_z);
    }

    for entry in sections {
        // Only the low byte of Y is significant.
        let Some(section_y) = entry.get("Y").and_then(Tag::as_integer).map(|y| y as i8) else {
            log::debug!("Chunk ({}, {}): section without Y, skipped", world_x, world_z);
            continue;
        };
        let Some(slot) = world.section_slot(section_y as i32) else {
            // Vanilla keeps light-only sections one above and below the world.
            log::debug!(
                "Chunk ({}, {}): section Y={} outside the world, skipped",
                world_x,
                world_z,
                section_y
            );
            continue;
        };
        let Some(block_states) = entry.get("block_states") else {
            continue;
        };

        if let Some(decoded) = decode_block_states(block_states, dictionary, &mut unknown_blocks)? {
            unresolved_cells += decoded.unresolved_cells;
            grid.set_section(slot, decoded.grid);
        }
    }

    Ok(DecodedChunk {
        local: (chunk_to_local(world_x), chunk_to_local(world_z)),
        world: (world_x, world_z),
        grid,
        unknown_blocks,
        unresolved_cells,
    })
}
