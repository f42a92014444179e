//! Builders for synthetic region files.
//!
//! Chunks are described with serde structs in the on-disk layout, written
//! with fastnbt, compressed with zlib and packed into sector-aligned region
//! files.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::Serialize;

pub const SECTOR: usize = 4096;

#[derive(Debug, Serialize)]
pub struct ChunkData {
    #[serde(rename = "DataVersion")]
    pub data_version: i32,
    #[serde(rename = "xPos")]
    pub x_pos: i32,
    #[serde(rename = "zPos")]
    pub z_pos: i32,
    #[serde(rename = "Status")]
    pub status: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct Section {
    #[serde(rename = "Y")]
    pub y: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_states: Option<BlockStates>,
}

#[derive(Debug, Serialize)]
pub struct BlockStates {
    pub palette: Vec<BlockState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<fastnbt::LongArray>,
}

#[derive(Debug, Serialize)]
pub struct BlockState {
    #[serde(rename = "Name")]
    pub name: String,
}

impl ChunkData {
    pub fn new(x_pos: i32, z_pos: i32) -> Self {
        Self {
            data_version: 3953,
            x_pos,
            z_pos,
            status: "minecraft:full".to_string(),
            sections: Vec::new(),
        }
    }

    /// Add a section made of a single block.
    pub fn uniform(mut self, y: i8, name: &str) -> Self {
        self.sections.push(Section {
            y,
            block_states: Some(BlockStates {
                palette: vec![BlockState { name: name.to_string() }],
                data: None,
            }),
        });
        self
    }

    /// Add a section whose cells index into `palette`, in x, z, y order.
    pub fn paletted(mut self, y: i8, palette: &[&str], indices: &[u16]) -> Self {
        let bits = bit_width(palette.len());
        self.sections.push(Section {
            y,
            block_states: Some(BlockStates {
                palette: palette
                    .iter()
                    .map(|name| BlockState { name: name.to_string() })
                    .collect(),
                data: Some(fastnbt::LongArray::new(pack(indices, bits))),
            }),
        });
        self
    }
}

pub fn bit_width(palette_len: usize) -> u32 {
    let needed = usize::BITS - palette_len.saturating_sub(1).leading_zeros();
    needed.max(4)
}

/// Pack indices LSB first without spanning longs.
pub fn pack(indices: &[u16], bits: u32) -> Vec<i64> {
    let per_word = (64 / bits) as usize;
    indices
        .chunks(per_word)
        .map(|group| {
            group
                .iter()
                .enumerate()
                .fold(0u64, |word, (i, &index)| word | (index as u64) << (i as u32 * bits))
                as i64
        })
        .collect()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// `[length][scheme][body]` as stored at the start of a chunk's sectors.
pub fn payload(scheme: u8, body: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(5 + body.len());
    blob.extend_from_slice(&((body.len() + 1) as u32).to_be_bytes());
    blob.push(scheme);
    blob.extend_from_slice(body);
    blob
}

pub fn chunk_payload(chunk: &ChunkData) -> Vec<u8> {
    let nbt = fastnbt::to_bytes(chunk).unwrap();
    payload(2, &zlib(&nbt))
}

/// Assembles a region file from per-slot payloads.
#[derive(Default)]
pub struct RegionBuilder {
    slots: Vec<(usize, Vec<u8>)>,
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a chunk in the slot matching its own coordinates.
    pub fn chunk(self, chunk: &ChunkData) -> Self {
        let index = slot(chunk.x_pos, chunk.z_pos);
        self.raw(index, chunk_payload(chunk))
    }

    pub fn raw(mut self, index: usize, payload: Vec<u8>) -> Self {
        self.slots.push((index, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut file = vec![0u8; 2 * SECTOR];
        for (index, payload) in self.slots {
            let offset = file.len() / SECTOR;
            let count = payload.len().div_ceil(SECTOR);
            let word = ((offset as u32) << 8) | count as u32;
            file[index * 4..index * 4 + 4].copy_from_slice(&word.to_be_bytes());
            file.extend_from_slice(&payload);
            file.resize((offset + count) * SECTOR, 0);
        }
        file
    }
}

/// Location table slot of an absolute chunk position.
pub fn slot(chunk_x: i32, chunk_z: i32) -> usize {
    (chunk_x.rem_euclid(32) + chunk_z.rem_euclid(32) * 32) as usize
}

pub fn dictionary() -> blocksage::BlockDictionary {
    blocksage::BlockDictionary::from_json(r#"{"air": 0, "stone": 1, "dirt": 2, "oak_log": 3}"#)
        .unwrap()
}
