//! Dense voxel storage: sections, chunk columns and the 32x32 region.
//!
//! Cells hold numeric block ids from the caller's dictionary. [`NO_DATA`]
//! marks cells nothing was decoded for: absent chunks, absent sections and
//! palette entries the dictionary could not resolve.

use crate::config::WorldHeight;
use crate::reader::DecodeReport;
use crate::region::{chunk_to_local, index_to_local, local_to_index, RegionPos, CHUNKS_PER_REGION, REGION_SIZE};

pub type BlockId = u16;

/// Sentinel for "no data here", distinct from a valid id 0.
pub const NO_DATA: BlockId = 0xFFFF;

/// Edge length of a section and width of a chunk, in blocks.
pub const SECTION_SIZE: usize = 16;

/// Number of blocks in one section.
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

/// Flat index of a section-local position; X varies fastest, then Z, then Y.
#[inline]
pub fn section_index(x: usize, y: usize, z: usize) -> usize {
    x + z * SECTION_SIZE + y * SECTION_SIZE * SECTION_SIZE
}

/// Section-local `(x, y, z)` of a flat index.
#[inline]
pub fn section_position(index: usize) -> (usize, usize, usize) {
    let x = index % SECTION_SIZE;
    let z = (index / SECTION_SIZE) % SECTION_SIZE;
    let y = index / (SECTION_SIZE * SECTION_SIZE);
    (x, y, z)
}

/// A 16x16x16 cube of block ids.
#[derive(Clone, PartialEq, Eq)]
pub struct SectionGrid {
    blocks: Box<[BlockId; SECTION_VOLUME]>,
}

impl SectionGrid {
    /// A section with every cell set to [`NO_DATA`].
    pub fn new() -> Self {
        Self::filled(NO_DATA)
    }

    pub fn filled(id: BlockId) -> Self {
        Self {
            blocks: Box::new([id; SECTION_VOLUME]),
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[section_index(x, y, z)]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        self.blocks[section_index(x, y, z)] = id;
    }

    pub fn as_slice(&self) -> &[BlockId] {
        &self.blocks[..]
    }

    pub(crate) fn set_flat(&mut self, index: usize, id: BlockId) {
        self.blocks[index] = id;
    }
}

impl Default for SectionGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SectionGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = self.blocks.iter().filter(|&&id| id != NO_DATA).count();
        f.debug_struct("SectionGrid").field("filled", &filled).finish()
    }
}

/// One chunk column: a section slot per 16 blocks of world height.
///
/// Absent sections are not allocated; they read as [`NO_DATA`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    sections: Vec<Option<SectionGrid>>,
}

impl ChunkGrid {
    pub fn new(section_count: usize) -> Self {
        Self {
            sections: vec![None; section_count],
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn section(&self, slot: usize) -> Option<&SectionGrid> {
        self.sections.get(slot)?.as_ref()
    }

    pub fn set_section(&mut self, slot: usize, section: SectionGrid) {
        if let Some(entry) = self.sections.get_mut(slot) {
            *entry = Some(section);
        }
    }

    /// Number of sections that hold decoded data.
    pub fn present_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_some()).count()
    }

    /// Block at chunk-local `x`/`z` and `y` counted from the bottom of the column.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> BlockId {
        if x >= SECTION_SIZE || z >= SECTION_SIZE {
            return NO_DATA;
        }
        self.section(y / SECTION_SIZE)
            .map_or(NO_DATA, |section| section.get(x, y % SECTION_SIZE, z))
    }
}

/// A decoded region: 32x32 chunk columns plus their world placement.
///
/// This is the only type downstream consumers see. It is immutable once the
/// reader hands it out.
#[derive(Debug)]
pub struct Region {
    chunks: Vec<Option<ChunkGrid>>,
    origin: Option<RegionPos>,
    world: WorldHeight,
    report: DecodeReport,
}

impl Region {
    pub(crate) fn new(world: WorldHeight) -> Self {
        Self {
            chunks: vec![None; CHUNKS_PER_REGION],
            origin: None,
            world,
            report: DecodeReport::default(),
        }
    }

    pub(crate) fn insert_chunk(&mut self, local_x: i32, local_z: i32, chunk: ChunkGrid) {
        self.chunks[local_to_index(local_x, local_z)] = Some(chunk);
    }

    pub(crate) fn set_origin(&mut self, origin: Option<RegionPos>) {
        self.origin = origin;
    }

    pub(crate) fn set_report(&mut self, report: DecodeReport) {
        self.report = report;
    }

    /// Region coordinates (in units of 32 chunks), if they could be determined.
    pub fn origin(&self) -> Option<RegionPos> {
        self.origin
    }

    pub fn world_height(&self) -> WorldHeight {
        self.world
    }

    pub fn report(&self) -> &DecodeReport {
        &self.report
    }

    pub fn size_x(&self) -> usize {
        REGION_SIZE as usize * SECTION_SIZE
    }

    pub fn size_y(&self) -> usize {
        self.world.height as usize
    }

    pub fn size_z(&self) -> usize {
        REGION_SIZE as usize * SECTION_SIZE
    }

    /// Chunk column at region-local chunk coordinates.
    pub fn chunk(&self, local_x: i32, local_z: i32) -> Option<&ChunkGrid> {
        if !(0..REGION_SIZE).contains(&local_x) || !(0..REGION_SIZE).contains(&local_z) {
            return None;
        }
        self.chunks[local_to_index(local_x, local_z)].as_ref()
    }

    /// Decoded chunk columns with their region-local coordinates.
    pub fn chunks(&self) -> impl Iterator<Item = ((i32, i32), &ChunkGrid)> + '_ {
        self.chunks
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| chunk.as_ref().map(|c| (index_to_local(index), c)))
    }

    /// Block at region-local block coordinates, `y` counted from the bottom
    /// of the world. Anything out of bounds or undecoded is [`NO_DATA`].
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> BlockId {
        if x >= self.size_x() || y >= self.size_y() || z >= self.size_z() {
            return NO_DATA;
        }
        let chunk_x = (x / SECTION_SIZE) as i32;
        let chunk_z = (z / SECTION_SIZE) as i32;
        self.chunk(chunk_x, chunk_z)
            .map_or(NO_DATA, |chunk| chunk.block_at(x % SECTION_SIZE, y, z % SECTION_SIZE))
    }

    /// Block at absolute world coordinates. [`NO_DATA`] outside this region.
    pub fn block_at_world(&self, x: i32, y: i32, z: i32) -> BlockId {
        let Some(origin) = self.origin else {
            return NO_DATA;
        };
        let size = SECTION_SIZE as i32;
        let chunk_x = x.div_euclid(size);
        let chunk_z = z.div_euclid(size);
        if RegionPos::from_chunk(chunk_x, chunk_z) != origin {
            return NO_DATA;
        }
        let Some(local_y) = y
            .checked_sub(self.world.min_y)
            .and_then(|local_y| usize::try_from(local_y).ok())
        else {
            return NO_DATA;
        };
        let local_x = chunk_to_local(chunk_x) as usize * SECTION_SIZE + x.rem_euclid(size) as usize;
        let local_z = chunk_to_local(chunk_z) as usize * SECTION_SIZE + z.rem_euclid(size) as usize;
        self.block_at(local_x, local_y, local_z)
    }
}
