//! Paletted block storage of a single 16x16x16 section.
//!
//! Minecraft stores a list of unique block states per section (the palette)
//! and a long array of bit-packed indices into it. Indices never straddle two
//! longs: each long holds `64 / bits` of them, least significant first.

use std::collections::BTreeSet;

use crate::dictionary::{bare_name, BlockDictionary};
use crate::error::{Error, Result};
use crate::grid::{BlockId, SectionGrid, SECTION_VOLUME};
use crate::nbt::Tag;

/// Smallest index width used for block states.
pub const MIN_BITS_PER_BLOCK: u32 = 4;

/// Bits per packed index for a palette of `palette_len` entries.
pub fn bit_width(palette_len: usize) -> u32 {
    let needed = match palette_len {
        0 | 1 => 0,
        n => usize::BITS - (n - 1).leading_zeros(),
    };
    needed.max(MIN_BITS_PER_BLOCK)
}

/// Unpack up to one section's worth of indices.
///
/// Stops after [`SECTION_VOLUME`] indices even if the last long has unused
/// high bits. Returns fewer when the array is too short.
pub fn unpack_indices(words: &[i64], bits: u32) -> Vec<u16> {
    let per_word = (64 / bits) as usize;
    let mask = (1u64 << bits) - 1;

    let mut indices = Vec::with_capacity(SECTION_VOLUME);
    'words: for &word in words {
        let word = word as u64;
        for i in 0..per_word {
            if indices.len() == SECTION_VOLUME {
                break 'words;
            }
            indices.push(((word >> (i as u32 * bits)) & mask) as u16);
        }
    }
    indices
}

/// Bare block names of a palette, in index order.
///
/// Entries without a usable `Name` stay as `None` so that later entries keep
/// their index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    names: Vec<Option<String>>,
}

impl Palette {
    pub fn from_tag(list: &[Tag]) -> Self {
        let names = list
            .iter()
            .map(|entry| {
                entry
                    .get("Name")
                    .and_then(Tag::as_str)
                    .map(|name| bare_name(name).to_string())
            })
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index)?.as_deref()
    }
}

/// Result of decoding one section.
#[derive(Debug)]
pub struct DecodedSection {
    pub grid: SectionGrid,
    /// Cells left at the sentinel because their block was not in the dictionary.
    pub unresolved_cells: usize,
}

/// Decode a section's `block_states` compound.
///
/// Returns `Ok(None)` when there is no palette list (the section stays
/// absent). Names missing from the dictionary are added to `unknown` and
/// their cells keep the sentinel.
pub fn decode_block_states(
    block_states: &Tag,
    dictionary: &BlockDictionary,
    unknown: &mut BTreeSet<String>,
) -> Result<Option<DecodedSection>> {
    let Some(palette) = block_states.get("palette").and_then(Tag::as_list) else {
        return Ok(None);
    };
    let palette = Palette::from_tag(palette);
    if palette.is_empty() {
        return Ok(None);
    }
    // Larger palettes would need indices wider than a `u16`.
    if palette.len() > SECTION_VOLUME {
        return Err(Error::Corrupt(format!(
            "palette of {} entries exceeds {} cells",
            palette.len(),
            SECTION_VOLUME
        )));
    }

    // Resolve each palette entry once instead of once per cell.
    let resolved: Vec<Option<BlockId>> = (0..palette.len())
        .map(|index| {
            let name = palette.name(index)?;
            let id = dictionary.get(name);
            if id.is_none() && unknown.insert(name.to_string()) {
                log::warn!("Unknown block found: {}", name);
            }
            id
        })
        .collect();

    let indices = match block_states.get("data").and_then(Tag::as_long_array) {
        Some(words) => {
            let indices = unpack_indices(words, bit_width(palette.len()));
            if indices.len() < SECTION_VOLUME {
                return Err(Error::Corrupt(format!(
                    "block state data holds {} of {} indices",
                    indices.len(),
                    SECTION_VOLUME
                )));
            }
            indices
        }
        // Single-entry palettes omit the data array.
        None => vec![0; SECTION_VOLUME],
    };

    let mut grid = SectionGrid::new();
    let mut unresolved_cells = 0;
    for (cell, &index) in indices.iter().enumerate() {
        let entry = resolved.get(index as usize).ok_or_else(|| {
            Error::Corrupt(format!(
                "palette index {} out of range for palette of {}",
                index,
                palette.len()
            ))
        })?;
        match entry {
            Some(id) => grid.set_flat(cell, *id),
            None => unresolved_cells += 1,
        }
    }

    Ok(Some(DecodedSection {
        grid,
        unresolved_cells,
    }))
}
