//! blocksage: decode Minecraft region files (.mca) into dense voxel grids.
//!
//! The pipeline reads a whole region file, splits it into chunk payloads via
//! the location table, inflates each chunk, parses its NBT and unpacks the
//! paletted block states of every section into numeric block ids looked up
//! in a caller-supplied [`BlockDictionary`]. Chunks are decoded concurrently;
//! a broken chunk is reported in the [`Region`]'s [`DecodeReport`] instead of
//! failing the whole read.
//!
//! ```no_run
//! use blocksage::{read_region, BlockDictionary, NO_DATA};
//!
//! let dictionary = BlockDictionary::from_json_file("block_id_dictionary.json")?;
//! let region = read_region("r.0.0.mca", dictionary)?;
//! if region.block_at(0, 64, 0) != NO_DATA {
//!     println!("found a block");
//! }
//! # Ok::<(), blocksage::Error>(())
//! ```

pub mod chunk;
pub mod config;
pub mod cursor;
pub mod dictionary;
pub mod error;
pub mod grid;
pub mod nbt;
pub mod reader;
pub mod region;

pub use config::{ReaderConfig, WorldHeight};
pub use dictionary::BlockDictionary;
pub use error::{Error, Result};
pub use grid::{BlockId, ChunkGrid, Region, SectionGrid, NO_DATA};
pub use nbt::Tag;
pub use reader::{read_region, ChunkFailure, DecodeReport, RegionReader};
pub use region::RegionPos;
