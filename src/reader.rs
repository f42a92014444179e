//! Region decoding orchestrator.
//!
//! One blocking task per occupied chunk slot, at most `workers` in flight.
//! Tasks share the immutable file buffer and dictionary and hand their chunk
//! back by value; only this module writes into the [`Region`], after all tasks
//! have been joined. A failing chunk is logged and recorded, never fatal.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunk::{self, DecodedChunk};
use crate::config::ReaderConfig;
use crate::dictionary::BlockDictionary;
use crate::error::{Error, Result};
use crate::grid::Region;
use crate::region::{index_to_local, LocationTable, RegionPos};

/// A chunk that could not be decoded.
#[derive(Debug)]
pub struct ChunkFailure {
    /// Slot index in the location table (0-1023).
    pub index: usize,
    /// Region-local chunk coordinates of the slot.
    pub local: (i32, i32),
    pub error: Error,
}

/// What happened while decoding a region.
#[derive(Debug, Default)]
pub struct DecodeReport {
    /// Occupied slots in the location table.
    pub present: usize,
    /// Chunks written into the region.
    pub decoded: usize,
    pub failures: Vec<ChunkFailure>,
    /// Bare block names missing from the dictionary, across all chunks.
    pub unknown_blocks: BTreeSet<String>,
    /// Cells left at the sentinel because of unknown names.
    pub unresolved_cells: usize,
}

impl DecodeReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Decodes region files against a fixed block dictionary.
#[derive(Debug, Clone)]
pub struct RegionReader {
    dictionary: Arc<BlockDictionary>,
    config: ReaderConfig,
}

impl RegionReader {
    pub fn new(dictionary: BlockDictionary, config: ReaderConfig) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
            config,
        }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &BlockDictionary {
        &self.dictionary
    }

    /// Read and decode a region file.
    ///
    /// Only failing to read the file (or a file too short for its location
    /// table) is an error; broken chunks end up in [`Region::report`].
    pub async fn read<P: AsRef<Path>>(&self, path: P) -> Result<Region> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        log::info!("Read region file {} ({} bytes)", path.display(), bytes.len());
        let name = path.file_name().and_then(|name| name.to_str());
        self.decode(bytes, name).await
    }

    /// Blocking variant of [`RegionReader::read`] on a private runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn read_blocking<P: AsRef<Path>>(&self, path: P) -> Result<Region> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.read(path))
    }

    /// Decode a region from bytes already in memory.
    ///
    /// `file_name` (like `r.0.-1.mca`) is only used for the origin when no
    /// chunk decodes, and to cross-check it otherwise.
    pub async fn decode(&self, file: Vec<u8>, file_name: Option<&str>) -> Result<Region> {
        let table = LocationTable::parse(&file)?;
        let file: Arc<[u8]> = Arc::from(file);
        let world = self.config.world;

        // `workers` may be set directly to 0 or past the semaphore limit.
        let workers = self.config.workers.clamp(1, Semaphore::MAX_PERMITS);
        let limiter = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut slots = HashMap::new();

        for (index, location) in table.present() {
            let Ok(permit) = Arc::clone(&limiter).acquire_owned().await else {
                log::error!("Worker limiter closed, {} chunks not dispatched", table.present_count() - slots.len());
                break;
            };
            let file = Arc::clone(&file);
            let dictionary = Arc::clone(&self.dictionary);
            let handle = tasks.spawn_blocking(move || {
                let _permit = permit;
                location
                    .slice(&file)
                    .and_then(|sectors| chunk::decode_chunk(sectors, &dictionary, world))
            });
            slots.insert(handle.id(), index);
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = slots.get(&id) {
                        outcomes.push((index, result));
                    }
                }
                Err(join_error) => {
                    if let Some(&index) = slots.get(&join_error.id()) {
                        outcomes.push((
                            index,
                            Err(Error::Corrupt(format!("decode task failed: {}", join_error))),
                        ));
                    }
                }
            }
        }

        // Join order is arbitrary; assemble in slot order so the origin is stable.
        outcomes.sort_by_key(|(index, _)| *index);

        let mut report = DecodeReport {
            present: table.present_count(),
            ..DecodeReport::default()
        };
        let mut region = Region::new(world);
        let mut origin: Option<RegionPos> = None;

        for (index, outcome) in outcomes {
            let placed = outcome.and_then(|chunk| check_placement(index, &chunk, origin).map(|()| chunk));
            match placed {
                Ok(chunk) => {
                    if origin.is_none() {
                        origin = Some(RegionPos::from_chunk(chunk.world.0, chunk.world.1));
                    }
                    report.decoded += 1;
                    report.unresolved_cells += chunk.unresolved_cells;
                    report.unknown_blocks.extend(chunk.unknown_blocks);
                    region.insert_chunk(chunk.local.0, chunk.local.1, chunk.grid);
                }
                Err(error) => {
                    let local = index_to_local(index);
                    log::warn!("Error processing chunk {} at {:?}: {}", index, local, error);
                    report.failures.push(ChunkFailure { index, local, error });
                }
            }
        }

        let named = file_name.and_then(RegionPos::from_filename);
        match (origin, named) {
            (Some(decoded), Some(named)) if decoded != named => {
                log::warn!(
                    "Region {:?} holds chunks of region {:?}; using the chunk data",
                    named,
                    decoded
                );
            }
            (None, _) => origin = named,
            _ => {}
        }
        region.set_origin(origin);

        log::info!(
            "Chunk processing complete: {}/{} decoded, {} failed, region {:?}",
            report.decoded,
            report.present,
            report.failed(),
            origin
        );
        if !report.unknown_blocks.is_empty() {
            log::warn!("{} block names missing from the dictionary", report.unknown_blocks.len());
        }

        region.set_report(report);
        Ok(region)
    }
}

/// Reject chunks that would land in the wrong slot or belong to another region.
fn check_placement(index: usize, chunk: &DecodedChunk, origin: Option<RegionPos>) -> Result<()> {
    let slot = index_to_local(index);
    if chunk.local != slot {
        return Err(Error::Mismatch(format!(
            "chunk {:?} is stored in slot {:?}",
            chunk.world, slot
        )));
    }
    if let Some(origin) = origin {
        let region = RegionPos::from_chunk(chunk.world.0, chunk.world.1);
        if region != origin {
            return Err(Error::Mismatch(format!(
                "chunk {:?} belongs to region {:?}, not {:?}",
                chunk.world, region, origin
            )));
        }
    }
    Ok(())
}

/// Read a region file with default settings, blocking the current thread.
pub fn read_region<P: AsRef<Path>>(path: P, dictionary: BlockDictionary) -> Result<Region> {
    RegionReader::new(dictionary, ReaderConfig::default()).read_blocking(path)
}
