//! Decoder configuration.
//!
//! Defaults match the 1.18+ overworld (Y -64..320). Every value can be
//! overridden through `BLOCKSAGE_*` environment variables.

use crate::grid::SECTION_SIZE;

/// Vertical extent of the world the chunks were saved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldHeight {
    /// Lowest block Y, a multiple of 16.
    pub min_y: i32,
    /// Number of blocks from `min_y` upward, a multiple of 16.
    pub height: u32,
}

impl WorldHeight {
    pub const OVERWORLD: WorldHeight = WorldHeight { min_y: -64, height: 384 };

    pub fn new(min_y: i32, height: u32) -> Self {
        Self { min_y, height }
    }

    /// Number of 16-block sections in a chunk column.
    pub fn section_count(&self) -> usize {
        self.height as usize / SECTION_SIZE
    }

    /// Section index of the lowest section (e.g. -4 for the overworld).
    pub fn min_section(&self) -> i32 {
        self.min_y.div_euclid(SECTION_SIZE as i32)
    }

    /// Zero-based slot of a section, if it lies inside the world.
    pub fn section_slot(&self, section_y: i32) -> Option<usize> {
        let slot = section_y - self.min_section();
        usize::try_from(slot)
            .ok()
            .filter(|&slot| slot < self.section_count())
    }
}

impl Default for WorldHeight {
    fn default() -> Self {
        Self::OVERWORLD
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub world: WorldHeight,
    /// Maximum number of chunks decoded at the same time.
    pub workers: usize,
}

impl ReaderConfig {
    pub fn with_world(mut self, world: WorldHeight) -> Self {
        self.world = world;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Defaults overridden by `BLOCKSAGE_MIN_Y`, `BLOCKSAGE_HEIGHT` and
    /// `BLOCKSAGE_WORKERS`. Unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(min_y) = env_override("BLOCKSAGE_MIN_Y") {
            config.world.min_y = min_y;
        }
        if let Some(height) = env_override("BLOCKSAGE_HEIGHT") {
            config.world.height = height;
        }
        if let Some(workers) = env_override("BLOCKSAGE_WORKERS") {
            config = config.with_workers(workers);
        }
        config
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            world: WorldHeight::default(),
            workers,
        }
    }
}

fn env_override<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}
