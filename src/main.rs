//! blocksage: decode a Minecraft region file and summarize its contents.
//!
//! Settings come from the command line, falling back to `BLOCKSAGE_*`
//! environment variables and then to overworld defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use blocksage::{BlockDictionary, BlockId, ReaderConfig, RegionReader, WorldHeight, NO_DATA};

#[derive(Parser)]
#[command(name = "blocksage", about = "Decode a Minecraft region file into a voxel grid")]
pub struct Args {
    /// Region file, e.g. "r.0.0.mca"
    pub region: PathBuf,

    /// JSON object mapping block names to numeric ids
    #[arg(short, long, env = "BLOCKSAGE_DICTIONARY")]
    pub dictionary: PathBuf,

    /// Lowest block Y of the world
    #[arg(long, allow_hyphen_values = true)]
    pub min_y: Option<i32>,

    /// World height in blocks
    #[arg(long)]
    pub height: Option<u32>,

    /// Maximum number of chunks decoded in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Number of most common blocks to list
    #[arg(long, default_value = "10")]
    pub top: usize,
}

impl Args {
    fn reader_config(&self) -> anyhow::Result<ReaderConfig> {
        let mut config = ReaderConfig::from_env();
        let world = WorldHeight::new(
            self.min_y.unwrap_or(config.world.min_y),
            self.height.unwrap_or(config.world.height),
        );
        if world.min_y % 16 != 0 || world.height % 16 != 0 || world.height == 0 {
            anyhow::bail!("min-y and height must be multiples of 16, got {} and {}", world.min_y, world.height);
        }
        config = config.with_world(world);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dictionary = BlockDictionary::from_json_file(&args.dictionary)
        .with_context(|| format!("loading block dictionary {}", args.dictionary.display()))?;
    log::info!("Loaded {} block ids", dictionary.len());

    let config = args.reader_config()?;
    println!(
        "Decoding {} (Y {}..{}, {} workers)...",
        args.region.display(),
        config.world.min_y,
        config.world.min_y + config.world.height as i32,
        config.workers
    );

    let reader = RegionReader::new(dictionary, config);
    let region = reader
        .read(&args.region)
        .await
        .with_context(|| format!("reading region {}", args.region.display()))?;

    let report = region.report();
    match region.origin() {
        Some(origin) => println!("Region X: {}\nRegion Z: {}", origin.x, origin.z),
        None => println!("Region position unknown"),
    }
    println!(
        "Chunks: {} present, {} decoded, {} failed",
        report.present,
        report.decoded,
        report.failed()
    );
    for failure in &report.failures {
        match region.origin() {
            Some(origin) => {
                let (chunk_x, chunk_z) = origin.local_to_world(failure.local.0, failure.local.1);
                println!("  chunk ({}, {}): {}", chunk_x, chunk_z, failure.error);
            }
            None => println!("  slot {:?}: {}", failure.local, failure.error),
        }
    }
    if !report.unknown_blocks.is_empty() {
        println!(
            "Unknown blocks ({} cells): {}",
            report.unresolved_cells,
            report.unknown_blocks.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let mut histogram: HashMap<BlockId, usize> = HashMap::new();
    for (_, chunk) in region.chunks() {
        for slot in 0..chunk.section_count() {
            if let Some(section) = chunk.section(slot) {
                for &id in section.as_slice() {
                    if id != NO_DATA {
                        *histogram.entry(id).or_default() += 1;
                    }
                }
            }
        }
    }
    let mut counts: Vec<(BlockId, usize)> = histogram.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    println!("Most common blocks:");
    for (id, count) in counts.into_iter().take(args.top) {
        let name = reader.dictionary().name_of(id).unwrap_or("?");
        println!("  {:>5} {:<32} {}", id, name, count);
    }

    Ok(())
}
