//! # dungen
//!
//! A deterministic procedural dungeon synthesis engine.
//!
//! Generation is modeled as a typed pipeline: a seed and a [`Config`]
//! enter a generator, a sequence of passes transforms the working
//! dungeon state, and out comes a serializable [`DungeonArtifact`] with
//! rooms, corridors, spawn points and a verification checksum. All
//! randomness flows through four purpose-bound PRNG streams derived
//! from the seed, so the same `(config, seed)` pair always reproduces
//! the same artifact, byte for byte.
//!
//! ## Quick start
//!
//! ```rust
//! use dungen::{generate, Config, SeedInput};
//!
//! let config = Config {
//!     width: 60,
//!     height: 40,
//!     seed: SeedInput::Number(12345),
//!     ..Config::default()
//! };
//! let dungeon = generate(&config).unwrap();
//!
//! assert!(dungeon.rooms.len() >= 3);
//! assert!(dungeon.checksum.starts_with("v2:"));
//! println!("{dungeon}");
//! ```
//!
//! ## Algorithms
//!
//! Three pipelines are available through [`Config::algorithm`]:
//! - `bsp` - binary space partitioning with carved corridors
//! - `cellular` - cellular automata caves
//! - `hybrid` - zoned mix of both, stitched with wide corridors
//!
//! ## Share codes
//!
//! A seed round-trips through a short share code; regenerating from the
//! code with the same config reproduces the identical checksum:
//!
//! ```rust
//! use dungen::{generate, regenerate_from_code, share_code, Config};
//!
//! let config = Config { width: 50, height: 30, ..Config::default() };
//! let first = generate(&config).unwrap();
//! let code = share_code(&first).unwrap();
//! let second = regenerate_from_code(&code, &config).unwrap();
//! assert_eq!(first.checksum, second.checksum);
//! ```
//!
//! ## Cancellation and budgets
//!
//! [`generate_with`] observes a [`CancelToken`] and a wall-clock budget
//! at pass boundaries and inside long passes; a signaled token yields
//! `Cancelled`, an exhausted budget `GenerationTimeout`. Partial
//! artifacts are never returned.

mod artifact;
mod bitgrid;
mod cell;
mod checksum;
mod config;
mod error;
mod geometry;
mod grid;
mod heap;
mod path;
mod pipeline;
mod rng;
mod seed;
mod trace;
mod unionfind;

pub mod algorithms;
pub mod analysis;
pub mod generators;
pub mod passes;
pub mod spatial;

pub use artifact::{
    Connection, ConnectionKind, DungeonArtifact, DungeonState, Room, RoomKind, SpawnKind,
    SpawnPoint, Zone, ZoneStyle,
};
pub use bitgrid::{BitGrid, BitGridPool};
pub use cell::CellType;
pub use checksum::{compute as compute_checksum, verify as verify_checksum, CHECKSUM_PREFIX};
pub use config::{
    AlgorithmKind, BspConfig, CellularConfig, Config, CorridorStyle, CrossingPolicy, DecorConfig,
    DecorTheme, DoorConfig, DoorPosition, MAX_CELLS,
};
pub use error::{Error, Result, Violation, ViolationKind};
pub use geometry::{Bounds, Dims, Point, Rect};
pub use grid::Grid;
pub use heap::{EntryHeap, FlatHeap, HeapEntry};
pub use path::{compress as compress_path, decompress as decompress_path, CompressedPath, Dir,
    PathMove};
pub use pipeline::{CancelToken, GenerateOptions, Pass, PassContext, Pipeline};
pub use rng::{Rng, Stream, StreamSet, Streams};
pub use seed::{decode_share_code, Seed, SeedInput, SHARE_VERSION};
pub use trace::{GridSnapshot, PassSpan, Trace};
pub use unionfind::UnionFind;

/// Default wall-clock budget for [`generate_with`], in milliseconds.
pub const DEFAULT_TIMEOUT_MS: i64 = 10_000;

/// Generate a dungeon synchronously, with no budget or cancellation.
pub fn generate(config: &Config) -> Result<DungeonArtifact> {
    let (artifact, _) = generators::run(config, &GenerateOptions::default())?;
    Ok(artifact)
}

/// Generate under a cancellation token and a wall-clock budget
/// (defaulting to [`DEFAULT_TIMEOUT_MS`] when none is given). A
/// non-positive budget reports `GenerationTimeout` before any pass
/// runs.
pub fn generate_with(config: &Config, options: &GenerateOptions) -> Result<DungeonArtifact> {
    let mut options = options.clone();
    options.timeout_ms = Some(options.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
    let (artifact, _) = generators::run(config, &options)?;
    Ok(artifact)
}

/// Generate and also return the structured execution trace. Tracing is
/// controlled by [`Config::trace`] and [`Config::snapshots`].
pub fn generate_traced(
    config: &Config,
    options: &GenerateOptions,
) -> Result<(DungeonArtifact, Trace)> {
    generators::run(config, options)
}

/// Decode a share code back to its seed and regenerate with the given
/// config. With the original config this reproduces the original
/// checksum exactly.
pub fn regenerate_from_code(code: &str, config: &Config) -> Result<DungeonArtifact> {
    let numeric = decode_share_code(code)?;
    let config = Config {
        seed: SeedInput::Number(numeric),
        ..config.clone()
    };
    generate(&config)
}

/// Encode an artifact's seed as a share code.
pub fn share_code(artifact: &DungeonArtifact) -> Result<String> {
    Ok(artifact.seed.share_code())
}
