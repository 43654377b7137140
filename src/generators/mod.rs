//! Per-algorithm pipeline composition and the shared run/finalize path

pub mod bsp;
pub mod cellular;
pub mod hybrid;

use std::time::{Duration, Instant};

use log::debug;

use crate::artifact::{DungeonArtifact, DungeonState};
use crate::cell::CellType;
use crate::checksum;
use crate::config::{AlgorithmKind, Config};
use crate::error::{Error, Result, Violation, ViolationKind};
use crate::pipeline::{GenerateOptions, RunContext};
use crate::rng::Streams;
use crate::seed::Seed;
use crate::trace::Trace;

/// Validate, clamp, run the algorithm's pipeline and finalize the
/// artifact. This is the single execution path behind every public
/// entry point.
pub fn run(config: &Config, options: &GenerateOptions) -> Result<(DungeonArtifact, Trace)> {
    config.validate()?;
    let cfg = config.clamped();

    let deadline = match options.timeout_ms {
        Some(budget) if budget <= 0 => {
            return Err(Error::GenerationTimeout { budget_ms: budget })
        }
        Some(budget) => Some(Instant::now() + Duration::from_millis(budget as u64)),
        None => None,
    };

    let seed = Seed::normalize(&cfg.seed);
    debug!(
        "generating {:?} {}x{} from seed {}",
        cfg.algorithm, cfg.width, cfg.height, seed.numeric_value
    );

    let pipeline = match cfg.algorithm {
        AlgorithmKind::Bsp => bsp::pipeline(&cfg),
        AlgorithmKind::Cellular => cellular::pipeline(&cfg),
        AlgorithmKind::Hybrid => hybrid::pipeline(&cfg),
    };

    let mut streams = Streams::derive(seed.numeric_value);
    let mut trace = Trace::new(cfg.trace, cfg.snapshots);
    let mut state = DungeonState::new(cfg.width, cfg.height);
    {
        let mut run_ctx = RunContext {
            streams: &mut streams,
            config: &cfg,
            seed: &seed,
            trace: &mut trace,
            cancel: options.cancel.as_ref(),
            deadline,
            budget_ms: options.timeout_ms.unwrap_or(0),
        };
        pipeline.run(&mut state, &mut run_ctx)?;
    }

    let artifact = finalize(state, seed)?;
    Ok((artifact, trace))
}

/// Copy the grid into the terminal artifact, re-validate spawns against
/// the finalized terrain, and stamp the checksum.
fn finalize(mut state: DungeonState, seed: Seed) -> Result<DungeonArtifact> {
    state.rooms.sort_by_key(|r| r.id);
    state
        .connections
        .sort_by_key(|c| (c.from_room_id, c.to_room_id));

    let mut artifact = DungeonArtifact {
        tag: "dungeon".to_string(),
        width: state.width,
        height: state.height,
        terrain: state.grid.to_bytes(),
        rooms: state.rooms,
        connections: state.connections,
        spawns: Vec::new(),
        seed,
        checksum: String::new(),
    };

    // Spawn re-validation: anything no longer on floor in the final
    // terrain is dropped.
    let spawns = std::mem::take(&mut state.spawns);
    artifact.spawns = spawns
        .into_iter()
        .filter(|s| artifact.cell(s.position.x, s.position.y) == CellType::Floor)
        .collect();

    artifact.checksum = checksum::compute(&artifact);
    if !checksum::verify(&artifact) {
        return Err(Error::GenerationFailed {
            pass: "finalize-artifact".to_string(),
            message: "checksum verification failed".to_string(),
            violations: vec![Violation::new(
                ViolationKind::Checksum,
                None,
                "recomputed checksum differs from stored checksum",
            )],
        });
    }
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::CHECKSUM_PREFIX;
    use crate::seed::SeedInput;

    #[test]
    fn zero_timeout_fails_before_any_pass() {
        let config = Config::default();
        let options = GenerateOptions {
            timeout_ms: Some(0),
            ..GenerateOptions::default()
        };
        match run(&config, &options) {
            Err(Error::GenerationTimeout { budget_ms }) => assert_eq!(budget_ms, 0),
            other => panic!("expected GenerationTimeout, got {other:?}"),
        }
    }

    #[test]
    fn run_produces_checksummed_artifact() {
        let config = Config {
            width: 50,
            height: 30,
            seed: SeedInput::Number(7),
            ..Config::default()
        };
        let (artifact, _) = run(&config, &GenerateOptions::default()).unwrap();
        assert!(artifact.checksum.starts_with(CHECKSUM_PREFIX));
        assert_eq!(artifact.terrain.len(), 50 * 30);
        assert!(checksum::verify(&artifact));
    }
}
