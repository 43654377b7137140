//! Determinism guarantees: identical inputs produce identical artifacts,
//! distinct seeds fan out without checksum collisions.

use std::collections::HashSet;

use dungen::{generate, AlgorithmKind, Config, SeedInput};

fn config(algorithm: AlgorithmKind, width: usize, height: usize, seed: u32) -> Config {
    Config {
        width,
        height,
        algorithm,
        seed: SeedInput::Number(seed),
        ..Config::default()
    }
}

#[test]
fn identical_runs_match_byte_for_byte() {
    for algorithm in [
        AlgorithmKind::Bsp,
        AlgorithmKind::Cellular,
        AlgorithmKind::Hybrid,
    ] {
        let cfg = config(algorithm, 80, 60, 12345);
        let a = generate(&cfg).unwrap();
        let b = generate(&cfg).unwrap();
        assert_eq!(a.checksum, b.checksum, "{algorithm:?} checksum drifted");
        assert_eq!(a.terrain, b.terrain, "{algorithm:?} terrain drifted");
        assert_eq!(a.rooms, b.rooms, "{algorithm:?} rooms drifted");
        assert_eq!(a.connections, b.connections);
        assert_eq!(a.spawns, b.spawns);
    }
}

#[test]
fn string_seed_normalizes_identically() {
    let text = Config {
        seed: SeedInput::Text("hard_seed".into()),
        ..config(AlgorithmKind::Bsp, 60, 40, 0)
    };
    let a = generate(&text).unwrap();
    let b = generate(&text).unwrap();
    assert_eq!(a.checksum, b.checksum);
    assert_eq!(a.seed.string_value, "hard_seed");

    // The numeric view drives generation: seeding with it directly
    // reproduces the same artifact.
    let numeric = config(AlgorithmKind::Bsp, 60, 40, a.seed.numeric_value);
    let c = generate(&numeric).unwrap();
    assert_eq!(a.checksum, c.checksum);
}

#[test]
fn bsp_seeds_do_not_collide() {
    let mut seen = HashSet::new();
    for seed in 0..500u32 {
        let artifact = generate(&config(AlgorithmKind::Bsp, 40, 30, seed)).unwrap();
        assert!(
            seen.insert(artifact.checksum.clone()),
            "checksum collision at seed {seed}"
        );
    }
}

#[test]
fn cellular_seeds_do_not_collide() {
    let mut seen = HashSet::new();
    for seed in 0..300u32 {
        let artifact = generate(&config(AlgorithmKind::Cellular, 40, 30, seed)).unwrap();
        assert!(
            seen.insert(artifact.checksum.clone()),
            "checksum collision at seed {seed}"
        );
    }
}

#[test]
fn hybrid_seeds_do_not_collide() {
    let mut seen = HashSet::new();
    for seed in 0..200u32 {
        let artifact = generate(&config(AlgorithmKind::Hybrid, 60, 40, seed)).unwrap();
        assert!(
            seen.insert(artifact.checksum.clone()),
            "checksum collision at seed {seed}"
        );
    }
}

#[test]
fn trace_toggles_do_not_change_output() {
    let plain = config(AlgorithmKind::Bsp, 60, 40, 99);
    let traced = Config {
        trace: true,
        snapshots: true,
        ..plain.clone()
    };
    let a = generate(&plain).unwrap();
    let b = generate(&traced).unwrap();
    assert_eq!(a.checksum, b.checksum);
    assert_eq!(a.terrain, b.terrain);
}
