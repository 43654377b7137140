//! Generation config surface, validation and guardrails

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::seed::SeedInput;

/// Hard ceiling on `width * height`. Larger requests are rejected with
/// [`Error::ConfigDimensionTooLarge`].
pub const MAX_CELLS: usize = 1_048_576;

/// Smallest accepted grid edge.
pub const MIN_DIMENSION: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmKind {
    Bsp,
    Cellular,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorStyle {
    /// A* router with a floor penalty; falls back to L-shape when no
    /// route exists.
    AStar,
    LShape,
    Bresenham,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingPolicy {
    /// Log crossings into the trace and keep going.
    Record,
    /// Fail the run when two unrelated corridors share a cell.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorPosition {
    Center,
    Start,
    End,
    Chokepoint,
}

/// BSP partitioning and room placement knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BspConfig {
    pub min_room_size: usize,
    pub max_room_size: usize,
    pub split_ratio_min: f64,
    pub split_ratio_max: f64,
    pub room_padding: usize,
    pub corridor_width: usize,
    pub max_depth: usize,
    pub room_placement_chance: f64,
    pub aspect_ratio_threshold: f64,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            min_room_size: 4,
            max_room_size: 10,
            split_ratio_min: 0.35,
            split_ratio_max: 0.65,
            room_padding: 1,
            corridor_width: 1,
            max_depth: 4,
            room_placement_chance: 1.0,
            aspect_ratio_threshold: 1.25,
        }
    }
}

/// Cellular automata knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellularConfig {
    /// Probability an interior cell starts as floor.
    pub initial_fill_ratio: f64,
    pub iterations: usize,
    /// Wall neighbors at which a floor cell becomes wall.
    pub birth_limit: usize,
    /// Wall neighbors below which a wall cell dies to floor.
    pub death_limit: usize,
    pub min_region_size: usize,
    /// Keep and connect every region above the size threshold instead of
    /// just the largest.
    pub connect_all_regions: bool,
    /// Chance per large cavern of carving an inset rectangular room.
    pub room_in_cavern_chance: f64,
}

impl Default for CellularConfig {
    fn default() -> Self {
        Self {
            initial_fill_ratio: 0.55,
            iterations: 4,
            birth_limit: 5,
            death_limit: 4,
            min_region_size: 16,
            connect_all_regions: false,
            room_in_cavern_chance: 0.3,
        }
    }
}

/// Door placement knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorConfig {
    pub door_ratio: f64,
    pub allow_locked_doors: bool,
    pub locked_door_ratio: f64,
    pub min_corridor_length: usize,
    pub preferred_position: DoorPosition,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            door_ratio: 0.35,
            allow_locked_doors: false,
            locked_door_ratio: 0.2,
            min_corridor_length: 5,
            preferred_position: DoorPosition::Chokepoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorTheme {
    Water,
    Lava,
}

/// Noise-driven wall decoration (water/lava veins).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecorConfig {
    pub enabled: bool,
    pub theme: DecorTheme,
    /// Noise value above which an eligible wall cell is themed.
    pub threshold: f32,
    pub frequency: f32,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            theme: DecorTheme::Water,
            threshold: 0.55,
            frequency: 0.08,
        }
    }
}

/// The full generation config. All fields have serde defaults so hosts
/// can supply sparse JSON objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub algorithm: AlgorithmKind,
    pub seed: SeedInput,
    /// Cap on placed rooms; `0` means uncapped (subject to density).
    pub room_count: usize,
    pub room_size_range: [usize; 2],
    pub corridor_style: CorridorStyle,
    pub crossing_policy: CrossingPolicy,
    pub bsp: BspConfig,
    pub cellular: CellularConfig,
    pub doors: DoorConfig,
    pub decor: DecorConfig,
    pub trace: bool,
    pub snapshots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
            algorithm: AlgorithmKind::Bsp,
            seed: SeedInput::default(),
            room_count: 0,
            room_size_range: [4, 10],
            corridor_style: CorridorStyle::AStar,
            crossing_policy: CrossingPolicy::Record,
            bsp: BspConfig::default(),
            cellular: CellularConfig::default(),
            doors: DoorConfig::default(),
            decor: DecorConfig::default(),
            trace: false,
            snapshots: false,
        }
    }
}

impl Config {
    /// Schema validation. Every failed check lands in the error list so
    /// a caller can fix the whole config in one round.
    pub fn validate(&self) -> Result<()> {
        if self.width * self.height > MAX_CELLS {
            return Err(Error::ConfigDimensionTooLarge {
                width: self.width,
                height: self.height,
            });
        }

        let mut errors = Vec::new();
        if self.width < MIN_DIMENSION || self.height < MIN_DIMENSION {
            errors.push(format!(
                "dimensions must be at least {MIN_DIMENSION}x{MIN_DIMENSION}, got {}x{}",
                self.width, self.height
            ));
        }
        if self.room_size_range[0] < 3 {
            errors.push("roomSizeRange min must be >= 3".to_string());
        }
        if self.room_size_range[0] > self.room_size_range[1] {
            errors.push("roomSizeRange min exceeds max".to_string());
        }

        let bsp = &self.bsp;
        if bsp.min_room_size < 3 {
            errors.push("bsp.minRoomSize must be >= 3".to_string());
        }
        if bsp.min_room_size > bsp.max_room_size {
            errors.push("bsp.minRoomSize exceeds bsp.maxRoomSize".to_string());
        }
        if !(0.1..=0.9).contains(&bsp.split_ratio_min)
            || !(0.1..=0.9).contains(&bsp.split_ratio_max)
            || bsp.split_ratio_min > bsp.split_ratio_max
        {
            errors.push("bsp split ratios must satisfy 0.1 <= min <= max <= 0.9".to_string());
        }
        if bsp.max_depth == 0 || bsp.max_depth > 12 {
            errors.push("bsp.maxDepth must be in 1..=12".to_string());
        }
        if bsp.corridor_width == 0 || bsp.corridor_width > 5 {
            errors.push("bsp.corridorWidth must be in 1..=5".to_string());
        }
        if !(0.0..=1.0).contains(&bsp.room_placement_chance) {
            errors.push("bsp.roomPlacementChance must be in [0, 1]".to_string());
        }

        let ca = &self.cellular;
        if !(0.0..1.0).contains(&ca.initial_fill_ratio) {
            errors.push("cellular.initialFillRatio must be in [0, 1)".to_string());
        }
        if ca.iterations == 0 || ca.iterations > 10 {
            errors.push("cellular.iterations must be in 1..=10".to_string());
        }
        if !(1..=8).contains(&ca.birth_limit) || !(1..=8).contains(&ca.death_limit) {
            errors.push("cellular birth/death limits must be in 1..=8".to_string());
        }
        if ca.min_region_size == 0 {
            errors.push("cellular.minRegionSize must be >= 1".to_string());
        }

        let doors = &self.doors;
        if !(0.0..=1.0).contains(&doors.door_ratio) || !(0.0..=1.0).contains(&doors.locked_door_ratio)
        {
            errors.push("door ratios must be in [0, 1]".to_string());
        }
        if doors.min_corridor_length < 3 {
            errors.push("doors.minCorridorLength must be >= 3".to_string());
        }

        if !(0.0..=1.0).contains(&self.decor.threshold) {
            errors.push("decor.threshold must be in [0, 1]".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigInvalid { errors })
        }
    }

    /// Clamp unsafe-but-valid values into working ranges. Returns a new
    /// config; the caller's input is never mutated.
    #[must_use]
    pub fn clamped(&self) -> Config {
        let mut cfg = self.clone();

        // Room count density cap: a room footprint can't be smaller than
        // (min + padding)^2, and half the interior stays walls.
        let interior = (cfg.width.saturating_sub(2)) * (cfg.height.saturating_sub(2));
        let footprint = (cfg.bsp.min_room_size + cfg.bsp.room_padding).max(3);
        let density_cap = (interior / (footprint * footprint * 2)).max(1);
        if cfg.room_count == 0 || cfg.room_count > density_cap {
            cfg.room_count = density_cap;
        }

        // A leaf must hold a padded room.
        let max_fit = cfg.width.min(cfg.height).saturating_sub(2 * cfg.bsp.room_padding + 2);
        if cfg.bsp.max_room_size > max_fit && max_fit >= cfg.bsp.min_room_size {
            cfg.bsp.max_room_size = max_fit;
        }

        // Region threshold may not swallow the whole interior.
        let cap = (interior / 2).max(1);
        if cfg.cellular.min_region_size > cap {
            cfg.cellular.min_region_size = cap;
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn oversized_grid_rejected() {
        let cfg = Config {
            width: 2048,
            height: 2048,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), "ConfigDimensionTooLarge");
    }

    #[test]
    fn invalid_fields_collect_errors() {
        let mut cfg = Config::default();
        cfg.cellular.iterations = 0;
        cfg.doors.door_ratio = 2.0;
        cfg.bsp.split_ratio_min = 0.8;
        cfg.bsp.split_ratio_max = 0.2;
        match cfg.validate() {
            Err(Error::ConfigInvalid { errors }) => assert!(errors.len() >= 3),
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn room_count_clamped_by_density() {
        let cfg = Config {
            width: 40,
            height: 30,
            room_count: 10_000,
            ..Config::default()
        };
        let clamped = cfg.clamped();
        assert!(clamped.room_count < 100);
        assert!(clamped.room_count >= 1);
    }

    #[test]
    fn sparse_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"width": 50, "height": 20}"#).unwrap();
        assert_eq!(cfg.width, 50);
        assert_eq!(cfg.height, 20);
        assert_eq!(cfg.bsp.max_depth, BspConfig::default().max_depth);
    }

    #[test]
    fn seed_accepts_number_or_string() {
        let cfg: Config = serde_json::from_str(r#"{"seed": 12345}"#).unwrap();
        assert_eq!(cfg.seed, SeedInput::Number(12345));
        let cfg: Config = serde_json::from_str(r#"{"seed": "hard_seed"}"#).unwrap();
        assert_eq!(cfg.seed, SeedInput::Text("hard_seed".into()));
    }
}
