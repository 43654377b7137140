//! The working and terminal artifacts of a generation run

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitgrid::BitGridPool;
use crate::cell::CellType;
use crate::geometry::{Point, Rect};
use crate::grid::Grid;
use crate::seed::Seed;
use crate::spatial::flood::Region;

/// Room classification. Entrance and exit are assigned from Dijkstra
/// extremes; caverns come from cellular regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Entrance,
    Exit,
    Boss,
    Treasure,
    Library,
    Cavern,
    Normal,
}

impl RoomKind {
    pub fn ordinal(self) -> u8 {
        match self {
            RoomKind::Entrance => 0,
            RoomKind::Exit => 1,
            RoomKind::Boss => 2,
            RoomKind::Treasure => 3,
            RoomKind::Library => 4,
            RoomKind::Cavern => 5,
            RoomKind::Normal => 6,
        }
    }
}

/// A placed room. Rooms are referenced by integer id everywhere; there
/// is no pointer graph between rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub center_x: i32,
    pub center_y: i32,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    /// Derived 32-bit value for per-room deterministic choices downstream.
    pub seed: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Room {
    /// A rectangular room; the center is the geometric center, which for
    /// rectangles is always a floor cell once carved.
    #[must_use]
    pub fn from_rect(id: u32, rect: Rect, kind: RoomKind, seed: u32) -> Self {
        let center = rect.center();
        Self {
            id,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            center_x: center.x,
            center_y: center.y,
            kind,
            seed,
            tags: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }
}

/// How two rooms are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Open,
    Door,
    LockedDoor,
    Secret,
    Bridge,
    OneWay,
}

/// A carved corridor between two rooms. `path` is the ordered centerline
/// of carved cells, inclusive of both endpoints; adjacent points differ
/// by at most one on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_room_id: u32,
    pub to_room_id: u32,
    pub path: Vec<Point>,
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_position: Option<Point>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Connection {
    #[must_use]
    pub fn open(from_room_id: u32, to_room_id: u32, path: Vec<Point>) -> Self {
        Self {
            from_room_id,
            to_room_id,
            path,
            kind: ConnectionKind::Open,
            door_position: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Spawn classification: the fixed kinds plus free-form tagged strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpawnKind {
    Entrance,
    Exit,
    Spawn,
    Tagged(String),
}

impl SpawnKind {
    pub fn as_str(&self) -> &str {
        match self {
            SpawnKind::Entrance => "entrance",
            SpawnKind::Exit => "exit",
            SpawnKind::Spawn => "spawn",
            SpawnKind::Tagged(s) => s,
        }
    }
}

impl From<String> for SpawnKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "entrance" => SpawnKind::Entrance,
            "exit" => SpawnKind::Exit,
            "spawn" => SpawnKind::Spawn,
            _ => SpawnKind::Tagged(s),
        }
    }
}

impl From<SpawnKind> for String {
    fn from(kind: SpawnKind) -> String {
        kind.as_str().to_string()
    }
}

/// A placement marker emitted for the host game.
///
/// `distance_from_start` is the true graph distance from the entrance
/// over walkable cells, not a Manhattan estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPoint {
    pub position: Point,
    pub room_id: u32,
    #[serde(rename = "type")]
    pub kind: SpawnKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub weight: f32,
    pub distance_from_start: f32,
}

/// Sub-area of a hybrid dungeon with the style used to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub rect: Rect,
    pub style: ZoneStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStyle {
    Rooms,
    Caverns,
}

/// The mutable working set threaded through a pipeline run.
///
/// The grid is mutated in place; scratch fields (`partitions`, `zones`)
/// are working state for later passes and never serialized.
pub struct DungeonState {
    pub width: usize,
    pub height: usize,
    pub grid: Grid,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    /// Connectivity graph edges as `(from_room_id, to_room_id)`.
    pub edges: Vec<(u32, u32)>,
    pub spawns: Vec<SpawnPoint>,
    pub partitions: Vec<Rect>,
    pub zones: Vec<Zone>,
    pub regions: Vec<Region>,
    /// Scratch-mask pool shared by the corridor passes. Acquired masks
    /// are always cleared, so reuse never shows up in the output.
    pub masks: BitGridPool,
}

impl DungeonState {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            grid: Grid::new(width, height),
            rooms: Vec::new(),
            connections: Vec::new(),
            edges: Vec::new(),
            spawns: Vec::new(),
            partitions: Vec::new(),
            zones: Vec::new(),
            regions: Vec::new(),
            masks: BitGridPool::new(),
        }
    }

    pub fn room(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn room_mut(&mut self, id: u32) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }

    pub fn next_room_id(&self) -> u32 {
        self.rooms.iter().map(|r| r.id + 1).max().unwrap_or(0)
    }

    pub fn entrance(&self) -> Option<&Room> {
        self.rooms.iter().find(|r| r.kind == RoomKind::Entrance)
    }

    pub fn exit(&self) -> Option<&Room> {
        self.rooms.iter().find(|r| r.kind == RoomKind::Exit)
    }
}

/// The terminal, serializable artifact. `terrain` owns a flat copy of
/// the final grid bytes; nothing aliases the pipeline's working grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonArtifact {
    #[serde(rename = "type")]
    pub tag: String,
    pub width: usize,
    pub height: usize,
    pub terrain: Vec<u8>,
    pub rooms: Vec<Room>,
    pub connections: Vec<Connection>,
    pub spawns: Vec<SpawnPoint>,
    pub seed: Seed,
    pub checksum: String,
}

impl DungeonArtifact {
    /// Cell at `(x, y)`; out-of-bounds or unknown bytes read as wall.
    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> CellType {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return CellType::Wall;
        }
        CellType::from_byte(self.terrain[y as usize * self.width + x as usize])
            .unwrap_or(CellType::Wall)
    }

    pub fn entrance_spawn(&self) -> Option<&SpawnPoint> {
        self.spawns.iter().find(|s| s.kind == SpawnKind::Entrance)
    }

    pub fn exit_spawn(&self) -> Option<&SpawnPoint> {
        self.spawns.iter().find(|s| s.kind == SpawnKind::Exit)
    }
}

impl fmt::Display for DungeonArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                write!(f, "{}", self.cell(x as i32, y as i32).glyph())?;
            }
            if y + 1 < self.height {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
