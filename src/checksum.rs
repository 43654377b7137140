//! Artifact fingerprinting
//!
//! The checksum folds a canonical serialization of the artifact into a
//! 64-bit FNV-1a hash, rendered as `v2:` plus 16 lowercase hex digits.
//! Canonical field order, the interior path sample and the terrain
//! lattice are part of the versioned contract: changing any of them is a
//! format break.

use crate::artifact::DungeonArtifact;

/// Checksum format tag.
pub const CHECKSUM_PREFIX: &str = "v2:";

const FNV64_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Max interior path points folded per connection.
const PATH_SAMPLE: usize = 8;
/// Terrain is sampled on a lattice of roughly this many steps per axis.
const LATTICE_STEPS: usize = 16;

struct Fnv64(u64);

impl Fnv64 {
    fn new() -> Self {
        Fnv64(FNV64_BASIS)
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV64_PRIME);
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.write(&v.to_bits().to_le_bytes());
    }
}

/// Compute the checksum of an artifact. The stored `checksum` field is
/// not part of the input.
#[must_use]
pub fn compute(artifact: &DungeonArtifact) -> String {
    let mut hash = Fnv64::new();
    hash.write_u32(artifact.width as u32);
    hash.write_u32(artifact.height as u32);

    let mut rooms: Vec<_> = artifact.rooms.iter().collect();
    rooms.sort_by_key(|r| r.id);
    for room in rooms {
        hash.write_i32(room.x);
        hash.write_i32(room.y);
        hash.write_i32(room.width);
        hash.write_i32(room.height);
        hash.write_u8(room.kind.ordinal());
    }

    let mut connections: Vec<_> = artifact.connections.iter().collect();
    connections.sort_by_key(|c| (c.from_room_id, c.to_room_id));
    for conn in connections {
        hash.write_u32(conn.path.len() as u32);
        if let (Some(first), Some(last)) = (conn.path.first(), conn.path.last()) {
            hash.write_i32(first.x);
            hash.write_i32(first.y);
            hash.write_i32(last.x);
            hash.write_i32(last.y);
        }
        let interior = conn.path.len().saturating_sub(2);
        if interior > 0 {
            let stride = (interior / PATH_SAMPLE).max(1);
            for i in (1..conn.path.len() - 1).step_by(stride).take(PATH_SAMPLE) {
                hash.write_i32(conn.path[i].x);
                hash.write_i32(conn.path[i].y);
            }
        }
    }

    let mut spawns: Vec<_> = artifact.spawns.iter().collect();
    spawns.sort_by(|a, b| {
        (a.position.y, a.position.x, a.kind.as_str())
            .cmp(&(b.position.y, b.position.x, b.kind.as_str()))
    });
    for spawn in spawns {
        hash.write_i32(spawn.position.x);
        hash.write_i32(spawn.position.y);
        hash.write_u32(spawn.room_id);
        hash.write(spawn.kind.as_str().as_bytes());
        hash.write_f32(spawn.distance_from_start);
    }

    // A terrain sample, not the whole surface: the lattice balances
    // detection sensitivity against cost.
    let sx = (artifact.width / LATTICE_STEPS).max(1);
    let sy = (artifact.height / LATTICE_STEPS).max(1);
    for y in (0..artifact.height).step_by(sy) {
        for x in (0..artifact.width).step_by(sx) {
            hash.write_u8(artifact.terrain[y * artifact.width + x]);
        }
    }

    format!("{}{:016x}", CHECKSUM_PREFIX, hash.0)
}

/// Recompute and compare against the stored checksum.
#[must_use]
pub fn verify(artifact: &DungeonArtifact) -> bool {
    compute(artifact) == artifact.checksum
}
