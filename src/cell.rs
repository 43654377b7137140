//! Cell types for the dungeon terrain surface

use std::fmt;

/// Terrain cell type, stored as one byte per cell.
///
/// The numeric values are part of the artifact wire format: `terrain`
/// bytes in a serialized [`DungeonArtifact`](crate::DungeonArtifact) are
/// `CellType` ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum CellType {
    Floor = 0,
    #[default]
    Wall = 1,
    Door = 2,
    Water = 3,
    Lava = 4,
}

impl CellType {
    pub fn is_floor(self) -> bool {
        matches!(self, CellType::Floor)
    }

    pub fn is_wall(self) -> bool {
        matches!(self, CellType::Wall)
    }

    /// Whether a generated actor can stand on this cell. Doors count as
    /// walkable so a closed door never splits a corridor in two.
    pub fn is_walkable(self) -> bool {
        matches!(self, CellType::Floor | CellType::Door)
    }

    pub fn from_byte(byte: u8) -> Option<CellType> {
        match byte {
            0 => Some(CellType::Floor),
            1 => Some(CellType::Wall),
            2 => Some(CellType::Door),
            3 => Some(CellType::Water),
            4 => Some(CellType::Lava),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            CellType::Floor => '.',
            CellType::Wall => '#',
            CellType::Door => '+',
            CellType::Water => '~',
            CellType::Lava => '^',
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for c in [
            CellType::Floor,
            CellType::Wall,
            CellType::Door,
            CellType::Water,
            CellType::Lava,
        ] {
            assert_eq!(CellType::from_byte(c as u8), Some(c));
        }
        assert_eq!(CellType::from_byte(5), None);
    }

    #[test]
    fn walkability() {
        assert!(CellType::Floor.is_walkable());
        assert!(CellType::Door.is_walkable());
        assert!(!CellType::Wall.is_walkable());
        assert!(!CellType::Water.is_walkable());
        assert!(!CellType::Lava.is_walkable());
    }
}
