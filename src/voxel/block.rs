//! Block identifiers and the six axis-aligned face directions

use glam::IVec3;

/// Block type identifier. `0` is air; everything else is solid.
pub type BlockId = u8;

/// Empty space
pub const AIR: BlockId = 0;

/// Block types produced by terrain generation
pub const GRASS: BlockId = 1;
pub const DIRT: BlockId = 2;
pub const STONE: BlockId = 3;
pub const SAND: BlockId = 4;

/// Materials a generated chunk can be made of
pub const TERRAIN_BLOCKS: [BlockId; 4] = [GRASS, DIRT, STONE, SAND];

/// Check whether a block id occupies space
#[inline]
pub fn is_solid(block: BlockId) -> bool {
    block != AIR
}

/// Axis-aligned direction. Z is up; the horizontal chunk grid spans X and Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// +X
    Forward,
    /// -X
    Back,
    /// -Y
    Left,
    /// +Y
    Right,
    /// +Z
    Up,
    /// -Z
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Forward,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Unit offset towards the neighbouring block
    pub fn normal(self) -> IVec3 {
        match self {
            Direction::Forward => IVec3::X,
            Direction::Back => IVec3::NEG_X,
            Direction::Left => IVec3::NEG_Y,
            Direction::Right => IVec3::Y,
            Direction::Up => IVec3::Z,
            Direction::Down => IVec3::NEG_Z,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_is_not_solid() {
        assert!(!is_solid(AIR));
        assert!(is_solid(STONE));
    }

    #[test]
    fn test_normals_are_unit_and_distinct() {
        let normals: std::collections::HashSet<_> = Direction::ALL.iter().map(|d| d.normal()).collect();
        assert_eq!(normals.len(), 6);
        assert!(normals.iter().all(|n| n.abs().element_sum() == 1));
    }
}
