//! # Physics Mesh
//!
//! A narrow collision/picking mesh rebuilt every tick in a small box
//! around the observer: hexagon lids between vertically differing cells,
//! prism side rectangles between horizontally differing cells, and the
//! water cells of the box. Coordinates are global cells; heights follow
//! the cell convention "cell `z` spans heights `[z-1, z]`", so the lid of
//! a ground cell at `z` sits at height `z` and the first buildable cell
//! above a lid at height `h` is `h + 1`.
//!
//! The finished mesh is immutable; the world swaps an `Arc` to it into a
//! shared slot, and readers (the player) hold their snapshot without
//! blocking the simulation.

use glam::Vec2;
use hexplanet_core::math::hex::{edge_vertex_indices, hex_center, hex_lid_vertices, Direction, HEX_EDGE};

/// A horizontal face between two vertically adjacent cells.
#[derive(Clone, Debug)]
pub struct UpperFace {
    /// Global cell x.
    pub x: i32,
    /// Global cell y.
    pub y: i32,
    /// Height of the face.
    pub z: f32,
    /// `Up` when the more transparent cell is above, `Down` otherwise.
    pub dir: Direction,
    /// Lid polygon, counterclockwise; the first `vertex_count` entries are
    /// valid.
    pub vertices: [Vec2; 6],
    /// 6 for whole lids, 4 for bisected half lids.
    pub vertex_count: u8,
    /// Polygon center, for the cheap circle test.
    pub center: Vec2,
    /// Circumradius, for the cheap circle test.
    pub radius: f32,
}

impl UpperFace {
    /// Whole hexagon lid of cell `(x, y)` at height `z`.
    #[must_use]
    pub fn hexagon(x: i32, y: i32, z: f32, dir: Direction) -> Self {
        Self {
            x,
            y,
            z,
            dir,
            vertices: hex_lid_vertices(x, y),
            vertex_count: 6,
            center: hex_center(x, y),
            radius: HEX_EDGE,
        }
    }

    /// True when a circle of radius `r` at `pos` can touch this face.
    #[inline]
    #[must_use]
    pub fn touches_circle(&self, pos: Vec2, r: f32) -> bool {
        hexplanet_core::math::geometry::circle_hits_face(pos, self.center, self.radius, r)
    }
}

/// A vertical rectangle between two horizontally adjacent cells.
#[derive(Clone, Debug)]
pub struct SideFace {
    /// Outward direction (from the more solid cell).
    pub dir: Direction,
    /// Bottom edge of the rectangle.
    pub edge: [Vec2; 2],
    /// Bottom height.
    pub z0: f32,
    /// Top height.
    pub z1: f32,
}

impl SideFace {
    /// Side of cell `(x, y)` facing `dir`, spanning heights `[z0, z1]`.
    #[must_use]
    pub fn of_cell(x: i32, y: i32, dir: Direction, z0: f32, z1: f32) -> Self {
        let verts = hex_lid_vertices(x, y);
        let [a, b] = edge_vertex_indices(dir);
        Self {
            dir,
            edge: [verts[a], verts[b]],
            z0,
            z1,
        }
    }
}

/// A water cell for swim/buoyancy checks.
#[derive(Clone, Copy, Debug)]
pub struct WaterCell {
    /// Global cell x.
    pub x: i32,
    /// Global cell y.
    pub y: i32,
    /// Cell z.
    pub z: i32,
    /// Fill level normalized to `[0, 1]`.
    pub level: f32,
}

/// The collision/picking mesh around the observer.
#[derive(Clone, Debug, Default)]
pub struct PhysMesh {
    /// Horizontal lids.
    pub upper_faces: Vec<UpperFace>,
    /// Vertical side rectangles.
    pub sides: Vec<SideFace>,
    /// Water cells inside the box.
    pub water_cells: Vec<WaterCell>,
}

impl Default for UpperFace {
    fn default() -> Self {
        Self::hexagon(0, 0, 0.0, Direction::Up)
    }
}

/// Rotation table for bisected lids: four consecutive hexagon vertices
/// starting at the rotation offset.
pub(crate) const BISECTED_ROT: [usize; 12] = [0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5];

/// Horizontal direction ordinal → rotation offset for bisected forms.
pub(crate) const DIR_TO_ROT: [usize; 6] = [0, 3, 1, 4, 5, 2];

/// Side-direction circle used when walking a bisected block's edges.
pub(crate) const SIDE_CIRCLE: [Direction; 6] = [
    Direction::ForwardLeft,
    Direction::Forward,
    Direction::ForwardRight,
    Direction::BackRight,
    Direction::Back,
    Direction::BackLeft,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexagon_face_touch() {
        let face = UpperFace::hexagon(0, 0, 10.0, Direction::Up);
        assert!(face.touches_circle(face.center, 0.225));
        assert!(!face.touches_circle(face.center + Vec2::new(5.0, 0.0), 0.225));
    }

    #[test]
    fn test_side_edges_match_lid() {
        let lid = hex_lid_vertices(2, 3);
        let side = SideFace::of_cell(2, 3, Direction::Forward, 9.0, 10.0);
        assert_eq!(side.edge[0], lid[1]);
        assert_eq!(side.edge[1], lid[2]);
        assert!(side.z1 > side.z0);
    }

    #[test]
    fn test_bisected_tables_cover_all_rotations() {
        for dir in 0..6 {
            let rot = DIR_TO_ROT[dir];
            assert!(rot < 6);
            for i in 0..4 {
                assert!(BISECTED_ROT[i + rot] < 6);
            }
        }
        // Every rotation offset appears exactly once.
        let mut sorted = DIR_TO_ROT;
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2, 3, 4, 5]);
    }
}
