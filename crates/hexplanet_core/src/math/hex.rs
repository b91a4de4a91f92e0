//! # Hex Coordinate System
//!
//! The world grid is made of hexagonal prisms. The x axis is the "column"
//! axis; every other column is shifted half a cell in y:
//!
//! ```text
//!   __    __
//!  /03\__/23\
//!  \__/13\__/33\
//!  /02\__/22\__/
//!  \__/12\__/32\
//!  /01\__/21\__/
//!  \__/11\__/31\
//!  /00\__/20\__/
//!  \__/10\__/30\
//!     \__/  \__/
//! ```
//!
//! Integer cell `(x, y)` maps to continuous space through the scale vector
//! `(√3/2, 1, 1)`. The parity of `x` decides which of the two y rows the
//! diagonal neighbors land in; that parity rule is shared by every consumer
//! (automata, mesh emission, picking) and is tested exhaustively here.

use glam::Vec2;

/// World-space stride between adjacent columns: `√3/2`.
pub const SPACE_SCALE_X: f32 = 0.866_025_4;
/// Edge length (and circumradius) of one hexagon: `1/√3`.
pub const HEX_EDGE: f32 = 0.577_350_26;
/// Inner radius of one hexagon (half the cell pitch in y).
pub const HEX_INNER_RADIUS: f32 = 0.5;

/// The eight cell directions: six hex sides plus up and down.
///
/// Ordinals are stable; `Forward` is `+y`, `ForwardRight` is `+x` into the
/// parity-dependent upper row.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `y + 1`.
    Forward = 0,
    /// `y - 1`.
    Back = 1,
    /// `x + 1`, upper row.
    ForwardRight = 2,
    /// `x - 1`, lower row.
    BackLeft = 3,
    /// `x - 1`, upper row.
    ForwardLeft = 4,
    /// `x + 1`, lower row.
    BackRight = 5,
    /// `z + 1`.
    Up = 6,
    /// `z - 1`.
    Down = 7,
    /// No direction / not applicable.
    Unknown = 255,
}

impl Direction {
    /// The six horizontal directions, in ordinal order.
    pub const HORIZONTAL: [Self; 6] = [
        Self::Forward,
        Self::Back,
        Self::ForwardRight,
        Self::BackLeft,
        Self::ForwardLeft,
        Self::BackRight,
    ];

    /// Decodes a persisted ordinal.
    #[must_use]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Forward),
            1 => Some(Self::Back),
            2 => Some(Self::ForwardRight),
            3 => Some(Self::BackLeft),
            4 => Some(Self::ForwardLeft),
            5 => Some(Self::BackRight),
            6 => Some(Self::Up),
            7 => Some(Self::Down),
            255 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// The opposite direction (`Unknown` maps to itself).
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Back,
            Self::Back => Self::Forward,
            Self::ForwardRight => Self::BackLeft,
            Self::BackLeft => Self::ForwardRight,
            Self::ForwardLeft => Self::BackRight,
            Self::BackRight => Self::ForwardLeft,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Outward unit normal of the matching prism face.
    #[must_use]
    pub const fn normal(self) -> glam::Vec3 {
        match self {
            Self::Forward => glam::Vec3::new(0.0, 1.0, 0.0),
            Self::Back => glam::Vec3::new(0.0, -1.0, 0.0),
            Self::ForwardRight => glam::Vec3::new(SPACE_SCALE_X, 0.5, 0.0),
            Self::BackLeft => glam::Vec3::new(-SPACE_SCALE_X, -0.5, 0.0),
            Self::ForwardLeft => glam::Vec3::new(-SPACE_SCALE_X, 0.5, 0.0),
            Self::BackRight => glam::Vec3::new(SPACE_SCALE_X, -0.5, 0.0),
            Self::Up => glam::Vec3::new(0.0, 0.0, 1.0),
            Self::Down => glam::Vec3::new(0.0, 0.0, -1.0),
            Self::Unknown => glam::Vec3::new(0.0, 0.0, 0.0),
        }
    }

    /// True for the six hex-side directions.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        (self as u8) < 6
    }
}

/// y of the upper diagonal row next to column `x`.
#[inline]
#[must_use]
pub const fn forward_side_y(x: i32, y: i32) -> i32 {
    y + ((x ^ 1) & 1)
}

/// y of the lower diagonal row next to column `x`.
#[inline]
#[must_use]
pub const fn back_side_y(x: i32, y: i32) -> i32 {
    y - (x & 1)
}

/// The six hex neighbors of `(x, y)`.
///
/// Order: forward, back, forward-right, back-right, forward-left,
/// back-left — the order every scan in the simulation uses.
#[inline]
#[must_use]
pub fn hex_neighbors(x: i32, y: i32) -> [(i32, i32); 6] {
    let fwd = forward_side_y(x, y);
    let back = back_side_y(x, y);
    [
        (x, y + 1),
        (x, y - 1),
        (x + 1, fwd),
        (x + 1, back),
        (x - 1, fwd),
        (x - 1, back),
    ]
}

/// Center of cell `(x, y)` in continuous space.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hex_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(
        x as f32 * SPACE_SCALE_X + HEX_EDGE,
        y as f32 + 0.5 * (((x ^ 1) & 1) as f32),
    )
}

/// The six lid vertices of cell `(x, y)`, counterclockwise from the left
/// point.
///
/// Order: left, forward-left, forward-right, right, back-right, back-left.
#[must_use]
pub fn hex_lid_vertices(x: i32, y: i32) -> [Vec2; 6] {
    let c = hex_center(x, y);
    [
        Vec2::new(c.x - HEX_EDGE, c.y),
        Vec2::new(c.x - HEX_EDGE * 0.5, c.y + HEX_INNER_RADIUS),
        Vec2::new(c.x + HEX_EDGE * 0.5, c.y + HEX_INNER_RADIUS),
        Vec2::new(c.x + HEX_EDGE, c.y),
        Vec2::new(c.x + HEX_EDGE * 0.5, c.y - HEX_INNER_RADIUS),
        Vec2::new(c.x - HEX_EDGE * 0.5, c.y - HEX_INNER_RADIUS),
    ]
}

/// The lid edge (vertex pair) facing `dir`, indices into
/// [`hex_lid_vertices`].
#[must_use]
pub const fn edge_vertex_indices(dir: Direction) -> [usize; 2] {
    match dir {
        Direction::Forward => [1, 2],
        Direction::ForwardRight => [2, 3],
        Direction::BackRight => [3, 4],
        Direction::Back => [4, 5],
        Direction::BackLeft => [5, 0],
        // ForwardLeft and the non-horizontal directions.
        _ => [0, 1],
    }
}

/// Integer cell containing point `p`.
///
/// Exact inverse of [`hex_center`]: the hexagons are the Voronoi cells of
/// the center lattice, so the containing cell is the nearest center.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn world_to_hex(p: Vec2) -> (i32, i32) {
    let x0 = ((p.x - HEX_EDGE) / SPACE_SCALE_X).floor() as i32;
    let y0 = p.y.floor() as i32;

    let mut best = (x0, y0);
    let mut best_d2 = f32::INFINITY;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (cx, cy) = (x0 + dx, y0 + dy);
            let d2 = hex_center(cx, cy).distance_squared(p);
            if d2 < best_d2 {
                best_d2 = d2;
                best = (cx, cy);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_symmetry_exhaustive() {
        // Property: n is a neighbor of c iff c is a neighbor of n, across
        // both column parities and negative coordinates.
        for x in -5..=5 {
            for y in -5..=5 {
                for (nx, ny) in hex_neighbors(x, y) {
                    let back = hex_neighbors(nx, ny);
                    assert!(
                        back.contains(&(x, y)),
                        "neighbor asymmetry: ({x},{y}) -> ({nx},{ny})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_neighbors_distinct_and_adjacent() {
        for x in -3..=3 {
            for y in -3..=3 {
                let ns = hex_neighbors(x, y);
                let c = hex_center(x, y);
                for (i, &(nx, ny)) in ns.iter().enumerate() {
                    // No duplicates.
                    for &(mx, my) in &ns[i + 1..] {
                        assert_ne!((nx, ny), (mx, my));
                    }
                    // Unit center distance.
                    let d = hex_center(nx, ny).distance(c);
                    assert!((d - 1.0).abs() < 1e-4, "bad spacing {d} at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn test_world_to_hex_inverts_center() {
        for x in -8..=8 {
            for y in -8..=8 {
                assert_eq!(world_to_hex(hex_center(x, y)), (x, y));
            }
        }
    }

    #[test]
    fn test_world_to_hex_interior_points() {
        // Points well inside a cell (70% of the inner radius) must map back.
        let offsets = [
            Vec2::new(0.3, 0.0),
            Vec2::new(-0.3, 0.0),
            Vec2::new(0.0, 0.35),
            Vec2::new(0.0, -0.35),
            Vec2::new(0.2, 0.2),
            Vec2::new(-0.2, -0.2),
        ];
        for x in -4..=4 {
            for y in -4..=4 {
                let c = hex_center(x, y);
                for off in offsets {
                    assert_eq!(world_to_hex(c + off), (x, y), "cell ({x},{y}), off {off:?}");
                }
            }
        }
    }

    #[test]
    fn test_lid_vertices_on_circumcircle() {
        let c = hex_center(3, -2);
        for v in hex_lid_vertices(3, -2) {
            let r = v.distance(c);
            assert!((r - HEX_EDGE).abs() < 1e-4 || (r - HEX_INNER_RADIUS).abs() < 0.08);
        }
    }

    #[test]
    fn test_edge_faces_direction() {
        // The midpoint of each edge must lie along that direction's normal.
        let verts = hex_lid_vertices(0, 0);
        let c = hex_center(0, 0);
        for dir in Direction::HORIZONTAL {
            let [a, b] = edge_vertex_indices(dir);
            let mid = (verts[a] + verts[b]) * 0.5;
            let n = dir.normal();
            let to_mid = (mid - c).normalize();
            let dot = to_mid.x * n.x + to_mid.y * n.y;
            assert!(dot > 0.99, "{dir:?}: edge midpoint not along normal (dot {dot})");
        }
    }

    #[test]
    fn test_direction_opposites() {
        for d in Direction::HORIZONTAL {
            assert_eq!(d.opposite().opposite(), d);
        }
        assert_eq!(Direction::Up.opposite(), Direction::Down);
    }
}
