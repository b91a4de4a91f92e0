//! Chunk generation: oracle-driven strata, surface cover, deterministic
//! tree placement and initial water seeding. Light maps stay zero; the
//! world seeds them once the whole window is populated.

use hexplanet_core::Lcg31;

use super::{
    cell_addr, Chunk, CHUNK_HEIGHT, CHUNK_WIDTH, INITIAL_WATER_BLOCK_COUNT, MAX_WATER_LEVEL,
    SEA_LEVEL,
};
use crate::block::{BlockKind, CellHandle};
use crate::oracle::{Biome, WorldOracle};

/// Soil layer thickness under the surface.
const SOIL_DEPTH: u32 = 4;
/// Sand layer thickness in deserts.
const SAND_DEPTH: u32 = 3;

impl Chunk {
    /// Generates a chunk from the oracle, deterministically from
    /// `(seed, longitude, latitude)`.
    #[must_use]
    pub fn generate(
        longitude: i32,
        latitude: i32,
        oracle: &dyn WorldOracle,
        seed: u32,
    ) -> Self {
        let mut chunk = Self::new_empty(longitude, latitude);
        chunk.fill_strata(oracle);
        chunk.plant_trees(oracle, seed);
        chunk.seed_water();
        chunk
    }

    /// Terrain columns: stone below, soil then surface cover on top.
    #[allow(clippy::cast_possible_truncation)]
    fn fill_strata(&mut self, oracle: &dyn WorldOracle) {
        let stone = CellHandle::normal(BlockKind::Stone);
        let soil = CellHandle::normal(BlockKind::Soil);
        let sand = CellHandle::normal(BlockKind::Sand);

        for x in 0..CHUNK_WIDTH {
            for y in 0..CHUNK_WIDTH {
                let h = oracle
                    .height_at(self.longitude, self.latitude, x, y)
                    .clamp(1, CHUNK_HEIGHT - 2);
                let biome = oracle.biome_at(self.longitude, self.latitude, x, y);

                for z in 0..h {
                    let handle = if z + SOIL_DEPTH < h {
                        stone
                    } else if biome == Biome::Desert && z + SAND_DEPTH >= h {
                        sand
                    } else {
                        soil
                    };
                    self.blocks[cell_addr(x, y, z)] = handle;
                    self.transparency[cell_addr(x, y, z)] = handle.kind().transparency();
                }

                if biome.grassy() {
                    // The top soil cell carries grass; freshly planted
                    // grass starts active and settles down on its own.
                    self.new_active_grass(x, y, h - 1);
                }
                self.height_map[(x * CHUNK_WIDTH + y) as usize] = (h - 1) as u8;
            }
        }
    }

    /// Deterministic-from-seed tree placement on grassy columns.
    fn plant_trees(&mut self, oracle: &dyn WorldOracle, seed: u32) {
        let mixed = seed
            .wrapping_mul(0x9E37_79B9)
            .wrapping_add((self.longitude as u32).wrapping_mul(0x85EB_CA6B))
            .wrapping_add((self.latitude as u32).wrapping_mul(0xC2B2_AE35));
        let mut rng = Lcg31::new(mixed);
        rng.next();

        let biome = oracle.biome_at(self.longitude, self.latitude, CHUNK_WIDTH / 2, CHUNK_WIDTH / 2);
        for _ in 0..biome.tree_attempts() {
            // Keep crowns inside the chunk.
            let x = 2 + rng.next_max(CHUNK_WIDTH - 4);
            let y = 2 + rng.next_max(CHUNK_WIDTH - 4);
            let ground = self.height_at(x, y);
            if self.block_kind(x, y, ground) != BlockKind::Grass {
                continue;
            }
            let trunk_height = 4 + rng.next_max(3);
            if ground + trunk_height + 3 >= CHUNK_HEIGHT {
                continue;
            }
            self.plant_tree(x, y, ground + 1, trunk_height);
        }
    }

    /// One tree: a wood trunk and a foliage blob.
    fn plant_tree(&mut self, x: u32, y: u32, base_z: u32, trunk_height: u32) {
        for z in base_z..base_z + trunk_height {
            if !self.block(x, y, z).is_air() {
                return;
            }
        }
        let wood = CellHandle::normal(BlockKind::Wood);
        let foliage = CellHandle::normal(BlockKind::Foliage);

        for z in base_z..base_z + trunk_height {
            self.set_block(x, y, z, wood);
        }

        let crown_base = base_z + trunk_height - 2;
        for z in crown_base..base_z + trunk_height + 2 {
            // Hex disc: the column itself, its six neighbors, and on the
            // two middle layers the ring beyond.
            let wide = z > crown_base && z < base_z + trunk_height + 1;
            for (nx, ny, dist) in hex_disc(x, y) {
                if dist == 0 && z < base_z + trunk_height {
                    continue; // trunk occupies the center
                }
                if dist > 1 && !wide {
                    continue;
                }
                if nx >= CHUNK_WIDTH || ny >= CHUNK_WIDTH {
                    continue;
                }
                if self.block(nx, ny, z).is_air() {
                    self.set_block(nx, ny, z, foliage);
                }
            }
        }
    }

    /// Seeds full water cells below sea level, up to the per-chunk cap.
    fn seed_water(&mut self) {
        let mut remaining = INITIAL_WATER_BLOCK_COUNT;
        for x in 0..CHUNK_WIDTH {
            for y in 0..CHUNK_WIDTH {
                let ground = self.height_at(x, y);
                for z in ground + 1..SEA_LEVEL {
                    if remaining == 0 {
                        return;
                    }
                    if self.block(x, y, z).is_air() {
                        self.new_water_block(x, y, z, MAX_WATER_LEVEL);
                        remaining -= 1;
                    }
                }
            }
        }
    }
}

/// The cells within hex distance 2 of `(x, y)`, as `(x, y, distance)`.
/// Entries may be out of chunk bounds (u32 wrap marks them invalid).
fn hex_disc(x: u32, y: u32) -> Vec<(u32, u32, u32)> {
    let cx = x as i32;
    let cy = y as i32;
    let mut seen = vec![(cx, cy, 0u32)];
    for (nx, ny) in hexplanet_core::hex_neighbors(cx, cy) {
        push_unique(&mut seen, nx, ny, 1);
    }
    let ring1: Vec<(i32, i32)> = seen
        .iter()
        .filter(|&&(_, _, d)| d == 1)
        .map(|&(a, b, _)| (a, b))
        .collect();
    for (rx, ry) in ring1 {
        for (nx, ny) in hexplanet_core::hex_neighbors(rx, ry) {
            push_unique(&mut seen, nx, ny, 2);
        }
    }
    seen.into_iter()
        .map(|(a, b, d)| (a as u32, b as u32, d))
        .collect()
}

fn push_unique(seen: &mut Vec<(i32, i32, u32)>, x: i32, y: i32, dist: u32) {
    if !seen.iter().any(|&(a, b, _)| a == x && b == y) {
        seen.push((x, y, dist));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{FlatOracle, HillsOracle};

    #[test]
    fn test_flat_generation_strata() {
        let ch = Chunk::generate(0, 0, &FlatOracle { height: 41 }, 24);
        // Ground surface is grass at z = 40, soil below, stone deeper.
        assert_eq!(ch.block_kind(5, 5, 40), BlockKind::Grass);
        assert_eq!(ch.block_kind(5, 5, 39), BlockKind::Soil);
        assert_eq!(ch.block_kind(5, 5, 20), BlockKind::Stone);
        assert!(ch.block(5, 5, 41).is_air() || ch.block_kind(5, 5, 41) == BlockKind::Water);
        assert_eq!(ch.height_at(5, 5), 40);
    }

    #[test]
    fn test_generation_deterministic() {
        let oracle = HillsOracle::new(24, 64, 12.0);
        let a = Chunk::generate(3, -7, &oracle, 24);
        let b = Chunk::generate(3, -7, &oracle, 24);
        for addr in 0..super::super::CHUNK_VOLUME {
            assert_eq!(a.blocks[addr].kind(), b.blocks[addr].kind());
        }
        assert_eq!(a.water_list.len(), b.water_list.len());
        assert_eq!(a.grass_list.len(), b.grass_list.len());
    }

    #[test]
    fn test_water_seeded_below_sea_level() {
        let ch = Chunk::generate(0, 0, &FlatOracle { height: 50 }, 24);
        // Flat meadow at 50: the seeded water fills the band between the
        // ground and sea level until the per-chunk cap runs out.
        let mut count = 0;
        for x in 0..CHUNK_WIDTH {
            for y in 0..CHUNK_WIDTH {
                for z in 50..SEA_LEVEL {
                    if ch.block_kind(x, y, z) == BlockKind::Water {
                        count += 1;
                    }
                }
            }
        }
        assert!(count > 0);
        assert!(count <= INITIAL_WATER_BLOCK_COUNT);
        assert!(ch.check_invariants());
    }

    #[test]
    fn test_grass_planted_active() {
        let ch = Chunk::generate(0, 0, &FlatOracle { height: 41 }, 24);
        assert_eq!(ch.grass_list.len(), (CHUNK_WIDTH * CHUNK_WIDTH) as usize);
        assert!(ch.check_invariants());
    }

    #[test]
    fn test_forest_chunks_grow_trees() {
        let oracle = HillsOracle::new(24, 64, 8.0);
        // Scan a few chunks; at least one should carry wood.
        let mut wood_found = false;
        'outer: for lon in 0..24 {
            let ch = Chunk::generate(lon, 0, &oracle, 24);
            for addr in 0..super::super::CHUNK_VOLUME {
                if ch.blocks[addr].kind() == BlockKind::Wood {
                    wood_found = true;
                    break 'outer;
                }
            }
        }
        assert!(wood_found, "no tree in 24 chunks of hills terrain");
    }
}
