//! Water automaton.
//!
//! Per active chunk, every liquid block tries in order: fall into air
//! below, pour into liquid below, then flow toward each of the six hex
//! neighbors. Shallow leftovers evaporate. Two pacing mechanisms shed
//! load: a checkerboard over 3×3 chunk clusters runs half the world per
//! tick, and chunks far from the observer skip ticks entirely.

use hexplanet_core::math::hex::{hex_neighbors, world_to_hex};

use crate::block::{BlockKind, CellHandle};
use crate::chunk::{CHUNK_WIDTH_LOG2, MAX_WATER_LEVEL};

use super::World;

/// Liquids below this level on a dry bottom evaporate.
const MIN_PUDDLE_LEVEL: u16 = 16;

impl World {
    /// One water tick over the active area.
    #[allow(clippy::cast_sign_loss, clippy::too_many_lines)]
    pub(crate) fn water_phys_tick(&mut self) {
        let (observer_pos, _) = self.shared.observer();
        let (obs_x, obs_y) = world_to_hex(observer_pos.truncate());
        let observer_chunk_x = (obs_x - (self.longitude() << CHUNK_WIDTH_LOG2)) >> CHUNK_WIDTH_LOG2;
        let observer_chunk_y = (obs_y - (self.latitude() << CHUNK_WIDTH_LOG2)) >> CHUNK_WIDTH_LOG2;

        let margin_x = self.config.active_margin_x;
        let margin_y = self.config.active_margin_y;
        let tick = self.phys_tick_count;

        for cx in margin_x..self.chunk_number_x() - margin_x {
            for cy in margin_y..self.chunk_number_y() - margin_y {
                // Distant water runs at a fraction of the tick rate.
                let distance = (cx - observer_chunk_x).abs() + (cy - observer_chunk_y).abs();
                if distance > 4 && (tick & 2) != 0 {
                    continue;
                }
                if distance > 8 && (tick & 4) != 0 {
                    continue;
                }

                // Checkerboard over 3×3 clusters: half the world per tick.
                let cluster_x = (cx + self.longitude()).div_euclid(3);
                let cluster_y = (cy + self.latitude()).div_euclid(3);
                if ((cluster_x ^ cluster_y) & 1) as u32 == (tick & 1) {
                    continue;
                }

                if self.water_tick_chunk(cx, cy) {
                    for dx in -1..=1 {
                        for dy in -1..=1 {
                            self.renderer.update_chunk_water(cx + dx, cy + dy, false);
                        }
                    }
                    let chunk = self.chunk_mut(cx, cy);
                    chunk.water_modified = true;
                    chunk.needs_light_update = true;
                }
            }
        }
    }

    /// Ticks every liquid of one chunk; true when anything changed.
    #[allow(clippy::cast_sign_loss)]
    fn water_tick_chunk(&mut self, cx: i32, cy: i32) -> bool {
        let base_x = cx << CHUNK_WIDTH_LOG2;
        let base_y = cy << CHUNK_WIDTH_LOG2;
        let mut modified = false;

        let mut k = 0usize;
        loop {
            let (slot, x, y, z, level) = {
                let chunk = self.chunk(cx, cy);
                if k >= chunk.water_list.len() {
                    break;
                }
                let slot = chunk.water_list[k];
                let Some(b) = chunk.water_pool.get(slot) else {
                    k += 1;
                    continue;
                };
                (slot, u32::from(b.x), u32::from(b.y), u32::from(b.z), b.level)
            };
            k += 1;

            debug_assert!(
                self.chunk(cx, cy).block(x, y, z).slot() == Some(slot),
                "liquid list out of sync with the grid"
            );

            let below_kind = if z == 0 {
                BlockKind::Stone
            } else {
                self.chunk(cx, cy).block_kind(x, y, z - 1)
            };

            // Fall into air below; flow again next tick.
            if below_kind == BlockKind::Air {
                let chunk = self.chunk_mut(cx, cy);
                chunk.set_block(x, y, z, CellHandle::AIR);
                chunk.set_block(x, y, z - 1, CellHandle::slotted(BlockKind::Water, slot));
                if let Some(b) = chunk.water_pool.get_mut(slot) {
                    b.z = (z - 1) as u8;
                }
                modified = true;
                continue;
            }

            // Pour into the liquid below.
            if below_kind == BlockKind::Water {
                let below_handle = self.chunk(cx, cy).block(x, y, z - 1);
                if let Some(below_slot) = below_handle.slot() {
                    let below_level = self
                        .chunk(cx, cy)
                        .water_pool
                        .get(below_slot)
                        .map_or(0, |b| b.level);
                    let delta = (MAX_WATER_LEVEL - below_level).min(level);
                    if delta > 0 {
                        let chunk = self.chunk_mut(cx, cy);
                        if let Some(b) = chunk.water_pool.get_mut(slot) {
                            b.decrease(delta);
                        }
                        if let Some(b) = chunk.water_pool.get_mut(below_slot) {
                            b.increase(delta);
                        }
                        modified = true;
                    }
                }
            }

            // Horizontal flow to the six neighbors.
            let world_x = base_x + x as i32;
            let world_y = base_y + y as i32;
            for (nx, ny) in hex_neighbors(world_x, world_y) {
                if self.water_flow(cx, cy, slot, nx, ny, z as i32) {
                    modified = true;
                }
            }

            // Evaporate emptied or shallow stranded blocks.
            let level_now = self
                .chunk(cx, cy)
                .water_pool
                .get(slot)
                .map_or(0, |b| b.level);
            if level_now == 0 || (level_now < MIN_PUDDLE_LEVEL && below_kind != BlockKind::Water) {
                let chunk = self.chunk_mut(cx, cy);
                chunk.set_block(x, y, z, CellHandle::AIR);
                chunk.delete_water_block(slot);
                k -= 1;
                self.check_block_neighbors(world_x, world_y, z as i32);
                modified = true;
            }
        }
        modified
    }

    /// Tries to flow from a liquid into the cell at `(to_x, to_y, to_z)`
    /// (window cells). Returns true when anything moved.
    #[allow(clippy::cast_sign_loss)]
    fn water_flow(
        &mut self,
        from_cx: i32,
        from_cy: i32,
        from_slot: u16,
        to_x: i32,
        to_y: i32,
        to_z: i32,
    ) -> bool {
        if !self.in_borders(to_x, to_y, to_z) {
            return false;
        }

        let from_level = self
            .chunk(from_cx, from_cy)
            .water_pool
            .get(from_slot)
            .map_or(0, |b| b.level);

        let (to_cx, to_lx) = Self::split(to_x);
        let (to_cy, to_ly) = Self::split(to_y);
        let target = self.chunk(to_cx, to_cy).block(to_lx, to_ly, to_z as u32);

        match target.kind() {
            BlockKind::Air | BlockKind::Fire => {
                if from_level <= 1 {
                    return false;
                }
                if target.kind() == BlockKind::Fire {
                    self.remove_fire(to_x, to_y, to_z);
                }

                let delta = from_level / 2;
                if let Some(b) = self
                    .chunk_mut(from_cx, from_cy)
                    .water_pool
                    .get_mut(from_slot)
                {
                    b.decrease(delta);
                }
                self.chunk_mut(to_cx, to_cy)
                    .new_water_block(to_lx, to_ly, to_z as u32, delta);
                self.chunk_mut(to_cx, to_cy).water_modified = true;

                self.check_block_neighbors(to_x, to_y, to_z);
                true
            }

            BlockKind::Water => {
                let Some(to_slot) = target.slot() else {
                    return false;
                };
                let to_level = self
                    .chunk(to_cx, to_cy)
                    .water_pool
                    .get(to_slot)
                    .map_or(0, |b| b.level);
                let delta = from_level.saturating_sub(to_level);
                if delta <= 1 {
                    return false;
                }
                let delta = delta / 2;
                if let Some(b) = self
                    .chunk_mut(from_cx, from_cy)
                    .water_pool
                    .get_mut(from_slot)
                {
                    b.decrease(delta);
                }
                if let Some(b) = self.chunk_mut(to_cx, to_cy).water_pool.get_mut(to_slot) {
                    b.increase(delta);
                }
                self.chunk_mut(to_cx, to_cy).water_modified = true;
                true
            }

            _ => false,
        }
    }
}
