//! Grass automaton.
//!
//! Active grass (on a per-chunk list) fades to soil under opaque cover or
//! water, reproduces onto neighbor soil one layer down, level, or one
//! layer up, and deactivates to the shared flyweight after an attempt
//! that found no eligible neighbor. Reproduction needs light: sunlight
//! counts only while the sun is up.

use hexplanet_core::math::hex::hex_neighbors;
use hexplanet_core::Lcg31;

use crate::block::{visibility_bits, BlockKind, CellHandle, Visibility};
use crate::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH_LOG2};

use super::{World, MAX_SUN_LIGHT};

const REPRODUCING_START_CHANCE: u32 = Lcg31::MAX_RAND / 32;
const REPRODUCING_DO_CHANCE: u32 = Lcg31::MAX_RAND / 12;
const MIN_LIGHT_FOR_REPRODUCING: u8 = MAX_SUN_LIGHT / 2;

impl World {
    /// One grass tick over the active area.
    #[allow(clippy::cast_sign_loss, clippy::too_many_lines)]
    pub(crate) fn grass_phys_tick(&mut self) {
        let sun = self
            .calendar
            .sun_direction(self.time_of_year(), self.global_latitude);
        let daylight = u8::from(sun.z > 4.0f32.to_radians().sin());

        let margin_x = self.config.active_margin_x;
        let margin_y = self.config.active_margin_y;

        for cy in margin_y..self.chunk_number_y() - margin_y {
            for cx in margin_x..self.chunk_number_x() - margin_x {
                let base_x = cx << CHUNK_WIDTH_LOG2;
                let base_y = cy << CHUNK_WIDTH_LOG2;

                let mut k = 0usize;
                loop {
                    let (slot, x, y, z) = {
                        let chunk = self.chunk(cx, cy);
                        if k >= chunk.grass_list.len() {
                            break;
                        }
                        let slot = chunk.grass_list[k];
                        let Some(b) = chunk.grass_pool.get(slot) else {
                            k += 1;
                            continue;
                        };
                        (slot, u32::from(b.x), u32::from(b.y), u32::from(b.z))
                    };
                    k += 1;

                    if z + 2 >= CHUNK_HEIGHT || z == 0 {
                        continue;
                    }

                    debug_assert!(
                        self.chunk(cx, cy).block(x, y, z).slot() == Some(slot),
                        "grass list out of sync with the grid"
                    );

                    // Fade under opaque cover or water.
                    let above = self.chunk(cx, cy).block(x, y, z + 1);
                    let above_t = self.chunk(cx, cy).transparency_at(x, y, z + 1);
                    if visibility_bits(above_t) == Visibility::Solid as u8
                        || above.kind() == BlockKind::Water
                    {
                        let chunk = self.chunk_mut(cx, cy);
                        chunk.set_block(x, y, z, CellHandle::normal(BlockKind::Soil));
                        chunk.delete_active_grass(slot);
                        k -= 1;
                        self.renderer.update_chunk(cx, cy, false);
                        continue;
                    }

                    let light = self.chunk(cx, cy).sun_light_at(x, y, z + 1) * daylight
                        + self.chunk(cx, cy).fire_light_at(x, y, z + 1);
                    if light < MIN_LIGHT_FOR_REPRODUCING
                        || self.rng.next() > REPRODUCING_START_CHANCE
                    {
                        continue;
                    }

                    let mut can_reproduce = false;
                    let own_z_plus_2_is_air = self.chunk(cx, cy).block(x, y, z + 2).is_air();

                    let world_x = base_x + x as i32;
                    let world_y = base_y + y as i32;
                    for (nx, ny) in hex_neighbors(world_x, world_y) {
                        if !self.in_borders(nx, ny, z as i32) {
                            continue;
                        }
                        let (ncx, nlx) = Self::split(nx);
                        let (ncy, nly) = Self::split(ny);

                        let kind_at = |w: &Self, dz: i32| {
                            w.chunk(ncx, ncy)
                                .block_kind(nlx, nly, (z as i32 + dz) as u32)
                        };
                        let below = kind_at(self, -1);
                        let level = kind_at(self, 0);
                        let above = kind_at(self, 1);
                        let above2 = kind_at(self, 2);

                        // One layer down.
                        if below == BlockKind::Soil
                            && level == BlockKind::Air
                            && above == BlockKind::Air
                        {
                            if self.rng.next() <= REPRODUCING_DO_CHANCE {
                                self.chunk_mut(ncx, ncy).new_active_grass(nlx, nly, z - 1);
                                self.renderer.update_chunk(ncx, ncy, false);
                            }
                            can_reproduce = true;
                        }
                        // Level.
                        if level == BlockKind::Soil && above == BlockKind::Air {
                            if self.rng.next() <= REPRODUCING_DO_CHANCE {
                                self.chunk_mut(ncx, ncy).new_active_grass(nlx, nly, z);
                                self.renderer.update_chunk(ncx, ncy, false);
                            }
                            can_reproduce = true;
                        }
                        // One layer up, needs open air over both cells.
                        if above == BlockKind::Soil
                            && above2 == BlockKind::Air
                            && own_z_plus_2_is_air
                        {
                            if self.rng.next() <= REPRODUCING_DO_CHANCE {
                                self.chunk_mut(ncx, ncy).new_active_grass(nlx, nly, z + 1);
                                self.renderer.update_chunk(ncx, ncy, false);
                            }
                            can_reproduce = true;
                        }
                    }

                    if !can_reproduce {
                        // Nothing to grow into: go dormant.
                        let chunk = self.chunk_mut(cx, cy);
                        chunk.set_block(x, y, z, CellHandle::normal(BlockKind::Grass));
                        chunk.delete_active_grass(slot);
                        k -= 1;
                    }
                }
            }
        }
    }
}
