//! Fire automaton.
//!
//! A fire's power counter climbs once per tick; past a sixth of the
//! maximum it starts rolling for spread, with chances scaled by
//! `power / MAX_POWER` and the neighbor's flammability. Burning a block
//! replaces it with a fresh fire; air neighbors can catch a jumped spark
//! weighted by the most flammable block around them. Fires go out under
//! rain with open sky, under water, or when nothing flammable remains in
//! reach.

use hexplanet_core::math::hex::hex_neighbors;
use hexplanet_core::Lcg31;

use crate::block::{BlockKind, CellHandle, FireBlock, Form, MAX_FLAMMABILITY};
use crate::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH_LOG2};

use super::World;

const MIN_FIRE_ACTIVATION_POWER: u16 = FireBlock::MAX_POWER / 6;
const FIRE_ACTIVATION_CHANCE: u32 = Lcg31::MAX_RAND / 10;
const NEAR_BLOCK_BURN_BASE_CHANCE: u32 = Lcg31::MAX_RAND / 8;
/// Base burn chances for the cell below and the cell above a fire.
const UP_DOWN_BURN_BASE_CHANCE: [u32; 2] = [Lcg31::MAX_RAND / 12, Lcg31::MAX_RAND / 6];
const RAIN_CHECK_BASE_CHANCE: u32 = Lcg31::MAX_RAND / 24;

impl World {
    /// One fire tick over the active area: spread, then quenching.
    pub(crate) fn fire_phys_tick(&mut self) {
        self.fire_spread_pass();
        self.fire_removal_pass();
    }

    #[allow(clippy::cast_sign_loss, clippy::too_many_lines)]
    fn fire_spread_pass(&mut self) {
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
                        if k >= chunk.fire_list.len() {
                            break;
                        }
                        let slot = chunk.fire_list[k];
                        let Some(b) = chunk.fire_pool.get(slot) else {
                            k += 1;
                            continue;
                        };
                        (slot, u32::from(b.x), u32::from(b.y), u32::from(b.z))
                    };
                    k += 1;

                    // Grow.
                    let power = {
                        let chunk = self.chunk_mut(cx, cy);
                        let Some(fire) = chunk.fire_pool.get_mut(slot) else {
                            continue;
                        };
                        if fire.power < FireBlock::MAX_POWER {
                            fire.power += 1;
                        }
                        fire.power
                    };

                    if power < MIN_FIRE_ACTIVATION_POWER
                        || self.rng.next()
                            >= FIRE_ACTIVATION_CHANCE * u32::from(power)
                                / u32::from(FireBlock::MAX_POWER)
                    {
                        continue;
                    }

                    let world_x = base_x + x as i32;
                    let world_y = base_y + y as i32;
                    let wz = z as i32;

                    let down_is_air = wz > 0 && self.cell_kind(world_x, world_y, wz - 1) == BlockKind::Air;
                    let up_is_air = wz + 1 < CHUNK_HEIGHT as i32
                        && self.cell_kind(world_x, world_y, wz + 1) == BlockKind::Air;
                    let up_down_is_air = [down_is_air, up_is_air];

                    let scale = |base: u32| base * u32::from(power) / u32::from(FireBlock::MAX_POWER);
                    let near_chance = scale(NEAR_BLOCK_BURN_BASE_CHANCE);
                    let up_down_chance = [
                        scale(UP_DOWN_BURN_BASE_CHANCE[0]),
                        scale(UP_DOWN_BURN_BASE_CHANCE[1]),
                    ];

                    // The six side neighbors, plus the diagonal cells
                    // above and below them.
                    for (nx, ny) in hex_neighbors(world_x, world_y) {
                        if !self.in_borders(nx, ny, wz) {
                            continue;
                        }
                        let near_kind = self.cell_kind(nx, ny, wz);
                        let near_is_air = near_kind == BlockKind::Air;

                        if MAX_FLAMMABILITY * self.rng.next()
                            < u32::from(near_kind.flammability()) * near_chance
                        {
                            self.burn_block(nx, ny, wz);
                        } else if near_is_air {
                            self.try_place_fire(nx, ny, wz, near_chance);
                        }

                        for dz in [-1i32, 1] {
                            let z_index = ((dz + 1) >> 1) as usize;
                            let nz = wz + dz;
                            if nz < 0 || nz >= CHUNK_HEIGHT as i32 {
                                continue;
                            }
                            let is_path = up_down_is_air[z_index] || near_is_air;
                            if is_path && self.cell_kind(nx, ny, nz) == BlockKind::Air {
                                self.try_place_fire(nx, ny, nz, up_down_chance[z_index]);
                            }
                        }
                    }

                    // The cells directly above and below.
                    for dz in [-1i32, 1] {
                        let z_index = ((dz + 1) >> 1) as usize;
                        let nz = wz + dz;
                        if nz < 0 || nz >= CHUNK_HEIGHT as i32 {
                            continue;
                        }
                        let kind = self.cell_kind(world_x, world_y, nz);
                        if MAX_FLAMMABILITY * self.rng.next()
                            < u32::from(kind.flammability()) * near_chance
                        {
                            self.burn_block(world_x, world_y, nz);
                        } else if up_down_is_air[z_index] {
                            self.try_place_fire(world_x, world_y, nz, up_down_chance[z_index]);
                        }
                    }
                }
            }
        }
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn fire_removal_pass(&mut self) {
        let intensity = self.shared.rain_intensity();
        let is_raining = intensity > 0.0;
        let rain_check_chance = (RAIN_CHECK_BASE_CHANCE as f32 * intensity) as u32;

        let margin_x = self.config.active_margin_x;
        let margin_y = self.config.active_margin_y;

        for cy in margin_y..self.chunk_number_y() - margin_y {
            for cx in margin_x..self.chunk_number_x() - margin_x {
                let base_x = cx << CHUNK_WIDTH_LOG2;
                let base_y = cy << CHUNK_WIDTH_LOG2;

                let mut k = 0usize;
                loop {
                    let (x, y, z) = {
                        let chunk = self.chunk(cx, cy);
                        if k >= chunk.fire_list.len() {
                            break;
                        }
                        let slot = chunk.fire_list[k];
                        let Some(b) = chunk.fire_pool.get(slot) else {
                            k += 1;
                            continue;
                        };
                        (u32::from(b.x), u32::from(b.y), u32::from(b.z))
                    };
                    k += 1;

                    let mut extinguished = false;
                    if is_raining && self.rng.next() < rain_check_chance {
                        // Rain reaches the fire only under open sky. The
                        // topmost layer is never inspected.
                        let chunk = self.chunk(cx, cy);
                        let open =
                            (z + 1..CHUNK_HEIGHT - 1).all(|zz| chunk.block(x, y, zz).is_air());
                        extinguished = open;
                    }

                    let world_x = base_x + x as i32;
                    let world_y = base_y + y as i32;
                    let wz = z as i32;

                    let water_above = z + 1 < CHUNK_HEIGHT
                        && self.chunk(cx, cy).block_kind(x, y, z + 1) == BlockKind::Water;

                    if extinguished
                        || water_above
                        || self.max_flammability_around(world_x, world_y, wz) == 0
                    {
                        self.remove_fire(world_x, world_y, wz);
                        k -= 1;
                    }
                }
            }
        }
    }

    /// Burns a block away: the cell is cleared and a fresh fire takes its
    /// place.
    fn burn_block(&mut self, x: i32, y: i32, z: i32) {
        let handle = self.cell(x, y, z);
        if handle.kind().flammability() == 0 {
            return;
        }
        let (cx, _) = Self::split(x);
        let (cy, _) = Self::split(y);
        if let Some(slot) = handle.slot() {
            // Flammable pooled variants: active grass, failing wood/sand.
            let chunk = self.chunk_mut(cx, cy);
            match handle.kind() {
                BlockKind::Grass => chunk.delete_active_grass(slot),
                kind if kind.form() == Form::Full => chunk.delete_failing_block(slot),
                _ => chunk.delete_nonstandard_block(slot),
            }
        }
        self.set_cell(x, y, z, CellHandle::AIR);
        self.relight_block_remove(x, y, z);
        self.place_fire(x, y, z);
        self.check_block_neighbors(x, y, z);
    }

    /// Rolls to ignite an air cell, weighted by the most flammable block
    /// around it.
    fn try_place_fire(&mut self, x: i32, y: i32, z: i32, base_chance: u32) {
        if !self.in_borders(x, y, z) || self.cell_kind(x, y, z) != BlockKind::Air {
            return;
        }
        let max_flammability = self.max_flammability_around(x, y, z);
        if MAX_FLAMMABILITY * self.rng.next() >= max_flammability * base_chance {
            return;
        }
        self.place_fire(x, y, z);
    }

    /// Installs a fire and shines its light.
    #[allow(clippy::cast_sign_loss)]
    fn place_fire(&mut self, x: i32, y: i32, z: i32) {
        debug_assert!(self.cell_kind(x, y, z) == BlockKind::Air);
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        self.chunk_mut(cx, cy).new_fire(lx, ly, z as u32);

        let level = FireBlock::LIGHT_LEVEL;
        self.add_fire_light(x, y, z, level);
        self.update_in_radius(x, y, i32::from(level));
        self.update_water_in_radius(x, y, i32::from(level));
    }

    /// Highest flammability among the cells above, below, and the six
    /// side neighbors.
    fn max_flammability_around(&self, x: i32, y: i32, z: i32) -> u32 {
        let mut max = 0u32;
        for dz in [-1i32, 1] {
            let nz = z + dz;
            if nz >= 0 && nz < CHUNK_HEIGHT as i32 {
                max = max.max(u32::from(self.cell_kind(x, y, nz).flammability()));
            }
        }
        for (nx, ny) in hex_neighbors(x, y) {
            if self.in_borders(nx, ny, z) {
                max = max.max(u32::from(self.cell_kind(nx, ny, z).flammability()));
            }
        }
        max
    }
}
