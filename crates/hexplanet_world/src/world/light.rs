//! # Light Engine
//!
//! Two scalar light fields per cell: sun (`0..=8`) and fire (`0..=13`).
//! Propagation is a work-queue flood over the eight cell neighbors (six
//! hex sides, up, down): a hop costs one level, entering a liquid cell
//! costs two more, solid cells absorb. Sunlight at its maximum falls
//! through air for free, which is what carves sun shafts down open
//! columns.
//!
//! Removal is re-derivation: blank a box whose radius matches the
//! removed source's reach, re-seed the sun columns inside it from the
//! sky, then flood back in from the box boundary and from every emitter
//! inside the box. Re-derivation over a box is also how freshly loaded
//! border chunks and water-modified chunks are lit.

use std::collections::VecDeque;

use hexplanet_core::math::hex::{forward_side_y, hex_neighbors};

use crate::block::{light_pass_bits, LightPass};
use crate::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH, CHUNK_WIDTH_LOG2};

use super::{World, MAX_FIRE_LIGHT, MAX_SUN_LIGHT};

/// Extra attenuation for light entering a liquid cell.
const LIQUID_EXTRA_COST: u8 = 2;

impl World {
    // ----- field access ---------------------------------------------------

    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn pass_at(&self, x: i32, y: i32, z: i32) -> LightPass {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        light_pass_bits(self.chunk(cx, cy).transparency_at(lx, ly, z as u32))
    }

    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn sun_at(&self, x: i32, y: i32, z: i32) -> u8 {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        self.chunk(cx, cy).sun_light_at(lx, ly, z as u32)
    }

    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn fire_at(&self, x: i32, y: i32, z: i32) -> u8 {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        self.chunk(cx, cy).fire_light_at(lx, ly, z as u32)
    }

    #[allow(clippy::cast_sign_loss)]
    fn set_sun(&mut self, x: i32, y: i32, z: i32, level: u8) {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        let chunk = self.chunk_mut(cx, cy);
        chunk.sun_light[crate::chunk::cell_addr(lx, ly, z as u32)] = level;
        chunk.needs_light_update = true;
    }

    #[allow(clippy::cast_sign_loss)]
    fn set_fire(&mut self, x: i32, y: i32, z: i32, level: u8) {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        let chunk = self.chunk_mut(cx, cy);
        chunk.fire_light[crate::chunk::cell_addr(lx, ly, z as u32)] = level;
        chunk.needs_light_update = true;
    }

    /// Sun light at a window cell, clamped to the window. Read-only and
    /// safe for any coordinates.
    #[must_use]
    pub fn sun_light_level(&self, x: i32, y: i32, z: i32) -> u8 {
        self.sun_at(self.clamp_x(x), self.clamp_y(y), Self::clamp_z(z))
    }

    /// Fire light at a window cell, clamped to the window.
    #[must_use]
    pub fn fire_light_level(&self, x: i32, y: i32, z: i32) -> u8 {
        self.fire_at(self.clamp_x(x), self.clamp_y(y), Self::clamp_z(z))
    }

    #[inline]
    pub(crate) fn fire_light_level_at(&self, x: i32, y: i32, z: i32) -> u8 {
        self.fire_at(x, y, z)
    }

    /// Sun and fire light of the forward upper vertex of the prism at
    /// `(x, y, z)`: the average over the three prisms sharing it, in
    /// 1/16 units.
    #[must_use]
    pub fn forward_vertex_light(&self, x: i32, y: i32, z: i32) -> [u8; 2] {
        self.vertex_light([(x, y), (x, y + 1), (x + 1, forward_side_y(x, y))], z)
    }

    /// As [`Self::forward_vertex_light`], for the back upper vertex.
    #[must_use]
    pub fn back_vertex_light(&self, x: i32, y: i32, z: i32) -> [u8; 2] {
        self.vertex_light(
            [(x, y), (x, y - 1), (x - 1, hexplanet_core::math::hex::back_side_y(x, y))],
            z,
        )
    }

    #[allow(clippy::cast_possible_truncation)]
    fn vertex_light(&self, cells: [(i32, i32); 3], z: i32) -> [u8; 2] {
        let mut sun = 0u16;
        let mut fire = 0u16;
        for (x, y) in cells {
            sun += u16::from(self.sun_light_level(x, y, z));
            fire += u16::from(self.fire_light_level(x, y, z));
        }
        [(sun * 16 / 3) as u8, (fire * 16 / 3) as u8]
    }

    // ----- propagation ----------------------------------------------------

    /// Level of sunlight after entering a cell of class `pass`.
    /// `downward` marks a z−1 hop: maximal light falls through air for
    /// free, which is what carves sun shafts.
    fn propagated_sun(level: u8, pass: LightPass, downward: bool) -> u8 {
        if pass == LightPass::Solid {
            return 0;
        }
        let base = if downward && level == MAX_SUN_LIGHT && pass == LightPass::Air {
            level
        } else {
            level.saturating_sub(1)
        };
        if pass == LightPass::Liquid {
            base.saturating_sub(LIQUID_EXTRA_COST)
        } else {
            base
        }
    }

    /// Level of fire light after entering a cell of class `pass`.
    fn propagated_fire(level: u8, pass: LightPass) -> u8 {
        if pass == LightPass::Solid {
            return 0;
        }
        let base = level.saturating_sub(1);
        if pass == LightPass::Liquid {
            base.saturating_sub(LIQUID_EXTRA_COST)
        } else {
            base
        }
    }

    /// Eight neighbors of a cell as `(x, y, z, downward)`.
    fn neighbors8(x: i32, y: i32, z: i32) -> [(i32, i32, i32, bool); 8] {
        let h = hex_neighbors(x, y);
        [
            (h[0].0, h[0].1, z, false),
            (h[1].0, h[1].1, z, false),
            (h[2].0, h[2].1, z, false),
            (h[3].0, h[3].1, z, false),
            (h[4].0, h[4].1, z, false),
            (h[5].0, h[5].1, z, false),
            (x, y, z + 1, false),
            (x, y, z - 1, true),
        ]
    }

    /// Expands queued sun light until the frontier dies out.
    fn flood_sun(&mut self, queue: &mut VecDeque<(i32, i32, i32)>) {
        while let Some((x, y, z)) = queue.pop_front() {
            let level = self.sun_at(x, y, z);
            if level <= 1 {
                continue;
            }
            for (nx, ny, nz, down) in Self::neighbors8(x, y, z) {
                if !self.in_borders(nx, ny, nz) {
                    continue;
                }
                let incoming = Self::propagated_sun(level, self.pass_at(nx, ny, nz), down);
                if incoming > self.sun_at(nx, ny, nz) {
                    self.set_sun(nx, ny, nz, incoming);
                    queue.push_back((nx, ny, nz));
                }
            }
        }
    }

    /// Expands queued fire light until the frontier dies out.
    fn flood_fire(&mut self, queue: &mut VecDeque<(i32, i32, i32)>) {
        while let Some((x, y, z)) = queue.pop_front() {
            let level = self.fire_at(x, y, z);
            if level <= 1 {
                continue;
            }
            for (nx, ny, nz, _down) in Self::neighbors8(x, y, z) {
                if !self.in_borders(nx, ny, nz) {
                    continue;
                }
                let incoming = Self::propagated_fire(level, self.pass_at(nx, ny, nz));
                if incoming > self.fire_at(nx, ny, nz) {
                    self.set_fire(nx, ny, nz, incoming);
                    queue.push_back((nx, ny, nz));
                }
            }
        }
    }

    /// Floods sun light of `level` from a cell (writes `max(current,
    /// level)`).
    pub(crate) fn add_sun_light(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if !self.in_borders(x, y, z) {
            return;
        }
        if level > self.sun_at(x, y, z) {
            self.set_sun(x, y, z, level);
        }
        let mut queue = VecDeque::from([(x, y, z)]);
        self.flood_sun(&mut queue);
    }

    /// Floods fire light of `level` from a cell.
    pub(crate) fn add_fire_light(&mut self, x: i32, y: i32, z: i32, level: u8) {
        if !self.in_borders(x, y, z) {
            return;
        }
        if level > self.fire_at(x, y, z) {
            self.set_fire(x, y, z, level);
        }
        let mut queue = VecDeque::from([(x, y, z)]);
        self.flood_fire(&mut queue);
    }

    // ----- re-derivation --------------------------------------------------

    /// Re-derives light after a cell became non-air. Returns the radius
    /// that needs renderer refreshes (the old light level at the cell).
    pub(crate) fn relight_block_add(&mut self, x: i32, y: i32, z: i32) -> u8 {
        if !self.in_borders(x, y, z) {
            return 0;
        }
        let radius = self.sun_at(x, y, z).max(self.fire_at(x, y, z));
        let r = i32::from(radius).max(1);
        self.relight_box(
            self.clamp_x(x - r),
            self.clamp_x(x + r),
            self.clamp_y(y - r),
            self.clamp_y(y + r),
            Self::clamp_z(z - r),
            Self::clamp_z(z + r),
        );
        radius
    }

    /// Pulls light into a cell that just became passable and floods it
    /// onward. Never decreases any level.
    pub(crate) fn relight_block_remove(&mut self, x: i32, y: i32, z: i32) {
        if !self.in_borders(x, y, z) {
            return;
        }
        let pass = self.pass_at(x, y, z);
        let mut best_sun = self.sun_at(x, y, z);
        let mut best_fire = self.fire_at(x, y, z);

        for (nx, ny, nz, _down) in Self::neighbors8(x, y, z) {
            if !self.in_borders(nx, ny, nz) {
                // Above the world there is sky.
                if nz >= CHUNK_HEIGHT as i32 {
                    best_sun = best_sun.max(Self::propagated_sun(MAX_SUN_LIGHT, pass, true));
                }
                continue;
            }
            // Light travels down into us from the neighbor above.
            let downward = nz == z + 1;
            best_sun = best_sun.max(Self::propagated_sun(self.sun_at(nx, ny, nz), pass, downward));
            best_fire = best_fire.max(Self::propagated_fire(self.fire_at(nx, ny, nz), pass));
        }

        if best_sun > self.sun_at(x, y, z) {
            self.set_sun(x, y, z, best_sun);
        }
        if best_fire > self.fire_at(x, y, z) {
            self.set_fire(x, y, z, best_fire);
        }
        let mut queue = VecDeque::from([(x, y, z)]);
        self.flood_sun(&mut queue);
        queue.push_back((x, y, z));
        self.flood_fire(&mut queue);
    }

    /// Blanks a box, re-seeds its sun columns from the sky, then floods
    /// back in from the boundary and from every emitter inside.
    #[allow(clippy::cast_sign_loss, clippy::too_many_lines)]
    pub(crate) fn relight_box(
        &mut self,
        x0: i32,
        x1: i32,
        y0: i32,
        y1: i32,
        z0: i32,
        z1: i32,
    ) {
        // 1) Sun column seeds and fire blanking.
        for x in x0..=x1 {
            for y in y0..=y1 {
                let mut level = MAX_SUN_LIGHT;
                for z in ((z1 + 1)..CHUNK_HEIGHT as i32).rev() {
                    level = Self::propagated_sun(level, self.pass_at(x, y, z), true);
                }
                for z in (z0..=z1).rev() {
                    level = Self::propagated_sun(level, self.pass_at(x, y, z), true);
                    self.set_sun(x, y, z, level);
                    self.set_fire(x, y, z, 0);
                }
            }
        }

        // 2) Flood seeds: lit cells inside the box and the shell around it.
        let mut sun_queue = VecDeque::new();
        let mut fire_queue = VecDeque::new();
        for x in (x0 - 1).max(0)..=(x1 + 1).min(self.chunk_number_x() * CHUNK_WIDTH as i32 - 1) {
            for y in (y0 - 1).max(0)..=(y1 + 1).min(self.chunk_number_y() * CHUNK_WIDTH as i32 - 1)
            {
                for z in (z0 - 1).max(0)..=(z1 + 1).min(CHUNK_HEIGHT as i32 - 1) {
                    if self.sun_at(x, y, z) > 1 {
                        sun_queue.push_back((x, y, z));
                    }
                    if self.fire_at(x, y, z) > 1 {
                        fire_queue.push_back((x, y, z));
                    }
                }
            }
        }

        // 3) Emitters inside the box shine again.
        let cx0 = x0 >> CHUNK_WIDTH_LOG2;
        let cx1 = x1 >> CHUNK_WIDTH_LOG2;
        let cy0 = y0 >> CHUNK_WIDTH_LOG2;
        let cy1 = y1 >> CHUNK_WIDTH_LOG2;
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                let base_x = cx << CHUNK_WIDTH_LOG2;
                let base_y = cy << CHUNK_WIDTH_LOG2;
                let emitters: Vec<(i32, i32, i32, u8)> = self
                    .chunk(cx, cy)
                    .fire_light_emitters()
                    .map(|(lx, ly, lz, level)| {
                        (base_x + lx as i32, base_y + ly as i32, lz as i32, level)
                    })
                    .collect();
                for (ex, ey, ez, level) in emitters {
                    if ex < x0 || ex > x1 || ey < y0 || ey > y1 || ez < z0 || ez > z1 {
                        continue;
                    }
                    if level > self.fire_at(ex, ey, ez) {
                        self.set_fire(ex, ey, ez, level);
                    }
                    fire_queue.push_back((ex, ey, ez));
                }
            }
        }

        self.flood_sun(&mut sun_queue);
        self.flood_fire(&mut fire_queue);
    }

    // ----- window lighting ------------------------------------------------

    /// Seeds light for the whole freshly populated window.
    pub(crate) fn light_world(&mut self) {
        let w = self.chunk_number_x() * CHUNK_WIDTH as i32;
        let h = self.chunk_number_y() * CHUNK_WIDTH as i32;

        // Per-column sun seeding; `ground[c]` is the first dark z.
        let mut ground = vec![0i32; (w * h) as usize];
        for x in 0..w {
            for y in 0..h {
                let mut level = MAX_SUN_LIGHT;
                let mut first_dark = -1i32;
                for z in (0..CHUNK_HEIGHT as i32).rev() {
                    level = Self::propagated_sun(level, self.pass_at(x, y, z), true);
                    self.set_sun(x, y, z, level);
                    if level == 0 && first_dark < 0 {
                        first_dark = z;
                    }
                }
                ground[(x * h + y) as usize] = first_dark;
            }
        }

        // Horizontal frontier: lit cells beside higher neighbor columns.
        let mut sun_queue = VecDeque::new();
        for x in 0..w {
            for y in 0..h {
                let gc = ground[(x * h + y) as usize];
                for (nx, ny) in hex_neighbors(x, y) {
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let gn = ground[(nx * h + ny) as usize];
                    // Our column is open where the neighbor is dark: those
                    // cells carry light sideways.
                    for z in (gc + 1)..=gn {
                        sun_queue.push_back((x, y, z));
                    }
                }
            }
        }
        self.flood_sun(&mut sun_queue);

        // Fire emitters across the window.
        let mut fire_queue = VecDeque::new();
        for cy in 0..self.chunk_number_y() {
            for cx in 0..self.chunk_number_x() {
                let base_x = cx << CHUNK_WIDTH_LOG2;
                let base_y = cy << CHUNK_WIDTH_LOG2;
                let emitters: Vec<(i32, i32, i32, u8)> = self
                    .chunk(cx, cy)
                    .fire_light_emitters()
                    .map(|(lx, ly, lz, level)| {
                        (base_x + lx as i32, base_y + ly as i32, lz as i32, level)
                    })
                    .collect();
                for (ex, ey, ez, level) in emitters {
                    if level > self.fire_at(ex, ey, ez) {
                        self.set_fire(ex, ey, ez, level);
                    }
                    fire_queue.push_back((ex, ey, ez));
                }
                self.chunk_mut(cx, cy).needs_initial_light = false;
            }
        }
        self.flood_fire(&mut fire_queue);
    }

    /// Lights one chunk that just entered the window and merges it with
    /// its lit neighbors.
    pub(crate) fn light_border_chunk(&mut self, cx: i32, cy: i32) {
        let x0 = cx << CHUNK_WIDTH_LOG2;
        let y0 = cy << CHUNK_WIDTH_LOG2;
        let x1 = x0 + CHUNK_WIDTH as i32 - 1;
        let y1 = y0 + CHUNK_WIDTH as i32 - 1;

        let fresh = self.chunk(cx, cy).needs_initial_light;
        if fresh {
            // Generated chunks arrive with zero light: seed the columns.
            for x in x0..=x1 {
                for y in y0..=y1 {
                    let mut level = MAX_SUN_LIGHT;
                    for z in (0..CHUNK_HEIGHT as i32).rev() {
                        level = Self::propagated_sun(level, self.pass_at(x, y, z), true);
                        self.set_sun(x, y, z, level);
                    }
                }
            }
        }
        self.chunk_mut(cx, cy).needs_initial_light = false;

        // Merge both ways: everything lit inside the chunk, plus the
        // shell of already-lit neighbor cells around it.
        let mut sun_queue = VecDeque::new();
        let mut fire_queue = VecDeque::new();
        let sx0 = (x0 - 1).max(0);
        let sx1 = (x1 + 1).min(self.chunk_number_x() * CHUNK_WIDTH as i32 - 1);
        let sy0 = (y0 - 1).max(0);
        let sy1 = (y1 + 1).min(self.chunk_number_y() * CHUNK_WIDTH as i32 - 1);
        for x in sx0..=sx1 {
            for y in sy0..=sy1 {
                for z in 0..CHUNK_HEIGHT as i32 {
                    if self.sun_at(x, y, z) > 1 {
                        sun_queue.push_back((x, y, z));
                    }
                    if self.fire_at(x, y, z) > 1 {
                        fire_queue.push_back((x, y, z));
                    }
                }
            }
        }

        if fresh {
            let base_x = x0;
            let base_y = y0;
            let emitters: Vec<(i32, i32, i32, u8)> = self
                .chunk(cx, cy)
                .fire_light_emitters()
                .map(|(lx, ly, lz, level)| {
                    (base_x + lx as i32, base_y + ly as i32, lz as i32, level)
                })
                .collect();
            for (ex, ey, ez, level) in emitters {
                if level > self.fire_at(ex, ey, ez) {
                    self.set_fire(ex, ey, ez, level);
                }
                fire_queue.push_back((ex, ey, ez));
            }
        }

        self.flood_sun(&mut sun_queue);
        self.flood_fire(&mut fire_queue);
    }

    /// Re-derives light in chunks the water automaton touched this tick.
    pub(crate) fn relight_water_modified_chunks(&mut self) {
        let mut stale = Vec::new();
        for cy in 0..self.chunk_number_y() {
            for cx in 0..self.chunk_number_x() {
                if self.chunk(cx, cy).water_modified {
                    stale.push((cx, cy));
                }
            }
        }
        for (cx, cy) in stale {
            self.chunk_mut(cx, cy).water_modified = false;
            let x0 = cx << CHUNK_WIDTH_LOG2;
            let y0 = cy << CHUNK_WIDTH_LOG2;
            self.relight_box(
                x0,
                x0 + CHUNK_WIDTH as i32 - 1,
                y0,
                y0 + CHUNK_WIDTH as i32 - 1,
                0,
                CHUNK_HEIGHT as i32 - 1,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, CellHandle};
    use crate::oracle::FlatOracle;
    use crate::renderer::NullRenderer;
    use crate::settings::{MemorySettings, SettingsStore};
    use crate::world::World;

    fn world(tag: &str, height: u32) -> (World, std::path::PathBuf) {
        let dir =
            std::env::temp_dir().join(format!("hexplanet_light_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut settings = MemorySettings::new();
        settings.set_int(crate::settings::keys::CHUNK_NUMBER_X, 8);
        settings.set_int(crate::settings::keys::CHUNK_NUMBER_Y, 8);
        let world = World::new(
            &mut settings,
            &dir,
            Box::new(FlatOracle { height }),
            Box::new(NullRenderer),
        )
        .unwrap();
        (world, dir)
    }

    #[test]
    fn test_sun_seeding_columns() {
        // Ground surface at z = 40 (grass): full sun above, darkness below.
        let (world, dir) = world("seed", 41);
        for z in 41..CHUNK_HEIGHT as i32 {
            assert_eq!(world.sun_light_level(40, 40, z), MAX_SUN_LIGHT, "z={z}");
        }
        assert_eq!(world.sun_light_level(40, 40, 39), 0);
        assert_eq!(world.sun_light_level(40, 40, 10), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_light_bounds() {
        let (world, dir) = world("bounds", 41);
        for x in 30..50 {
            for y in 30..50 {
                for z in 0..CHUNK_HEIGHT as i32 {
                    assert!(world.sun_light_level(x, y, z) <= MAX_SUN_LIGHT);
                    assert!(world.fire_light_level(x, y, z) <= MAX_FIRE_LIGHT);
                }
            }
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fire_light_floods_and_attenuates() {
        let (mut world, dir) = world("fire", 41);
        let (x, y, z) = (40, 40, 50);
        world.set_cell(x, y, z, CellHandle::normal(BlockKind::Air));
        world.add_fire_light(x, y, z, MAX_FIRE_LIGHT);

        assert_eq!(world.fire_light_level(x, y, z), MAX_FIRE_LIGHT);
        for (nx, ny) in hex_neighbors(x, y) {
            assert_eq!(world.fire_light_level(nx, ny, z), MAX_FIRE_LIGHT - 1);
        }
        assert_eq!(world.fire_light_level(x, y, z + 1), MAX_FIRE_LIGHT - 1);
        assert_eq!(world.fire_light_level(x + 4, y, z), MAX_FIRE_LIGHT - 4);
        // The ground absorbs: nothing below the surface.
        assert_eq!(world.fire_light_level(x, y, 39), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_removal_never_darkens_sun() {
        // Removing a solid block may only raise sun light anywhere.
        let (mut world, dir) = world("remove", 41);
        let mut before = Vec::new();
        for x in 35..46 {
            for y in 35..46 {
                for z in 30..60 {
                    before.push(world.sun_light_level(x, y, z));
                }
            }
        }

        world.set_cell(40, 40, 40, CellHandle::AIR);
        world.relight_block_remove(40, 40, 40);

        let mut i = 0;
        for x in 35..46 {
            for y in 35..46 {
                for z in 30..60 {
                    assert!(
                        world.sun_light_level(x, y, z) >= before[i],
                        "darkened at ({x},{y},{z})"
                    );
                    i += 1;
                }
            }
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_removed_surface_opens_shaft() {
        let (mut world, dir) = world("shaft", 41);
        // Dig a 1-cell hole through the surface: the cell below sees sky.
        world.set_cell(40, 40, 40, CellHandle::AIR);
        world.relight_block_remove(40, 40, 40);
        assert_eq!(world.sun_light_level(40, 40, 40), MAX_SUN_LIGHT);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_block_add_darkens_only_under_it() {
        let (mut world, dir) = world("add", 41);
        // Roof one cell above the surface.
        world.set_cell(40, 40, 45, CellHandle::normal(BlockKind::Stone));
        world.relight_block_add(40, 40, 45);

        // Below the roof the shaft is gone; sideways light leaks in.
        let below = world.sun_light_level(40, 40, 44);
        assert!(below < MAX_SUN_LIGHT);
        assert!(below >= MAX_SUN_LIGHT - 3, "one roof cell cannot black out");
        // Far away nothing changed.
        assert_eq!(world.sun_light_level(50, 50, 44), MAX_SUN_LIGHT);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_vertex_light_averages() {
        let (world, dir) = world("vertex", 41);
        let [sun, _fire] = world.forward_vertex_light(40, 40, 50);
        assert_eq!(sun, MAX_SUN_LIGHT * 16);
        std::fs::remove_dir_all(&dir).ok();
    }
}
