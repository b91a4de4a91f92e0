//! # World
//!
//! The rectangular matrix of loaded chunks and every mutator that acts on
//! it. Methods without a thread-safety note run on the simulation thread
//! only; cross-thread communication goes through [`WorldShared`].
//!
//! Coordinates: "window cells" are relative to the loaded window
//! (`0..chunk_number * 16`); "global cells" add the window origin
//! `(longitude, latitude) * 16`. Actions arrive global and are rebased at
//! drain time, because the window may have slid since they were queued.

mod failing;
mod fire;
mod grass;
pub mod light;
mod mesh;
mod rain;
mod tick;
mod water;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hexplanet_core::math::hex::{hex_neighbors, world_to_hex, Direction};
use hexplanet_core::{compress_prepend_size, decompress_size_prepended, Calendar, Lcg31};
use thiserror::Error;

use crate::actions::{ActionKind, WorldAction};
use crate::block::{BlockKind, CellHandle, FireBlock, Form};
use crate::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_WIDTH, CHUNK_WIDTH_LOG2, MAX_WATER_LEVEL};
use crate::chunk_loader::ChunkLoader;
use crate::header::WorldHeader;
use crate::oracle::WorldOracle;
use crate::persistence::{deserialize_chunk, serialize_chunk};
use crate::renderer::WorldRenderer;
use crate::settings::{SettingsStore, WorldConfig};

pub use rain::RainMachine;
pub use tick::{Scheduler, WorldShared};

/// Simulation tick rate.
pub const TICKS_PER_SECOND: u32 = 15;
/// Target tick interval.
pub const TICK_INTERVAL_MS: u64 = 1000 / TICKS_PER_SECOND as u64;

/// Highest sun-light level.
pub const MAX_SUN_LIGHT: u8 = 8;
/// Highest fire-light level.
pub const MAX_FIRE_LIGHT: u8 = 13;

pub(crate) const DAY_DURATION_TICKS: u32 = 12 * 60 * TICKS_PER_SECOND;
pub(crate) const DAYS_IN_YEAR: u32 = 32;
const SUMMER_SOLSTICE_DAY: u32 = DAYS_IN_YEAR / 4;
const GLOBAL_WORLD_LATITUDE_DEG: f32 = 40.0;

/// A fresh world starts on the spring-equinox day, a little after
/// sunrise.
const WORLD_START_TICK: u32 = (DAYS_IN_YEAR + SUMMER_SOLSTICE_DAY - DAYS_IN_YEAR / 4)
    % DAYS_IN_YEAR
    * DAY_DURATION_TICKS
    + DAY_DURATION_TICKS / 4
    + DAY_DURATION_TICKS / 16;

/// Cardinal directions the window can slide in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlideDirection {
    /// `latitude + 1`.
    North,
    /// `latitude - 1`.
    South,
    /// `longitude + 1`.
    East,
    /// `longitude - 1`.
    West,
}

/// Failures that abort world startup.
#[derive(Error, Debug)]
pub enum WorldError {
    /// The world directory cannot be created or opened.
    #[error("world directory unusable: {0}")]
    Directory(#[from] std::io::Error),
}

/// Scout coordinate channel (the mob stub): a discrete position that
/// steps toward a target without path search.
struct Scout {
    position: [i32; 3],
    last_think_tick: u32,
}

/// The simulation state. Owned and mutated by one thread.
pub struct World {
    config: WorldConfig,
    calendar: Calendar,
    global_latitude: f32,

    /// Window origin: world coordinates of the south-west chunk.
    longitude: i32,
    latitude: i32,
    /// Row-major chunk matrix, index `cx + cy * chunk_number_x`.
    chunks: Vec<Box<Chunk>>,

    oracle: Box<dyn WorldOracle>,
    loader: ChunkLoader,
    world_dir: PathBuf,
    renderer: Box<dyn WorldRenderer>,

    /// Automata PRNG.
    rng: Lcg31,
    rain: RainMachine,

    phys_tick_count: u32,
    drain_buffer: VecDeque<WorldAction>,
    scout: Scout,

    shared: Arc<WorldShared>,
}

impl World {
    /// Builds a world around the observer recorded in the on-disk header
    /// (or the defaults for a fresh world), loading or generating every
    /// chunk of the window and seeding its light.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] when the world directory is unusable.
    pub fn new(
        settings: &mut dyn SettingsStore,
        world_dir: &Path,
        oracle: Box<dyn WorldOracle>,
        renderer: Box<dyn WorldRenderer>,
    ) -> Result<Self, WorldError> {
        let config = WorldConfig::from_settings(settings);
        let header = WorldHeader::load(world_dir);
        let loader = ChunkLoader::new(world_dir)?;

        let calendar = Calendar::new(
            DAY_DURATION_TICKS,
            DAYS_IN_YEAR,
            23.439_281f32.to_radians(),
            SUMMER_SOLSTICE_DAY,
        );

        // Center the window on the observer.
        let (obs_x, obs_y) = world_to_hex(header.observer_position.truncate());
        let obs_lon = (obs_x + (CHUNK_WIDTH as i32 >> 1)) >> CHUNK_WIDTH_LOG2;
        let obs_lat = (obs_y + (CHUNK_WIDTH as i32 >> 1)) >> CHUNK_WIDTH_LOG2;
        let longitude = obs_lon - config.chunk_number_x / 2;
        let latitude = obs_lat - config.chunk_number_y / 2;

        let phys_tick_count = if header.ticks == 0 {
            WORLD_START_TICK
        } else {
            header.ticks
        };

        let shared = Arc::new(WorldShared::new(
            calendar.ticks_per_year(),
            phys_tick_count,
            header.observer_position,
            header.observer_rotation,
        ));

        let mut world = Self {
            config,
            calendar,
            global_latitude: GLOBAL_WORLD_LATITUDE_DEG.to_radians(),
            longitude,
            latitude,
            chunks: Vec::with_capacity((config.chunk_number_x * config.chunk_number_y) as usize),
            oracle,
            loader,
            world_dir: world_dir.to_owned(),
            renderer,
            rng: Lcg31::new(config.seed),
            rain: RainMachine::restore(&header.rain),
            phys_tick_count,
            drain_buffer: VecDeque::new(),
            scout: Scout {
                position: [0, 0, 72],
                last_think_tick: 0,
            },
            shared,
        };

        for cy in 0..world.config.chunk_number_y {
            for cx in 0..world.config.chunk_number_x {
                let chunk = world.load_or_generate(longitude + cx, latitude + cy);
                world.chunks.push(Box::new(chunk));
            }
        }
        world.light_world();
        world.rain.publish(&world.shared, world.phys_tick_count);

        log::info!(
            "world ready: {}x{} chunks at ({longitude},{latitude}), tick {phys_tick_count}",
            world.config.chunk_number_x,
            world.config.chunk_number_y,
        );
        Ok(world)
    }

    /// Handle for the UI/render threads. Thread safe by construction.
    #[must_use]
    pub fn shared(&self) -> Arc<WorldShared> {
        Arc::clone(&self.shared)
    }

    /// Window width in chunks.
    #[inline]
    #[must_use]
    pub const fn chunk_number_x(&self) -> i32 {
        self.config.chunk_number_x
    }

    /// Window height in chunks.
    #[inline]
    #[must_use]
    pub const fn chunk_number_y(&self) -> i32 {
        self.config.chunk_number_y
    }

    /// Longitude of the window origin.
    #[inline]
    #[must_use]
    pub const fn longitude(&self) -> i32 {
        self.longitude
    }

    /// Latitude of the window origin.
    #[inline]
    #[must_use]
    pub const fn latitude(&self) -> i32 {
        self.latitude
    }

    /// Longitude of the 2×2 quadchunk containing chunk `longitude`.
    #[inline]
    #[must_use]
    pub const fn chunk_coord_to_quadchunk_x(longitude: i32) -> i32 {
        longitude >> 1
    }

    /// Latitude of the 2×2 quadchunk containing chunk `latitude`.
    #[inline]
    #[must_use]
    pub const fn chunk_coord_to_quadchunk_y(latitude: i32) -> i32 {
        latitude >> 1
    }

    /// The planet latitude of the world, in radians.
    #[inline]
    #[must_use]
    pub const fn global_latitude(&self) -> f32 {
        self.global_latitude
    }

    /// The world calendar.
    #[inline]
    #[must_use]
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Tick within the current year.
    #[must_use]
    pub const fn time_of_year(&self) -> u32 {
        self.phys_tick_count % (DAY_DURATION_TICKS * DAYS_IN_YEAR)
    }

    /// Borrow the chunk at matrix position `(cx, cy)`.
    ///
    /// # Panics
    ///
    /// Panics when the position is outside the matrix.
    #[inline]
    #[must_use]
    pub fn chunk(&self, cx: i32, cy: i32) -> &Chunk {
        debug_assert!(cx >= 0 && cx < self.config.chunk_number_x);
        debug_assert!(cy >= 0 && cy < self.config.chunk_number_y);
        &self.chunks[(cx + cy * self.config.chunk_number_x) as usize]
    }

    #[inline]
    pub(crate) fn chunk_mut(&mut self, cx: i32, cy: i32) -> &mut Chunk {
        debug_assert!(cx >= 0 && cx < self.config.chunk_number_x);
        debug_assert!(cy >= 0 && cy < self.config.chunk_number_y);
        &mut self.chunks[(cx + cy * self.config.chunk_number_x) as usize]
    }

    /// Splits a window cell coordinate into chunk and local parts.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) const fn split(v: i32) -> (i32, u32) {
        (v >> CHUNK_WIDTH_LOG2, (v & (CHUNK_WIDTH as i32 - 1)) as u32)
    }

    /// Cell handle at window cell `(x, y, z)`.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn cell(&self, x: i32, y: i32, z: i32) -> CellHandle {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        self.chunk(cx, cy).block(lx, ly, z as u32)
    }

    /// Block kind at window cell `(x, y, z)`.
    #[inline]
    pub(crate) fn cell_kind(&self, x: i32, y: i32, z: i32) -> BlockKind {
        self.cell(x, y, z).kind()
    }

    /// Writes `handle` at window cell `(x, y, z)`.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn set_cell(&mut self, x: i32, y: i32, z: i32, handle: CellHandle) {
        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        self.chunk_mut(cx, cy).set_block(lx, ly, z as u32, handle);
    }

    /// True when the window cell is inside the loaded window.
    #[must_use]
    pub fn in_borders(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && x < self.config.chunk_number_x * CHUNK_WIDTH as i32
            && y < self.config.chunk_number_y * CHUNK_WIDTH as i32
            && z >= 0
            && z < CHUNK_HEIGHT as i32
    }

    fn can_build(&self, x: i32, y: i32, z: i32) -> bool {
        self.cell_kind(x, y, z) == BlockKind::Air
    }

    pub(crate) fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, self.config.chunk_number_x * CHUNK_WIDTH as i32 - 1)
    }

    pub(crate) fn clamp_y(&self, y: i32) -> i32 {
        y.clamp(0, self.config.chunk_number_y * CHUNK_WIDTH as i32 - 1)
    }

    pub(crate) fn clamp_z(z: i32) -> i32 {
        z.clamp(0, CHUNK_HEIGHT as i32 - 1)
    }

    // ----- mutators -------------------------------------------------------

    /// Applies one queued build at window cell coordinates.
    #[allow(clippy::cast_sign_loss)]
    fn build(
        &mut self,
        x: i32,
        y: i32,
        z: i32,
        kind: BlockKind,
        horizontal_direction: Direction,
        vertical_direction: Direction,
    ) {
        if !self.in_borders(x, y, z) || !self.can_build(x, y, z) {
            return;
        }

        let (cx, lx) = Self::split(x);
        let (cy, ly) = Self::split(y);
        let z_u = z as u32;

        match kind {
            BlockKind::Water => {
                self.chunk_mut(cx, cy).new_water_block(lx, ly, z_u, MAX_WATER_LEVEL);
            }
            BlockKind::FireStone => {
                self.chunk_mut(cx, cy)
                    .new_light_source(lx, ly, z_u, MAX_FIRE_LIGHT);
                self.add_fire_light(x, y, z, MAX_FIRE_LIGHT);
            }
            BlockKind::Fire => {
                self.chunk_mut(cx, cy).new_fire(lx, ly, z_u);
                self.add_fire_light(x, y, z, FireBlock::LIGHT_LEVEL);
            }
            BlockKind::Grass => {
                self.chunk_mut(cx, cy).new_active_grass(lx, ly, z_u);
            }
            _ => match kind.form() {
                Form::Plate | Form::Bisected => {
                    let direction = if kind.form() == Form::Plate {
                        vertical_direction
                    } else {
                        horizontal_direction
                    };
                    self.chunk_mut(cx, cy)
                        .new_nonstandard_block(lx, ly, z_u, kind, direction);
                }
                Form::Full => {
                    self.set_cell(x, y, z, CellHandle::normal(kind));
                }
            },
        }

        let r = if kind == BlockKind::Water {
            1
        } else {
            i32::from(self.relight_block_add(x, y, z)) + 1
        };
        self.update_in_radius(x, y, r);
        self.update_water_in_radius(x, y, r);
        self.check_block_neighbors(x, y, z);
    }

    /// Applies one queued destroy at window cell coordinates.
    fn destroy(&mut self, x: i32, y: i32, z: i32) {
        if !self.in_borders(x, y, z) {
            return;
        }

        let (cx, _) = Self::split(x);
        let (cy, _) = Self::split(y);
        let handle = self.cell(x, y, z);

        match handle.kind() {
            // Liquids are not destroyed directly; they drain on their own.
            BlockKind::Water => {}

            BlockKind::Fire => {
                self.remove_fire(x, y, z);
            }

            BlockKind::FireStone => {
                if let Some(slot) = handle.slot() {
                    self.chunk_mut(cx, cy).delete_light_source(slot);
                }
                self.set_cell(x, y, z, CellHandle::AIR);
                self.relight_block_add(x, y, z);
                self.relight_block_remove(x, y, z);
                self.update_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
                self.update_water_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
            }

            BlockKind::Grass => {
                if let Some(slot) = handle.slot() {
                    self.chunk_mut(cx, cy).delete_active_grass(slot);
                }
                self.set_cell(x, y, z, CellHandle::AIR);
                self.relight_block_remove(x, y, z);
                self.update_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
                self.update_water_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
            }

            kind => {
                if let Some(slot) = handle.slot() {
                    // Failing block or a non-standard form.
                    if kind.form() == Form::Full {
                        self.chunk_mut(cx, cy).delete_failing_block(slot);
                    } else {
                        self.chunk_mut(cx, cy).delete_nonstandard_block(slot);
                    }
                }
                self.set_cell(x, y, z, CellHandle::AIR);
                self.relight_block_remove(x, y, z);
                self.update_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
                self.update_water_in_radius(x, y, i32::from(MAX_FIRE_LIGHT));
            }
        }

        self.check_block_neighbors(x, y, z);
    }

    /// Deletes the fire at window cell `(x, y, z)` and re-derives light.
    pub(crate) fn remove_fire(&mut self, x: i32, y: i32, z: i32) {
        let (cx, _) = Self::split(x);
        let (cy, _) = Self::split(y);
        let handle = self.cell(x, y, z);
        debug_assert_eq!(handle.kind(), BlockKind::Fire);
        let Some(slot) = handle.slot() else { return };

        self.chunk_mut(cx, cy).delete_fire(slot);
        self.set_cell(x, y, z, CellHandle::AIR);

        let r = i32::from(self.fire_light_level_at(x, y, z));
        self.relight_block_add(x, y, z);
        self.relight_block_remove(x, y, z);
        self.update_in_radius(x, y, r);
        self.update_water_in_radius(x, y, r);
    }

    /// Reacts to a change at `(x, y, z)`: wakes inactive grass, drops
    /// unsupported sand, refreshes nearby water surfaces.
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn check_block_neighbors(&mut self, x: i32, y: i32, z: i32) {
        let mut positions = [(x, y); 7];
        positions[1..].copy_from_slice(&hex_neighbors(x, y));

        for (nx, ny) in positions {
            if !self.in_borders(nx, ny, 0) {
                continue;
            }
            let (cx, lx) = Self::split(nx);
            let (cy, ly) = Self::split(ny);

            let z_lo = (z - 2).max(1);
            let z_hi = (z + 1).min(CHUNK_HEIGHT as i32 - 1);
            for nz in z_lo..=z_hi {
                let handle = self.chunk(cx, cy).block(lx, ly, nz as u32);
                match handle.kind() {
                    // Wake inactive grass.
                    BlockKind::Grass => {
                        if handle.slot().is_none() {
                            self.chunk_mut(cx, cy).new_active_grass(lx, ly, nz as u32);
                        }
                    }

                    // Unsupported sand starts failing.
                    BlockKind::Sand => {
                        if handle.slot().is_some() {
                            continue; // already failing
                        }
                        let below = self.chunk(cx, cy).block_kind(lx, ly, nz as u32 - 1);
                        if matches!(below, BlockKind::Air | BlockKind::Water | BlockKind::Fire) {
                            self.chunk_mut(cx, cy)
                                .new_failing_block(lx, ly, nz as u32, BlockKind::Sand);
                            self.relight_block_remove(nx, ny, nz);
                            self.update_in_radius(nx, ny, i32::from(MAX_FIRE_LIGHT));
                            self.update_water_in_radius(nx, ny, i32::from(MAX_FIRE_LIGHT));
                        }
                    }

                    // Water meshes depend on the blocks beside them.
                    BlockKind::Water => {
                        self.renderer.update_chunk_water(cx, cy, false);
                    }

                    _ => {}
                }
            }
        }
    }

    /// Replaces all non-water blocks within a hex radius on a stack of
    /// layers with air, then re-derives light. Exposed for host debug
    /// consoles.
    pub fn blast(&mut self, x: i32, y: i32, z: i32, radius: i32) {
        if !self.in_borders(x, y, z) || radius <= 0 {
            return;
        }

        let mut r = radius;
        for k in z..(z + radius).min(CHUNK_HEIGHT as i32 - 1) {
            self.blast_layer(x, y, k, r);
            r -= 1;
        }
        let mut r = radius - 1;
        for k in ((z - radius + 1).max(0)..z).rev() {
            self.blast_layer(x, y, k, r);
            r -= 1;
        }

        for i in x - radius..x + radius {
            for j in y - radius..y + radius {
                for k in z - radius..z + radius {
                    if self.in_borders(i, j, k) {
                        self.relight_block_remove(i, j, k);
                    }
                }
            }
        }
        self.update_in_radius(x, y, radius);
        self.update_water_in_radius(x, y, radius);
    }

    /// One blast layer: hex BFS out to `power` cells.
    fn blast_layer(&mut self, x: i32, y: i32, z: i32, power: i32) {
        if power <= 0 {
            return;
        }
        let mut queue = VecDeque::new();
        queue.push_back((x, y, power));
        let mut seen = std::collections::HashSet::new();
        seen.insert((x, y));

        while let Some((bx, by, p)) = queue.pop_front() {
            if self.in_borders(bx, by, z) && self.cell_kind(bx, by, z) != BlockKind::Water {
                self.destroy_for_blast(bx, by, z);
            }
            if p <= 1 {
                continue;
            }
            for (nx, ny) in hex_neighbors(bx, by) {
                if seen.insert((nx, ny)) {
                    queue.push_back((nx, ny, p - 1));
                }
            }
        }
    }

    /// Clears a cell for the blast, dropping any pooled variant.
    fn destroy_for_blast(&mut self, x: i32, y: i32, z: i32) {
        let handle = self.cell(x, y, z);
        if handle.is_air() {
            return;
        }
        let (cx, _) = Self::split(x);
        let (cy, _) = Self::split(y);
        if let Some(slot) = handle.slot() {
            let chunk = self.chunk_mut(cx, cy);
            match handle.kind() {
                BlockKind::Water => chunk.delete_water_block(slot),
                BlockKind::FireStone => chunk.delete_light_source(slot),
                BlockKind::Fire => chunk.delete_fire(slot),
                BlockKind::Grass => chunk.delete_active_grass(slot),
                kind if kind.form() != Form::Full => chunk.delete_nonstandard_block(slot),
                _ => chunk.delete_failing_block(slot),
            }
        }
        self.set_cell(x, y, z, CellHandle::AIR);
    }

    // ----- action queue ---------------------------------------------------

    /// Swaps and drains the action queue (start of every tick).
    fn flush_action_queue(&mut self) {
        let mut actions = std::mem::take(&mut self.drain_buffer);
        self.shared.actions().swap_into(&mut actions);

        let origin_x = self.longitude << CHUNK_WIDTH_LOG2;
        let origin_y = self.latitude << CHUNK_WIDTH_LOG2;

        while let Some(action) = actions.pop_front() {
            let x = action.x - origin_x;
            let y = action.y - origin_y;
            match action.kind {
                ActionKind::Build {
                    block_kind,
                    horizontal_direction,
                    vertical_direction,
                } => self.build(x, y, action.z, block_kind, horizontal_direction, vertical_direction),
                ActionKind::Destroy => self.destroy(x, y, action.z),
            }
        }
        self.drain_buffer = actions;
    }

    // ----- renderer hints -------------------------------------------------

    /// Marks every chunk within `r` cells of `(x, y)` stale.
    pub(crate) fn update_in_radius(&mut self, x: i32, y: i32, r: i32) {
        let x_min = self.clamp_x(x - r) >> CHUNK_WIDTH_LOG2;
        let x_max = self.clamp_x(x + r) >> CHUNK_WIDTH_LOG2;
        let y_min = self.clamp_y(y - r) >> CHUNK_WIDTH_LOG2;
        let y_max = self.clamp_y(y + r) >> CHUNK_WIDTH_LOG2;
        for cx in x_min..=x_max {
            for cy in y_min..=y_max {
                self.renderer.update_chunk(cx, cy, false);
            }
        }
    }

    /// Water variant of [`Self::update_in_radius`].
    pub(crate) fn update_water_in_radius(&mut self, x: i32, y: i32, r: i32) {
        let x_min = self.clamp_x(x - r) >> CHUNK_WIDTH_LOG2;
        let x_max = self.clamp_x(x + r) >> CHUNK_WIDTH_LOG2;
        let y_min = self.clamp_y(y - r) >> CHUNK_WIDTH_LOG2;
        let y_max = self.clamp_y(y + r) >> CHUNK_WIDTH_LOG2;
        for cx in x_min..=x_max {
            for cy in y_min..=y_max {
                self.renderer.update_chunk_water(cx, cy, false);
            }
        }
    }

    // ----- sliding window & persistence -----------------------------------

    /// Slides the loaded window one chunk. The lead edge is saved and
    /// dropped, the trailing edge loaded or generated, and the fresh
    /// border's light seeded.
    pub fn slide(&mut self, direction: SlideDirection) {
        let nx = self.config.chunk_number_x;
        let ny = self.config.chunk_number_y;

        match direction {
            SlideDirection::North => {
                let old = std::mem::take(&mut self.chunks);
                let mut kept = Vec::with_capacity(old.len());
                for (i, chunk) in old.into_iter().enumerate() {
                    if (i as i32) < nx {
                        self.retire_chunk(&chunk);
                    } else {
                        kept.push(chunk);
                    }
                }
                for cx in 0..nx {
                    let chunk = self.load_or_generate(self.longitude + cx, self.latitude + ny);
                    kept.push(Box::new(chunk));
                }
                self.chunks = kept;
                for cx in 0..nx {
                    self.light_border_chunk(cx, ny - 1);
                }
                self.latitude += 1;
            }

            SlideDirection::South => {
                let old = std::mem::take(&mut self.chunks);
                let mut kept = Vec::with_capacity(old.len());
                for (i, chunk) in old.into_iter().enumerate() {
                    if (i as i32) >= nx * (ny - 1) {
                        self.retire_chunk(&chunk);
                    } else {
                        kept.push(chunk);
                    }
                }
                let mut fresh = Vec::with_capacity(nx as usize);
                for cx in 0..nx {
                    let chunk = self.load_or_generate(self.longitude + cx, self.latitude - 1);
                    fresh.push(Box::new(chunk));
                }
                fresh.append(&mut kept);
                self.chunks = fresh;
                for cx in 0..nx {
                    self.light_border_chunk(cx, 0);
                }
                self.latitude -= 1;
            }

            SlideDirection::East => {
                let old = std::mem::take(&mut self.chunks);
                let mut kept = Vec::with_capacity(old.len());
                for (i, chunk) in old.into_iter().enumerate() {
                    if (i as i32) % nx == 0 {
                        self.retire_chunk(&chunk);
                    } else {
                        kept.push(chunk);
                    }
                    if (i as i32) % nx == nx - 1 {
                        let cy = (i as i32) / nx;
                        let chunk =
                            self.load_or_generate(self.longitude + nx, self.latitude + cy);
                        kept.push(Box::new(chunk));
                    }
                }
                self.chunks = kept;
                for cy in 0..ny {
                    self.light_border_chunk(nx - 1, cy);
                }
                self.longitude += 1;
            }

            SlideDirection::West => {
                let old = std::mem::take(&mut self.chunks);
                let mut kept = Vec::with_capacity(old.len());
                for (i, chunk) in old.into_iter().enumerate() {
                    if (i as i32) % nx == 0 {
                        let cy = (i as i32) / nx;
                        let fresh =
                            self.load_or_generate(self.longitude - 1, self.latitude + cy);
                        kept.push(Box::new(fresh));
                    }
                    if (i as i32) % nx == nx - 1 {
                        self.retire_chunk(&chunk);
                    } else {
                        kept.push(chunk);
                    }
                }
                self.chunks = kept;
                for cy in 0..ny {
                    self.light_border_chunk(0, cy);
                }
                self.longitude -= 1;
            }
        }

        self.renderer
            .update_world_position(self.longitude, self.latitude);

        // Near-border chunks carry geometry that referenced the dropped
        // edge; rebuild them before the next frame.
        match direction {
            SlideDirection::North => {
                for cx in 0..nx {
                    self.renderer.update_chunk(cx, ny - 2, true);
                    self.renderer.update_chunk_water(cx, ny - 2, true);
                }
            }
            SlideDirection::South => {
                for cx in 0..nx {
                    self.renderer.update_chunk(cx, 1, true);
                    self.renderer.update_chunk_water(cx, 1, true);
                }
            }
            SlideDirection::East => {
                for cy in 0..ny {
                    self.renderer.update_chunk(nx - 2, cy, true);
                    self.renderer.update_chunk_water(nx - 2, cy, true);
                }
            }
            SlideDirection::West => {
                for cy in 0..ny {
                    self.renderer.update_chunk(1, cy, true);
                    self.renderer.update_chunk_water(1, cy, true);
                }
            }
        }
    }

    /// Saves a chunk leaving the window and releases its region
    /// reference.
    fn retire_chunk(&mut self, chunk: &Chunk) {
        self.save_chunk(chunk);
        self.loader.free(chunk.longitude(), chunk.latitude());
    }

    /// Serializes, compresses and stores one chunk.
    fn save_chunk(&mut self, chunk: &Chunk) {
        let stream = serialize_chunk(chunk);
        let blob = compress_prepend_size(&stream);
        self.loader.store(chunk.longitude(), chunk.latitude(), blob);
    }

    /// Loads a chunk from the region store, regenerating it from the
    /// oracle when absent or corrupt.
    fn load_or_generate(&mut self, longitude: i32, latitude: i32) -> Chunk {
        let decompressed = {
            let blob = self.loader.chunk_data(longitude, latitude);
            if blob.is_empty() {
                None
            } else {
                match decompress_size_prepended(blob) {
                    Ok(d) => Some(d),
                    Err(e) => {
                        log::warn!("chunk ({longitude},{latitude}): corrupt blob ({e}); regenerating");
                        None
                    }
                }
            }
        };

        if let Some(bytes) = decompressed {
            match deserialize_chunk(&bytes) {
                Ok(chunk) => return chunk,
                Err(e) => {
                    log::warn!("chunk ({longitude},{latitude}): corrupt stream ({e}); regenerating");
                }
            }
        }
        Chunk::generate(longitude, latitude, self.oracle.as_ref(), self.config.seed)
    }

    /// Saves every loaded chunk, the world header, and flushes the region
    /// store.
    ///
    /// # Errors
    ///
    /// Surfaces the first I/O error; the in-memory world is unaffected.
    pub fn save(&mut self) -> Result<(), crate::persistence::PersistenceError> {
        for chunk in &self.chunks {
            let stream = serialize_chunk(chunk);
            let blob = compress_prepend_size(&stream);
            self.loader.store(chunk.longitude(), chunk.latitude(), blob);
        }

        let (pos, rot) = self.shared.observer();
        let header = WorldHeader {
            observer_position: pos,
            observer_rotation: rot,
            ticks: self.phys_tick_count,
            rain: self.rain.snapshot(),
        };
        header.save(&self.world_dir)?;

        self.loader.force_save_all()
    }

    // ----- scout channel --------------------------------------------------

    /// Moves the scout one think-step toward its target. The original
    /// path search is intentionally absent; this is a coordinate channel
    /// only.
    fn scout_tick(&mut self) {
        if self
            .phys_tick_count
            .wrapping_sub(self.scout.last_think_tick)
            < TICKS_PER_SECOND / 3
        {
            return;
        }
        self.scout.last_think_tick = self.phys_tick_count;

        let target = self.shared.scout_target();
        for (p, t) in self.scout.position.iter_mut().zip(target) {
            *p += (t - *p).signum();
        }
        self.shared.publish_scout_position(self.scout.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FlatOracle;
    use crate::renderer::NullRenderer;
    use crate::settings::{MemorySettings, SettingsStore};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("hexplanet_world_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_world(tag: &str, height: u32) -> (World, PathBuf) {
        let dir = temp_dir(tag);
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
    fn test_world_start_tick_is_morning() {
        // Spring equinox, a little after sunrise: a quarter day plus a
        // sixteenth.
        assert_eq!(
            WORLD_START_TICK,
            DAY_DURATION_TICKS / 4 + DAY_DURATION_TICKS / 16
        );
    }

    #[test]
    fn test_build_and_destroy_roundtrip() {
        let (mut world, dir) = small_world("build", 41);
        let (x, y, z) = (40, 40, 41);
        assert_eq!(world.cell_kind(x, y, z), BlockKind::Air);

        world.build(x, y, z, BlockKind::Brick, Direction::Forward, Direction::Up);
        assert_eq!(world.cell_kind(x, y, z), BlockKind::Brick);
        let (cx, cy) = (x >> 4, y >> 4);
        assert_eq!(world.chunk(cx, cy).nonstandard_list.len(), 1);

        world.destroy(x, y, z);
        assert_eq!(world.cell_kind(x, y, z), BlockKind::Air);
        assert_eq!(world.chunk(cx, cy).nonstandard_list.len(), 0);
        assert!(world.chunk(cx, cy).check_invariants());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_build_rejected_on_occupied_cell() {
        let (mut world, dir) = small_world("occupied", 41);
        // z = 40 is the grass surface.
        world.build(40, 40, 40, BlockKind::Stone, Direction::Unknown, Direction::Unknown);
        assert_eq!(world.cell_kind(40, 40, 40), BlockKind::Grass);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_out_of_borders_actions_dropped() {
        let (mut world, dir) = small_world("borders", 41);
        world.build(-1, 0, 50, BlockKind::Stone, Direction::Unknown, Direction::Unknown);
        world.build(0, 0, 500, BlockKind::Stone, Direction::Unknown, Direction::Unknown);
        world.destroy(10_000, 0, 50);
        // Nothing to assert beyond "no panic"; the calls must be silent.
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_blast_clears_disc() {
        let (mut world, dir) = small_world("blast", 41);
        world.blast(40, 40, 40, 3);
        assert_eq!(world.cell_kind(40, 40, 40), BlockKind::Air);
        for (nx, ny) in hex_neighbors(40, 40) {
            assert_eq!(world.cell_kind(nx, ny, 40), BlockKind::Air);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_destroy_grass_cleans_active_list() {
        let (mut world, dir) = small_world("grass_destroy", 41);
        let (cx, cy) = (2, 2);
        let before = world.chunk(cx, cy).grass_list.len();
        assert!(before > 0);
        world.destroy(cx * 16 + 3, cy * 16 + 3, 40);
        assert_eq!(world.chunk(cx, cy).grass_list.len(), before - 1);
        assert!(world.chunk(cx, cy).check_invariants());
        std::fs::remove_dir_all(&dir).ok();
    }
}
