//! # Tick Scheduler & Shared State
//!
//! [`WorldShared`] is the only object other threads see: the action
//! queue, the latest physics-mesh snapshot, the tick counter, the rain
//! intensity, the observer state and the scout channel. [`Scheduler`]
//! owns the simulation thread; stop lets the current tick finish, pause
//! is cooperative at tick boundaries.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;
use hexplanet_core::math::hex::{hex_center, world_to_hex, Direction};
use parking_lot::Mutex;

use crate::actions::ActionQueue;
use crate::block::BlockKind;
use crate::chunk::{CHUNK_WIDTH, CHUNK_WIDTH_LOG2};
use crate::phys_mesh::PhysMesh;

use super::{SlideDirection, World, TICK_INTERVAL_MS};

/// Sleep interval while paused.
const PAUSE_SLEEP_MS: u64 = TICK_INTERVAL_MS * 4;

/// Half box dimensions of the collision mesh around the observer.
const MESH_RADIUS: (i32, i32, i32) = (5, 6, 5);

/// Cross-thread face of the simulation. All methods are thread safe.
pub struct WorldShared {
    actions: ActionQueue,
    phys_mesh: Mutex<Option<Arc<PhysMesh>>>,
    tick_count: Mutex<u32>,
    year_ticks: u32,
    need_stop: AtomicBool,
    paused: AtomicBool,
    rain_intensity_bits: AtomicU32,
    observer: Mutex<(Vec3, Vec3)>,
    scout_target: Mutex<[i32; 3]>,
    scout_position: Mutex<Vec3>,
}

impl WorldShared {
    pub(crate) fn new(
        year_ticks: u32,
        tick: u32,
        observer_position: Vec3,
        observer_rotation: Vec3,
    ) -> Self {
        Self {
            actions: ActionQueue::new(),
            phys_mesh: Mutex::new(None),
            tick_count: Mutex::new(tick),
            year_ticks,
            need_stop: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            rain_intensity_bits: AtomicU32::new(0),
            observer: Mutex::new((observer_position, observer_rotation)),
            scout_target: Mutex::new([0, 0, 72]),
            scout_position: Mutex::new(Vec3::new(0.0, 0.0, 72.0)),
        }
    }

    /// Queues a build action at global cell coordinates.
    pub fn add_build_event(
        &self,
        x: i32,
        y: i32,
        z: i32,
        block_kind: BlockKind,
        horizontal_direction: Direction,
        vertical_direction: Direction,
    ) {
        self.actions
            .push_build(x, y, z, block_kind, horizontal_direction, vertical_direction);
    }

    /// Queues a destroy action at global cell coordinates.
    pub fn add_destroy_event(&self, x: i32, y: i32, z: i32) {
        self.actions.push_destroy(x, y, z);
    }

    pub(crate) fn actions(&self) -> &ActionQueue {
        &self.actions
    }

    /// Latest physics-mesh snapshot, if one was published yet.
    #[must_use]
    pub fn phys_mesh(&self) -> Option<Arc<PhysMesh>> {
        self.phys_mesh.lock().clone()
    }

    pub(crate) fn publish_phys_mesh(&self, mesh: Arc<PhysMesh>) {
        *self.phys_mesh.lock() = Some(mesh);
    }

    /// Current simulation tick.
    #[must_use]
    pub fn tick_count(&self) -> u32 {
        *self.tick_count.lock()
    }

    pub(crate) fn store_tick_count(&self, tick: u32) {
        *self.tick_count.lock() = tick;
    }

    /// Tick within the current year.
    #[must_use]
    pub fn time_of_year(&self) -> u32 {
        self.tick_count() % self.year_ticks
    }

    /// Published rain intensity in `[0, 1]`.
    #[must_use]
    pub fn rain_intensity(&self) -> f32 {
        f32::from_bits(self.rain_intensity_bits.load(Ordering::Relaxed))
    }

    pub(crate) fn store_rain_intensity(&self, intensity: f32) {
        self.rain_intensity_bits
            .store(intensity.to_bits(), Ordering::Relaxed);
    }

    /// Updates the observer position and view rotation.
    pub fn set_observer(&self, position: Vec3, rotation: Vec3) {
        *self.observer.lock() = (position, rotation);
    }

    /// Observer position and view rotation.
    #[must_use]
    pub fn observer(&self) -> (Vec3, Vec3) {
        *self.observer.lock()
    }

    /// Sets the scout's target cell (global coordinates).
    pub fn set_scout_target(&self, x: i32, y: i32, z: i32) {
        *self.scout_target.lock() = [x, y, z];
    }

    pub(crate) fn scout_target(&self) -> [i32; 3] {
        *self.scout_target.lock()
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn publish_scout_position(&self, cell: [i32; 3]) {
        let c = hex_center(cell[0], cell[1]);
        *self.scout_position.lock() = Vec3::new(c.x, c.y, cell[2] as f32);
    }

    /// Scout position in continuous space.
    #[must_use]
    pub fn scout_position(&self) -> Vec3 {
        *self.scout_position.lock()
    }

    pub(crate) fn need_stop(&self) -> bool {
        self.need_stop.load(Ordering::Acquire)
    }

    pub(crate) fn set_need_stop(&self, v: bool) {
        self.need_stop.store(v, Ordering::Release);
    }

    pub(crate) fn paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub(crate) fn set_paused(&self, v: bool) {
        self.paused.store(v, Ordering::Release);
    }
}

impl World {
    /// One full simulation tick, in the fixed order: actions, failing
    /// blocks, water, grass, fire, rain, water-chunk relight, collision
    /// mesh, window slide.
    pub fn phys_tick(&mut self) {
        self.scout_tick();
        self.flush_action_queue();
        self.process_failing_blocks();
        self.water_phys_tick();
        self.grass_phys_tick();
        self.fire_phys_tick();
        self.rain_tick();
        self.relight_water_modified_chunks();
        self.rebuild_phys_mesh_around_observer();
        self.check_window_slide();

        self.phys_tick_count = self.phys_tick_count.wrapping_add(1);
        self.shared.store_tick_count(self.phys_tick_count);
        self.renderer.update();
    }

    /// Rebuilds the collision mesh in a box around the observer and
    /// publishes it.
    #[allow(clippy::cast_possible_truncation)]
    fn rebuild_phys_mesh_around_observer(&mut self) {
        let (position, _) = self.shared.observer();
        let (gx, gy) = world_to_hex(position.truncate());
        let x = gx - (self.longitude() << CHUNK_WIDTH_LOG2);
        let y = gy - (self.latitude() << CHUNK_WIDTH_LOG2);
        let z = position.z.round() as i32;

        let mesh = self.build_phys_mesh(
            x - MESH_RADIUS.0,
            x + MESH_RADIUS.0,
            y - MESH_RADIUS.1,
            y + MESH_RADIUS.1,
            z - MESH_RADIUS.2,
            z + MESH_RADIUS.2,
        );
        self.shared.publish_phys_mesh(Arc::new(mesh));
    }

    /// Slides the window when the observer strays within two chunks of
    /// its edge. At most one slide per axis per tick.
    fn check_window_slide(&mut self) {
        let (position, _) = self.shared.observer();
        let (gx, gy) = world_to_hex(position.truncate());
        let x = gx - (self.longitude() << CHUNK_WIDTH_LOG2);
        let y = gy - (self.latitude() << CHUNK_WIDTH_LOG2);

        let chunk_x = (x + (CHUNK_WIDTH as i32 >> 1)) >> CHUNK_WIDTH_LOG2;
        let chunk_y = (y + (CHUNK_WIDTH as i32 >> 1)) >> CHUNK_WIDTH_LOG2;

        if chunk_y > self.chunk_number_y() / 2 + 2 {
            self.slide(SlideDirection::North);
        } else if chunk_y < self.chunk_number_y() / 2 - 2 {
            self.slide(SlideDirection::South);
        }
        if chunk_x > self.chunk_number_x() / 2 + 2 {
            self.slide(SlideDirection::East);
        } else if chunk_x < self.chunk_number_x() / 2 - 2 {
            self.slide(SlideDirection::West);
        }
    }
}

/// Owner of the simulation thread.
pub struct Scheduler {
    thread: Option<std::thread::JoinHandle<World>>,
    shared: Arc<WorldShared>,
}

impl Scheduler {
    /// Spawns the simulation thread and starts ticking.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the thread cannot be spawned.
    pub fn start(world: World) -> std::io::Result<Self> {
        let shared = world.shared();
        shared.set_need_stop(false);
        shared.set_paused(false);

        let thread = std::thread::Builder::new()
            .name("world-sim".into())
            .spawn(move || run_loop(world))?;

        log::info!("world updates started");
        Ok(Self {
            thread: Some(thread),
            shared,
        })
    }

    /// The shared cross-thread handle.
    #[must_use]
    pub fn shared(&self) -> Arc<WorldShared> {
        Arc::clone(&self.shared)
    }

    /// Pauses ticking at the next tick boundary.
    pub fn pause(&self) {
        self.shared.set_paused(true);
    }

    /// Resumes ticking.
    pub fn unpause(&self) {
        self.shared.set_paused(false);
    }

    /// Stops the simulation thread, letting the current tick finish, and
    /// returns the world for saving.
    #[must_use]
    pub fn stop(mut self) -> World {
        self.shared.set_need_stop(true);
        self.shared.set_paused(false);
        let thread = self.thread.take().expect("scheduler already stopped");
        let world = match thread.join() {
            Ok(world) => world,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        log::info!("world updates stopped");
        world
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.shared.set_need_stop(true);
            self.shared.set_paused(false);
            let _ = thread.join();
        }
    }
}

fn run_loop(mut world: World) -> World {
    let shared = world.shared();
    let interval = Duration::from_millis(TICK_INTERVAL_MS);

    while !shared.need_stop() {
        while shared.paused() && !shared.need_stop() {
            std::thread::sleep(Duration::from_millis(PAUSE_SLEEP_MS));
        }

        let started = Instant::now();
        world.phys_tick();
        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FlatOracle;
    use crate::renderer::NullRenderer;
    use crate::settings::{MemorySettings, SettingsStore};

    fn make_world(tag: &str) -> (World, std::path::PathBuf) {
        let dir =
            std::env::temp_dir().join(format!("hexplanet_tick_{tag}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut settings = MemorySettings::new();
        settings.set_int(crate::settings::keys::CHUNK_NUMBER_X, 8);
        settings.set_int(crate::settings::keys::CHUNK_NUMBER_Y, 8);
        let world = World::new(
            &mut settings,
            &dir,
            Box::new(FlatOracle { height: 70 }),
            Box::new(NullRenderer),
        )
        .unwrap();
        (world, dir)
    }

    #[test]
    fn test_tick_advances_counter_and_publishes_mesh() {
        let (mut world, dir) = make_world("counter");
        let shared = world.shared();
        let before = shared.tick_count();
        world.phys_tick();
        assert_eq!(shared.tick_count(), before + 1);
        assert!(shared.phys_mesh().is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_scheduler_start_stop() {
        let (world, dir) = make_world("sched");
        let shared = world.shared();
        let scheduler = Scheduler::start(world).unwrap();

        let before = shared.tick_count();
        std::thread::sleep(Duration::from_millis(TICK_INTERVAL_MS * 5));
        let world = scheduler.stop();
        assert!(shared.tick_count() > before, "no tick ran");
        drop(world);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_pause_halts_ticking() {
        let (world, dir) = make_world("pause");
        let shared = world.shared();
        let scheduler = Scheduler::start(world).unwrap();
        scheduler.pause();
        // Let any in-flight tick drain.
        std::thread::sleep(Duration::from_millis(PAUSE_SLEEP_MS * 2));

        let frozen = shared.tick_count();
        std::thread::sleep(Duration::from_millis(PAUSE_SLEEP_MS * 2));
        assert!(shared.tick_count() <= frozen + 1, "ticks ran while paused");

        scheduler.unpause();
        std::thread::sleep(Duration::from_millis(TICK_INTERVAL_MS * 5));
        assert!(shared.tick_count() > frozen);
        let _ = scheduler.stop();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_build_event_applied_on_tick() {
        let (mut world, dir) = make_world("actions");
        let shared = world.shared();
        // Global coordinates: the window starts at the origin-centered
        // observer, so rebase from the world's origin.
        let gx = (world.longitude() << CHUNK_WIDTH_LOG2) + 40;
        let gy = (world.latitude() << CHUNK_WIDTH_LOG2) + 40;
        shared.add_build_event(gx, gy, 71, BlockKind::Stone, Direction::Unknown, Direction::Unknown);
        world.phys_tick();
        assert_eq!(world.cell_kind(40, 40, 71), BlockKind::Stone);

        shared.add_destroy_event(gx, gy, 71);
        world.phys_tick();
        assert_eq!(world.cell_kind(40, 40, 71), BlockKind::Air);
        std::fs::remove_dir_all(&dir).ok();
    }
}
