//! Whole-world persist/restore: closing a world and reopening the same
//! directory must restore the same blocks, the tick counter, and the
//! weather.

use hexplanet_core::math::hex::Direction;
use hexplanet_world::chunk::CHUNK_VOLUME;
use hexplanet_world::persistence::serialize_chunk;
use hexplanet_world::settings::keys;
use hexplanet_world::{
    BlockKind, HillsOracle, MemorySettings, NullRenderer, SettingsStore, World,
};

/// Serialized chunk stream without the light maps; incremental lighting
/// may differ harmlessly from a from-scratch recompute, blocks may not.
fn block_state(world: &World, cx: i32, cy: i32) -> Vec<u8> {
    let bytes = serialize_chunk(world.chunk(cx, cy));
    bytes[..bytes.len() - 2 * CHUNK_VOLUME].to_vec()
}

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir =
        std::env::temp_dir().join(format!("hexplanet_it_persist_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn settings() -> MemorySettings {
    let mut s = MemorySettings::new();
    s.set_int(keys::CHUNK_NUMBER_X, 8);
    s.set_int(keys::CHUNK_NUMBER_Y, 8);
    s
}

#[test]
fn test_world_reopens_identically() {
    let dir = temp_dir("reopen");
    let oracle = HillsOracle::new(24, 64, 10.0);

    let (saved_states, saved_tick) = {
        let mut settings = settings();
        let mut world = World::new(
            &mut settings,
            &dir,
            Box::new(oracle),
            Box::new(NullRenderer),
        )
        .unwrap();
        let shared = world.shared();

        // Leave a mark: a brick plate and a fire-stone.
        let origin_x = world.longitude() * 16;
        let origin_y = world.latitude() * 16;
        shared.add_build_event(
            origin_x + 40,
            origin_y + 41,
            90,
            BlockKind::Brick,
            Direction::Forward,
            Direction::Up,
        );
        shared.add_build_event(
            origin_x + 42,
            origin_y + 40,
            90,
            BlockKind::FireStone,
            Direction::Unknown,
            Direction::Unknown,
        );
        for _ in 0..10 {
            world.phys_tick();
        }
        world.save().unwrap();

        let mut states = Vec::new();
        for cy in 0..world.chunk_number_y() {
            for cx in 0..world.chunk_number_x() {
                states.push(block_state(&world, cx, cy));
            }
        }
        (states, shared.tick_count())
    };

    let mut settings = settings();
    let world = World::new(
        &mut settings,
        &dir,
        Box::new(oracle),
        Box::new(NullRenderer),
    )
    .unwrap();
    let shared = world.shared();

    assert_eq!(shared.tick_count(), saved_tick);

    let mut i = 0;
    for cy in 0..world.chunk_number_y() {
        for cx in 0..world.chunk_number_x() {
            assert_eq!(
                block_state(&world, cx, cy),
                saved_states[i],
                "chunk ({cx},{cy}) differs after reopen"
            );
            i += 1;
        }
    }

    // The marks survived.
    assert_eq!(world.chunk(2, 2).nonstandard_blocks().count(), 1);
    assert_eq!(world.chunk(2, 2).light_sources().count(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_rain_state_survives_reopen() {
    let dir = temp_dir("rain");
    let oracle = HillsOracle::new(3, 64, 6.0);

    let snapshot_before = {
        let mut settings = settings();
        let mut world = World::new(
            &mut settings,
            &dir,
            Box::new(oracle),
            Box::new(NullRenderer),
        )
        .unwrap();
        for _ in 0..200 {
            world.phys_tick();
        }
        world.save().unwrap();
        world.rain().snapshot()
    };

    let mut settings = settings();
    let world = World::new(
        &mut settings,
        &dir,
        Box::new(oracle),
        Box::new(NullRenderer),
    )
    .unwrap();
    assert_eq!(world.rain().snapshot(), snapshot_before);

    std::fs::remove_dir_all(&dir).ok();
}
