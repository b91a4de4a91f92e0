//! Sand-collapse scenario: sand built over air starts failing, descends
//! one cell per tick, and settles back into plain sand on the ground.

use hexplanet_core::math::hex::Direction;
use hexplanet_world::settings::keys;
use hexplanet_world::{BlockKind, FlatOracle, MemorySettings, NullRenderer, SettingsStore, World};

fn temp_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("hexplanet_it_sand_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_sand_over_air_fails_and_settles() {
    let dir = temp_dir("settle");
    let mut settings = MemorySettings::new();
    settings.set_int(keys::CHUNK_NUMBER_X, 8);
    settings.set_int(keys::CHUNK_NUMBER_Y, 8);

    // Surface cells at z = 69.
    let mut world = World::new(
        &mut settings,
        &dir,
        Box::new(FlatOracle { height: 70 }),
        Box::new(NullRenderer),
    )
    .unwrap();
    let shared = world.shared();
    let origin_x = world.longitude() * 16;
    let origin_y = world.latitude() * 16;

    // Sand in mid-air at z = 75.
    shared.add_build_event(
        origin_x + 40,
        origin_y + 40,
        75,
        BlockKind::Sand,
        Direction::Unknown,
        Direction::Unknown,
    );
    world.phys_tick();

    // The build noticed the missing support within its own tick: the
    // block is on the failing list, the build cell already vacated, and
    // the fall has begun (one cell per tick).
    let (cx, cy) = (2, 2);
    let (lx, ly) = (8, 8);
    {
        let chunk = world.chunk(cx, cy);
        let failing: Vec<_> = chunk.failing_blocks().collect();
        assert_eq!(failing.len(), 1);
        assert_eq!((failing[0].x, failing[0].y, failing[0].z), (lx as u8, ly as u8, 74));
        assert!(failing[0].velocity > 0.0);
        assert_eq!(chunk.block_kind(lx, ly, 75), BlockKind::Air);
        assert_eq!(chunk.block_kind(lx, ly, 74), BlockKind::Sand);
        assert!(chunk.block(lx, ly, 74).slot().is_some(), "must be the failing variant");
    }

    // Next tick: one cell further down.
    world.phys_tick();
    {
        let chunk = world.chunk(cx, cy);
        assert_eq!(chunk.block_kind(lx, ly, 74), BlockKind::Air);
        assert_eq!(chunk.block_kind(lx, ly, 73), BlockKind::Sand);
        assert_eq!(chunk.failing_blocks().count(), 1);
    }

    // Let it hit the ground: z 73 -> 70, then settle.
    for _ in 0..8 {
        world.phys_tick();
    }
    {
        let chunk = world.chunk(cx, cy);
        assert_eq!(chunk.failing_blocks().count(), 0, "must have settled");
        assert_eq!(chunk.block_kind(lx, ly, 70), BlockKind::Sand);
        assert!(
            chunk.block(lx, ly, 70).slot().is_none(),
            "settled sand is the plain flyweight"
        );
        for z in 71..=75 {
            assert_eq!(chunk.block_kind(lx, ly, z), BlockKind::Air, "z={z}");
        }
        assert!(chunk.check_invariants());
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_supported_sand_stays_put() {
    let dir = temp_dir("supported");
    let mut settings = MemorySettings::new();
    settings.set_int(keys::CHUNK_NUMBER_X, 8);
    settings.set_int(keys::CHUNK_NUMBER_Y, 8);

    let mut world = World::new(
        &mut settings,
        &dir,
        Box::new(FlatOracle { height: 70 }),
        Box::new(NullRenderer),
    )
    .unwrap();
    let shared = world.shared();
    let origin_x = world.longitude() * 16;
    let origin_y = world.latitude() * 16;

    // Directly on the surface: supported, stays a plain block.
    shared.add_build_event(
        origin_x + 40,
        origin_y + 40,
        70,
        BlockKind::Sand,
        Direction::Unknown,
        Direction::Unknown,
    );
    for _ in 0..4 {
        world.phys_tick();
    }

    let chunk = world.chunk(2, 2);
    assert_eq!(chunk.block_kind(8, 8, 70), BlockKind::Sand);
    assert_eq!(chunk.failing_blocks().count(), 0);

    std::fs::remove_dir_all(&dir).ok();
}
