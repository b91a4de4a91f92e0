//! Failing-block settle pass.
//!
//! Runs at the top of every tick, before water: a settling block must win
//! its cell before liquid gets a chance to flow into it. A failing block
//! descends exactly one cell per tick while the cell below is passable
//! (air, water or fire — sand sinks and smothers), integrating velocity
//! for the render offset, and settles back into its wrapped kind when
//! blocked.

use crate::block::{BlockKind, CellHandle};
use crate::chunk::CHUNK_WIDTH_LOG2;

use super::{World, MAX_FIRE_LIGHT, TICKS_PER_SECOND};

const GRAVITY: f32 = 9.8;

impl World {
    /// Advances every failing block in the active area.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub(crate) fn process_failing_blocks(&mut self) {
        let margin_x = self.config.active_margin_x;
        let margin_y = self.config.active_margin_y;

        for cy in margin_y..self.chunk_number_y() - margin_y {
            for cx in margin_x..self.chunk_number_x() - margin_x {
                let base_x = cx << CHUNK_WIDTH_LOG2;
                let base_y = cy << CHUNK_WIDTH_LOG2;

                let mut k = 0usize;
                loop {
                    let (slot, x, y, z, wrapped) = {
                        let chunk = self.chunk(cx, cy);
                        if k >= chunk.failing_list.len() {
                            break;
                        }
                        let slot = chunk.failing_list[k];
                        let Some(b) = chunk.failing_pool.get(slot) else {
                            k += 1;
                            continue;
                        };
                        (
                            slot,
                            u32::from(b.x),
                            u32::from(b.y),
                            u32::from(b.z),
                            b.wrapped,
                        )
                    };
                    k += 1;

                    let world_x = base_x + x as i32;
                    let world_y = base_y + y as i32;

                    let below = if z == 0 {
                        BlockKind::Stone
                    } else {
                        self.chunk(cx, cy).block_kind(x, y, z - 1)
                    };

                    if matches!(below, BlockKind::Air | BlockKind::Water | BlockKind::Fire) {
                        // Keep falling: displace whatever was below.
                        match below {
                            BlockKind::Water => {
                                let handle = self.chunk(cx, cy).block(x, y, z - 1);
                                if let Some(water_slot) = handle.slot() {
                                    self.chunk_mut(cx, cy).delete_water_block(water_slot);
                                }
                            }
                            BlockKind::Fire => {
                                self.remove_fire(world_x, world_y, z as i32 - 1);
                            }
                            BlockKind::Air => {}
                            _ => unreachable!(),
                        }

                        let chunk = self.chunk_mut(cx, cy);
                        chunk.set_block(x, y, z, CellHandle::AIR);
                        chunk.set_block(x, y, z - 1, CellHandle::slotted(wrapped, slot));
                        if let Some(b) = chunk.failing_pool.get_mut(slot) {
                            b.z = (z - 1) as u8;
                            b.velocity += GRAVITY / TICKS_PER_SECOND as f32;
                        }

                        self.relight_block_remove(world_x, world_y, z as i32);
                        self.update_in_radius(world_x, world_y, 1);
                        self.update_water_in_radius(world_x, world_y, 1);
                    } else {
                        // Blocked: settle back into the wrapped kind.
                        let chunk = self.chunk_mut(cx, cy);
                        chunk.set_block(x, y, z, CellHandle::normal(wrapped));
                        chunk.delete_failing_block(slot);
                        k -= 1;

                        self.relight_block_add(world_x, world_y, z as i32);
                        self.update_in_radius(world_x, world_y, i32::from(MAX_FIRE_LIGHT));
                        self.update_water_in_radius(world_x, world_y, i32::from(MAX_FIRE_LIGHT));
                        self.check_block_neighbors(world_x, world_y, z as i32);
                    }
                }
            }
        }
    }
}
