//! Physics-mesh emission.
//!
//! Walks a box of cells and emits a face wherever two neighboring cells
//! disagree on visibility: hexagon lids between vertical neighbors, side
//! rectangles toward the forward, forward-right and back-right neighbors
//! (each horizontal pair is visited exactly once that way). A second pass
//! collects water cells and the extra mini-faces of plate and bisected
//! forms.

use hexplanet_core::math::hex::{back_side_y, forward_side_y, hex_center, Direction, HEX_EDGE};

use crate::block::{visibility_bits, BlockKind, Form};
use crate::chunk::{CHUNK_HEIGHT, CHUNK_WIDTH, CHUNK_WIDTH_LOG2, MAX_WATER_LEVEL};
use crate::phys_mesh::{PhysMesh, SideFace, UpperFace, WaterCell, BISECTED_ROT, DIR_TO_ROT, SIDE_CIRCLE};

use super::World;

impl World {
    /// Builds the collision mesh for a box of window cells
    /// (`x/y/z` bounds are inclusive-exclusive like the scan loops).
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::too_many_lines, clippy::cast_sign_loss)]
    pub(crate) fn build_phys_mesh(
        &self,
        x_min: i32,
        x_max: i32,
        y_min: i32,
        y_max: i32,
        z_min: i32,
        z_max: i32,
    ) -> PhysMesh {
        let origin_x = self.longitude() << CHUNK_WIDTH_LOG2;
        let origin_y = self.latitude() << CHUNK_WIDTH_LOG2;

        // Stay one cell inside the window so every neighbor read is
        // loaded.
        let x_min = x_min.max(2);
        let y_min = y_min.max(2);
        let z_min = z_min.max(0);
        let x_max = x_max.min(self.chunk_number_x() * CHUNK_WIDTH as i32 - 2);
        let y_max = y_max.min(self.chunk_number_y() * CHUNK_WIDTH as i32 - 2);
        let z_max = z_max.min(CHUNK_HEIGHT as i32 - 1);

        let mut mesh = PhysMesh::default();

        let vis = |w: &Self, x: i32, y: i32, z: i32| {
            let (cx, lx) = Self::split(x);
            let (cy, ly) = Self::split(y);
            visibility_bits(w.chunk(cx, cy).transparency_at(lx, ly, z as u32))
        };

        for x in x_min..x_max {
            for y in y_min..y_max {
                let gx = x + origin_x;
                let gy = y + origin_y;
                let y_forward_right = forward_side_y(x, y);
                let y_back_right = back_side_y(x, y);

                for z in z_min..z_max {
                    let t = vis(self, x, y, z);
                    let t_up = vis(self, x, y, z + 1);
                    let t_forward = vis(self, x, y + 1, z);
                    let t_forward_right = vis(self, x + 1, y_forward_right, z);
                    let t_back_right = vis(self, x + 1, y_back_right, z);

                    // Lid between cell z and cell z+1, at the top of cell
                    // z (cells span heights [z-1, z]).
                    if t != t_up {
                        let dir = if t > t_up { Direction::Down } else { Direction::Up };
                        mesh.upper_faces.push(UpperFace::hexagon(gx, gy, z as f32, dir));
                    }

                    if t != t_forward_right {
                        let side = if t > t_forward_right {
                            SideFace::of_cell(
                                gx + 1,
                                forward_side_y(gx, gy),
                                Direction::BackLeft,
                                (z - 1) as f32,
                                z as f32,
                            )
                        } else {
                            SideFace::of_cell(
                                gx,
                                gy,
                                Direction::ForwardRight,
                                (z - 1) as f32,
                                z as f32,
                            )
                        };
                        mesh.sides.push(side);
                    }

                    if t != t_back_right {
                        let side = if t > t_back_right {
                            SideFace::of_cell(
                                gx + 1,
                                back_side_y(gx, gy),
                                Direction::ForwardLeft,
                                (z - 1) as f32,
                                z as f32,
                            )
                        } else {
                            SideFace::of_cell(gx, gy, Direction::BackRight, (z - 1) as f32, z as f32)
                        };
                        mesh.sides.push(side);
                    }

                    if t != t_forward {
                        let side = if t > t_forward {
                            SideFace::of_cell(gx, gy + 1, Direction::Back, (z - 1) as f32, z as f32)
                        } else {
                            SideFace::of_cell(gx, gy, Direction::Forward, (z - 1) as f32, z as f32)
                        };
                        mesh.sides.push(side);
                    }
                }
            }
        }

        // Second pass: water cells and non-standard forms.
        for x in x_min..x_max {
            for y in y_min..y_max {
                let gx = x + origin_x;
                let gy = y + origin_y;
                let (cx, lx) = Self::split(x);
                let (cy, ly) = Self::split(y);
                let chunk = self.chunk(cx, cy);

                for z in z_min..z_max {
                    let handle = chunk.block(lx, ly, z as u32);
                    match handle.kind() {
                        BlockKind::Water => {
                            let level = handle
                                .slot()
                                .and_then(|s| chunk.water_pool.get(s))
                                .map_or(0, |b| b.level);
                            mesh.water_cells.push(WaterCell {
                                x: gx,
                                y: gy,
                                z,
                                level: f32::from(level) / f32::from(MAX_WATER_LEVEL),
                            });
                        }

                        kind if kind.form() == Form::Plate => {
                            let direction = handle
                                .slot()
                                .and_then(|s| chunk.nonstandard_pool.get(s))
                                .map_or(Direction::Up, |b| b.direction);
                            let (mut z0, mut z1) = ((z - 1) as f32, z as f32 - 0.5);
                            if direction == Direction::Down {
                                z0 += 0.5;
                                z1 += 0.5;
                            }
                            mesh.upper_faces
                                .push(UpperFace::hexagon(gx, gy, z0, Direction::Down));
                            mesh.upper_faces
                                .push(UpperFace::hexagon(gx, gy, z1, Direction::Up));
                            for dir in Direction::HORIZONTAL {
                                mesh.sides.push(SideFace::of_cell(gx, gy, dir, z0, z1));
                            }
                        }

                        kind if kind.form() == Form::Bisected => {
                            let direction = handle
                                .slot()
                                .and_then(|s| chunk.nonstandard_pool.get(s))
                                .map_or(Direction::Forward, |b| b.direction);
                            let rot = DIR_TO_ROT[(direction as usize).min(5)];

                            let help = hexplanet_core::hex_lid_vertices(gx, gy);
                            let mut vertices = [glam::Vec2::ZERO; 6];
                            for i in 0..4 {
                                vertices[i] = help[BISECTED_ROT[i + rot]];
                            }

                            for (height, dir) in
                                [((z - 1) as f32, Direction::Down), (z as f32, Direction::Up)]
                            {
                                mesh.upper_faces.push(UpperFace {
                                    x: gx,
                                    y: gy,
                                    z: height,
                                    dir,
                                    vertices,
                                    vertex_count: 4,
                                    center: hex_center(gx, gy),
                                    radius: HEX_EDGE,
                                });
                            }

                            for i in 0..4usize {
                                let s = if i == 3 { 4 } else { i };
                                mesh.sides.push(SideFace {
                                    dir: SIDE_CIRCLE[(rot + s) % 6],
                                    edge: [vertices[i], vertices[(i + 1) & 3]],
                                    z0: (z - 1) as f32,
                                    z1: z as f32,
                                });
                            }
                        }

                        _ => {}
                    }
                }
            }
        }

        mesh
    }
}
