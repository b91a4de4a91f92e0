//! # Player
//!
//! Consumes physics-mesh snapshots: ray-picks the build target along the
//! view direction and resolves capsule collision for movement. The player
//! never touches world state directly; build/destroy intents go through
//! the shared action queue and the observer position feeds back through
//! [`WorldShared::set_observer`].
//!
//! [`WorldShared::set_observer`]: crate::world::WorldShared::set_observer

use std::sync::Arc;

use glam::{Vec2, Vec3};
use hexplanet_core::math::geometry::{push_circle_from_edge, ray_triangle_intersection};
use hexplanet_core::math::hex::{world_to_hex, Direction};

use crate::phys_mesh::PhysMesh;
use crate::world::WorldShared;

/// Collision height of the player capsule.
pub const PLAYER_HEIGHT: f32 = 1.75;
/// Collision radius of the player capsule.
pub const PLAYER_RADIUS: f32 = 0.225;
/// Eye height above the feet.
pub const PLAYER_EYE_LEVEL: f32 = 1.67;
/// Farthest pickable face.
pub const MAX_BUILD_DISTANCE: f32 = 4.0;

const GRAVITY: f32 = 9.8 * 1.5;
const GROUND_ACCELERATION: f32 = 40.0;
const AIR_ACCELERATION: f32 = 2.0;
const MAX_HORIZONTAL_SPEED: f32 = 5.0;
/// Height a jump reaches.
const JUMP_HEIGHT: f32 = 1.4;

/// The observer: position, speed, view angles and the picked build cell.
pub struct Player {
    position: Vec3,
    speed: Vec3,
    /// View angles in radians: `x` pitch, `z` yaw.
    view_angle: Vec3,
    in_air: bool,
    flying: bool,
    mesh: Option<Arc<PhysMesh>>,
    build_target: Option<((i32, i32, i32), Direction)>,
}

impl Player {
    /// Creates a player standing at `position` (feet).
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            speed: Vec3::ZERO,
            view_angle: Vec3::ZERO,
            in_air: true,
            flying: false,
            mesh: None,
            build_target: None,
        }
    }

    /// Feet position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Eye position.
    #[must_use]
    pub fn eyes_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, 0.0, PLAYER_EYE_LEVEL)
    }

    /// Current speed.
    #[inline]
    #[must_use]
    pub const fn speed(&self) -> Vec3 {
        self.speed
    }

    /// View angles (pitch in `x`, yaw in `z`).
    #[inline]
    #[must_use]
    pub const fn view_angle(&self) -> Vec3 {
        self.view_angle
    }

    /// Sets pitch and yaw, clamping pitch to straight up/down.
    pub fn set_view_angle(&mut self, pitch: f32, yaw: f32) {
        self.view_angle.x = pitch.clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
        self.view_angle.z = yaw;
    }

    /// Teleports the player.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.speed = Vec3::ZERO;
        self.in_air = true;
    }

    /// Toggles creative flight.
    pub fn set_flying(&mut self, flying: bool) {
        self.flying = flying;
        if flying {
            self.speed.z = 0.0;
        }
    }

    /// True while unsupported.
    #[inline]
    #[must_use]
    pub const fn in_air(&self) -> bool {
        self.in_air
    }

    /// Installs a fresh collision-mesh snapshot.
    pub fn set_collision_mesh(&mut self, mesh: Arc<PhysMesh>) {
        self.mesh = Some(mesh);
    }

    /// Pulls the latest mesh snapshot and pushes the observer state back.
    pub fn sync(&mut self, shared: &WorldShared) {
        if let Some(mesh) = shared.phys_mesh() {
            self.mesh = Some(mesh);
        }
        shared.set_observer(self.position, self.view_angle);
    }

    /// The picked build cell and the face it was picked through, if any.
    #[inline]
    #[must_use]
    pub const fn build_target(&self) -> Option<((i32, i32, i32), Direction)> {
        self.build_target
    }

    /// Unit view direction from the view angles.
    #[must_use]
    pub fn eye_direction(&self) -> Vec3 {
        let (pitch, yaw) = (self.view_angle.x, self.view_angle.z);
        Vec3::new(
            -yaw.sin() * pitch.cos(),
            yaw.cos() * pitch.cos(),
            pitch.sin(),
        )
    }

    /// Jumps when grounded.
    pub fn jump(&mut self) {
        if !self.in_air && !self.flying {
            self.speed.z += (2.0 * GRAVITY * JUMP_HEIGHT).sqrt();
            self.in_air = true;
        }
    }

    /// One movement tick: accelerate toward `wish_direction` (world-space
    /// xy), apply gravity, integrate and collide against the mesh.
    pub fn tick(&mut self, wish_direction: Vec2, dt: f32) {
        let acceleration = if self.in_air && !self.flying {
            AIR_ACCELERATION
        } else {
            GROUND_ACCELERATION
        };
        let wish = wish_direction.normalize_or_zero();
        self.speed.x += wish.x * acceleration * dt;
        self.speed.y += wish.y * acceleration * dt;

        let horizontal = Vec2::new(self.speed.x, self.speed.y);
        let h_len = horizontal.length();
        if h_len > MAX_HORIZONTAL_SPEED {
            let capped = horizontal * (MAX_HORIZONTAL_SPEED / h_len);
            self.speed.x = capped.x;
            self.speed.y = capped.y;
        }

        if !self.flying {
            self.speed.z -= GRAVITY * dt;
        }

        let delta = self.speed * dt;
        self.position = self.collide(delta);
    }

    /// Resolves `delta` against the mesh snapshot; returns the new feet
    /// position.
    fn collide(&mut self, delta: Vec3) -> Vec3 {
        let mut new_pos = self.position + delta;
        let Some(mesh) = self.mesh.clone() else {
            return new_pos;
        };

        for face in &mesh.upper_faces {
            if delta.z > 1e-5 && face.dir == Direction::Down {
                // Ceiling: clamp the head under it.
                let head_old = self.position.z + PLAYER_HEIGHT;
                let head_new = new_pos.z + PLAYER_HEIGHT;
                if face.z > head_old
                    && face.z < head_new
                    && face.touches_circle(new_pos.truncate(), PLAYER_RADIUS)
                {
                    new_pos.z = face.z - PLAYER_HEIGHT - 1e-3;
                    self.speed.z = 0.0;
                }
            } else if delta.z < -1e-6 && face.dir == Direction::Up {
                // Ground: land on it.
                if face.z < self.position.z
                    && face.z > new_pos.z
                    && face.touches_circle(new_pos.truncate(), PLAYER_RADIUS)
                {
                    new_pos.z = face.z + 1e-4;
                    self.speed.z = 0.0;
                    self.in_air = false;
                }
            }
        }

        for side in &mesh.sides {
            let overlaps = (side.z0 > new_pos.z && side.z0 < new_pos.z + PLAYER_HEIGHT)
                || (side.z1 > new_pos.z && side.z1 < new_pos.z + PLAYER_HEIGHT);
            if !overlaps {
                continue;
            }
            let n3 = side.dir.normal();
            let normal = Vec2::new(n3.x, n3.y);
            let corrected =
                push_circle_from_edge(new_pos.truncate(), side.edge, normal, PLAYER_RADIUS);
            if corrected != new_pos.truncate() {
                // Kill the speed component into the face.
                let into = self.speed.x * normal.x + self.speed.y * normal.y;
                if into < 0.0 {
                    self.speed.x -= normal.x * into;
                    self.speed.y -= normal.y * into;
                }
                new_pos.x = corrected.x;
                new_pos.y = corrected.y;
            }
        }

        new_pos
    }

    /// Ray-picks the build target along the view direction; returns and
    /// stores it.
    #[allow(clippy::cast_possible_truncation)]
    pub fn update_build_position(&mut self) -> Option<((i32, i32, i32), Direction)> {
        self.build_target = None;
        let mesh = self.mesh.clone()?;
        let eye = self.eyes_position();
        let dir = self.eye_direction();

        let mut best_distance = MAX_BUILD_DISTANCE;
        let mut best: Option<(Vec3, Direction)> = None;

        for face in &mesh.upper_faces {
            let count = usize::from(face.vertex_count);
            // Fan triangulation of the lid polygon.
            for i in 1..count - 1 {
                let triangle = [
                    face.vertices[0].extend(face.z),
                    face.vertices[i].extend(face.z),
                    face.vertices[i + 1].extend(face.z),
                ];
                if let Some(hit) = ray_triangle_intersection(eye, dir, &triangle) {
                    let d = (hit - eye).length();
                    if d < best_distance {
                        best_distance = d;
                        best = Some((hit, face.dir));
                    }
                }
            }
        }

        for side in &mesh.sides {
            let a0 = side.edge[0].extend(side.z0);
            let a1 = side.edge[1].extend(side.z0);
            let b0 = side.edge[0].extend(side.z1);
            let b1 = side.edge[1].extend(side.z1);
            for triangle in [[a0, a1, b1], [b0, a0, b1]] {
                if let Some(hit) = ray_triangle_intersection(eye, dir, &triangle) {
                    let d = (hit - eye).length();
                    if d < best_distance {
                        best_distance = d;
                        best = Some((hit, side.dir));
                    }
                }
            }
        }

        let (hit, face_dir) = best?;
        // Bias into the cell behind the face, then round z up into it.
        let biased = hit + face_dir.normal() * 0.1;
        let (cell_x, cell_y) = world_to_hex(biased.truncate());
        let cell_z = biased.z.floor() as i32 + 1;

        self.build_target = Some(((cell_x, cell_y, cell_z), face_dir));
        self.build_target
    }
}
