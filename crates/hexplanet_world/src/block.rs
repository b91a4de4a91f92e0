//! # Block Model
//!
//! Blocks are a tagged sum type flattened into a 32-bit cell handle:
//! the low half is the [`BlockKind`] ordinal, the high half an index into
//! one of the owning chunk's variant pools (or `NONE` for the shared
//! flyweight of that kind). The kind decides which pool a slotted handle
//! refers to:
//!
//! | kind          | slotted meaning        |
//! |---------------|------------------------|
//! | `Water`       | liquid (fill level)    |
//! | `FireStone`   | placed light source    |
//! | `Fire`        | burning fire           |
//! | `Grass`       | active (reproducing)   |
//! | `Sand`        | failing (mid-fall)     |
//! | `Brick`/`Spherical` | non-standard form |
//!
//! An unslotted handle of any kind is the immutable flyweight; derived
//! per-kind constants (transparency classes, form, flammability) are const
//! tables below and never change after startup.

use bytemuck::{Pod, Zeroable};
use hexplanet_core::math::hex::Direction;

/// Largest flammability weight a block type can carry.
pub const MAX_FLAMMABILITY: u32 = 255;

/// Block type. Ordinals are stable and persisted; 0 must stay air.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Empty cell.
    #[default]
    Air = 0,
    /// Decorative sphere, a non-standard form.
    Spherical = 1,
    /// Base rock.
    Stone = 2,
    /// Plain earth; grass spreads onto it.
    Soil = 3,
    /// Tree trunk.
    Wood = 4,
    /// Grassy earth (active instances reproduce).
    Grass = 5,
    /// Liquid; always slotted with a fill level.
    Water = 6,
    /// Loose sand; fails when unsupported.
    Sand = 7,
    /// Tree crown.
    Foliage = 8,
    /// Permanent light source.
    FireStone = 9,
    /// Masonry; built as a half-height plate.
    Brick = 10,
    /// Burning fire; always slotted with a power counter.
    Fire = 11,
}

impl BlockKind {
    /// Number of kinds.
    pub const COUNT: usize = 12;

    /// Decodes a persisted ordinal.
    #[must_use]
    pub const fn from_u16(v: u16) -> Option<Self> {
        match v {
            0 => Some(Self::Air),
            1 => Some(Self::Spherical),
            2 => Some(Self::Stone),
            3 => Some(Self::Soil),
            4 => Some(Self::Wood),
            5 => Some(Self::Grass),
            6 => Some(Self::Water),
            7 => Some(Self::Sand),
            8 => Some(Self::Foliage),
            9 => Some(Self::FireStone),
            10 => Some(Self::Brick),
            11 => Some(Self::Fire),
            _ => None,
        }
    }

    /// Visibility class used by mesh emission.
    #[must_use]
    pub const fn visibility(self) -> Visibility {
        match self {
            // Water deliberately shares the air class: the solid mesh never
            // fences water off from air, water surfaces come from the
            // water-cell list.
            Self::Air | Self::Water => Visibility::AirLike,
            Self::Spherical | Self::Foliage | Self::Fire => Visibility::Translucent,
            Self::Stone
            | Self::Soil
            | Self::Wood
            | Self::Grass
            | Self::Sand
            | Self::FireStone
            | Self::Brick => Visibility::Solid,
        }
    }

    /// Light-pass class used by the light engine.
    #[must_use]
    pub const fn light_pass(self) -> LightPass {
        match self {
            Self::Air => LightPass::Air,
            Self::Water => LightPass::Liquid,
            Self::Spherical | Self::Foliage | Self::Fire => LightPass::Translucent,
            Self::Stone
            | Self::Soil
            | Self::Wood
            | Self::Grass
            | Self::Sand
            | Self::FireStone
            | Self::Brick => LightPass::Solid,
        }
    }

    /// Physical form.
    #[must_use]
    pub const fn form(self) -> Form {
        match self {
            Self::Brick => Form::Plate,
            Self::Spherical => Form::Bisected,
            _ => Form::Full,
        }
    }

    /// Flammability weight in `[0, 255]`.
    #[must_use]
    pub const fn flammability(self) -> u8 {
        match self {
            Self::Foliage => 224,
            Self::Wood => 128,
            Self::Grass => 80,
            _ => 0,
        }
    }

    /// Packed transparency byte: visibility in the low two bits,
    /// light-pass in the next two.
    #[must_use]
    pub const fn transparency(self) -> u8 {
        self.visibility() as u8 | ((self.light_pass() as u8) << 2)
    }
}

/// Visibility class of a cell, two bits of the transparency byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    /// Fully opaque.
    Solid = 0,
    /// Visible but see-through (foliage, fire, glassy forms).
    Translucent = 1,
    /// Invisible to the solid mesh (air and liquids).
    AirLike = 3,
}

/// Light-pass class of a cell, two bits of the transparency byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightPass {
    /// Absorbs light completely.
    Solid = 0,
    /// Passes light at the plain hop cost.
    Translucent = 1,
    /// Passes light with a fixed extra attenuation.
    Liquid = 2,
    /// Passes light freely.
    Air = 3,
}

/// Mask selecting the visibility bits of a transparency byte.
pub const VISIBILITY_BITS: u8 = 0b11;

/// Visibility bits of a transparency byte.
#[inline]
#[must_use]
pub const fn visibility_bits(transparency: u8) -> u8 {
    transparency & VISIBILITY_BITS
}

/// Light-pass class of a transparency byte.
#[inline]
#[must_use]
pub const fn light_pass_bits(transparency: u8) -> LightPass {
    match (transparency >> 2) & 0b11 {
        0 => LightPass::Solid,
        1 => LightPass::Translucent,
        2 => LightPass::Liquid,
        _ => LightPass::Air,
    }
}

/// Physical form of a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    /// Whole prism.
    Full,
    /// Half-height horizontal slab.
    Plate,
    /// Vertical half prism.
    Bisected,
}

/// A packed cell value: kind ordinal plus an optional pool slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct CellHandle(u32);

impl CellHandle {
    /// The air cell.
    pub const AIR: Self = Self::normal(BlockKind::Air);

    /// Flyweight (unslotted) handle of `kind`.
    #[must_use]
    pub const fn normal(kind: BlockKind) -> Self {
        Self(kind as u32 | ((SLOT_NONE as u32) << 16))
    }

    /// Slotted handle referring into the owning chunk's pool for `kind`.
    #[must_use]
    pub const fn slotted(kind: BlockKind, slot: u16) -> Self {
        Self(kind as u32 | ((slot as u32) << 16))
    }

    /// The block kind.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn kind(self) -> BlockKind {
        match BlockKind::from_u16(self.0 as u16) {
            Some(k) => k,
            // Handles are only built from valid kinds.
            None => BlockKind::Air,
        }
    }

    /// The pool slot, if this handle is slotted.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn slot(self) -> Option<u16> {
        let s = (self.0 >> 16) as u16;
        if s == SLOT_NONE {
            None
        } else {
            Some(s)
        }
    }

    /// True when this cell is air.
    #[inline]
    #[must_use]
    pub fn is_air(self) -> bool {
        self.kind() == BlockKind::Air
    }
}

const SLOT_NONE: u16 = u16::MAX;

/// Liquid cell payload: position within its chunk plus a fill level in
/// `[1, MAX_WATER_LEVEL]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// z.
    pub z: u8,
    /// Fill level.
    pub level: u16,
}

impl LiquidBlock {
    /// Adds `delta` to the fill level, saturating.
    pub fn increase(&mut self, delta: u16) {
        self.level = self.level.saturating_add(delta);
    }

    /// Removes `delta` from the fill level, saturating.
    pub fn decrease(&mut self, delta: u16) {
        self.level = self.level.saturating_sub(delta);
    }
}

/// Placed permanent light source (fire-stone).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightSourceBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// z.
    pub z: u8,
    /// Emitted fire-light level.
    pub level: u8,
}

/// A burning fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FireBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// z.
    pub z: u8,
    /// Growth counter; spread chances scale with `power / MAX_POWER`.
    pub power: u16,
}

impl FireBlock {
    /// Saturation value of the power counter.
    pub const MAX_POWER: u16 = 512;
    /// Fire-light level every fire emits, below fire-stone's maximum.
    pub const LIGHT_LEVEL: u8 = 10;
}

/// Block with a plate or bisected form and an orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonStandardBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// z.
    pub z: u8,
    /// Underlying kind (`Brick` or `Spherical`).
    pub kind: BlockKind,
    /// Orientation: a horizontal direction for bisected forms, up/down for
    /// plates.
    pub direction: Direction,
}

/// An actively reproducing grass cell. Inactive grass is the unslotted
/// `Grass` flyweight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrassBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// z.
    pub z: u8,
}

/// A block that lost support and is mid-fall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FailingBlock {
    /// Local x.
    pub x: u8,
    /// Local y.
    pub y: u8,
    /// Current cell z.
    pub z: u8,
    /// Kind restored when the block settles.
    pub wrapped: BlockKind,
    /// Downward speed in cells per second, for the render offset.
    pub velocity: f32,
}
