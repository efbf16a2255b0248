//! Per-sector voxel light cache.
//!
//! Voxel corners are addressed by a 64-bit hash: 16 bits each of x, y and z
//! (grid coordinates relative to the sector's bias) at shifts 48, 32 and 16,
//! and 16 low bits for a quantized surface normal. Adding `1 << 16`,
//! `1 << 32` or `1 << 48` to a hash steps one voxel along z, y or x.
//!
//! The table is shared by every render worker without locks. Each slot is a
//! key word and a value word written with relaxed atomics; two workers that
//! compute the same voxel race and the last store wins. A reader can at worst
//! see a value that is stale or was computed for another voxel hashing to the
//! same slot, which the staleness policy already tolerates. Do not put a lock
//! here: every pixel of every column goes through this table.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::math::{Vec3, xorshift64};

const AXIS_MASK: u64 = (1 << 16) - 1;
const VALID: u64 = 1 << 63;

const PACKED_LIGHT_BITS: u32 = 10;
const PACKED_LIGHT_MAX: f64 = ((1 << PACKED_LIGHT_BITS) - 1) as f64;
/// Largest representable light intensity per channel.
pub const PACKED_LIGHT_RANGE: f64 = 12.0;

const MIN_SLOTS: usize = 1 << 10;
const MAX_SLOTS: usize = 1 << 18;

/// A cached diffuse light value and the frame it was computed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightmapCell {
    pub light: u32,
    pub timestamp: u32,
}

impl LightmapCell {
    pub fn new(light: Vec3, frame: u64) -> Self {
        Self {
            light: pack_light(light),
            timestamp: frame as u32,
        }
    }

    #[inline]
    pub fn light(&self) -> Vec3 {
        unpack_light(self.light)
    }

    /// Fresh if computed no more than `max_age` frames before `frame`.
    #[inline]
    pub fn is_fresh(&self, frame: u64, max_age: u32) -> bool {
        (frame as u32).wrapping_sub(self.timestamp) <= max_age
    }

    #[inline]
    fn to_bits(self) -> u64 {
        VALID | ((self.light as u64) << 32) | self.timestamp as u64
    }

    #[inline]
    fn from_bits(v: u64) -> Option<Self> {
        if v & VALID == 0 {
            return None;
        }
        Some(Self {
            light: ((v >> 32) as u32) & ((1 << (3 * PACKED_LIGHT_BITS)) - 1),
            timestamp: v as u32,
        })
    }
}

#[inline]
fn pack_channel(c: f64) -> u32 {
    (c.clamp(0.0, PACKED_LIGHT_RANGE) * PACKED_LIGHT_MAX / PACKED_LIGHT_RANGE) as u32
}

#[inline]
fn unpack_channel(c: u32) -> f64 {
    (c & PACKED_LIGHT_MAX as u32) as f64 * PACKED_LIGHT_RANGE / PACKED_LIGHT_MAX
}

pub fn pack_light(l: Vec3) -> u32 {
    pack_channel(l.x) << (2 * PACKED_LIGHT_BITS)
        | pack_channel(l.y) << PACKED_LIGHT_BITS
        | pack_channel(l.z)
}

pub fn unpack_light(c: u32) -> Vec3 {
    Vec3::new(
        unpack_channel(c >> (2 * PACKED_LIGHT_BITS)),
        unpack_channel(c >> PACKED_LIGHT_BITS),
        unpack_channel(c),
    )
}

/// 15-bit normal signature for the low bits of a voxel hash, so opposite
/// faces of a thin wall never share a cache entry.
pub fn normal_hash(n: Vec3) -> u16 {
    let q = |c: f64| (((c.clamp(-1.0, 1.0) + 1.0) * 15.5).round() as u16).min(31);
    q(n.x) << 10 | q(n.y) << 5 | q(n.z)
}

/// Hash of the `corner`-th (0..8) corner of the voxel whose minimum corner
/// is `m0`. Bit 0 steps z, bit 1 steps y, bit 2 steps x.
#[inline]
pub fn corner_hash(m0: u64, corner: usize) -> u64 {
    let c = corner as u64;
    m0.wrapping_add((c & 1) << 16)
        .wrapping_add((c & 2) << 31)
        .wrapping_add((c & 4) << 46)
}

struct Slot {
    key: AtomicU64,
    value: AtomicU64,
}

pub struct Lightmap {
    slots: Box<[Slot]>,
    mask: usize,
    bias: [i64; 3],
    grid: f64,
}

impl std::fmt::Debug for Lightmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lightmap")
            .field("slots", &self.slots.len())
            .field("bias", &self.bias)
            .field("grid", &self.grid)
            .finish()
    }
}

impl Lightmap {
    pub(crate) fn empty() -> Self {
        Self {
            slots: Box::new([]),
            mask: 0,
            bias: [0; 3],
            grid: 1.0,
        }
    }

    /// Sizes the table from the voxel footprint of the box `min..max`.
    pub fn new(min: Vec3, max: Vec3, grid: f64) -> Self {
        let bias = [
            (min.x / grid).floor() as i64 - 1,
            (min.y / grid).floor() as i64 - 1,
            (min.z / grid).floor() as i64 - 1,
        ];
        let cells = |lo: f64, hi: f64| (((hi - lo) / grid).ceil().max(0.0) as usize) + 2;
        let footprint = cells(min.x, max.x)
            .saturating_mul(cells(min.y, max.y))
            .saturating_mul(cells(min.z, max.z))
            .saturating_mul(2);
        let len = footprint.clamp(MIN_SLOTS, MAX_SLOTS).next_power_of_two();
        let slots = (0..len)
            .map(|_| Slot {
                key: AtomicU64::new(0),
                value: AtomicU64::new(0),
            })
            .collect();
        Self {
            slots,
            mask: len - 1,
            bias,
            grid,
        }
    }

    #[inline]
    pub fn grid(&self) -> f64 {
        self.grid
    }

    #[inline]
    pub fn bias(&self) -> [i64; 3] {
        self.bias
    }

    /// Quantizes `v` to the minimum corner of its voxel.
    pub fn world_to_hash(&self, v: Vec3, extra: u16) -> u64 {
        let q = |c: f64, b: i64| (((c / self.grid).floor() as i64 - b) as u64) & AXIS_MASK;
        (q(v.x, self.bias[0]) << 48)
            | (q(v.y, self.bias[1]) << 32)
            | (q(v.z, self.bias[2]) << 16)
            | extra as u64
    }

    /// World position of the voxel corner a hash names.
    pub fn hash_to_world(&self, hash: u64) -> Vec3 {
        let axis = |shift: u32, b: i64| {
            ((((hash >> shift) & AXIS_MASK) as u16 as i16) as i64 + b) as f64 * self.grid
        };
        Vec3::new(
            axis(48, self.bias[0]),
            axis(32, self.bias[1]),
            axis(16, self.bias[2]),
        )
    }

    #[inline]
    fn slot(&self, hash: u64) -> Option<&Slot> {
        if self.slots.is_empty() {
            return None;
        }
        let i = (xorshift64(hash ^ (hash >> 29)) as usize) & self.mask;
        Some(&self.slots[i])
    }

    pub fn load(&self, hash: u64) -> Option<LightmapCell> {
        let slot = self.slot(hash)?;
        if slot.key.load(Ordering::Relaxed) != hash {
            return None;
        }
        let cell = LightmapCell::from_bits(slot.value.load(Ordering::Relaxed))?;
        if slot.key.load(Ordering::Relaxed) != hash {
            return None;
        }
        Some(cell)
    }

    pub fn store(&self, hash: u64, cell: LightmapCell) {
        let Some(slot) = self.slot(hash) else {
            return;
        };
        slot.value.store(0, Ordering::Relaxed);
        slot.key.store(hash, Ordering::Relaxed);
        slot.value.store(cell.to_bits(), Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.value.store(0, Ordering::Relaxed);
        }
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.value.load(Ordering::Relaxed) & VALID != 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> Lightmap {
        Lightmap::new(Vec3::new(-10.0, -10.0, 0.0), Vec3::new(30.0, 20.0, 16.0), 4.0)
    }

    #[test]
    fn hash_names_the_voxel_minimum_corner() {
        let lm = map();
        let h = lm.world_to_hash(Vec3::new(5.0, -3.0, 9.0), 0);
        assert_eq!(lm.hash_to_world(h), Vec3::new(4.0, -4.0, 8.0));
    }

    #[test]
    fn corners_step_one_voxel_per_axis() {
        let lm = map();
        let m0 = lm.world_to_hash(Vec3::new(1.0, 1.0, 1.0), 0);
        let base = lm.hash_to_world(m0);
        assert_eq!(lm.hash_to_world(corner_hash(m0, 1)), base + Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(lm.hash_to_world(corner_hash(m0, 2)), base + Vec3::new(0.0, 4.0, 0.0));
        assert_eq!(lm.hash_to_world(corner_hash(m0, 4)), base + Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(lm.hash_to_world(corner_hash(m0, 7)), base + Vec3::new(4.0, 4.0, 4.0));
    }

    #[test]
    fn store_then_load_round_trips_and_clear_forgets() {
        let lm = map();
        let h = lm.world_to_hash(Vec3::new(2.0, 2.0, 2.0), normal_hash(Vec3::new(0.0, 0.0, 1.0)));
        assert!(lm.load(h).is_none());
        let cell = LightmapCell::new(Vec3::new(1.0, 0.5, 0.25), 17);
        lm.store(h, cell);
        assert_eq!(lm.load(h), Some(cell));
        assert_eq!(lm.len(), 1);
        lm.clear();
        assert!(lm.load(h).is_none());
        assert!(lm.is_empty());
    }

    #[test]
    fn packing_quantizes_within_one_step() {
        let l = Vec3::new(0.3, 4.7, 11.9);
        let back = unpack_light(pack_light(l));
        let step = PACKED_LIGHT_RANGE / PACKED_LIGHT_MAX;
        assert!((back.x - l.x).abs() <= step);
        assert!((back.y - l.y).abs() <= step);
        assert!((back.z - l.z).abs() <= step);
        // out of range saturates
        assert_eq!(unpack_light(pack_light(Vec3::new(50.0, -1.0, 0.0))).y, 0.0);
    }

    #[test]
    fn freshness_tolerates_frame_wrap() {
        let cell = LightmapCell {
            light: 0,
            timestamp: u32::MAX,
        };
        assert!(cell.is_fresh(u32::MAX as u64 + 2, 3));
        assert!(!cell.is_fresh(u32::MAX as u64 + 10, 3));
    }

    #[test]
    fn opposite_normals_hash_apart() {
        assert_ne!(
            normal_hash(Vec3::new(1.0, 0.0, 0.0)),
            normal_hash(Vec3::new(-1.0, 0.0, 0.0))
        );
    }
}
