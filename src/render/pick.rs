use crate::math::Vec3;
use crate::world::{BodyId, InternalSegmentId, SectorId, SegmentId};

/// Which part of an object the picked pixel landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Ceiling,
    Floor,
    Hi,
    Mid,
    Low,
    InternalSegment,
    Body,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selectable {
    Sector(SectorId),
    Segment(SegmentId),
    InternalSegment(InternalSegmentId),
    Body(BodyId),
}

/// One object under the picked pixel. `world` and `normal` are set for
/// surfaces where the pick path computes them and are zero otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickResult {
    pub object: Selectable,
    pub surface: SurfaceKind,
    pub world: Vec3,
    pub normal: Vec3,
}

impl PickResult {
    pub(crate) fn new(object: Selectable, surface: SurfaceKind) -> Self {
        Self {
            object,
            surface,
            world: Vec3::ZERO,
            normal: Vec3::ZERO,
        }
    }

    pub(crate) fn at(mut self, world: Vec3, normal: Vec3) -> Self {
        self.world = world;
        self.normal = normal;
        self
    }
}
