use crate::math::{Vec2, Vec3};
use crate::world::{BodyId, InternalSegmentId, MaterialId, SectorId};
use crate::world::sector::Surface;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub diffuse: Vec3,
    pub strength: f64,
    /// Falloff exponent. Zero disables distance attenuation.
    pub attenuation: f64,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            diffuse: Vec3::new(1.0, 1.0, 1.0),
            strength: 1.0,
            attenuation: 1.2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowMode {
    #[default]
    None,
    /// Alpha-tested billboard silhouette.
    Image,
    Sphere,
    Aabb,
}

/// Point entity. `pos` is the center; `size.x` is the width (or diameter),
/// `size.y` the height.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub pos: Vec3,
    pub size: Vec2,
    pub sector: Option<SectorId>,
    pub material: Option<MaterialId>,
    pub opacity: f64,
    pub light: Option<Light>,
    pub shadow: ShadowMode,
}

impl Body {
    pub(crate) fn new(id: BodyId, name: String, pos: Vec3, size: Vec2) -> Self {
        Self {
            id,
            name,
            pos,
            size,
            sector: None,
            material: None,
            opacity: 1.0,
            light: None,
            shadow: ShadowMode::None,
        }
    }

    /// Segment through the body center, perpendicular to `unit_view`.
    pub fn billboard(&self, unit_view: Vec2) -> (Vec2, Vec2) {
        let half = self.size.x * 0.5;
        let a = Vec2::new(self.pos.x + unit_view.y * half, self.pos.y - unit_view.x * half);
        let b = Vec2::new(self.pos.x - unit_view.y * half, self.pos.y + unit_view.x * half);
        (a, b)
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.pos.z + self.size.y * 0.5
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.pos.z - self.size.y * 0.5
    }
}

/// Free-standing wall inside one or more sectors.
#[derive(Clone, Debug)]
pub struct InternalSegment {
    pub id: InternalSegmentId,
    pub a: Vec2,
    pub b: Vec2,
    pub bottom: f64,
    pub top: f64,
    pub two_sided: bool,
    pub surface: Surface,
    pub normal: Vec2,
    pub length: f64,
    pub sectors: Vec<SectorId>,
}

impl InternalSegment {
    pub(crate) fn new(id: InternalSegmentId, a: Vec2, b: Vec2, bottom: f64, top: f64) -> Self {
        let mut s = Self {
            id,
            a,
            b,
            bottom,
            top,
            two_sided: false,
            surface: Surface::default(),
            normal: Vec2::ZERO,
            length: 0.0,
            sectors: Vec::new(),
        };
        s.recalculate();
        s
    }

    pub(crate) fn recalculate(&mut self) {
        let d = self.b - self.a;
        self.length = d.length();
        if self.length > 0.0 {
            self.normal = Vec2::new(-d.y / self.length, d.x / self.length);
        }
    }
}
