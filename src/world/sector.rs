use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashSet;

use crate::lightmap::Lightmap;
use crate::math::{Mat2x3, Vec2, Vec3, Vec4, segment_distance2};
use crate::world::{BodyId, InternalSegmentId, MaterialId, SectorId, SegmentId};

/// How wall UVs map onto a segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stretch {
    /// One texture repeat across the full wall.
    #[default]
    Scale,
    /// Vertical repeat follows the wall's height/length ratio.
    Aspect,
    /// World-aligned texels, 64 units per repeat.
    None,
}

#[derive(Clone, Copy, Debug)]
pub struct Surface {
    pub material: Option<MaterialId>,
    pub transform: Mat2x3,
    pub stretch: Stretch,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            material: None,
            transform: Mat2x3::IDENTITY,
            stretch: Stretch::Scale,
        }
    }
}

impl Surface {
    pub fn with_material(material: MaterialId) -> Self {
        Self {
            material: Some(material),
            ..Self::default()
        }
    }
}

/// Floor or ceiling. Sloped planes pass through `(P0.x, P0.y, z)` where `P0`
/// is the first point of the sector.
#[derive(Clone, Copy, Debug)]
pub struct SectorPlane {
    pub z: f64,
    pub normal: Vec3,
    pub surface: Surface,
    pub(crate) xy_det: f64,
}

impl SectorPlane {
    pub fn flat(z: f64, up: bool) -> Self {
        Self {
            z,
            normal: Vec3::new(0.0, 0.0, if up { 1.0 } else { -1.0 }),
            surface: Surface::default(),
            xy_det: 0.0,
        }
    }

    pub(crate) fn precompute(&mut self, p0: Vec2) {
        self.xy_det = self.normal.x * p0.x + self.normal.y * p0.y;
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.normal.x == 0.0 && self.normal.y == 0.0
    }

    #[inline]
    pub fn z_at(&self, p: Vec2) -> f64 {
        if self.is_flat() {
            return self.z;
        }
        (self.normal.z * self.z + self.xy_det - self.normal.x * p.x - self.normal.y * p.y)
            / self.normal.z
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SectorBehavior {
    #[default]
    Plain,
    /// A ceiling that moves. `open_top` is its fully open height.
    Door { open_top: f64 },
    /// Tints the presented frame while the camera is inside.
    Underwater { tint: Vec4 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaneKind {
    Bottom,
    Top,
}

/// An oriented boundary edge `p → b` of a sector.
#[derive(Clone, Debug)]
pub struct SectorSegment {
    pub id: SegmentId,
    pub sector: SectorId,
    pub index: usize,
    pub p: Vec2,
    pub b: Vec2,
    pub next: SegmentId,
    pub prev: SegmentId,
    pub normal: Vec2,
    pub length: f64,
    pub mid: Surface,
    pub hi: Surface,
    pub lo: Surface,
    pub wall_uv_ignore_slope: bool,
    pub portal_has_material: bool,
    pub portal_teleports: bool,
    pub adjacent_sector: Option<SectorId>,
    pub adjacent_segment: Option<SegmentId>,
    pub portal_matrix: Mat2x3,
    pub mirror_portal_matrix: Mat2x3,
}

impl SectorSegment {
    pub(crate) fn new(id: SegmentId, sector: SectorId, index: usize, p: Vec2) -> Self {
        Self {
            id,
            sector,
            index,
            p,
            b: p,
            next: id,
            prev: id,
            normal: Vec2::ZERO,
            length: 0.0,
            mid: Surface::default(),
            hi: Surface::default(),
            lo: Surface::default(),
            wall_uv_ignore_slope: false,
            portal_has_material: false,
            portal_teleports: false,
            adjacent_sector: None,
            adjacent_segment: None,
            portal_matrix: Mat2x3::IDENTITY,
            mirror_portal_matrix: Mat2x3::IDENTITY,
        }
    }

    #[inline]
    pub fn is_portal(&self) -> bool {
        self.adjacent_sector.is_some() && self.adjacent_segment.is_some()
    }

    pub(crate) fn recalculate(&mut self, b: Vec2, winding: i8) {
        self.b = b;
        let d = self.b - self.p;
        self.length = d.length();
        self.normal = if self.length > 0.0 {
            Vec2::new(-d.y / self.length, d.x / self.length)
        } else {
            Vec2::ZERO
        };
        if winding < 0 {
            self.normal = -self.normal;
        }
        self.portal_matrix = Mat2x3::from_basis(d, self.normal, self.p);
        self.mirror_portal_matrix = Mat2x3::from_basis(-d, -self.normal, self.b);
    }

    pub fn matches(&self, a: Vec2, b: Vec2) -> bool {
        const EPS: f64 = 1e-4;
        let close = |u: Vec2, v: Vec2| (u.x - v.x).abs() < EPS && (u.y - v.y).abs() < EPS;
        (close(self.p, a) && close(self.b, b)) || (close(self.p, b) && close(self.b, a))
    }

    #[inline]
    pub fn distance2(&self, p: Vec2) -> f64 {
        segment_distance2(self.p, self.b, p)
    }
}

#[derive(Debug)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub segments: Vec<SegmentId>,
    pub bottom: SectorPlane,
    pub top: SectorPlane,
    pub bodies: Vec<BodyId>,
    pub internal_segments: Vec<InternalSegmentId>,
    pub behavior: SectorBehavior,
    pub no_shadows: bool,

    pub winding: i8,
    pub concave: bool,
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,

    /// Sectors reachable through unoccluded portals, including this one.
    pub pvs: HashSet<SectorId>,
    /// Sectors reachable through open portals in a consistent direction.
    pub entity_pvs: HashSet<SectorId>,
    /// Light-casting bodies in the PVS.
    pub pvl: Vec<BodyId>,

    pub lightmap: Lightmap,
    pub(crate) last_seen_frame: AtomicU64,
}

impl Sector {
    pub(crate) fn new(id: SectorId, name: String, bottom_z: f64, top_z: f64) -> Self {
        Self {
            id,
            name,
            segments: Vec::new(),
            bottom: SectorPlane::flat(bottom_z, true),
            top: SectorPlane::flat(top_z, false),
            bodies: Vec::new(),
            internal_segments: Vec::new(),
            behavior: SectorBehavior::Plain,
            no_shadows: false,
            winding: 1,
            concave: false,
            min: Vec3::ZERO,
            max: Vec3::ZERO,
            center: Vec3::ZERO,
            pvs: HashSet::new(),
            entity_pvs: HashSet::new(),
            pvl: Vec::new(),
            lightmap: Lightmap::empty(),
            last_seen_frame: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn z_at(&self, p: Vec2) -> (f64, f64) {
        (self.bottom.z_at(p), self.top.z_at(p))
    }

    #[inline]
    pub fn plane(&self, kind: PlaneKind) -> &SectorPlane {
        match kind {
            PlaneKind::Bottom => &self.bottom,
            PlaneKind::Top => &self.top,
        }
    }

    /// Vertical extent used by the PVS. Doors count as fully open.
    pub fn pvs_extent(&self) -> (f64, f64) {
        match self.behavior {
            SectorBehavior::Door { open_top } => (self.min.z, self.max.z.max(open_top)),
            _ => (self.min.z, self.max.z),
        }
    }

    pub fn in_bounds_2d(&self, p: Vec2, eps: f64) -> bool {
        p.x >= self.min.x - eps
            && p.x <= self.max.x + eps
            && p.y >= self.min.y - eps
            && p.y <= self.max.y + eps
    }

    pub fn last_seen_frame(&self) -> u64 {
        self.last_seen_frame.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_seen(&self, frame: u64) {
        self.last_seen_frame.fetch_max(frame, Ordering::Relaxed);
    }

    pub(crate) fn forget_seen(&self) {
        self.last_seen_frame.store(0, Ordering::Relaxed);
    }
}
