//! Arena storage for sectors, segments, bodies and materials. Cross
//! references are plain index handles, so portal cycles never own each other.

mod body;
mod builder;
mod sector;

pub use body::{Body, InternalSegment, Light, ShadowMode};
pub use builder::WorldBuilder;
pub use sector::{
    PlaneKind, Sector, SectorBehavior, SectorPlane, SectorSegment, Stretch, Surface,
};

use crate::error::{Error, Result};
use crate::material::Material;
use crate::math::{INTERSECT_EPSILON, Vec2, Vec3};
use crate::pvs;

macro_rules! handle {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(SectorId);
handle!(SegmentId);
handle!(InternalSegmentId);
handle!(BodyId);
handle!(MaterialId);

#[derive(Debug)]
pub struct World {
    pub sectors: Vec<Sector>,
    pub segments: Vec<SectorSegment>,
    pub internal_segments: Vec<InternalSegment>,
    pub bodies: Vec<Body>,
    pub materials: Vec<Material>,
    /// Lightmap voxel size the sector caches were laid out for.
    pub light_grid: f64,
}

impl World {
    #[inline]
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.index()]
    }

    #[inline]
    pub fn segment(&self, id: SegmentId) -> &SectorSegment {
        &self.segments[id.index()]
    }

    #[inline]
    pub fn internal_segment(&self, id: InternalSegmentId) -> &InternalSegment {
        &self.internal_segments[id.index()]
    }

    #[inline]
    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }

    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.index()]
    }

    pub fn sector_segments(&self, id: SectorId) -> impl Iterator<Item = &SectorSegment> + '_ {
        self.sector(id).segments.iter().map(|&s| self.segment(s))
    }

    /// Crossing-number point containment.
    pub fn sector_contains(&self, id: SectorId, p: Vec2) -> bool {
        let sector = self.sector(id);
        let Some(&first) = sector.segments.first() else {
            return false;
        };
        let mut inside = false;
        let mut flag1 = p.y >= self.segment(first).p.y;
        for seg in self.sector_segments(id) {
            let flag2 = p.y >= seg.b.y;
            if flag1 != flag2
                && (((seg.b.y - p.y) * (seg.p.x - seg.b.x) >= (seg.b.x - p.x) * (seg.p.y - seg.b.y))
                    == flag2)
            {
                inside = !inside;
            }
            flag1 = flag2;
        }
        inside
    }

    /// Finds the sector containing `p`, trying `hint` and its neighbors first.
    pub fn sector_at(&self, p: Vec2, hint: Option<SectorId>) -> Option<SectorId> {
        if let Some(h) = hint {
            if self.sector_contains(h, p) {
                return Some(h);
            }
            for seg in self.sector_segments(h) {
                if let Some(adj) = seg.adjacent_sector
                    && self.sector_contains(adj, p)
                {
                    return Some(adj);
                }
            }
        }
        self.sectors
            .iter()
            .filter(|s| s.in_bounds_2d(p, INTERSECT_EPSILON))
            .map(|s| s.id)
            .find(|&id| self.sector_contains(id, p))
    }

    /// Moves a floor or ceiling and drops every lightmap that could have seen
    /// the old geometry. The PVS is rebuilt when the sector's PVS extent
    /// changes; a door moving within its open extent keeps it.
    pub fn set_plane_z(&mut self, id: SectorId, kind: PlaneKind, z: f64) -> Result<()> {
        if id.index() >= self.sectors.len() {
            return Err(Error::UnknownSector(id));
        }
        let before = self.sectors[id.index()].pvs_extent();
        let sector = &mut self.sectors[id.index()];
        match kind {
            PlaneKind::Bottom => sector.bottom.z = z,
            PlaneKind::Top => sector.top.z = z,
        }
        self.recalculate_bounds(id);
        self.invalidate_lightmaps(id);
        if self.sectors[id.index()].pvs_extent() != before {
            self.rebuild_pvs();
            self.invalidate_lightmaps(id);
        }
        Ok(())
    }

    /// Clears the lightmap of `id` and of every sector in its PVS.
    pub fn invalidate_lightmaps(&self, id: SectorId) {
        let sector = self.sector(id);
        sector.lightmap.clear();
        for &other in &sector.pvs {
            self.sector(other).lightmap.clear();
        }
        log::debug!(
            "invalidated lightmaps of {:?} and {} PVS sectors",
            id,
            sector.pvs.len()
        );
    }

    /// Moves a body, updating sector membership and the light lists if a
    /// light changed sectors.
    pub fn move_body(&mut self, id: BodyId, pos: Vec3) -> Result<()> {
        if id.index() >= self.bodies.len() {
            return Err(Error::UnknownBody(id));
        }
        let old = self.bodies[id.index()].sector;
        let new = self.sector_at(pos.xy(), old);
        self.bodies[id.index()].pos = pos;
        if old == new {
            return Ok(());
        }
        if let Some(s) = old {
            self.sectors[s.index()].bodies.retain(|&b| b != id);
        }
        if let Some(s) = new {
            self.sectors[s.index()].bodies.push(id);
        }
        self.bodies[id.index()].sector = new;
        if self.bodies[id.index()].light.is_some() {
            self.rebuild_light_lists();
        }
        Ok(())
    }

    /// Recomputes the visual PVS, entity PVS and light list of every sector.
    pub fn rebuild_pvs(&mut self) {
        let results: Vec<_> = self
            .sectors
            .iter()
            .map(|s| (pvs::build_pvs(self, s.id), pvs::build_entity_pvs(self, s.id)))
            .collect();
        for (sector, (visible, entity)) in self.sectors.iter_mut().zip(results) {
            sector.pvs = visible;
            sector.entity_pvs = entity;
        }
        self.rebuild_light_lists();
        log::debug!("rebuilt PVS for {} sectors", self.sectors.len());
    }

    pub fn rebuild_light_lists(&mut self) {
        let lists: Vec<_> = self
            .sectors
            .iter()
            .map(|s| pvs::build_pvl(self, s.id))
            .collect();
        for (sector, pvl) in self.sectors.iter_mut().zip(lists) {
            sector.pvl = pvl;
        }
    }

    pub(crate) fn recalculate_bounds(&mut self, id: SectorId) {
        let mut min = Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut center = Vec3::ZERO;
        let sector = &self.sectors[id.index()];
        for &sid in &sector.segments {
            let p = self.segments[sid.index()].p;
            let (bz, tz) = sector.z_at(p);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            min.z = min.z.min(bz).min(tz);
            max.z = max.z.max(bz).max(tz);
            center += Vec3::new(p.x, p.y, (bz + tz) * 0.5);
        }
        let n = sector.segments.len().max(1) as f64;
        let sector = &mut self.sectors[id.index()];
        sector.min = min;
        sector.max = max;
        sector.center = center * (1.0 / n);
    }
}
