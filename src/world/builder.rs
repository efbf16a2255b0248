use crate::error::{Error, Result};
use crate::lightmap::Lightmap;
use crate::material::Material;
use crate::math::{Vec2, Vec3};
use crate::world::{
    Body, BodyId, InternalSegment, InternalSegmentId, MaterialId, Sector, SectorId,
    SectorSegment, SegmentId, Surface, World,
};

/// Collects raw geometry, then links segment cycles and portals, derives
/// normals and bounds, and precomputes the PVS in [`WorldBuilder::build`].
pub struct WorldBuilder {
    sectors: Vec<Sector>,
    segments: Vec<SectorSegment>,
    internal_segments: Vec<InternalSegment>,
    bodies: Vec<Body>,
    materials: Vec<Material>,
    light_grid: f64,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            sectors: Vec::new(),
            segments: Vec::new(),
            internal_segments: Vec::new(),
            bodies: Vec::new(),
            materials: Vec::new(),
            light_grid: 4.0,
        }
    }

    /// World-space size of one lightmap voxel. The renderer's light filter
    /// distance scales with it.
    pub fn light_grid(mut self, grid: f64) -> Self {
        self.light_grid = grid;
        self
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() as u32 - 1)
    }

    /// Adds a sector with flat planes. Points may wind either way.
    pub fn add_sector(
        &mut self,
        name: impl Into<String>,
        points: &[Vec2],
        floor_z: f64,
        ceil_z: f64,
    ) -> SectorId {
        let id = SectorId(self.sectors.len() as u32);
        let mut sector = Sector::new(id, name.into(), floor_z, ceil_z);
        for (i, &p) in points.iter().enumerate() {
            let sid = SegmentId(self.segments.len() as u32);
            self.segments.push(SectorSegment::new(sid, id, i, p));
            sector.segments.push(sid);
        }
        self.sectors.push(sector);
        id
    }

    pub fn sector_mut(&mut self, id: SectorId) -> &mut Sector {
        &mut self.sectors[id.index()]
    }

    /// Handle of the `index`-th edge of a sector.
    pub fn segment_of(&self, sector: SectorId, index: usize) -> SegmentId {
        self.sectors[sector.index()].segments[index]
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> &mut SectorSegment {
        &mut self.segments[id.index()]
    }

    /// Applies one material to the floor, ceiling and every wall band.
    pub fn paint_sector(
        &mut self,
        id: SectorId,
        floor: MaterialId,
        ceil: MaterialId,
        wall: MaterialId,
    ) {
        let sector = &mut self.sectors[id.index()];
        sector.bottom.surface = Surface::with_material(floor);
        sector.top.surface = Surface::with_material(ceil);
        for &sid in &sector.segments {
            let seg = &mut self.segments[sid.index()];
            seg.mid = Surface::with_material(wall);
            seg.hi = Surface::with_material(wall);
            seg.lo = Surface::with_material(wall);
        }
    }

    pub fn add_internal_segment(
        &mut self,
        a: Vec2,
        b: Vec2,
        bottom: f64,
        top: f64,
    ) -> InternalSegmentId {
        let id = InternalSegmentId(self.internal_segments.len() as u32);
        self.internal_segments
            .push(InternalSegment::new(id, a, b, bottom, top));
        id
    }

    pub fn internal_segment_mut(&mut self, id: InternalSegmentId) -> &mut InternalSegment {
        &mut self.internal_segments[id.index()]
    }

    pub fn add_body(&mut self, name: impl Into<String>, pos: Vec3, size: Vec2) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body::new(id, name.into(), pos, size));
        id
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.index()]
    }

    /// Links `from` to `to` explicitly. Teleporting portals may join edges
    /// that are far apart.
    pub fn link_portal(&mut self, from: SegmentId, to: SegmentId, teleports: bool) {
        let to_sector = self.segments[to.index()].sector;
        let from_sector = self.segments[from.index()].sector;
        let f = &mut self.segments[from.index()];
        f.adjacent_sector = Some(to_sector);
        f.adjacent_segment = Some(to);
        f.portal_teleports = teleports;
        let t = &mut self.segments[to.index()];
        t.adjacent_sector = Some(from_sector);
        t.adjacent_segment = Some(from);
        t.portal_teleports = teleports;
    }

    pub fn build(self) -> Result<World> {
        if self.light_grid.is_nan() || self.light_grid <= 0.0 {
            return Err(Error::InvalidLightGrid(self.light_grid));
        }
        let mut world = World {
            sectors: self.sectors,
            segments: self.segments,
            internal_segments: self.internal_segments,
            bodies: self.bodies,
            materials: self.materials,
            light_grid: self.light_grid,
        };
        for i in 0..world.sectors.len() {
            link_sector(&mut world, SectorId(i as u32))?;
        }
        validate_materials(&world)?;
        link_portals(&mut world)?;
        attach_internal_segments(&mut world);
        attach_bodies(&mut world);
        for sector in &mut world.sectors {
            let (min_z, max_z) = sector.pvs_extent();
            let min = Vec3::new(sector.min.x, sector.min.y, min_z);
            let max = Vec3::new(sector.max.x, sector.max.y, max_z);
            sector.lightmap = Lightmap::new(min, max, world.light_grid);
        }
        world.rebuild_pvs();
        log::info!(
            "built world: {} sectors, {} segments, {} bodies",
            world.sectors.len(),
            world.segments.len(),
            world.bodies.len()
        );
        Ok(world)
    }
}

fn link_sector(world: &mut World, id: SectorId) -> Result<()> {
    let ids = world.sectors[id.index()].segments.clone();
    if ids.len() < 3 {
        return Err(Error::DegenerateSector(id, ids.len()));
    }
    let n = ids.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = world.segments[ids[i].index()].p;
        let q = world.segments[ids[(i + 1) % n].index()].p;
        sum += (q.x - p.x) * (p.y + q.y);
    }
    let winding = if sum < 0.0 { 1 } else { -1 };
    for i in 0..n {
        let next = ids[(i + 1) % n];
        let prev = ids[(i + n - 1) % n];
        let b = world.segments[next.index()].p;
        let seg = &mut world.segments[ids[i].index()];
        seg.index = i;
        seg.next = next;
        seg.prev = prev;
        seg.recalculate(b, winding);
        if seg.length == 0.0 {
            return Err(Error::ZeroLengthSegment(seg.id));
        }
    }

    let mut concave = false;
    let mut prev_cross = 0.0;
    for i in 0..n {
        let p1 = world.segments[ids[i].index()].p;
        let p2 = world.segments[ids[(i + 1) % n].index()].p;
        let p3 = world.segments[ids[(i + 2) % n].index()].p;
        let c = (p2 - p1).cross(p3 - p2);
        if c != 0.0 {
            if c * prev_cross < 0.0 {
                concave = true;
                break;
            }
            prev_cross = c;
        }
    }

    let p0 = world.segments[ids[0].index()].p;
    let sector = &mut world.sectors[id.index()];
    sector.winding = winding;
    sector.concave = concave;
    sector.bottom.precompute(p0);
    sector.top.precompute(p0);
    world.recalculate_bounds(id);
    Ok(())
}

fn validate_materials(world: &World) -> Result<()> {
    let check = |s: &Surface| match s.material {
        Some(m) if m.index() >= world.materials.len() => Err(Error::UnknownMaterial(m)),
        _ => Ok(()),
    };
    for sector in &world.sectors {
        check(&sector.bottom.surface)?;
        check(&sector.top.surface)?;
    }
    for seg in &world.segments {
        check(&seg.mid)?;
        check(&seg.hi)?;
        check(&seg.lo)?;
    }
    for seg in &world.internal_segments {
        check(&seg.surface)?;
    }
    for body in &world.bodies {
        if let Some(m) = body.material
            && m.index() >= world.materials.len()
        {
            return Err(Error::UnknownMaterial(m));
        }
    }
    Ok(())
}

fn link_portals(world: &mut World) -> Result<()> {
    // Explicit links first: fill in or check the adjacent segment.
    for i in 0..world.segments.len() {
        let seg = &world.segments[i];
        let Some(adj) = seg.adjacent_sector else {
            continue;
        };
        if adj.index() >= world.sectors.len() {
            return Err(Error::UnknownSector(adj));
        }
        match seg.adjacent_segment {
            Some(other) => {
                if other.index() >= world.segments.len() {
                    return Err(Error::UnknownSegment(other));
                }
                if world.segments[other.index()].sector != adj {
                    return Err(Error::BrokenPortal {
                        segment: seg.id,
                        adjacent: adj,
                    });
                }
            }
            None => {
                let (a, b) = (seg.p, seg.b);
                let found = world.sectors[adj.index()]
                    .segments
                    .iter()
                    .copied()
                    .find(|&o| world.segments[o.index()].matches(a, b));
                match found {
                    Some(o) => world.segments[i].adjacent_segment = Some(o),
                    None => {
                        return Err(Error::BrokenPortal {
                            segment: world.segments[i].id,
                            adjacent: adj,
                        });
                    }
                }
            }
        }
    }

    // Then any shared edge between two sectors becomes a portal.
    for i in 0..world.segments.len() {
        if world.segments[i].adjacent_sector.is_some() {
            continue;
        }
        let (a, b, owner) = (
            world.segments[i].p,
            world.segments[i].b,
            world.segments[i].sector,
        );
        let found = (0..world.segments.len()).find(|&j| {
            let o = &world.segments[j];
            j != i && o.sector != owner && o.adjacent_sector.is_none() && o.matches(a, b)
        });
        if let Some(j) = found {
            let other_sector = world.segments[j].sector;
            world.segments[i].adjacent_sector = Some(other_sector);
            world.segments[i].adjacent_segment = Some(SegmentId(j as u32));
            world.segments[j].adjacent_sector = Some(owner);
            world.segments[j].adjacent_segment = Some(SegmentId(i as u32));
        }
    }
    Ok(())
}

fn attach_internal_segments(world: &mut World) {
    for i in 0..world.internal_segments.len() {
        let (a, b) = (world.internal_segments[i].a, world.internal_segments[i].b);
        let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        let mut owners = Vec::new();
        for sector in &world.sectors {
            let overlaps = sector.min.x <= max.x
                && sector.max.x >= min.x
                && sector.min.y <= max.y
                && sector.max.y >= min.y;
            if overlaps && (world.sector_contains(sector.id, a) || world.sector_contains(sector.id, b))
            {
                owners.push(sector.id);
            }
        }
        let id = world.internal_segments[i].id;
        for &s in &owners {
            world.sectors[s.index()].internal_segments.push(id);
        }
        world.internal_segments[i].sectors = owners;
    }
}

fn attach_bodies(world: &mut World) {
    for i in 0..world.bodies.len() {
        let body = &world.bodies[i];
        let sector = body.sector.or_else(|| world.sector_at(body.pos.xy(), None));
        let id = body.id;
        world.bodies[i].sector = sector;
        match sector {
            Some(s) => world.sectors[s.index()].bodies.push(id),
            None => log::warn!("body {:?} ({}) is outside every sector", id, world.bodies[i].name),
        }
    }
}
