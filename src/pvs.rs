//! Potentially visible sets, computed once per geometry change.
//!
//! The visual PVS walks portals outward from a sector and prunes any sector
//! that is fully hidden behind solid walls of some third sector. The entity
//! PVS is a cheaper topological walk used for interaction broad-phase. The
//! light list (PVL) is every light-carrying body inside the visual PVS.

use hashbrown::HashSet;

use crate::math::{Vec2, intersect_segments};
use crate::world::{BodyId, SectorId, SectorSegment, World};

struct SolidSegment {
    sector: SectorId,
    a: Vec2,
    b: Vec2,
}

fn solid_segments(world: &World) -> Vec<SolidSegment> {
    world
        .segments
        .iter()
        .filter(|s| !s.is_portal())
        .map(|s| SolidSegment {
            sector: s.sector,
            a: s.p,
            b: s.b,
        })
        .collect()
}

/// Boundary lines joining an owner segment to a visitor segment. Endpoints
/// are crossed over when the two segments face opposite ways so the lines
/// bound the region between them instead of crossing it.
fn boundary_lines(oseg: &SectorSegment, vseg: &SectorSegment) -> ((Vec2, Vec2), (Vec2, Vec2)) {
    if oseg.normal.dot(vseg.normal) >= 0.0 {
        ((oseg.p, vseg.p), (oseg.b, vseg.b))
    } else {
        ((oseg.p, vseg.b), (oseg.b, vseg.p))
    }
}

/// True if every pair of segments between `owner` and `visitor` is cut by a
/// single solid wall of some other sector.
fn occluded_by(world: &World, solids: &[SolidSegment], owner: SectorId, visitor: SectorId) -> bool {
    for vseg in world.sector_segments(visitor) {
        for oseg in world.sector_segments(owner) {
            if oseg.matches(vseg.p, vseg.b) {
                continue;
            }
            let (l1, l2) = boundary_lines(oseg, vseg);
            let blocked = solids.iter().any(|s| {
                s.sector != owner
                    && s.sector != visitor
                    && intersect_segments(s.a, s.b, l1.0, l1.1).is_some()
                    && intersect_segments(s.a, s.b, l2.0, l2.1).is_some()
            });
            if !blocked {
                return false;
            }
        }
    }
    true
}

/// Sectors reachable from `id` through portals without being fully
/// occluded. Always contains `id`.
pub fn build_pvs(world: &World, id: SectorId) -> HashSet<SectorId> {
    let solids = solid_segments(world);
    let (min_z, max_z) = world.sector(id).pvs_extent();
    let mut pvs = HashSet::new();
    pvs.insert(id);

    let mut stack = vec![id];
    while let Some(visitor) = stack.pop() {
        for seg in world.sector_segments(visitor) {
            let Some(adj) = seg.adjacent_sector else {
                continue;
            };
            if pvs.contains(&adj) {
                continue;
            }
            let (adj_min, adj_max) = world.sector(adj).pvs_extent();
            if adj_min >= max_z || adj_max <= min_z {
                continue;
            }
            if occluded_by(world, &solids, id, adj) {
                continue;
            }
            pvs.insert(adj);
            stack.push(adj);
        }
    }
    pvs
}

/// Sectors reachable through open portals that all lie on the same side of
/// the first portal crossed.
pub fn build_entity_pvs(world: &World, id: SectorId) -> HashSet<SectorId> {
    let mut pvs = HashSet::new();
    pvs.insert(id);
    let mut stack = vec![(id, Vec2::ZERO)];
    while let Some((visitor, normal)) = stack.pop() {
        for seg in world.sector_segments(visitor) {
            let (Some(adj), Some(adj_seg)) = (seg.adjacent_sector, seg.adjacent_segment) else {
                continue;
            };
            if seg.portal_has_material || world.segment(adj_seg).portal_has_material {
                continue;
            }
            let correct_side = normal.is_zero() || normal.dot(seg.normal) >= 0.0;
            if !correct_side || !pvs.insert(adj) {
                continue;
            }
            let next = if normal.is_zero() { seg.normal } else { normal };
            stack.push((adj, next));
        }
    }
    pvs
}

/// Light-carrying bodies inside the visual PVS of `id`.
pub fn build_pvl(world: &World, id: SectorId) -> Vec<BodyId> {
    let sector = world.sector(id);
    let mut sectors: Vec<SectorId> = sector.pvs.iter().copied().collect();
    sectors.sort_unstable();
    let mut pvl: Vec<BodyId> = sectors
        .into_iter()
        .flat_map(|s| world.sector(s).bodies.iter().copied())
        .filter(|&b| world.body(b).light.is_some())
        .collect();
    pvl.sort_unstable();
    pvl
}
