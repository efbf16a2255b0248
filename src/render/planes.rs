//! Floors and ceilings. Every row is intersected with the actual plane so
//! sloped sectors need no special casing.

use super::Block;
use super::column::Column;
use super::pick::{PickResult, Selectable, SurfaceKind};
use crate::light::LightQuery;
use crate::material::Material;
use crate::math::{INTERSECT_EPSILON, Vec2, Vec3};
use crate::world::{PlaneKind, SectorPlane, World};

/// Where the view ray through screen row `y` meets `plane`, and the 2D
/// distance to that point. `None` when the plane is behind the eye, parallel
/// to the ray, or farther than the wall the column hit.
pub(super) fn plane_point(
    world: &World,
    col: &Column,
    plane: &SectorPlane,
    y: i64,
) -> Option<(Vec3, f64)> {
    let sector = world.sector(col.sector);
    let p0 = world.segment(*sector.segments.first()?).p;
    let delta = (p0 - col.ray.start).extend(plane.z - col.camera_z);
    let rp = Vec3::new(col.ray_plane.x, col.ray_plane.y, (col.horizon - y) as f64);
    let denom = rp.dot(plane.normal);
    if denom == 0.0 {
        return None;
    }
    let t = delta.dot(plane.normal) / denom;
    if !t.is_finite() || t <= 0.0 {
        return None;
    }
    let xy = col.ray.start + rp.xy() * t;
    let dist2 = col.ray.start.dist2(xy);
    if dist2 > col.distance * col.distance + INTERSECT_EPSILON {
        return None;
    }
    let z = if plane.normal.z.abs() == 1.0 {
        plane.z
    } else {
        col.camera_z + rp.z * t
    };
    Some((xy.extend(z), dist2.sqrt()))
}

impl Block<'_> {
    /// Ceiling above the clipped wall top, or floor below the clipped bottom.
    pub(super) fn render_plane(&mut self, col: &Column, kind: PlaneKind) {
        let world = self.frame.world;
        let sector = world.sector(col.sector);
        let plane = sector.plane(kind);
        let (start, end, surface) = match kind {
            PlaneKind::Top => (col.edge_top, col.clipped_top, SurfaceKind::Ceiling),
            PlaneKind::Bottom => (col.clipped_bottom, col.edge_bottom, SurfaceKind::Floor),
        };

        if col.pick {
            if col.picks(start, end) {
                let mut r = PickResult::new(Selectable::Sector(sector.id), surface);
                if let Some((p, _)) = plane_point(world, col, plane, col.y) {
                    r = r.at(p, plane.normal);
                }
                self.picked.push(r);
            }
            return;
        }

        let Some(material) = plane.surface.material.map(|m| world.material(m)) else {
            return;
        };
        let transform = plane.surface.transform;
        let size = Vec2::new(sector.max.x - sector.min.x, sector.max.y - sector.min.y);
        let threshold = self.frame.cfg.zwrite_alpha_threshold;
        let height = self.frame.view.height;
        let mut q = LightQuery::new(sector.id, plane.normal);

        for y in start..end {
            let Some((p, dist)) = plane_point(world, col, plane, y) else {
                continue;
            };
            if dist > self.depth_at(col.x, y) {
                continue;
            }
            let scale = size * (col.fix / dist.max(INTERSECT_EPSILON));
            let (scale_w, scale_h) = (scale.x.abs() as u32, scale.y.abs() as u32);

            let color = if material.is_sky() {
                let uv = Material::sky_uv(col.ray.angle, y as usize, height);
                material.sample(uv.x, uv.y, scale_w, scale_h)
            } else {
                let nu = if size.x > 0.0 { (p.x - sector.min.x) / size.x } else { 0.0 };
                let nv = if size.y > 0.0 { (p.y - sector.min.y) / size.y } else { 0.0 };
                let uv = transform.project(Vec2::new(nu, nv));
                let sample = material.sample(uv.x, uv.y, scale_w, scale_h);
                q.screen_y = y as usize;
                self.light.apply(&q, material, sample, p, dist)
            };
            self.put(col.x, y, color, dist, color.a > threshold);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RenderConfig, ViewTables};
    use crate::world::WorldBuilder;

    fn room() -> World {
        room_with_floor(None)
    }

    fn room_with_floor(normal: Option<Vec3>) -> World {
        let mut b = WorldBuilder::new();
        let s = b.add_sector(
            "room",
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(64.0, 0.0),
                Vec2::new(64.0, 64.0),
                Vec2::new(0.0, 64.0),
            ],
            0.0,
            32.0,
        );
        if let Some(n) = normal {
            b.sector_mut(s).bottom.normal = n;
        }
        b.build().unwrap()
    }

    fn column() -> Column {
        let cfg = RenderConfig {
            width: 64,
            height: 48,
            ..RenderConfig::default()
        };
        let view = ViewTables::new(&cfg);
        let mut col = Column::new(
            &view,
            32,
            Vec2::new(8.0, 32.0),
            0.0,
            16.0,
            0.0,
            crate::world::SectorId(0),
            cfg.max_view_distance,
        );
        col.distance = 56.0;
        col
    }

    #[test]
    fn flat_floor_hits_exact_height() {
        let world = room();
        let col = column();
        let floor = &world.sector(col.sector).bottom;
        let (p, dist) = plane_point(&world, &col, floor, 47).unwrap();
        assert_eq!(p.z, 0.0);
        assert!(dist > 0.0 && dist <= 56.0);
        // rows above the horizon never see the floor
        assert!(plane_point(&world, &col, floor, 10).is_none());
    }

    #[test]
    fn horizon_row_is_parallel() {
        let world = room();
        let col = column();
        let floor = &world.sector(col.sector).bottom;
        assert!(plane_point(&world, &col, floor, col.horizon).is_none());
    }

    #[test]
    fn points_past_the_wall_are_rejected() {
        let world = room();
        let mut col = column();
        let ceil = &world.sector(col.sector).top;
        // one row off the horizon reaches further than the wall
        assert!(plane_point(&world, &col, ceil, col.horizon - 1).is_none());
        col.distance = 1.0e6;
        assert!(plane_point(&world, &col, ceil, col.horizon - 1).is_some());
    }

    #[test]
    fn sloped_floor_points_lie_on_the_plane() {
        // rises half a unit per unit of x
        let world = room_with_floor(Some(Vec3::new(-1.0, 0.0, 2.0).normalized()));
        let col = column();
        let floor = &world.sector(col.sector).bottom;
        let mut last_x = f64::INFINITY;
        for y in 30..48 {
            let (p, dist) = plane_point(&world, &col, floor, y).unwrap();
            assert!((p.z - floor.z_at(p.xy())).abs() < 1e-9, "row {y}: {p:?}");
            assert!((p.z - p.x * 0.5).abs() < 1e-9);
            assert!(dist <= col.distance);
            // lower rows land closer to the eye
            assert!(p.x < last_x);
            last_x = p.x;
        }
    }
}
