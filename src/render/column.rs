//! Per-column ray state and the filtered light lookup shared by every
//! surface rasterizer.

use crate::config::ViewTables;
use crate::light::{LightQuery, LightSampler};
use crate::lightmap::{corner_hash, normal_hash};
use crate::material::Material;
use crate::math::{Vec2, Vec3, Vec4, intersect_segments_raw, xorshift64};
use crate::world::{SectorId, SegmentId, World};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Ray {
    pub start: Vec2,
    pub end: Vec2,
    pub delta: Vec2,
    pub angle: f64,
    pub cos: f64,
    pub sin: f64,
}

impl Ray {
    pub fn new(start: Vec2, angle: f64, length: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let end = start + Vec2::new(cos, sin) * length;
        Self {
            start,
            end,
            delta: end - start,
            angle,
            cos,
            sin,
        }
    }

    pub fn between(start: Vec2, end: Vec2) -> Self {
        let delta = end - start;
        let angle = delta.y.atan2(delta.x);
        let (sin, cos) = angle.sin_cos();
        Self {
            start,
            end,
            delta,
            angle,
            cos,
            sin,
        }
    }
}

/// Everything one screen column carries through the portal recursion. Each
/// portal level works on its own copy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Column {
    pub x: usize,
    /// Requested row when picking.
    pub y: i64,
    pub pick: bool,
    pub ray: Ray,
    /// View ray scaled by the column's perspective fix; `z` is set per row.
    pub ray_plane: Vec3,
    pub fix: f64,
    pub sector: SectorId,
    pub camera_z: f64,
    /// Screen row of the horizon, including pitch shear.
    pub horizon: i64,
    pub last_portal_distance: f64,
    pub depth: u32,
    /// Window this column may draw into, narrowed at each portal.
    pub edge_top: i64,
    pub edge_bottom: i64,

    pub segment: Option<SegmentId>,
    pub isect: Vec3,
    pub distance: f64,
    /// Fraction along the intersected segment.
    pub u: f64,
    pub top_z: f64,
    pub bottom_z: f64,
    pub projected_top: f64,
    pub projected_bottom: f64,
    pub projected_sector_top: f64,
    pub projected_sector_bottom: f64,
    pub clipped_top: i64,
    pub clipped_bottom: i64,
}

impl Column {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        view: &ViewTables,
        x: usize,
        origin: Vec2,
        yaw: f64,
        camera_z: f64,
        shear: f64,
        sector: SectorId,
        max_dist: f64,
    ) -> Self {
        let ray = Ray::new(origin, yaw + view.radians[x], max_dist);
        let fix = view.fix[x];
        Self {
            x,
            y: -1,
            pick: false,
            ray,
            ray_plane: Vec3::new(ray.cos * fix, ray.sin * fix, 0.0),
            fix,
            sector,
            camera_z,
            horizon: (view.height / 2) as i64 + shear.floor() as i64,
            last_portal_distance: 0.0,
            depth: 0,
            edge_top: 0,
            edge_bottom: view.height as i64,
            segment: None,
            isect: Vec3::ZERO,
            distance: max_dist,
            u: 0.0,
            top_z: 0.0,
            bottom_z: 0.0,
            projected_top: 0.0,
            projected_bottom: 0.0,
            projected_sector_top: 0.0,
            projected_sector_bottom: 0.0,
            clipped_top: 0,
            clipped_bottom: 0,
        }
    }

    pub fn set_ray(&mut self, ray: Ray) {
        self.ray = ray;
        self.ray_plane.x = ray.cos * self.fix;
        self.ray_plane.y = ray.sin * self.fix;
    }

    #[inline]
    pub fn project_z(&self, z: f64) -> f64 {
        z * self.fix / self.distance
    }

    /// Screen row for a projected height.
    #[inline]
    pub fn screen_row(&self, projected: f64) -> i64 {
        self.horizon - projected.floor() as i64
    }

    /// Intersects the ray with `a→b`. Segments facing away are skipped
    /// unless two-sided. With `check_dist`, only hits nearer than the
    /// current one and not before the last portal are taken.
    pub fn intersect(&mut self, a: Vec2, b: Vec2, normal: Vec2, two_sided: bool, check_dist: bool) -> bool {
        if !two_sided && self.ray.delta.dot(normal) > 0.0 {
            return false;
        }
        let Some((u, _)) = intersect_segments_raw(a, b, self.ray.start, self.ray.end) else {
            return false;
        };
        let hit = a + (b - a) * u;
        let dist = self.ray.start.dist(hit);
        if check_dist && (dist > self.distance || dist < self.last_portal_distance) {
            return false;
        }
        self.distance = dist;
        self.isect = hit.extend(self.isect.z);
        self.u = u;
        true
    }

    /// Projects the intersection's floor and ceiling and clips them to the
    /// column window.
    pub fn calc_screen(&mut self, world: &World) {
        self.projected_top = self.project_z(self.top_z - self.camera_z);
        self.projected_bottom = self.project_z(self.bottom_z - self.camera_z);
        if let Some(seg) = self.segment
            && world.segment(seg).wall_uv_ignore_slope
        {
            let sector = world.sector(self.sector);
            self.projected_sector_top = self.project_z(sector.top.z - self.camera_z);
            self.projected_sector_bottom = self.project_z(sector.bottom.z - self.camera_z);
        }
        let top = self.screen_row(self.projected_top);
        let bottom = self.screen_row(self.projected_bottom);
        self.clipped_top = clip(top, self.edge_top, self.edge_bottom);
        self.clipped_bottom = clip(bottom, self.edge_top, self.edge_bottom);
    }

    #[inline]
    pub fn picks(&self, start: i64, end: i64) -> bool {
        self.pick && self.y >= start && self.y < end
    }
}

/// Clamps `row` into `[lo, hi]`. Unlike `i64::clamp` an inverted range is
/// not a panic: `hi` wins.
#[inline]
pub(crate) fn clip(row: i64, lo: i64, hi: i64) -> i64 {
    row.max(lo).min(hi)
}

/// Light sampling for one column block. Besides the sampler it keeps the
/// last eight voxel corners looked up, plus one entry per screen row so the
/// next column can reuse a row's corners.
pub(crate) struct ColumnLight<'w> {
    pub sampler: LightSampler<'w>,
    filter_distance: f64,
    last_hash: u64,
    result: [Vec3; 8],
    row_hashes: Vec<u64>,
    row_results: Vec<[Vec3; 8]>,
}

impl<'w> ColumnLight<'w> {
    pub fn new(sampler: LightSampler<'w>, filter_distance: f64, height: usize) -> Self {
        Self {
            sampler,
            filter_distance,
            last_hash: 0,
            result: [Vec3::ZERO; 8],
            row_hashes: vec![0; height],
            row_results: vec![[Vec3::ZERO; 8]; height],
        }
    }

    /// Lights a material sample at `p`. Close surfaces blend the eight
    /// corners of the voxel around `p`; distant ones take the nearest corner.
    pub fn apply(&mut self, q: &LightQuery, material: &Material, sample: Vec4, p: Vec3, dist: f64) -> Vec4 {
        if material.lit.is_none() {
            return sample;
        }
        if dist > self.filter_distance {
            let hash = self.sampler.hash(q, p);
            let light = self.sampler.get(q, hash);
            return material.apply_lighting(sample, Some(light));
        }

        let lightmap = &self.sampler.world().sector(q.sector).lightmap;
        let grid = lightmap.grid();
        let m0 = lightmap.world_to_hash(p, normal_hash(q.normal));
        let a = lightmap.hash_to_world(m0);
        let dx = (p.x - a.x) / grid;
        let dy = (p.y - a.y) / grid;
        let dz = (p.z - a.z) / grid;

        // Corner hashes repeat across sectors, so the cache key includes the sector.
        let cache_hash = m0 ^ xorshift64(q.sector.0 as u64 + 1);
        if cache_hash != self.last_hash {
            let row = q.screen_y;
            if row < self.row_hashes.len() && self.row_hashes[row] == cache_hash {
                self.result = self.row_results[row];
            } else {
                for (i, r) in self.result.iter_mut().enumerate() {
                    *r = self.sampler.get(q, corner_hash(m0, i));
                }
                if row < self.row_hashes.len() {
                    self.row_hashes[row] = cache_hash;
                    self.row_results[row] = self.result;
                }
            }
            self.last_hash = cache_hash;
        }

        let r = &self.result;
        let lerp = |a: Vec3, b: Vec3, t: f64| a * (1.0 - t) + b * t;
        let c00 = lerp(r[0], r[4], dx);
        let c01 = lerp(r[1], r[5], dx);
        let c10 = lerp(r[2], r[6], dx);
        let c11 = lerp(r[3], r[7], dx);
        let c0 = lerp(c00, c10, dy);
        let c1 = lerp(c01, c11, dy);
        material.apply_lighting(sample, Some(lerp(c0, c1, dz)))
    }
}
