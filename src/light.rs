//! Diffuse light at lightmap voxel corners, with a portal-walking shadow
//! tracer between the sampled point and each light.

use crate::config::RenderConfig;
use crate::lightmap::{LightmapCell, normal_hash};
use crate::math::{
    Vec2, Vec3, Vec4, intersect_line_aabb, intersect_line_sphere, intersect_segment_3d, rng_decide,
    xorshift64,
};
use crate::render::Notices;
use crate::world::{
    Body, BodyId, InternalSegmentId, SectorId, SegmentId, ShadowMode, Surface, World,
};

/// Texel scale used when sampling occluder materials.
const OCCLUDER_SCALE: u32 = 64;
/// Coverage at which a translucent occluder counts as solid.
const OPAQUE_ALPHA: f64 = 0.99;

/// The surface being lit, so the tracer does not shadow it by itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LitSurface {
    #[default]
    None,
    Segment(SegmentId),
    Internal(InternalSegmentId),
}

/// Everything about a sample point besides its position.
#[derive(Clone, Copy, Debug)]
pub struct LightQuery {
    pub sector: SectorId,
    pub surface: LitSurface,
    pub normal: Vec3,
    /// Set when lighting a body: normals are ignored and the body never
    /// shadows itself.
    pub input_body: Option<BodyId>,
    pub screen_y: usize,
}

impl LightQuery {
    pub fn new(sector: SectorId, normal: Vec3) -> Self {
        Self {
            sector,
            surface: LitSurface::None,
            normal,
            input_body: None,
            screen_y: 0,
        }
    }
}

enum Crossing {
    /// A wall or floor/ceiling gap blocks the segment.
    Blocked,
    /// The light sits on the crossed portal.
    Reached,
    Portal { segment: SegmentId, next: SectorId },
    /// Nothing crossed: the light is in this sector.
    Inside,
}

pub struct LightSampler<'w> {
    world: &'w World,
    cfg: &'w RenderConfig,
    frame: u64,
    xor_seed: u64,
    visited: Vec<SectorId>,
    filter: Vec4,
    hit: Vec3,
    light_world: Vec3,
    prev_dist2: f64,
    hit_dist2: f64,
    max_dist2: f64,
    notices: Option<&'w Notices>,
}

impl<'w> LightSampler<'w> {
    pub fn new(world: &'w World, cfg: &'w RenderConfig, frame: u64) -> Self {
        Self {
            world,
            cfg,
            frame,
            xor_seed: xorshift64(frame ^ 0x9E37_79B9_7F4A_7C15),
            visited: Vec::with_capacity(16),
            filter: Vec4::TRANSPARENT,
            hit: Vec3::ZERO,
            light_world: Vec3::ZERO,
            prev_dist2: 0.0,
            hit_dist2: 0.0,
            max_dist2: 0.0,
            notices: None,
        }
    }

    /// Routes tracer diagnostics into `notices` as well as the log.
    pub fn with_notices(mut self, notices: &'w Notices) -> Self {
        self.notices = Some(notices);
        self
    }

    #[inline]
    pub fn world(&self) -> &'w World {
        self.world
    }

    /// Voxel hash of the corner at or below `p` for this query's surface.
    pub fn hash(&self, q: &LightQuery, p: Vec3) -> u64 {
        self.world
            .sector(q.sector)
            .lightmap
            .world_to_hash(p, normal_hash(q.normal))
    }

    /// Cached light at a voxel corner. Stale entries are refreshed with
    /// probability `1 / lightmap_refresh_dither` per call so refreshes spread
    /// over frames.
    pub fn get(&mut self, q: &LightQuery, hash: u64) -> Vec3 {
        let sector = self.world.sector(q.sector);
        let lightmap = &sector.lightmap;
        if let Some(cell) = lightmap.load(hash) {
            let r = xorshift64(self.xor_seed ^ hash ^ q.screen_y as u64);
            if cell.is_fresh(self.frame, self.cfg.max_lightmap_age)
                || !rng_decide(r, self.cfg.lightmap_refresh_dither)
            {
                return cell.light();
            }
        }
        let mut p = lightmap.hash_to_world(hash);
        let (fz, cz) = sector.z_at(p.xy());
        p.z = p.z.max(fz).min(cz);
        let cell = LightmapCell::new(self.calculate(q, p), self.frame);
        lightmap.store(hash, cell);
        cell.light()
    }

    /// Sums the contribution of every light in the sector's light list.
    pub fn calculate(&mut self, q: &LightQuery, p: Vec3) -> Vec3 {
        let world = self.world;
        let mut out = Vec3::ZERO;
        for &id in &world.sector(q.sector).pvl {
            let body = world.body(id);
            let Some(light) = body.light else {
                continue;
            };
            self.light_world = body.pos - p;
            self.max_dist2 = self.light_world.length2();
            self.filter = Vec4::TRANSPARENT;

            let mut attenuation = 1.0;
            if self.max_dist2 > 0.0 {
                if light.attenuation > 0.0 {
                    let dist = self.max_dist2.sqrt();
                    attenuation = light.strength
                        / (dist * 2.0 / body.size.x + 1.0).powf(light.attenuation);
                }
                if attenuation < self.cfg.light_attenuation_epsilon {
                    continue;
                }
                // Points inside the light's radius skip the shadow trace.
                let outside = self.max_dist2 > body.size.x * body.size.x * 0.25;
                if outside && !self.light_visible(q, p, body) {
                    continue;
                }
            }

            let diffuse = if q.input_body.is_some() || self.max_dist2 == 0.0 {
                attenuation
            } else {
                q.normal.dot(self.light_world * (1.0 / self.max_dist2.sqrt())) * attenuation
            };
            if diffuse < 0.0 {
                continue;
            }
            if self.filter.a == 0.0 {
                out += light.diffuse * diffuse;
            } else {
                let a = 1.0 - self.filter.a;
                out += light.diffuse * (diffuse * a) + self.filter.rgb();
            }
        }
        out
    }

    /// Whether `light` reaches `p`. Points near a portal also try the walk
    /// from the neighboring sector, so voxels straddling the boundary do not
    /// go dark.
    pub fn light_visible(&mut self, q: &LightQuery, p: Vec3, light: &Body) -> bool {
        let world = self.world;
        let sector = world.sector(q.sector);
        if sector.no_shadows {
            return true;
        }
        self.light_world = light.pos - p;
        self.max_dist2 = self.light_world.length2();
        if self.visible_from_sector(q, p, light, q.sector) {
            return true;
        }

        let grid = world.light_grid;
        for seg in world.sector_segments(q.sector) {
            if !seg.is_portal() || seg.portal_has_material || seg.portal_teleports {
                continue;
            }
            let Some(adj_id) = seg.adjacent_segment else {
                continue;
            };
            let adj = world.segment(adj_id);
            if adj.distance2(p.xy()) >= grid * grid * 2.0 {
                continue;
            }
            let (fz, cz) = world.sector(adj.sector).z_at(p.xy());
            if p.z - cz > grid || fz - p.z > grid {
                continue;
            }
            if self.visible_from_sector(q, p, light, adj.sector) {
                return true;
            }
        }
        false
    }

    fn visible_from_sector(
        &mut self,
        q: &LightQuery,
        p: Vec3,
        light: &Body,
        start: SectorId,
    ) -> bool {
        let world = self.world;
        self.filter = Vec4::TRANSPARENT;
        self.visited.clear();
        self.prev_dist2 = -1.0;
        let mut depth = 0u32;
        let mut reached = false;
        let mut sector = start;
        loop {
            self.hit_dist2 = self.max_dist2;
            match self.intersect(q, sector, p, light) {
                Crossing::Blocked => return false,
                Crossing::Reached => {
                    reached = true;
                    self.visited.push(sector);
                    break;
                }
                Crossing::Inside => {
                    self.visited.push(sector);
                    break;
                }
                Crossing::Portal { segment, next } => {
                    let seg = world.segment(segment);
                    if seg.portal_has_material {
                        let (fz, cz) = world.sector(sector).z_at(self.hit.xy());
                        let nu = self.hit.xy().dist(seg.p) / seg.length;
                        let nv = (cz - self.hit.z) / (cz - fz);
                        let sample = self.sample_occluder(&seg.mid, nu, nv);
                        if sample.a >= OPAQUE_ALPHA {
                            return false;
                        }
                        self.filter.blend(sample, 1.0);
                    }
                    self.prev_dist2 = self.hit_dist2;
                    depth += 1;
                    if depth > self.cfg.max_portal_depth {
                        let msg = format!(
                            "Shadow trace from sector {} to light {} exceeded portal depth {}",
                            world.sector(start).name,
                            light.name,
                            self.cfg.max_portal_depth
                        );
                        match self.notices {
                            Some(notices) => notices.push(msg),
                            None => log::warn!("{msg}"),
                        }
                        return false;
                    }
                    self.visited.push(sector);
                    sector = next;
                }
            }
        }

        if !reached
            && let Some(light_sector) = light.sector
            && self.visited.last() != Some(&light_sector)
        {
            return false;
        }

        let light_pos = light.pos;
        for i in 0..self.visited.len() {
            let visited = world.sector(self.visited[i]);
            for &iid in &visited.internal_segments {
                if q.surface == LitSurface::Internal(iid) {
                    continue;
                }
                let seg = world.internal_segment(iid);
                let Some(hit) = intersect_segment_3d(seg.a, seg.b, p, light_pos) else {
                    continue;
                };
                if hit.z < seg.bottom || hit.z > seg.top {
                    continue;
                }
                let nu = hit.xy().dist(seg.a) / seg.length;
                let nv = (seg.top - hit.z) / (seg.top - seg.bottom);
                let sample = self.sample_occluder(&seg.surface, nu, nv);
                if sample.a >= OPAQUE_ALPHA {
                    return false;
                }
                self.filter.blend(sample, 1.0);
            }
            for &bid in &visited.bodies {
                if bid == light.id || Some(bid) == q.input_body {
                    continue;
                }
                if self.body_occludes(world.body(bid), p, light_pos) {
                    return false;
                }
            }
        }
        true
    }

    fn body_occludes(&self, body: &Body, p: Vec3, light_pos: Vec3) -> bool {
        match body.shadow {
            ShadowMode::None => false,
            ShadowMode::Image => {
                let view = (light_pos - p).normalized();
                let (a, b) = body.billboard(view.xy());
                let Some(hit) = intersect_segment_3d(a, b, p, light_pos) else {
                    return false;
                };
                let nu = hit.xy().dist(a) / body.size.x;
                let nv = (body.top() - hit.z) / body.size.y;
                if !(0.0..=1.0).contains(&nv) {
                    return false;
                }
                let alpha = match body.material {
                    Some(m) => self.world.material(m).sample_alpha(nu, nv, OCCLUDER_SCALE, OCCLUDER_SCALE),
                    None => 1.0,
                };
                alpha * body.opacity > 0.5
            }
            ShadowMode::Sphere => intersect_line_sphere(p, light_pos, body.pos, body.size.x * 0.5),
            ShadowMode::Aabb => {
                let ext = Vec3::new(body.size.x, body.size.x, body.size.y);
                intersect_line_aabb(p, light_pos, body.pos, ext)
            }
        }
    }

    /// Premultiplied occluder color. Surfaces without a material block fully.
    fn sample_occluder(&self, surface: &Surface, nu: f64, nv: f64) -> Vec4 {
        let Some(id) = surface.material else {
            return Vec4::opaque(0.5, 0.0, 0.5);
        };
        let material = self.world.material(id);
        let uv = surface.transform.project(Vec2::new(nu, nv));
        let sample = material.sample(uv.x, uv.y, OCCLUDER_SCALE, OCCLUDER_SCALE);
        material.apply_lighting(sample, None)
    }

    /// Finds the nearest portal the point→light segment leaves `sector`
    /// through, beyond the previous crossing.
    fn intersect(&mut self, q: &LightQuery, sector_id: SectorId, p: Vec3, light: &Body) -> Crossing {
        let world = self.world;
        let sector = world.sector(sector_id);
        let mut found = Crossing::Inside;
        for seg in world.sector_segments(sector_id) {
            if q.surface == LitSurface::Segment(seg.id) {
                continue;
            }
            if self.light_world.x * seg.normal.x + self.light_world.y * seg.normal.y > 0.0 {
                continue;
            }
            let Some(test) = intersect_segment_3d(seg.p, seg.b, p, light.pos) else {
                continue;
            };
            let (Some(next), Some(_)) = (seg.adjacent_sector, seg.adjacent_segment) else {
                return Crossing::Blocked;
            };
            if seg.portal_teleports {
                return Crossing::Blocked;
            }
            if test.z < sector.min.z || test.z > sector.max.z {
                return Crossing::Blocked;
            }
            let (fz, cz) = sector.z_at(test.xy());
            if test.z < fz || test.z > cz {
                return Crossing::Blocked;
            }
            let (afz, acz) = world.sector(next).z_at(test.xy());
            if test.z < afz || test.z > acz {
                return Crossing::Blocked;
            }

            let dist2 = test.dist2(p);
            if (dist2 - self.max_dist2).abs() < light.size.x * 0.5 {
                return Crossing::Reached;
            }
            if dist2 >= self.hit_dist2 || dist2 < self.prev_dist2 {
                continue;
            }
            self.hit_dist2 = dist2;
            self.hit = test;
            found = Crossing::Portal {
                segment: seg.id,
                next,
            };
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::world::{Light, WorldBuilder};

    fn room_with_light(light_at: Vec3) -> (World, SectorId, BodyId) {
        let mut b = WorldBuilder::new();
        let s = b.add_sector(
            "room",
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(40.0, 0.0),
                Vec2::new(40.0, 40.0),
                Vec2::new(0.0, 40.0),
            ],
            0.0,
            32.0,
        );
        let lamp = b.add_body("lamp", light_at, Vec2::new(4.0, 4.0));
        b.body_mut(lamp).light = Some(Light {
            diffuse: Vec3::new(1.0, 1.0, 1.0),
            strength: 2.0,
            attenuation: 1.0,
        });
        (b.build().unwrap(), s, lamp)
    }

    #[test]
    fn point_on_the_light_is_lit_at_full_strength() {
        let (world, s, _) = room_with_light(Vec3::new(20.0, 20.0, 16.0));
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let q = LightQuery {
            input_body: Some(BodyId(99)),
            ..LightQuery::new(s, Vec3::ZERO)
        };
        let out = ls.calculate(&q, Vec3::new(20.0, 20.0, 16.0));
        assert_eq!(out, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn facing_away_surfaces_get_nothing() {
        let (world, s, _) = room_with_light(Vec3::new(20.0, 20.0, 16.0));
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        // floor point whose normal points down, away from the light
        let q = LightQuery::new(s, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ls.calculate(&q, Vec3::new(10.0, 10.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn pillar_casts_a_shadow() {
        let mut b = WorldBuilder::new();
        let s = b.add_sector(
            "room",
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(40.0, 0.0),
                Vec2::new(40.0, 40.0),
                Vec2::new(0.0, 40.0),
            ],
            0.0,
            32.0,
        );
        b.add_internal_segment(Vec2::new(10.0, 15.0), Vec2::new(10.0, 25.0), 0.0, 32.0);
        let lamp = b.add_body("lamp", Vec3::new(20.0, 20.0, 16.0), Vec2::new(2.0, 2.0));
        b.body_mut(lamp).light = Some(Light {
            attenuation: 0.0,
            ..Light::default()
        });
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let q = LightQuery::new(s, Vec3::new(1.0, 0.0, 0.0));
        let shadowed = ls.calculate(&q, Vec3::new(2.0, 20.0, 16.0));
        let lit = ls.calculate(&q, Vec3::new(2.0, 5.0, 16.0));
        assert_eq!(shadowed, Vec3::ZERO);
        assert!(lit.x > 0.0);
    }

    #[test]
    fn cached_voxels_are_returned_unchanged() {
        let (world, s, _) = room_with_light(Vec3::new(20.0, 20.0, 16.0));
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 5);
        let q = LightQuery::new(s, Vec3::new(0.0, 0.0, 1.0));
        let h = ls.hash(&q, Vec3::new(13.0, 9.0, 0.5));
        let first = ls.get(&q, h);
        let second = ls.get(&q, h);
        assert_eq!(first.x.to_bits(), second.x.to_bits());
        assert_eq!(first.y.to_bits(), second.y.to_bits());
        assert_eq!(first.z.to_bits(), second.z.to_bits());
        assert!(first.x > 0.0);
    }

    fn rect(x0: f64, x1: f64) -> [Vec2; 4] {
        [
            Vec2::new(x0, 0.0),
            Vec2::new(x1, 0.0),
            Vec2::new(x1, 40.0),
            Vec2::new(x0, 40.0),
        ]
    }

    fn flat_light() -> Option<Light> {
        Some(Light {
            attenuation: 0.0,
            ..Light::default()
        })
    }

    /// Rooms `a` (x 0..40) and `b` (x 40..80) sharing a portal, with an
    /// unattenuated lamp in `b`.
    fn two_rooms(b_floor: f64) -> (WorldBuilder, SectorId, SectorId) {
        let mut b = WorldBuilder::new();
        let a = b.add_sector("a", &rect(0.0, 40.0), 0.0, 32.0);
        let n = b.add_sector("b", &rect(40.0, 80.0), b_floor, 32.0);
        let lamp = b.add_body("lamp", Vec3::new(60.0, 20.0, 24.0), Vec2::new(2.0, 2.0));
        b.body_mut(lamp).light = flat_light();
        (b, a, n)
    }

    fn facing_east(s: SectorId) -> LightQuery {
        LightQuery::new(s, Vec3::new(1.0, 0.0, 0.0))
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        a.dist2(b) < 1e-12
    }

    #[test]
    fn light_passes_through_an_open_portal() {
        let (b, a, _) = two_rooms(0.0);
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let out = ls.calculate(&facing_east(a), Vec3::new(10.0, 20.0, 24.0));
        assert!(close(out, Vec3::new(1.0, 1.0, 1.0)), "{out:?}");
    }

    #[test]
    fn raised_floor_of_the_neighbor_blocks_low_points() {
        let (b, a, _) = two_rooms(20.0);
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        // crosses the portal at z 16, under b's floor
        assert_eq!(ls.calculate(&facing_east(a), Vec3::new(10.0, 20.0, 4.0)), Vec3::ZERO);
        // crosses at z 22.4
        assert!(ls.calculate(&facing_east(a), Vec3::new(10.0, 20.0, 20.0)).x > 0.0);
    }

    #[test]
    fn translucent_portal_tints_the_light() {
        let (mut b, a, _) = two_rooms(0.0);
        let glass = b.add_material(Material::solid("glass", Vec4::new(0.25, 0.0, 0.0, 0.5)).unlit());
        let east = b.segment_of(a, 1);
        b.segment_mut(east).portal_has_material = true;
        b.segment_mut(east).mid = Surface::with_material(glass);
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let out = ls.calculate(&facing_east(a), Vec3::new(10.0, 20.0, 24.0));
        assert!(close(out, Vec3::new(0.75, 0.5, 0.5)), "{out:?}");
    }

    #[test]
    fn running_out_of_portal_depth_is_a_notice() {
        let (b, a, _) = two_rooms(0.0);
        let world = b.build().unwrap();
        let cfg = RenderConfig {
            max_portal_depth: 0,
            ..RenderConfig::default()
        };
        let notices = Notices::new();
        let mut ls = LightSampler::new(&world, &cfg, 1).with_notices(&notices);
        assert_eq!(ls.calculate(&facing_east(a), Vec3::new(10.0, 20.0, 24.0)), Vec3::ZERO);
        let all = notices.drain();
        assert_eq!(all.len(), 1);
        assert!(all[0].contains("exceeded portal depth 0"), "{all:?}");
    }

    #[test]
    fn voxel_corner_past_a_portal_sees_the_light_from_the_neighbor() {
        let (b, a, _) = two_rooms(0.0);
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        // the corner belongs to a's lightmap but lies half a unit inside b
        let out = ls.calculate(&facing_east(a), Vec3::new(40.5, 20.0, 24.0));
        assert!(close(out, Vec3::new(1.0, 1.0, 1.0)), "{out:?}");
    }

    /// Room x 0..100 with a lamp at (80, 20, 32); samples at (10, 20, 32).
    fn long_room() -> (WorldBuilder, SectorId) {
        let mut b = WorldBuilder::new();
        let s = b.add_sector("room", &rect(0.0, 100.0), 0.0, 64.0);
        let lamp = b.add_body("lamp", Vec3::new(80.0, 20.0, 32.0), Vec2::new(2.0, 2.0));
        b.body_mut(lamp).light = flat_light();
        (b, s)
    }

    #[test]
    fn stacked_translucent_panes_never_subtract_light() {
        let (mut b, s) = long_room();
        let smoke = b.add_material(Material::solid("smoke", Vec4::new(0.0, 0.0, 0.0, 0.6)).unlit());
        for x in [30.0, 50.0] {
            let pane = b.add_internal_segment(Vec2::new(x, 10.0), Vec2::new(x, 30.0), 0.0, 64.0);
            b.internal_segment_mut(pane).surface = Surface::with_material(smoke);
        }
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let out = ls.calculate(&facing_east(s), Vec3::new(10.0, 20.0, 32.0));
        // two 0.6 panes pass 0.4 * 0.4 of the light
        assert!((out.x - 0.16).abs() < 1e-9, "{out:?}");
    }

    #[test]
    fn solid_body_shapes_cast_shadows() {
        for (mode, shadowed) in [
            (ShadowMode::None, false),
            (ShadowMode::Sphere, true),
            (ShadowMode::Aabb, true),
            (ShadowMode::Image, true),
        ] {
            let (mut b, s) = long_room();
            let boulder = b.add_body("boulder", Vec3::new(45.0, 20.0, 32.0), Vec2::new(8.0, 8.0));
            b.body_mut(boulder).shadow = mode;
            let world = b.build().unwrap();
            let cfg = RenderConfig::default();
            let mut ls = LightSampler::new(&world, &cfg, 1);
            let out = ls.calculate(&facing_east(s), Vec3::new(10.0, 20.0, 32.0));
            assert_eq!(out == Vec3::ZERO, shadowed, "{mode:?}: {out:?}");
        }
    }

    #[test]
    fn strength_applies_inside_the_light_radius() {
        let mut b = WorldBuilder::new();
        let s = b.add_sector("room", &rect(0.0, 40.0), 0.0, 32.0);
        let lamp = b.add_body("lamp", Vec3::new(20.0, 20.0, 16.0), Vec2::new(8.0, 8.0));
        b.body_mut(lamp).light = Some(Light {
            strength: 5.0,
            attenuation: 1.0,
            ..Light::default()
        });
        let world = b.build().unwrap();
        let cfg = RenderConfig::default();
        let mut ls = LightSampler::new(&world, &cfg, 1);
        let q = LightQuery {
            input_body: Some(BodyId(99)),
            ..LightQuery::new(s, Vec3::ZERO)
        };
        let inside = ls.calculate(&q, Vec3::new(23.9, 20.0, 16.0));
        let outside = ls.calculate(&q, Vec3::new(24.1, 20.0, 16.0));
        assert!((inside.x - 5.0 / 1.975).abs() < 1e-9, "{inside:?}");
        assert!(inside.x > outside.x);
    }
}
