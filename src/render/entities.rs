//! Internal segments and body billboards, drawn after a sector's walls.

use super::Block;
use super::column::{Column, clip};
use super::pick::{PickResult, Selectable, SurfaceKind};
use super::wall::Span;
use crate::camera::Camera;
use crate::light::{LightQuery, LitSurface};
use crate::math::Vec3;
use crate::world::{BodyId, InternalSegmentId};

/// Something to draw in the current sector, keyed by squared distance.
#[derive(Clone, Copy, Debug)]
pub(super) enum Drawable {
    Internal(InternalSegmentId, f64),
    Body(BodyId, f64),
}

impl Drawable {
    #[inline]
    fn dist2(&self) -> f64 {
        match *self {
            Drawable::Internal(_, d) | Drawable::Body(_, d) => d,
        }
    }
}

impl Block<'_> {
    /// Draws far to near so translucent entities blend in order. Picks are
    /// reported near to far.
    pub(super) fn render_entities(&mut self, col: &Column) {
        let world = self.frame.world;
        let sector = world.sector(col.sector);
        if sector.bodies.is_empty() && sector.internal_segments.is_empty() {
            return;
        }

        // One scratch list per portal level; deeper levels run while this
        // one is still being iterated.
        let depth = col.depth as usize;
        if self.entities.len() <= depth {
            self.entities.resize_with(depth + 1, Vec::new);
        }
        let mut list = std::mem::take(&mut self.entities[depth]);
        list.clear();

        for &id in &sector.bodies {
            let body = world.body(id);
            list.push(Drawable::Body(id, col.ray.start.dist2(body.pos.xy())));
        }
        for &id in &sector.internal_segments {
            let seg = world.internal_segment(id);
            let mut hit = *col;
            if hit.intersect(seg.a, seg.b, seg.normal, seg.two_sided, false)
                && hit.distance <= col.distance
            {
                list.push(Drawable::Internal(id, hit.distance * hit.distance));
            }
        }

        list.sort_by(|a, b| b.dist2().total_cmp(&a.dist2()));
        if col.pick {
            list.reverse();
        }
        for d in &list {
            match *d {
                Drawable::Internal(id, _) => self.render_internal_segment(col, id),
                Drawable::Body(id, _) => self.render_body(col, id),
            }
        }
        self.entities[depth] = list;
    }

    fn render_internal_segment(&mut self, col: &Column, id: InternalSegmentId) {
        let world = self.frame.world;
        let seg = world.internal_segment(id);
        let mut c = *col;
        if !c.intersect(seg.a, seg.b, seg.normal, seg.two_sided, false) {
            return;
        }
        c.segment = None;
        c.top_z = seg.top;
        c.bottom_z = seg.bottom;
        c.calc_screen(world);

        let v_top = c.horizon as f64 - c.projected_top;
        let dv = c.projected_top - c.projected_bottom;
        let mut normal = seg.normal;
        if c.ray.delta.dot(normal) > 0.0 {
            normal = -normal;
        }

        if c.pick {
            let picked = Selectable::InternalSegment(id);
            if c.picks(c.clipped_top, c.clipped_bottom)
                && !self.picked.iter().any(|r| r.object == picked)
            {
                let t = if dv == 0.0 { 0.0 } else { (c.y as f64 - v_top) / dv };
                let z = c.top_z + (c.bottom_z - c.top_z) * t;
                self.picked.push(
                    PickResult::new(picked, SurfaceKind::InternalSegment)
                        .at(Vec3::new(c.isect.x, c.isect.y, z), normal.extend(0.0)),
                );
            }
            return;
        }

        let span = Span {
            surface: &seg.surface,
            start: c.clipped_top,
            end: c.clipped_bottom,
            v_top,
            dv,
            tex_v_top: v_top,
            tex_dv: dv,
            z_top: seg.top,
            z_bottom: seg.bottom,
            origin: seg.a,
            length: seg.length,
            flip_u: false,
            query: LightQuery {
                surface: LitSurface::Internal(id),
                ..LightQuery::new(col.sector, normal.extend(0.0))
            },
            always_write_z: false,
        };
        self.wall_span(&c, &span);
    }

    /// Camera-facing billboard. Lit once at its center.
    fn render_body(&mut self, col: &Column, id: BodyId) {
        let world = self.frame.world;
        let view = self.frame.view;
        let body = world.body(id);

        // Screen position relative to the view's yaw, not this column's ray.
        // Past a teleport the ray carries the transformed eye.
        let eye = Camera::new(col.ray.start, col.ray.angle - view.radians[col.x], col.camera_z);
        let cs = eye.world_to_camera(body.pos.xy());
        if cs.y <= 0.0 {
            return;
        }
        let xc = view.width as f64 * 0.5 + view.cam_to_proj * cs.x / cs.y;
        let dist = cs.length();
        let xi = (xc.floor().max(0.0) as usize).min(view.width - 1);
        let depth_scale = view.fix[xi] / dist;
        let x_scale = depth_scale * body.size.x;
        if x_scale <= 0.0 {
            return;
        }
        let u = 0.5 + (col.x as f64 - xc) / x_scale;
        if !(0.0..1.0).contains(&u) {
            return;
        }

        let projected_top = (body.top() - col.camera_z) * depth_scale;
        let projected_bottom = (body.bottom() - col.camera_z) * depth_scale;
        let top = clip(col.screen_row(projected_top), col.edge_top, col.edge_bottom);
        let bottom = clip(col.screen_row(projected_bottom), col.edge_top, col.edge_bottom);

        if col.pick {
            let picked = Selectable::Body(id);
            if col.picks(top, bottom) && !self.picked.iter().any(|r| r.object == picked) {
                self.picked
                    .push(PickResult::new(picked, SurfaceKind::Body).at(body.pos, Vec3::ZERO));
            }
            return;
        }

        let Some(material) = body.material.map(|m| world.material(m)) else {
            return;
        };
        let light = match (material.lit, body.sector) {
            (Some(_), Some(sector)) => {
                let q = LightQuery {
                    input_body: Some(id),
                    ..LightQuery::new(sector, Vec3::ZERO)
                };
                let hash = self.light.sampler.hash(&q, body.pos);
                Some(self.light.sampler.get(&q, hash))
            }
            _ => None,
        };

        let threshold = self.frame.cfg.zwrite_alpha_threshold;
        let v_top = col.horizon as f64 - projected_top;
        let dv = projected_top - projected_bottom;
        let (scale_w, scale_h) = (x_scale as u32, dv.abs() as u32);
        for y in top..bottom {
            if dist >= self.depth_at(col.x, y) {
                continue;
            }
            let v = if dv == 0.0 { 0.0 } else { (y as f64 - v_top) / dv };
            let sample = material.sample(u, v, scale_w, scale_h);
            let c = material.apply_lighting(sample, light).scale(body.opacity);
            self.put(col.x, y, c, dist, c.a > threshold);
        }
    }
}
