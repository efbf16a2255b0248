//! Vertical wall spans: full walls, the bands above and below portals, and
//! internal segments all go through [`Block::wall_span`].

use super::Block;
use super::column::Column;
use super::pick::{PickResult, Selectable, SurfaceKind};
use crate::light::{LightQuery, LitSurface};
use crate::material::Material;
use crate::math::{Vec2, Vec3, Vec4};
use crate::world::{Stretch, Surface};

/// Drawn where a wall band has no material.
pub(super) const MISSING: Vec4 = Vec4::opaque(0.5, 1.0, 0.5);

/// World units per texture repeat for unstretched walls.
const TEXELS_PER_REPEAT: f64 = 64.0;

/// One vertical run of wall pixels in a column.
pub(super) struct Span<'s> {
    pub surface: &'s Surface,
    pub start: i64,
    pub end: i64,
    /// Unclipped first row and height in pixels, as floats. The world Z of a
    /// row is interpolated between `z_top` and `z_bottom` across them.
    pub v_top: f64,
    pub dv: f64,
    /// Same as `v_top`/`dv` but for texture V only.
    pub tex_v_top: f64,
    pub tex_dv: f64,
    pub z_top: f64,
    pub z_bottom: f64,
    /// Start of the wall edge and its length, for world-aligned UVs.
    pub origin: Vec2,
    pub length: f64,
    /// Mirror U so textures read the same way on clockwise sectors.
    pub flip_u: bool,
    pub query: LightQuery,
    /// Bands always occlude; the mid wall only once it is opaque enough.
    pub always_write_z: bool,
}

impl Span<'_> {
    /// Surface UV at texture fraction `t` (0 at the top) and world `z`.
    fn uv(&self, col: &Column, t: f64, z: f64) -> Vec2 {
        let mut u = col.u;
        let mut v = t;
        match self.surface.stretch {
            Stretch::Scale => {}
            Stretch::Aspect => {
                if self.length > 0.0 {
                    v *= (self.z_top - self.z_bottom) / self.length;
                }
            }
            Stretch::None => {
                let along = if self.flip_u { 1.0 - u } else { u };
                u = (self.origin.x + self.origin.y + along * self.length) / TEXELS_PER_REPEAT;
                v = -z / TEXELS_PER_REPEAT;
            }
        }
        self.surface.transform.project(Vec2::new(u, v))
    }

    #[inline]
    fn fraction(row: i64, top: f64, height: f64) -> f64 {
        if height == 0.0 {
            0.0
        } else {
            (row as f64 - top) / height
        }
    }
}

impl Block<'_> {
    pub(super) fn wall_span(&mut self, col: &Column, span: &Span<'_>) {
        if self.target.is_none() {
            return;
        }
        let world = self.frame.world;
        let threshold = self.frame.cfg.zwrite_alpha_threshold;
        let height = self.frame.view.height;
        let material = span.surface.material.map(|m| world.material(m));
        let scale_w = col.project_z(span.length).abs() as u32;
        let scale_h = span.dv.abs() as u32;
        let mut q = span.query;

        for y in span.start..span.end {
            if col.distance >= self.depth_at(col.x, y) {
                continue;
            }
            let Some(material) = material else {
                self.put(col.x, y, MISSING, col.distance, true);
                continue;
            };
            if material.is_sky() {
                let uv = Material::sky_uv(col.ray.angle, y as usize, height);
                let c = material.sample(uv.x, uv.y, scale_w, scale_h);
                self.put(col.x, y, c, col.distance, span.always_write_z || c.a > threshold);
                continue;
            }

            let t = Span::fraction(y, span.v_top, span.dv);
            let z = span.z_top + (span.z_bottom - span.z_top) * t;
            let tex_t = Span::fraction(y, span.tex_v_top, span.tex_dv);
            let uv = span.uv(col, tex_t, z);
            let sample = material.sample(uv.x, uv.y, scale_w, scale_h);
            let p = Vec3::new(col.isect.x, col.isect.y, z);
            q.screen_y = y as usize;
            let c = self.light.apply(&q, material, sample, p, col.distance);
            self.put(col.x, y, c, col.distance, span.always_write_z || c.a > threshold);
        }
    }

    /// The wall between the column's floor and ceiling.
    pub(super) fn render_wall_mid(&mut self, col: &Column) {
        let world = self.frame.world;
        let Some(sid) = col.segment else {
            return;
        };
        let seg = world.segment(sid);
        let v_top = col.horizon as f64 - col.projected_top;
        let dv = col.projected_top - col.projected_bottom;

        if col.pick {
            if col.picks(col.clipped_top, col.clipped_bottom) {
                let t = Span::fraction(col.y, v_top, dv);
                let z = col.top_z + (col.bottom_z - col.top_z) * t;
                self.picked.push(
                    PickResult::new(Selectable::Segment(sid), SurfaceKind::Mid).at(
                        Vec3::new(col.isect.x, col.isect.y, z),
                        seg.normal.extend(0.0),
                    ),
                );
            }
            return;
        }

        let (tex_v_top, tex_dv) = if seg.wall_uv_ignore_slope {
            (
                col.horizon as f64 - col.projected_sector_top,
                col.projected_sector_top - col.projected_sector_bottom,
            )
        } else {
            (v_top, dv)
        };
        let sector = world.sector(col.sector);
        let span = Span {
            surface: &seg.mid,
            start: col.clipped_top,
            end: col.clipped_bottom,
            v_top,
            dv,
            tex_v_top,
            tex_dv,
            z_top: col.top_z,
            z_bottom: col.bottom_z,
            origin: seg.p,
            length: seg.length,
            flip_u: sector.winding < 0,
            query: LightQuery {
                surface: LitSurface::Segment(sid),
                ..LightQuery::new(col.sector, seg.normal.extend(0.0))
            },
            always_write_z: false,
        };
        self.wall_span(col, &span);
    }
}
