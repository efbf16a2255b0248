//! Sector traversal: find the wall a column hits, draw around it, and
//! recurse through portals into neighboring sectors.

use super::Block;
use super::column::{Column, Ray, clip};
use super::pick::{PickResult, Selectable, SurfaceKind};
use super::wall::Span;
use crate::light::{LightQuery, LitSurface};
use crate::world::PlaneKind;

impl Block<'_> {
    pub(super) fn render_sector(&mut self, col: &mut Column) {
        let world = self.frame.world;
        let sector = world.sector(col.sector);
        sector.mark_seen(self.frame.frame);

        col.distance = self.frame.cfg.max_view_distance;
        col.segment = None;
        for &sid in &sector.segments {
            let seg = world.segment(sid);
            if col.intersect(seg.p, seg.b, seg.normal, false, true) {
                col.segment = Some(sid);
            }
        }
        if col.segment.is_none() {
            self.frame.notices.push(format!(
                "No intersections for sector {} at depth {}",
                sector.name, col.depth
            ));
            return;
        }

        let (bottom, top) = sector.z_at(col.isect.xy());
        col.bottom_z = bottom;
        col.top_z = top;
        col.calc_screen(world);

        // Entities stand in front of the sector's walls, so picks list them
        // first; drawing them last lets them blend over deeper sectors.
        if col.pick {
            self.render_entities(col);
            self.render_segment_column(col);
        } else {
            self.render_segment_column(col);
            self.render_entities(col);
        }
    }

    fn render_segment_column(&mut self, col: &Column) {
        let world = self.frame.world;
        let Some(sid) = col.segment else {
            return;
        };
        let seg = world.segment(sid);

        self.render_plane(col, PlaneKind::Top);
        self.render_plane(col, PlaneKind::Bottom);

        let solid = !seg.is_portal() || seg.portal_has_material;
        if col.pick {
            if solid {
                self.render_wall_mid(col);
            } else {
                self.render_portal(col);
            }
            return;
        }
        if seg.is_portal() {
            self.render_portal(col);
        }
        if solid {
            self.render_wall_mid(col);
        }
    }

    fn render_portal(&mut self, col: &Column) {
        let world = self.frame.world;
        let Some(sid) = col.segment else {
            return;
        };
        let seg = world.segment(sid);
        let (Some(adj_id), Some(adj_seg_id)) = (seg.adjacent_sector, seg.adjacent_segment) else {
            return;
        };
        if col.depth >= self.frame.cfg.max_portal_depth {
            self.frame.notices.push(format!(
                "Maximum portal depth reached at sector {}",
                world.sector(col.sector).name
            ));
            return;
        }
        let adj = world.sector(adj_id);
        let adj_seg = world.segment(adj_seg_id);

        let mut next = *col;
        let mut exit = col.isect.xy();
        let mut delta_z = 0.0;
        if seg.portal_teleports {
            let m = &seg.portal_matrix;
            if let (Some(start), Some(end), Some(hit)) = (
                m.unproject(col.ray.start),
                m.unproject(col.ray.end),
                m.unproject(exit),
            ) {
                let mirror = &adj_seg.mirror_portal_matrix;
                next.set_ray(Ray::between(mirror.project(start), mirror.project(end)));
                exit = mirror.project(hit);
                delta_z = col.bottom_z - adj.bottom.z_at(exit);
                next.camera_z = col.camera_z - delta_z;
            }
        }

        let (adj_bottom, adj_top) = adj.z_at(exit);
        let adj_bottom = adj_bottom + delta_z;
        let adj_top = adj_top + delta_z;
        let adj_projected_top = col.project_z(adj_top - col.camera_z);
        let adj_projected_bottom = col.project_z(adj_bottom - col.camera_z);
        let adj_clipped_top = clip(
            col.screen_row(adj_projected_top),
            col.clipped_top,
            col.clipped_bottom,
        );
        let adj_clipped_bottom = clip(
            col.screen_row(adj_projected_bottom),
            col.clipped_top,
            col.clipped_bottom,
        );

        let query = LightQuery {
            surface: LitSurface::Segment(sid),
            ..LightQuery::new(col.sector, seg.normal.extend(0.0))
        };
        let flip_u = world.sector(col.sector).winding < 0;

        if adj_clipped_top > col.clipped_top {
            if col.pick {
                if col.picks(col.clipped_top, adj_clipped_top) {
                    self.picked.push(PickResult::new(
                        Selectable::Segment(adj_seg_id),
                        SurfaceKind::Hi,
                    ));
                }
            } else {
                let v_top = col.horizon as f64 - col.projected_top;
                let dv = col.projected_top - adj_projected_top;
                let span = Span {
                    surface: &adj_seg.hi,
                    start: col.clipped_top,
                    end: adj_clipped_top,
                    v_top,
                    dv,
                    tex_v_top: v_top,
                    tex_dv: dv,
                    z_top: col.top_z,
                    z_bottom: adj_top,
                    origin: seg.p,
                    length: seg.length,
                    flip_u,
                    query,
                    always_write_z: true,
                };
                self.wall_span(col, &span);
            }
        }

        if col.clipped_bottom > adj_clipped_bottom {
            if col.pick {
                if col.picks(adj_clipped_bottom, col.clipped_bottom) {
                    self.picked.push(PickResult::new(
                        Selectable::Segment(adj_seg_id),
                        SurfaceKind::Low,
                    ));
                }
            } else {
                let v_top = col.horizon as f64 - adj_projected_bottom;
                let dv = adj_projected_bottom - col.projected_bottom;
                let span = Span {
                    surface: &adj_seg.lo,
                    start: adj_clipped_bottom,
                    end: col.clipped_bottom,
                    v_top,
                    dv,
                    tex_v_top: v_top,
                    tex_dv: dv,
                    z_top: adj_bottom,
                    z_bottom: col.bottom_z,
                    origin: seg.p,
                    length: seg.length,
                    flip_u,
                    query,
                    always_write_z: true,
                };
                self.wall_span(col, &span);
            }
        }

        // Closed: the neighbor's floor meets or overlaps its ceiling here.
        if adj_clipped_top >= adj_clipped_bottom {
            return;
        }
        next.sector = adj_id;
        next.edge_top = adj_clipped_top;
        next.edge_bottom = adj_clipped_bottom;
        next.last_portal_distance = col.distance;
        next.depth = col.depth + 1;
        self.render_sector(&mut next);
    }
}
