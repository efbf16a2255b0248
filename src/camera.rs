use std::f64::consts::{PI, TAU};

use crate::math::Vec2;
use crate::world::{SectorId, World};

/// Eye position and orientation. A yaw of zero looks along +x; increasing
/// yaw turns toward +y, which is screen-right with the map's y axis down.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub yaw: f64,
    pub eye_z: f64,
    /// Vertical look offset in pixels; positive moves the horizon down.
    pub shear: f64,
    /// Sector containing `pos`, kept current by `update_sector`.
    pub sector: Option<SectorId>,
}

impl Camera {
    pub fn new(pos: Vec2, yaw: f64, eye_z: f64) -> Self {
        Self {
            pos,
            yaw,
            eye_z,
            shear: 0.0,
            sector: None,
        }
    }

    /// Camera space coordinates of a world point: `(right, forward)`.
    #[inline]
    pub fn world_to_camera(&self, p: Vec2) -> Vec2 {
        let d = p - self.pos;
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(d.y * c - d.x * s, d.x * c + d.y * s)
    }

    #[inline]
    pub fn forward(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s)
    }

    #[inline]
    pub fn right(&self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(-s, c)
    }

    pub fn turn(&mut self, delta: f64) {
        self.yaw += delta;
        // Keep yaw in [-pi, pi] to avoid float drift
        if self.yaw > PI {
            self.yaw -= TAU;
        }
        if self.yaw < -PI {
            self.yaw += TAU;
        }
    }

    /// Re-resolves the camera's sector after it moved. Returns false if the
    /// camera is outside every sector, in which case the old sector is kept.
    pub fn update_sector(&mut self, world: &World) -> bool {
        match world.sector_at(self.pos, self.sector) {
            Some(id) => {
                self.sector = Some(id);
                true
            }
            None => false,
        }
    }

    /// Moves by `delta` if the destination is inside some sector and its
    /// floor/ceiling leave room for the eye.
    pub fn try_move(&mut self, world: &World, delta: Vec2) -> bool {
        let to = self.pos + delta;
        let Some(id) = world.sector_at(to, self.sector) else {
            return false;
        };
        let (floor, ceil) = world.sector(id).z_at(to);
        if self.eye_z <= floor || self.eye_z >= ceil {
            return false;
        }
        self.pos = to;
        self.sector = Some(id);
        true
    }
}
