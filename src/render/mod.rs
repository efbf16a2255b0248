//! Column renderer and picker.
//!
//! The screen is split into contiguous blocks of columns, one per worker.
//! Color and depth are stored column-major (`x * height + y`) so each block
//! owns a disjoint slice of both buffers and workers never share mutable
//! state beyond the lock-free lightmaps.

mod column;
mod entities;
mod notices;
mod pick;
mod planes;
mod portal;
mod wall;

pub use notices::{MAX_NOTICES, Notices};
pub use pick::{PickResult, Selectable, SurfaceKind};

use rayon::iter::{IndexedParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::camera::Camera;
use crate::config::{RenderConfig, ViewTables};
use crate::error::Result;
use crate::light::LightSampler;
use crate::math::Vec4;
use crate::present;
use crate::world::{SectorBehavior, SectorId, World};

use column::{Column, ColumnLight};

/// Read-only state shared by every worker during one frame.
struct Frame<'a> {
    world: &'a World,
    cfg: &'a RenderConfig,
    view: &'a ViewTables,
    camera: &'a Camera,
    notices: &'a Notices,
    frame: u64,
}

/// Color and depth for one block of columns.
struct Target<'a> {
    fb: &'a mut [Vec4],
    zbuf: &'a mut [f64],
    x0: usize,
    height: usize,
}

impl Target<'_> {
    #[inline]
    fn index(&self, x: usize, y: i64) -> usize {
        (x - self.x0) * self.height + y as usize
    }
}

/// Per-worker rendering state. Without a target it only picks.
struct Block<'a> {
    frame: &'a Frame<'a>,
    target: Option<Target<'a>>,
    light: ColumnLight<'a>,
    /// Sort scratch for entities, one list per portal depth.
    entities: Vec<Vec<entities::Drawable>>,
    picked: Vec<PickResult>,
}

impl<'a> Block<'a> {
    fn new(frame: &'a Frame<'a>, target: Option<Target<'a>>) -> Self {
        let sampler =
            LightSampler::new(frame.world, frame.cfg, frame.frame).with_notices(frame.notices);
        Self {
            frame,
            target,
            light: ColumnLight::new(
                sampler,
                frame.cfg.filter_distance(frame.world.light_grid),
                frame.view.height,
            ),
            entities: Vec::new(),
            picked: Vec::new(),
        }
    }

    /// Casts and draws (or picks) one column starting in `sector`.
    fn render_column(&mut self, x: usize, sector: SectorId, pick_row: Option<usize>) {
        let cfg = self.frame.cfg;
        let cam = self.frame.camera;
        if let Some(t) = self.target.as_mut() {
            let start = t.index(x, 0);
            t.zbuf[start..start + t.height].fill(cfg.max_view_distance);
            t.fb[start..start + t.height].fill(Vec4::TRANSPARENT);
        }
        let mut col = Column::new(
            self.frame.view,
            x,
            cam.pos,
            cam.yaw,
            cam.eye_z,
            cam.shear,
            sector,
            cfg.max_view_distance,
        );
        if let Some(y) = pick_row {
            col.pick = true;
            col.y = y as i64;
        }
        self.render_sector(&mut col);
    }

    #[inline]
    fn depth_at(&self, x: usize, y: i64) -> f64 {
        match &self.target {
            Some(t) => t.zbuf[t.index(x, y)],
            None => f64::INFINITY,
        }
    }

    /// Blends a premultiplied sample over the pixel. Depth is written when
    /// `write_z` is set.
    #[inline]
    fn put(&mut self, x: usize, y: i64, sample: Vec4, dist: f64, write_z: bool) {
        if let Some(t) = self.target.as_mut() {
            let i = t.index(x, y);
            t.fb[i].blend(sample, 1.0);
            if write_z {
                t.zbuf[i] = dist;
            }
        }
    }
}

/// Owns the frame and depth buffers and drives a full frame across workers.
pub struct Renderer {
    cfg: RenderConfig,
    view: ViewTables,
    frame: u64,
    frame_buffer: Vec<Vec4>,
    z_buffer: Vec<f64>,
    tint: Vec4,
    notices: Notices,
}

impl Renderer {
    pub fn new(cfg: RenderConfig) -> Result<Self> {
        cfg.validate()?;
        let view = ViewTables::new(&cfg);
        let n = cfg.width * cfg.height;
        Ok(Self {
            frame_buffer: vec![Vec4::TRANSPARENT; n],
            z_buffer: vec![cfg.max_view_distance; n],
            cfg,
            view,
            frame: 0,
            tint: Vec4::TRANSPARENT,
            notices: Notices::new(),
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.cfg
    }

    pub fn width(&self) -> usize {
        self.cfg.width
    }

    pub fn height(&self) -> usize {
        self.cfg.height
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Changes the internal resolution. The buffers are reallocated and the
    /// view tables rebuilt.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let cfg = RenderConfig {
            width,
            height,
            ..self.cfg.clone()
        };
        cfg.validate()?;
        self.view = ViewTables::new(&cfg);
        self.frame_buffer = vec![Vec4::TRANSPARENT; width * height];
        self.z_buffer = vec![cfg.max_view_distance; width * height];
        self.cfg = cfg;
        Ok(())
    }

    /// Accumulated color at a pixel, premultiplied.
    pub fn pixel(&self, x: usize, y: usize) -> Vec4 {
        self.frame_buffer[x * self.cfg.height + y]
    }

    /// Depth at a pixel. Untouched pixels hold the maximum view distance.
    pub fn depth(&self, x: usize, y: usize) -> f64 {
        self.z_buffer[x * self.cfg.height + y]
    }

    /// Premultiplied full-frame tint applied when presenting.
    pub fn tint(&self) -> Vec4 {
        self.tint
    }

    fn start_sector(&self, world: &World, camera: &Camera) -> Option<SectorId> {
        camera
            .sector
            .filter(|&s| s.index() < world.sectors.len())
            .or_else(|| world.sector_at(camera.pos, None))
    }

    /// Renders one frame of `world` as seen from `camera`.
    pub fn render(&mut self, world: &World, camera: &Camera) {
        self.frame += 1;
        let Some(start) = self.start_sector(world, camera) else {
            self.notices.push("Camera is outside every sector");
            self.frame_buffer.fill(Vec4::TRANSPARENT);
            return;
        };

        self.tint = match world.sector(start).behavior {
            SectorBehavior::Underwater { tint } => {
                Vec4::new(tint.r * tint.a, tint.g * tint.a, tint.b * tint.a, tint.a)
            }
            _ => Vec4::TRANSPARENT,
        };

        let height = self.cfg.height;
        let blocks = self.cfg.render_blocks.clamp(1, self.cfg.width);
        let chunk = self.cfg.width.div_ceil(blocks) * height;
        let frame = Frame {
            world,
            cfg: &self.cfg,
            view: &self.view,
            camera,
            notices: &self.notices,
            frame: self.frame,
        };
        let work = |(i, (fb, zbuf)): (usize, (&mut [Vec4], &mut [f64]))| {
            let x0 = i * (chunk / height);
            let columns = fb.len() / height;
            let target = Target {
                fb,
                zbuf,
                x0,
                height,
            };
            let mut block = Block::new(&frame, Some(target));
            for x in x0..x0 + columns {
                block.render_column(x, start, None);
            }
        };
        if self.cfg.multithreaded {
            self.frame_buffer
                .par_chunks_mut(chunk)
                .zip(self.z_buffer.par_chunks_mut(chunk))
                .enumerate()
                .for_each(work);
        } else {
            self.frame_buffer
                .chunks_mut(chunk)
                .zip(self.z_buffer.chunks_mut(chunk))
                .enumerate()
                .for_each(work);
        }

        self.evict_lightmaps(world);
    }

    /// Objects under pixel `(x, y)`, nearest portal level first. Uses the
    /// same intersection and clipping as `render` but writes nothing.
    pub fn pick(&self, world: &World, camera: &Camera, x: usize, y: usize) -> Vec<PickResult> {
        if x >= self.cfg.width || y >= self.cfg.height {
            return Vec::new();
        }
        let Some(start) = self.start_sector(world, camera) else {
            return Vec::new();
        };
        let frame = Frame {
            world,
            cfg: &self.cfg,
            view: &self.view,
            camera,
            notices: &self.notices,
            frame: self.frame,
        };
        let mut block = Block::new(&frame, None);
        block.render_column(x, start, Some(y));
        block.picked
    }

    /// Resolves the frame into `0x00RRGGBB` pixels, row-major.
    pub fn write_pixels(&self, out: &mut [u32]) {
        present::resolve(
            &self.frame_buffer,
            self.cfg.width,
            self.cfg.height,
            self.tint,
            out,
        );
    }

    /// Drops the lightmaps of sectors nobody has looked at for a while.
    fn evict_lightmaps(&self, world: &World) {
        for sector in &world.sectors {
            let seen = sector.last_seen_frame();
            if seen == 0 || self.frame.saturating_sub(seen) < self.cfg.lightmap_evict_frames {
                continue;
            }
            sector.lightmap.clear();
            sector.forget_seen();
            log::debug!("evicted lightmap of sector {:?} ({})", sector.id, sector.name);
        }
    }
}
