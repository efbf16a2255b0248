use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Tunables for the column renderer. Every field has a default so a TOML
/// file only needs the keys it wants to override.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Horizontal field of view in degrees.
    pub fov: f64,
    pub max_view_distance: f64,
    /// Number of contiguous column blocks handed to worker threads.
    pub render_blocks: usize,
    pub multithreaded: bool,
    pub max_portal_depth: u32,
    /// Frames a cached voxel may be reused before it becomes a refresh
    /// candidate.
    pub max_lightmap_age: u32,
    /// A stale voxel is refreshed with probability `1 / dither` per sample.
    pub lightmap_refresh_dither: u64,
    /// Sectors not rendered for this many frames drop their lightmap.
    pub lightmap_evict_frames: u64,
    pub light_attenuation_epsilon: f64,
    /// Trilinear filtering is skipped past `width * grid * factor`, with the
    /// world's lightmap voxel size as `grid`.
    pub filter_distance_factor: f64,
    /// Samples at or below this alpha blend but never write depth.
    pub zwrite_alpha_threshold: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov: 90.0,
            max_view_distance: 10_000.0,
            render_blocks: 8,
            multithreaded: true,
            max_portal_depth: 300,
            max_lightmap_age: 3,
            lightmap_refresh_dither: 4,
            lightmap_evict_frames: 120,
            light_attenuation_epsilon: 0.1,
            filter_distance_factor: 0.25,
            zwrite_alpha_threshold: 0.8,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: RenderConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "screen size {}x{} is empty",
                self.width, self.height
            )));
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(Error::InvalidConfig(format!(
                "fov {} must be within (0, 180)",
                self.fov
            )));
        }
        if self.render_blocks == 0 {
            return Err(Error::InvalidConfig("render_blocks must be at least 1".into()));
        }
        if self.max_view_distance <= 0.0 {
            return Err(Error::InvalidConfig(
                "max_view_distance must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Distance at which lighting stops being trilinearly filtered, for a
    /// world whose lightmap voxels are `light_grid` wide.
    #[inline]
    pub fn filter_distance(&self, light_grid: f64) -> f64 {
        self.width as f64 * light_grid * self.filter_distance_factor
    }
}

/// Per-column view angle and perspective-fix tables, rebuilt whenever the
/// screen width or field of view changes.
#[derive(Clone, Debug)]
pub struct ViewTables {
    pub width: usize,
    pub height: usize,
    /// Distance from the eye to the projection plane, in pixels.
    pub cam_to_proj: f64,
    pub radians: Vec<f64>,
    pub cos: Vec<f64>,
    pub fix: Vec<f64>,
}

impl ViewTables {
    pub fn new(cfg: &RenderConfig) -> Self {
        let half_w = cfg.width as f64 * 0.5;
        let cam_to_proj = half_w / (cfg.fov.to_radians() * 0.5).tan();
        let mut radians = Vec::with_capacity(cfg.width);
        let mut cos = Vec::with_capacity(cfg.width);
        let mut fix = Vec::with_capacity(cfg.width);
        for x in 0..cfg.width {
            let r = ((x as f64 - half_w) / cam_to_proj).atan();
            radians.push(r);
            cos.push(r.cos());
            fix.push(cam_to_proj / r.cos());
        }
        Self {
            width: cfg.width,
            height: cfg.height,
            cam_to_proj,
            radians,
            cos,
            fix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = RenderConfig::from_toml_str("width = 320\nrender_blocks = 4\n").unwrap();
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.render_blocks, 4);
        assert_eq!(cfg.height, 480);
        assert_eq!(cfg.max_portal_depth, 300);
    }

    #[test]
    fn rejects_bad_fov() {
        assert!(matches!(
            RenderConfig::from_toml_str("fov = 180.0"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            RenderConfig::from_toml_str("width = \"wide\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn filter_distance_follows_the_world_grid() {
        let cfg = RenderConfig {
            width: 320,
            ..RenderConfig::default()
        };
        assert_eq!(cfg.filter_distance(4.0), 320.0);
        assert_eq!(cfg.filter_distance(8.0), 640.0);
    }

    #[test]
    fn center_column_looks_straight_ahead() {
        let cfg = RenderConfig {
            width: 100,
            ..RenderConfig::default()
        };
        let t = ViewTables::new(&cfg);
        assert!(t.radians[50].abs() < 1e-12);
        assert!((t.fix[50] - t.cam_to_proj).abs() < 1e-9);
        // 90 degree fov: the edge column sits at -45 degrees
        assert!((t.radians[0] + std::f64::consts::FRAC_PI_4).abs() < 1e-9);
        assert!((t.cam_to_proj - 50.0).abs() < 1e-9);
    }
}
