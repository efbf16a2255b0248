//! Surface materials. Every kind is a variant of one closed enum and is
//! sampled through [`Material::sample`]; lighting goes through
//! [`Material::apply_lighting`].

use crate::math::{Vec2, Vec3, Vec4};

/// One mip level of an image, premultiplied RGBA packed as `0xRRGGBBAA`.
#[derive(Clone, Debug)]
pub struct TextureLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

impl TextureLevel {
    pub fn new(width: u32, height: u32, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> Vec4 {
        unpack_rgba(self.data[(y * self.width + x) as usize])
    }
}

#[inline]
pub fn unpack_rgba(c: u32) -> Vec4 {
    Vec4::new(
        ((c >> 24) & 0xFF) as f64 / 255.0,
        ((c >> 16) & 0xFF) as f64 / 255.0,
        ((c >> 8) & 0xFF) as f64 / 255.0,
        (c & 0xFF) as f64 / 255.0,
    )
}

/// Decoded image with its mip chain, largest level first. Decoding and mip
/// generation happen outside the renderer.
#[derive(Clone, Debug)]
pub struct Texture {
    pub levels: Vec<TextureLevel>,
    pub filter: bool,
}

impl Texture {
    pub fn new(levels: Vec<TextureLevel>) -> Self {
        Self {
            levels,
            filter: false,
        }
    }

    /// Smallest level that still covers `scale_w * scale_h` screen pixels.
    fn level_for(&self, scale_w: u32, scale_h: u32) -> Option<&TextureLevel> {
        let mut level = self.levels.first()?;
        let area = scale_w as u64 * scale_h as u64;
        if area == 0 {
            return Some(level);
        }
        for next in &self.levels[1..] {
            if area > next.width as u64 * next.height as u64 {
                break;
            }
            level = next;
        }
        Some(level)
    }

    pub fn sample(&self, u: f64, v: f64, scale_w: u32, scale_h: u32) -> Vec4 {
        let Some(level) = self.level_for(scale_w, scale_h) else {
            return Vec4::opaque(u, v, 0.0);
        };
        if level.width == 0 || level.height == 0 {
            return Vec4::opaque(u, v, 0.0);
        }
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return Vec4::TRANSPARENT;
        }
        let (w, h) = (level.width, level.height);
        let fx = ((u * w as f64) as u32).min(w - 1);
        let fy = ((v * h as f64) as u32).min(h - 1);
        if !self.filter {
            return level.texel(fx, fy);
        }
        let cx = (fx + 1) % w;
        let cy = (fy + 1) % h;
        let wx = u * w as f64 - fx as f64;
        let wy = v * h as f64 - fy as f64;
        let top = level.texel(fx, fy).lerp(level.texel(cx, fy), wx);
        let bottom = level.texel(fx, cy).lerp(level.texel(cx, cy), wx);
        top.lerp(bottom, wy)
    }
}

/// Diffuse/ambient response of a lit material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lit {
    pub ambient: Vec3,
    pub diffuse: Vec4,
}

impl Default for Lit {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec4::opaque(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Clone, Debug)]
pub enum MaterialKind {
    Solid(Vec4),
    /// Two-color checkerboard with `tiles` squares per unit of UV.
    Checker { a: Vec4, b: Vec4, tiles: f64 },
    Image(Texture),
    /// Background sampled by view angle and screen row rather than surface UV.
    Sky(Texture),
}

#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub lit: Option<Lit>,
}

impl Material {
    pub fn solid(name: impl Into<String>, color: Vec4) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Solid(color),
            lit: Some(Lit::default()),
        }
    }

    pub fn checker(name: impl Into<String>, a: Vec4, b: Vec4, tiles: f64) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Checker { a, b, tiles },
            lit: Some(Lit::default()),
        }
    }

    pub fn unlit(mut self) -> Self {
        self.lit = None;
        self
    }

    #[inline]
    pub fn is_sky(&self) -> bool {
        matches!(self.kind, MaterialKind::Sky(_))
    }

    /// UV for a sky sample at the given view angle and screen row.
    pub fn sky_uv(angle: f64, screen_y: usize, screen_h: usize) -> Vec2 {
        let v = screen_y as f64 / (screen_h.max(2) - 1) as f64;
        Vec2::new(angle.rem_euclid(std::f64::consts::TAU) / std::f64::consts::TAU, v)
    }

    /// Samples premultiplied RGBA at `(u, v)`. UVs tile; `scale_w`/`scale_h`
    /// are the surface's approximate on-screen size and select the mip.
    pub fn sample(&self, u: f64, v: f64, scale_w: u32, scale_h: u32) -> Vec4 {
        let u = u - u.floor();
        let v = v - v.floor();
        match &self.kind {
            MaterialKind::Solid(c) => *c,
            MaterialKind::Checker { a, b, tiles } => {
                let cx = (u * tiles).floor() as i64;
                let cy = (v * tiles).floor() as i64;
                if (cx + cy) & 1 == 0 { *a } else { *b }
            }
            MaterialKind::Image(t) | MaterialKind::Sky(t) => t.sample(u, v, scale_w, scale_h),
        }
    }

    /// Coverage only, used by the shadow tracer for alpha-tested occluders.
    #[inline]
    pub fn sample_alpha(&self, u: f64, v: f64, scale_w: u32, scale_h: u32) -> f64 {
        self.sample(u, v, scale_w, scale_h).a
    }

    /// Combines a sampled color with a diffuse light value. `None` means the
    /// surface is shown at full diffuse plus ambient.
    pub fn apply_lighting(&self, sample: Vec4, light: Option<Vec3>) -> Vec4 {
        let Some(lit) = &self.lit else {
            return sample;
        };
        match light {
            Some(l) => Vec4::new(
                sample.r * lit.diffuse.r * (lit.ambient.x + l.x),
                sample.g * lit.diffuse.g * (lit.ambient.y + l.y),
                sample.b * lit.diffuse.b * (lit.ambient.z + l.z),
                sample.a * lit.diffuse.a,
            ),
            None => sample.mul4(Vec4::new(
                lit.diffuse.r + lit.ambient.x,
                lit.diffuse.g + lit.ambient.y,
                lit.diffuse.b + lit.ambient.z,
                lit.diffuse.a,
            )),
        }
    }
}
