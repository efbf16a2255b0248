//! Small f64 vector types and the intersection routines shared by the
//! column pipeline, the light sampler and the PVS builder.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Tolerance used by segment intersection tests.
pub const INTERSECT_EPSILON: f64 = 1e-8;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, rhs: Vec2) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// Z component of the 3D cross product.
    #[inline]
    pub fn cross(self, rhs: Vec2) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    #[inline]
    pub fn length2(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length2().sqrt()
    }

    #[inline]
    pub fn dist2(self, rhs: Vec2) -> f64 {
        (self - rhs).length2()
    }

    #[inline]
    pub fn dist(self, rhs: Vec2) -> f64 {
        self.dist2(rhs).sqrt()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    #[inline]
    pub fn extend(self, z: f64) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length2(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length2().sqrt()
    }

    #[inline]
    pub fn dist2(self, rhs: Vec3) -> f64 {
        (self - rhs).length2()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self * (1.0 / len) } else { self }
    }

    #[inline]
    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn component(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Premultiplied RGBA color in the 0..1 range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4 {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Vec4 {
    pub const TRANSPARENT: Vec4 = Vec4 {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[inline]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub fn rgb(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    #[inline]
    pub fn scale(self, s: f64) -> Vec4 {
        Vec4::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }

    #[inline]
    pub fn mul4(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }

    #[inline]
    pub fn lerp(self, rhs: Vec4, t: f64) -> Vec4 {
        Vec4::new(
            self.r + (rhs.r - self.r) * t,
            self.g + (rhs.g - self.g) * t,
            self.b + (rhs.b - self.b) * t,
            self.a + (rhs.a - self.a) * t,
        )
    }

    /// Composites premultiplied `src` over `self`, scaled by `opacity`.
    #[inline]
    pub fn blend(&mut self, src: Vec4, opacity: f64) {
        if src.a == 0.0 {
            return;
        }
        if src.a == 1.0 && opacity == 1.0 {
            *self = src;
            return;
        }
        let inv = 1.0 - src.a * opacity;
        self.r = (self.r * inv + src.r * opacity).clamp(0.0, 1.0);
        self.g = (self.g * inv + src.g * opacity).clamp(0.0, 1.0);
        self.b = (self.b * inv + src.b * opacity).clamp(0.0, 1.0);
        self.a = (self.a * inv + src.a * opacity).clamp(0.0, 1.0);
    }
}

/// 2×3 affine transform, column-major: `[b1x, b1y, b2x, b2y, tx, ty]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat2x3(pub [f64; 6]);

impl Default for Mat2x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat2x3 {
    pub const IDENTITY: Mat2x3 = Mat2x3([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn from_basis(b1: Vec2, b2: Vec2, translation: Vec2) -> Self {
        Mat2x3([b1.x, b1.y, b2.x, b2.y, translation.x, translation.y])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Mat2x3([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    #[inline]
    pub fn project(&self, u: Vec2) -> Vec2 {
        let m = &self.0;
        Vec2::new(m[0] * u.x + m[2] * u.y + m[4], m[1] * u.x + m[3] * u.y + m[5])
    }

    /// Inverse of [`Mat2x3::project`]. `None` for a singular basis.
    #[inline]
    pub fn unproject(&self, u: Vec2) -> Option<Vec2> {
        let m = &self.0;
        let det = m[0] * m[3] - m[2] * m[1];
        if det == 0.0 {
            return None;
        }
        let dx = u.x - m[4];
        let dy = u.y - m[5];
        Some(Vec2::new(
            (m[3] * dx - m[2] * dy) / det,
            (-m[1] * dx + m[0] * dy) / det,
        ))
    }
}

/// Parametric intersection of segment `a1→b1` with segment `a2→b2`.
/// Returns the hit point and the parameter along the first segment.
pub fn intersect_segments(a1: Vec2, b1: Vec2, a2: Vec2, b2: Vec2) -> Option<(Vec2, f64)> {
    let (r, _) = intersect_segments_raw(a1, b1, a2, b2)?;
    Some((a1 + (b1 - a1) * r, r))
}

/// Returns `(r, s)`, the clamped parameters along both segments.
pub fn intersect_segments_raw(a1: Vec2, b1: Vec2, a2: Vec2, b2: Vec2) -> Option<(f64, f64)> {
    let d1 = b1 - a1;
    let d2 = b2 - a2;
    let denom = d1.x * d2.y - d2.x * d1.y;
    if denom == 0.0 {
        return None;
    }
    let r = (a1.y - a2.y) * d2.x - (a1.x - a2.x) * d2.y;
    if (denom < 0.0 && r >= INTERSECT_EPSILON) || (denom > 0.0 && r < -INTERSECT_EPSILON) {
        return None;
    }
    let s = (a1.y - a2.y) * d1.x - (a1.x - a2.x) * d1.y;
    if (denom < 0.0 && s >= INTERSECT_EPSILON) || (denom > 0.0 && s < -INTERSECT_EPSILON) {
        return None;
    }
    let r = r / denom;
    let s = s / denom;
    if r > 1.0 + INTERSECT_EPSILON || s > 1.0 + INTERSECT_EPSILON {
        return None;
    }
    Some((r.clamp(0.0, 1.0), s.clamp(0.0, 1.0)))
}

/// Intersects the 2D segment `a→b` with the 3D segment `p→q` projected onto
/// the XY plane. The returned Z is interpolated along `p→q`.
pub fn intersect_segment_3d(a: Vec2, b: Vec2, p: Vec3, q: Vec3) -> Option<Vec3> {
    let (r, s) = intersect_segments_raw(a, b, p.xy(), q.xy())?;
    let hit = a + (b - a) * r;
    Some(Vec3::new(hit.x, hit.y, (1.0 - s) * p.z + s * q.z))
}

/// Squared distance from `p` to the segment `a→b`.
pub fn segment_distance2(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    let l2 = a.dist2(b);
    if l2 == 0.0 {
        return p.dist2(a);
    }
    let delta = b - a;
    let t = (p - a).dot(delta) / l2;
    if t < 0.0 {
        return p.dist2(a);
    }
    if t > 1.0 {
        return p.dist2(b);
    }
    p.dist2(a + delta * t)
}

/// Does the segment `a→b` pass through the sphere at `c` with radius `r`?
pub fn intersect_line_sphere(a: Vec3, b: Vec3, c: Vec3, r: f64) -> bool {
    let d = b - a;
    let t = d.length2();
    if t == 0.0 {
        return a.dist2(c) <= r * r;
    }
    let d = d * (1.0 / t.sqrt());
    let m = a - c;
    let bb = m.dot(d);
    let cc = m.length2() - r * r;
    if cc > 0.0 && bb > 0.0 {
        return false;
    }
    let discr = bb * bb - cc;
    if discr < 0.0 {
        return false;
    }
    let hit = -bb - discr.sqrt();
    hit * hit <= t
}

/// Slab test of the segment `a→b` against the box centered on `c` with full
/// extents `ext`.
pub fn intersect_line_aabb(a: Vec3, b: Vec3, c: Vec3, ext: Vec3) -> bool {
    let d = b - a;
    let mut tmin = f64::NEG_INFINITY;
    let mut tmax = f64::INFINITY;
    for axis in 0..3 {
        let o = a.component(axis);
        let dir = d.component(axis);
        let lo = c.component(axis) - ext.component(axis) * 0.5;
        let hi = c.component(axis) + ext.component(axis) * 0.5;
        if dir == 0.0 {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t1 = (lo - o) * inv;
        let t2 = (hi - o) * inv;
        tmin = tmin.max(t1.min(t2));
        tmax = tmax.min(t1.max(t2));
    }
    tmax >= tmin.max(0.0) && tmin <= 1.0
}

/// Multiplicative xorshift. Deterministic for a given seed.
#[inline]
pub fn xorshift64(seed: u64) -> u64 {
    let mut x = seed.wrapping_mul(2_685_821_657_736_338_717);
    x ^= x >> 12;
    x ^= x << 25;
    x ^= x >> 27;
    x
}

/// True with probability `1 / modulo` for a uniformly distributed `r`.
#[inline]
pub fn rng_decide(r: u64, modulo: u64) -> bool {
    r < u64::MAX / modulo.max(1)
}
