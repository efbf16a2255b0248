//! Turns the float accumulation buffer into window pixels.

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::math::Vec4;

/// Packs a color as `0x00RRGGBB`, the layout softbuffer expects.
#[inline]
pub fn pack_rgb(c: Vec4) -> u32 {
    let ch = |v: f64| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    (ch(c.r) << 16) | (ch(c.g) << 8) | ch(c.b)
}

/// Writes the column-major frame buffer `fb` into row-major `out`, blending
/// the premultiplied `tint` over every pixel.
pub fn resolve(fb: &[Vec4], width: usize, height: usize, tint: Vec4, out: &mut [u32]) {
    debug_assert_eq!(fb.len(), width * height);
    debug_assert!(out.len() >= width * height);
    out[..width * height]
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                let c = fb[x * height + y];
                *px = pack_rgb(Vec4::opaque(
                    c.r * (1.0 - tint.a) + tint.r,
                    c.g * (1.0 - tint.a) + tint.g,
                    c.b * (1.0 - tint.a) + tint.b,
                ));
            }
        });
}

/// Source neighbors and 8.8 fixed-point weights for every destination
/// column and row of a stretch.
pub struct ScaleLut {
    src: (usize, usize),
    dst: (usize, usize),
    x0: Vec<usize>,
    x1: Vec<usize>,
    wx: Vec<u32>,
    y0: Vec<usize>,
    y1: Vec<usize>,
    wy: Vec<u32>,
}

fn axis(dst: usize, src: usize) -> (Vec<usize>, Vec<usize>, Vec<u32>) {
    let step = src as f64 / dst.max(1) as f64;
    let last = src.saturating_sub(1);
    let mut lo = Vec::with_capacity(dst);
    let mut hi = Vec::with_capacity(dst);
    let mut w = Vec::with_capacity(dst);
    for i in 0..dst {
        let f = i as f64 * step;
        let i0 = (f.floor() as usize).min(last);
        lo.push(i0);
        hi.push((i0 + 1).min(last));
        w.push(((f - i0 as f64) * 256.0).round().clamp(0.0, 256.0) as u32);
    }
    (lo, hi, w)
}

impl ScaleLut {
    pub fn new(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> Self {
        let (x0, x1, wx) = axis(dst_w, src_w);
        let (y0, y1, wy) = axis(dst_h, src_h);
        Self {
            src: (src_w, src_h),
            dst: (dst_w, dst_h),
            x0,
            x1,
            wx,
            y0,
            y1,
            wy,
        }
    }

    /// True if the table was built for these sizes.
    pub fn fits(&self, dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> bool {
        self.dst == (dst_w, dst_h) && self.src == (src_w, src_h)
    }
}

#[inline]
fn lerp_rgb(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    let rb = (((a & 0x00FF_00FF) * inv + (b & 0x00FF_00FF) * w256) >> 8) & 0x00FF_00FF;
    let g = (((a & 0x0000_FF00) * inv + (b & 0x0000_FF00) * w256) >> 8) & 0x0000_FF00;
    rb | g
}

/// Bilinearly stretches row-major `src` into `dst`, one row per task.
pub fn blit_bilinear_stretch(dst: &mut [u32], src: &[u32], lut: &ScaleLut) {
    let (dw, dh) = lut.dst;
    let sw = lut.src.0;
    dst[..dw * dh]
        .par_chunks_mut(dw)
        .enumerate()
        .for_each(|(y, row)| {
            let r0 = lut.y0[y] * sw;
            let r1 = lut.y1[y] * sw;
            let wy = lut.wy[y];
            for (x, px) in row.iter_mut().enumerate() {
                let (x0, x1, wx) = (lut.x0[x], lut.x1[x], lut.wx[x]);
                let top = lerp_rgb(src[r0 + x0], src[r0 + x1], wx);
                let bottom = lerp_rgb(src[r1 + x0], src[r1 + x1], wx);
                *px = lerp_rgb(top, bottom, wy);
            }
        });
}
