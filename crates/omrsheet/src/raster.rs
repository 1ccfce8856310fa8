//! Pixel access primitives shared by the corner detector, warp and bubble reader.

use image::{ImageBuffer, Luma, Rgba, RgbaImage};

/// Single-channel luminance plane, values in `[0, 255]`.
pub type LumaPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Rec.601 luminance of an RGBA pixel. Alpha is ignored.
#[inline]
pub fn luminance(px: &Rgba<u8>) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

/// Convert an RGBA raster into a luminance plane.
pub fn luma_plane(img: &RgbaImage) -> LumaPlane {
    let (w, h) = img.dimensions();
    let mut out = LumaPlane::new(w, h);
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        dst[0] = luminance(src);
    }
    out
}

/// Bilinear RGBA sample at a sub-pixel position.
///
/// Returns `None` when `(x, y)` falls outside `[0, w-1] x [0, h-1]`. At the last
/// row/column the far neighbor is clamped onto the edge pixel.
#[inline]
pub fn bilinear_sample_rgba(img: &RgbaImage, x: f64, y: f64) -> Option<Rgba<u8>> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || !x.is_finite() || !y.is_finite() {
        return None;
    }
    if x < 0.0 || y < 0.0 || x > (w - 1) as f64 || y > (h - 1) as f64 {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let v = (1.0 - fx) * (1.0 - fy) * p00[c] as f64
            + fx * (1.0 - fy) * p10[c] as f64
            + (1.0 - fx) * fy * p01[c] as f64
            + fx * fy * p11[c] as f64;
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}
