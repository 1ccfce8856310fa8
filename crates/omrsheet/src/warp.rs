//! Perspective resampling.

use image::{Rgba, RgbaImage};
use nalgebra::Matrix3;

use crate::homography::homography_project;
use crate::raster::bilinear_sample_rgba;

/// Paper white; canvas pixels with no source sample keep this value.
pub const BLANK_PIXEL: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Inverse-map every output pixel through `h_dst_to_src` and bilinearly sample `src`.
///
/// Output pixels whose source position falls outside the source image keep `fill`.
pub fn warp_perspective(
    src: &RgbaImage,
    h_dst_to_src: &Matrix3<f64>,
    width: u32,
    height: u32,
    fill: Rgba<u8>,
) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(width, height, fill);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let [sx, sy] = homography_project(h_dst_to_src, [x as f64, y as f64]);
        if let Some(sample) = bilinear_sample_rgba(src, sx, sy) {
            *px = sample;
        }
    }
    out
}

/// Resample `src` onto a `width x height` canonical canvas (1 px per layout unit).
///
/// `h_canvas_to_src` maps canvas coordinates into the source image.
pub fn warp_to_canvas(
    src: &RgbaImage,
    h_canvas_to_src: &Matrix3<f64>,
    width: u32,
    height: u32,
) -> RgbaImage {
    warp_perspective(src, h_canvas_to_src, width, height, BLANK_PIXEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 9, 255]))
    }

    #[test]
    fn identity_warp_copies_source() {
        let src = gradient(40, 30);
        let out = warp_to_canvas(&src, &Matrix3::identity(), 40, 30);
        assert_eq!(out, src);
    }

    #[test]
    fn translation_shifts_pixels_and_blanks_outside() {
        let src = gradient(40, 30);
        let shift = Matrix3::new(1.0, 0.0, 5.0, 0.0, 1.0, -3.0, 0.0, 0.0, 1.0);
        let out = warp_to_canvas(&src, &shift, 40, 30);
        assert_eq!(out.get_pixel(0, 3), src.get_pixel(5, 0));
        assert_eq!(out.get_pixel(10, 20), src.get_pixel(15, 17));
        // source x = 36 + 5 > 39
        assert_eq!(*out.get_pixel(36, 10), BLANK_PIXEL);
        // source y = 1 - 3 < 0
        assert_eq!(*out.get_pixel(10, 1), BLANK_PIXEL);
    }

    #[test]
    fn half_pixel_shift_interpolates() {
        let mut src = RgbaImage::from_pixel(4, 1, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([100, 100, 100, 255]));
        let shift = Matrix3::new(1.0, 0.0, 0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let out = warp_perspective(&src, &shift, 4, 1, Rgba([1, 2, 3, 4]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([50, 50, 50, 255]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([50, 50, 50, 255]));
        assert_eq!(*out.get_pixel(3, 0), Rgba([1, 2, 3, 4]));
    }
}
