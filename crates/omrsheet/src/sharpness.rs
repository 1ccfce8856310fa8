//! Blur pre-check.
//!
//! Sharpness is the mean squared central-difference luminance gradient over a
//! subsampled grid. A flat image scores 0.

use image::RgbaImage;

use crate::config::SharpnessConfig;
use crate::raster::luma_plane;

/// Mean squared gradient magnitude of `image`, sampled every `config.grid_step` pixels.
pub fn measure_sharpness(image: &RgbaImage, config: &SharpnessConfig) -> f64 {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let luma = luma_plane(image);
    let step = config.grid_step.max(1) as usize;

    let mut sum = 0.0f64;
    let mut n = 0usize;
    for y in (1..h - 1).step_by(step) {
        for x in (1..w - 1).step_by(step) {
            let gx = (luma.get_pixel(x + 1, y)[0] - luma.get_pixel(x - 1, y)[0]) as f64 * 0.5;
            let gy = (luma.get_pixel(x, y + 1)[0] - luma.get_pixel(x, y - 1)[0]) as f64 * 0.5;
            sum += gx * gx + gy * gy;
            n += 1;
        }
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// `true` when `sharpness` clears the configured floor.
pub fn is_sharp_enough(sharpness: f64, config: &SharpnessConfig) -> bool {
    sharpness.is_finite() && sharpness >= config.floor
}
