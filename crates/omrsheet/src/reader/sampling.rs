//! Local-contrast fill score of a single bubble.

use crate::config::BubbleReadConfig;
use crate::raster::LumaPlane;

/// Background luminance assumed when the ring falls entirely off the canvas.
const PAPER_LUMA: f32 = 255.0;

/// Precomputed disk and ring stencils for one bubble radius.
pub(crate) struct BubbleSampler<'a> {
    luma: &'a LumaPlane,
    config: &'a BubbleReadConfig,
    inner: Vec<(i32, i32)>,
    ring: Vec<(i32, i32)>,
}

fn stencil(r_min: f64, r_max: f64) -> Vec<(i32, i32)> {
    let reach = r_max.ceil() as i32;
    let (lo2, hi2) = (r_min * r_min, r_max * r_max);
    let mut out = Vec::new();
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let d2 = (dx * dx + dy * dy) as f64;
            if d2 >= lo2 && d2 <= hi2 {
                out.push((dx, dy));
            }
        }
    }
    out
}

impl<'a> BubbleSampler<'a> {
    pub(crate) fn new(luma: &'a LumaPlane, bubble_radius: f64, config: &'a BubbleReadConfig) -> Self {
        let r = bubble_radius.max(0.5);
        Self {
            luma,
            config,
            inner: stencil(0.0, config.inner_radius_ratio * r),
            ring: stencil(config.ring_inner_ratio * r, config.ring_outer_ratio * r),
        }
    }

    #[inline]
    fn luma_at(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 || x >= self.luma.width() as i32 || y >= self.luma.height() as i32 {
            return None;
        }
        Some(self.luma.get_pixel(x as u32, y as u32)[0])
    }

    /// Mean luminance of the background ring around `(cx, cy)`.
    fn background(&self, cx: i32, cy: i32) -> f32 {
        let (sum, n) = self
            .ring
            .iter()
            .filter_map(|&(dx, dy)| self.luma_at(cx + dx, cy + dy))
            .fold((0.0f32, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            PAPER_LUMA
        } else {
            sum / n as f32
        }
    }

    fn inner_score(&self, cx: i32, cy: i32, background: f32, threshold: f32) -> Option<f32> {
        let mut n = 0usize;
        let mut dark = 0usize;
        let mut sum = 0.0f32;
        for &(dx, dy) in &self.inner {
            if let Some(v) = self.luma_at(cx + dx, cy + dy) {
                n += 1;
                sum += v;
                if v < threshold {
                    dark += 1;
                }
            }
        }
        if n == 0 {
            return None;
        }
        let dark_fraction = dark as f32 / n as f32;
        let mean = sum / n as f32;
        let drop = if background > 0.0 {
            ((background - mean) / background).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(self.config.dark_fraction_weight * dark_fraction + self.config.luminance_drop_weight * drop)
    }

    /// Fill score in `[0, 1]`, maximized over the center search window.
    ///
    /// The background ring is measured once at the nominal center; only the
    /// inner disk moves across the search offsets.
    pub(crate) fn fill_score(&self, center: [f64; 2]) -> f32 {
        if !(center[0].is_finite() && center[1].is_finite()) {
            return 0.0;
        }
        let cx = center[0].round() as i32;
        let cy = center[1].round() as i32;
        let background = self.background(cx, cy);
        let threshold = (self.config.threshold_scale * background)
            .max(self.config.threshold_min)
            .min(self.config.threshold_max);

        let s = self.config.search_radius_px.max(0);
        let mut best = 0.0f32;
        for oy in -s..=s {
            for ox in -s..=s {
                if let Some(score) = self.inner_score(cx + ox, cy + oy, background, threshold) {
                    best = best.max(score);
                }
            }
        }
        best.clamp(0.0, 1.0)
    }
}
