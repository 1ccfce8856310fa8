use image::{GrayImage, Luma, RgbaImage};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::{CornerLocator, CornerPosition, CornerSet};
use crate::config::CornerDetectConfig;
use crate::error::ScanError;
use crate::raster::luminance;

/// Dark blob statistics accumulated during labelling.
#[derive(Debug, Clone, Copy)]
struct Blob {
    area: u32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Blob {
    fn new(x: u32, y: u32) -> Self {
        Self {
            area: 0,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn bbox_size(&self) -> (u32, u32) {
        (self.max_x - self.min_x + 1, self.max_y - self.min_y + 1)
    }

    fn center(&self) -> [f64; 2] {
        [
            (self.min_x + self.max_x) as f64 * 0.5,
            (self.min_y + self.max_y) as f64 * 0.5,
        ]
    }
}

/// Default corner locator.
///
/// Searches a rectangle anchored at each image corner for the largest compact,
/// solid dark component and returns its bounding-box center. Any quadrant
/// without an acceptable component fails the whole search.
#[derive(Debug, Clone, Default)]
pub struct QuadrantCornerLocator {
    config: CornerDetectConfig,
}

impl QuadrantCornerLocator {
    pub fn new(config: CornerDetectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CornerDetectConfig {
        &self.config
    }

    /// Quadrant rectangle `(x0, y0, w, h)` for one image corner.
    fn quadrant_rect(&self, image_w: u32, image_h: u32, position: CornerPosition) -> (u32, u32, u32, u32) {
        let frac = self.config.quadrant_fraction.clamp(0.0, 0.5);
        let qw = ((image_w as f64 * frac).round() as u32).clamp(1, image_w.max(1));
        let qh = ((image_h as f64 * frac).round() as u32).clamp(1, image_h.max(1));
        let far_x = image_w.saturating_sub(qw);
        let far_y = image_h.saturating_sub(qh);
        match position {
            CornerPosition::TopLeft => (0, 0, qw, qh),
            CornerPosition::TopRight => (far_x, 0, qw, qh),
            CornerPosition::BottomLeft => (0, far_y, qw, qh),
            CornerPosition::BottomRight => (far_x, far_y, qw, qh),
        }
    }

    fn accepts(&self, blob: &Blob, min_area: f64) -> bool {
        if (blob.area as f64) < min_area {
            tracing::trace!(area = blob.area, min_area, "corner blob rejected: area");
            return false;
        }
        let (bw, bh) = blob.bbox_size();
        let aspect = bw.max(bh) as f64 / bw.min(bh) as f64;
        if aspect > self.config.max_aspect_ratio {
            tracing::trace!(aspect, "corner blob rejected: aspect");
            return false;
        }
        let density = blob.area as f64 / (bw as f64 * bh as f64);
        if density < self.config.min_fill_density {
            tracing::trace!(density, "corner blob rejected: density");
            return false;
        }
        true
    }

    /// Best marker center within one quadrant, in image coordinates.
    fn locate_in_quadrant(&self, image: &RgbaImage, position: CornerPosition) -> Option<[f64; 2]> {
        let (x0, y0, qw, qh) = self.quadrant_rect(image.width(), image.height(), position);
        if qw == 0 || qh == 0 || image.width() == 0 || image.height() == 0 {
            return None;
        }

        let mask = GrayImage::from_fn(qw, qh, |x, y| {
            if luminance(image.get_pixel(x0 + x, y0 + y)) < self.config.dark_threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        let mut blobs: Vec<Option<Blob>> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let id = label[0] as usize;
            if id == 0 {
                continue;
            }
            if blobs.len() <= id {
                blobs.resize(id + 1, None);
            }
            blobs[id].get_or_insert_with(|| Blob::new(x, y)).add(x, y);
        }

        let min_area =
            (self.config.min_area_px as f64).max(self.config.min_area_fraction * qw as f64 * qh as f64);
        let best = blobs
            .iter()
            .flatten()
            .filter(|blob| self.accepts(blob, min_area))
            .max_by_key(|blob| blob.area)?;

        let c = best.center();
        let center = [c[0] + x0 as f64, c[1] + y0 as f64];
        tracing::debug!(
            corner = %position,
            components = blobs.iter().flatten().count(),
            area = best.area,
            x = center[0],
            y = center[1],
            "corner marker located"
        );
        Some(center)
    }
}

impl CornerLocator for QuadrantCornerLocator {
    fn locate(&self, image: &RgbaImage) -> Result<CornerSet, ScanError> {
        let mut found = [[0.0f64; 2]; 4];
        let mut missing = Vec::new();
        for (slot, position) in found.iter_mut().zip(CornerPosition::ALL) {
            match self.locate_in_quadrant(image, position) {
                Some(p) => *slot = p,
                None => {
                    tracing::debug!(corner = %position, "no acceptable corner marker");
                    missing.push(position);
                }
            }
        }
        if missing.is_empty() {
            Ok(CornerSet::from_array(found))
        } else {
            Err(ScanError::CornersNotFound { missing })
        }
    }
}
