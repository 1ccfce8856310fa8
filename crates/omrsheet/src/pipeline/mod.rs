//! Scan pipeline.
//!
//! Internal glue between the stages:
//! sharpness gate -> corner location -> per-orientation (homography -> warp ->
//! bubble read -> quality) -> best hypothesis.
//!
//! Algorithmic primitives live in `crate::corners`, `crate::homography`,
//! `crate::warp`, `crate::reader` and `crate::orientation`.

mod result;
mod run;

use image::RgbaImage;
use nalgebra::Matrix3;

use crate::config::ScanConfig;
use crate::corners::{CornerLocator, CornerSet};
use crate::error::ScanError;
use crate::homography::{estimate_homography, invert_homography, matrix3_to_array, HomographyError};
use crate::orientation::{reading_quality, Orientation};
use crate::reader::{read_bubbles, ItemReading, ItemResult};
use crate::sharpness::{is_sharp_enough, measure_sharpness};
use crate::sheet_layout::{SheetLayout, SheetSpec};
use crate::warp::warp_to_canvas;

pub use result::{HypothesisScore, ScanResult};

pub(crate) use run::{scan_auto, scan_manual};

/// Borrowed inputs shared by every stage of one scan.
pub(crate) struct ScanContext<'a> {
    pub layout: &'a SheetLayout,
    pub sheet: &'a SheetSpec,
    pub config: &'a ScanConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Scanner;
    use crate::scoring::Responses;
    use crate::sheet_render::PencilMark;
    use crate::test_utils::{default_photo, marked_sheet, PHOTO_PAGE_CORNERS};

    fn expected(marks: &[PencilMark]) -> Responses {
        marks.iter().map(|m| (m.item, m.choice)).collect()
    }

    #[test]
    fn perspective_photo_reads_every_mark() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(100, 5);
        let (page, marks) = marked_sheet(&layout, &sheet, 1);
        let photo = default_photo(&page);

        let result = Scanner::new(layout).scan(&photo, &sheet).unwrap();
        assert_eq!(result.orientation, Orientation::Identity);
        assert_eq!(result.responses(), expected(&marks));
        assert!(result.ambiguous_items().is_empty());
        assert_eq!(result.hypotheses.len(), Orientation::ALL.len());
        assert_eq!(result.image_size, [900, 1100]);
        assert_eq!(result.canvas_size, [612, 792]);

        // detected top-left marker lies just inside the photographed page corner
        let tl = result.corners.top_left;
        assert!(tl[0] > PHOTO_PAGE_CORNERS[0][0] && tl[0] < PHOTO_PAGE_CORNERS[0][0] + 80.0);
        assert!(tl[1] > PHOTO_PAGE_CORNERS[0][1] && tl[1] < PHOTO_PAGE_CORNERS[0][1] + 80.0);
    }

    #[test]
    fn upside_down_photo_is_resolved() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(60, 4);
        let (page, marks) = marked_sheet(&layout, &sheet, 2);
        let photo = image::imageops::rotate180(&default_photo(&page));

        let result = Scanner::new(layout).scan(&photo, &sheet).unwrap();
        assert_eq!(result.orientation, Orientation::Rotate180);
        assert_eq!(result.responses(), expected(&marks));

        let identity = result
            .hypotheses
            .iter()
            .find(|h| h.orientation == Orientation::Identity)
            .and_then(|h| h.quality)
            .unwrap();
        assert!(result.quality > identity);
    }

    #[test]
    fn mirrored_sheet_is_resolved() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(40, 5);
        let (page, marks) = marked_sheet(&layout, &sheet, 3);
        let mirrored = image::imageops::flip_horizontal(&page);

        let result = Scanner::new(layout).scan(&mirrored, &sheet).unwrap();
        assert_eq!(result.orientation, Orientation::MirrorHorizontal);
        assert_eq!(result.responses(), expected(&marks));
    }

    #[test]
    fn quarter_turns_and_diagonal_flips_are_resolved() {
        use image::imageops::{flip_horizontal, flip_vertical, rotate270, rotate90};

        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(100, 5);
        let (page, marks) = marked_sheet(&layout, &sheet, 6);
        let scanner = Scanner::new(layout);

        let cases: [(Orientation, fn(&RgbaImage) -> RgbaImage); 5] = [
            (Orientation::Rotate90Cw, |p| rotate90(p)),
            (Orientation::Rotate90Ccw, |p| rotate270(p)),
            (Orientation::MirrorVertical, |p| flip_vertical(p)),
            // (x, y) -> (y, x)
            (Orientation::Transpose, |p| flip_horizontal(&rotate90(p))),
            // (x, y) -> (h - 1 - y, w - 1 - x)
            (Orientation::AntiTranspose, |p| flip_horizontal(&rotate270(p))),
        ];
        for (orientation, transform) in cases {
            let captured = transform(&page);
            let result = scanner.scan(&captured, &sheet).unwrap();
            assert_eq!(result.orientation, orientation);
            assert_eq!(result.responses(), expected(&marks), "{orientation:?}");
        }
    }

    #[test]
    fn homographies_are_mutual_inverses() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(20, 4);
        let (page, _) = marked_sheet(&layout, &sheet, 4);
        let result = Scanner::new(layout.clone()).scan(&default_photo(&page), &sheet).unwrap();

        let h = Matrix3::from_fn(|r, c| result.homography[r][c]);
        let h_inv = Matrix3::from_fn(|r, c| result.homography_inverse[r][c]);
        let canonical = layout.corner_marker_centers();
        for (src, dst) in result.corners.to_array().iter().zip(canonical.to_array()) {
            let p = crate::homography::homography_project(&h, *src);
            assert!((p[0] - dst[0]).abs() < 0.5 && (p[1] - dst[1]).abs() < 0.5);
            let q = crate::homography::homography_project(&h_inv, dst);
            assert!((q[0] - src[0]).abs() < 0.5 && (q[1] - src[1]).abs() < 0.5);
        }
    }

    #[test]
    fn missing_corner_is_reported() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(10, 4);
        let (mut page, _) = marked_sheet(&layout, &sheet, 5);
        // cover the bottom-right marker with paper
        for y in 700..792 {
            for x in 540..612 {
                page.put_pixel(x, y, crate::warp::BLANK_PIXEL);
            }
        }
        let err = Scanner::new(layout).scan(&page, &sheet).unwrap_err();
        assert_eq!(
            err,
            ScanError::CornersNotFound {
                missing: vec![crate::corners::CornerPosition::BottomRight]
            }
        );
    }
}
