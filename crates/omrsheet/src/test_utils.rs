//! Shared synthetic-image helpers for unit tests.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::choice::Choice;
use crate::homography::estimate_homography;
use crate::sheet_layout::{SheetLayout, SheetSpec};
use crate::sheet_render::{render_sheet, PencilMark};
use crate::warp::warp_perspective;

/// Page corners of the default synthetic photo (TL, TR, BL, BR).
pub(crate) const PHOTO_PAGE_CORNERS: [[f64; 2]; 4] =
    [[80.0, 60.0], [820.0, 90.0], [60.0, 1040.0], [850.0, 1010.0]];
pub(crate) const PHOTO_SIZE: [u32; 2] = [900, 1100];
pub(crate) const TABLE_GRAY: u8 = 150;

/// One random mark per item, reproducible from `seed`.
pub(crate) fn random_marks(sheet: &SheetSpec, seed: u64) -> Vec<PencilMark> {
    let mut rng = StdRng::seed_from_u64(seed);
    sheet
        .items()
        .filter_map(|item| {
            let idx = rng.gen_range(0..sheet.num_choices);
            Choice::new(idx).map(|c| PencilMark::new(item, c))
        })
        .collect()
}

/// Render a marked sheet.
pub(crate) fn marked_sheet(layout: &SheetLayout, sheet: &SheetSpec, seed: u64) -> (RgbaImage, Vec<PencilMark>) {
    let marks = random_marks(sheet, seed);
    (render_sheet(layout, sheet, &marks), marks)
}

/// Place a rendered page into a larger "photo" under perspective.
///
/// `page_corners` are where the page's outer corners land in the photo.
pub(crate) fn photograph(page: &RgbaImage, page_corners: [[f64; 2]; 4], photo_size: [u32; 2], table: u8) -> RgbaImage {
    let (w, h) = (page.width() as f64 - 1.0, page.height() as f64 - 1.0);
    let page_rect = [[0.0, 0.0], [w, 0.0], [0.0, h], [w, h]];
    let photo_to_page = estimate_homography(&page_corners, &page_rect).unwrap();
    warp_perspective(
        page,
        &photo_to_page,
        photo_size[0],
        photo_size[1],
        Rgba([table, table, table, 255]),
    )
}

/// [`photograph`] with the default corners, size and table color.
pub(crate) fn default_photo(page: &RgbaImage) -> RgbaImage {
    photograph(page, PHOTO_PAGE_CORNERS, PHOTO_SIZE, TABLE_GRAY)
}
