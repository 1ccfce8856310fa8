use image::{Rgba, RgbaImage};
use omrsheet::{
    estimate_homography, render_sheet, warp_perspective, Choice, PencilMark, SheetLayout, SheetSpec,
};

/// Deterministic answer pattern cycling through every choice.
pub fn cycling_marks(sheet: &SheetSpec) -> Vec<PencilMark> {
    sheet
        .items()
        .filter_map(|item| {
            let idx = ((item * 7 + 3) % sheet.num_choices as u32) as u8;
            Choice::new(idx).map(|c| PencilMark::new(item, c))
        })
        .collect()
}

pub fn marked_sheet(layout: &SheetLayout, sheet: &SheetSpec) -> (RgbaImage, Vec<PencilMark>) {
    let marks = cycling_marks(sheet);
    (render_sheet(layout, sheet, &marks), marks)
}

/// Perspective "photo" of a page lying on a gray table.
pub fn photograph(page: &RgbaImage, page_corners: [[f64; 2]; 4], size: [u32; 2]) -> RgbaImage {
    let (w, h) = (page.width() as f64 - 1.0, page.height() as f64 - 1.0);
    let page_rect = [[0.0, 0.0], [w, 0.0], [0.0, h], [w, h]];
    let photo_to_page = estimate_homography(&page_corners, &page_rect).expect("valid quad");
    warp_perspective(page, &photo_to_page, size[0], size[1], Rgba([150, 150, 150, 255]))
}
