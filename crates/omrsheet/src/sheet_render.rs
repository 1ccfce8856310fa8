//! Printable sheet rasterization.
//!
//! Every position comes from [`SheetLayout`], so a rendered sheet and the
//! scanner always agree on bubble placement.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
};
use imageproc::rect::Rect;

use crate::choice::Choice;
use crate::corners::CornerPosition;
use crate::sheet_layout::{SheetLayout, SheetSpec};
use crate::warp::BLANK_PIXEL;

const MARKER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Light "dropout" ink: bubble outlines never read as filled.
const BUBBLE_OUTLINE_COLOR: Rgba<u8> = Rgba([200, 200, 200, 255]);
const ID_BLOCK_COLOR: Rgba<u8> = Rgba([190, 190, 190, 255]);
const DEFAULT_MARK_INTENSITY: u8 = 40;

/// A pencil fill of one bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PencilMark {
    pub item: u32,
    pub choice: Choice,
    /// Gray level of the fill; 0 is black.
    pub intensity: u8,
}

impl PencilMark {
    pub fn new(item: u32, choice: Choice) -> Self {
        Self {
            item,
            choice,
            intensity: DEFAULT_MARK_INTENSITY,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }
}

fn rect_from(x: f64, y: f64, w: f64, h: f64) -> Option<Rect> {
    let (w, h) = (w.round(), h.round());
    if !(w >= 1.0 && h >= 1.0) || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(Rect::at(x.round() as i32, y.round() as i32).of_size(w as u32, h as u32))
}

fn pixel(p: [f64; 2]) -> (i32, i32) {
    (p[0].round() as i32, p[1].round() as i32)
}

/// Rasterize the sheet at 1 px per layout unit.
///
/// Draws the corner squares, the ID block outline and the bubble outlines of
/// `sheet`, then fills `marks`. Marks outside `sheet` are skipped.
pub fn render_sheet(layout: &SheetLayout, sheet: &SheetSpec, marks: &[PencilMark]) -> RgbaImage {
    let [w, h] = layout.canvas_size();
    let mut img = RgbaImage::from_pixel(w, h, BLANK_PIXEL);

    for position in CornerPosition::ALL {
        let [x, y, mw, mh] = layout.corner_marker_rect(position);
        if let Some(rect) = rect_from(x, y, mw, mh) {
            draw_filled_rect_mut(&mut img, rect, MARKER_COLOR);
        }
    }

    let [ix, iy, iw, ih] = layout.id_block;
    if let Some(rect) = rect_from(ix, iy, iw, ih) {
        draw_hollow_rect_mut(&mut img, rect, ID_BLOCK_COLOR);
    }

    let radius = layout.bubble_radius.round().max(1.0) as i32;
    for item in sheet.items() {
        for choice in Choice::all(sheet.num_choices) {
            if let Some(center) = layout.bubble_center(item, choice) {
                draw_hollow_circle_mut(&mut img, pixel(center), radius, BUBBLE_OUTLINE_COLOR);
            }
        }
    }

    let fill_radius = (radius - 1).max(1);
    for mark in marks {
        let on_sheet = mark.item >= 1
            && mark.item <= sheet.total_items
            && mark.choice.index() < sheet.num_choices as usize;
        let center = layout.bubble_center(mark.item, mark.choice).filter(|_| on_sheet);
        match center {
            Some(center) => {
                let v = mark.intensity;
                draw_filled_circle_mut(&mut img, pixel(center), fill_radius, Rgba([v, v, v, 255]));
            }
            None => tracing::warn!(
                item = mark.item,
                choice = %mark.choice,
                "pencil mark outside the sheet, skipped"
            ),
        }
    }

    img
}
