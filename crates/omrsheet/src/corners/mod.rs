//! Corner marker detection.
//!
//! The four solid squares printed near the page corners give the point
//! correspondences for perspective correction. Detection is abstracted behind
//! [`CornerLocator`] so callers can substitute their own locator (or an
//! instrumented one in tests); [`QuadrantCornerLocator`] is the default.

mod quadrant;

use std::fmt;

use image::RgbaImage;

use crate::error::ScanError;

pub use quadrant::QuadrantCornerLocator;

/// Physical corner of the page or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CornerPosition {
    pub const ALL: [CornerPosition; 4] = [
        CornerPosition::TopLeft,
        CornerPosition::TopRight,
        CornerPosition::BottomLeft,
        CornerPosition::BottomRight,
    ];
}

impl fmt::Display for CornerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}

/// Ordered corner points `(top-left, top-right, bottom-left, bottom-right)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CornerSet {
    pub top_left: [f64; 2],
    pub top_right: [f64; 2],
    pub bottom_left: [f64; 2],
    pub bottom_right: [f64; 2],
}

impl CornerSet {
    pub fn new(
        top_left: [f64; 2],
        top_right: [f64; 2],
        bottom_left: [f64; 2],
        bottom_right: [f64; 2],
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Build a set by evaluating `f` for each position.
    pub fn from_fn(mut f: impl FnMut(CornerPosition) -> [f64; 2]) -> Self {
        Self {
            top_left: f(CornerPosition::TopLeft),
            top_right: f(CornerPosition::TopRight),
            bottom_left: f(CornerPosition::BottomLeft),
            bottom_right: f(CornerPosition::BottomRight),
        }
    }

    pub fn get(&self, position: CornerPosition) -> [f64; 2] {
        match position {
            CornerPosition::TopLeft => self.top_left,
            CornerPosition::TopRight => self.top_right,
            CornerPosition::BottomLeft => self.bottom_left,
            CornerPosition::BottomRight => self.bottom_right,
        }
    }

    /// Points in `[TL, TR, BL, BR]` order.
    pub fn to_array(&self) -> [[f64; 2]; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn from_array(points: [[f64; 2]; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    pub fn is_finite(&self) -> bool {
        self.to_array()
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite())
    }
}

/// Locates the four corner markers of a sheet in a source image.
pub trait CornerLocator {
    /// Corner points in source pixel coordinates, or
    /// [`ScanError::CornersNotFound`] naming the quadrants that failed.
    fn locate(&self, image: &RgbaImage) -> Result<CornerSet, ScanError>;
}
