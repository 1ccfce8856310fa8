//! Scan failure taxonomy.

use crate::corners::CornerPosition;

fn join_positions(positions: &[CornerPosition]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Hard failures of the scan pipeline.
///
/// Low-confidence bubbles are not errors; they surface as
/// [`ItemReading::Ambiguous`](crate::ItemReading::Ambiguous) or
/// [`ItemReading::Unmarked`](crate::ItemReading::Unmarked).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// Sharpness pre-check failed; no geometric work was attempted.
    #[error("image too blurry (sharpness {sharpness:.2} below floor {floor:.2})")]
    TooBlurry { sharpness: f64, floor: f64 },
    /// At least one corner quadrant produced no acceptable marker.
    #[error("corner markers not found in: {}", join_positions(.missing))]
    CornersNotFound { missing: Vec<CornerPosition> },
    /// No orientation hypothesis produced a computable reading.
    #[error("no orientation hypothesis could be evaluated")]
    OrientationIndeterminate,
    /// The requested item/choice counts do not fit the layout.
    #[error("invalid sheet: {0}")]
    InvalidSheet(String),
    /// The scan configuration has out-of-range or unordered thresholds.
    #[error("invalid scan config: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    /// Recapture guidance suitable for showing to the person holding the camera.
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            Self::TooBlurry { .. } => {
                "Image is too blurry. Hold the camera steady, improve the lighting and recapture."
            }
            Self::CornersNotFound { .. } => {
                "Could not find all four corner markers. Make sure every corner square is visible, \
                 unobstructed and well lit, then recapture."
            }
            Self::OrientationIndeterminate => {
                "Could not determine the sheet orientation. Recapture the sheet flat and fully in frame."
            }
            Self::InvalidSheet(_) => {
                "The exam configuration does not fit this answer sheet. Check the item and choice counts."
            }
            Self::InvalidConfig(_) => {
                "The scanner tuning file is inconsistent. Restore the default scan configuration."
            }
        }
    }
}
