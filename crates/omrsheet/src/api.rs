//! High-level scanning API.
//!
//! [`Scanner`] is the primary entry point. It owns a sheet layout and a scan
//! configuration; create it once and scan many images.

use image::RgbaImage;
use std::path::Path;

use crate::config::{ConfigError, ScanConfig};
use crate::corners::{CornerLocator, CornerSet, QuadrantCornerLocator};
use crate::error::ScanError;
use crate::pipeline::{self, ScanContext, ScanResult};
use crate::sheet_layout::{LayoutError, SheetLayout, SheetSpec};

/// Primary scanning interface.
///
/// # Examples
///
/// ```no_run
/// use omrsheet::{load_image, Scanner, SheetLayout, SheetSpec};
/// use std::path::Path;
///
/// let scanner = Scanner::new(SheetLayout::default());
/// let image = load_image(Path::new("photo.jpg")).unwrap();
/// let result = scanner.scan(&image, &SheetSpec::new(50, 4)).unwrap();
/// println!("{} items read", result.responses().len());
/// ```
pub struct Scanner {
    layout: SheetLayout,
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with default thresholds.
    pub fn new(layout: SheetLayout) -> Self {
        Self {
            layout,
            config: ScanConfig::default(),
        }
    }

    /// Create with full config control. The configuration is validated.
    pub fn with_config(layout: SheetLayout, config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { layout, config })
    }

    /// Load layout JSON and create a scanner in one step.
    pub fn from_layout_json_file(path: &Path) -> Result<Self, LayoutError> {
        Ok(Self::new(SheetLayout::from_json_file(path)?))
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// Access the current configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    ///
    /// Edits are re-validated at the start of every scan.
    pub fn config_mut(&mut self) -> &mut ScanConfig {
        &mut self.config
    }

    fn context<'a>(&'a self, sheet: &'a SheetSpec) -> ScanContext<'a> {
        ScanContext {
            layout: &self.layout,
            sheet,
            config: &self.config,
        }
    }

    /// Scan an image with the built-in quadrant corner locator.
    pub fn scan(&self, image: &RgbaImage, sheet: &SheetSpec) -> Result<ScanResult, ScanError> {
        let locator = QuadrantCornerLocator::new(self.config.corners.clone());
        self.scan_with_locator(image, sheet, &locator)
    }

    /// Scan an image with a custom corner locator.
    pub fn scan_with_locator(
        &self,
        image: &RgbaImage,
        sheet: &SheetSpec,
        locator: &dyn CornerLocator,
    ) -> Result<ScanResult, ScanError> {
        pipeline::scan_auto(image, &self.context(sheet), locator)
    }

    /// Scan with manually placed page corners (source pixels, page order).
    ///
    /// Skips the blur gate and the orientation search.
    pub fn scan_with_corners(
        &self,
        image: &RgbaImage,
        sheet: &SheetSpec,
        corners: &CornerSet,
    ) -> Result<ScanResult, ScanError> {
        pipeline::scan_manual(image, &self.context(sheet), corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::Choice;
    use crate::orientation::Orientation;
    use crate::reader::ItemReading;
    use crate::sheet_render::{render_sheet, PencilMark};
    use image::Rgba;
    use std::cell::Cell;

    struct CountingLocator {
        calls: Cell<usize>,
    }

    impl CornerLocator for CountingLocator {
        fn locate(&self, image: &RgbaImage) -> Result<CornerSet, ScanError> {
            self.calls.set(self.calls.get() + 1);
            QuadrantCornerLocator::default().locate(image)
        }
    }

    fn choice(letter: char) -> Choice {
        Choice::from_letter(letter).unwrap()
    }

    #[test]
    fn blurry_image_fails_before_corner_search() {
        let scanner = Scanner::new(SheetLayout::default());
        let locator = CountingLocator { calls: Cell::new(0) };
        let flat = RgbaImage::from_pixel(400, 500, Rgba([200, 200, 200, 255]));
        let err = scanner
            .scan_with_locator(&flat, &SheetSpec::new(10, 4), &locator)
            .unwrap_err();
        assert!(matches!(err, ScanError::TooBlurry { .. }));
        assert_eq!(locator.calls.get(), 0);
    }

    #[test]
    fn sharp_image_reaches_corner_search() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(10, 4);
        let img = render_sheet(&layout, &sheet, &[PencilMark::new(1, choice('B'))]);
        let locator = CountingLocator { calls: Cell::new(0) };
        let result = Scanner::new(layout)
            .scan_with_locator(&img, &sheet, &locator)
            .unwrap();
        assert_eq!(locator.calls.get(), 1);
        assert!(result.corners_auto_detected);
        assert_eq!(result.reading(1), Some(ItemReading::Marked(choice('B'))));
    }

    #[test]
    fn sheet_larger_than_layout_is_rejected() {
        let layout = SheetLayout::default();
        let img = render_sheet(&layout, &SheetSpec::new(10, 4), &[]);
        let err = Scanner::new(layout)
            .scan(&img, &SheetSpec::new(500, 4))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidSheet(_)));
    }

    #[test]
    fn manual_corners_use_identity_only() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(10, 4);
        let img = render_sheet(&layout, &sheet, &[PencilMark::new(7, choice('D'))]);
        let corners = layout.corner_marker_centers();
        let scanner = Scanner::new(layout);
        let result = scanner.scan_with_corners(&img, &sheet, &corners).unwrap();
        assert!(!result.corners_auto_detected);
        assert_eq!(result.orientation, Orientation::Identity);
        assert_eq!(result.hypotheses.len(), 1);
        assert_eq!(result.reading(7), Some(ItemReading::Marked(choice('D'))));
    }

    #[test]
    fn with_config_rejects_reversed_threshold_clamp() {
        let config: ScanConfig = serde_json::from_str(
            r#"{"bubbles": {"threshold_min": 200.0, "threshold_max": 100.0}}"#,
        )
        .unwrap();
        let err = Scanner::with_config(SheetLayout::default(), config)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_config_edit_fails_the_scan() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(5, 4);
        let img = render_sheet(&layout, &sheet, &[PencilMark::new(2, choice('C'))]);
        let mut scanner = Scanner::new(layout);
        scanner.config_mut().bubbles.threshold_min = 200.0;
        scanner.config_mut().bubbles.threshold_max = 100.0;

        let err = scanner.scan(&img, &sheet).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
        let corners = scanner.layout().corner_marker_centers();
        let err = scanner.scan_with_corners(&img, &sheet, &corners).unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[test]
    fn with_config_accepts_tuned_thresholds() {
        let layout = SheetLayout::default();
        let sheet = SheetSpec::new(5, 4);
        let img = render_sheet(&layout, &sheet, &[PencilMark::new(3, choice('A'))]);
        let mut config = ScanConfig::default();
        config.bubbles.threshold_min = 70.0;
        config.bubbles.threshold_max = 185.0;
        let result = Scanner::with_config(layout, config)
            .unwrap()
            .scan(&img, &sheet)
            .unwrap();
        assert_eq!(result.reading(3), Some(ItemReading::Marked(choice('A'))));
    }

    #[test]
    fn scanner_config_mut() {
        let mut scanner = Scanner::new(SheetLayout::default());
        scanner.config_mut().sharpness.floor = 0.0;
        assert_eq!(scanner.config().sharpness.floor, 0.0);
    }
}
