//! Scan configuration.
//!
//! Every threshold used by the pipeline lives here with its default. All structs
//! are `#[serde(default)]`, so a JSON overlay only needs the fields it changes.
//! Overlays are validated on load; the scanner re-checks before every scan.

use std::path::Path;

/// Largest background ring, in bubble radii.
const MAX_RING_OUTER_RATIO: f64 = 4.0;
/// Largest center search half-width, in pixels.
const MAX_SEARCH_RADIUS_PX: i32 = 16;

/// Errors raised while loading or validating a scan configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read scan config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scan config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scan config: {0}")]
    Invalid(String),
}

/// Blur pre-check.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SharpnessConfig {
    /// Minimum mean squared luminance gradient; lower aborts the scan.
    pub floor: f64,
    /// Sampling stride (pixels) of the gradient grid.
    pub grid_step: u32,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            floor: 12.0,
            grid_step: 2,
        }
    }
}

/// Quadrant connected-component corner search.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CornerDetectConfig {
    /// Pixels with luminance below this are "dark".
    pub dark_threshold: f32,
    /// Quadrant size as a fraction of image width/height.
    pub quadrant_fraction: f64,
    /// Absolute lower bound on component area (pixels).
    pub min_area_px: u32,
    /// Minimum component area as a fraction of the quadrant area.
    pub min_area_fraction: f64,
    /// Maximum bounding-box aspect ratio (long side / short side).
    pub max_aspect_ratio: f64,
    /// Minimum area / bounding-box area.
    pub min_fill_density: f64,
}

impl Default for CornerDetectConfig {
    fn default() -> Self {
        Self {
            dark_threshold: 110.0,
            quadrant_fraction: 0.2,
            min_area_px: 24,
            min_area_fraction: 0.002,
            max_aspect_ratio: 2.0,
            min_fill_density: 0.45,
        }
    }
}

/// Bubble fill sampling and per-item decision.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BubbleReadConfig {
    /// Inner sampling disk radius as a fraction of the bubble radius.
    pub inner_radius_ratio: f64,
    /// Background ring inner radius (fraction of bubble radius).
    pub ring_inner_ratio: f64,
    /// Background ring outer radius (fraction of bubble radius).
    pub ring_outer_ratio: f64,
    /// Local dark threshold = `threshold_scale * ring mean`, clamped below.
    pub threshold_scale: f32,
    pub threshold_min: f32,
    pub threshold_max: f32,
    /// Weight of the dark-pixel fraction in the fill score.
    pub dark_fraction_weight: f32,
    /// Weight of the normalized background-to-inner luminance drop.
    pub luminance_drop_weight: f32,
    /// Center search half-width (pixels) in each axis.
    pub search_radius_px: i32,
    /// Minimum top-to-second score gap for an unambiguous mark.
    pub min_score_gap: f32,
    /// Second-best score above this marks the item ambiguous.
    pub max_second_score: f32,
    /// Overrides the layout's fill threshold when set.
    pub fill_threshold: Option<f32>,
}

impl Default for BubbleReadConfig {
    fn default() -> Self {
        Self {
            inner_radius_ratio: 0.62,
            ring_inner_ratio: 1.2,
            ring_outer_ratio: 1.9,
            threshold_scale: 0.72,
            threshold_min: 60.0,
            threshold_max: 190.0,
            dark_fraction_weight: 0.6,
            luminance_drop_weight: 0.4,
            search_radius_px: 2,
            min_score_gap: 0.2,
            max_second_score: 0.35,
            fill_threshold: None,
        }
    }
}

/// Orientation hypothesis quality metric.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Weight of the top fill score per item.
    pub top_weight: f64,
    /// Weight of the top-to-second gap per item.
    pub gap_weight: f64,
    /// Items whose top score is below this are penalized.
    pub low_top_score: f64,
    pub low_top_penalty: f64,
    /// Items whose gap is below this are penalized.
    pub small_gap: f64,
    pub small_gap_penalty: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            top_weight: 0.55,
            gap_weight: 0.45,
            low_top_score: 0.2,
            low_top_penalty: 0.15,
            small_gap: 0.1,
            small_gap_penalty: 0.2,
        }
    }
}

/// Top-level scan configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub sharpness: SharpnessConfig,
    pub corners: CornerDetectConfig,
    pub bubbles: BubbleReadConfig,
    pub orientation: OrientationConfig,
}

impl ScanConfig {
    /// Load a (possibly partial) configuration overlay from JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse and validate a configuration overlay.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is finite and every range is ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check().map_err(ConfigError::Invalid)
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        validate_config(self)
    }
}

fn finite(value: f64, name: &str) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{name} must be finite"))
    }
}

/// `value` in the closed range `[lo, hi]`.
fn within(value: f64, lo: f64, hi: f64, name: &str) -> Result<(), String> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(format!("{name} must be in [{lo}, {hi}]"))
    }
}

fn non_negative(value: f64, name: &str) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be finite and >= 0"))
    }
}

fn positive(value: f64, name: &str) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be finite and > 0"))
    }
}

fn validate_config(config: &ScanConfig) -> Result<(), String> {
    let sharpness = &config.sharpness;
    non_negative(sharpness.floor, "sharpness.floor")?;
    if sharpness.grid_step == 0 {
        return Err("sharpness.grid_step must be >= 1".to_string());
    }

    let corners = &config.corners;
    within(corners.dark_threshold as f64, 1.0, 255.0, "corners.dark_threshold")?;
    positive(corners.quadrant_fraction, "corners.quadrant_fraction")?;
    within(corners.quadrant_fraction, 0.0, 0.5, "corners.quadrant_fraction")?;
    within(corners.min_area_fraction, 0.0, 1.0, "corners.min_area_fraction")?;
    if !(corners.max_aspect_ratio.is_finite() && corners.max_aspect_ratio >= 1.0) {
        return Err("corners.max_aspect_ratio must be finite and >= 1".to_string());
    }
    within(corners.min_fill_density, 0.0, 1.0, "corners.min_fill_density")?;

    let bubbles = &config.bubbles;
    positive(bubbles.inner_radius_ratio, "bubbles.inner_radius_ratio")?;
    positive(bubbles.ring_inner_ratio, "bubbles.ring_inner_ratio")?;
    within(
        bubbles.ring_outer_ratio,
        0.0,
        MAX_RING_OUTER_RATIO,
        "bubbles.ring_outer_ratio",
    )?;
    if bubbles.ring_inner_ratio >= bubbles.ring_outer_ratio {
        return Err("bubbles.ring_inner_ratio must be below bubbles.ring_outer_ratio".to_string());
    }
    positive(bubbles.threshold_scale as f64, "bubbles.threshold_scale")?;
    within(bubbles.threshold_min as f64, 0.0, 255.0, "bubbles.threshold_min")?;
    within(bubbles.threshold_max as f64, 0.0, 255.0, "bubbles.threshold_max")?;
    if bubbles.threshold_min > bubbles.threshold_max {
        return Err(format!(
            "bubbles.threshold_min ({}) must not exceed bubbles.threshold_max ({})",
            bubbles.threshold_min, bubbles.threshold_max
        ));
    }
    non_negative(bubbles.dark_fraction_weight as f64, "bubbles.dark_fraction_weight")?;
    non_negative(bubbles.luminance_drop_weight as f64, "bubbles.luminance_drop_weight")?;
    positive(
        (bubbles.dark_fraction_weight + bubbles.luminance_drop_weight) as f64,
        "sum of bubble score weights",
    )?;
    if !(0..=MAX_SEARCH_RADIUS_PX).contains(&bubbles.search_radius_px) {
        return Err(format!(
            "bubbles.search_radius_px must be in [0, {MAX_SEARCH_RADIUS_PX}]"
        ));
    }
    within(bubbles.min_score_gap as f64, 0.0, 1.0, "bubbles.min_score_gap")?;
    within(bubbles.max_second_score as f64, 0.0, 1.0, "bubbles.max_second_score")?;
    if let Some(threshold) = bubbles.fill_threshold {
        let threshold = threshold as f64;
        if !(threshold.is_finite() && threshold > 0.0 && threshold < 1.0) {
            return Err("bubbles.fill_threshold must be in (0, 1)".to_string());
        }
    }

    let orientation = &config.orientation;
    finite(orientation.top_weight, "orientation.top_weight")?;
    finite(orientation.gap_weight, "orientation.gap_weight")?;
    finite(orientation.low_top_score, "orientation.low_top_score")?;
    finite(orientation.low_top_penalty, "orientation.low_top_penalty")?;
    finite(orientation.small_gap, "orientation.small_gap")?;
    finite(orientation.small_gap_penalty, "orientation.small_gap_penalty")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_overlay_keeps_defaults() {
        let cfg: ScanConfig =
            serde_json::from_str(r#"{"bubbles": {"min_score_gap": 0.3}, "sharpness": {"floor": 5.0}}"#)
                .unwrap();
        assert_eq!(cfg.bubbles.min_score_gap, 0.3);
        assert_eq!(cfg.bubbles.search_radius_px, 2);
        assert_eq!(cfg.sharpness.floor, 5.0);
        assert_eq!(cfg.sharpness.grid_step, 2);
        assert_eq!(cfg.corners.dark_threshold, 110.0);
        assert_eq!(cfg.orientation.top_weight, 0.55);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{"corners": {"quadrant_fraction": 0.25}}"#).unwrap();
        let cfg = ScanConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.corners.quadrant_fraction, 0.25);
        assert_eq!(cfg.corners.max_aspect_ratio, 2.0);
    }

    #[test]
    fn default_config_is_valid() {
        ScanConfig::default().validate().unwrap();
    }

    #[test]
    fn reversed_threshold_clamp_is_rejected() {
        let err = ScanConfig::from_json_str(
            r#"{"bubbles": {"threshold_min": 200.0, "threshold_max": 100.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("threshold_min"));
    }

    #[test]
    fn unbounded_scan_window_is_rejected() {
        let err = ScanConfig::from_json_str(r#"{"bubbles": {"search_radius_px": 100000}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("search_radius_px"));

        let err = ScanConfig::from_json_str(r#"{"bubbles": {"ring_outer_ratio": 1e9}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("ring_outer_ratio"));

        let err = ScanConfig::from_json_str(r#"{"bubbles": {"search_radius_px": -1}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("search_radius_px"));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let cases = [
            r#"{"sharpness": {"grid_step": 0}}"#,
            r#"{"sharpness": {"floor": -1.0}}"#,
            r#"{"corners": {"quadrant_fraction": 0.0}}"#,
            r#"{"corners": {"quadrant_fraction": 0.8}}"#,
            r#"{"corners": {"max_aspect_ratio": 0.5}}"#,
            r#"{"bubbles": {"ring_inner_ratio": 2.0, "ring_outer_ratio": 1.5}}"#,
            r#"{"bubbles": {"dark_fraction_weight": 0.0, "luminance_drop_weight": 0.0}}"#,
            r#"{"bubbles": {"fill_threshold": 1.5}}"#,
            r#"{"bubbles": {"threshold_scale": 0.0}}"#,
        ];
        for json in cases {
            let err = ScanConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json}: {err}");
        }
    }

    #[test]
    fn invalid_file_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{"bubbles": {"threshold_min": 200.0, "threshold_max": 100.0}}"#)
            .unwrap();
        assert!(matches!(
            ScanConfig::from_json_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
