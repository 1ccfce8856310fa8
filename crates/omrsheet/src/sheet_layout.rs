//! Sheet layout registry.
//!
//! The single geometric contract shared by the sheet generator and the scanner.
//! Layout JSON follows a parametric schema (`omrsheet.layout.v1`): bubble centers
//! are derived at runtime from the grid origin and pitches, never listed per bubble.
//! All coordinates are layout units; the rectified canvas uses 1 pixel per unit.

use std::path::Path;

use crate::choice::{Choice, MAX_CHOICE_LETTERS};
use crate::corners::{CornerPosition, CornerSet};

const LAYOUT_SCHEMA_V1: &str = "omrsheet.layout.v1";

const DEFAULT_NAME: &str = "omrsheet_letter_100";
const DEFAULT_PAGE_WIDTH: f64 = 612.0;
const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
const DEFAULT_MARKER_SIZE: f64 = 28.0;
const DEFAULT_MARKER_MARGIN: f64 = 24.0;
const DEFAULT_GRID_ORIGIN: [f64; 2] = [73.0, 181.0];
const DEFAULT_ROWS_PER_COLUMN: u32 = 20;
const DEFAULT_COLUMNS: u32 = 5;
const DEFAULT_ROW_PITCH: f64 = 20.0;
const DEFAULT_COLUMN_PITCH: f64 = 104.0;
const DEFAULT_CHOICE_SPACING: f64 = 20.0;
const DEFAULT_BUBBLE_RADIUS: f64 = 6.0;
const DEFAULT_MAX_CHOICES: u8 = 5;
const DEFAULT_FILL_THRESHOLD: f32 = 0.45;
const DEFAULT_ID_BLOCK: [f64; 4] = [200.0, 72.0, 212.0, 60.0];

/// Largest accepted page side, in layout units (one canvas pixel each).
const MAX_PAGE_DIMENSION: f64 = 10_000.0;

/// Errors raised while loading or validating a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to read layout file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported layout schema '{found}' (expected '{LAYOUT_SCHEMA_V1}')")]
    UnsupportedSchema { found: String },
    #[error("invalid layout: {0}")]
    Invalid(String),
}

/// Runtime sheet layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub page_width: f64,
    pub page_height: f64,
    /// Side length of the solid corner squares.
    pub marker_size: f64,
    /// Distance from each page edge to the nearest corner-square edge.
    pub marker_margin: f64,
    /// Center of bubble (item 1, choice A).
    pub grid_origin: [f64; 2],
    pub rows_per_column: u32,
    pub columns: u32,
    pub row_pitch: f64,
    pub column_pitch: f64,
    /// Horizontal distance between adjacent choices of one item.
    pub choice_spacing: f64,
    pub bubble_radius: f64,
    pub max_choices: u8,
    /// Minimum fill score for a bubble to count as marked.
    pub fill_threshold: f32,
    /// Reserved QR / student-ID region `[x, y, w, h]`.
    pub id_block: [f64; 4],
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetLayoutSpecV1 {
    schema: String,
    name: String,
    page_width: f64,
    page_height: f64,
    marker_size: f64,
    marker_margin: f64,
    grid_origin: [f64; 2],
    rows_per_column: u32,
    columns: u32,
    row_pitch: f64,
    column_pitch: f64,
    choice_spacing: f64,
    bubble_radius: f64,
    max_choices: u8,
    fill_threshold: f32,
    id_block: [f64; 4],
}

/// Item count and choice count of one exam sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SheetSpec {
    pub total_items: u32,
    pub num_choices: u8,
}

impl SheetSpec {
    pub fn new(total_items: u32, num_choices: u8) -> Self {
        Self {
            total_items,
            num_choices,
        }
    }

    /// Check that every bubble of this sheet exists in `layout`.
    pub fn validate(&self, layout: &SheetLayout) -> Result<(), String> {
        if self.total_items == 0 {
            return Err("total_items must be >= 1".to_string());
        }
        if self.total_items > layout.capacity() {
            return Err(format!(
                "total_items ({}) exceeds layout capacity ({})",
                self.total_items,
                layout.capacity()
            ));
        }
        if self.num_choices < 2 {
            return Err("num_choices must be >= 2".to_string());
        }
        if self.num_choices > layout.max_choices {
            return Err(format!(
                "num_choices ({}) exceeds layout maximum ({})",
                self.num_choices, layout.max_choices
            ));
        }
        Ok(())
    }

    /// Item numbers `1..=total_items`.
    pub fn items(&self) -> impl Iterator<Item = u32> {
        1..=self.total_items
    }
}

impl SheetLayout {
    /// Number of items the bubble grid can hold.
    ///
    /// Saturates at `u32::MAX`; validated layouts never reach it.
    pub fn capacity(&self) -> u32 {
        self.rows_per_column.saturating_mul(self.columns)
    }

    /// Canvas size `[width, height]` in pixels for a 1:1 rectified sheet.
    pub fn canvas_size(&self) -> [u32; 2] {
        [self.page_width.ceil() as u32, self.page_height.ceil() as u32]
    }

    /// Top-left corner and size `[x, y, w, h]` of one corner square.
    pub fn corner_marker_rect(&self, position: CornerPosition) -> [f64; 4] {
        let far_x = self.page_width - self.marker_margin - self.marker_size;
        let far_y = self.page_height - self.marker_margin - self.marker_size;
        let (x, y) = match position {
            CornerPosition::TopLeft => (self.marker_margin, self.marker_margin),
            CornerPosition::TopRight => (far_x, self.marker_margin),
            CornerPosition::BottomLeft => (self.marker_margin, far_y),
            CornerPosition::BottomRight => (far_x, far_y),
        };
        [x, y, self.marker_size, self.marker_size]
    }

    /// Center of one corner square.
    pub fn corner_marker_center(&self, position: CornerPosition) -> [f64; 2] {
        let [x, y, w, h] = self.corner_marker_rect(position);
        [x + w * 0.5, y + h * 0.5]
    }

    /// Canonical destination corners for perspective correction.
    pub fn corner_marker_centers(&self) -> CornerSet {
        CornerSet::from_fn(|position| self.corner_marker_center(position))
    }

    /// Canonical center of a bubble. `item` is 1-based.
    ///
    /// Returns `None` for items outside the grid or choices beyond `max_choices`.
    pub fn bubble_center(&self, item: u32, choice: Choice) -> Option<[f64; 2]> {
        if item == 0 || item > self.capacity() || choice.index() >= self.max_choices as usize {
            return None;
        }
        let slot = item - 1;
        let column = slot / self.rows_per_column;
        let row = slot % self.rows_per_column;
        Some([
            self.grid_origin[0]
                + column as f64 * self.column_pitch
                + choice.index() as f64 * self.choice_spacing,
            self.grid_origin[1] + row as f64 * self.row_pitch,
        ])
    }

    /// Load a layout from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, LayoutError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse and validate a layout from a JSON string.
    pub fn from_json_str(data: &str) -> Result<Self, LayoutError> {
        let spec: SheetLayoutSpecV1 = serde_json::from_str(data)?;
        Self::from_layout_spec(spec)
    }

    /// Serialize this layout with its schema tag.
    pub fn to_json_string(&self) -> Result<String, LayoutError> {
        let spec = SheetLayoutSpecV1 {
            schema: LAYOUT_SCHEMA_V1.to_string(),
            name: self.name.clone(),
            page_width: self.page_width,
            page_height: self.page_height,
            marker_size: self.marker_size,
            marker_margin: self.marker_margin,
            grid_origin: self.grid_origin,
            rows_per_column: self.rows_per_column,
            columns: self.columns,
            row_pitch: self.row_pitch,
            column_pitch: self.column_pitch,
            choice_spacing: self.choice_spacing,
            bubble_radius: self.bubble_radius,
            max_choices: self.max_choices,
            fill_threshold: self.fill_threshold,
            id_block: self.id_block,
        };
        Ok(serde_json::to_string_pretty(&spec)?)
    }

    fn from_layout_spec(spec: SheetLayoutSpecV1) -> Result<Self, LayoutError> {
        if spec.schema != LAYOUT_SCHEMA_V1 {
            return Err(LayoutError::UnsupportedSchema { found: spec.schema });
        }
        let layout = Self {
            name: spec.name,
            page_width: spec.page_width,
            page_height: spec.page_height,
            marker_size: spec.marker_size,
            marker_margin: spec.marker_margin,
            grid_origin: spec.grid_origin,
            rows_per_column: spec.rows_per_column,
            columns: spec.columns,
            row_pitch: spec.row_pitch,
            column_pitch: spec.column_pitch,
            choice_spacing: spec.choice_spacing,
            bubble_radius: spec.bubble_radius,
            max_choices: spec.max_choices,
            fill_threshold: spec.fill_threshold,
            id_block: spec.id_block,
        };
        validate_layout(&layout).map_err(LayoutError::Invalid)?;
        Ok(layout)
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            page_width: DEFAULT_PAGE_WIDTH,
            page_height: DEFAULT_PAGE_HEIGHT,
            marker_size: DEFAULT_MARKER_SIZE,
            marker_margin: DEFAULT_MARKER_MARGIN,
            grid_origin: DEFAULT_GRID_ORIGIN,
            rows_per_column: DEFAULT_ROWS_PER_COLUMN,
            columns: DEFAULT_COLUMNS,
            row_pitch: DEFAULT_ROW_PITCH,
            column_pitch: DEFAULT_COLUMN_PITCH,
            choice_spacing: DEFAULT_CHOICE_SPACING,
            bubble_radius: DEFAULT_BUBBLE_RADIUS,
            max_choices: DEFAULT_MAX_CHOICES,
            fill_threshold: DEFAULT_FILL_THRESHOLD,
            id_block: DEFAULT_ID_BLOCK,
        }
    }
}

fn positive(value: f64, name: &str) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be finite and > 0"))
    }
}

fn validate_layout(layout: &SheetLayout) -> Result<(), String> {
    if layout.name.trim().is_empty() {
        return Err("layout name must not be empty".to_string());
    }
    positive(layout.page_width, "page_width")?;
    positive(layout.page_height, "page_height")?;
    positive(layout.marker_size, "marker_size")?;
    positive(layout.row_pitch, "row_pitch")?;
    positive(layout.column_pitch, "column_pitch")?;
    positive(layout.choice_spacing, "choice_spacing")?;
    positive(layout.bubble_radius, "bubble_radius")?;
    if layout.page_width > MAX_PAGE_DIMENSION || layout.page_height > MAX_PAGE_DIMENSION {
        return Err(format!(
            "page size {}x{} exceeds the maximum page dimension {MAX_PAGE_DIMENSION}",
            layout.page_width, layout.page_height
        ));
    }

    if !layout.marker_margin.is_finite() || layout.marker_margin < 0.0 {
        return Err("marker_margin must be finite and >= 0".to_string());
    }
    if 2.0 * (layout.marker_margin + layout.marker_size) >= layout.page_width.min(layout.page_height) {
        return Err("corner markers overlap or exceed the page".to_string());
    }
    if layout.rows_per_column == 0 || layout.columns == 0 {
        return Err("rows_per_column and columns must be >= 1".to_string());
    }
    if layout.rows_per_column.checked_mul(layout.columns).is_none() {
        return Err("rows_per_column * columns overflows the item count".to_string());
    }
    if layout.max_choices < 2 || layout.max_choices > MAX_CHOICE_LETTERS {
        return Err(format!("max_choices must be in [2, {MAX_CHOICE_LETTERS}]"));
    }
    if !(layout.fill_threshold.is_finite() && layout.fill_threshold > 0.0 && layout.fill_threshold < 1.0) {
        return Err("fill_threshold must be in (0, 1)".to_string());
    }

    let min_spacing = layout.choice_spacing.min(layout.row_pitch);
    if layout.bubble_radius * 2.0 >= min_spacing {
        return Err(format!(
            "bubble diameter ({:.2}) must be smaller than the minimum bubble spacing ({:.2})",
            layout.bubble_radius * 2.0,
            min_spacing
        ));
    }
    let row_span = (layout.max_choices - 1) as f64 * layout.choice_spacing + 2.0 * layout.bubble_radius;
    if layout.columns > 1 && row_span >= layout.column_pitch {
        return Err("column_pitch too small for max_choices bubbles".to_string());
    }

    let (grid_min, grid_max) = grid_bounds(layout);
    if grid_min[0] < 0.0
        || grid_min[1] < 0.0
        || grid_max[0] > layout.page_width
        || grid_max[1] > layout.page_height
    {
        return Err("bubble grid extends beyond the page".to_string());
    }
    for position in CornerPosition::ALL {
        let [x, y, w, h] = layout.corner_marker_rect(position);
        let overlaps = grid_min[0] < x + w && grid_max[0] > x && grid_min[1] < y + h && grid_max[1] > y;
        if overlaps {
            return Err(format!("bubble grid overlaps the {position} corner marker"));
        }
    }
    Ok(())
}

/// Axis-aligned bounds of every bubble disk, `(min_xy, max_xy)`.
fn grid_bounds(layout: &SheetLayout) -> ([f64; 2], [f64; 2]) {
    let r = layout.bubble_radius;
    let min = [layout.grid_origin[0] - r, layout.grid_origin[1] - r];
    let max = [
        layout.grid_origin[0]
            + (layout.columns - 1) as f64 * layout.column_pitch
            + (layout.max_choices - 1) as f64 * layout.choice_spacing
            + r,
        layout.grid_origin[1] + (layout.rows_per_column - 1) as f64 * layout.row_pitch + r,
    ];
    (min, max)
}
