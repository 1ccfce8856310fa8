//! Top-level scan orchestrator: blur gate → corners → orientation search.

use super::*;

/// One fully evaluated orientation hypothesis.
struct Hypothesis {
    orientation: Orientation,
    corners: CornerSet,
    h_src_to_canvas: Matrix3<f64>,
    h_canvas_to_src: Matrix3<f64>,
    items: Vec<ItemResult>,
    quality: f64,
}

fn evaluate_hypothesis(
    image: &RgbaImage,
    ctx: &ScanContext<'_>,
    detected: &CornerSet,
    orientation: Orientation,
) -> Result<Hypothesis, HomographyError> {
    let corners = orientation.apply(detected);
    let canonical = ctx.layout.corner_marker_centers();
    let h_src_to_canvas = estimate_homography(&corners.to_array(), &canonical.to_array())?;
    let h_canvas_to_src = invert_homography(&h_src_to_canvas)?;

    let [w, h] = ctx.layout.canvas_size();
    let canvas = warp_to_canvas(image, &h_canvas_to_src, w, h);
    let items = read_bubbles(&canvas, ctx.layout, ctx.sheet, &ctx.config.bubbles);
    let quality = reading_quality(&items, &ctx.config.orientation)
        .filter(|q| q.is_finite())
        .ok_or(HomographyError::NonFinite)?;

    Ok(Hypothesis {
        orientation,
        corners,
        h_src_to_canvas,
        h_canvas_to_src,
        items,
        quality,
    })
}

fn select_orientation(
    image: &RgbaImage,
    ctx: &ScanContext<'_>,
    detected: &CornerSet,
    orientations: &[Orientation],
    sharpness: f64,
    corners_auto_detected: bool,
) -> Result<ScanResult, ScanError> {
    let mut best: Option<Hypothesis> = None;
    let mut hypotheses = Vec::with_capacity(orientations.len());

    for &orientation in orientations {
        match evaluate_hypothesis(image, ctx, detected, orientation) {
            Ok(hyp) => {
                tracing::debug!(?orientation, quality = hyp.quality, "orientation hypothesis evaluated");
                hypotheses.push(HypothesisScore {
                    orientation,
                    quality: Some(hyp.quality),
                });
                let better = best.as_ref().map_or(true, |b| hyp.quality > b.quality);
                if better {
                    best = Some(hyp);
                }
            }
            Err(err) => {
                tracing::debug!(?orientation, %err, "orientation hypothesis not computable");
                hypotheses.push(HypothesisScore {
                    orientation,
                    quality: None,
                });
            }
        }
    }

    let best = best.ok_or(ScanError::OrientationIndeterminate)?;
    let marked = best
        .items
        .iter()
        .filter(|it| matches!(it.reading, ItemReading::Marked(_)))
        .count();
    let ambiguous = best
        .items
        .iter()
        .filter(|it| it.reading == ItemReading::Ambiguous)
        .count();
    tracing::info!(
        orientation = ?best.orientation,
        quality = best.quality,
        items = best.items.len(),
        marked,
        ambiguous,
        "sheet read"
    );

    Ok(ScanResult {
        items: best.items,
        corners: best.corners,
        corners_auto_detected,
        orientation: best.orientation,
        quality: best.quality,
        hypotheses,
        sharpness,
        homography: matrix3_to_array(&best.h_src_to_canvas),
        homography_inverse: matrix3_to_array(&best.h_canvas_to_src),
        image_size: [image.width(), image.height()],
        canvas_size: ctx.layout.canvas_size(),
    })
}

fn check_inputs(ctx: &ScanContext<'_>) -> Result<(), ScanError> {
    ctx.config.check().map_err(ScanError::InvalidConfig)?;
    ctx.sheet
        .validate(ctx.layout)
        .map_err(ScanError::InvalidSheet)
}

/// Full automatic scan: blur gate, corner search, all orientation hypotheses.
pub(crate) fn scan_auto(
    image: &RgbaImage,
    ctx: &ScanContext<'_>,
    locator: &dyn CornerLocator,
) -> Result<ScanResult, ScanError> {
    check_inputs(ctx)?;

    let sharpness = measure_sharpness(image, &ctx.config.sharpness);
    if !is_sharp_enough(sharpness, &ctx.config.sharpness) {
        tracing::info!(sharpness, floor = ctx.config.sharpness.floor, "image rejected as blurry");
        return Err(ScanError::TooBlurry {
            sharpness,
            floor: ctx.config.sharpness.floor,
        });
    }

    let detected = locator.locate(image)?;
    tracing::info!(
        sharpness,
        width = image.width(),
        height = image.height(),
        "corner markers located"
    );
    select_orientation(image, ctx, &detected, &Orientation::ALL, sharpness, true)
}

/// Scan with caller-supplied page corners.
///
/// The corners are taken as already ordered (TL, TR, BL, BR on the printed page),
/// so only the identity hypothesis is evaluated and the blur gate is skipped.
pub(crate) fn scan_manual(
    image: &RgbaImage,
    ctx: &ScanContext<'_>,
    corners: &CornerSet,
) -> Result<ScanResult, ScanError> {
    check_inputs(ctx)?;
    let sharpness = measure_sharpness(image, &ctx.config.sharpness);
    select_orientation(image, ctx, corners, &[Orientation::Identity], sharpness, false)
}
