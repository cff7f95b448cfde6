use image::{DynamicImage, RgbaImage};
use matchviz_core::{Color, Correspondence, Descriptor, Keypoint, Point2};

use crate::canvas::{BlendMode, Canvas, Transform};
use crate::error::{RenderError, RenderResult};
use crate::style::{MatchStyle, OverlayStyle};

/// Overlay keypoint markers on `source`.
///
/// Reference keypoints are stroked in `style.reference_color`, found
/// keypoints in `style.found_color`, each as a circle of radius `sigma`
/// centered on the keypoint over the tinted base image.
///
/// If the canvas cannot be allocated the source image is returned unchanged
/// (converted to RGBA8), so callers always get an image back.
pub fn draw_keypoints(
    source: &DynamicImage,
    style: &OverlayStyle,
    reference: &[Keypoint],
    found: &[Keypoint],
) -> RgbaImage {
    validate_keypoints(reference);
    validate_keypoints(found);

    let source = source.to_rgba8();
    let mut canvas = match Canvas::new(source.width(), source.height()) {
        Ok(canvas) => canvas,
        Err(_) => return source,
    };

    composite_base(&mut canvas, &source, None, style.overlay_color);
    stroke_keypoints(&mut canvas, reference, style.reference_color, style.keypoint_line_width);
    stroke_keypoints(&mut canvas, found, style.found_color, style.keypoint_line_width);

    canvas.into_image()
}

/// Overlay descriptor glyphs on `source`.
///
/// Each descriptor is a circle of radius `1.5 * sigma` plus a tick from the
/// center toward its dominant orientation `theta`. Unlike
/// [`draw_keypoints`], canvas allocation failure is surfaced to the caller.
pub fn draw_descriptors(
    source: &DynamicImage,
    style: &OverlayStyle,
    reference: &[Descriptor],
    found: &[Descriptor],
) -> RenderResult<RgbaImage> {
    validate_descriptors(reference);
    validate_descriptors(found);

    let source = source.to_rgba8();
    let mut canvas = Canvas::new(source.width(), source.height())?;

    composite_base(&mut canvas, &source, None, style.overlay_color);
    stroke_descriptors(
        &mut canvas,
        reference,
        style.reference_color,
        style.descriptor_line_width,
        Point2::ZERO,
    );
    stroke_descriptors(
        &mut canvas,
        found,
        style.found_color,
        style.descriptor_line_width,
        Point2::ZERO,
    );

    Ok(canvas.into_image())
}

/// Render `matches` as a side-by-side composite: source image left, target
/// image right, descriptor glyphs per side, one connecting line per
/// correspondence in input order.
///
/// Both images must have identical width and height; violating this is a
/// precondition failure, not a recoverable error.
pub fn draw_matches(
    source: &DynamicImage,
    target: &DynamicImage,
    style: &MatchStyle,
    matches: &[Correspondence],
) -> RenderResult<RgbaImage> {
    let source = source.to_rgba8();
    let target = target.to_rgba8();
    assert_eq!(
        source.dimensions(),
        target.dimensions(),
        "source and target images must have identical dimensions"
    );
    assert!(style.palette.len() >= 2, "match palette needs at least two colors");
    assert!(style.emphasis_interval > 0, "emphasis interval must be positive");
    for m in matches {
        validate_sigma(m.source.keypoint);
        validate_sigma(m.target.keypoint);
    }

    let width = source
        .width()
        .checked_mul(2)
        .ok_or(RenderError::InvalidCanvasSize {
            width: source.width(),
            height: source.height(),
        })?;
    let mut canvas = Canvas::new(width, source.height())?;

    let source_offset = Point2::ZERO;
    let target_offset = Point2::new(source.width() as f32, 0.0);

    composite_base(&mut canvas, &source, Some(&target), style.overlay_color);

    let source_descriptors: Vec<Descriptor> = matches.iter().map(|m| m.source).collect();
    let target_descriptors: Vec<Descriptor> = matches.iter().map(|m| m.target).collect();
    stroke_descriptors(
        &mut canvas,
        &source_descriptors,
        style.source_color,
        style.marker_line_width,
        source_offset,
    );
    stroke_descriptors(
        &mut canvas,
        &target_descriptors,
        style.target_color,
        style.marker_line_width,
        target_offset,
    );

    // Lines go on last so they sit on top of the markers.
    stroke_match_lines(&mut canvas, matches, style, source_offset, target_offset);

    Ok(canvas.into_image())
}

/// Blit the base image under the flip transform, then multiply the tint
/// over the whole canvas.
fn composite_base(
    canvas: &mut Canvas,
    source: &RgbaImage,
    target: Option<&RgbaImage>,
    overlay: Color,
) {
    let height = canvas.height() as f32;
    {
        let mut scope = canvas.save();
        scope.concat(Transform::flip_vertical(height));
        scope.draw_image(source, Point2::ZERO);
        if let Some(target) = target {
            scope.draw_image(target, Point2::new(source.width() as f32, 0.0));
        }
    }
    {
        let mut scope = canvas.save();
        scope.set_blend_mode(BlendMode::Multiply);
        scope.fill(overlay);
    }
}

/// One stroking pass for a role's keypoint set: a single color and line
/// width for the whole set.
fn stroke_keypoints(
    canvas: &mut Canvas,
    keypoints: &[Keypoint],
    color: Color,
    line_width: f32,
) {
    let height = canvas.height() as f32;
    let mut scope = canvas.save();
    scope.concat(Transform::flip_vertical(height));
    scope.set_blend_mode(BlendMode::Screen);
    scope.set_stroke_color(color);
    scope.set_line_width(line_width);
    for kp in keypoints {
        scope.stroke_circle(kp.position, kp.sigma);
    }
}

/// One stroking pass for a role's descriptor set, optionally shifted by a
/// canvas offset (used to place the target half of a match composite).
fn stroke_descriptors(
    canvas: &mut Canvas,
    descriptors: &[Descriptor],
    color: Color,
    line_width: f32,
    offset: Point2,
) {
    let height = canvas.height() as f32;
    let mut scope = canvas.save();
    scope.concat(Transform::flip_vertical(height));
    scope.set_blend_mode(BlendMode::Screen);
    scope.set_stroke_color(color);
    scope.set_line_width(line_width);
    for descriptor in descriptors {
        let keypoint = descriptor.keypoint;
        let radius = 1.5 * keypoint.sigma;
        let center = keypoint.position + offset;
        scope.stroke_circle(center, radius);

        // Dominant orientation tick
        let tip = center.offset(radius * descriptor.theta.cos(), radius * descriptor.theta.sin());
        scope.stroke_segment(center, tip);
    }
}

fn stroke_match_lines(
    canvas: &mut Canvas,
    matches: &[Correspondence],
    style: &MatchStyle,
    source_offset: Point2,
    target_offset: Point2,
) {
    let height = canvas.height() as f32;
    let mut scope = canvas.save();
    scope.concat(Transform::flip_vertical(height));
    scope.set_blend_mode(BlendMode::Screen);
    for (i, m) in matches.iter().enumerate() {
        let (width, alpha) = style.line_stroke(i);
        scope.set_line_width(width);
        scope.set_stroke_color(style.line_color(i).with_alpha(alpha));
        scope.stroke_segment(
            m.source.keypoint.position + source_offset,
            m.target.keypoint.position + target_offset,
        );
    }
}

fn validate_keypoints(keypoints: &[Keypoint]) {
    for kp in keypoints {
        validate_sigma(*kp);
    }
}

fn validate_descriptors(descriptors: &[Descriptor]) {
    for d in descriptors {
        validate_sigma(d.keypoint);
    }
}

fn validate_sigma(kp: Keypoint) {
    assert!(
        kp.sigma > 0.0,
        "keypoint sigma must be positive (got {})",
        kp.sigma
    );
}
