use image::RgbaImage;
use matchviz_core::{Color, Point2};
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};

/// Pixel composite modes supported by the canvas.
///
/// `Multiply` darkens (used for the background tint), `Screen` lightens
/// (used for marker and line strokes so overlaps brighten instead of
/// occluding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    Multiply,
    Screen,
}

/// Axis-aligned scale plus translation.
///
/// The canvas only ever composes unit scales (±1) with translations, so
/// distances and radii are preserved under the current transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub sx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Scale y by -1 and translate by `height`: maps top-left-origin
    /// coordinates onto the canvas's bottom-left-origin native space.
    pub fn flip_vertical(height: f32) -> Transform {
        Transform {
            sx: 1.0,
            sy: -1.0,
            tx: 0.0,
            ty: height,
        }
    }

    pub fn translation(dx: f32, dy: f32) -> Transform {
        Transform {
            sx: 1.0,
            sy: 1.0,
            tx: dx,
            ty: dy,
        }
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        Point2::new(self.sx * p.x + self.tx, self.sy * p.y + self.ty)
    }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn concat(&self, other: &Transform) -> Transform {
        Transform {
            sx: self.sx * other.sx,
            sy: self.sy * other.sy,
            tx: self.sx * other.tx + self.tx,
            ty: self.sy * other.ty + self.ty,
        }
    }

    pub fn invert(&self) -> Transform {
        Transform {
            sx: 1.0 / self.sx,
            sy: 1.0 / self.sy,
            tx: -self.tx / self.sx,
            ty: -self.ty / self.sy,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    transform: Transform,
    blend: BlendMode,
    stroke_color: Color,
    line_width: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            blend: BlendMode::SourceOver,
            stroke_color: Color::BLACK,
            line_width: 1.0,
        }
    }
}

/// Freshly allocated RGBA8 drawing surface with scoped drawing state.
///
/// The native coordinate system has an inverted vertical axis (origin at the
/// bottom-left, y growing upward); callers working in top-left image
/// coordinates concatenate [`Transform::flip_vertical`] before drawing.
/// Stroke geometry is rasterized with anti-aliased coverage, so fractional
/// line widths are honored.
pub struct Canvas {
    buf: RgbaImage,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl Canvas {
    /// Allocate a zeroed canvas.
    ///
    /// Allocation is fallible: zero or unaddressable dimensions are rejected
    /// and buffer reservation failures are surfaced rather than aborting.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidCanvasSize { width, height });
        }

        let bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|n| n.checked_mul(4))
            .ok_or(RenderError::InvalidCanvasSize { width, height })?;
        let len = usize::try_from(bytes)
            .ok()
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(RenderError::InvalidCanvasSize { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RenderError::CanvasAllocation { width, height })?;
        data.resize(len, 0);

        let buf = RgbaImage::from_raw(width, height, data)
            .ok_or(RenderError::CanvasAllocation { width, height })?;

        Ok(Self {
            buf,
            state: DrawState::default(),
            stack: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.state.blend
    }

    pub fn stroke_color(&self) -> Color {
        self.state.stroke_color
    }

    pub fn line_width(&self) -> f32 {
        self.state.line_width
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    /// Push the current drawing state and return a guard that restores it
    /// when dropped, on every exit path.
    pub fn save(&mut self) -> StateScope<'_> {
        self.stack.push(self.state);
        StateScope { canvas: self }
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke_color = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
    }

    /// Concatenate `t` onto the current transform (`t` applies first)
    pub fn concat(&mut self, t: Transform) {
        self.state.transform = self.state.transform.concat(&t);
    }

    /// Map a user-space point to buffer coordinates (top-left origin,
    /// y growing downward) via the current transform and the native flip.
    fn to_buffer(&self, p: Point2) -> Point2 {
        let native = self.state.transform.apply(p);
        Point2::new(native.x, self.buf.height() as f32 - native.y)
    }

    /// Draw `source` with its top-left pixel at `origin` in user space,
    /// source-over, one output pixel per source pixel.
    pub fn draw_image(&mut self, source: &RgbaImage, origin: Point2) {
        let width = self.buf.width() as usize;
        let height = self.buf.height() as f32;
        let inverse = self.state.transform.invert();
        let stride = width * 4;

        let data: &mut [u8] = &mut self.buf;
        data.par_chunks_mut(stride).enumerate().for_each(|(py, row)| {
            for px in 0..width {
                // Pixel center, buffer space -> native -> user -> source index
                let native = Point2::new(px as f32 + 0.5, height - (py as f32 + 0.5));
                let user = inverse.apply(native);
                let sx = user.x - origin.x;
                let sy = user.y - origin.y;
                if sx < 0.0 || sy < 0.0 {
                    continue;
                }
                let (sx, sy) = (sx as u32, sy as u32);
                if sx >= source.width() || sy >= source.height() {
                    continue;
                }
                let p = source.get_pixel(sx, sy).0;
                let color = Color::new(
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                );
                blend_into(&mut row[px * 4..px * 4 + 4], color, 1.0, BlendMode::SourceOver);
            }
        });
    }

    /// Fill the entire canvas with `color` under the current blend mode
    pub fn fill(&mut self, color: Color) {
        let width = self.buf.width() as usize;
        let blend = self.state.blend;
        let stride = width * 4;

        let data: &mut [u8] = &mut self.buf;
        data.par_chunks_mut(stride).for_each(|row| {
            for px in 0..width {
                blend_into(&mut row[px * 4..px * 4 + 4], color, 1.0, blend);
            }
        });
    }

    /// Stroke a circle of `radius` centered at `center` (user space) with
    /// the current color, line width, and blend mode
    pub fn stroke_circle(&mut self, center: Point2, radius: f32) {
        let c = self.to_buffer(center);
        let color = self.state.stroke_color;
        let blend = self.state.blend;
        let half_width = self.state.line_width * 0.5;
        let reach = radius + half_width + 1.0;

        let (x0, x1) = pixel_range(c.x - reach, c.x + reach, self.buf.width());
        let (y0, y1) = pixel_range(c.y - reach, c.y + reach, self.buf.height());

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - c.x;
                let dy = py as f32 + 0.5 - c.y;
                let dist = ((dx * dx + dy * dy).sqrt() - radius).abs();
                let coverage = (half_width + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    blend_into(&mut self.buf.get_pixel_mut(px, py).0[..], color, coverage, blend);
                }
            }
        }
    }

    /// Stroke a line segment between two user-space points with the current
    /// color, line width, and blend mode
    pub fn stroke_segment(&mut self, from: Point2, to: Point2) {
        let a = self.to_buffer(from);
        let b = self.to_buffer(to);
        let color = self.state.stroke_color;
        let blend = self.state.blend;
        let half_width = self.state.line_width * 0.5;
        let reach = half_width + 1.0;

        let (x0, x1) = pixel_range(a.x.min(b.x) - reach, a.x.max(b.x) + reach, self.buf.width());
        let (y0, y1) = pixel_range(a.y.min(b.y) - reach, a.y.max(b.y) + reach, self.buf.height());

        let ab_x = b.x - a.x;
        let ab_y = b.y - a.y;
        let len_sq = ab_x * ab_x + ab_y * ab_y;

        for py in y0..y1 {
            for px in x0..x1 {
                let pa_x = px as f32 + 0.5 - a.x;
                let pa_y = py as f32 + 0.5 - a.y;
                let t = if len_sq > 0.0 {
                    ((pa_x * ab_x + pa_y * ab_y) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = pa_x - t * ab_x;
                let dy = pa_y - t * ab_y;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (half_width + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    blend_into(&mut self.buf.get_pixel_mut(px, py).0[..], color, coverage, blend);
                }
            }
        }
    }

    /// Consume the canvas and return the composited image
    pub fn into_image(self) -> RgbaImage {
        self.buf
    }
}

/// Guard returned by [`Canvas::save`]; restores the saved drawing state on
/// drop. Derefs to the canvas so drawing calls go through the guard.
pub struct StateScope<'a> {
    canvas: &'a mut Canvas,
}

impl std::ops::Deref for StateScope<'_> {
    type Target = Canvas;

    fn deref(&self) -> &Canvas {
        self.canvas
    }
}

impl std::ops::DerefMut for StateScope<'_> {
    fn deref_mut(&mut self) -> &mut Canvas {
        self.canvas
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        if let Some(prev) = self.canvas.stack.pop() {
            self.canvas.state = prev;
        }
    }
}

/// Clamp a float span to a valid half-open pixel range
fn pixel_range(lo: f32, hi: f32, max: u32) -> (u32, u32) {
    let lo = lo.floor().max(0.0) as u32;
    let hi = (hi.ceil().max(0.0) as u32).min(max);
    (lo.min(max), hi)
}

/// Composite `color` into a 4-byte RGBA pixel with the given coverage and
/// blend mode. Coverage scales the color's alpha; color channels are blended
/// per mode, alpha accumulates source-over in all modes.
fn blend_into(dst: &mut [u8], color: Color, coverage: f32, mode: BlendMode) {
    let alpha = (color.a * coverage).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }

    let d = [
        dst[0] as f32 / 255.0,
        dst[1] as f32 / 255.0,
        dst[2] as f32 / 255.0,
        dst[3] as f32 / 255.0,
    ];
    let s = [color.r, color.g, color.b];

    let blended = match mode {
        BlendMode::SourceOver => s,
        BlendMode::Multiply => [d[0] * s[0], d[1] * s[1], d[2] * s[2]],
        BlendMode::Screen => [
            1.0 - (1.0 - d[0]) * (1.0 - s[0]),
            1.0 - (1.0 - d[1]) * (1.0 - s[1]),
            1.0 - (1.0 - d[2]) * (1.0 - s[2]),
        ],
    };

    for i in 0..3 {
        let out = d[i] * (1.0 - alpha) + blended[i] * alpha;
        dst[i] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    let out_a = d[3] + alpha * (1.0 - d[3]);
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_image(width: u32, height: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        assert!(matches!(
            Canvas::new(0, 10),
            Err(RenderError::InvalidCanvasSize { .. })
        ));
        assert!(matches!(
            Canvas::new(10, 0),
            Err(RenderError::InvalidCanvasSize { .. })
        ));
    }

    #[test]
    fn test_new_rejects_unaddressable_dimensions() {
        assert!(Canvas::new(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_new_canvas_is_transparent_black() {
        let canvas = Canvas::new(4, 3).unwrap();
        let img = canvas.into_image();
        assert_eq!(img.dimensions(), (4, 3));
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_state_scope_restores_on_drop() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        {
            let mut scope = canvas.save();
            scope.set_blend_mode(BlendMode::Screen);
            scope.set_stroke_color(Color::RED);
            scope.set_line_width(2.0);
            scope.concat(Transform::translation(5.0, 0.0));
            assert_eq!(scope.blend_mode(), BlendMode::Screen);
        }
        assert_eq!(canvas.blend_mode(), BlendMode::SourceOver);
        assert_eq!(canvas.stroke_color(), Color::BLACK);
        assert_eq!(canvas.line_width(), 1.0);
        assert_eq!(canvas.transform(), Transform::IDENTITY);
    }

    #[test]
    fn test_state_scopes_nest() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        {
            let mut outer = canvas.save();
            outer.set_line_width(2.0);
            {
                let mut inner = outer.save();
                inner.set_line_width(3.0);
            }
            assert_eq!(outer.line_width(), 2.0);
        }
        assert_eq!(canvas.line_width(), 1.0);
    }

    #[test]
    fn test_blit_without_flip_lands_inverted() {
        // The native axis points up, so an unflipped blit puts the source's
        // top row at the bottom of the buffer.
        let mut source = solid_image(3, 3, 0);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let mut canvas = Canvas::new(3, 3).unwrap();
        canvas.draw_image(&source, Point2::ZERO);
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(0, 2).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_blit_with_flip_preserves_orientation() {
        let mut source = solid_image(3, 5, 0);
        source.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(2, 4, Rgba([0, 255, 0, 255]));

        let mut canvas = Canvas::new(3, 5).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(5.0));
            scope.draw_image(&source, Point2::ZERO);
        }
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 4).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_blit_offset_places_second_image() {
        let source = solid_image(2, 2, 10);
        let target = solid_image(2, 2, 200);

        let mut canvas = Canvas::new(4, 2).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(2.0));
            scope.draw_image(&source, Point2::ZERO);
            scope.draw_image(&target, Point2::new(2.0, 0.0));
        }
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(0, 0).0[0], 10);
        assert_eq!(img.get_pixel(3, 1).0[0], 200);
    }

    #[test]
    fn test_multiply_fill_darkens_by_tint_alpha() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(4.0));
            scope.draw_image(&solid_image(4, 4, 128), Point2::ZERO);
        }
        {
            let mut scope = canvas.save();
            scope.set_blend_mode(BlendMode::Multiply);
            scope.fill(Color::BLACK.with_alpha(0.8));
        }
        let img = canvas.into_image();
        // 128 * (1 - 0.8) = 25.6 -> 26
        for p in img.pixels() {
            assert_eq!(p.0[0], 26);
            assert_eq!(p.0[3], 255);
        }
    }

    #[test]
    fn test_screen_fill_lightens() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(2.0));
            scope.draw_image(&solid_image(2, 2, 100), Point2::ZERO);
        }
        {
            let mut scope = canvas.save();
            scope.set_blend_mode(BlendMode::Screen);
            scope.fill(Color::rgb(0.6, 0.6, 0.6));
        }
        let img = canvas.into_image();
        // 1 - (1 - 100/255)(1 - 0.6) = 0.7569 -> 193
        assert_eq!(img.get_pixel(0, 0).0[0], 193);
    }

    #[test]
    fn test_circle_stroke_stays_in_bounding_box() {
        let mut canvas = Canvas::new(21, 21).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(21.0));
            scope.set_blend_mode(BlendMode::Screen);
            scope.set_stroke_color(Color::RED);
            scope.stroke_circle(Point2::new(10.0, 10.0), 5.0);
        }
        let img = canvas.into_image();
        let lit: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] > 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!lit.is_empty());
        // line width 1 strokes reach radius + 1 at most
        for &(x, y) in &lit {
            assert!((4..=16).contains(&x), "x={} outside stroke box", x);
            assert!((4..=16).contains(&y), "y={} outside stroke box", y);
        }
        // interior stays empty
        assert_eq!(img.get_pixel(10, 10).0[0], 0);
    }

    #[test]
    fn test_segment_stroke_covers_row() {
        let mut canvas = Canvas::new(10, 5).unwrap();
        {
            let mut scope = canvas.save();
            scope.concat(Transform::flip_vertical(5.0));
            scope.set_blend_mode(BlendMode::Screen);
            scope.set_stroke_color(Color::GREEN);
            scope.set_line_width(1.0);
            scope.stroke_segment(Point2::new(1.0, 2.5), Point2::new(9.0, 2.5));
        }
        let img = canvas.into_image();
        for x in 2..8 {
            assert!(img.get_pixel(x, 2).0[1] > 0, "row not covered at x={}", x);
        }
        assert_eq!(img.get_pixel(5, 0).0[1], 0);
        assert_eq!(img.get_pixel(5, 4).0[1], 0);
    }
}
