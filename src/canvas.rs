// The 2D drawing surface the compositor paints into.
//
// `Canvas2d` is the small immediate-mode context the compositor needs (paths,
// clipping, shadows, image blits, text). `SoftwareCanvas` implements it with
// vello_cpu, so frames can be shown in a minifb window or written out as PNG.

use crate::error::{Error, Result};
use crate::font;
use crate::types::{Color, FrameBuffer};
use std::path::Path;
use std::sync::Arc;
use vello_cpu::kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape};
use vello_cpu::peniko::{BlendMode, Compose, Mix};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Immediate-mode 2D context, modelled on the HTML canvas API.
///
/// A surface has exactly one writer at a time; nothing here locks.
pub trait Canvas2d {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset the rectangle to transparent black.
    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn set_fill_color(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32);
    fn close_path(&mut self);
    /// Fill the current path (non-zero winding).
    fn fill(&mut self);
    /// Intersect the clip region with the current path.
    fn clip(&mut self);

    fn save(&mut self);
    fn restore(&mut self);

    /// Shadow cast by subsequent fills. A zero blur with zero offsets disables it.
    fn set_shadow(&mut self, blur: f32, color: Color, offset_x: f32, offset_y: f32);

    /// Blit `image` scaled into the destination rectangle.
    fn draw_image(
        &mut self,
        image: &FrameBuffer,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) -> Result<()>;

    fn set_font_size(&mut self, px: f32);
    /// Draw `text` with its vertical middle at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign);

    /// Make everything drawn so far visible to readers of the surface.
    fn flush(&mut self) {}
}

impl<T: Canvas2d + ?Sized> Canvas2d for &mut T {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        (**self).clear_rect(x, y, w, h)
    }

    fn set_fill_color(&mut self, color: Color) {
        (**self).set_fill_color(color)
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        (**self).fill_rect(x, y, w, h)
    }

    fn begin_path(&mut self) {
        (**self).begin_path()
    }

    fn move_to(&mut self, x: f32, y: f32) {
        (**self).move_to(x, y)
    }

    fn line_to(&mut self, x: f32, y: f32) {
        (**self).line_to(x, y)
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        (**self).quadratic_curve_to(cpx, cpy, x, y)
    }

    fn close_path(&mut self) {
        (**self).close_path()
    }

    fn fill(&mut self) {
        (**self).fill()
    }

    fn clip(&mut self) {
        (**self).clip()
    }

    fn save(&mut self) {
        (**self).save()
    }

    fn restore(&mut self) {
        (**self).restore()
    }

    fn set_shadow(&mut self, blur: f32, color: Color, offset_x: f32, offset_y: f32) {
        (**self).set_shadow(blur, color, offset_x, offset_y)
    }

    fn draw_image(
        &mut self,
        image: &FrameBuffer,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) -> Result<()> {
        (**self).draw_image(image, dx, dy, dw, dh)
    }

    fn set_font_size(&mut self, px: f32) {
        (**self).set_font_size(px)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign) {
        (**self).fill_text(text, x, y, align)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Flattening tolerance for shapes turned into paths.
const TOLERANCE: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Shadow {
    blur: f32,
    color: Color,
    offset_x: f32,
    offset_y: f32,
}

impl Shadow {
    const NONE: Shadow = Shadow {
        blur: 0.0,
        color: Color::TRANSPARENT,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    fn is_visible(&self) -> bool {
        self.color.a > 0.0 && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

#[derive(Clone, Copy)]
struct State {
    fill: Color,
    shadow: Shadow,
    font_px: f32,
}

impl Default for State {
    fn default() -> Self {
        Self { fill: Color::BLACK, shadow: Shadow::NONE, font_px: 14.0 }
    }
}

/// CPU canvas backed by a vello_cpu render context.
///
/// Drawing calls are recorded on the context and rasterised by [`Canvas2d::flush`];
/// the read-back helpers see the surface as of the last flush.
pub struct SoftwareCanvas {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    path: BezPath,
    subpath_start: Option<Point>,
    current: Option<Point>,
    closed: bool,
    state: State,
    /// Saved states, each with the number of clip layers open when it was saved.
    stack: Vec<(State, usize)>,
    layers: usize,
}

impl SoftwareCanvas {
    /// A fully transparent canvas. Zero-sized surfaces cannot be drawn to.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::surface(format!("cannot draw to a {width}x{height} surface")));
        }
        let too_big = || Error::surface(format!("{width}x{height} exceeds {0}x{0}", u16::MAX));
        let w: u16 = width.try_into().map_err(|_| too_big())?;
        let h: u16 = height.try_into().map_err(|_| too_big())?;
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            path: BezPath::new(),
            subpath_start: None,
            current: None,
            closed: false,
            state: State::default(),
            stack: Vec::new(),
            layers: 0,
        })
    }

    /// Straight-alpha 0xAARRGGBB at (x,y), or None outside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        if x >= w || y >= h {
            return None;
        }
        let i = (y * w + x) * 4;
        let px = &self.pixmap.data_as_u8_slice()[i..i + 4];
        Some(unpremultiply([px[0], px[1], px[2], px[3]]))
    }

    /// Composite the canvas over an opaque background of the same size.
    pub fn flatten_onto(&self, background: &FrameBuffer) -> Result<FrameBuffer> {
        let (w, h) = (usize::from(self.width), usize::from(self.height));
        if background.width != w || background.height != h {
            return Err(Error::surface(format!(
                "background is {}x{}, canvas is {w}x{h}",
                background.width, background.height
            )));
        }
        if !background.is_well_formed() {
            return Err(Error::surface("background pixel count does not match its size"));
        }
        let pixels = self
            .pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .zip(&background.pixels)
            .map(|(src, &bg)| {
                // premultiplied source-over
                let inv = 255 - u32::from(src[3]);
                let over = |s: u8, shift: u32| {
                    let d = (bg >> shift) & 0xFF;
                    (u32::from(s) + (d * inv + 127) / 255).min(255) << shift
                };
                over(src[0], 16) | over(src[1], 8) | over(src[2], 0)
            })
            .collect();
        Ok(FrameBuffer { width: w, height: h, pixels })
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(u32::from(self.width), u32::from(self.height), |x, y| {
            let px = self.pixel(x as usize, y as usize).unwrap_or(0);
            image::Rgba([(px >> 16) as u8, (px >> 8) as u8, px as u8, (px >> 24) as u8])
        })
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_rgba_image().save(path)?;
        Ok(())
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Start a new subpath at the current point if the last one was closed.
    /// False when there is no current point at all.
    fn reopen(&mut self) -> bool {
        match self.current {
            None => false,
            Some(p) => {
                if self.closed {
                    self.path.move_to(p);
                    self.subpath_start = Some(p);
                    self.closed = false;
                }
                true
            }
        }
    }

    /// Paint the current shadow for a shape whose silhouette is `rect` rounded by `radius`.
    fn cast_shadow(&mut self, rect: Rect, radius: f64) {
        let shadow = self.state.shadow;
        if !shadow.is_visible() || rect.is_zero_area() {
            return;
        }
        let (ox, oy) = (f64::from(shadow.offset_x), f64::from(shadow.offset_y));
        let rect = Rect::new(rect.x0 + ox, rect.y0 + oy, rect.x1 + ox, rect.y1 + oy);
        self.ctx.set_paint(solid(shadow.color));
        if shadow.blur > 0.0 {
            // A canvas shadow blur of N is a gaussian with a deviation of N/2.
            self.ctx.fill_blurred_rounded_rect(&rect, radius as f32, shadow.blur / 2.0);
        } else {
            let outline = rect.to_rounded_rect(radius).to_path(TOLERANCE);
            self.ctx.fill_path(&outline);
        }
    }
}

/// Corner radius of a rounded-rectangle path: how far its first point sits
/// from the left edge of the top side. Zero for any other shape.
fn leading_corner_radius(path: &BezPath, bbox: Rect) -> f64 {
    match path.elements().first() {
        Some(PathEl::MoveTo(p)) if (p.y - bbox.y0).abs() < 1e-3 => {
            (p.x - bbox.x0).clamp(0.0, bbox.width().min(bbox.height()) / 2.0)
        }
        _ => 0.0,
    }
}

fn solid(color: Color) -> vello_cpu::peniko::Color {
    let a = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, a)
}

fn unpremultiply([r, g, b, a]: [u8; 4]) -> u32 {
    if a == 0 {
        return 0;
    }
    let a = u32::from(a);
    let c = |v: u8| ((u32::from(v) * 255 + a / 2) / a).min(255);
    (a << 24) | (c(r) << 16) | (c(g) << 8) | c(b)
}

/// Opaque image paint for a packed 0x00RRGGBB frame.
fn frame_to_image(frame: &FrameBuffer) -> Result<vello_cpu::Image> {
    let too_big = || Error::draw(format!("{}x{} frame is too large", frame.width, frame.height));
    let w: u16 = frame.width.try_into().map_err(|_| too_big())?;
    let h: u16 = frame.height.try_into().map_err(|_| too_big())?;
    let pixels = frame
        .pixels
        .iter()
        .map(|&p| vello_cpu::peniko::color::PremulRgba8 {
            r: (p >> 16) as u8,
            g: (p >> 8) as u8,
            b: p as u8,
            a: 255,
        })
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, false);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

impl Canvas2d for SoftwareCanvas {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x, y, w, h) = (f64::from(x), f64::from(y), f64::from(w), f64::from(h));
        let rect = Rect::new(x, y, x + w, y + h).abs().intersect(self.bounds());
        if rect.is_zero_area() || !rect.is_finite() {
            return;
        }
        if rect == self.bounds() && self.layers == 0 {
            // Nothing recorded so far can show through: start over.
            self.ctx.reset();
            return;
        }
        self.ctx.set_blend_mode(BlendMode::new(Mix::Normal, Compose::Clear));
        self.ctx.set_paint(solid(Color::BLACK));
        self.ctx.fill_rect(&rect);
        self.ctx.set_blend_mode(BlendMode::default());
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x, y, w, h) = (f64::from(x), f64::from(y), f64::from(w), f64::from(h));
        let rect = Rect::new(x, y, x + w, y + h).abs();
        if rect.is_zero_area() || !rect.is_finite() {
            return;
        }
        self.cast_shadow(rect, 0.0);
        self.ctx.set_paint(solid(self.state.fill));
        self.ctx.fill_rect(&rect);
    }

    fn begin_path(&mut self) {
        self.path = BezPath::new();
        self.subpath_start = None;
        self.current = None;
        self.closed = false;
    }

    fn move_to(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let p = Point::new(f64::from(x), f64::from(y));
        self.path.move_to(p);
        self.subpath_start = Some(p);
        self.current = Some(p);
        self.closed = false;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        if !self.reopen() {
            self.move_to(x, y);
            return;
        }
        let p = Point::new(f64::from(x), f64::from(y));
        self.path.line_to(p);
        self.current = Some(p);
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        if !(cpx.is_finite() && cpy.is_finite() && x.is_finite() && y.is_finite()) {
            return;
        }
        if !self.reopen() {
            self.move_to(cpx, cpy);
        }
        let p = Point::new(f64::from(x), f64::from(y));
        self.path.quad_to(Point::new(f64::from(cpx), f64::from(cpy)), p);
        self.current = Some(p);
    }

    fn close_path(&mut self) {
        if self.current.is_none() || self.closed {
            return;
        }
        self.path.close_path();
        self.current = self.subpath_start;
        self.closed = true;
    }

    fn fill(&mut self) {
        if self.path.elements().is_empty() {
            return;
        }
        let bbox = self.path.bounding_box();
        self.cast_shadow(bbox, leading_corner_radius(&self.path, bbox));
        self.ctx.set_paint(solid(self.state.fill));
        self.ctx.fill_path(&self.path);
    }

    fn clip(&mut self) {
        self.ctx.push_clip_layer(&self.path);
        self.layers += 1;
    }

    fn save(&mut self) {
        self.stack.push((self.state, self.layers));
    }

    fn restore(&mut self) {
        let Some((state, layers)) = self.stack.pop() else {
            return;
        };
        while self.layers > layers {
            self.ctx.pop_layer();
            self.layers -= 1;
        }
        self.state = state;
    }

    fn set_shadow(&mut self, blur: f32, color: Color, offset_x: f32, offset_y: f32) {
        let finite_or_zero = |v: f32| if v.is_finite() { v } else { 0.0 };
        self.state.shadow = Shadow {
            blur: finite_or_zero(blur).max(0.0),
            color,
            offset_x: finite_or_zero(offset_x),
            offset_y: finite_or_zero(offset_y),
        };
    }

    fn draw_image(
        &mut self,
        image: &FrameBuffer,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) -> Result<()> {
        if !image.is_well_formed() {
            return Err(Error::draw(format!(
                "image {}x{} with {} pixels is not drawable",
                image.width,
                image.height,
                image.pixels.len()
            )));
        }
        let dest = [dx, dy, dw, dh];
        if !(dw > 0.0 && dh > 0.0 && dest.iter().all(|v| v.is_finite())) {
            return Ok(());
        }
        let paint = frame_to_image(image)?;
        let (dx, dy, dw, dh) = (f64::from(dx), f64::from(dy), f64::from(dw), f64::from(dh));
        let scale = Affine::scale_non_uniform(dw / image.width as f64, dh / image.height as f64);
        self.ctx.set_paint_transform(Affine::translate((dx, dy)) * scale);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&Rect::new(dx, dy, dx + dw, dy + dh));
        self.ctx.set_paint_transform(Affine::IDENTITY);
        Ok(())
    }

    fn set_font_size(&mut self, px: f32) {
        if px.is_finite() && px > 0.0 {
            self.state.font_px = px;
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign) {
        let scale = ((self.state.font_px / font::GLYPH_H as f32).round() as i32).max(1);
        let width = font::text_width(text, scale);
        let left = match align {
            TextAlign::Left => x.round() as i32,
            TextAlign::Center => (x - width as f32 / 2.0).round() as i32,
            TextAlign::Right => (x - width as f32).round() as i32,
        };
        let top = (y - (font::GLYPH_H * scale) as f32 / 2.0).round() as i32;

        // one square per lit font cell, filled in a single pass
        let mut glyphs = BezPath::new();
        font::for_each_pixel(text, 0, 0, |fx, fy| {
            let x0 = f64::from(left + fx * scale);
            let y0 = f64::from(top + fy * scale);
            let cell = Rect::new(x0, y0, x0 + f64::from(scale), y0 + f64::from(scale));
            for el in cell.path_elements(TOLERANCE) {
                glyphs.push(el);
            }
        });
        if glyphs.elements().is_empty() {
            return;
        }
        self.ctx.set_paint(solid(self.state.fill));
        self.ctx.fill_path(&glyphs);
    }

    fn flush(&mut self) {
        if self.layers > 0 {
            tracing::warn!(open = self.layers, "flush skipped, clip layers still open");
            return;
        }
        self.ctx.flush();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.pixmap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(px: u32) -> u32 {
        px >> 24
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        assert!(matches!(SoftwareCanvas::new(0, 10), Err(Error::Surface(_))));
        assert!(matches!(SoftwareCanvas::new(10, 0), Err(Error::Surface(_))));
        assert!(matches!(SoftwareCanvas::new(70_000, 10), Err(Error::Surface(_))));
    }

    #[test]
    fn fill_rect_covers_exactly_its_pixels() {
        let mut c = SoftwareCanvas::new(10, 10).unwrap();
        c.set_fill_color(Color::rgb(255, 0, 0));
        c.fill_rect(2.0, 2.0, 4.0, 4.0);
        c.flush();
        assert_eq!(c.pixel(2, 2), Some(0xFFFF_0000));
        assert_eq!(c.pixel(5, 5), Some(0xFFFF_0000));
        assert_eq!(c.pixel(6, 6), Some(0));
        assert_eq!(c.pixel(1, 3), Some(0));
        assert_eq!(c.pixel(10, 0), None);
    }

    #[test]
    fn nothing_is_visible_before_flush() {
        let mut c = SoftwareCanvas::new(4, 4).unwrap();
        c.set_fill_color(Color::WHITE);
        c.fill_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(c.pixel(1, 1), Some(0));
        c.flush();
        assert_eq!(c.pixel(1, 1), Some(0xFFFF_FFFF));
    }

    #[test]
    fn clear_rect_resets_to_transparent() {
        let mut c = SoftwareCanvas::new(4, 4).unwrap();
        c.set_fill_color(Color::WHITE);
        c.fill_rect(0.0, 0.0, 4.0, 4.0);
        c.flush();
        c.clear_rect(0.0, 0.0, 4.0, 4.0);
        c.flush();
        assert!((0..4).all(|y| (0..4).all(|x| c.pixel(x, y) == Some(0))));
    }

    #[test]
    fn clip_limits_drawing_until_restore() {
        let mut c = SoftwareCanvas::new(10, 10).unwrap();
        c.save();
        c.begin_path();
        c.move_to(0.0, 0.0);
        c.line_to(5.0, 0.0);
        c.line_to(5.0, 10.0);
        c.line_to(0.0, 10.0);
        c.close_path();
        c.clip();
        c.set_fill_color(Color::WHITE);
        c.fill_rect(0.0, 0.0, 10.0, 5.0);
        c.restore();
        c.fill_rect(0.0, 5.0, 10.0, 5.0);
        c.flush();

        assert_eq!(alpha(c.pixel(2, 2).unwrap()), 255);
        assert_eq!(c.pixel(7, 2), Some(0), "clipped away");
        assert_eq!(alpha(c.pixel(7, 7).unwrap()), 255, "clip gone after restore");
    }

    #[test]
    fn flush_waits_for_open_clips() {
        let mut c = SoftwareCanvas::new(4, 4).unwrap();
        c.set_fill_color(Color::WHITE);
        c.fill_rect(0.0, 0.0, 4.0, 4.0);
        c.save();
        c.begin_path();
        c.clip();
        c.flush();
        assert_eq!(c.pixel(0, 0), Some(0));
        c.restore();
        c.flush();
        assert_eq!(c.pixel(0, 0), Some(0xFFFF_FFFF));
    }

    #[test]
    fn curved_corner_is_not_filled() {
        let mut c = SoftwareCanvas::new(40, 40).unwrap();
        c.set_fill_color(Color::WHITE);
        c.begin_path();
        c.move_to(20.0, 0.0);
        c.line_to(40.0, 0.0);
        c.line_to(40.0, 40.0);
        c.line_to(0.0, 40.0);
        c.line_to(0.0, 20.0);
        c.quadratic_curve_to(0.0, 0.0, 20.0, 0.0);
        c.close_path();
        c.fill();
        c.flush();
        assert_eq!(c.pixel(0, 0), Some(0));
        assert_eq!(alpha(c.pixel(20, 20).unwrap()), 255);
    }

    #[test]
    fn leading_corner_gives_the_radius() {
        let mut rounded = BezPath::new();
        rounded.move_to((15.0, 10.0));
        rounded.line_to((40.0, 10.0));
        rounded.line_to((40.0, 40.0));
        rounded.line_to((10.0, 40.0));
        rounded.close_path();
        assert_eq!(leading_corner_radius(&rounded, rounded.bounding_box()), 5.0);

        let mut square = BezPath::new();
        square.move_to((10.0, 40.0));
        square.line_to((10.0, 10.0));
        square.line_to((40.0, 10.0));
        square.close_path();
        assert_eq!(leading_corner_radius(&square, square.bounding_box()), 0.0);
    }

    #[test]
    fn shadow_darkens_outside_the_shape() {
        let mut c = SoftwareCanvas::new(40, 40).unwrap();
        c.set_shadow(8.0, Color::BLACK, 0.0, 0.0);
        c.set_fill_color(Color::WHITE);
        c.fill_rect(10.0, 10.0, 20.0, 20.0);
        c.flush();
        assert!(alpha(c.pixel(8, 20).unwrap()) > 0, "shadow halo expected");
        assert_eq!(c.pixel(20, 20), Some(0xFFFF_FFFF));
        assert_eq!(c.pixel(0, 0).map(alpha), Some(0), "halo fades out");
    }

    #[test]
    fn offset_shadow_without_blur_is_a_hard_copy() {
        let mut c = SoftwareCanvas::new(20, 20).unwrap();
        c.set_shadow(0.0, Color::BLACK, 5.0, 0.0);
        c.set_fill_color(Color::WHITE);
        c.fill_rect(2.0, 2.0, 6.0, 6.0);
        c.flush();
        assert_eq!(c.pixel(10, 4), Some(0xFF00_0000));
        assert_eq!(c.pixel(4, 4), Some(0xFFFF_FFFF));
    }

    #[test]
    fn draw_image_scales_and_rejects_malformed_frames() {
        let mut c = SoftwareCanvas::new(8, 8).unwrap();
        let img = FrameBuffer { width: 2, height: 1, pixels: vec![0x00FF_0000, 0x0000_00FF] };
        c.draw_image(&img, 0.0, 0.0, 8.0, 8.0).unwrap();
        c.flush();
        assert_eq!(c.pixel(1, 4), Some(0xFFFF_0000));
        assert_eq!(c.pixel(6, 4), Some(0xFF00_00FF));

        let broken = FrameBuffer { width: 4, height: 4, pixels: vec![0; 3] };
        assert!(matches!(c.draw_image(&broken, 0.0, 0.0, 8.0, 8.0), Err(Error::Draw(_))));
    }

    #[test]
    fn text_is_centred_on_the_anchor() {
        let mut c = SoftwareCanvas::new(40, 20).unwrap();
        c.set_fill_color(Color::WHITE);
        c.set_font_size(7.0);
        c.fill_text("I", 20.0, 10.0, TextAlign::Center);
        c.flush();
        let lit: Vec<usize> = (0..40).filter(|&x| c.pixel(x, 10).is_some_and(|p| p != 0)).collect();
        assert!(!lit.is_empty());
        assert!(lit.iter().all(|&x| (18..=22).contains(&x)));
    }

    #[test]
    fn flatten_blends_over_background() {
        let mut c = SoftwareCanvas::new(2, 1).unwrap();
        c.set_fill_color(Color::WHITE);
        c.fill_rect(0.0, 0.0, 1.0, 1.0);
        c.flush();
        let bg = FrameBuffer::solid(2, 1, 0x0000_00FF);
        let out = c.flatten_onto(&bg).unwrap();
        assert_eq!(out.pixels, vec![0x00FF_FFFF, 0x0000_00FF]);
        assert!(c.flatten_onto(&FrameBuffer::solid(3, 1, 0)).is_err());
    }

    #[test]
    fn unpremultiply_restores_straight_colour() {
        assert_eq!(unpremultiply([0, 0, 0, 0]), 0);
        assert_eq!(unpremultiply([255, 0, 0, 255]), 0xFFFF_0000);
        assert_eq!(unpremultiply([64, 0, 0, 128]), 0x8080_0000);
    }
}
