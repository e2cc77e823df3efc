// Paints one complete PiP frame: dimming overlay, framed inset, clipped video.

use crate::canvas::{Canvas2d, TextAlign};
use crate::types::{Color, InsetGeometry, PipConfig};
use crate::video::VideoSource;

pub const DEFAULT_PLACEHOLDER_LABEL: &str = "Waiting for video";

/// Which content ended up inside the inset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Video,
    Placeholder(PlaceholderReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceholderReason {
    /// The source has not buffered a drawable frame yet.
    NotReady,
    /// The image blit failed for this frame.
    DrawFailed,
}

#[derive(Clone, Debug)]
pub struct FrameCompositor {
    label: String,
    placeholder_fill: Color,
    label_color: Color,
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_LABEL)
    }
}

impl FrameCompositor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            placeholder_fill: Color::rgb(0x1a, 0x1a, 0x1a),
            label_color: Color::rgb(0xcc, 0xcc, 0xcc),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Paint a full frame. Never fails: a bad video frame becomes the placeholder.
    pub fn composite<C, V>(
        &self,
        canvas: &mut C,
        video: &V,
        config: &PipConfig,
        geom: &InsetGeometry,
    ) -> FrameOutcome
    where
        C: Canvas2d + ?Sized,
        V: VideoSource + ?Sized,
    {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);

        // 1-2) fresh frame, dimmed behind the inset
        canvas.clear_rect(0.0, 0.0, w, h);
        canvas.set_fill_color(Color::BLACK.with_alpha(config.overlay_opacity));
        canvas.fill_rect(0.0, 0.0, w, h);

        // 3-4) container (the visible border) with its drop shadow
        canvas.save();
        if config.shadow_blur > 0.0 {
            canvas.set_shadow(config.shadow_blur, config.shadow_color, 0.0, 0.0);
        }
        canvas.set_fill_color(config.border_color);
        rounded_rect_path(canvas, geom.x, geom.y, geom.width, geom.height, geom.border_radius);
        canvas.fill();

        // 5) video, masked to the inner rounded rect
        canvas.set_shadow(0.0, Color::TRANSPARENT, 0.0, 0.0);
        let bw = config.border_width;
        let inner = InsetGeometry {
            x: geom.x + bw,
            y: geom.y + bw,
            width: (geom.width - 2.0 * bw).max(0.0),
            height: (geom.height - 2.0 * bw).max(0.0),
            border_radius: (geom.border_radius - bw).max(0.0),
        };
        rounded_rect_path(canvas, inner.x, inner.y, inner.width, inner.height, inner.border_radius);
        canvas.clip();

        let outcome = self.draw_video(canvas, video, &inner);

        // 6) drop the clip and hand the frame to the surface
        canvas.restore();
        canvas.flush();
        outcome
    }

    fn draw_video<C, V>(&self, canvas: &mut C, video: &V, inner: &InsetGeometry) -> FrameOutcome
    where
        C: Canvas2d + ?Sized,
        V: VideoSource + ?Sized,
    {
        if !video.ready_state().can_draw() {
            self.draw_placeholder(canvas, inner);
            return FrameOutcome::Placeholder(PlaceholderReason::NotReady);
        }
        let Some(frame) = video.current_frame() else {
            tracing::warn!("video reports ready but has no frame, drawing placeholder");
            self.draw_placeholder(canvas, inner);
            return FrameOutcome::Placeholder(PlaceholderReason::DrawFailed);
        };
        match canvas.draw_image(frame, inner.x, inner.y, inner.width, inner.height) {
            Ok(()) => FrameOutcome::Video,
            Err(e) => {
                tracing::warn!(error = %e, "video frame draw failed, drawing placeholder");
                self.draw_placeholder(canvas, inner);
                FrameOutcome::Placeholder(PlaceholderReason::DrawFailed)
            }
        }
    }

    fn draw_placeholder<C: Canvas2d + ?Sized>(&self, canvas: &mut C, inner: &InsetGeometry) {
        canvas.set_fill_color(self.placeholder_fill);
        rounded_rect_path(canvas, inner.x, inner.y, inner.width, inner.height, inner.border_radius);
        canvas.fill();

        canvas.set_fill_color(self.label_color);
        canvas.set_font_size((inner.width / 10.0).max(7.0));
        canvas.fill_text(
            &self.label,
            inner.x + inner.width / 2.0,
            inner.y + inner.height / 2.0,
            TextAlign::Center,
        );
    }
}

/// Build a rounded-rectangle path; a zero radius gives sharp corners.
/// The radius is clamped to half the shorter side.
pub fn rounded_rect_path<C: Canvas2d + ?Sized>(
    canvas: &mut C,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    radius: f32,
) {
    let r = radius.clamp(0.0, (w.min(h) / 2.0).max(0.0));
    canvas.begin_path();
    canvas.move_to(x + r, y);
    canvas.line_to(x + w - r, y);
    canvas.quadratic_curve_to(x + w, y, x + w, y + r);
    canvas.line_to(x + w, y + h - r);
    canvas.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
    canvas.line_to(x + r, y + h);
    canvas.quadratic_curve_to(x, y + h, x, y + h - r);
    canvas.line_to(x, y + r);
    canvas.quadratic_curve_to(x, y, x + r, y);
    canvas.close_path();
}
