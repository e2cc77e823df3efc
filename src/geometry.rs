// Inset placement: where the PiP square sits on the surface and how round it is.

use crate::types::{InsetGeometry, PipPosition, PipStyle};

/// Distance kept between the inset and the nearest surface edges.
pub const MARGIN: f32 = 20.0;

/// Upper bound on the corner radius of the `Rounded` style.
pub const MAX_ROUNDED_RADIUS: f32 = 20.0;

/// Derive the inset rectangle for a surface of `canvas_width` x `canvas_height`.
///
/// `size` is a percentage of the shorter surface side and is expected to be
/// clamped already. The result is always square.
pub fn compute_inset(
    position: PipPosition,
    size: f32,
    style: PipStyle,
    canvas_width: f32,
    canvas_height: f32,
) -> InsetGeometry {
    let pip = canvas_width.min(canvas_height) * size / 100.0;

    let (x, y) = match position {
        PipPosition::TopLeft => (MARGIN, MARGIN),
        PipPosition::TopRight => (canvas_width - pip - MARGIN, MARGIN),
        PipPosition::BottomLeft => (MARGIN, canvas_height - pip - MARGIN),
        PipPosition::BottomRight => (canvas_width - pip - MARGIN, canvas_height - pip - MARGIN),
    };

    InsetGeometry { x, y, width: pip, height: pip, border_radius: border_radius(style, pip) }
}

pub fn border_radius(style: PipStyle, pip: f32) -> f32 {
    match style {
        PipStyle::Circle => pip / 2.0,
        PipStyle::Rounded => (pip * 0.2).min(MAX_ROUNDED_RADIUS),
        PipStyle::Square => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_right_on_800x600() {
        let g = compute_inset(PipPosition::BottomRight, 25.0, PipStyle::Square, 800.0, 600.0);
        assert_eq!(g.width, 150.0);
        assert_eq!(g.height, 150.0);
        assert_eq!(g.x, 630.0);
        assert_eq!(g.y, 430.0);
        assert_eq!(g.border_radius, 0.0);
    }

    #[test]
    fn top_left_ignores_size() {
        for size in [10.0, 25.0, 50.0] {
            let g = compute_inset(PipPosition::TopLeft, size, PipStyle::Rounded, 800.0, 600.0);
            assert_eq!((g.x, g.y), (20.0, 20.0));
        }
    }

    #[test]
    fn every_position_stays_inside_the_margins() {
        for (w, h) in [(800.0, 600.0), (1920.0, 1080.0), (480.0, 640.0), (200.0, 200.0)] {
            for pos in PipPosition::ALL {
                for size in [10.0, 33.0, 50.0] {
                    let g = compute_inset(pos, size, PipStyle::Square, w, h);
                    assert!(g.x >= MARGIN && g.y >= MARGIN, "{pos} {w}x{h}");
                    assert!(g.x + g.width <= w - MARGIN + 1e-3, "{pos} {w}x{h}");
                    assert!(g.y + g.height <= h - MARGIN + 1e-3, "{pos} {w}x{h}");
                    assert_eq!(g.width, g.height);
                }
            }
        }
    }

    #[test]
    fn radius_follows_style() {
        const W: f32 = 1280.0;
        const H: f32 = 720.0;
        for size in [10.0, 20.0, 35.0, 50.0] {
            let circle = compute_inset(PipPosition::TopRight, size, PipStyle::Circle, W, H);
            assert_eq!(circle.border_radius, circle.width / 2.0);

            let square = compute_inset(PipPosition::TopRight, size, PipStyle::Square, W, H);
            assert_eq!(square.border_radius, 0.0);

            let rounded = compute_inset(PipPosition::TopRight, size, PipStyle::Rounded, W, H);
            assert!(rounded.border_radius > 0.0);
            assert!(rounded.border_radius < rounded.width / 2.0);
            assert!(rounded.border_radius <= MAX_ROUNDED_RADIUS);
        }
    }
}
