// Core types shared by the geometry calculator, compositor and renderer.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is (pixels)
    pub height: usize,     // how tall the frame is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A frame filled with a single 0x00RRGGBB colour.
    pub fn solid(width: usize, height: usize, rgb: u32) -> Self {
        Self { width, height, pixels: vec![rgb & 0x00FF_FFFF; width * height] }
    }

    /// True when the dimensions are non-zero and agree with the pixel count.
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.width * self.height
    }

    /// Convert a decoded RGB image into packed pixels.
    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for pixel in img.pixels() {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            out.push((r << 16) | (g << 8) | b);
        }
        Self { width: w as usize, height: h as usize, pixels: out }
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.pixels[y as usize * self.width + x as usize];
            image::Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8])
        })
    }
}

/// Straight (non-premultiplied) colour: sRGB bytes plus alpha in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)` and `rgba(r,g,b,a)`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || Error::config(format!("invalid color: {s:?}"));

        if let Some(hex) = s.strip_prefix('#') {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| bad());
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
            // from_str_radix alone would let a leading '+' through
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(bad());
            }
            return match hex.len() {
                3 => Ok(Color::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
                6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)? as f32 / 255.0)),
                _ => Err(bad()),
            };
        }

        let (body, want_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(bad());
        };
        let body = body.strip_suffix(')').ok_or_else(bad)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if want_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(bad());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| bad());
        let a = if want_alpha {
            let a: f32 = parts[3].parse().map_err(|_| bad())?;
            if !a.is_finite() {
                return Err(bad());
            }
            a.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Ok(Color::rgba(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, a))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// Anchor corner of the inset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PipPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl PipPosition {
    pub const ALL: [PipPosition; 4] = [
        PipPosition::TopLeft,
        PipPosition::TopRight,
        PipPosition::BottomLeft,
        PipPosition::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipPosition::TopLeft => "top-left",
            PipPosition::TopRight => "top-right",
            PipPosition::BottomLeft => "bottom-left",
            PipPosition::BottomRight => "bottom-right",
        }
    }

    /// Unknown names fall back to `BottomRight`.
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "top-left" => PipPosition::TopLeft,
            "top-right" => PipPosition::TopRight,
            "bottom-left" => PipPosition::BottomLeft,
            "bottom-right" => PipPosition::BottomRight,
            other => {
                tracing::warn!(position = other, "unknown pip position, using bottom-right");
                PipPosition::BottomRight
            }
        }
    }
}

impl From<String> for PipPosition {
    fn from(s: String) -> Self {
        Self::parse_lossy(&s)
    }
}

impl fmt::Display for PipPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Corner treatment of the inset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PipStyle {
    #[default]
    Square,
    Rounded,
    Circle,
}

impl PipStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            PipStyle::Square => "square",
            PipStyle::Rounded => "rounded",
            PipStyle::Circle => "circle",
        }
    }

    /// Square -> Rounded -> Circle -> Square.
    pub fn next(self) -> Self {
        match self {
            PipStyle::Square => PipStyle::Rounded,
            PipStyle::Rounded => PipStyle::Circle,
            PipStyle::Circle => PipStyle::Square,
        }
    }

    /// Unknown names fall back to `Square`.
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "square" => PipStyle::Square,
            "rounded" => PipStyle::Rounded,
            "circle" => PipStyle::Circle,
            other => {
                tracing::warn!(style = other, "unknown pip style, using square");
                PipStyle::Square
            }
        }
    }
}

impl From<String> for PipStyle {
    fn from(s: String) -> Self {
        Self::parse_lossy(&s)
    }
}

impl fmt::Display for PipStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MIN_SIZE: f32 = 10.0;
pub const MAX_SIZE: f32 = 50.0;
/// Largest shadow blur radius, in pixels, a config can ask for.
pub const MAX_SHADOW_BLUR: f32 = 100.0;

/// Clamp a requested inset size (percent) into [MIN_SIZE, MAX_SIZE]. NaN maps to MIN_SIZE.
pub fn clamp_size(size: f32) -> f32 {
    if size.is_nan() {
        MIN_SIZE
    } else {
        size.clamp(MIN_SIZE, MAX_SIZE)
    }
}

/// The live configuration of one renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipConfig {
    pub position: PipPosition,
    /// Percent of the shorter surface side, always within [MIN_SIZE, MAX_SIZE].
    pub size: f32,
    pub style: PipStyle,
    pub border_width: f32,
    pub border_color: Color,
    pub shadow_blur: f32,
    pub shadow_color: Color,
    /// Darkening of the full frame behind the inset, in [0, 1].
    pub overlay_opacity: f32,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            position: PipPosition::BottomRight,
            size: 25.0,
            style: PipStyle::Rounded,
            border_width: 3.0,
            border_color: Color::WHITE,
            shadow_blur: 10.0,
            shadow_color: Color::rgba(0, 0, 0, 0.5),
            overlay_opacity: 0.3,
        }
    }
}

impl PipConfig {
    /// Overwrite every field present in `patch`, then re-establish the range invariants.
    pub fn apply(&mut self, patch: &PipConfigPatch) {
        if let Some(p) = patch.position {
            self.position = p;
        }
        if let Some(s) = patch.size {
            self.size = s;
        }
        if let Some(s) = patch.style {
            self.style = s;
        }
        if let Some(w) = patch.border_width {
            self.border_width = w;
        }
        if let Some(c) = patch.border_color {
            self.border_color = c;
        }
        if let Some(b) = patch.shadow_blur {
            self.shadow_blur = b;
        }
        if let Some(c) = patch.shadow_color {
            self.shadow_color = c;
        }
        if let Some(o) = patch.overlay_opacity {
            self.overlay_opacity = o;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        self.size = clamp_size(self.size);
        self.border_width = finite_non_negative(self.border_width);
        self.shadow_blur = finite_non_negative(self.shadow_blur).min(MAX_SHADOW_BLUR);
        self.overlay_opacity = if self.overlay_opacity.is_nan() {
            0.0
        } else {
            self.overlay_opacity.clamp(0.0, 1.0)
        };
    }
}

fn finite_non_negative(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Partial configuration; absent fields leave the current value untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipConfigPatch {
    pub position: Option<PipPosition>,
    pub size: Option<f32>,
    pub style: Option<PipStyle>,
    pub border_width: Option<f32>,
    pub border_color: Option<Color>,
    pub shadow_blur: Option<f32>,
    pub shadow_color: Option<Color>,
    pub overlay_opacity: Option<f32>,
}

impl PipConfigPatch {
    /// Fields set in `other` win over fields set in `self`.
    pub fn merged(self, other: PipConfigPatch) -> Self {
        Self {
            position: other.position.or(self.position),
            size: other.size.or(self.size),
            style: other.style.or(self.style),
            border_width: other.border_width.or(self.border_width),
            border_color: other.border_color.or(self.border_color),
            shadow_blur: other.shadow_blur.or(self.shadow_blur),
            shadow_color: other.shadow_color.or(self.shadow_color),
            overlay_opacity: other.overlay_opacity.or(self.overlay_opacity),
        }
    }
}

/// Derived inset rectangle in surface pixel space. Never set by callers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InsetGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub border_radius: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#1a2B3c".parse::<Color>().unwrap(), Color::rgb(0x1a, 0x2b, 0x3c));
        let c: Color = "#00000080".parse().unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn parses_functional_colors() {
        assert_eq!("rgb(1, 2, 3)".parse::<Color>().unwrap(), Color::rgb(1, 2, 3));
        assert_eq!("rgba(0,0,0,0.5)".parse::<Color>().unwrap(), Color::rgba(0, 0, 0, 0.5));
    }

    #[test]
    fn rejects_bad_colors() {
        let bad = [
            "", "#12", "#ggg", "red", "rgb(1,2)", "rgba(1,2,3)", "rgb(300,0,0)", "#éé", "#+f+f+f",
            "#+fffff",
        ];
        for s in bad {
            assert!(s.parse::<Color>().is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn unknown_enum_names_fall_back() {
        assert_eq!(PipPosition::parse_lossy("middle"), PipPosition::BottomRight);
        assert_eq!(PipPosition::parse_lossy("Top-Left"), PipPosition::TopLeft);
        assert_eq!(PipStyle::parse_lossy("hexagon"), PipStyle::Square);
        assert_eq!(PipStyle::parse_lossy("circle"), PipStyle::Circle);
    }

    #[test]
    fn size_is_clamped() {
        assert_eq!(clamp_size(5.0), 10.0);
        assert_eq!(clamp_size(60.0), 50.0);
        assert_eq!(clamp_size(33.0), 33.0);
        assert_eq!(clamp_size(f32::NAN), 10.0);
    }

    #[test]
    fn shadow_blur_is_capped() {
        let mut cfg = PipConfig::default();
        cfg.apply(&PipConfigPatch { shadow_blur: Some(1e6), ..Default::default() });
        assert_eq!(cfg.shadow_blur, MAX_SHADOW_BLUR);
        cfg.apply(&PipConfigPatch { shadow_blur: Some(f32::INFINITY), ..Default::default() });
        assert_eq!(cfg.shadow_blur, 0.0);
        cfg.apply(&PipConfigPatch { shadow_blur: Some(24.0), ..Default::default() });
        assert_eq!(cfg.shadow_blur, 24.0);
    }

    #[test]
    fn apply_overwrites_only_present_fields() {
        let mut cfg = PipConfig::default();
        cfg.apply(&PipConfigPatch {
            size: Some(80.0),
            style: Some(PipStyle::Circle),
            ..Default::default()
        });
        assert_eq!(cfg.size, 50.0);
        assert_eq!(cfg.style, PipStyle::Circle);
        assert_eq!(cfg.position, PipPosition::BottomRight);
        assert_eq!(cfg.border_color, Color::WHITE);
    }

    #[test]
    fn patch_deserializes_from_json() {
        let patch: PipConfigPatch = serde_json::from_str(
            r##"{"position":"top-left","size":30,"borderColor":"#ff0000","overlayOpacity":0.5}"##,
        )
        .unwrap();
        assert_eq!(patch.position, Some(PipPosition::TopLeft));
        assert_eq!(patch.size, Some(30.0));
        assert_eq!(patch.border_color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(patch.style, None);
    }

    #[test]
    fn merged_prefers_later_fields() {
        let a = PipConfigPatch {
            size: Some(20.0),
            style: Some(PipStyle::Square),
            ..Default::default()
        };
        let b = PipConfigPatch { size: Some(40.0), ..Default::default() };
        let m = a.merged(b);
        assert_eq!(m.size, Some(40.0));
        assert_eq!(m.style, Some(PipStyle::Square));
    }
}
