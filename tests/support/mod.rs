#![allow(dead_code)]

use pip_overlay::{Canvas2d, Color, FrameBuffer, ReadyState, TextAlign, VideoSource};

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    ClearRect(f32, f32, f32, f32),
    SetFill(Color),
    FillRect(f32, f32, f32, f32),
    BeginPath,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Quad(f32, f32, f32, f32),
    ClosePath,
    Fill,
    Clip,
    Save,
    Restore,
    Shadow(f32, Color),
    DrawImage(f32, f32, f32, f32),
    FontSize(f32),
    FillText(String, f32, f32),
}

/// Canvas that only records what was asked of it.
pub struct RecordingCanvas {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<Op>,
    pub fail_draw_image: bool,
}

impl RecordingCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, ops: Vec::new(), fail_draw_image: false }
    }

    pub fn failing(width: u32, height: u32) -> Self {
        Self { fail_draw_image: true, ..Self::new(width, height) }
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    pub fn draw_images(&self) -> usize {
        self.count(|op| matches!(op, Op::DrawImage(..)))
    }

    pub fn texts(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::FillText(t, ..) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas2d for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Op::ClearRect(x, y, w, h))
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ops.push(Op::SetFill(color))
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Op::FillRect(x, y, w, h))
    }

    fn begin_path(&mut self) {
        self.ops.push(Op::BeginPath)
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.ops.push(Op::MoveTo(x, y))
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.ops.push(Op::LineTo(x, y))
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        self.ops.push(Op::Quad(cpx, cpy, x, y))
    }

    fn close_path(&mut self) {
        self.ops.push(Op::ClosePath)
    }

    fn fill(&mut self) {
        self.ops.push(Op::Fill)
    }

    fn clip(&mut self) {
        self.ops.push(Op::Clip)
    }

    fn save(&mut self) {
        self.ops.push(Op::Save)
    }

    fn restore(&mut self) {
        self.ops.push(Op::Restore)
    }

    fn set_shadow(&mut self, blur: f32, color: Color, _offset_x: f32, _offset_y: f32) {
        self.ops.push(Op::Shadow(blur, color))
    }

    fn draw_image(
        &mut self,
        _image: &FrameBuffer,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) -> pip_overlay::Result<()> {
        self.ops.push(Op::DrawImage(dx, dy, dw, dh));
        if self.fail_draw_image {
            return Err(pip_overlay::Error::draw("source went away"));
        }
        Ok(())
    }

    fn set_font_size(&mut self, px: f32) {
        self.ops.push(Op::FontSize(px))
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, _align: TextAlign) {
        self.ops.push(Op::FillText(text.to_string(), x, y))
    }
}

pub struct FakeVideo {
    pub state: ReadyState,
    pub frame: Option<FrameBuffer>,
}

impl FakeVideo {
    pub fn ready() -> Self {
        Self {
            state: ReadyState::HaveEnoughData,
            frame: Some(FrameBuffer::solid(4, 4, 0x00_20_80_F0)),
        }
    }

    pub fn not_ready() -> Self {
        Self { state: ReadyState::HaveMetadata, frame: None }
    }
}

impl VideoSource for FakeVideo {
    fn ready_state(&self) -> ReadyState {
        self.state
    }

    fn current_frame(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }
}
