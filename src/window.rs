// Desktop window for the live demo: presents frames and reports hotkeys.

use crate::error::{Error, Result};
use crate::types::{FrameBuffer, PipPosition};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Open a window of the given size, refreshed at most `target_fps` times a second.
    pub fn new(title: &str, width: usize, height: usize, target_fps: usize) -> Result<Self> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(target_fps);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// False once the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Keys 1-4 pick a corner: TL, TR, BL, BR.
    pub fn position_pressed(&self) -> Option<PipPosition> {
        [Key::Key1, Key::Key2, Key::Key3, Key::Key4]
            .into_iter()
            .zip(PipPosition::ALL)
            .find(|(key, _)| self.window.is_key_pressed(*key, KeyRepeat::No))
            .map(|(_, pos)| pos)
    }

    /// +1 for '+'/'=', -1 for '-', held keys repeat.
    pub fn size_step(&self) -> i32 {
        let held = |keys: [Key; 2]| {
            keys.iter().any(|k| self.window.is_key_pressed(*k, KeyRepeat::Yes))
        };
        let up = held([Key::Equal, Key::NumPadPlus]);
        let down = held([Key::Minus, Key::NumPadMinus]);
        up as i32 - down as i32
    }

    pub fn s_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::S, KeyRepeat::No)
    }

    pub fn space_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Space, KeyRepeat::No)
    }
}
