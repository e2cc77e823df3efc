// Video sources the compositor reads frames from.

use crate::error::Result;
use crate::types::FrameBuffer;
use std::path::Path;

/// How much media a source has buffered, in increasing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// True once there is at least one frame that can be drawn.
    pub fn can_draw(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// Anything that can hand the compositor its current frame.
pub trait VideoSource {
    fn ready_state(&self) -> ReadyState;
    fn current_frame(&self) -> Option<&FrameBuffer>;
}

impl<T: VideoSource + ?Sized> VideoSource for &T {
    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    fn current_frame(&self) -> Option<&FrameBuffer> {
        (**self).current_frame()
    }
}

impl<T: VideoSource + ?Sized> VideoSource for &mut T {
    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    fn current_frame(&self) -> Option<&FrameBuffer> {
        (**self).current_frame()
    }
}

/// A single decoded picture that is always ready.
pub struct StillImage {
    frame: FrameBuffer,
}

impl StillImage {
    pub fn new(frame: FrameBuffer) -> Self {
        Self { frame }
    }

    /// Decode any format the `image` crate understands.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())?.to_rgb8();
        let (w, h) = img.dimensions();
        tracing::debug!(path = %path.as_ref().display(), w, h, "loaded still image");
        Ok(Self::new(FrameBuffer::from_rgb_image(&img)))
    }
}

impl VideoSource for StillImage {
    fn ready_state(&self) -> ReadyState {
        ReadyState::HaveEnoughData
    }

    fn current_frame(&self) -> Option<&FrameBuffer> {
        Some(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_current_data_or_better_is_drawable() {
        assert!(!ReadyState::HaveNothing.can_draw());
        assert!(!ReadyState::HaveMetadata.can_draw());
        assert!(ReadyState::HaveCurrentData.can_draw());
        assert!(ReadyState::HaveEnoughData.can_draw());
    }

    #[test]
    fn still_image_is_always_ready() {
        let still = StillImage::new(FrameBuffer::solid(2, 2, 0x00AB_CDEF));
        assert_eq!(still.ready_state(), ReadyState::HaveEnoughData);
        assert_eq!(still.current_frame().map(|f| f.pixels[0]), Some(0x00AB_CDEF));
    }
}
