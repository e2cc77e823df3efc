// Opens a webcam through nokhwa and exposes its latest frame as a `VideoSource`.
// `poll()` pulls one frame; the renderer only ever reads the cached copy.

use crate::error::{Error, Result};
use crate::types::FrameBuffer;
use crate::video::{ReadyState, VideoSource};

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
    latest: Option<FrameBuffer>,
}

impl CameraCapture {
    /// Open camera `index` near the requested resolution (the driver may pick another).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );

        // Ask for RGB frames, closest to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        let (width, height) = (actual.width(), actual.height());
        tracing::info!(index, width, height, "camera stream open");

        Ok(Self { cam, width, height, latest: None })
    }

    /// Grab and decode the next frame (blocks until the driver delivers one).
    pub fn next_frame(&mut self) -> Result<FrameBuffer> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        // Pack as 0x00RRGGBB ourselves; nokhwa's image types need not match ours.
        let (w, h) = rgb_img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for pixel in rgb_img.pixels() {
            out.push(((pixel[0] as u32) << 16) | ((pixel[1] as u32) << 8) | pixel[2] as u32);
        }
        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels: out })
    }

    /// Refresh the cached frame. A failed grab keeps the last good frame.
    pub fn poll(&mut self) {
        match self.next_frame() {
            Ok(frame) => self.latest = Some(frame),
            Err(e) => tracing::warn!(error = %e, "camera frame dropped"),
        }
    }

    /// The resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl VideoSource for CameraCapture {
    fn ready_state(&self) -> ReadyState {
        if self.latest.is_some() { ReadyState::HaveEnoughData } else { ReadyState::HaveNothing }
    }

    fn current_frame(&self) -> Option<&FrameBuffer> {
        self.latest.as_ref()
    }
}
