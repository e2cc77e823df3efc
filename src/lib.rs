#![forbid(unsafe_code)]

pub mod camera;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod renderer;
pub mod scheduler;
pub mod stats;
pub mod types;
pub mod video;
pub mod window;

pub use canvas::{Canvas2d, SoftwareCanvas, TextAlign};
pub use compositor::{FrameCompositor, FrameOutcome, PlaceholderReason};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use renderer::{ConfigAdjustment, PipRenderer, RenderState};
pub use scheduler::{
    Clock, FrameHandle, FrameScheduler, ManualClock, ManualScheduler, SystemClock,
};
pub use stats::PerformanceStats;
pub use types::{
    Color, FrameBuffer, InsetGeometry, PipConfig, PipConfigPatch, PipPosition, PipStyle,
};
pub use video::{ReadyState, StillImage, VideoSource};
