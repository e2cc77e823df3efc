// Error type for the whole crate.
// Every variant states *where* things went wrong.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Updating the window buffer failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),

    /// Opening/starting the camera failed.
    #[error("camera init error: {0}")]
    CameraInit(String),

    /// Grabbing/decoding a frame failed.
    #[error("camera frame error: {0}")]
    CameraFrame(String),

    /// The destination surface cannot be drawn to.
    #[error("surface error: {0}")]
    Surface(String),

    /// A single draw call failed (recoverable per frame).
    #[error("draw error: {0}")]
    Draw(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any call on a renderer after `destroy()`.
    #[error("renderer has been destroyed")]
    Destroyed,
}

impl Error {
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn draw(msg: impl Into<String>) -> Self {
        Self::Draw(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
