mod still;
mod webcam;

pub use still::load_still;
pub use webcam::{WebcamCapture, WebcamSource};

use crate::error::SourceError;
use image::RgbImage;
use std::path::Path;

/// Supplies still images on demand and opens live capture streams
pub trait FrameSource {
    type Capture: CaptureStream;

    /// Decode a single image from disk
    fn load_still(&self, path: &Path) -> Result<RgbImage, SourceError>;

    /// Open the capture device at `device_index`
    fn open_capture(&mut self, device_index: u32) -> Result<Self::Capture, SourceError>;
}

/// An open capture device, exclusively owned by the live loop
pub trait CaptureStream {
    /// Read one frame. `SourceError::EndOfStream` is transient.
    fn read_frame(&mut self) -> Result<RgbImage, SourceError>;

    /// Release the device
    fn release(self);
}
