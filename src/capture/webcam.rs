use super::{load_still, CaptureStream, FrameSource};
use crate::error::SourceError;
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use std::path::Path;

/// Frame source backed by the filesystem and nokhwa cameras
#[derive(Debug, Default)]
pub struct WebcamSource;

impl FrameSource for WebcamSource {
    type Capture = WebcamCapture;

    fn load_still(&self, path: &Path) -> Result<RgbImage, SourceError> {
        load_still(path)
    }

    fn open_capture(&mut self, device_index: u32) -> Result<WebcamCapture, SourceError> {
        WebcamCapture::open(device_index)
    }
}

pub struct WebcamCapture {
    camera: Camera,
    index: u32,
}

impl WebcamCapture {
    pub fn open(device_index: u32) -> Result<Self, SourceError> {
        tracing::info!("Opening webcam {}", device_index);

        let unavailable = |reason: String| SourceError::DeviceUnavailable {
            index: device_index,
            reason,
        };

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = Camera::new(index, requested).map_err(|e| unavailable(e.to_string()))?;

        camera
            .open_stream()
            .map_err(|e| unavailable(e.to_string()))?;

        let resolution = camera.resolution();
        tracing::info!(
            "Webcam {} streaming at {}x{}",
            device_index,
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera,
            index: device_index,
        })
    }
}

impl CaptureStream for WebcamCapture {
    fn read_frame(&mut self) -> Result<RgbImage, SourceError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| SourceError::EndOfStream(e.to_string()))?;

        frame
            .decode_image::<RgbFormat>()
            .map_err(|e| SourceError::EndOfStream(format!("failed to decode frame: {e}")))
    }

    fn release(mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop webcam {} cleanly: {}", self.index, e);
        }
        tracing::info!("Webcam {} released", self.index);
    }
}
