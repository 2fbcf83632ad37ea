use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Width of the preview viewport
pub const VIEWPORT_WIDTH: u32 = 640;

/// Height of the preview viewport
pub const VIEWPORT_HEIGHT: u32 = 500;

/// Extensions accepted by the still-image loader and the file chooser
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_CONFIDENCE: f32 = 0.4;
pub const DEFAULT_IOU: f32 = 0.45;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Runtime settings shared by the detector and the playback session
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Path to the YOLOv8 ONNX model loaded at startup
    pub model_path: PathBuf,

    /// Capture device index used by the webcam mode
    pub device_index: u32,

    /// Minimum score a detection needs to be kept
    pub confidence: f32,

    /// Overlap above which the weaker of two boxes is suppressed
    pub iou_threshold: f32,

    /// Delay between the end of one live tick and the start of the next
    pub tick_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            device_index: 0,
            confidence: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence > 0.0 && self.confidence <= 1.0) {
            return Err(ConfigError::Confidence(self.confidence));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::Iou(self.iou_threshold));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::TickInterval);
        }
        Ok(())
    }
}

/// Whether `ext` (without the dot) names an accepted still-image format
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.confidence, 0.4);
        assert_eq!(settings.tick_interval, Duration::from_millis(10));
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn confidence_must_be_positive_and_at_most_one() {
        let mut settings = Settings::default();
        settings.confidence = 0.0;
        assert_eq!(settings.validate(), Err(ConfigError::Confidence(0.0)));
        settings.confidence = 1.0;
        assert_eq!(settings.validate(), Ok(()));
        settings.confidence = 1.5;
        assert_eq!(settings.validate(), Err(ConfigError::Confidence(1.5)));
    }

    #[test]
    fn rejects_bad_iou_and_zero_interval() {
        let mut settings = Settings::default();
        settings.iou_threshold = -0.1;
        assert_eq!(settings.validate(), Err(ConfigError::Iou(-0.1)));

        let mut settings = Settings::default();
        settings.tick_interval = Duration::ZERO;
        assert_eq!(settings.validate(), Err(ConfigError::TickInterval));
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("gif"));
        assert!(!is_image_extension("onnx"));
    }
}
