mod annotate;
mod postprocess;
mod preprocess;
pub mod types;
mod yolo;

pub use annotate::{annotate, label_color};
pub use postprocess::{non_max_suppression, parse_class_names};
pub use preprocess::Preprocessor;
pub use types::{AnnotatedFrame, BoundingBox, Detection, Detector};
pub use yolo::YoloDetector;

use anyhow::Result;
use std::path::Path;

/// Create the default detector (YOLOv8 ONNX)
pub fn create_default_detector(model_path: &Path, iou_threshold: f32) -> Result<Box<dyn Detector>> {
    let detector = YoloDetector::new(model_path, iou_threshold)?;
    Ok(Box::new(detector))
}
