use super::annotate::annotate;
use super::postprocess::{self, HeadLayout};
use super::preprocess::Preprocessor;
use super::types::{AnnotatedFrame, Detector};
use anyhow::{bail, Context, Result};
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use std::path::Path;

const FALLBACK_INPUT_SIZE: (u32, u32) = (640, 640);

/// YOLOv8 detector running an Ultralytics ONNX export
///
/// Works with both plain detection and segmentation exports; for the latter
/// only the boxes are used.
pub struct YoloDetector {
    session: Session,
    preprocessor: Preprocessor,
    class_names: Vec<String>,
    iou_threshold: f32,
}

impl YoloDetector {
    /// Load a model from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `iou_threshold` - Overlap used by non-maximum suppression
    pub fn new<P: AsRef<Path>>(model_path: P, iou_threshold: f32) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading YOLO model from {}", path.display());

        if !path.is_file() {
            bail!("model file {} does not exist", path.display());
        }

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        let (width, height) = model_input_size(&session);
        let class_names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .and_then(|raw| match postprocess::parse_class_names(&raw) {
                Ok(names) => Some(names),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable class names metadata {:?}: {}", raw, e);
                    None
                }
            })
            .unwrap_or_default();

        tracing::info!(
            "YOLO model loaded: input {}x{}, {} class names",
            width,
            height,
            class_names.len()
        );
        tracing::debug!("Classes: {:?}", class_names);

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(width, height),
            class_names,
            iou_threshold,
        })
    }
}

fn model_input_size(session: &Session) -> (u32, u32) {
    session
        .inputs
        .first()
        .and_then(|input| match &input.input_type {
            ValueType::Tensor { shape, .. } if shape.len() == 4 && shape[2] > 0 && shape[3] > 0 => {
                Some((shape[3] as u32, shape[2] as u32))
            }
            _ => None,
        })
        .unwrap_or(FALLBACK_INPUT_SIZE)
}

impl Detector for YoloDetector {
    fn detect(&mut self, frame: &RgbImage, confidence: f32) -> Result<AnnotatedFrame> {
        let _span = tracing::debug_span!("yolo_detect").entered();

        let input = Tensor::from_array(self.preprocessor.preprocess(frame))
            .context("Failed to build input tensor")?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let (layout, data) = {
            let outputs = self
                .session
                .run(ort::inputs![input])
                .context("Failed to run inference")?;
            let has_masks = outputs.len() > 1;
            let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
            if shape.len() != 3 {
                bail!("unexpected detection head shape {:?}", shape);
            }
            let layout = HeadLayout {
                rows: shape[1] as usize,
                anchors: shape[2] as usize,
                has_masks,
            };
            (layout, data.to_vec())
        };
        drop(_infer_span);

        let candidates = postprocess::decode(&data, layout, confidence, &self.class_names);
        let (sx, sy) = self.preprocessor.scale_to(frame);
        let mut detections = postprocess::non_max_suppression(candidates, self.iou_threshold);
        for det in &mut detections {
            det.bbox = det.bbox.scaled(sx, sy);
        }

        tracing::debug!("Objects found: {}", detections.len());

        Ok(AnnotatedFrame {
            image: annotate(frame, &detections),
            detections,
        })
    }
}
