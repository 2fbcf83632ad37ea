use crate::detection::Detection;
use crate::presentation::{ControlSet, Presenter, PreviewTarget};
use image::{imageops, RgbImage};

/// Presenter that buffers everything the window needs for its next repaint
///
/// Previews are kept as `egui::ColorImage`s until the app uploads them as
/// textures, so the session can run without a GPU context.
pub struct EguiPresenter {
    pending: Vec<(PreviewTarget, egui::ColorImage)>,
    status: String,
    controls: ControlSet,
    overlay: Option<DetectionOverlay>,
}

/// Detections to tag on top of one preview pane
#[derive(Debug, Clone)]
pub struct DetectionOverlay {
    pub target: PreviewTarget,
    /// Size of the frame the boxes were measured on
    pub frame_size: (u32, u32),
    pub detections: Vec<Detection>,
}

impl Default for EguiPresenter {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            status: String::new(),
            controls: ControlSet::Image,
            overlay: None,
        }
    }
}

impl EguiPresenter {
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn controls(&self) -> ControlSet {
        self.controls
    }

    pub fn detections(&self) -> &[Detection] {
        self.overlay
            .as_ref()
            .map(|overlay| overlay.detections.as_slice())
            .unwrap_or(&[])
    }

    /// Overlay for `target`, if its current preview has detections
    pub fn overlay_for(&self, target: PreviewTarget) -> Option<&DetectionOverlay> {
        self.overlay.as_ref().filter(|overlay| overlay.target == target)
    }

    /// Previews produced since the last call, latest per target
    pub fn take_pending(&mut self) -> Vec<(PreviewTarget, egui::ColorImage)> {
        std::mem::take(&mut self.pending)
    }
}

impl Presenter for EguiPresenter {
    fn show_preview(&mut self, target: PreviewTarget, image: &RgbImage, size: (u32, u32)) {
        // Live frames arrive every tick, so trade quality for speed there
        let filter = match target {
            PreviewTarget::Live => imageops::FilterType::Triangle,
            PreviewTarget::Input | PreviewTarget::Output => imageops::FilterType::Lanczos3,
        };
        let (width, height) = size;
        let resized = imageops::resize(image, width, height, filter);
        let color = egui::ColorImage::from_rgb([width as usize, height as usize], resized.as_raw());

        self.pending.retain(|(t, _)| *t != target);
        self.pending.push((target, color));
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn set_visible_controls(&mut self, controls: ControlSet) {
        self.controls = controls;
    }

    fn show_detections(
        &mut self,
        target: PreviewTarget,
        frame_size: (u32, u32),
        detections: &[Detection],
    ) {
        self.overlay = Some(DetectionOverlay {
            target,
            frame_size,
            detections: detections.to_vec(),
        });
    }

    fn clear_detections(&mut self) {
        self.overlay = None;
    }
}
