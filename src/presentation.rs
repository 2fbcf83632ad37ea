//! Display sink used by the playback session.

use crate::config::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::detection::{BoundingBox, Detection};
use image::RgbImage;

/// Which group of controls is visible; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSet {
    /// "Browse Files" and "Detect Objects", with the input/output panes
    Image,
    /// "Start Camera" and "Stop Camera", with the live pane
    Webcam,
}

/// Where a preview is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewTarget {
    /// Left pane in Image mode: the loaded still
    Input,
    /// Right pane in Image mode: the annotated still
    Output,
    /// Single pane in Webcam mode
    Live,
}

impl PreviewTarget {
    /// Nominal pane size. Image mode splits the viewport into two half-size panes.
    pub fn size(self) -> (u32, u32) {
        match self {
            PreviewTarget::Input | PreviewTarget::Output => {
                (VIEWPORT_WIDTH / 2, VIEWPORT_HEIGHT / 2)
            }
            PreviewTarget::Live => (VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
        }
    }
}

/// Trait for presentation sinks
pub trait Presenter {
    /// Show `image` in `target`, scaled to `size`
    fn show_preview(&mut self, target: PreviewTarget, image: &RgbImage, size: (u32, u32));

    fn set_status_text(&mut self, text: &str);

    fn set_visible_controls(&mut self, controls: ControlSet);

    /// Detections belonging to the annotated preview just shown in `target`,
    /// in the pixel space of a `frame_size` frame
    fn show_detections(
        &mut self,
        _target: PreviewTarget,
        _frame_size: (u32, u32),
        _detections: &[Detection],
    ) {
    }

    /// Forget the detections of the previous preview
    fn clear_detections(&mut self) {}
}

/// Tag text drawn next to a box, e.g. `plastic 87%`
pub fn tag_text(det: &Detection) -> String {
    format!("{} {:.0}%", det.label, det.confidence * 100.0)
}

/// Map a box from frame pixels onto a pane of `pane_size`
pub fn box_in_pane(bbox: &BoundingBox, frame_size: (u32, u32), pane_size: (u32, u32)) -> BoundingBox {
    let sx = pane_size.0 as f32 / frame_size.0.max(1) as f32;
    let sy = pane_size.1 as f32 / frame_size.1.max(1) as f32;
    bbox.scaled(sx, sy)
}

/// Top-left corner of a `tag_height` tall tag for `bbox`: sitting on the top
/// edge of the box, or just inside it when there is no room above
pub fn tag_origin(bbox: &BoundingBox, tag_height: f32) -> (f32, f32) {
    let x = bbox.x1.max(0.0);
    let y = if bbox.y1 - tag_height < 0.0 {
        bbox.y1.max(0.0)
    } else {
        bbox.y1 - tag_height
    };
    (x, y)
}
