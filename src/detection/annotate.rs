use super::types::{BoundingBox, Detection};
use image::{Rgb, RgbImage};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const BOX_THICKNESS: u32 = 2;

/// Stable, fully saturated colour for a label
pub fn label_color(label: &str) -> [u8; 3] {
    let mut h = DefaultHasher::new();
    label.hash(&mut h);
    let hue = (h.finish() % 360) as f32 / 360.0;

    let x = 1.0 - ((hue * 6.0) % 2.0 - 1.0).abs();
    let (r, g, b) = match (hue * 6.0) as i32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

/// Draw every detection's box onto a copy of `frame`
pub fn annotate(frame: &RgbImage, detections: &[Detection]) -> RgbImage {
    let mut canvas = frame.clone();
    for det in detections {
        draw_box(&mut canvas, &det.bbox, Rgb(label_color(&det.label)));
    }
    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let clamp = |v: f32, max: u32| (v.max(0.0) as u32).min(max - 1);
    let (x1, y1) = (clamp(bbox.x1, w), clamp(bbox.y1, h));
    let (x2, y2) = (clamp(bbox.x2, w), clamp(bbox.y2, h));
    if x2 < x1 || y2 < y1 {
        return;
    }

    for t in 0..BOX_THICKNESS {
        let (top, bottom) = ((y1 + t).min(y2), y2.saturating_sub(t).max(y1));
        let (left, right) = ((x1 + t).min(x2), x2.saturating_sub(t).max(x1));
        for x in x1..=x2 {
            canvas.put_pixel(x, top, color);
            canvas.put_pixel(x, bottom, color);
        }
        for y in y1..=y2 {
            canvas.put_pixel(left, y, color);
            canvas.put_pixel(right, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_is_stable_per_label() {
        assert_eq!(label_color("plastic"), label_color("plastic"));
    }

    #[test]
    fn draws_outline_only() {
        let frame = RgbImage::new(20, 20);
        let det = Detection {
            bbox: BoundingBox { x1: 5.0, y1: 5.0, x2: 15.0, y2: 15.0 },
            confidence: 0.9,
            class_id: 0,
            label: "cardboard".to_string(),
        };
        let color = Rgb(label_color("cardboard"));

        let out = annotate(&frame, &[det]);

        assert_eq!(out.get_pixel(5, 5), &color);
        assert_eq!(out.get_pixel(15, 10), &color);
        assert_eq!(out.get_pixel(6, 6), &color);
        assert_eq!(out.get_pixel(10, 10), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        // input untouched
        assert_eq!(frame.get_pixel(5, 5), &Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_outside_the_frame_are_clamped() {
        let frame = RgbImage::new(10, 10);
        let det = Detection {
            bbox: BoundingBox { x1: -5.0, y1: -5.0, x2: 50.0, y2: 50.0 },
            confidence: 0.5,
            class_id: 0,
            label: "metal".to_string(),
        };

        let out = annotate(&frame, &[det]);

        assert_eq!(out.get_pixel(9, 9), &Rgb(label_color("metal")));
    }
}
