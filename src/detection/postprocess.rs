use super::types::{BoundingBox, Detection};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Mask coefficient rows appended by YOLOv8 segmentation heads
pub const MASK_COEFFS_NUM: usize = 32;

/// Layout of a YOLOv8 detection head output, `[1, rows, anchors]`
#[derive(Debug, Clone, Copy)]
pub struct HeadLayout {
    pub rows: usize,
    pub anchors: usize,
    pub has_masks: bool,
}

impl HeadLayout {
    pub fn num_classes(&self) -> usize {
        let reserved = if self.has_masks { 4 + MASK_COEFFS_NUM } else { 4 };
        self.rows.saturating_sub(reserved)
    }
}

/// Decode raw head output into candidate detections in model-input coordinates
pub fn decode(
    data: &[f32],
    layout: HeadLayout,
    confidence: f32,
    class_names: &[String],
) -> Vec<Detection> {
    let n = layout.anchors;
    let num_classes = layout.num_classes();
    if data.len() < layout.rows * n {
        tracing::warn!(
            "Head output has {} values, expected {}x{}",
            data.len(),
            layout.rows,
            n
        );
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for i in 0..n {
        let mut best = (0usize, 0.0f32);
        for c in 0..num_classes {
            let score = data[(4 + c) * n + i];
            if score > best.1 {
                best = (c, score);
            }
        }

        let (class_id, score) = best;
        if score < confidence {
            continue;
        }

        candidates.push(Detection {
            bbox: BoundingBox::from_center(data[i], data[n + i], data[2 * n + i], data[3 * n + i]),
            confidence: score,
            class_id,
            label: label_for(class_id, class_names),
        });
    }
    candidates
}

/// Class-agnostic non-maximum suppression, strongest first
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for cand in candidates {
        if kept.iter().all(|k| k.bbox.iou(&cand.bbox) <= iou_threshold) {
            kept.push(cand);
        }
    }
    kept
}

pub fn label_for(class_id: usize, class_names: &[String]) -> String {
    class_names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class {}", class_id))
}

/// Parse the `names` metadata Ultralytics writes into exported models,
/// e.g. `{0: 'glass', 1: 'metal', 2: 'paper'}`
pub fn parse_class_names(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    let entries: BTreeMap<usize, String> = serde_json::from_str(&dict_literal_to_json(raw))?;

    // Gaps keep their positional fallback label
    let len = entries.keys().next_back().map_or(0, |id| id + 1);
    let mut names: Vec<String> = (0..len).map(|id| format!("class {}", id)).collect();
    for (id, name) in entries {
        names[id] = name;
    }
    Ok(names)
}

/// Rewrite a Python dict literal with integer keys and quoted string values as JSON
fn dict_literal_to_json(raw: &str) -> String {
    let mut json = String::with_capacity(raw.len() + 16);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                json.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            Some('\'') => json.push('\''),
                            Some(escaped) => {
                                json.push('\\');
                                json.push(escaped);
                            }
                            None => {}
                        },
                        _ if inner == c => break,
                        '"' => json.push_str("\\\""),
                        _ => json.push(inner),
                    }
                }
                json.push('"');
            }
            // Bare integer keys become JSON strings
            _ if c.is_ascii_digit() => {
                json.push('"');
                json.push(c);
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    json.push(d);
                    chars.next();
                }
                json.push('"');
            }
            _ => json.push(c),
        }
    }
    json
}
