//! Box geometry shared by the detection backends.

use crate::detection::domain::raw_detection::RawDetection;

/// IoU between two boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy per-class NMS: sort by confidence descending, then suppress any
/// box overlapping an already-kept box of the same class by more than
/// `iou_thresh`. At most `max_det` boxes survive.
pub fn nms(mut dets: Vec<RawDetection>, iou_thresh: f32, max_det: usize) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets {
        if keep.len() >= max_det {
            break;
        }
        let suppressed = keep.iter().any(|k| {
            k.class_id == det.class_id && bbox_iou(&k.corners(), &det.corners()) > iou_thresh
        });
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}

/// Clamp `[x1, y1, x2, y2]` to an image of `width` × `height` pixels.
pub fn clip_box(corners: [f32; 4], width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width as f32, height as f32);
    [
        corners[0].clamp(0.0, w),
        corners[1].clamp(0.0, h),
        corners[2].clamp(0.0, w),
        corners[3].clamp(0.0, h),
    ]
}
