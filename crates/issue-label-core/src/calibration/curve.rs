//! Precision-recall curve for one label.

use std::cmp::Ordering;

/// One point of the curve: deciding "positive" at `score >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub threshold: f32,
    pub precision: f32,
    pub recall: f32,
}

/// Sweep every distinct score, highest first.
///
/// Points are ordered by decreasing threshold (increasing recall). A label
/// with no positive example has no defined recall and yields an empty curve.
pub fn precision_recall_curve(scores: &[f32], truth: &[bool]) -> Vec<CurvePoint> {
    debug_assert_eq!(scores.len(), truth.len());

    let positives = truth.iter().filter(|t| **t).count();
    if positives == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| {
        scores[*b]
            .partial_cmp(&scores[*a])
            .unwrap_or(Ordering::Equal)
    });

    let mut curve = Vec::new();
    let mut true_pos = 0usize;
    let mut false_pos = 0usize;
    let mut i = 0;

    while i < order.len() {
        let threshold = scores[order[i]];

        // Everything tied at this score flips to positive together.
        while i < order.len() && scores[order[i]] == threshold {
            if truth[order[i]] {
                true_pos += 1;
            } else {
                false_pos += 1;
            }
            i += 1;
        }

        curve.push(CurvePoint {
            threshold,
            precision: true_pos as f32 / (true_pos + false_pos) as f32,
            recall: true_pos as f32 / positives as f32,
        });
    }

    curve
}
