//! Margin clustering: snap box origins to shared layout positions.
//!
//! UI layouts align many elements to a common left margin or row baseline.
//! Detector boxes scatter around those positions; clustering the normalized
//! coordinates per axis and snapping each box to its cluster mean recovers
//! the shared grid without any pixel access.

use ndarray::Array1;

use crate::refinement::types::ElementBox;

/// Density-based clustering of normalized box origins, one axis at a time.
#[derive(Debug, Clone)]
pub struct MarginClusterSnapper {
    /// Neighbourhood radius in normalized (0..1) coordinates.
    pub eps: f64,
}

impl MarginClusterSnapper {
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    /// Snap `x`/`y` of every box to its cluster mean; extents are untouched.
    ///
    /// This stage never fails: empty input or a degenerate image returns the
    /// input unchanged.
    pub fn snap(&self, boxes: &[ElementBox], img_w: u32, img_h: u32) -> Vec<ElementBox> {
        if boxes.is_empty() || img_w == 0 || img_h == 0 {
            return boxes.to_vec();
        }

        let xs = Array1::from_iter(boxes.iter().map(|b| b.x as f64 / img_w as f64));
        let ys = Array1::from_iter(boxes.iter().map(|b| b.y as f64 / img_h as f64));

        let (col_labels, col_centers) = cluster_1d(&xs, self.eps);
        let (row_labels, row_centers) = cluster_1d(&ys, self.eps);

        boxes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let x_snap = match col_centers.get(col_labels[i]) {
                    Some(center) => (center * img_w as f64).round() as i32,
                    None => b.x,
                };
                let y_snap = match row_centers.get(row_labels[i]) {
                    Some(center) => (center * img_h as f64).round() as i32,
                    None => b.y,
                };
                b.with_rect(x_snap, y_snap, b.width, b.height)
            })
            .collect()
    }
}

/// Single-axis density clustering with a minimum cluster size of one.
///
/// Every point joins some cluster, so clusters are exactly the connected
/// components under eps-chaining along the sorted axis. Returns per-point
/// labels and the mean value per label.
fn cluster_1d(values: &Array1<f64>, eps: f64) -> (Vec<usize>, Vec<f64>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut labels = vec![0usize; n];
    let mut sums: Vec<(f64, usize)> = Vec::new();

    let mut current = 0usize;
    for (rank, &idx) in order.iter().enumerate() {
        if rank == 0 {
            sums.push((0.0, 0));
        } else {
            let prev = order[rank - 1];
            if values[idx] - values[prev] > eps {
                current += 1;
                sums.push((0.0, 0));
            }
        }
        labels[idx] = current;
        sums[current].0 += values[idx];
        sums[current].1 += 1;
    }

    let centers = sums.into_iter().map(|(s, c)| s / c as f64).collect();
    (labels, centers)
}
