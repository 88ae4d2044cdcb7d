use ndarray::Array2;

use super::euclidean;

/// Median of the strictly-upper-triangle pairwise Euclidean distances, the
/// standard bandwidth heuristic for Gaussian kernels.
///
/// Falls back to 1.0 when every pair coincides, so a degenerate sample still
/// produces a usable (constant) kernel.
pub fn median_bandwidth(data: &Array2<f64>) -> f64 {
    let dist = euclidean(data);
    let n = dist.nrows();
    let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(dist[[i, j]]);
        }
    }
    if pairs.is_empty() {
        return 1.0;
    }
    pairs.sort_by(|a, b| a.partial_cmp(b).expect("distances are never NaN"));
    let mid = pairs[pairs.len() / 2];
    if mid > 0.0 { mid } else { 1.0 }
}

/// Gaussian (RBF) Gram matrix: K[i][j] = exp(-‖xᵢ-xⱼ‖² / (2σ²)).
///
/// With `bandwidth = None` the median heuristic is used.
pub fn gaussian_kernel(data: &Array2<f64>, bandwidth: Option<f64>) -> Array2<f64> {
    let sigma = bandwidth.unwrap_or_else(|| median_bandwidth(data));
    let denom = 2.0 * sigma * sigma;
    let dist = euclidean(data);
    let n = dist.nrows();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let d = dist[[i, j]];
            out[[i, j]] = (-d * d / denom).exp();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn unit_diagonal_and_symmetry() {
        let data = array![[0.0], [1.0], [2.5]];
        let k = gaussian_kernel(&data, Some(1.0));
        for i in 0..3 {
            assert_abs_diff_eq!(k[[i, i]], 1.0, epsilon = 1e-12);
            for j in 0..3 {
                assert_abs_diff_eq!(k[[i, j]], k[[j, i]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn known_value_at_unit_bandwidth() {
        let data = array![[0.0], [1.0]];
        let k = gaussian_kernel(&data, Some(1.0));
        // exp(-1/2)
        assert_abs_diff_eq!(k[[0, 1]], (-0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn median_heuristic_on_two_clusters() {
        // distances: {0, 1, 1, 1, 1, 0} -> sorted upper triangle {0, 0, 1, 1, 1, 1}
        let data = array![[0.0], [0.0], [1.0], [1.0]];
        assert_abs_diff_eq!(median_bandwidth(&data), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_sample_falls_back_to_unit_bandwidth() {
        let data = array![[2.0], [2.0], [2.0]];
        assert_abs_diff_eq!(median_bandwidth(&data), 1.0, epsilon = 1e-12);
        let k = gaussian_kernel(&data, None);
        assert_abs_diff_eq!(k[[0, 2]], 1.0, epsilon = 1e-12);
    }
}
