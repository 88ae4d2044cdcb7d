use ndarray::Array2;

use crate::PowerError;

/// Stack `k` samples into the paired matrices an independence test consumes:
/// the condition-encoding matrix `u` and the row-stacked value matrix `v`.
///
/// Without `ways`, `u` is a single column carrying each observation's sample
/// index. With `ways` (one encoding vector per sample), `u` instead repeats
/// the sample's way vector row-wise; the power pipeline passes the four
/// inner cells with ways `[0,0],[0,1],[1,0],[1,1]` when multiway encoding is
/// enabled.
pub fn k_sample_transform(
    samples: &[Array2<f64>],
    ways: Option<&[Vec<f64>]>,
) -> Result<(Array2<f64>, Array2<f64>), PowerError> {
    if samples.len() < 2 {
        return Err(PowerError::invalid(
            "k-sample transform needs at least two samples",
        ));
    }
    let dim = samples[0].ncols();
    let mut total = 0;
    for sample in samples {
        if sample.nrows() == 0 {
            return Err(PowerError::invalid("samples must be non-empty"));
        }
        if sample.ncols() != dim {
            return Err(PowerError::invalid(
                "samples must share the same column count",
            ));
        }
        total += sample.nrows();
    }

    let encoding_dim = match ways {
        Some(ways) => {
            if ways.len() != samples.len() {
                return Err(PowerError::invalid(format!(
                    "got {} way vectors for {} samples",
                    ways.len(),
                    samples.len()
                )));
            }
            let width = ways[0].len();
            if width == 0 || ways.iter().any(|w| w.len() != width) {
                return Err(PowerError::invalid(
                    "way vectors must be non-empty and equally sized",
                ));
            }
            width
        }
        None => 1,
    };

    let mut u = Array2::zeros((total, encoding_dim));
    let mut v = Array2::zeros((total, dim));
    let mut row = 0;
    for (index, sample) in samples.iter().enumerate() {
        for i in 0..sample.nrows() {
            match ways {
                Some(ways) => {
                    for (k, &value) in ways[index].iter().enumerate() {
                        u[[row, k]] = value;
                    }
                }
                None => u[[row, 0]] = index as f64,
            }
            for k in 0..dim {
                v[[row, k]] = sample[[i, k]];
            }
            row += 1;
        }
    }
    Ok((u, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn two_samples_get_binary_labels() {
        let a = array![[1.0], [2.0]];
        let b = array![[3.0], [4.0], [5.0]];
        let (u, v) = k_sample_transform(&[a, b], None).unwrap();
        assert_eq!(u.dim(), (5, 1));
        assert_eq!(v.dim(), (5, 1));
        assert_abs_diff_eq!(u[[0, 0]], 0.0);
        assert_abs_diff_eq!(u[[1, 0]], 0.0);
        assert_abs_diff_eq!(u[[2, 0]], 1.0);
        assert_abs_diff_eq!(u[[4, 0]], 1.0);
        assert_abs_diff_eq!(v[[0, 0]], 1.0);
        assert_abs_diff_eq!(v[[4, 0]], 5.0);
    }

    #[test]
    fn multiway_encoding_repeats_way_vectors() {
        let cells = vec![
            array![[1.0]],
            array![[2.0]],
            array![[3.0]],
            array![[4.0], [5.0]],
        ];
        let ways = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let (u, v) = k_sample_transform(&cells, Some(&ways)).unwrap();
        assert_eq!(u.dim(), (5, 2));
        assert_eq!(v.dim(), (5, 1));
        assert_abs_diff_eq!(u[[0, 0]], 0.0);
        assert_abs_diff_eq!(u[[1, 1]], 1.0);
        assert_abs_diff_eq!(u[[2, 0]], 1.0);
        assert_abs_diff_eq!(u[[3, 0]], 1.0);
        assert_abs_diff_eq!(u[[4, 1]], 1.0);
    }

    #[test]
    fn one_sample_is_rejected() {
        let a = array![[1.0]];
        assert!(k_sample_transform(&[a], None).is_err());
    }

    #[test]
    fn mismatched_way_count_is_rejected() {
        let a = array![[1.0]];
        let b = array![[2.0]];
        let ways = vec![vec![0.0]];
        assert!(k_sample_transform(&[a, b], Some(&ways)).is_err());
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let a = array![[1.0]];
        let b = array![[2.0, 3.0]];
        assert!(k_sample_transform(&[a, b], None).is_err());
    }
}
