use ndarray::Array2;
use num_traits::{Float, FromPrimitive};

/// Pairwise Euclidean distance matrix of the rows of `data`.
///
/// Output is symmetric with a zero diagonal.
pub fn euclidean<F>(data: &Array2<F>) -> Array2<F>
where
    F: Float + FromPrimitive,
{
    let (n, d) = data.dim();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let mut acc = F::zero();
            for k in 0..d {
                let diff = data[[i, k]] - data[[j, k]];
                acc = acc + diff * diff;
            }
            let dist = acc.sqrt();
            out[[i, j]] = dist;
            out[[j, i]] = dist;
        }
    }
    out
}

/// Pairwise squared Euclidean distances divided by two.
///
/// This is the value-side metric of the power pipeline: condition encodings
/// get plain Euclidean distances, observations get sqeuclidean/2.
pub fn half_squared_euclidean<F>(data: &Array2<F>) -> Array2<F>
where
    F: Float + FromPrimitive,
{
    let (n, d) = data.dim();
    let half = F::from_f64(0.5).expect("0.5 is a valid float");
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let mut acc = F::zero();
            for k in 0..d {
                let diff = data[[i, k]] - data[[j, k]];
                acc = acc + diff * diff;
            }
            let dist = acc * half;
            out[[i, j]] = dist;
            out[[j, i]] = dist;
        }
    }
    out
}
