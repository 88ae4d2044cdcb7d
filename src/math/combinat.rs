/// Falling factorial n·(n-1)·…·(n-k+1), used as a combinatorial capacity
/// weight: the number of ordered ways to draw `k` distinct items from a pool
/// of `n`.
///
/// The base cases are deliberately non-standard and load-bearing: the product
/// stops at 1 as soon as either `k` terms have been multiplied **or the
/// running argument reaches zero**, so `falling_factorial(1, 3) == 1` rather
/// than the conventional `1·0·(-1)`. Downstream class-assignment weighting
/// depends on an exhausted pool keeping a residual weight of 1 instead of 0.
pub fn falling_factorial(n: u64, k: u64) -> f64 {
    let mut acc = 1.0;
    let mut n = n;
    for _ in 0..k {
        if n == 0 {
            break;
        }
        acc *= n as f64;
        n -= 1;
    }
    acc
}

/// Natural log of [`falling_factorial`], with the same base cases (`ln 1 = 0`).
///
/// `falling_factorial` leaves `f64` range once the pool exceeds roughly 170
/// items; the log form keeps the class-assignment ratio finite at any pool
/// size.
pub fn ln_falling_factorial(n: u64, k: u64) -> f64 {
    let mut acc = 0.0;
    let mut n = n;
    for _ in 0..k {
        if n == 0 {
            break;
        }
        acc += (n as f64).ln();
        n -= 1;
    }
    acc
}
