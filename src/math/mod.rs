mod combinat;
mod distance;
mod kernel;

pub use combinat::{falling_factorial, ln_falling_factorial};
pub use distance::{euclidean, half_squared_euclidean};
pub use kernel::{gaussian_kernel, median_bandwidth};
