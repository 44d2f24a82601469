/// The scalar type used for every probability in the library.
pub type Probability = f64;

/// Tolerance used when checking that a distribution sums to one.
pub const SUM_TOLERANCE: Probability = 1e-9;
