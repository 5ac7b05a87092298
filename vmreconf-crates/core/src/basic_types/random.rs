use std::fmt::Debug;
use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;

use crate::vmreconf_assert_moderate;

/// Abstraction for randomness, in order to swap out different sources of randomness.
///
/// Tests use a scripted implementation so that "random" choices are known in advance.
pub trait Random: Debug {
    /// Generates a bool which is true with the given probability, which must lie in `[0, 1]`.
    fn generate_bool(&mut self, probability: f64) -> bool;

    /// Samples a usize uniformly from `[range.start, range.end)`.
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;

    /// Samples an i32 uniformly from `[lb, ub]`.
    fn generate_i32_in_range(&mut self, lb: i32, ub: i32) -> i32;
}

impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_bool(&mut self, probability: f64) -> bool {
        vmreconf_assert_moderate!(
            (0.0..=1.0).contains(&probability),
            "It should hold that 0.0 <= {probability} <= 1.0"
        );

        self.gen_bool(probability)
    }

    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }

    fn generate_i32_in_range(&mut self, lb: i32, ub: i32) -> i32 {
        self.gen_range(lb..=ub)
    }
}
