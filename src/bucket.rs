//! Bucket layouts for [histogram][histogram] metrics.
//!
//! [histogram]: https://prometheus.io/docs/concepts/metric_types/#histogram
use std::cmp;
use std::fmt;
use std::slice;

use {ErrorKind, Result};

/// The rule mapping a sampled value to the index of the bucket that counts it.
///
/// The last bucket of every scheme is the `+Inf` overflow bucket.
///
/// # Examples
///
/// ```
/// use promagg::bucket::{BucketScheme, UpperBound};
///
/// let scheme = BucketScheme::linear(10, 10, 10);
/// assert_eq!(scheme.index(10), 0);
/// assert_eq!(scheme.index(19), 0);
/// assert_eq!(scheme.index(20), 1);
/// assert_eq!(scheme.index(1000), 9);
/// assert_eq!(scheme.upper_bound(0), UpperBound::Finite(20));
/// assert_eq!(scheme.upper_bound(9), UpperBound::Infinite);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketScheme {
    /// Bucket `i` counts the values in `[2^i, 2^(i+1))`.
    Exponential {
        /// Number of buckets.
        count: usize,
    },

    /// Bucket `i` counts the values in `[start + increment*i, start + increment*(i+1))`.
    Linear {
        /// Lower bound of the first bucket.
        start: u64,
        /// Width of a bucket.
        increment: u64,
        /// Number of buckets.
        count: usize,
    },
}
impl BucketScheme {
    /// Makes an exponential scheme with `count` buckets.
    pub fn exponential(count: usize) -> Self {
        BucketScheme::Exponential { count }
    }

    /// Makes a linear scheme with `count` buckets.
    pub fn linear(start: u64, increment: u64, count: usize) -> Self {
        BucketScheme::Linear {
            start,
            increment,
            count,
        }
    }

    /// Returns the number of buckets, including the `+Inf` one.
    pub fn count(&self) -> usize {
        match *self {
            BucketScheme::Exponential { count } | BucketScheme::Linear { count, .. } => count,
        }
    }

    /// Returns the index of the bucket in which `value` is counted.
    ///
    /// Exponential schemes use `floor(log2(max(value, 1)))`, so `0` and `1` share bucket `0`.
    /// Linear schemes put values below `start` into bucket `0`.
    /// Indices beyond the last bucket are clamped to it.
    #[inline]
    pub fn index(&self, value: u64) -> usize {
        let i = match *self {
            BucketScheme::Exponential { .. } => {
                if value == 0 {
                    0
                } else {
                    u64::from(63 - value.leading_zeros())
                }
            }
            BucketScheme::Linear {
                start, increment, ..
            } => value.saturating_sub(start) / increment,
        };
        let last = self.count().saturating_sub(1);
        cmp::min(i, last as u64) as usize
    }

    /// Returns the upper bound reported for the bucket at `index`.
    pub fn upper_bound(&self, index: usize) -> UpperBound {
        if index + 1 >= self.count() {
            return UpperBound::Infinite;
        }
        let n = index as u64 + 1;
        match *self {
            BucketScheme::Exponential { .. } => UpperBound::Finite(1 << n),
            BucketScheme::Linear {
                start, increment, ..
            } => UpperBound::Finite(start + increment * n),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        track_assert!(self.count() >= 1, ErrorKind::InvalidInput);
        match *self {
            BucketScheme::Exponential { count } => {
                track_assert!(count <= 64, ErrorKind::InvalidInput, "count={}", count);
            }
            BucketScheme::Linear {
                start,
                increment,
                count,
            } => {
                track_assert!(increment >= 1, ErrorKind::InvalidInput);
                let last = (count as u64 - 1)
                    .checked_mul(increment)
                    .and_then(|n| n.checked_add(start));
                track_assert!(
                    last.is_some(),
                    ErrorKind::InvalidInput,
                    "Too many buckets: start={}, increment={}, count={}",
                    start,
                    increment,
                    count
                );
            }
        }
        Ok(())
    }
}

/// The upper bound of a bucket, rendered as the `le` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpperBound {
    /// A finite threshold.
    Finite(u64),

    /// The overflow bucket.
    Infinite,
}
impl fmt::Display for UpperBound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            UpperBound::Finite(n) => write!(f, "{}", n),
            UpperBound::Infinite => write!(f, "+Inf"),
        }
    }
}

/// An iterator which yields the running totals of per-bucket counts.
#[derive(Debug)]
pub struct CumulativeBuckets<'a> {
    cumulative_count: u64,
    iter: slice::Iter<'a, u64>,
}
impl<'a> CumulativeBuckets<'a> {
    pub(crate) fn new(buckets: &'a [u64]) -> Self {
        CumulativeBuckets {
            cumulative_count: 0,
            iter: buckets.iter(),
        }
    }
}
impl<'a> Iterator for CumulativeBuckets<'a> {
    type Item = u64;
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|&n| {
            self.cumulative_count = self.cumulative_count.wrapping_add(n);
            self.cumulative_count
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exponential_index_works() {
        let scheme = BucketScheme::exponential(16);
        assert_eq!(scheme.index(0), 0);
        assert_eq!(scheme.index(1), 0);
        for k in 1..15 {
            assert_eq!(scheme.index(1 << k), k as usize);
            assert_eq!(scheme.index((1 << (k + 1)) - 1), k as usize);
        }
        assert_eq!(scheme.index(1 << 15), 15);
        assert_eq!(scheme.index(u64::max_value()), 15);

        let scheme = BucketScheme::exponential(64);
        assert_eq!(scheme.index(u64::max_value()), 63);
    }

    #[test]
    fn linear_index_works() {
        let scheme = BucketScheme::linear(10, 10, 10);
        assert_eq!(scheme.index(10), 0);
        assert_eq!(scheme.index(19), 0);
        assert_eq!(scheme.index(20), 1);
        assert_eq!(scheme.index(99), 8);
        assert_eq!(scheme.index(100), 9);
        assert_eq!(scheme.index(1000), 9);
        assert_eq!(scheme.index(3), 0);
    }

    #[test]
    fn upper_bounds_work() {
        let scheme = BucketScheme::exponential(4);
        let bounds = (0..4).map(|i| scheme.upper_bound(i).to_string()).collect::<Vec<_>>();
        assert_eq!(bounds, ["2", "4", "8", "+Inf"]);

        let scheme = BucketScheme::linear(10, 10, 3);
        let bounds = (0..3).map(|i| scheme.upper_bound(i).to_string()).collect::<Vec<_>>();
        assert_eq!(bounds, ["20", "30", "+Inf"]);

        let scheme = BucketScheme::exponential(64);
        assert_eq!(scheme.upper_bound(62), UpperBound::Finite(1 << 63));
        assert_eq!(scheme.upper_bound(63), UpperBound::Infinite);
    }

    #[test]
    fn validate_works() {
        assert!(BucketScheme::exponential(1).validate().is_ok());
        assert!(BucketScheme::exponential(64).validate().is_ok());
        assert!(BucketScheme::exponential(0).validate().is_err());
        assert!(BucketScheme::exponential(65).validate().is_err());

        assert!(BucketScheme::linear(0, 1, 1).validate().is_ok());
        assert!(BucketScheme::linear(0, 0, 10).validate().is_err());
        assert!(BucketScheme::linear(0, 1, 0).validate().is_err());
        assert!(BucketScheme::linear(u64::max_value(), 1, 2).validate().is_err());
    }

    #[test]
    fn cumulative_buckets_work() {
        let buckets = [2, 1, 0, 3];
        let cumulative = CumulativeBuckets::new(&buckets).collect::<Vec<_>>();
        assert_eq!(cumulative, [2, 3, 3, 6]);
    }
}
