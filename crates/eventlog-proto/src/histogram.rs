//! Histogram payloads.

use std::sync::OnceLock;

use crate::error::{EncodeError, EncodeResult};
use crate::schema::HistogramProto;

/// How values are bucketed.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Bins {
    /// Exponential buckets `±1e-12 * 1.1^k` up to `1e20`, plus zero and the
    /// extremes of `f64`
    #[default]
    Default,
    /// `n` equal-width buckets spanning the observed range
    Count(usize),
    /// Explicit, strictly increasing upper bucket limits
    Edges(Vec<f64>),
}

/// Values to summarize as a histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramInput {
    pub values: Vec<f64>,
    pub bins: Bins,
}

impl HistogramInput {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            bins: Bins::Default,
        }
    }

    pub fn with_bins(mut self, bins: Bins) -> Self {
        self.bins = bins;
        self
    }

    pub fn encode(self) -> EncodeResult<HistogramProto> {
        if let Some(bad) = self.values.iter().find(|v| !v.is_finite()) {
            return Err(EncodeError::InvalidHistogram(format!(
                "non-finite value {}",
                bad
            )));
        }

        let mut proto = HistogramProto::default();
        if self.values.is_empty() {
            if let Bins::Count(0) = self.bins {
                return Err(EncodeError::InvalidHistogram("zero bins".to_string()));
            }
            return Ok(proto);
        }

        let (min, max) = self
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let limits = bucket_limits(&self.bins, min, max)?;

        let mut counts = vec![0u64; limits.len()];
        for &v in &self.values {
            // Bucket i holds (limits[i - 1], limits[i]].
            counts[limits.partition_point(|&limit| limit < v)] += 1;
        }

        for (limit, count) in limits.iter().zip(counts) {
            if count > 0 {
                proto.bucket_limit.push(*limit);
                proto.bucket.push(count as f64);
            }
        }
        proto.min = min;
        proto.max = max;
        proto.num = self.values.len() as f64;
        proto.sum = self.values.iter().sum();
        proto.sum_squares = self.values.iter().map(|v| v * v).sum();
        Ok(proto)
    }
}

/// Upper limits such that the last limit covers `max`.
fn bucket_limits(bins: &Bins, min: f64, max: f64) -> EncodeResult<Vec<f64>> {
    match bins {
        Bins::Default => Ok(default_bucket_limits().to_vec()),
        Bins::Count(0) => Err(EncodeError::InvalidHistogram("zero bins".to_string())),
        Bins::Count(_) if min == max => Ok(vec![max]),
        Bins::Count(n) => {
            let width = (max - min) / *n as f64;
            let mut limits: Vec<f64> = (1..*n).map(|i| min + width * i as f64).collect();
            limits.push(max);
            Ok(limits)
        }
        Bins::Edges(edges) => {
            if edges.is_empty() {
                return Err(EncodeError::InvalidHistogram("no bucket edges".to_string()));
            }
            if edges.iter().any(|e| e.is_nan()) || edges.windows(2).any(|w| w[0] >= w[1]) {
                return Err(EncodeError::InvalidHistogram(
                    "bucket edges must be strictly increasing".to_string(),
                ));
            }
            let mut limits = edges.clone();
            if limits[limits.len() - 1] < max {
                limits.push(f64::MAX);
            }
            Ok(limits)
        }
    }
}

fn default_bucket_limits() -> &'static [f64] {
    static LIMITS: OnceLock<Vec<f64>> = OnceLock::new();
    LIMITS.get_or_init(|| {
        let mut positive = Vec::new();
        let mut v = 1e-12;
        while v < 1e20 {
            positive.push(v);
            v *= 1.1;
        }
        positive.push(f64::MAX);

        let mut limits: Vec<f64> = positive.iter().rev().map(|v| -v).collect();
        limits.push(0.0);
        limits.extend_from_slice(&positive);
        limits
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_sorted_and_symmetric() {
        let limits = default_bucket_limits();
        assert!(limits.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(limits[0], -f64::MAX);
        assert_eq!(limits[limits.len() - 1], f64::MAX);
        assert_eq!(limits[limits.len() / 2], 0.0);
    }

    #[test]
    fn test_statistics() {
        let proto = HistogramInput::new([1.0, 2.0, 3.0, 4.0]).encode().unwrap();
        assert_eq!(proto.min, 1.0);
        assert_eq!(proto.max, 4.0);
        assert_eq!(proto.num, 4.0);
        assert_eq!(proto.sum, 10.0);
        assert_eq!(proto.sum_squares, 30.0);
        assert_eq!(proto.bucket.iter().sum::<f64>(), 4.0);
    }

    #[test]
    fn test_only_nonempty_buckets_emitted() {
        let proto = HistogramInput::new([0.0, 0.0, 100.0]).encode().unwrap();
        assert_eq!(proto.bucket, vec![2.0, 1.0]);
        assert_eq!(proto.bucket_limit[0], 0.0);
        assert!(proto.bucket_limit[1] >= 100.0);
    }

    #[test]
    fn test_uniform_bins() {
        let proto = HistogramInput::new([0.0, 1.0, 2.0, 3.0])
            .with_bins(Bins::Count(3))
            .encode()
            .unwrap();
        assert_eq!(proto.bucket_limit, vec![1.0, 2.0, 3.0]);
        assert_eq!(proto.bucket, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_explicit_edges_get_overflow_bucket() {
        let proto = HistogramInput::new([0.5, 5.0])
            .with_bins(Bins::Edges(vec![1.0, 2.0]))
            .encode()
            .unwrap();
        assert_eq!(proto.bucket_limit, vec![1.0, f64::MAX]);
        assert_eq!(proto.bucket, vec![1.0, 1.0]);
    }

    #[test]
    fn test_empty_values() {
        let proto = HistogramInput::new(Vec::new()).encode().unwrap();
        assert_eq!(proto.num, 0.0);
        assert!(proto.bucket.is_empty());
    }

    #[test]
    fn test_rejects_nan_and_bad_edges() {
        assert!(matches!(
            HistogramInput::new([f64::NAN]).encode(),
            Err(EncodeError::InvalidHistogram(_))
        ));
        assert!(matches!(
            HistogramInput::new([1.0])
                .with_bins(Bins::Edges(vec![2.0, 1.0]))
                .encode(),
            Err(EncodeError::InvalidHistogram(_))
        ));
        assert!(matches!(
            HistogramInput::new([1.0]).with_bins(Bins::Count(0)).encode(),
            Err(EncodeError::InvalidHistogram(_))
        ));
    }

    proptest::proptest! {
        /// Every value lands in exactly one emitted bucket
        #[test]
        fn bucket_counts_sum_to_num(
            values in proptest::collection::vec(-1e6f64..1e6, 1..200),
            bins in 1usize..40,
        ) {
            for choice in [Bins::Default, Bins::Count(bins)] {
                let proto = HistogramInput::new(values.clone())
                    .with_bins(choice)
                    .encode()
                    .unwrap();
                let total: f64 = proto.bucket.iter().sum();
                proptest::prop_assert_eq!(total, values.len() as f64);
                proptest::prop_assert_eq!(proto.bucket.len(), proto.bucket_limit.len());
                proptest::prop_assert!(proto.bucket.iter().all(|&c| c > 0.0));
            }
        }
    }
}
