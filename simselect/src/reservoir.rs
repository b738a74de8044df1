//! Reservoir sampling (Algorithm R).
//!
//! Draws a uniform sample of `k` items without replacement from a stream whose length is not
//! known up front, in one pass and O(k) memory. After `n >= k` items every item seen so far is
//! in the reservoir with probability `k / n`.
//!
//! The `*_with_rng` entrypoints take the generator from the caller so draws can be reproduced.

use rand::Rng;
use crate::error::{Error, Result};

/// Converts a signed, user supplied count into a capacity.
pub fn checked_count(count: i64) -> Result<usize> {

    match usize::try_from(count) {
        Ok(k) => Ok(k),
        Err(_) => Err(Error::InvalidArgument(format!("count must be non-negative (got {})", count))),
    }
}

#[derive(Debug, Clone)]
pub struct ReservoirSampler<T> {
    k: usize,
    seen: usize,
    samples: Vec<T>,
}

impl<T> ReservoirSampler<T> {

    /// Creates a sampler that keeps at most `k` items. `k == 0` allocates nothing.
    pub fn new(k: usize) -> Self {

        return Self {
            k,
            seen: 0,
            samples: Vec::with_capacity(k),
        };
    }

    pub fn add(&mut self, item: T) {
        let mut rng = rand::thread_rng();
        self.add_with_rng(item, &mut rng);
    }

    pub fn add_with_rng<R: Rng + ?Sized>(&mut self, item: T, rng: &mut R) {

        // index of this item in the stream
        let i = self.seen;
        self.seen += 1;

        if self.k == 0 {
            return;
        }

        if i < self.k {
            self.samples.push(item);
            return;
        }

        let r = rng.gen_range(0..=i);
        if r < self.k {
            self.samples[r] = item;
        }
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<T> {
        self.samples
    }

    /// Number of items observed so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn capacity(&self) -> usize {
        self.k
    }
}

/// Samples `k` items from `stream` using the thread-local generator.
pub fn sample<T, I>(stream: I, k: usize) -> Vec<T>
where
    I: IntoIterator<Item = T>,
{
    let mut rng = rand::thread_rng();
    sample_with_rng(stream, k, &mut rng)
}

pub fn sample_with_rng<T, I, R>(stream: I, k: usize, rng: &mut R) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    R: Rng + ?Sized,
{
    if k == 0 {
        return Vec::new();
    }

    let mut sampler = ReservoirSampler::new(k);
    for item in stream {
        sampler.add_with_rng(item, rng);
    }

    sampler.into_samples()
}

/// Samples from a stream whose elements can fail to be produced.
///
/// The first error aborts sampling and is returned; the partial reservoir is dropped because it
/// is not a uniform sample of anything.
pub fn try_sample_with_rng<T, E, I, R>(stream: I, k: usize, rng: &mut R) -> std::result::Result<Vec<T>, E>
where
    I: IntoIterator<Item = std::result::Result<T, E>>,
    R: Rng + ?Sized,
{
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut sampler = ReservoirSampler::new(k);
    for item in stream {
        sampler.add_with_rng(item?, rng);
    }

    Ok(sampler.into_samples())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn keeps_k_items() {

        let mut s = ReservoirSampler::new(5);
        for i in 0..100 {
            s.add(i);
        }
        assert_eq!(s.samples().len(), 5);
        assert_eq!(s.seen(), 100);
    }

    #[test]
    fn short_stream_returns_everything() {

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut sample = sample_with_rng(0..6, 10, &mut rng);
        sample.sort();
        assert_eq!(sample, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn zero_k_is_empty_and_unallocated() {

        let s: ReservoirSampler<u32> = ReservoirSampler::new(0);
        assert_eq!(s.samples.capacity(), 0);

        let out: Vec<u32> = sample(0..1000, 0);
        assert!(out.is_empty());
        assert_eq!(out.capacity(), 0);

        let mut s = ReservoirSampler::new(0);
        s.add("x");
        assert!(s.samples().is_empty());
        assert_eq!(s.seen(), 1);
    }

    #[test]
    fn four_distinct_from_ten() {

        let stream: Vec<String> = (1..=10).map(|i| format!("x{}", i)).collect();
        let input: HashSet<String> = stream.iter().cloned().collect();

        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let sample = sample_with_rng(stream, 4, &mut rng);

        let distinct: HashSet<String> = sample.iter().cloned().collect();
        assert_eq!(sample.len(), 4);
        assert_eq!(distinct.len(), 4);
        assert!(distinct.is_subset(&input));
    }

    #[test]
    fn negative_count_rejected() {

        assert!(matches!(checked_count(-1), Err(Error::InvalidArgument(_))));
        assert_eq!(checked_count(0).unwrap(), 0);
        assert_eq!(checked_count(12).unwrap(), 12);
    }

    #[test]
    fn stream_error_discards_partial_reservoir() {

        let stream = vec![Ok(1), Ok(2), Err("disk gone"), Ok(4)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let res = try_sample_with_rng(stream, 2, &mut rng);
        assert_eq!(res, Err("disk gone"));
    }

    #[test]
    fn error_free_stream_samples_normally() {

        let stream: Vec<std::result::Result<u32, String>> = (0..50).map(Ok).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let res = try_sample_with_rng(stream, 5, &mut rng).unwrap();
        assert_eq!(res.len(), 5);
    }

    #[test]
    fn same_seed_same_sample() {

        let a = sample_with_rng(0..1000, 8, &mut ChaCha8Rng::seed_from_u64(99));
        let b = sample_with_rng(0..1000, 8, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn distribution_uniform() {

        // chi-squared smoke test, seeded so it never flakes
        let n = 100;
        let k = 10;
        let trials = 5_000;
        let mut counts = vec![0usize; n];

        for t in 0..trials {
            let mut rng = ChaCha8Rng::seed_from_u64(t as u64);
            for item in sample_with_rng(0..n, k, &mut rng) {
                counts[item] += 1;
            }
        }

        let expected = trials as f64 * (k as f64 / n as f64);
        let chi2: f64 = counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                (diff * diff) / expected
            })
            .sum();

        // df = 99
        assert!(chi2 < 250.0, "chi2 too large ({:.2}), counts={:?}", chi2, counts);
    }
}
