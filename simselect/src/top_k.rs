//! Bounded leaderboard of the `k` highest scoring items seen in a stream.
//!
//! Backed by a min-heap of size `k`: the worst kept entry sits on top, so a new score that does
//! not beat it is rejected in O(1) and an accepted one costs O(log k).
//!
//! Equal scores rank by arrival: the earlier update wins. Because of that, a new score equal to
//! the current minimum can never enter a full board, and rejecting it early gives exactly the
//! result of sorting the whole history and truncating to `k`.
//!
//! Not synchronized. Feed it from a single consumer.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use serde::Serialize;
use crate::error::{Error, Result};

/// One entry of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit<T> {
    pub score: f64,
    pub item: T,
    pub tag: String,
}

#[derive(Debug, Clone)]
struct Ranked<T> {
    seq: u64,
    hit: Hit<T>,
}

// Greater means better: higher score, then earlier arrival.
impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hit.score
            .total_cmp(&other.hit.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Ranked<T> {}

#[derive(Debug, Clone)]
pub struct TopKTracker<T> {
    k: usize,
    received: u64,
    heap: BinaryHeap<Reverse<Ranked<T>>>,
}

impl<T> TopKTracker<T> {

    pub fn new(k: usize) -> Self {

        return Self {
            k,
            received: 0,
            heap: BinaryHeap::with_capacity(k),
        };
    }

    /// Offers a scored item to the board.
    ///
    /// NaN scores are refused since they have no place in a descending order.
    pub fn update(&mut self, score: f64, item: T, tag: impl Into<String>) -> Result<()> {

        if score.is_nan() {
            return Err(Error::InvalidArgument("score must not be NaN".to_string()));
        }

        let seq = self.received;
        self.received += 1;

        if self.k == 0 {
            return Ok(());
        }

        if self.heap.len() < self.k {
            let hit = Hit { score, item, tag: tag.into() };
            self.heap.push(Reverse(Ranked { seq, hit }));
            return Ok(());
        }

        if let Some(mut worst) = self.heap.peek_mut() {
            // ties lose to the earlier entry
            if score.total_cmp(&worst.0.hit.score) == Ordering::Greater {
                let hit = Hit { score, item, tag: tag.into() };
                *worst = Reverse(Ranked { seq, hit });
            }
        }

        Ok(())
    }

    /// Lowest score a new item has to beat to get in, once the board is full.
    pub fn threshold(&self) -> Option<f64> {

        match self.is_full() {
            true => self.heap.peek().map(|worst| worst.0.hit.score),
            false => None,
        }
    }

    /// Smallest score currently held.
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|worst| worst.0.hit.score)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.k > 0 && self.heap.len() == self.k
    }

    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Number of updates offered so far, accepted or not.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Finalizes the board, best first.
    pub fn into_top_k(self) -> Vec<Hit<T>> {

        // ascending in Reverse order is descending in rank
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(ranked)| ranked.hit)
            .collect()
    }
}

impl<T: Clone> TopKTracker<T> {

    /// Current leaderboard, best first. Does not disturb the board.
    pub fn top_k(&self) -> Vec<Hit<T>> {

        let mut ranked: Vec<&Ranked<T>> = self.heap.iter().map(|r| &r.0).collect();
        ranked.sort_by(|a, b| b.cmp(a));

        ranked.into_iter().map(|r| r.hit.clone()).collect()
    }
}
