//! Drives a corpus of identifiers through a loader and a scorer into a [`TopKTracker`].
//!
//! Loader failures end the search and are returned; whatever the tracker holds at that point is
//! still a correct leaderboard for the identifiers before the failing one. Scorer failures only
//! drop the candidate at hand.
//!
//! With more than one thread, identifiers are read in batches, each batch is loaded and scored
//! on a rayon pool, and the results are fed to the tracker in stream order by this thread alone.
//! The outcome is the same as the single threaded run.

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use crate::config::{SearchConfig, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_INTERVAL};
use crate::error::{Error, Result};
use crate::scoring::{ObjectLoader, Scorer};
use crate::top_k::TopKTracker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Identifiers pulled from the source.
    pub seen: usize,
    /// Candidates that produced a score and were offered to the tracker.
    pub scored: usize,
    /// Candidates dropped because scoring failed.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub progress_interval: usize,
    pub threads: usize,
    pub batch_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        return Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            threads: 1,
            batch_size: DEFAULT_BATCH_SIZE,
        };
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        return Self {
            progress_interval: config.progress_interval,
            threads: config.threads,
            batch_size: config.batch_size,
        };
    }
}

enum Outcome<O> {
    Scored(f64, O),
    Skipped(Error),
}

fn evaluate<O, L, S>(query: &O, id: &str, loader: &L, scorer: &S) -> Result<Outcome<O>>
where
    L: ObjectLoader<Object = O>,
    S: Scorer<Object = O>,
{
    let candidate = match loader.load(id) {
        Ok(candidate) => candidate,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => return Ok(Outcome::Skipped(e)),
    };

    match scorer.score(query, &candidate) {
        Ok(score) if score.is_nan() => Ok(Outcome::Skipped(Error::Computation("scorer returned NaN".to_string()))),
        Ok(score) => Ok(Outcome::Scored(score, candidate)),
        Err(e) => Ok(Outcome::Skipped(e)),
    }
}

struct Feed<'t, O, P> {
    tracker: &'t mut TopKTracker<O>,
    stats: SearchStats,
    progress_interval: usize,
    on_progress: P,
}

impl<O, P: FnMut(&SearchStats)> Feed<'_, O, P> {

    fn accept(&mut self, id: String, outcome: Outcome<O>) -> Result<()> {

        self.stats.seen += 1;

        match outcome {
            Outcome::Scored(score, candidate) => {
                self.tracker.update(score, candidate, id)?;
                self.stats.scored += 1;
            }
            Outcome::Skipped(e) => {
                warn!("skipping {}: {}", id, e);
                self.stats.skipped += 1;
            }
        }

        if self.stats.seen % self.progress_interval == 0 {
            info!(
                "{} read, {} scored, {} skipped",
                self.stats.seen, self.stats.scored, self.stats.skipped
            );
        }
        (self.on_progress)(&self.stats);

        Ok(())
    }
}

/// Scores every identifier in `ids` against `query` and offers the results to `tracker`.
///
/// `on_progress` is called after each identifier with the running counts.
pub fn find_similar<O, I, L, S, P>(
    query: &O,
    ids: I,
    loader: &L,
    scorer: &S,
    tracker: &mut TopKTracker<O>,
    options: &SearchOptions,
    on_progress: P,
) -> Result<SearchStats>
where
    O: Send + Sync,
    I: IntoIterator<Item = Result<String>>,
    L: ObjectLoader<Object = O> + Sync,
    S: Scorer<Object = O> + Sync,
    P: FnMut(&SearchStats),
{
    if options.batch_size == 0 || options.progress_interval == 0 || options.threads == 0 {
        return Err(Error::InvalidArgument(format!("search options must be positive: {:?}", options)));
    }

    let mut feed = Feed {
        tracker,
        stats: SearchStats::default(),
        progress_interval: options.progress_interval,
        on_progress,
    };

    if options.threads == 1 {
        for id in ids {
            let id = id?;
            let outcome = evaluate(query, &id, loader, scorer)?;
            feed.accept(id, outcome)?;
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .build()
            .map_err(|e| Error::Config(format!("could not start {} scoring threads: {}", options.threads, e)))?;

        let mut ids = ids.into_iter();
        let mut batch: Vec<String> = Vec::with_capacity(options.batch_size);

        loop {
            // a source error still lets the identifiers read before it through
            let mut source_error: Option<Error> = None;
            batch.clear();
            while batch.len() < options.batch_size {
                match ids.next() {
                    Some(Ok(id)) => batch.push(id),
                    Some(Err(e)) => {
                        source_error = Some(e);
                        break;
                    }
                    None => break,
                }
            }

            if batch.is_empty() && source_error.is_none() {
                break;
            }
            debug!("scoring batch of {}", batch.len());

            let outcomes: Vec<Result<Outcome<O>>> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|id| evaluate(query, id, loader, scorer))
                    .collect()
            });

            for (id, outcome) in batch.drain(..).zip(outcomes) {
                feed.accept(id, outcome?)?;
            }

            if let Some(e) = source_error {
                return Err(e);
            }
        }
    }

    let stats = feed.stats;
    info!("done: {} read, {} scored, {} skipped", stats.seen, stats.scored, stats.skipped);

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory corpus: an id maps to a number, the score is `1 / (1 + |q - x|)`.
    struct Corpus {
        values: HashMap<String, f64>,
    }

    impl Corpus {
        fn new(entries: &[(&str, f64)]) -> Self {
            let values = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            Corpus { values }
        }
    }

    impl ObjectLoader for Corpus {
        type Object = f64;

        fn load(&self, id: &str) -> Result<f64> {
            self.values.get(id).copied().ok_or_else(|| Error::NotFound(PathBuf::from(id)))
        }
    }

    struct Closeness;

    impl Scorer for Closeness {
        type Object = f64;

        fn score(&self, query: &f64, candidate: &f64) -> Result<f64> {
            if candidate.is_sign_negative() {
                return Err(Error::Computation("negative value".to_string()));
            }
            Ok(1.0 / (1.0 + (query - candidate).abs()))
        }
    }

    fn ids(names: &[&str]) -> Vec<Result<String>> {
        names.iter().map(|s| Ok(s.to_string())).collect()
    }

    fn tags(tracker: &TopKTracker<f64>) -> Vec<String> {
        tracker.top_k().into_iter().map(|h| h.tag).collect()
    }

    #[test]
    fn finds_closest() {

        let corpus = Corpus::new(&[("a", 1.0), ("b", 5.0), ("c", 2.5), ("d", 9.0)]);
        let mut tracker = TopKTracker::new(2);

        let stats = find_similar(
            &2.0, ids(&["a", "b", "c", "d"]), &corpus, &Closeness, &mut tracker,
            &SearchOptions::default(), |_| {},
        ).unwrap();

        assert_eq!(tags(&tracker), vec!["c", "a"]);
        assert_eq!(stats, SearchStats { seen: 4, scored: 4, skipped: 0 });
    }

    #[test]
    fn scorer_failures_are_skipped() {

        let corpus = Corpus::new(&[("a", 1.0), ("bad", -3.0), ("c", 2.0)]);
        let mut tracker = TopKTracker::new(5);

        let stats = find_similar(
            &2.0, ids(&["a", "bad", "c"]), &corpus, &Closeness, &mut tracker,
            &SearchOptions::default(), |_| {},
        ).unwrap();

        assert_eq!(stats, SearchStats { seen: 3, scored: 2, skipped: 1 });
        assert_eq!(tags(&tracker), vec!["c", "a"]);
    }

    #[test]
    fn loader_failure_aborts_but_keeps_prefix() {

        let corpus = Corpus::new(&[("a", 1.0), ("b", 2.0)]);
        let mut tracker = TopKTracker::new(5);

        let res = find_similar(
            &2.0, ids(&["a", "b", "gone", "a"]), &corpus, &Closeness, &mut tracker,
            &SearchOptions::default(), |_| {},
        );

        assert!(matches!(res, Err(Error::NotFound(_))));
        assert_eq!(tags(&tracker), vec!["b", "a"]);
        assert_eq!(tracker.received(), 2);
    }

    #[test]
    fn source_failure_aborts() {

        let corpus = Corpus::new(&[("a", 1.0)]);
        let mut tracker = TopKTracker::new(5);
        let stream = vec![Ok("a".to_string()), Err(Error::Io { path: "list".into(), source: std::io::Error::new(std::io::ErrorKind::Other, "eio") })];

        let res = find_similar(&1.0, stream, &corpus, &Closeness, &mut tracker, &SearchOptions::default(), |_| {});

        assert!(matches!(res, Err(Error::Io { .. })));
        assert_eq!(tags(&tracker), vec!["a"]);
    }

    #[test]
    fn parallel_matches_sequential() {

        let entries: Vec<(String, f64)> = (0..1000).map(|i| (format!("m{}", i), ((i * 37) % 101) as f64)).collect();
        let refs: Vec<(&str, f64)> = entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let corpus = Corpus::new(&refs);
        let names: Vec<&str> = refs.iter().map(|(k, _)| *k).collect();

        let mut serial = TopKTracker::new(25);
        let serial_stats = find_similar(
            &50.0, ids(&names), &corpus, &Closeness, &mut serial, &SearchOptions::default(), |_| {},
        ).unwrap();

        let options = SearchOptions { threads: 4, batch_size: 64, ..SearchOptions::default() };
        let mut parallel = TopKTracker::new(25);
        let parallel_stats = find_similar(
            &50.0, ids(&names), &corpus, &Closeness, &mut parallel, &options, |_| {},
        ).unwrap();

        assert_eq!(serial_stats, parallel_stats);
        assert_eq!(serial.top_k(), parallel.top_k());
    }

    #[test]
    fn parallel_loader_failure_keeps_prefix() {

        let corpus = Corpus::new(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let options = SearchOptions { threads: 2, batch_size: 8, ..SearchOptions::default() };
        let mut tracker = TopKTracker::new(5);

        let res = find_similar(
            &2.0, ids(&["a", "b", "gone", "c"]), &corpus, &Closeness, &mut tracker, &options, |_| {},
        );

        assert!(res.is_err());
        assert_eq!(tracker.received(), 2);
    }

    #[test]
    fn progress_called_per_identifier() {

        let corpus = Corpus::new(&[("a", 1.0), ("b", 2.0)]);
        let mut tracker = TopKTracker::new(1);
        let mut calls = Vec::new();

        find_similar(
            &2.0, ids(&["a", "b", "a"]), &corpus, &Closeness, &mut tracker,
            &SearchOptions { progress_interval: 2, ..SearchOptions::default() },
            |s| calls.push(s.seen),
        ).unwrap();

        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn zero_batch_rejected() {

        let corpus = Corpus::new(&[]);
        let mut tracker = TopKTracker::new(1);
        let options = SearchOptions { batch_size: 0, ..SearchOptions::default() };

        let res = find_similar(&0.0, ids(&[]), &corpus, &Closeness, &mut tracker, &options, |_| {});
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }
}
