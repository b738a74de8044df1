//! Precomputed bit-list fingerprints and the similarity metrics over them.
//!
//! A fingerprint file holds the indices of the on bits, comma or whitespace separated, with an
//! optional `<fp-type>:` prefix naming the fingerprint flavour, e.g. `sim:3,17,204`. Encoding a
//! molecule into bits happens elsewhere; this module only reads and compares the results.
//!
//! Everything a loader or scorer needs is carried by a [`FingerprintContext`] built once by the
//! caller and handed out explicitly.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::scoring::{ObjectLoader, Scorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FpType {
    #[default]
    Sim,
    Sub,
    SubRes,
    SubTau,
    Full,
}

impl FpType {

    pub fn name(&self) -> &'static str {
        match self {
            FpType::Sim => "sim",
            FpType::Sub => "sub",
            FpType::SubRes => "sub-res",
            FpType::SubTau => "sub-tau",
            FpType::Full => "full",
        }
    }
}

impl FromStr for FpType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sim" => Ok(FpType::Sim),
            "sub" => Ok(FpType::Sub),
            "sub-res" => Ok(FpType::SubRes),
            "sub-tau" => Ok(FpType::SubTau),
            "full" => Ok(FpType::Full),
            _ => Err(Error::InvalidArgument(format!("unknown fingerprint type: {}", s))),
        }
    }
}

impl fmt::Display for FpType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Similarity metric, written the way the command line takes it: `tanimoto`, `dice`, `tversky`
/// or `tversky <alpha> <beta>`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    #[default]
    Tanimoto,
    Dice,
    Tversky { alpha: f64, beta: f64 },
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {

        let mut parts = s.split_whitespace();
        let name = parts.next().unwrap_or("");
        let params: Vec<&str> = parts.collect();

        match (name, params.len()) {
            ("tanimoto", 0) => Ok(Metric::Tanimoto),
            ("dice", 0) => Ok(Metric::Dice),
            ("tversky", 0) => Ok(Metric::Tversky { alpha: 0.5, beta: 0.5 }),
            ("tversky", 2) => {
                let alpha = parse_weight(params[0])?;
                let beta = parse_weight(params[1])?;
                Ok(Metric::Tversky { alpha, beta })
            }
            _ => Err(Error::InvalidArgument(format!("unknown metric: {:?}", s))),
        }
    }
}

fn parse_weight(s: &str) -> Result<f64> {

    match s.parse::<f64>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(Error::InvalidArgument(format!("tversky weight must be a finite number >= 0 (got {:?})", s))),
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Tanimoto => write!(f, "tanimoto"),
            Metric::Dice => write!(f, "dice"),
            Metric::Tversky { alpha, beta } => write!(f, "tversky {} {}", alpha, beta),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Metric> for String {
    fn from(m: Metric) -> String {
        m.to_string()
    }
}

impl Metric {

    /// Similarity from set sizes: `a` and `b` on bits, `common` shared.
    pub fn similarity(&self, a: usize, b: usize, common: usize) -> Result<f64> {

        let (a, b, c) = (a as f64, b as f64, common as f64);

        let (num, denom) = match self {
            Metric::Tanimoto => (c, a + b - c),
            Metric::Dice => (2.0 * c, a + b),
            Metric::Tversky { alpha, beta } => (c, alpha * (a - c) + beta * (b - c) + c),
        };

        if denom <= 0.0 {
            return Err(Error::Computation(format!("{} is undefined for empty fingerprints", self)));
        }

        Ok(num / denom)
    }
}

/// Sorted, deduplicated on bits of one fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    pub fp_type: FpType,
    bits: Vec<u32>,
}

impl Fingerprint {

    pub fn new(fp_type: FpType, mut bits: Vec<u32>) -> Self {

        bits.sort_unstable();
        bits.dedup();

        return Self { fp_type, bits };
    }

    /// Parses file contents; `default_type` applies when there is no prefix.
    pub fn parse(text: &str, default_type: FpType, path: &Path) -> Result<Self> {

        let parse_error = |line: usize, message: String| Error::Parse {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut fp_type = default_type;
        let mut bits: Vec<u32> = Vec::new();
        let mut first = true;

        for (i, line) in text.lines().enumerate() {

            let mut body = line.trim();
            if body.is_empty() {
                continue;
            }

            // the type prefix may only open the first non-empty line
            if first {
                first = false;
                if let Some((prefix, rest)) = body.split_once(':') {
                    fp_type = prefix.trim().parse().map_err(|e: Error| parse_error(i + 1, e.to_string()))?;
                    body = rest;
                }
            }

            for token in body.split(|c: char| c == ',' || c.is_whitespace()) {
                if token.is_empty() {
                    continue;
                }
                let bit = token
                    .parse::<u32>()
                    .map_err(|_| parse_error(i + 1, format!("bad bit index {:?}", token)))?;
                bits.push(bit);
            }
        }

        Ok(Self::new(fp_type, bits))
    }

    pub fn bits(&self) -> &[u32] {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits.len()
    }

    /// Number of on bits shared with `other`.
    pub fn common(&self, other: &Fingerprint) -> usize {

        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < self.bits.len() && j < other.bits.len() {
            match self.bits[i].cmp(&other.bits[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }

        n
    }
}

/// Settings shared by the loader and the scorer of one search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerprintContext {
    pub fp_type: FpType,
    pub metric: Metric,
}

impl FingerprintContext {

    pub fn new(fp_type: FpType, metric: Metric) -> Self {
        Self { fp_type, metric }
    }

    pub fn loader(&self) -> FingerprintLoader<'_> {
        FingerprintLoader { ctx: self }
    }

    pub fn scorer(&self) -> FingerprintScorer<'_> {
        FingerprintScorer { ctx: self }
    }

    /// Rejects a query of another fingerprint type, which no candidate of this run could match.
    pub fn check_query(&self, query: &Fingerprint) -> Result<()> {

        if query.fp_type != self.fp_type {
            return Err(Error::InvalidArgument(format!(
                "query is a {} fingerprint but the search uses {}",
                query.fp_type, self.fp_type
            )));
        }

        Ok(())
    }
}

/// Reads fingerprint files named by path.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintLoader<'a> {
    ctx: &'a FingerprintContext,
}

impl ObjectLoader for FingerprintLoader<'_> {
    type Object = Fingerprint;

    fn load(&self, id: &str) -> Result<Fingerprint> {

        let path = Path::new(id);
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        Fingerprint::parse(&text, self.ctx.fp_type, path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FingerprintScorer<'a> {
    ctx: &'a FingerprintContext,
}

impl Scorer for FingerprintScorer<'_> {
    type Object = Fingerprint;

    fn score(&self, query: &Fingerprint, candidate: &Fingerprint) -> Result<f64> {

        for fp in [query, candidate] {
            if fp.fp_type != self.ctx.fp_type {
                return Err(Error::Computation(format!(
                    "expected a {} fingerprint, got {}",
                    self.ctx.fp_type, fp.fp_type
                )));
            }
        }

        let common = query.common(candidate);
        self.ctx.metric.similarity(query.count_ones(), candidate.count_ones(), common)
    }
}
