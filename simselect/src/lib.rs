//! Streaming selection for large compound libraries.
//!
//! Two single pass, bounded memory building blocks:
//! - `reservoir`: uniform random sample of `k` identifiers from a list of unknown length.
//! - `top_k`: the `k` best scoring candidates seen so far, in O(k) memory.
//!
//! Around them sit the pieces the command line tools need: identifier sources, a bit-list
//! fingerprint loader and scorer, the search loop that ties them together, YAML config and
//! report output. Fingerprint generation itself happens outside this crate.
#![forbid(unsafe_code)]
pub mod error;
pub mod reservoir;
pub mod top_k;
pub mod source;
pub mod scoring;
pub mod fingerprint;
pub mod config;
pub mod search;
pub mod report;

pub use error::{Error, Result};
pub use reservoir::ReservoirSampler;
pub use top_k::{Hit, TopKTracker};
