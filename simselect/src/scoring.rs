//! Seams to the outside world: something that turns an identifier into an object, and something
//! that scores a candidate object against the query.

use crate::error::Result;

pub trait ObjectLoader {
    type Object;

    /// Loads the object named by `id`. Failure here is fatal to the stream.
    fn load(&self, id: &str) -> Result<Self::Object>;
}

pub trait Scorer {
    type Object;

    /// Similarity of `candidate` to `query`, higher is more similar.
    ///
    /// Implementations report per-item trouble as `Error::Computation`, which callers treat as
    /// "skip this candidate".
    fn score(&self, query: &Self::Object, candidate: &Self::Object) -> Result<f64>;
}

impl<L: ObjectLoader + ?Sized> ObjectLoader for &L {
    type Object = L::Object;

    fn load(&self, id: &str) -> Result<Self::Object> {
        (**self).load(id)
    }
}

impl<S: Scorer + ?Sized> Scorer for &S {
    type Object = S::Object;

    fn score(&self, query: &Self::Object, candidate: &Self::Object) -> Result<f64> {
        (**self).score(query, candidate)
    }
}
