//! Ordered sets of byte strings.
//!
//! A [`Set`] is a transducer whose outputs are all zero; the wrapper hides
//! values entirely and deals in keys. Build one with [`SetBuilder`] from
//! pre-sorted keys, or with [`Set::from_iter`] for small inputs.

use std::io;
use std::path::Path;

use crate::automaton::Automaton;
use crate::build::Builder;
use crate::fst::Fst;
use crate::ops::{OpBuilder, OpItem, Streamer};
use crate::stream::{Stream, StreamBuilder};
use crate::FstError;

/// An immutable ordered set of byte-string keys.
#[derive(Debug)]
pub struct Set(Fst);

impl Set {
    /// Open a serialized set, validating the buffer first.
    pub fn from_bytes(data: Vec<u8>) -> Result<Set, FstError> {
        Fst::from_bytes(data).map(Set)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Set, FstError> {
        Fst::from_path(path).map(Set)
    }

    /// Build a set in memory from keys in sorted order.
    pub fn from_iter<K, I>(keys: I) -> Result<Set, FstError>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = K>,
    {
        let mut builder = SetBuilder::memory();
        for key in keys {
            builder.insert(key)?;
        }
        builder.into_set()
    }

    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw transducer backing this set.
    pub fn as_fst(&self) -> &Fst {
        &self.0
    }

    /// Stream every key in lexicographic order.
    pub fn stream(&self) -> SetStream<'_> {
        SetStream(self.0.stream())
    }

    /// Range-restricted stream builder.
    pub fn range(&self) -> SetStreamBuilder<'_> {
        SetStreamBuilder(self.0.range())
    }

    /// Stream keys accepted by `aut`.
    pub fn search<A: Automaton>(&self, aut: A) -> SetStreamBuilder<'_, A> {
        SetStreamBuilder(self.0.search(aut))
    }

    /// Start a set operation with this set as the first operand.
    pub fn op(&self) -> SetOpBuilder<'_> {
        SetOpBuilder::new().add(self.stream())
    }

    /// True if `self` and `other` share no keys.
    pub fn is_disjoint(&self, other: &Set) -> bool {
        self.op().add(other.stream()).intersection().next().is_none()
    }

    /// True if every key of `self` is in `other`.
    pub fn is_subset(&self, other: &Set) -> bool {
        self.op().add(other.stream()).difference().next().is_none()
    }

    /// True if every key of `other` is in `self`.
    pub fn is_superset(&self, other: &Set) -> bool {
        other.is_subset(self)
    }
}

/// Builds a set from keys supplied in sorted order, streaming the encoded
/// form to an underlying writer.
pub struct SetBuilder<W: io::Write>(Builder<W>);

impl SetBuilder<Vec<u8>> {
    /// Build into an in-memory buffer.
    pub fn memory() -> SetBuilder<Vec<u8>> {
        SetBuilder(Builder::memory())
    }

    /// Finish and reopen the buffer as a [`Set`].
    pub fn into_set(self) -> Result<Set, FstError> {
        self.0.into_fst().map(Set)
    }
}

impl<W: io::Write> SetBuilder<W> {
    pub fn new(wtr: W) -> Result<SetBuilder<W>, FstError> {
        Builder::new(wtr).map(SetBuilder)
    }

    /// Add a key. Keys must arrive in strictly increasing byte order.
    pub fn insert(&mut self, key: impl AsRef<[u8]>) -> Result<(), FstError> {
        self.0.add(key)
    }

    /// Write the footer and return the underlying writer.
    pub fn finish(self) -> Result<W, FstError> {
        self.0.finish()
    }
}

/// Configures a set stream: automaton plus optional range bounds.
pub struct SetStreamBuilder<'s, A: Automaton = crate::automaton::AlwaysMatch>(
    StreamBuilder<'s, A>,
);

impl<'s, A: Automaton> SetStreamBuilder<'s, A> {
    pub fn ge(self, bound: impl AsRef<[u8]>) -> Self {
        SetStreamBuilder(self.0.ge(bound))
    }

    pub fn gt(self, bound: impl AsRef<[u8]>) -> Self {
        SetStreamBuilder(self.0.gt(bound))
    }

    pub fn le(self, bound: impl AsRef<[u8]>) -> Self {
        SetStreamBuilder(self.0.le(bound))
    }

    pub fn lt(self, bound: impl AsRef<[u8]>) -> Self {
        SetStreamBuilder(self.0.lt(bound))
    }

    pub fn into_stream(self) -> SetStream<'s, A> {
        SetStream(self.0.into_stream())
    }
}

/// A lazy cursor over set keys, in lexicographic order.
pub struct SetStream<'s, A: Automaton = crate::automaton::AlwaysMatch>(Stream<'s, A>);

impl<'s, A: Automaton> SetStream<'s, A> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Vec<u8>> {
        self.0.next().map(|(key, _)| key)
    }

    pub fn into_vec(mut self) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        while let Some(key) = self.next() {
            keys.push(key);
        }
        keys
    }

    /// Drain into UTF-8 strings, failing on the first non-UTF-8 key.
    pub fn into_strs(mut self) -> Result<Vec<String>, std::string::FromUtf8Error> {
        let mut keys = Vec::new();
        while let Some(key) = self.next() {
            keys.push(String::from_utf8(key)?);
        }
        Ok(keys)
    }
}

impl<'s, A: Automaton> Streamer for SetStream<'s, A> {
    fn next(&mut self) -> Option<(Vec<u8>, u64)> {
        Streamer::next(&mut self.0)
    }
}

/// Collects set streams, then fixes the operation to apply. Results are
/// key-only streams.
pub struct SetOpBuilder<'s>(OpBuilder<'s>);

impl<'s> Default for SetOpBuilder<'s> {
    fn default() -> Self {
        SetOpBuilder::new()
    }
}

impl<'s> SetOpBuilder<'s> {
    pub fn new() -> SetOpBuilder<'s> {
        SetOpBuilder(OpBuilder::new())
    }

    pub fn push<S: Streamer + 's>(&mut self, stream: S) {
        self.0.push(stream);
    }

    pub fn add<S: Streamer + 's>(mut self, stream: S) -> SetOpBuilder<'s> {
        self.push(stream);
        self
    }

    pub fn union(self) -> SetUnion<'s> {
        SetUnion(self.0.union())
    }

    pub fn intersection(self) -> SetIntersection<'s> {
        SetIntersection(self.0.intersection())
    }

    pub fn difference(self) -> SetDifference<'s> {
        SetDifference(self.0.difference())
    }

    pub fn symmetric_difference(self) -> SetSymmetricDifference<'s> {
        SetSymmetricDifference(self.0.symmetric_difference())
    }
}

fn key_only(item: Option<OpItem>) -> Option<Vec<u8>> {
    item.map(|(key, _)| key)
}

macro_rules! set_op_stream {
    ($(#[$doc:meta])* $name:ident, $inner:ident) => {
        $(#[$doc])*
        pub struct $name<'s>(crate::ops::$inner<'s>);

        impl<'s> $name<'s> {
            #[allow(clippy::should_implement_trait)]
            pub fn next(&mut self) -> Option<Vec<u8>> {
                key_only(self.0.next())
            }

            pub fn into_vec(mut self) -> Vec<Vec<u8>> {
                let mut keys = Vec::new();
                while let Some(key) = self.next() {
                    keys.push(key);
                }
                keys
            }
        }
    };
}

set_op_stream!(
    /// Keys held by at least one input set.
    SetUnion,
    Union
);
set_op_stream!(
    /// Keys held by every input set.
    SetIntersection,
    Intersection
);
set_op_stream!(
    /// Keys held by the first input set and none of the others.
    SetDifference,
    Difference
);
set_op_stream!(
    /// Keys held by exactly one input set.
    SetSymmetricDifference,
    SymmetricDifference
);
