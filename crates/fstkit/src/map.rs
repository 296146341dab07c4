//! Ordered maps from byte strings to `u64` values.
//!
//! A [`Map`] exposes the transducer's outputs directly: each key carries one
//! unsigned value, stored as deltas along the key's path and summed during
//! lookup. Build one with [`MapBuilder`] from pre-sorted keys, or with
//! [`Map::from_iter`] for small inputs.

use std::io;
use std::path::Path;

use crate::automaton::Automaton;
use crate::build::Builder;
use crate::fst::Fst;
use crate::ops::{OpBuilder, Streamer};
use crate::stream::{Stream, StreamBuilder};
use crate::FstError;

/// An immutable ordered map from byte-string keys to `u64` values.
#[derive(Debug)]
pub struct Map(Fst);

impl Map {
    /// Open a serialized map, validating the buffer first.
    pub fn from_bytes(data: Vec<u8>) -> Result<Map, FstError> {
        Fst::from_bytes(data).map(Map)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Map, FstError> {
        Fst::from_path(path).map(Map)
    }

    /// Build a map in memory from pairs in sorted key order.
    pub fn from_iter<K, I>(pairs: I) -> Result<Map, FstError>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, u64)>,
    {
        let mut builder = MapBuilder::memory();
        for (key, value) in pairs {
            builder.insert(key, value)?;
        }
        builder.into_map()
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<u64> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw transducer backing this map.
    pub fn as_fst(&self) -> &Fst {
        &self.0
    }

    /// Stream every key/value pair in key order.
    pub fn stream(&self) -> Stream<'_> {
        self.0.stream()
    }

    /// Stream keys only, in order.
    pub fn keys(&self) -> Keys<'_> {
        Keys(self.0.stream())
    }

    /// Stream values only, in key order.
    pub fn values(&self) -> Values<'_> {
        Values(self.0.stream())
    }

    /// Range-restricted stream builder.
    pub fn range(&self) -> StreamBuilder<'_> {
        self.0.range()
    }

    /// Stream pairs whose keys are accepted by `aut`.
    pub fn search<A: Automaton>(&self, aut: A) -> StreamBuilder<'_, A> {
        self.0.search(aut)
    }

    /// Start a map operation with this map as the first operand.
    pub fn op(&self) -> MapOpBuilder<'_> {
        MapOpBuilder::new().add(self.stream())
    }
}

/// Builds a map from sorted key/value pairs, streaming the encoded form to
/// an underlying writer.
pub struct MapBuilder<W: io::Write>(Builder<W>);

impl MapBuilder<Vec<u8>> {
    /// Build into an in-memory buffer.
    pub fn memory() -> MapBuilder<Vec<u8>> {
        MapBuilder(Builder::memory())
    }

    /// Finish and reopen the buffer as a [`Map`].
    pub fn into_map(self) -> Result<Map, FstError> {
        self.0.into_fst().map(Map)
    }
}

impl<W: io::Write> MapBuilder<W> {
    pub fn new(wtr: W) -> Result<MapBuilder<W>, FstError> {
        Builder::new(wtr).map(MapBuilder)
    }

    /// Add a pair. Keys must arrive in strictly increasing byte order.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: u64) -> Result<(), FstError> {
        self.0.insert(key, value)
    }

    /// Write the footer and return the underlying writer.
    pub fn finish(self) -> Result<W, FstError> {
        self.0.finish()
    }
}

/// A lazy cursor over map keys.
pub struct Keys<'m>(Stream<'m>);

impl<'m> Keys<'m> {
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
}

/// A lazy cursor over map values, in key order.
pub struct Values<'m>(Stream<'m>);

impl<'m> Values<'m> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<u64> {
        self.0.next().map(|(_, value)| value)
    }

    pub fn into_vec(mut self) -> Vec<u64> {
        let mut values = Vec::new();
        while let Some(value) = self.next() {
            values.push(value);
        }
        values
    }
}

/// Collects map streams, then fixes the operation to apply. Results carry
/// every contributing stream's value per key.
pub struct MapOpBuilder<'m>(OpBuilder<'m>);

impl<'m> Default for MapOpBuilder<'m> {
    fn default() -> Self {
        MapOpBuilder::new()
    }
}

impl<'m> MapOpBuilder<'m> {
    pub fn new() -> MapOpBuilder<'m> {
        MapOpBuilder(OpBuilder::new())
    }

    pub fn push<S: Streamer + 'm>(&mut self, stream: S) {
        self.0.push(stream);
    }

    pub fn add<S: Streamer + 'm>(mut self, stream: S) -> MapOpBuilder<'m> {
        self.push(stream);
        self
    }

    pub fn union(self) -> crate::ops::Union<'m> {
        self.0.union()
    }

    pub fn intersection(self) -> crate::ops::Intersection<'m> {
        self.0.intersection()
    }

    pub fn difference(self) -> crate::ops::Difference<'m> {
        self.0.difference()
    }

    pub fn symmetric_difference(self) -> crate::ops::SymmetricDifference<'m> {
        self.0.symmetric_difference()
    }
}
