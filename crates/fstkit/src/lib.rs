//! Ordered byte-string sets and maps backed by minimal finite state transducers.
//!
//! An index built by this crate stores a sorted collection of byte-string keys,
//! optionally paired with `u64` values, inside a minimal deterministic FST.
//! Keys sharing prefixes and suffixes share physical nodes, so the serialized
//! form is compact and can be queried without unpacking it into an in-memory
//! collection.
//!
//! # Architecture
//!
//! - [`format`] -- Binary header/footer parsing and whole-buffer validation
//! - [`build`] -- One-pass minimal transducer construction from sorted keys
//! - [`fst`] -- The finished immutable transducer (lookup, length, scans)
//! - [`automaton`] -- The generic search automaton contract
//! - [`range`] -- Key bounds expressed as a lexicographic-comparison automaton
//! - [`levenshtein`] -- Bounded edit-distance search automaton
//! - [`regex`] -- Byte-oriented regex search automaton
//! - [`stream`] -- Lazy synchronized traversal of transducer and automaton
//! - [`ops`] -- Union/intersection/difference/symmetric difference over streams
//! - [`set`] / [`map`] -- The user-facing `Set` and `Map` front ends

pub mod automaton;
pub mod build;
mod bytes;
pub mod format;
pub mod fst;
pub mod levenshtein;
pub mod map;
mod node;
pub mod ops;
pub mod range;
pub mod regex;
mod registry;
pub mod set;
pub mod stream;

pub use crate::automaton::{AlwaysMatch, Automaton};
pub use crate::build::Builder;
pub use crate::format::FormatError;
pub use crate::fst::Fst;
pub use crate::levenshtein::Levenshtein;
pub use crate::map::{Map, MapBuilder};
pub use crate::ops::{IndexedValue, OpBuilder, Streamer};
pub use crate::range::Bound;
pub use crate::regex::Regex;
pub use crate::set::{Set, SetBuilder};
pub use crate::stream::{Stream, StreamBuilder};

/// Error type for index construction, opening and search.
#[derive(Debug, thiserror::Error)]
pub enum FstError {
    #[error("key {got:?} inserted out of order; previous key was {previous:?}")]
    OutOfOrder { previous: Vec<u8>, got: Vec<u8> },
    #[error("duplicate key {key:?}")]
    DuplicateKey { key: Vec<u8> },
    #[error("output value cannot be represented: {0}")]
    InvalidOutput(String),
    #[error("format mismatch: {0}")]
    FormatMismatch(#[from] FormatError),
    #[error("invalid search automaton: {0}")]
    Automaton(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
