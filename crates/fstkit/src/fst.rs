// The finished immutable transducer.

use std::path::Path;

use crate::automaton::{AlwaysMatch, Automaton};
use crate::format;
use crate::node::{self, Node};
use crate::stream::{Stream, StreamBuilder};
use crate::FstError;

/// An immutable index over sorted byte-string keys.
///
/// Loaded from a serialized buffer, validated eagerly at open time, then
/// traversed with no further checking. All traversal state lives in the
/// caller's cursor, so a single `Fst` can serve any number of concurrent
/// read-only searches.
pub struct Fst {
    data: Vec<u8>,
    root_addr: usize,
    len: usize,
}

impl std::fmt::Debug for Fst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fst")
            .field("len", &self.len)
            .field("size", &self.data.len())
            .finish()
    }
}

impl Fst {
    /// Open a serialized index, validating the whole buffer first.
    ///
    /// A buffer with a foreign magic number, an unsupported version, or any
    /// malformed node record is rejected here, before any traversal.
    pub fn from_bytes(data: Vec<u8>) -> Result<Fst, FstError> {
        let meta = format::validate(&data)?;
        Ok(Fst {
            data,
            root_addr: meta.root_addr,
            len: meta.key_count as usize,
        })
    }

    /// Read and open a serialized index from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Fst, FstError> {
        let data = std::fs::read(path)?;
        Fst::from_bytes(data)
    }

    /// Number of keys in the index.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The serialized bytes backing this index.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// True if `key` is in the index.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.get(key).is_some()
    }

    /// Look up the value for `key`.
    ///
    /// Walks transitions byte by byte from the root, accumulating output
    /// deltas; the sum is returned only if the terminal node is final.
    /// For sets (all outputs zero) this returns `Some(0)` on membership.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<u64> {
        let mut current = self.root();
        let mut output = 0u64;
        for &b in key.as_ref() {
            let i = current.find(b)?;
            let t = current.transitions[i];
            output += t.output;
            current = self.node(t.addr);
        }
        if current.is_final {
            Some(output + current.final_output)
        } else {
            None
        }
    }

    /// Stream every key/value pair in lexicographic order.
    pub fn stream(&self) -> Stream<'_> {
        self.search(AlwaysMatch).into_stream()
    }

    /// Range-restricted stream builder.
    pub fn range(&self) -> StreamBuilder<'_> {
        self.search(AlwaysMatch)
    }

    /// Stream keys accepted by `aut`, optionally restricted to a range.
    pub fn search<A: Automaton>(&self, aut: A) -> StreamBuilder<'_, A> {
        StreamBuilder::new(self, aut)
    }

    pub(crate) fn root(&self) -> Node {
        self.node(self.root_addr)
    }

    pub(crate) fn node(&self, addr: usize) -> Node {
        node::read_node(&self.data, addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Builder;
    use crate::FormatError;

    fn sample() -> Fst {
        let mut builder = Builder::memory();
        for (k, v) in [("bar", 2), ("baz", 3), ("foo", 1)] {
            builder.insert(k, v as u64).unwrap();
        }
        builder.into_fst().unwrap()
    }

    #[test]
    fn get_and_contains() {
        let fst = sample();
        assert_eq!(fst.len(), 3);
        assert_eq!(fst.get("bar"), Some(2));
        assert_eq!(fst.get("baz"), Some(3));
        assert_eq!(fst.get("foo"), Some(1));
        assert!(fst.contains("foo"));
        assert!(!fst.contains("ba"));
        assert!(!fst.contains("fooo"));
        assert!(!fst.contains(""));
    }

    #[test]
    fn round_trip_through_bytes() {
        let fst = sample();
        let bytes = fst.as_bytes().to_vec();
        let reopened = Fst::from_bytes(bytes).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.get("baz"), Some(3));
    }

    #[test]
    fn rejects_foreign_buffer() {
        let err = Fst::from_bytes(b"this is not an index".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            FstError::FormatMismatch(FormatError::InvalidMagic)
        ));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let fst = sample();
        let mut bytes = fst.as_bytes().to_vec();
        bytes.truncate(bytes.len() - 4);
        assert!(Fst::from_bytes(bytes).is_err());
    }

    #[test]
    fn shared_across_threads() {
        let fst = std::sync::Arc::new(sample());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let fst = fst.clone();
            handles.push(std::thread::spawn(move || {
                assert_eq!(fst.get("bar"), Some(2));
                let mut stream = fst.stream();
                let mut count = 0;
                while stream.next().is_some() {
                    count += 1;
                }
                count
            }));
        }
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
    }
}
