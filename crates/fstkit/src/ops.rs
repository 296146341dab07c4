// Set and map algebra over sorted streams: k-way lazy merge.
//
// A min-heap holds one entry per non-exhausted input stream, ordered by
// (key, source index); the source index tie-break makes output order
// deterministic regardless of how inputs were pushed. Popping every entry
// that shares the minimum key yields one merged item naming exactly the
// streams that hold that key; each operation is a filter over those items.
// Every `next` costs O(log N) heap work.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::automaton::Automaton;
use crate::stream::Stream;

/// A sorted source of key/value items, the input shape accepted by
/// [`OpBuilder`]. Implemented by every stream this crate produces.
pub trait Streamer {
    fn next(&mut self) -> Option<(Vec<u8>, u64)>;
}

impl<'f, A: Automaton> Streamer for Stream<'f, A> {
    fn next(&mut self) -> Option<(Vec<u8>, u64)> {
        Stream::next(self)
    }
}

/// A value annotated with the index of the input stream it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedValue {
    /// Position of the source stream in push order.
    pub index: usize,
    pub value: u64,
}

/// One merged item: a key plus one contribution per input stream that
/// currently holds it, ordered by stream index.
pub type OpItem = (Vec<u8>, Vec<IndexedValue>);

/// Collects input streams, then fixes the operation to apply.
pub struct OpBuilder<'f> {
    streams: Vec<Box<dyn Streamer + 'f>>,
}

impl<'f> Default for OpBuilder<'f> {
    fn default() -> Self {
        OpBuilder::new()
    }
}

impl<'f> OpBuilder<'f> {
    pub fn new() -> OpBuilder<'f> {
        OpBuilder { streams: Vec::new() }
    }

    pub fn push<S: Streamer + 'f>(&mut self, stream: S) {
        self.streams.push(Box::new(stream));
    }

    /// Builder-style variant of [`push`](OpBuilder::push).
    pub fn add<S: Streamer + 'f>(mut self, stream: S) -> OpBuilder<'f> {
        self.push(stream);
        self
    }

    /// Keys held by at least one input.
    pub fn union(self) -> Union<'f> {
        Union { merge: Merge::new(self.streams) }
    }

    /// Keys held by every input.
    pub fn intersection(self) -> Intersection<'f> {
        let expected = self.streams.len();
        Intersection { merge: Merge::new(self.streams), expected }
    }

    /// Keys held by the first input and none of the others.
    pub fn difference(self) -> Difference<'f> {
        Difference { merge: Merge::new(self.streams) }
    }

    /// Keys held by exactly one input.
    pub fn symmetric_difference(self) -> SymmetricDifference<'f> {
        SymmetricDifference { merge: Merge::new(self.streams) }
    }
}

struct HeapEntry {
    key: Vec<u8>,
    value: u64,
    index: usize,
}

// Ordered by (key, index) only; the value rides along. BinaryHeap is a
// max-heap, so comparisons are reversed to pop the minimum first.
impl Ord for HeapEntry {
    fn cmp(&self, other: &HeapEntry) -> Ordering {
        (&other.key, other.index).cmp(&(&self.key, self.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &HeapEntry) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &HeapEntry) -> bool {
        self.key == other.key && self.index == other.index
    }
}

impl Eq for HeapEntry {}

/// The shared merge core: groups heap entries by minimum key.
struct Merge<'f> {
    streams: Vec<Box<dyn Streamer + 'f>>,
    heap: BinaryHeap<HeapEntry>,
}

impl<'f> Merge<'f> {
    fn new(mut streams: Vec<Box<dyn Streamer + 'f>>) -> Merge<'f> {
        let mut heap = BinaryHeap::with_capacity(streams.len());
        for (index, stream) in streams.iter_mut().enumerate() {
            if let Some((key, value)) = stream.next() {
                heap.push(HeapEntry { key, value, index });
            }
        }
        Merge { streams, heap }
    }

    fn refill(&mut self, index: usize) {
        if let Some((key, value)) = self.streams[index].next() {
            self.heap.push(HeapEntry { key, value, index });
        }
    }

    /// Pop every entry sharing the minimum key. Inputs have no internal
    /// duplicates, so at most one entry per source contributes.
    fn next_group(&mut self) -> Option<OpItem> {
        let first = self.heap.pop()?;
        let key = first.key;
        let mut contributors = vec![IndexedValue { index: first.index, value: first.value }];
        self.refill(first.index);
        while self.heap.peek().is_some_and(|e| e.key == key) {
            let entry = match self.heap.pop() {
                Some(e) => e,
                None => break,
            };
            contributors.push(IndexedValue { index: entry.index, value: entry.value });
            self.refill(entry.index);
        }
        Some((key, contributors))
    }
}

/// Lazy union stream.
pub struct Union<'f> {
    merge: Merge<'f>,
}

impl<'f> Union<'f> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<OpItem> {
        self.merge.next_group()
    }
}

/// Lazy intersection stream.
pub struct Intersection<'f> {
    merge: Merge<'f>,
    expected: usize,
}

impl<'f> Intersection<'f> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<OpItem> {
        loop {
            let (key, contributors) = self.merge.next_group()?;
            if contributors.len() == self.expected {
                return Some((key, contributors));
            }
        }
    }
}

/// Lazy difference stream: first input minus all others.
pub struct Difference<'f> {
    merge: Merge<'f>,
}

impl<'f> Difference<'f> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<OpItem> {
        loop {
            let (key, contributors) = self.merge.next_group()?;
            if contributors.len() == 1 && contributors[0].index == 0 {
                return Some((key, contributors));
            }
        }
    }
}

/// Lazy symmetric difference stream.
pub struct SymmetricDifference<'f> {
    merge: Merge<'f>,
}

impl<'f> SymmetricDifference<'f> {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<OpItem> {
        loop {
            let (key, contributors) = self.merge.next_group()?;
            if contributors.len() == 1 {
                return Some((key, contributors));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Builder;
    use crate::fst::Fst;

    fn build(pairs: &[(&str, u64)]) -> Fst {
        let mut builder = Builder::memory();
        for (k, v) in pairs {
            builder.insert(k, *v).unwrap();
        }
        builder.into_fst().unwrap()
    }

    fn drain_union(mut s: Union<'_>) -> Vec<OpItem> {
        let mut items = Vec::new();
        while let Some(item) = s.next() {
            items.push(item);
        }
        items
    }

    #[test]
    fn union_collects_all_contributors() {
        let a = build(&[("a", 1), ("b", 2)]);
        let b = build(&[("b", 20), ("c", 3)]);
        let op = OpBuilder::new().add(a.stream()).add(b.stream());
        let items = drain_union(op.union());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, b"a");
        assert_eq!(items[0].1, vec![IndexedValue { index: 0, value: 1 }]);
        assert_eq!(items[1].0, b"b");
        assert_eq!(
            items[1].1,
            vec![
                IndexedValue { index: 0, value: 2 },
                IndexedValue { index: 1, value: 20 },
            ]
        );
        assert_eq!(items[2].0, b"c");
        assert_eq!(items[2].1, vec![IndexedValue { index: 1, value: 3 }]);
    }

    #[test]
    fn intersection_requires_all_streams() {
        let a = build(&[("a", 1), ("b", 2)]);
        let b = build(&[("b", 20), ("c", 3)]);
        let mut op = OpBuilder::new();
        op.push(a.stream());
        op.push(b.stream());
        let mut inter = op.intersection();
        let (key, contributors) = inter.next().unwrap();
        assert_eq!(key, b"b");
        assert_eq!(contributors.len(), 2);
        assert!(inter.next().is_none());
    }

    #[test]
    fn difference_keeps_first_stream_only() {
        let a = build(&[("a", 1), ("b", 2)]);
        let b = build(&[("b", 20), ("c", 3)]);
        let mut diff = OpBuilder::new().add(a.stream()).add(b.stream()).difference();
        let (key, contributors) = diff.next().unwrap();
        assert_eq!(key, b"a");
        assert_eq!(contributors, vec![IndexedValue { index: 0, value: 1 }]);
        assert!(diff.next().is_none());
    }

    #[test]
    fn symmetric_difference_keeps_single_contributors() {
        let a = build(&[("a", 1), ("b", 2)]);
        let b = build(&[("b", 20), ("c", 3)]);
        let mut sym = OpBuilder::new()
            .add(a.stream())
            .add(b.stream())
            .symmetric_difference();
        assert_eq!(sym.next().map(|(k, _)| k), Some(b"a".to_vec()));
        assert_eq!(sym.next().map(|(k, _)| k), Some(b"c".to_vec()));
        assert!(sym.next().is_none());
    }

    #[test]
    fn three_way_union_is_sorted_and_deduplicated() {
        let a = build(&[("d", 0), ("x", 0)]);
        let b = build(&[("a", 0), ("d", 0)]);
        let c = build(&[("d", 0), ("z", 0)]);
        let op = OpBuilder::new().add(a.stream()).add(b.stream()).add(c.stream());
        let items = drain_union(op.union());
        let keys: Vec<&[u8]> = items.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"a"[..], b"d", b"x", b"z"]);
        assert_eq!(items[1].1.len(), 3);
        // Contributors come out in stream push order.
        let indexes: Vec<usize> = items[1].1.iter().map(|c| c.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn empty_builder_yields_nothing() {
        assert!(OpBuilder::new().union().next().is_none());
        assert!(OpBuilder::new().intersection().next().is_none());
    }

    #[test]
    fn merged_streams_can_feed_another_op() {
        // Parallel builds merged afterwards: union of two halves equals the
        // full key range.
        let low = build(&[("a", 1), ("b", 2)]);
        let high = build(&[("x", 3), ("y", 4)]);
        let items = drain_union(OpBuilder::new().add(low.stream()).add(high.stream()).union());
        let keys: Vec<&[u8]> = items.iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"a"[..], b"b", b"x", b"y"]);
    }
}
