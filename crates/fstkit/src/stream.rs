// The search driver: synchronized traversal of transducer and automaton.
//
// One explicit-stack depth-first walk serves every query shape. Each stack
// frame pairs a transducer node with the search automaton's state and the
// range automaton's state for the key prefix leading to it. Before
// descending a transition the driver consults `can_match` on both; a false
// answer prunes the entire subtree, which is what makes bounded
// edit-distance and range scans cheap. Keys are emitted lazily, in
// lexicographic order, when a final node coincides with matching states.

use crate::automaton::{AlwaysMatch, Automaton};
use crate::fst::Fst;
use crate::node::Node;
use crate::range::{Bound, KeyRange, RangeState};

/// Configures a stream before it starts: search automaton plus optional
/// range bounds.
pub struct StreamBuilder<'f, A: Automaton = AlwaysMatch> {
    fst: &'f Fst,
    aut: A,
    min: Bound,
    max: Bound,
}

impl<'f, A: Automaton> StreamBuilder<'f, A> {
    pub(crate) fn new(fst: &'f Fst, aut: A) -> StreamBuilder<'f, A> {
        StreamBuilder {
            fst,
            aut,
            min: Bound::Unbounded,
            max: Bound::Unbounded,
        }
    }

    /// Keys greater than or equal to `bound`.
    pub fn ge(mut self, bound: impl AsRef<[u8]>) -> Self {
        self.min = Bound::Included(bound.as_ref().to_vec());
        self
    }

    /// Keys strictly greater than `bound`.
    pub fn gt(mut self, bound: impl AsRef<[u8]>) -> Self {
        self.min = Bound::Excluded(bound.as_ref().to_vec());
        self
    }

    /// Keys less than or equal to `bound`.
    pub fn le(mut self, bound: impl AsRef<[u8]>) -> Self {
        self.max = Bound::Included(bound.as_ref().to_vec());
        self
    }

    /// Keys strictly less than `bound`.
    pub fn lt(mut self, bound: impl AsRef<[u8]>) -> Self {
        self.max = Bound::Excluded(bound.as_ref().to_vec());
        self
    }

    pub fn into_stream(self) -> Stream<'f, A> {
        Stream::new(self.fst, self.aut, KeyRange::new(self.min, self.max))
    }
}

struct Frame<S> {
    node: Node,
    trans_index: usize,
    output: u64,
    aut_state: S,
    range_state: RangeState,
    emitted: bool,
}

/// A lazy cursor over matching key/value pairs, in key order.
///
/// Borrows its source transducer for its lifetime; dropping the stream
/// releases everything. A finished transducer is never mutated by its
/// streams, so independent streams over the same index are fully
/// independent cursors.
pub struct Stream<'f, A: Automaton = AlwaysMatch> {
    fst: &'f Fst,
    aut: A,
    range: KeyRange,
    stack: Vec<Frame<A::State>>,
    key: Vec<u8>,
}

impl<'f, A: Automaton> Stream<'f, A> {
    pub(crate) fn new(fst: &'f Fst, aut: A, range: KeyRange) -> Stream<'f, A> {
        let aut_state = aut.start();
        let range_state = range.start();
        let mut stack = Vec::new();
        if aut.can_match(&aut_state) && range.can_match(&range_state) {
            stack.push(Frame {
                node: fst.root(),
                trans_index: 0,
                output: 0,
                aut_state,
                range_state,
                emitted: false,
            });
        }
        Stream { fst, aut, range, stack, key: Vec::new() }
    }

    /// Yield the next matching key and its value, or `None` when exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(Vec<u8>, u64)> {
        loop {
            let descend = {
                let frame = self.stack.last_mut()?;
                if !frame.emitted {
                    // A node's own key sorts before every extension, so the
                    // final check happens on first visit, before descending.
                    frame.emitted = true;
                    if frame.node.is_final
                        && self.aut.is_match(&frame.aut_state)
                        && self.range.is_match(&frame.range_state)
                    {
                        let output = frame.output + frame.node.final_output;
                        return Some((self.key.clone(), output));
                    }
                }
                if frame.trans_index < frame.node.transitions.len() {
                    let t = frame.node.transitions[frame.trans_index];
                    frame.trans_index += 1;
                    let aut_state = self.aut.accept(&frame.aut_state, t.label);
                    let range_state = self.range.accept(&frame.range_state, t.label);
                    Some((t, aut_state, range_state, frame.output))
                } else {
                    None
                }
            };
            match descend {
                Some((t, aut_state, range_state, output)) => {
                    if !self.aut.can_match(&aut_state) || !self.range.can_match(&range_state) {
                        continue;
                    }
                    self.key.push(t.label);
                    self.stack.push(Frame {
                        node: self.fst.node(t.addr),
                        trans_index: 0,
                        output: output + t.output,
                        aut_state,
                        range_state,
                        emitted: false,
                    });
                }
                None => {
                    self.stack.pop();
                    if !self.stack.is_empty() {
                        self.key.pop();
                    }
                }
            }
        }
    }

    /// Drain the stream into a vector. Mostly a convenience for tests and
    /// small result sets.
    pub fn into_vec(mut self) -> Vec<(Vec<u8>, u64)> {
        let mut items = Vec::new();
        while let Some(item) = self.next() {
            items.push(item);
        }
        items
    }

    /// Drain the stream, keeping keys only.
    pub fn into_keys(mut self) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        while let Some((key, _)) = self.next() {
            keys.push(key);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Builder;
    use crate::levenshtein::Levenshtein;

    fn sample() -> Fst {
        let mut builder = Builder::memory();
        for (i, key) in ["a", "ab", "abc", "b", "ba", "z"].iter().enumerate() {
            builder.insert(key, i as u64).unwrap();
        }
        builder.into_fst().unwrap()
    }

    fn keys(items: &[(Vec<u8>, u64)]) -> Vec<&str> {
        items
            .iter()
            .map(|(k, _)| std::str::from_utf8(k).unwrap())
            .collect()
    }

    #[test]
    fn full_scan_is_sorted_with_values() {
        let fst = sample();
        let items = fst.stream().into_vec();
        assert_eq!(keys(&items), vec!["a", "ab", "abc", "b", "ba", "z"]);
        let values: Vec<u64> = items.iter().map(|&(_, v)| v).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn range_ge_lt() {
        let fst = sample();
        let items = fst.range().ge("ab").lt("b").into_stream().into_vec();
        assert_eq!(keys(&items), vec!["ab", "abc"]);
    }

    #[test]
    fn range_gt_le() {
        let fst = sample();
        let items = fst.range().gt("ab").le("ba").into_stream().into_vec();
        assert_eq!(keys(&items), vec!["abc", "b", "ba"]);
    }

    #[test]
    fn empty_range() {
        let fst = sample();
        let items = fst.range().ge("c").lt("d").into_stream().into_vec();
        assert!(items.is_empty());
    }

    #[test]
    fn search_with_levenshtein() {
        let fst = sample();
        let items = fst.search(Levenshtein::new("ab", 1)).into_stream().into_vec();
        assert_eq!(keys(&items), vec!["a", "ab", "abc", "b"]);
    }

    #[test]
    fn search_with_range_combined() {
        let fst = sample();
        let items = fst
            .search(Levenshtein::new("ab", 1))
            .gt("a")
            .lt("b")
            .into_stream()
            .into_vec();
        assert_eq!(keys(&items), vec!["ab", "abc"]);
    }

    #[test]
    fn empty_key_is_emitted_first() {
        let mut builder = Builder::memory();
        builder.insert("", 7).unwrap();
        builder.insert("a", 8).unwrap();
        let fst = builder.into_fst().unwrap();
        let items = fst.stream().into_vec();
        assert_eq!(items, vec![(vec![], 7), (vec![b'a'], 8)]);
    }

    #[test]
    fn independent_streams_agree() {
        let fst = sample();
        let first = fst.stream().into_vec();
        let second = fst.stream().into_vec();
        assert_eq!(first, second);
    }
}
