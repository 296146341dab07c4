// One-pass minimal transducer construction.
//
// The builder keeps the trie path of the previous key as a stack of
// unfinished nodes. Each insert finds the longest common prefix with the new
// key; everything below the divergence point can never change again, so it
// is compiled bottom-up through the register and replaced by the new key's
// suffix. Because keys arrive in strictly increasing order this single
// forward pass yields the same minimal automaton as batch minimization.
//
// Output values ride the transitions as non-negative deltas. When a new key
// shares a prefix, the shared transitions keep only the common minimum and
// the remainder is pushed down into the diverging suffixes, so the sum along
// any accepted path always reproduces the inserted value.

use std::cmp::Ordering;
use std::io;

use crate::format;
use crate::fst::Fst;
use crate::node::{self, BuilderNode, BuilderTransition};
use crate::registry::Registry;
use crate::FstError;

/// Builds an index from a strictly increasing sequence of keys.
///
/// Writes nodes to the underlying writer as soon as they are finished;
/// memory use is bounded by the longest key plus the register, not by the
/// number of keys.
pub struct Builder<W: io::Write> {
    wtr: W,
    /// Bytes written so far; the address of the next node.
    written: usize,
    unfinished: UnfinishedNodes,
    registry: Registry,
    last_key: Option<Vec<u8>>,
    key_count: u64,
    scratch: Vec<u8>,
}

impl Builder<Vec<u8>> {
    /// Build into an in-memory buffer.
    pub fn memory() -> Builder<Vec<u8>> {
        // Writing a header to a Vec cannot fail.
        match Builder::new(Vec::with_capacity(1024)) {
            Ok(builder) => builder,
            Err(_) => unreachable!("in-memory header write cannot fail"),
        }
    }

    /// Finish construction and reopen the buffer as an [`Fst`].
    pub fn into_fst(self) -> Result<Fst, FstError> {
        let data = self.finish()?;
        Fst::from_bytes(data)
    }
}

impl<W: io::Write> Builder<W> {
    /// Start building into `wtr`. The header is written immediately.
    pub fn new(mut wtr: W) -> Result<Builder<W>, FstError> {
        format::write_header(&mut wtr)?;
        Ok(Builder {
            wtr,
            written: format::HEADER_SIZE,
            unfinished: UnfinishedNodes::new(),
            registry: Registry::new(),
            last_key: None,
            key_count: 0,
            scratch: Vec::new(),
        })
    }

    /// Insert a key with no value (sets). Equivalent to `insert(key, 0)`.
    pub fn add(&mut self, key: impl AsRef<[u8]>) -> Result<(), FstError> {
        self.insert(key, 0)
    }

    /// Insert a key/value pair.
    ///
    /// Keys must arrive in strictly increasing byte order: repeating the
    /// previous key fails with `DuplicateKey`, anything smaller with
    /// `OutOfOrder`.
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: u64) -> Result<(), FstError> {
        let key = key.as_ref();
        if let Some(last) = &self.last_key {
            match key.cmp(last.as_slice()) {
                Ordering::Equal => {
                    return Err(FstError::DuplicateKey { key: key.to_vec() });
                }
                Ordering::Less => {
                    return Err(FstError::OutOfOrder {
                        previous: last.clone(),
                        got: key.to_vec(),
                    });
                }
                Ordering::Greater => {}
            }
        }
        if key.is_empty() {
            // The empty key sorts before everything, so it can only be the
            // first insert; it lives on the root directly.
            self.unfinished.set_root_output(value);
        } else {
            let (prefix_len, remaining) =
                self.unfinished.find_common_prefix_and_set_output(key, value)?;
            self.compile_from(prefix_len)?;
            self.unfinished.add_suffix(&key[prefix_len..], remaining);
        }
        self.last_key = Some(key.to_vec());
        self.key_count += 1;
        Ok(())
    }

    /// Flush the remaining frontier, write the footer, and return the writer.
    pub fn finish(mut self) -> Result<W, FstError> {
        self.compile_from(0)?;
        let root = self.unfinished.pop_root();
        let root_addr = self.compile(&root)?;
        format::write_footer(&mut self.wtr, root_addr, self.key_count)?;
        self.wtr.flush()?;
        Ok(self.wtr)
    }

    /// Number of keys inserted so far.
    pub fn len(&self) -> u64 {
        self.key_count
    }

    pub fn is_empty(&self) -> bool {
        self.key_count == 0
    }

    /// Compile every unfinished node strictly below stack depth `istate`,
    /// bottom-up, wiring each finished address into its parent.
    fn compile_from(&mut self, istate: usize) -> Result<(), FstError> {
        let mut addr: Option<usize> = None;
        while istate + 1 < self.unfinished.len() {
            let unfinished = match addr {
                None => self.unfinished.pop_empty(),
                Some(a) => self.unfinished.pop_freeze(a),
            };
            addr = Some(self.compile(&unfinished)?);
        }
        if let Some(a) = addr {
            self.unfinished.top_last_freeze(a);
        }
        Ok(())
    }

    /// Write a finished node, reusing an identical one from the register
    /// when possible.
    fn compile(&mut self, node: &BuilderNode) -> Result<usize, FstError> {
        if let Some(addr) = self.registry.get(node) {
            return Ok(addr);
        }
        let addr = self.written;
        self.scratch.clear();
        node::write_node(&mut self.scratch, node);
        self.wtr.write_all(&self.scratch)?;
        self.written += self.scratch.len();
        self.registry.insert(node.clone(), addr);
        Ok(addr)
    }
}

/// The trie path of the previous key, deepest node last.
///
/// `stack[i].last` is the pending transition consuming the previous key's
/// byte `i`; its target address is filled in when the child is compiled.
struct UnfinishedNodes {
    stack: Vec<UnfinishedNode>,
}

struct UnfinishedNode {
    node: BuilderNode,
    last: Option<LastTransition>,
}

struct LastTransition {
    label: u8,
    out: u64,
}

impl UnfinishedNodes {
    fn new() -> UnfinishedNodes {
        UnfinishedNodes {
            stack: vec![UnfinishedNode { node: BuilderNode::default(), last: None }],
        }
    }

    fn len(&self) -> usize {
        self.stack.len()
    }

    fn set_root_output(&mut self, value: u64) {
        self.stack[0].node.is_final = true;
        self.stack[0].node.final_output = value;
    }

    /// Walk the shared prefix of `key`, lowering each shared transition's
    /// output to the common minimum and pushing the excess down one level.
    /// Returns the prefix length and the value still to be placed on the
    /// diverging suffix.
    fn find_common_prefix_and_set_output(
        &mut self,
        key: &[u8],
        mut value: u64,
    ) -> Result<(usize, u64), FstError> {
        let mut i = 0;
        while i < key.len() {
            let add_prefix = match self.stack[i].last.as_mut() {
                Some(t) if t.label == key[i] => {
                    i += 1;
                    let common = t.out.min(value);
                    let add_prefix = t.out - common;
                    value -= common;
                    t.out = common;
                    add_prefix
                }
                _ => break,
            };
            if add_prefix > 0 {
                self.stack[i].add_output_prefix(add_prefix)?;
            }
        }
        Ok((i, value))
    }

    /// Append the diverging suffix for a new key, with `value` on its first
    /// transition.
    fn add_suffix(&mut self, suffix: &[u8], value: u64) {
        let Some((&first, rest)) = suffix.split_first() else {
            return;
        };
        let top = self.stack.len() - 1;
        debug_assert!(self.stack[top].last.is_none());
        self.stack[top].last = Some(LastTransition { label: first, out: value });
        for &label in rest {
            self.stack.push(UnfinishedNode {
                node: BuilderNode::default(),
                last: Some(LastTransition { label, out: 0 }),
            });
        }
        self.stack.push(UnfinishedNode {
            node: BuilderNode { is_final: true, final_output: 0, transitions: Vec::new() },
            last: None,
        });
    }

    /// Pop the deepest node; it must have no pending transition.
    fn pop_empty(&mut self) -> BuilderNode {
        let unfinished = match self.stack.pop() {
            Some(u) => u,
            None => unreachable!("pop on empty unfinished stack"),
        };
        debug_assert!(unfinished.last.is_none());
        unfinished.node
    }

    /// Pop the deepest node after wiring its pending transition to `addr`.
    fn pop_freeze(&mut self, addr: usize) -> BuilderNode {
        let mut unfinished = match self.stack.pop() {
            Some(u) => u,
            None => unreachable!("pop on empty unfinished stack"),
        };
        unfinished.freeze_last(addr);
        unfinished.node
    }

    fn pop_root(&mut self) -> BuilderNode {
        debug_assert_eq!(self.stack.len(), 1);
        self.pop_empty()
    }

    /// Wire the stack top's pending transition to `addr`.
    fn top_last_freeze(&mut self, addr: usize) {
        let top = self.stack.len() - 1;
        self.stack[top].freeze_last(addr);
    }
}

impl UnfinishedNode {
    fn freeze_last(&mut self, addr: usize) {
        if let Some(t) = self.last.take() {
            self.node.transitions.push(BuilderTransition {
                label: t.label,
                output: t.out,
                addr,
            });
        }
    }

    /// Add `prefix` to every output leaving this node.
    fn add_output_prefix(&mut self, prefix: u64) -> Result<(), FstError> {
        if self.node.is_final {
            self.node.final_output = checked_output(self.node.final_output, prefix)?;
        }
        for t in &mut self.node.transitions {
            t.output = checked_output(t.output, prefix)?;
        }
        if let Some(t) = self.last.as_mut() {
            t.out = checked_output(t.out, prefix)?;
        }
        Ok(())
    }
}

fn checked_output(a: u64, b: u64) -> Result<u64, FstError> {
    a.checked_add(b).ok_or_else(|| {
        FstError::InvalidOutput(format!("output delta {a} + {b} overflows u64"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[(&str, u64)]) -> Fst {
        let mut builder = Builder::memory();
        for (k, v) in keys {
            builder.insert(k, *v).unwrap();
        }
        builder.into_fst().unwrap()
    }

    #[test]
    fn empty_builder_produces_empty_fst() {
        let fst = Builder::memory().into_fst().unwrap();
        assert_eq!(fst.len(), 0);
        assert!(!fst.contains(""));
        assert!(!fst.contains("a"));
    }

    #[test]
    fn single_key() {
        let fst = build(&[("abc", 5)]);
        assert_eq!(fst.len(), 1);
        assert_eq!(fst.get("abc"), Some(5));
        assert_eq!(fst.get("ab"), None);
        assert_eq!(fst.get("abcd"), None);
    }

    #[test]
    fn empty_key_lives_on_root() {
        let fst = build(&[("", 9), ("a", 1)]);
        assert_eq!(fst.get(""), Some(9));
        assert_eq!(fst.get("a"), Some(1));
    }

    #[test]
    fn rejects_duplicate_key() {
        let mut builder = Builder::memory();
        builder.add("same").unwrap();
        let err = builder.add("same").unwrap_err();
        assert!(matches!(err, FstError::DuplicateKey { .. }));
    }

    #[test]
    fn rejects_out_of_order_key() {
        let mut builder = Builder::memory();
        builder.add("b").unwrap();
        let err = builder.add("a").unwrap_err();
        assert!(matches!(err, FstError::OutOfOrder { .. }));
        // The builder stays usable for keys that restore the order.
        builder.add("c").unwrap();
    }

    #[test]
    fn prefix_keys() {
        let fst = build(&[("a", 1), ("ab", 2), ("abc", 3)]);
        assert_eq!(fst.get("a"), Some(1));
        assert_eq!(fst.get("ab"), Some(2));
        assert_eq!(fst.get("abc"), Some(3));
        assert_eq!(fst.get("b"), None);
    }

    #[test]
    fn output_redistribution_preserves_values() {
        // Later keys with smaller values force the shared prefix output
        // down to the common minimum.
        let fst = build(&[("jan", 300), ("jul", 7), ("jun", 6)]);
        assert_eq!(fst.get("jan"), Some(300));
        assert_eq!(fst.get("jul"), Some(7));
        assert_eq!(fst.get("jun"), Some(6));
    }

    #[test]
    fn shared_suffixes_reuse_nodes() {
        // Keys with a shared suffix serialize smaller than keys of the same
        // total length without one.
        let shared = build(&[("xab", 0), ("yab", 0)]);
        let disjoint = build(&[("xab", 0), ("ycd", 0)]);
        assert!(shared.size() < disjoint.size());
    }

    #[test]
    fn overflow_is_invalid_output() {
        // Redistribution keeps every path sum equal to an inserted value, so
        // u64 overflow cannot be provoked through insert alone; the checked
        // arithmetic still guards the push-down step.
        let mut unfinished = UnfinishedNode {
            node: BuilderNode {
                is_final: true,
                final_output: u64::MAX,
                transitions: Vec::new(),
            },
            last: None,
        };
        let err = unfinished.add_output_prefix(1).unwrap_err();
        assert!(matches!(err, FstError::InvalidOutput(_)));
    }

    #[test]
    fn large_values_round_trip() {
        let fst = build(&[("aa", u64::MAX), ("ab", 1), ("b", u64::MAX - 1)]);
        assert_eq!(fst.get("aa"), Some(u64::MAX));
        assert_eq!(fst.get("ab"), Some(1));
        assert_eq!(fst.get("b"), Some(u64::MAX - 1));
    }

    #[test]
    fn len_counts_keys() {
        let mut builder = Builder::memory();
        assert!(builder.is_empty());
        builder.add("a").unwrap();
        builder.add("b").unwrap();
        assert_eq!(builder.len(), 2);
        let fst = builder.into_fst().unwrap();
        assert_eq!(fst.len(), 2);
    }
}
