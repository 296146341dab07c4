// Node codec: serialized node layout, decoded views, checked validation.
//
// A serialized node is:
//   flags: u8                  (bit 0: final, bit 1: carries a final output)
//   final_output: uvarint      (present only when bit 1 is set)
//   transition_count: uvarint
//   transitions, ascending by label:
//     label: u8
//     output_delta: uvarint
//     target_address: uvarint  (absolute offset; always an earlier node)
//
// Children are written before their parents, so every target address points
// backwards. Open-time validation relies on that to check the whole node
// region in one forward pass.

use hashbrown::HashSet;

use crate::bytes;
use crate::format::FormatError;

pub const FLAG_FINAL: u8 = 0b01;
pub const FLAG_FINAL_OUTPUT: u8 = 0b10;

/// Upper bound on transitions per node: one per byte value.
pub const MAX_TRANSITIONS: u64 = 256;

/// One decoded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub label: u8,
    pub output: u64,
    pub addr: usize,
}

/// A node decoded from the serialized transducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub is_final: bool,
    pub final_output: u64,
    pub transitions: Vec<Transition>,
}

impl Node {
    /// Binary search for the transition labeled `label`.
    ///
    /// Labels within a node are strictly increasing.
    #[inline]
    pub fn find(&self, label: u8) -> Option<usize> {
        self.transitions
            .binary_search_by_key(&label, |t| t.label)
            .ok()
    }
}

/// The not-yet-serialized node description assembled by the builder.
///
/// Doubles as the registry signature: two builder nodes are interchangeable
/// exactly when they compare equal.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq)]
pub struct BuilderNode {
    pub is_final: bool,
    pub final_output: u64,
    pub transitions: Vec<BuilderTransition>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct BuilderTransition {
    pub label: u8,
    pub output: u64,
    pub addr: usize,
}

/// Serialize `node` onto the end of `buf`.
pub fn write_node(buf: &mut Vec<u8>, node: &BuilderNode) {
    let mut flags = 0u8;
    if node.is_final {
        flags |= FLAG_FINAL;
        if node.final_output > 0 {
            flags |= FLAG_FINAL_OUTPUT;
        }
    }
    buf.push(flags);
    if flags & FLAG_FINAL_OUTPUT != 0 {
        bytes::write_uvarint(buf, node.final_output);
    }
    bytes::write_uvarint(buf, node.transitions.len() as u64);
    for t in &node.transitions {
        buf.push(t.label);
        bytes::write_uvarint(buf, t.output);
        bytes::write_uvarint(buf, t.addr as u64);
    }
}

/// Decode the node starting at `addr`.
///
/// Traversal fast path: the buffer must have passed [`check_node`] for every
/// node at open time.
pub fn read_node(data: &[u8], addr: usize) -> Node {
    let flags = data[addr];
    let mut pos = addr + 1;
    let final_output = if flags & FLAG_FINAL_OUTPUT != 0 {
        let (v, next) = bytes::uvarint(data, pos);
        pos = next;
        v
    } else {
        0
    };
    let (count, next) = bytes::uvarint(data, pos);
    pos = next;
    let mut transitions = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let label = data[pos];
        pos += 1;
        let (output, next) = bytes::uvarint(data, pos);
        pos = next;
        let (target, next) = bytes::uvarint(data, pos);
        pos = next;
        transitions.push(Transition {
            label,
            output,
            addr: target as usize,
        });
    }
    Node {
        is_final: flags & FLAG_FINAL != 0,
        final_output,
        transitions,
    }
}

/// Validate one serialized node.
///
/// `starts` holds the start offsets of every node decoded so far; all target
/// addresses must be members (suffix sharing only ever points backwards).
/// Returns the offset just past the node.
pub fn check_node(
    data: &[u8],
    addr: usize,
    region_end: usize,
    starts: &HashSet<usize>,
) -> Result<usize, FormatError> {
    let truncated = || FormatError::TruncatedNode { offset: addr };
    let malformed = |reason| FormatError::MalformedNode { offset: addr, reason };

    if addr >= region_end {
        return Err(truncated());
    }
    let flags = data[addr];
    if flags & !(FLAG_FINAL | FLAG_FINAL_OUTPUT) != 0 {
        return Err(malformed("reserved flag bits set"));
    }
    if flags & FLAG_FINAL_OUTPUT != 0 && flags & FLAG_FINAL == 0 {
        return Err(malformed("final output on a non-final node"));
    }
    let mut pos = addr + 1;
    if flags & FLAG_FINAL_OUTPUT != 0 {
        let (output, next) = bytes::checked_uvarint(data, pos, region_end).ok_or_else(truncated)?;
        if output == 0 {
            return Err(malformed("zero final output encoded explicitly"));
        }
        pos = next;
    }
    let (count, next) = bytes::checked_uvarint(data, pos, region_end).ok_or_else(truncated)?;
    pos = next;
    if count > MAX_TRANSITIONS {
        return Err(malformed("transition count exceeds byte alphabet"));
    }
    let mut previous_label: Option<u8> = None;
    for _ in 0..count {
        if pos >= region_end {
            return Err(truncated());
        }
        let label = data[pos];
        pos += 1;
        if let Some(prev) = previous_label {
            if label <= prev {
                return Err(malformed("transition labels not strictly increasing"));
            }
        }
        previous_label = Some(label);
        let (_, next) = bytes::checked_uvarint(data, pos, region_end).ok_or_else(truncated)?;
        pos = next;
        let (target, next) = bytes::checked_uvarint(data, pos, region_end).ok_or_else(truncated)?;
        pos = next;
        if !starts.contains(&(target as usize)) {
            return Err(malformed("transition target is not an earlier node"));
        }
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(is_final: bool, final_output: u64) -> BuilderNode {
        BuilderNode {
            is_final,
            final_output,
            transitions: Vec::new(),
        }
    }

    #[test]
    fn final_leaf_round_trip() {
        let mut buf = Vec::new();
        write_node(&mut buf, &leaf(true, 42));
        let node = read_node(&buf, 0);
        assert!(node.is_final);
        assert_eq!(node.final_output, 42);
        assert!(node.transitions.is_empty());
    }

    #[test]
    fn empty_final_leaf_is_two_bytes() {
        // flags + zero transition count; a zero final output is implied.
        let mut buf = Vec::new();
        write_node(&mut buf, &leaf(true, 0));
        assert_eq!(buf.len(), 2);
        let node = read_node(&buf, 0);
        assert!(node.is_final);
        assert_eq!(node.final_output, 0);
    }

    #[test]
    fn transitions_round_trip() {
        let mut buf = Vec::new();
        write_node(&mut buf, &leaf(true, 0));
        let leaf_end = buf.len();
        let inner = BuilderNode {
            is_final: false,
            final_output: 0,
            transitions: vec![
                BuilderTransition { label: b'a', output: 7, addr: 0 },
                BuilderTransition { label: b'z', output: 0, addr: 0 },
            ],
        };
        write_node(&mut buf, &inner);
        let node = read_node(&buf, leaf_end);
        assert!(!node.is_final);
        assert_eq!(node.transitions.len(), 2);
        assert_eq!(node.transitions[0].label, b'a');
        assert_eq!(node.transitions[0].output, 7);
        assert_eq!(node.transitions[1].label, b'z');
        assert_eq!(node.find(b'z'), Some(1));
        assert_eq!(node.find(b'b'), None);
    }

    #[test]
    fn check_accepts_valid_chain() {
        let mut buf = Vec::new();
        write_node(&mut buf, &leaf(true, 3));
        let leaf_end = buf.len();
        let inner = BuilderNode {
            is_final: false,
            final_output: 0,
            transitions: vec![BuilderTransition { label: b'x', output: 0, addr: 0 }],
        };
        write_node(&mut buf, &inner);

        let mut starts = HashSet::new();
        let end = check_node(&buf, 0, buf.len(), &starts).unwrap();
        assert_eq!(end, leaf_end);
        starts.insert(0);
        let end = check_node(&buf, leaf_end, buf.len(), &starts).unwrap();
        assert_eq!(end, buf.len());
    }

    #[test]
    fn check_rejects_forward_target() {
        let inner = BuilderNode {
            is_final: false,
            final_output: 0,
            transitions: vec![BuilderTransition { label: b'x', output: 0, addr: 99 }],
        };
        let mut buf = Vec::new();
        write_node(&mut buf, &inner);
        let starts = HashSet::new();
        let err = check_node(&buf, 0, buf.len(), &starts).unwrap_err();
        assert!(matches!(err, FormatError::MalformedNode { .. }));
    }

    #[test]
    fn check_rejects_unsorted_labels() {
        let mut buf = Vec::new();
        buf.push(0); // flags
        buf.push(2); // two transitions
        for label in [b'b', b'a'] {
            buf.push(label);
            buf.push(0); // output
            buf.push(0); // target
        }
        let mut starts = HashSet::new();
        starts.insert(0usize);
        let err = check_node(&buf, 0, buf.len(), &starts).unwrap_err();
        assert!(matches!(
            err,
            FormatError::MalformedNode { reason: "transition labels not strictly increasing", .. }
        ));
    }

    #[test]
    fn check_rejects_truncated_record() {
        let inner = BuilderNode {
            is_final: false,
            final_output: 0,
            transitions: vec![BuilderTransition { label: b'x', output: 1, addr: 0 }],
        };
        let mut buf = Vec::new();
        write_node(&mut buf, &inner);
        let mut starts = HashSet::new();
        starts.insert(0usize);
        let err = check_node(&buf, 0, buf.len() - 1, &starts).unwrap_err();
        assert!(matches!(err, FormatError::TruncatedNode { .. }));
    }

    #[test]
    fn check_rejects_reserved_flags() {
        let buf = vec![0b100u8, 0];
        let starts = HashSet::new();
        let err = check_node(&buf, 0, buf.len(), &starts).unwrap_err();
        assert!(matches!(err, FormatError::MalformedNode { .. }));
    }
}
