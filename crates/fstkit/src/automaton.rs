// The generic search automaton contract.
//
// Every search variety plugs into the same four operations: plain scans use
// an automaton that always matches, ranges compare against boundary keys,
// fuzzy search tracks an edit-distance table, regex search tracks NFA state
// sets. The traversal driver in `stream` is generic over this trait and
// never inspects the concrete automaton.

/// A state machine over the byte alphabet, driven in lockstep with the
/// transducer to constrain which paths are explored.
///
/// States are owned by the traversal, not the automaton: each explored
/// branch derives its own state via [`accept`](Automaton::accept), so
/// concurrent traversals never share mutable state.
pub trait Automaton {
    type State: Clone;

    /// The state before any input byte.
    fn start(&self) -> Self::State;

    /// True if a key ending in this state is accepted.
    fn is_match(&self, state: &Self::State) -> bool;

    /// False if no extension of the current key can ever be accepted;
    /// the driver prunes the whole subtree.
    fn can_match(&self, state: &Self::State) -> bool;

    /// The state after consuming `byte`.
    fn accept(&self, state: &Self::State, byte: u8) -> Self::State;
}

/// Matches every key and never prunes; plain scans use this.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysMatch;

impl Automaton for AlwaysMatch {
    type State = ();

    fn start(&self) -> () {}

    fn is_match(&self, _state: &()) -> bool {
        true
    }

    fn can_match(&self, _state: &()) -> bool {
        true
    }

    fn accept(&self, _state: &(), _byte: u8) -> () {}
}

impl<A: Automaton> Automaton for &A {
    type State = A::State;

    fn start(&self) -> Self::State {
        (**self).start()
    }

    fn is_match(&self, state: &Self::State) -> bool {
        (**self).is_match(state)
    }

    fn can_match(&self, state: &Self::State) -> bool {
        (**self).can_match(state)
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        (**self).accept(state, byte)
    }
}
