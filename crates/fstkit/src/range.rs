// Key range bounds as a lexicographic-comparison automaton.
//
// Range-restricted scans ride the same traversal driver as every other
// search: the automaton state records how the current key prefix compares
// to the two boundary keys, and `can_match` prunes any subtree that has
// diverged outside the range.

use crate::automaton::Automaton;

/// One end of a key range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Bound {
    Included(Vec<u8>),
    Excluded(Vec<u8>),
    #[default]
    Unbounded,
}

impl Bound {
    fn key(&self) -> &[u8] {
        match self {
            Bound::Included(key) | Bound::Excluded(key) => key,
            Bound::Unbounded => &[],
        }
    }

    fn inclusive(&self) -> bool {
        matches!(self, Bound::Included(_) | Bound::Unbounded)
    }
}

/// How the current prefix compares to the lower boundary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lower {
    /// Already above the bound; so is every extension.
    Cleared,
    /// Equal to the first `n` bytes of the bound key.
    OnBound(usize),
    /// Diverged below the bound; no extension can recover.
    Dead,
}

/// How the current prefix compares to the upper boundary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upper {
    /// Diverged below the bound; every extension stays below it.
    Within,
    /// Equal to the first `n` bytes of the bound key.
    OnBound(usize),
    /// Above the bound; so is every extension.
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeState {
    lower: Lower,
    upper: Upper,
}

/// A `[min, max]` window over the key space, expressed as an automaton.
#[derive(Debug, Clone, Default)]
pub struct KeyRange {
    min: Bound,
    max: Bound,
}

impl KeyRange {
    pub fn new(min: Bound, max: Bound) -> KeyRange {
        KeyRange { min, max }
    }
}

impl Automaton for KeyRange {
    type State = RangeState;

    fn start(&self) -> RangeState {
        RangeState {
            lower: match self.min {
                Bound::Unbounded => Lower::Cleared,
                _ => Lower::OnBound(0),
            },
            upper: match self.max {
                Bound::Unbounded => Upper::Within,
                _ => Upper::OnBound(0),
            },
        }
    }

    fn is_match(&self, state: &RangeState) -> bool {
        let lower_ok = match state.lower {
            Lower::Cleared => true,
            // A proper prefix of the bound key is still below it.
            Lower::OnBound(n) => n == self.min.key().len() && self.min.inclusive(),
            Lower::Dead => false,
        };
        let upper_ok = match state.upper {
            Upper::Within => true,
            Upper::OnBound(n) => n < self.max.key().len() || self.max.inclusive(),
            Upper::Dead => false,
        };
        lower_ok && upper_ok
    }

    fn can_match(&self, state: &RangeState) -> bool {
        state.lower != Lower::Dead && state.upper != Upper::Dead
    }

    fn accept(&self, state: &RangeState, byte: u8) -> RangeState {
        let lower = match state.lower {
            Lower::Cleared => Lower::Cleared,
            Lower::Dead => Lower::Dead,
            Lower::OnBound(n) => {
                let key = self.min.key();
                if n == key.len() {
                    // Extending past the bound key moves strictly above it.
                    Lower::Cleared
                } else if byte == key[n] {
                    Lower::OnBound(n + 1)
                } else if byte > key[n] {
                    Lower::Cleared
                } else {
                    Lower::Dead
                }
            }
        };
        let upper = match state.upper {
            Upper::Within => Upper::Within,
            Upper::Dead => Upper::Dead,
            Upper::OnBound(n) => {
                let key = self.max.key();
                if n == key.len() {
                    // Extending past the bound key moves strictly above it.
                    Upper::Dead
                } else if byte == key[n] {
                    Upper::OnBound(n + 1)
                } else if byte < key[n] {
                    Upper::Within
                } else {
                    Upper::Dead
                }
            }
        };
        RangeState { lower, upper }
    }
}
