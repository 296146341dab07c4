// Bounded edit-distance search automaton.
//
// The automaton state is one row of the classic dynamic-programming table
// for Levenshtein distance against the query: entry `i` holds the cheapest
// way to turn the first `i` query bytes into the key prefix consumed so
// far. Entries are capped at `max_distance + 1`, so the state stays small
// and cheap to clone per explored branch.

use crate::automaton::Automaton;

/// Matches keys within a fixed edit distance (insertions, deletions,
/// substitutions) of a query.
///
/// Distances are measured in bytes, the index's native alphabet.
#[derive(Debug, Clone)]
pub struct Levenshtein {
    query: Vec<u8>,
    max_distance: u32,
}

impl Levenshtein {
    pub fn new(query: impl AsRef<[u8]>, max_distance: u32) -> Levenshtein {
        Levenshtein {
            query: query.as_ref().to_vec(),
            max_distance,
        }
    }
}

impl Automaton for Levenshtein {
    type State = Vec<u32>;

    fn start(&self) -> Vec<u32> {
        // Row for the empty key prefix: i deletions reach query[..i].
        let cap = self.max_distance + 1;
        (0..=self.query.len() as u32).map(|i| i.min(cap)).collect()
    }

    fn is_match(&self, state: &Vec<u32>) -> bool {
        match state.last() {
            Some(&d) => d <= self.max_distance,
            None => false,
        }
    }

    fn can_match(&self, state: &Vec<u32>) -> bool {
        // The minimum entry only ever grows along a path; once every entry
        // exceeds the bound, no extension can come back under it.
        state.iter().any(|&d| d <= self.max_distance)
    }

    fn accept(&self, state: &Vec<u32>, byte: u8) -> Vec<u32> {
        let cap = self.max_distance + 1;
        let mut next = Vec::with_capacity(state.len());
        next.push((state[0] + 1).min(cap));
        for i in 1..state.len() {
            let cost = if self.query[i - 1] == byte { 0 } else { 1 };
            let substitute = state[i - 1] + cost;
            let delete = state[i] + 1;
            let insert = next[i - 1] + 1;
            next.push(substitute.min(delete).min(insert).min(cap));
        }
        next
    }
}
