// Minimization cache ("register"): maps a node signature to the address it
// was already written at, so structurally identical suffixes are stored once.
//
// The cache is bounded: a fixed table of hash cells, each holding a handful
// of entries in most-recently-used order. A full cell evicts its coldest
// entry. Missing an eviction costs compression, never correctness. The
// register belongs to exactly one builder and dies with it.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::node::BuilderNode;

const DEFAULT_TABLE_SIZE: usize = 16_384;
const DEFAULT_CELL_SIZE: usize = 4;

pub struct Registry {
    table: Vec<Cell>,
    cell_size: usize,
}

#[derive(Default)]
struct Cell {
    // Most recently used first.
    entries: Vec<(BuilderNode, usize)>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::with_capacity(DEFAULT_TABLE_SIZE, DEFAULT_CELL_SIZE)
    }

    pub fn with_capacity(table_size: usize, cell_size: usize) -> Registry {
        let table_size = table_size.max(1);
        let mut table = Vec::with_capacity(table_size);
        table.resize_with(table_size, Cell::default);
        Registry { table, cell_size: cell_size.max(1) }
    }

    fn cell_index(&self, node: &BuilderNode) -> usize {
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        (hasher.finish() % self.table.len() as u64) as usize
    }

    /// Look up the address of an already-written node with this signature.
    pub fn get(&mut self, node: &BuilderNode) -> Option<usize> {
        let idx = self.cell_index(node);
        let cell = &mut self.table[idx];
        let found = cell.entries.iter().position(|(n, _)| n == node)?;
        let entry = cell.entries.remove(found);
        let addr = entry.1;
        cell.entries.insert(0, entry);
        Some(addr)
    }

    /// Record that `node` was written at `addr`, evicting the coldest entry
    /// in its cell if the cell is full.
    pub fn insert(&mut self, node: BuilderNode, addr: usize) {
        let idx = self.cell_index(&node);
        let cell = &mut self.table[idx];
        if cell.entries.len() == self.cell_size {
            cell.entries.pop();
        }
        cell.entries.insert(0, (node, addr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::BuilderTransition;

    fn node(label: u8) -> BuilderNode {
        BuilderNode {
            is_final: false,
            final_output: 0,
            transitions: vec![BuilderTransition { label, output: 0, addr: 0 }],
        }
    }

    #[test]
    fn hit_after_insert() {
        let mut reg = Registry::new();
        reg.insert(node(b'a'), 100);
        assert_eq!(reg.get(&node(b'a')), Some(100));
        assert_eq!(reg.get(&node(b'b')), None);
    }

    #[test]
    fn signature_distinguishes_finality() {
        let mut reg = Registry::new();
        let plain = BuilderNode::default();
        let accepting = BuilderNode { is_final: true, ..BuilderNode::default() };
        reg.insert(plain.clone(), 7);
        assert_eq!(reg.get(&plain), Some(7));
        assert_eq!(reg.get(&accepting), None);
    }

    #[test]
    fn full_cell_evicts_coldest() {
        // One cell, capacity two: inserting a third evicts the least
        // recently used signature.
        let mut reg = Registry::with_capacity(1, 2);
        reg.insert(node(b'a'), 1);
        reg.insert(node(b'b'), 2);
        assert_eq!(reg.get(&node(b'a')), Some(1)); // refresh 'a'
        reg.insert(node(b'c'), 3);
        assert_eq!(reg.get(&node(b'b')), None);
        assert_eq!(reg.get(&node(b'a')), Some(1));
        assert_eq!(reg.get(&node(b'c')), Some(3));
    }
}
