//! A reference model for checking `AvlTree` against a plain vector of live elements.
//!
//! Used by the proptest suite and by the fuzz targets (behind the `model` feature).

use std::cmp::Ordering;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, Handle};

/// An element ordered by `key` only. Elements sharing a key are told apart by `id`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub key: u8,
    pub id: u32,
}

fn by_key(a: &Item, b: &Item) -> Ordering {
    a.key.cmp(&b.key)
}

pub type ItemTree = AvlTree<Item, fn(&Item, &Item) -> Ordering>;

pub fn item_tree() -> ItemTree {
    AvlTree::with_comparator(by_key as fn(&Item, &Item) -> Ordering)
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Add(u8),
    // Removes a live element, chosen by position in insertion order.
    Remove(usize),
    // Removes an element that was already removed or cleared.
    RemoveStale(usize),
    // Removes an element of an unrelated tree.
    RemoveForeign,
    PopSmallest,
    PopGreatest,
    SmallestAbove(u8),
    GreatestBelow(u8),
    Clear,
}

// A narrow key range so that duplicate keys are common.
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..64
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        8 => key_strategy().prop_map(Op::Add),
        4 => proptest::num::usize::ANY.prop_map(Op::Remove),
        1 => proptest::num::usize::ANY.prop_map(Op::RemoveStale),
        1 => Just(Op::RemoveForeign),
        2 => Just(Op::PopSmallest),
        2 => Just(Op::PopGreatest),
        2 => key_strategy().prop_map(Op::SmallestAbove),
        2 => key_strategy().prop_map(Op::GreatestBelow),
        1 => Just(Op::Clear),
    ]
}

struct Model {
    live: Vec<(Item, Handle)>,
    retired: Vec<Handle>,
    next_id: u32,
}

impl Model {
    fn probe(key: u8) -> Item {
        Item { key, id: u32::MAX }
    }

    fn keys(&self) -> Vec<u8> {
        let mut keys: Vec<u8> = self.live.iter().map(|(item, _)| item.key).collect();
        keys.sort_unstable();
        keys
    }

    // Moves the live element with `item`'s id to the retired handles.
    fn retire(&mut self, item: Item) {
        let pos = self
            .live
            .iter()
            .position(|(live, _)| live.id == item.id)
            .expect("popped element must be live");

        let (_, handle) = self.live.remove(pos);
        self.retired.push(handle);
    }

    fn smallest_above(&self, key: u8) -> Option<u8> {
        let keys = self.keys();

        if keys.contains(&key) {
            return Some(key);
        }

        keys.into_iter().find(|&k| k > key)
    }

    fn greatest_below(&self, key: u8) -> Option<u8> {
        let keys = self.keys();

        if keys.contains(&key) {
            return Some(key);
        }

        keys.into_iter().rev().find(|&k| k < key)
    }
}

pub fn run_model_equivalence(ops: Vec<Op>) {
    let mut tree = item_tree();
    let mut model = Model {
        live: Vec::with_capacity(ops.len()),
        retired: Vec::new(),
        next_id: 0,
    };

    let mut foreign = item_tree();
    let foreign_item = Item { key: 0, id: u32::MAX };
    let foreign_handle = foreign.add(foreign_item);

    for (op_id, op) in ops.into_iter().enumerate() {
        match op {
            Op::Add(key) => {
                let item = Item {
                    key,
                    id: model.next_id,
                };
                model.next_id += 1;

                let handle = tree.add(item);
                model.live.push((item, handle));
            }

            Op::Remove(idx) => {
                if model.live.is_empty() {
                    continue;
                }

                let (item, handle) = model.live.remove(idx % model.live.len());
                assert_eq!(tree.remove(handle), Some(item), "Op #{op_id}: {op:?}");
                model.retired.push(handle);
            }

            Op::RemoveStale(idx) => {
                if model.retired.is_empty() {
                    continue;
                }

                let handle = model.retired[idx % model.retired.len()];
                let len = tree.len();

                assert_eq!(tree.remove(handle), None, "Op #{op_id}: {op:?}");
                assert_eq!(tree.len(), len, "Op #{op_id}: {op:?}");
            }

            Op::RemoveForeign => {
                assert_eq!(tree.remove(foreign_handle), None, "Op #{op_id}: {op:?}");
                assert_eq!(foreign.get(foreign_handle), Some(&foreign_item));
            }

            Op::PopSmallest => {
                let expected = model.keys().first().copied();
                let popped = tree.pop_smallest();

                assert_eq!(popped.map(|i| i.key), expected, "Op #{op_id}: {op:?}");
                if let Some(item) = popped {
                    model.retire(item);
                }
            }

            Op::PopGreatest => {
                let expected = model.keys().last().copied();
                let popped = tree.pop_greatest();

                assert_eq!(popped.map(|i| i.key), expected, "Op #{op_id}: {op:?}");
                if let Some(item) = popped {
                    model.retire(item);
                }
            }

            Op::SmallestAbove(key) => {
                let found = tree.smallest_above(&Model::probe(key)).map(|i| i.key);
                assert_eq!(found, model.smallest_above(key), "Op #{op_id}: {op:?}");
            }

            Op::GreatestBelow(key) => {
                let found = tree.greatest_below(&Model::probe(key)).map(|i| i.key);
                assert_eq!(found, model.greatest_below(key), "Op #{op_id}: {op:?}");
            }

            Op::Clear => {
                tree.clear();
                model
                    .retired
                    .extend(model.live.drain(..).map(|(_, handle)| handle));
            }
        }

        tree.assert_invariants();
        assert_eq!(tree.len(), model.live.len());

        let mut keys = Vec::with_capacity(tree.len());
        tree.for_each(|item| keys.push(item.key));
        assert_eq!(keys, model.keys(), "Op #{op_id}: {op:?}");

        for (item, handle) in &model.live {
            assert_eq!(tree.get(*handle), Some(item));
        }

        for handle in &model.retired {
            assert!(!tree.contains(*handle));
        }
    }
}
