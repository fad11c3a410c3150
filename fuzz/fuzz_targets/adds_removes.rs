#![no_main]
use libfuzzer_sys::fuzz_target;

use arena_avl::AvlTree;

// Adds every key, then removes the handles picked by the second list.
fuzz_target!(|adds_removes: (Vec<u16>, Vec<u16>)| {
    let (adds, removes) = adds_removes;
    let mut tree: AvlTree<u16> = AvlTree::new();

    let handles: Vec<_> = adds.iter().map(|&key| tree.add(key)).collect();
    tree.assert_invariants();

    if handles.is_empty() {
        return;
    }

    for pick in removes {
        let handle = handles[usize::from(pick) % handles.len()];
        let before = tree.len();

        match tree.remove(handle) {
            Some(_) => assert_eq!(tree.len(), before - 1),
            None => assert_eq!(tree.len(), before),
        }

        tree.assert_invariants();
    }
});
