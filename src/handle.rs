use core::sync::atomic::{AtomicU64, Ordering};

use generational_arena::Index;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one `AvlTree` for the lifetime of the process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TreeId(u64);

impl TreeId {
    pub(crate) fn next() -> TreeId {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A stable reference to an element stored in an [`AvlTree`](crate::AvlTree).
///
/// Handles are returned by [`AvlTree::add`](crate::AvlTree::add) and keep referring to the same
/// element across rotations. Once the element is removed, or the tree is cleared, the handle no
/// longer resolves, even if the storage slot is later reused by another element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    tree: TreeId,
    index: Index,
}

impl Handle {
    pub(crate) fn new(tree: TreeId, index: Index) -> Handle {
        Handle { tree, index }
    }

    #[inline]
    pub(crate) fn tree(&self) -> TreeId {
        self.tree
    }

    #[inline]
    pub(crate) fn index(&self) -> Index {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_ids_are_unique() {
        let a = TreeId::next();
        let b = TreeId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn handles_differ_by_tree() {
        let index = Index::from_raw_parts(0, 0);

        let a = Handle::new(TreeId::next(), index);
        let b = Handle::new(TreeId::next(), index);

        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
    }
}
