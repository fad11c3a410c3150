use generational_arena::Index;

use crate::{AvlTree, Dir, Node, Stack};

impl<T, C> AvlTree<T, C> {
    /// Calls `visit` on every element in ascending order.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        self.walk_in_order(Dir::Left, |_, node| visit(&node.payload));
    }

    /// Calls `visit` on every element in descending order.
    pub fn for_each_reverse<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        self.walk_in_order(Dir::Right, |_, node| visit(&node.payload));
    }

    /// Returns the elements of the tree in ascending order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut items = Vec::with_capacity(self.len);
        self.for_each(|item| items.push(item.clone()));
        items
    }

    // Visits every node, `first` subtree before the node and the other subtree after it.
    //
    // Uses an explicit stack holding the ancestors whose `first` subtree is being visited, so the
    // depth is bounded by the tree height rather than the call stack.
    pub(crate) fn walk_in_order<F>(&self, first: Dir, mut visit: F)
    where
        F: FnMut(Index, &Node<T>),
    {
        let mut stack = Stack::new();
        let mut opt_cur = self.root;

        loop {
            // Upon entering a new subtree, descend to its first node.
            while let Some(cur) = opt_cur {
                stack.push(cur);
                opt_cur = self.nodes[cur].child(first);
            }

            let Some(cur) = stack.pop() else {
                break;
            };

            let node = &self.nodes[cur];
            visit(cur, node);

            opt_cur = node.child(!first);
        }
    }
}
