use core::{cmp::Ordering, fmt};

use generational_arena::Index;

use crate::{AvlTree, Comparator, Dir, Handle, Stack};

/// A broken structural invariant, as reported by [`AvlTree::check_invariants`].
///
/// A tree only reaches such a state if its [`Comparator`] is not a total order, or if this crate
/// has a bug.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvariantViolation {
    /// The subtree heights below `node` differ by more than one.
    Unbalanced { node: Handle, left: u8, right: u8 },
    /// The cached height of `node` does not match its subtrees.
    WrongHeight { node: Handle, stored: u8, expected: u8 },
    /// A child of `node` does not point back at it, or the root has a parent.
    BrokenParentLink { node: Handle },
    /// `node` compares less than the element preceding it in order.
    OutOfOrder { node: Handle },
    /// The element count differs from the number of reachable nodes.
    CountMismatch { len: usize, reachable: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::Unbalanced { node, left, right } => write!(
                f,
                "{node:?} is unbalanced: left height {left}, right height {right}"
            ),
            InvariantViolation::WrongHeight {
                node,
                stored,
                expected,
            } => write!(f, "{node:?} has height {stored}, expected {expected}"),
            InvariantViolation::BrokenParentLink { node } => {
                write!(f, "parent link of {node:?} is inconsistent")
            }
            InvariantViolation::OutOfOrder { node } => {
                write!(f, "{node:?} is out of order")
            }
            InvariantViolation::CountMismatch { len, reachable } => write!(
                f,
                "tree length is {len} but {reachable} nodes are reachable"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    /// Checks every structural invariant of the tree.
    ///
    /// This visits every node and is meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if let Some(root) = self.root {
            if self.nodes[root].parent.is_some() {
                return Err(InvariantViolation::BrokenParentLink {
                    node: self.handle(root),
                });
            }
        }

        self.check_shape()?;
        self.check_order()?;

        let reachable = self.node_count();
        if reachable != self.len || reachable != self.nodes.len() {
            return Err(InvariantViolation::CountMismatch {
                len: self.len,
                reachable,
            });
        }

        Ok(())
    }

    #[doc(hidden)]
    #[track_caller]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("tree invariant violated: {violation}");
        }
    }

    /// Returns `true` if every node is balanced and caches its correct height.
    pub fn is_balanced(&self) -> bool {
        self.check_shape().is_ok()
    }

    /// Returns `true` if the elements are in non-decreasing order.
    pub fn is_sorted(&self) -> bool {
        self.check_order().is_ok()
    }

    /// Counts the nodes reachable from the root.
    ///
    /// Unlike [`len`](AvlTree::len), this visits every node.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk_in_order(Dir::Left, |_, _| count += 1);
        count
    }

    // Checks balance, heights and parent links of every reachable node.
    fn check_shape(&self) -> Result<(), InvariantViolation> {
        let mut stack = Stack::new();
        stack.extend(self.root);

        while let Some(cur) = stack.pop() {
            let node = &self.nodes[cur];

            for child in [node.left(), node.right()].into_iter().flatten() {
                if self.nodes[child].parent != Some(cur) {
                    return Err(InvariantViolation::BrokenParentLink {
                        node: self.handle(cur),
                    });
                }

                stack.push(child);
            }

            let left = self.height_of(node.left());
            let right = self.height_of(node.right());

            if left.abs_diff(right) > 1 {
                return Err(InvariantViolation::Unbalanced {
                    node: self.handle(cur),
                    left,
                    right,
                });
            }

            let expected = 1 + left.max(right);
            if node.height != expected {
                return Err(InvariantViolation::WrongHeight {
                    node: self.handle(cur),
                    stored: node.height,
                    expected,
                });
            }
        }

        Ok(())
    }

    // Checks that the in-order sequence never decreases.
    fn check_order(&self) -> Result<(), InvariantViolation> {
        let mut prev: Option<Index> = None;
        let mut result = Ok(());

        self.walk_in_order(Dir::Left, |cur, node| {
            if result.is_err() {
                return;
            }

            if let Some(prev) = prev.replace(cur) {
                let prev = &self.nodes[prev].payload;
                if self.compare.compare(prev, &node.payload) == Ordering::Greater {
                    result = Err(InvariantViolation::OutOfOrder {
                        node: self.handle(cur),
                    });
                }
            }
        });

        result
    }

    fn handle(&self, index: Index) -> Handle {
        Handle::new(self.id, index)
    }
}
