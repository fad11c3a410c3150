//! An arena-backed AVL tree with stable element handles.
//!
//! Elements are ordered by a caller-supplied [`Comparator`]. Every insertion returns a [`Handle`]
//! that later removes exactly that element, so elements comparing equal may coexist and are told
//! apart by identity rather than by key.

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A missing subtree has height 0 and a leaf has
//   height 1.
// - The parent of a node `x` is denoted `p(x)`.
// - A node is `d`-heavy if its `d` subtree is taller than its `!d` subtree.
//
// The invariants of the tree, which hold between public calls:
// 1. The in-order sequence of elements is non-decreasing under the comparator.
// 2. For every node, `|h(left) - h(right)| <= 1`.
// 3. For every node, `h(x) = 1 + max(h(left), h(right))`.
// 4. For every child `c` of `x`, `p(c) = x`. The root has no parent.
// 5. A handle resolves iff its node is reachable from the root.
//
// Heights are only ever repaired bottom-up by `rebalance`; the rotations fix the heights of the
// nodes they move below the new subtree root, and leave the new subtree root to the walk.

use core::{cmp::Ordering, fmt, mem, ops::Not};

use generational_arena::{Arena, Index};
use smallvec::SmallVec;

mod check;
mod compare;
#[cfg(feature = "dot")]
mod dot;
mod handle;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod traverse;


pub use crate::{
    check::InvariantViolation,
    compare::{Comparator, Natural},
    handle::Handle,
};
use crate::handle::TreeId;

/// An AVL tree ordered by a [`Comparator`].
///
/// Insertion, removal and the ordered queries complete in _O(log(n))_ time. Traversal and
/// [`clear`](AvlTree::clear) visit every element once.
pub struct AvlTree<T, C = Natural> {
    nodes: Arena<Node<T>>,
    root: Link,
    len: usize,
    id: TreeId,
    compare: C,

    #[cfg(test)]
    rotations: Vec<Rotation>,
}

struct Node<T> {
    parent: Link,
    children: [Link; 2],
    height: u8,
    payload: T,
}

type Link = Option<Index>;

// Inline capacity of the worklists used to walk the tree. An AVL tree of height 64 holds more
// elements than fit in memory, so these never spill.
pub(crate) const STACK_INLINE: usize = 64;

pub(crate) type Stack = SmallVec<[Index; STACK_INLINE]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// The four rebalancing cases, named after the path from the unbalanced node to its tallest
/// grandchild.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Rotation {
    LeftLeft,
    LeftRight,
    RightRight,
    RightLeft,
}

impl Rotation {
    fn new(heavy: Dir, double: bool) -> Rotation {
        match (heavy, double) {
            (Dir::Left, false) => Rotation::LeftLeft,
            (Dir::Left, true) => Rotation::LeftRight,
            (Dir::Right, false) => Rotation::RightRight,
            (Dir::Right, true) => Rotation::RightLeft,
        }
    }
}

// How far `rebalance` climbs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Walk {
    // Stop at the first node whose height is unchanged. Used after insertion.
    UntilStable,
    // Always climb to the root. Used after removal.
    ToRoot,
}

impl<T: Ord> AvlTree<T, Natural> {
    /// Returns a new empty tree ordered by `T`'s [`Ord`] implementation.
    pub fn new() -> AvlTree<T, Natural> {
        AvlTree::with_comparator(Natural)
    }
}

impl<T: Ord> Default for AvlTree<T, Natural> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    /// Returns a new empty tree ordered by `compare`.
    ///
    /// `compare` must be a total order over every element added to the tree; see [`Comparator`].
    pub fn with_comparator(compare: C) -> AvlTree<T, C> {
        AvlTree {
            nodes: Arena::new(),
            root: None,
            len: 0,
            id: TreeId::next(),
            compare,

            #[cfg(test)]
            rotations: Vec::new(),
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the height of the tree. An empty tree has height 0.
    pub fn height(&self) -> usize {
        self.height_of(self.root).into()
    }

    /// Returns `true` if `handle` refers to an element of this tree.
    pub fn contains(&self, handle: Handle) -> bool {
        self.owned(handle).is_some()
    }

    /// Returns the element referred to by `handle`.
    ///
    /// Returns `None` if the element was removed or `handle` belongs to another tree.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = self.owned(handle)?;
        Some(&self.nodes[index].payload)
    }

    /// Returns the minimum element of the tree.
    pub fn smallest(&self) -> Option<&T> {
        self.extreme(Dir::Left).map(|index| &self.nodes[index].payload)
    }

    /// Returns the maximum element of the tree.
    pub fn greatest(&self) -> Option<&T> {
        self.extreme(Dir::Right).map(|index| &self.nodes[index].payload)
    }

    /// Returns the smallest element greater than `key`.
    ///
    /// If an element compares equal to `key`, that element is returned instead.
    pub fn smallest_above(&self, key: &T) -> Option<&T> {
        self.closest(key, Dir::Right)
    }

    /// Returns the greatest element less than `key`.
    ///
    /// If an element compares equal to `key`, that element is returned instead.
    pub fn greatest_below(&self, key: &T) -> Option<&T> {
        self.closest(key, Dir::Left)
    }

    // Descends towards `key`, remembering the last node passed on the `side` of it.
    fn closest(&self, key: &T, side: Dir) -> Option<&T> {
        let mut best = None;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            let node = &self.nodes[cur];

            let dir = match self.compare.compare(key, &node.payload) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Some(&node.payload),
                Ordering::Greater => Dir::Right,
            };

            // Moving away from `side` means `node` lies on that side of `key`.
            if dir != side {
                best = Some(&node.payload);
            }

            opt_cur = node.child(dir);
        }

        best
    }

    /// Inserts an element into the tree, returning a handle to it.
    ///
    /// Elements comparing equal to an existing element are placed in whichever of its subtrees
    /// keeps the tree shallower.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn add(&mut self, payload: T) -> Handle {
        let index = self.nodes.insert(Node::new(payload));
        let handle = Handle::new(self.id, index);
        self.len += 1;

        let Some(root) = self.root else {
            self.root = Some(index);
            return handle;
        };

        let mut parent = root;

        // Descend the tree, looking for a free slot.
        let dir = loop {
            let cur = &self.nodes[parent];

            let dir = match self.compare.compare(&self.nodes[index].payload, &cur.payload) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => match (cur.left(), cur.right()) {
                    (None, _) => Dir::Left,
                    (_, None) => Dir::Right,
                    (Some(left), Some(right)) => {
                        if self.nodes[right].height < self.nodes[left].height {
                            Dir::Right
                        } else {
                            Dir::Left
                        }
                    }
                },
            };

            match cur.child(dir) {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        // Only a leaf parent grows taller. Otherwise the new node filled its parent's empty
        // side and no height above it changed.
        let parent_was_leaf = self.nodes[parent].height == 1;

        self.nodes[parent].set_child(dir, Some(index));
        self.nodes[index].parent = Some(parent);

        if parent_was_leaf {
            self.rebalance(Some(parent), Walk::UntilStable);
        }

        handle
    }

    /// Removes the element referred to by `handle` and returns it.
    ///
    /// If the element was already removed, or `handle` belongs to another tree, this does nothing
    /// and returns `None`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let index = self.owned(handle)?;
        Some(self.remove_at(index))
    }

    /// Removes and returns the minimum element of the tree.
    ///
    /// Returns `None` if the tree is empty.
    pub fn pop_smallest(&mut self) -> Option<T> {
        let index = self.extreme(Dir::Left)?;
        Some(self.remove_at(index))
    }

    /// Removes and returns the maximum element of the tree.
    ///
    /// Returns `None` if the tree is empty.
    pub fn pop_greatest(&mut self) -> Option<T> {
        let index = self.extreme(Dir::Right)?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, node: Index) -> T {
        // There are three possible cases:
        //
        // 1. `node` has no right child.
        //
        //    Its left child (which may be missing) takes its place. `p(node)` lost at most one
        //    level on that side; the walk from `p(node)` is skipped when `p(node)` is provably
        //    still balanced with an unchanged height.
        //
        // 2. `node`'s right child has no left child.
        //
        //    The right child takes `node`'s place and adopts its left subtree. The walk starts at
        //    the promoted child, whose subtree shape changed.
        //
        // 3. Otherwise, `node`'s successor[^1] is detached from its parent, which adopts the
        //    successor's right subtree, and the successor takes `node`'s place. The walk starts at
        //    the successor's former parent, which is where a level was lost.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.
        let (parent, left, right) = {
            let links = &self.nodes[node];
            (links.parent, links.left(), links.right())
        };

        match right {
            None => {
                log::trace!("removing {node:?}: promoting left child {left:?}");

                self.maybe_set_parent(left, parent);
                self.replace_child_or_set_root(parent, node, left);

                if let Some(parent) = parent {
                    if self.needs_walk_after_splice(parent, left) {
                        self.rebalance(Some(parent), Walk::ToRoot);
                    }
                }
            }

            Some(right) if self.nodes[right].left().is_none() => {
                log::trace!("removing {node:?}: promoting right child {right:?}");

                self.nodes[right].set_left(left);
                self.maybe_set_parent(left, Some(right));

                self.replace_child_or_set_root(parent, node, Some(right));
                self.nodes[right].parent = parent;

                self.rebalance(Some(right), Walk::ToRoot);
            }

            Some(right) => {
                let successor = self.min_in_subtree(right);
                let successor_parent = self.nodes[successor]
                    .parent
                    .expect("successor below the right child must have a parent");
                let successor_right = self.nodes[successor].right();

                log::trace!("removing {node:?}: splicing in successor {successor:?}");

                // Elevate the successor's right child to replace it.
                self.nodes[successor_parent].set_left(successor_right);
                self.maybe_set_parent(successor_right, Some(successor_parent));

                self.nodes[successor].set_right(Some(right));
                self.nodes[right].parent = Some(successor);

                self.nodes[successor].set_left(left);
                self.maybe_set_parent(left, Some(successor));

                self.replace_child_or_set_root(parent, node, Some(successor));
                self.nodes[successor].parent = parent;

                self.rebalance(Some(successor_parent), Walk::ToRoot);
            }
        }

        self.len -= 1;

        // Vacating the slot unlinks the node and invalidates every handle to it.
        self.nodes
            .remove(node)
            .expect("removed node must be stored in the arena")
            .payload
    }

    // Decides whether `parent` needs a walk after its child was replaced by `promoted`, the former
    // left child of a node without a right child.
    fn needs_walk_after_splice(&self, parent: Index, promoted: Link) -> bool {
        let Some(promoted) = promoted else {
            return true;
        };

        let parent_height = self.nodes[parent].height;

        // `parent` was two levels above `promoted` on the other side and is now unbalanced.
        if self.nodes[promoted].height + 3 <= parent_height {
            return true;
        }

        // `parent` is balanced. It only needs a walk if it got shorter, which happens when the
        // removed node was its strictly taller child.
        parent_height != self.computed_height(parent)
    }

    /// Removes every element from the tree.
    ///
    /// All handles issued by this tree stop resolving.
    pub fn clear(&mut self) {
        log::debug!("clearing {} elements", self.len);

        let mut stack = Stack::new();
        stack.extend(self.root.take());

        while let Some(cur) = stack.pop() {
            let node = self
                .nodes
                .remove(cur)
                .expect("reachable node must be stored in the arena");

            stack.extend(node.children.into_iter().flatten());
        }

        self.len = 0;

        debug_assert!(self.nodes.is_empty());
    }

    // Walks up from `start`, repairing heights and rotating unbalanced nodes.
    fn rebalance(&mut self, start: Link, walk: Walk) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            let left_height = self.height_of(self.nodes[cur].left());
            let right_height = self.height_of(self.nodes[cur].right());

            if left_height > right_height + 1 {
                self.rotate(cur, Dir::Left);
            } else if right_height > left_height + 1 {
                self.rotate(cur, Dir::Right);
            } else {
                let height = 1 + left_height.max(right_height);

                // Nothing above `cur` can have changed.
                if walk == Walk::UntilStable && height == self.nodes[cur].height {
                    break;
                }

                self.nodes[cur].height = height;
            }

            // After a rotation `cur` has moved down, so this visits the new subtree root next.
            opt_cur = self.nodes[cur].parent;
        }
    }

    // Restores balance at the `heavy`-heavy node `node`.
    fn rotate(&mut self, node: Index, heavy: Dir) {
        let child = self.nodes[node]
            .child(heavy)
            .expect("heavy side of a node must not be empty");

        // A double rotation is needed when `child` leans the other way: its inner subtree is
        // strictly taller than its outer one. This also implies the inner subtree exists.
        let outer = self.height_of(self.nodes[child].child(heavy));
        let inner = self.height_of(self.nodes[child].child(!heavy));
        let double = inner > outer;

        let rotation = Rotation::new(heavy, double);
        log::trace!("{rotation:?} rotation at {node:?}");

        #[cfg(test)]
        self.rotations.push(rotation);

        if double {
            self.rotate_inner(node, heavy);
        }

        self.rotate_outer(node, heavy);
    }

    // Rotates the `heavy` child of `node` up into `node`'s place.
    //
    // For `heavy == Left` (the left-left case):
    //
    //         node            pivot
    //         /  \            /   \
    //      pivot  c   =>     a    node
    //      /  \                   /  \
    //     a  across           across  c
    //
    // The height of `node` is updated. The height of `pivot` is left to the caller's walk.
    fn rotate_outer(&mut self, node: Index, heavy: Dir) {
        let pivot = self.nodes[node]
            .child(heavy)
            .expect("rotated node must have a child on its heavy side");
        let across = self.nodes[pivot].child(!heavy);
        let parent = self.nodes[node].parent;

        self.replace_child_or_set_root(parent, node, Some(pivot));
        self.nodes[pivot].parent = parent;

        self.nodes[pivot].set_child(!heavy, Some(node));
        self.nodes[node].parent = Some(pivot);

        self.nodes[node].set_child(heavy, across);
        self.maybe_set_parent(across, Some(node));

        self.nodes[node].height = self.computed_height(node);
    }

    // Rotates the inner grandchild of `node` up into its parent's place, turning a left-right
    // shape into a left-left shape (and symmetrically).
    //
    // For `heavy == Left`:
    //
    //         node               node
    //         /                  /
    //      child               grand
    //      /   \               /   \
    //     a   grand    =>   child   c
    //         /  \          /  \
    //        b    c        a    b
    //
    // The heights of `child` and `grand` are updated.
    fn rotate_inner(&mut self, node: Index, heavy: Dir) {
        let child = self.nodes[node]
            .child(heavy)
            .expect("rotated node must have a child on its heavy side");
        let grand = self.nodes[child]
            .child(!heavy)
            .expect("double rotation requires an inner grandchild");
        let across = self.nodes[grand].child(heavy);

        self.nodes[node].set_child(heavy, Some(grand));
        self.nodes[grand].parent = Some(node);

        self.nodes[grand].set_child(heavy, Some(child));
        self.nodes[child].parent = Some(grand);

        self.nodes[child].set_child(!heavy, across);
        self.maybe_set_parent(across, Some(child));

        self.nodes[child].height = self.computed_height(child);
        self.nodes[grand].height = self.computed_height(grand);
    }

    // Support methods ========================================================

    // Returns the arena index of `handle` if it refers to a live element of this tree.
    #[inline]
    fn owned(&self, handle: Handle) -> Link {
        let index = handle.index();
        (handle.tree() == self.id && self.nodes.contains(index)).then_some(index)
    }

    #[inline]
    fn height_of(&self, link: Link) -> u8 {
        link.map_or(0, |index| self.nodes[index].height)
    }

    // Returns the height `node` should have given its children's stored heights.
    #[inline]
    fn computed_height(&self, node: Index) -> u8 {
        let links = &self.nodes[node];
        1 + self.height_of(links.left()).max(self.height_of(links.right()))
    }

    fn extreme(&self, dir: Dir) -> Link {
        let mut cur = self.root?;

        while let Some(next) = self.nodes[cur].child(dir) {
            cur = next;
        }

        Some(cur)
    }

    fn min_in_subtree(&self, root: Index) -> Index {
        let mut cur = root;

        while let Some(left) = self.nodes[cur].left() {
            cur = left;
        }

        cur
    }

    #[inline]
    fn maybe_set_parent(&mut self, opt_node: Link, parent: Link) {
        if let Some(node) = opt_node {
            self.nodes[node].parent = parent;
        }
    }

    #[inline]
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: Index, new_child: Link) {
        match parent {
            Some(parent) => self.replace_child(parent, old_child, new_child),
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    fn replace_child(&mut self, parent: Index, old_child: Index, new_child: Link) {
        let links = &mut self.nodes[parent];

        if links.left() == Some(old_child) {
            links.set_left(new_child);
        } else {
            debug_assert_eq!(
                links.right(),
                Some(old_child),
                "`old_child` must be a child of `parent`"
            );
            links.set_right(new_child);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlTree<T, Natural> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = AvlTree::new();
        tree.extend(iter);
        tree
    }
}

impl<T, C: Comparator<T>> Extend<T> for AvlTree<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add(item);
        }
    }
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        self.for_each(|item| {
            set.entry(item);
        });
        set.finish()
    }
}

impl<T> Node<T> {
    fn new(payload: T) -> Node<T> {
        Node {
            parent: None,
            children: [None; 2],
            height: 1,
            payload,
        }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    fn left(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link) -> Link {
        mem::replace(&mut self.children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link) -> Link {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link) -> Link {
        self.set_child(Dir::Right, right)
    }
}
