use std::{collections::VecDeque, fmt};

use generational_arena::Index;

use crate::AvlTree;

impl<T, C> AvlTree<T, C>
where
    T: fmt::Display,
{
    /// Writes the tree as a Graphviz digraph, one rank per tree level.
    ///
    /// Nodes are labeled `element:height`; missing children are drawn as points.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(Index),
            Missing(u32),
        }

        // Elements may compare equal, so nodes are named by their arena slot.
        fn id(index: Index) -> usize {
            index.into_raw_parts().0
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let cur = match item {
                    Item::Node(cur) => cur,
                    Item::Missing(missing_id) => {
                        write!(w, "\"graph{name}-missing{missing_id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let node = &self.nodes[cur];
                let key = id(cur);
                write!(
                    w,
                    "\"graph{name}-{key}\" [label=\"{}:{}\"]; ",
                    node.payload, node.height
                )?;

                for child in [node.left(), node.right()] {
                    match child {
                        Some(child) => {
                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{}\";",
                                id(child)
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

#[cfg(test)]
mod tests {
    use crate::AvlTree;

    #[test]
    fn empty_graph() {
        let tree: AvlTree<u32> = AvlTree::new();

        let mut out = String::new();
        tree.dotgraph("empty", &mut out).unwrap();

        assert_eq!(out, "digraph \"graph-empty\" {}");
    }

    #[test]
    fn labels_carry_heights() {
        let tree: AvlTree<u32> = [2, 1, 3].into_iter().collect();

        let mut out = String::new();
        tree.dotgraph("small", &mut out).unwrap();

        assert!(out.contains("[label=\"2:2\"]"));
        assert!(out.contains("[label=\"1:1\"]"));
        assert!(out.contains("[label=\"3:1\"]"));
    }
}
