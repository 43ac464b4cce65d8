//! An arena-backed red-black tree with caller-supplied ordering.
//!
//! The sweeps keep their active sets in this tree. Their orderings depend on the
//! current sweep position, so instead of requiring `T: Ord` every insertion takes a
//! comparison closure that can capture whatever it needs.
//!
//! Nodes are addressed by [`NodeId`]s, which stay valid until the node they name is
//! removed: deletion relinks nodes and never moves items between them.

use std::cmp::Ordering;

/// A handle to a node in an [`RbTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, Debug)]
struct Links {
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
}

// Slot 0 is the sentinel leaf. Its links are scratch space for the fixups.
const NIL: usize = 0;

/// A red-black tree storing `T`s.
#[derive(Clone, Debug)]
pub struct RbTree<T> {
    links: Vec<Links>,
    items: Vec<Option<T>>,
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl<T> Default for RbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RbTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        RbTree {
            links: vec![Links {
                color: Color::Black,
                parent: NIL,
                left: NIL,
                right: NIL,
            }],
            items: vec![None],
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    /// The number of items in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The item stored at `node`, if that node is still in the tree.
    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.items.get(node.0).and_then(Option::as_ref)
    }

    /// Replaces the item stored at `node`, returning the old one.
    ///
    /// The new item must occupy the same position in the order as the old one.
    pub fn replace(&mut self, node: NodeId, item: T) -> Option<T> {
        match self.items.get_mut(node.0) {
            Some(slot @ Some(_)) => slot.replace(item),
            _ => None,
        }
    }

    /// The node holding the smallest item.
    pub fn minimum(&self) -> Option<NodeId> {
        (self.root != NIL).then(|| NodeId(self.subtree_minimum(self.root)))
    }

    /// The node following `node` in order.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let mut x = node.0;
        if self.links[x].right != NIL {
            return Some(NodeId(self.subtree_minimum(self.links[x].right)));
        }
        let mut y = self.links[x].parent;
        while y != NIL && x == self.links[y].right {
            x = y;
            y = self.links[y].parent;
        }
        (y != NIL).then_some(NodeId(y))
    }

    /// Iterates over the items in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        std::iter::successors(self.minimum(), |&n| self.next(n)).filter_map(|n| self.get(n))
    }

    /// Inserts `item`, returning the node that holds it.
    ///
    /// `cmp(item, other)` compares the new item with one already in the tree. Items
    /// comparing equal to an existing one go after it.
    pub fn insert_by(&mut self, item: T, mut cmp: impl FnMut(&T, &T) -> Ordering) -> NodeId {
        let mut parent = NIL;
        let mut x = self.root;
        let mut go_left = false;
        while x != NIL {
            parent = x;
            go_left = self.items[x]
                .as_ref()
                .is_some_and(|other| cmp(&item, other) == Ordering::Less);
            x = if go_left {
                self.links[x].left
            } else {
                self.links[x].right
            };
        }

        let z = self.alloc(item);
        self.links[z].parent = parent;
        if parent == NIL {
            self.root = z;
        } else if go_left {
            self.links[parent].left = z;
        } else {
            self.links[parent].right = z;
        }
        self.insert_fixup(z);
        self.len += 1;

        #[cfg(debug_assertions)]
        self.check_invariants();
        NodeId(z)
    }

    /// Removes `node` from the tree, returning its item.
    ///
    /// Returns `None` if the node was already removed.
    pub fn remove(&mut self, node: NodeId) -> Option<T> {
        let z = node.0;
        if z == NIL || self.get(node).is_none() {
            return None;
        }

        let mut y = z;
        let mut y_color = self.links[y].color;
        let x;
        if self.links[z].left == NIL {
            x = self.links[z].right;
            self.transplant(z, x);
        } else if self.links[z].right == NIL {
            x = self.links[z].left;
            self.transplant(z, x);
        } else {
            y = self.subtree_minimum(self.links[z].right);
            y_color = self.links[y].color;
            x = self.links[y].right;
            if self.links[y].parent == z {
                self.links[x].parent = y;
            } else {
                self.transplant(y, x);
                self.links[y].right = self.links[z].right;
                let right = self.links[y].right;
                self.links[right].parent = y;
            }
            self.transplant(z, y);
            self.links[y].left = self.links[z].left;
            let left = self.links[y].left;
            self.links[left].parent = y;
            self.links[y].color = self.links[z].color;
        }
        if y_color == Color::Black {
            self.delete_fixup(x);
        }

        self.len -= 1;
        self.free.push(z);

        #[cfg(debug_assertions)]
        self.check_invariants();
        self.items[z].take()
    }

    fn alloc(&mut self, item: T) -> usize {
        let links = Links {
            color: Color::Red,
            parent: NIL,
            left: NIL,
            right: NIL,
        };
        match self.free.pop() {
            Some(i) => {
                self.links[i] = links;
                self.items[i] = Some(item);
                i
            }
            None => {
                self.links.push(links);
                self.items.push(Some(item));
                self.links.len() - 1
            }
        }
    }

    fn subtree_minimum(&self, mut x: usize) -> usize {
        while self.links[x].left != NIL {
            x = self.links[x].left;
        }
        x
    }

    fn color(&self, x: usize) -> Color {
        self.links[x].color
    }

    fn set_color(&mut self, x: usize, color: Color) {
        self.links[x].color = color;
    }

    fn transplant(&mut self, u: usize, v: usize) {
        let parent = self.links[u].parent;
        if parent == NIL {
            self.root = v;
        } else if u == self.links[parent].left {
            self.links[parent].left = v;
        } else {
            self.links[parent].right = v;
        }
        self.links[v].parent = parent;
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.links[x].right;
        self.links[x].right = self.links[y].left;
        let y_left = self.links[y].left;
        if y_left != NIL {
            self.links[y_left].parent = x;
        }
        self.transplant(x, y);
        self.links[y].left = x;
        self.links[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.links[x].left;
        self.links[x].left = self.links[y].right;
        let y_right = self.links[y].right;
        if y_right != NIL {
            self.links[y_right].parent = x;
        }
        self.transplant(x, y);
        self.links[y].right = x;
        self.links[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.color(self.links[z].parent) == Color::Red {
            let zp = self.links[z].parent;
            let zpp = self.links[zp].parent;
            if zp == self.links[zpp].left {
                let uncle = self.links[zpp].right;
                if self.color(uncle) == Color::Red {
                    self.set_color(zp, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(zpp, Color::Red);
                    z = zpp;
                } else {
                    if z == self.links[zp].right {
                        z = zp;
                        self.rotate_left(z);
                    }
                    let zp = self.links[z].parent;
                    let zpp = self.links[zp].parent;
                    self.set_color(zp, Color::Black);
                    self.set_color(zpp, Color::Red);
                    self.rotate_right(zpp);
                }
            } else {
                let uncle = self.links[zpp].left;
                if self.color(uncle) == Color::Red {
                    self.set_color(zp, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(zpp, Color::Red);
                    z = zpp;
                } else {
                    if z == self.links[zp].left {
                        z = zp;
                        self.rotate_right(z);
                    }
                    let zp = self.links[z].parent;
                    let zpp = self.links[zp].parent;
                    self.set_color(zp, Color::Black);
                    self.set_color(zpp, Color::Red);
                    self.rotate_left(zpp);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    fn delete_fixup(&mut self, mut x: usize) {
        while x != self.root && self.color(x) == Color::Black {
            let xp = self.links[x].parent;
            if x == self.links[xp].left {
                let mut w = self.links[xp].right;
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_left(xp);
                    w = self.links[self.links[x].parent].right;
                }
                if self.color(self.links[w].left) == Color::Black
                    && self.color(self.links[w].right) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.links[x].parent;
                } else {
                    if self.color(self.links[w].right) == Color::Black {
                        let w_left = self.links[w].left;
                        self.set_color(w_left, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.links[self.links[x].parent].right;
                    }
                    let xp = self.links[x].parent;
                    self.set_color(w, self.color(xp));
                    self.set_color(xp, Color::Black);
                    let w_right = self.links[w].right;
                    self.set_color(w_right, Color::Black);
                    self.rotate_left(xp);
                    x = self.root;
                }
            } else {
                let mut w = self.links[xp].left;
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(xp, Color::Red);
                    self.rotate_right(xp);
                    w = self.links[self.links[x].parent].left;
                }
                if self.color(self.links[w].right) == Color::Black
                    && self.color(self.links[w].left) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = self.links[x].parent;
                } else {
                    if self.color(self.links[w].left) == Color::Black {
                        let w_right = self.links[w].right;
                        self.set_color(w_right, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.links[self.links[x].parent].left;
                    }
                    let xp = self.links[x].parent;
                    self.set_color(w, self.color(xp));
                    self.set_color(xp, Color::Black);
                    let w_left = self.links[w].left;
                    self.set_color(w_left, Color::Black);
                    self.rotate_right(xp);
                    x = self.root;
                }
            }
        }
        self.set_color(x, Color::Black);
    }

    /// Checks the red-black and linkage invariants, panicking if they fail.
    pub fn check_invariants(&self) {
        assert_eq!(self.color(self.root), Color::Black, "red root");
        assert_eq!(self.color(NIL), Color::Black, "red sentinel");
        if self.root != NIL {
            assert_eq!(self.links[self.root].parent, NIL, "root has a parent");
        }
        let (count, _) = self.check_subtree(self.root);
        assert_eq!(count, self.len, "length mismatch");
    }

    // Returns the number of nodes and the black height.
    fn check_subtree(&self, x: usize) -> (usize, usize) {
        if x == NIL {
            return (0, 1);
        }
        assert!(self.items[x].is_some(), "empty node n_{x} is linked");
        let Links {
            color, left, right, ..
        } = self.links[x];
        for child in [left, right] {
            if child != NIL {
                assert_eq!(self.links[child].parent, x, "bad parent link at n_{child}");
                if color == Color::Red {
                    assert_eq!(self.color(child), Color::Black, "red-red at n_{x}");
                }
            }
        }
        let (left_count, left_height) = self.check_subtree(left);
        let (right_count, right_height) = self.check_subtree(right);
        assert_eq!(left_height, right_height, "unbalanced at n_{x}");
        let own = usize::from(color == Color::Black);
        (left_count + right_count + 1, left_height + own)
    }
}
