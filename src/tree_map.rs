//! TreeMap: ordered engine backed by an unbalanced binary search tree.
//!
//! Nodes live in a generational slot arena. Child links own their subtree
//! in the logical sense; the parent link is a plain key lookup, so the tree
//! has no ownership cycles. The "guard" of a pointer-based tree is replaced by
//! `Position::End` plus an optional `root` key.
//!
//! The tree never rebalances; its height depends on insertion order and can
//! reach `len()` for sorted input. Clone, equality and invariant checks walk
//! the tree with explicit stacks so degenerate trees cannot exhaust the call
//! stack.

use crate::cursor::{Cursor, Iter, IterMut};
use crate::engine::MapEngine;
use crate::error::MapError;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeKey;
}

struct Node<K, V> {
    key: K,
    value: V,
    parent: Option<NodeKey>,
    left: Option<NodeKey>,
    right: Option<NodeKey>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Side {
    Left,
    Right,
}

/// Where a key lives, or where it would be attached.
enum Search {
    Found(NodeKey),
    /// `None` means the tree is empty and the key would become the root.
    Vacant(Option<(NodeKey, Side)>),
}

/// Child layout of a node about to be unlinked.
enum Shape {
    Leaf,
    OneChild(NodeKey),
    TwoChildren { left: NodeKey, right: NodeKey },
}

impl Shape {
    fn of<K, V>(node: &Node<K, V>) -> Self {
        match (node.left, node.right) {
            (None, None) => Shape::Leaf,
            (Some(c), None) | (None, Some(c)) => Shape::OneChild(c),
            (Some(left), Some(right)) => Shape::TwoChildren { left, right },
        }
    }
}

/// A copyable reference to a tree entry or to the end sentinel.
///
/// Positions are generation-checked: once the entry is removed the position
/// stops resolving, even if the arena slot is reused. The check is against
/// the map the position is handed to, so a position taken from another
/// `TreeMap` may resolve to an unrelated node; a `Cursor` keeps the position
/// tied to its map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position(Slot);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum Slot {
    Node(NodeKey),
    End,
}

impl Position {
    pub const END: Position = Position(Slot::End);

    fn node(k: NodeKey) -> Self {
        Position(Slot::Node(k))
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.0 == Slot::End
    }

    pub fn key<'a, K, V>(&self, map: &'a TreeMap<K, V>) -> Result<&'a K, MapError> {
        map.entry_at(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V>(&self, map: &'a TreeMap<K, V>) -> Result<&'a V, MapError> {
        map.entry_at(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V>(&self, map: &'a mut TreeMap<K, V>) -> Result<&'a mut V, MapError> {
        map.value_at_mut(*self)
    }
}

/// Arena storage and link surgery. Never calls into user code except
/// through `search`.
struct RawTree<K, V> {
    nodes: SlotMap<NodeKey, Node<K, V>>,
    root: Option<NodeKey>,
}

impl<K, V> RawTree<K, V> {
    fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            root: None,
        }
    }

    fn search<Q>(&self, q: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(None);
        };
        loop {
            let node = &self.nodes[cur];
            let (next, side) = match q.cmp(node.key.borrow()) {
                Ordering::Equal => return Search::Found(cur),
                Ordering::Less => (node.left, Side::Left),
                Ordering::Greater => (node.right, Side::Right),
            };
            match next {
                Some(child) => cur = child,
                None => return Search::Vacant(Some((cur, side))),
            }
        }
    }

    /// Creates a leaf at `slot`. The slot must be empty.
    fn attach(&mut self, slot: Option<(NodeKey, Side)>, key: K, value: V) -> NodeKey {
        let k = self.nodes.insert(Node {
            key,
            value,
            parent: slot.map(|(p, _)| p),
            left: None,
            right: None,
        });
        match slot {
            None => self.root = Some(k),
            Some((p, Side::Left)) => self.nodes[p].left = Some(k),
            Some((p, Side::Right)) => self.nodes[p].right = Some(k),
        }
        k
    }

    /// Points whichever link of `parent` held `old` at `new`, and fixes
    /// `new`'s parent link. `parent == None` addresses the root.
    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let node = &mut self.nodes[p];
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    node.right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    /// Detaches `target` and returns its pair. The remaining nodes still
    /// form a valid BST with consistent parent links.
    fn unlink(&mut self, target: NodeKey) -> (K, V) {
        let node = &self.nodes[target];
        let parent = node.parent;
        match Shape::of(node) {
            Shape::Leaf => self.replace_child(parent, target, None),
            Shape::OneChild(child) => self.replace_child(parent, target, Some(child)),
            Shape::TwoChildren { left, right } => {
                self.splice_successor(target, parent, left, right)
            }
        }
        let node = self
            .nodes
            .remove(target)
            .expect("unlinked node must still be in the arena");
        (node.key, node.value)
    }

    /// Puts the in-order successor of `target` into `target`'s slot.
    ///
    /// Pre: `target` has both children `left` and `right`.
    /// Post: `target` is unreachable; the successor has adopted its parent
    /// and both subtrees; the subtree is still a valid BST.
    fn splice_successor(
        &mut self,
        target: NodeKey,
        parent: Option<NodeKey>,
        left: NodeKey,
        right: NodeKey,
    ) {
        let succ = self.leftmost(right);
        if succ != right {
            // succ is a left child somewhere below `right`; its right
            // subtree takes its place.
            let (succ_parent, succ_right) = {
                let s = &self.nodes[succ];
                (s.parent, s.right)
            };
            self.replace_child(succ_parent, succ, succ_right);
            self.nodes[succ].right = Some(right);
            self.nodes[right].parent = Some(succ);
        }
        self.nodes[succ].left = Some(left);
        self.nodes[left].parent = Some(succ);
        self.replace_child(parent, target, Some(succ));
    }

    fn leftmost(&self, mut k: NodeKey) -> NodeKey {
        while let Some(l) = self.nodes[k].left {
            k = l;
        }
        k
    }

    fn rightmost(&self, mut k: NodeKey) -> NodeKey {
        while let Some(r) = self.nodes[k].right {
            k = r;
        }
        k
    }

    fn successor(&self, k: NodeKey) -> Option<NodeKey> {
        if let Some(r) = self.nodes[k].right {
            return Some(self.leftmost(r));
        }
        // Climb until we arrive from a left child.
        let mut child = k;
        let mut parent = self.nodes[k].parent;
        while let Some(p) = parent {
            if self.nodes[p].left == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        None
    }

    fn predecessor(&self, k: NodeKey) -> Option<NodeKey> {
        if let Some(l) = self.nodes[k].left {
            return Some(self.rightmost(l));
        }
        let mut child = k;
        let mut parent = self.nodes[k].parent;
        while let Some(p) = parent {
            if self.nodes[p].right == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.nodes[p].parent;
        }
        None
    }

    /// Node keys in ascending key order.
    fn in_order(&self) -> Vec<NodeKey> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut cur = self.root.map(|r| self.leftmost(r));
        while let Some(k) = cur {
            out.push(k);
            cur = self.successor(k);
        }
        out
    }

    fn height(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(NodeKey, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((k, depth)) = stack.pop() {
            max = max.max(depth);
            let node = &self.nodes[k];
            stack.extend(node.left.map(|c| (c, depth + 1)));
            stack.extend(node.right.map(|c| (c, depth + 1)));
        }
        max
    }
}

impl<K: PartialEq, V: PartialEq> RawTree<K, V> {
    /// True when both trees have the same shape and the same pair at every
    /// corresponding node.
    fn same_shape(&self, other: &Self) -> bool {
        let mut stack = vec![(self.root, other.root)];
        while let Some(pair) = stack.pop() {
            match pair {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    let (x, y) = (&self.nodes[a], &other.nodes[b]);
                    if x.key != y.key || x.value != y.value {
                        return false;
                    }
                    stack.push((x.left, y.left));
                    stack.push((x.right, y.right));
                }
                _ => return false,
            }
        }
        true
    }
}

impl<K: Clone, V: Clone> Clone for RawTree<K, V> {
    /// Shape-preserving deep copy driven by a pre-order work stack.
    fn clone(&self) -> Self {
        let mut copy = RawTree::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeKey, Option<(NodeKey, Side)>)> =
            self.root.map(|r| (r, None)).into_iter().collect();
        while let Some((src, slot)) = stack.pop() {
            let node = &self.nodes[src];
            let k = copy.attach(slot, node.key.clone(), node.value.clone());
            if let Some(r) = node.right {
                stack.push((r, Some((k, Side::Right))));
            }
            if let Some(l) = node.left {
                stack.push((l, Some((k, Side::Left))));
            }
        }
        copy
    }
}

/// Ordered map over an unbalanced binary search tree.
pub struct TreeMap<K, V> {
    tree: RawTree<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self {
            tree: RawTree::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.nodes.is_empty()
    }

    /// Number of nodes on the longest root-to-leaf path; 0 when empty.
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    pub fn clear(&mut self) {
        self.tree.nodes.clear();
        self.tree.root = None;
    }

    /// Moves every entry into the returned map in O(1), leaving `self`
    /// empty.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Minimum key, or `end()` when empty.
    pub fn begin(&self) -> Position {
        match self.tree.root {
            Some(r) => Position::node(self.tree.leftmost(r)),
            None => Position::END,
        }
    }

    #[inline]
    pub fn end(&self) -> Position {
        Position::END
    }

    fn live(&self, pos: Position) -> Result<Option<NodeKey>, MapError> {
        match pos.0 {
            Slot::End => Ok(None),
            Slot::Node(k) if self.tree.nodes.contains_key(k) => Ok(Some(k)),
            Slot::Node(_) => Err(MapError::InvalidIterator),
        }
    }

    /// In-order successor of `pos`; the maximum steps to `end()`.
    pub fn next(&self, pos: Position) -> Result<Position, MapError> {
        match self.live(pos)? {
            None => Err(MapError::InvalidIterator),
            Some(k) => Ok(self
                .tree
                .successor(k)
                .map_or(Position::END, Position::node)),
        }
    }

    /// In-order predecessor of `pos`; `end()` steps to the maximum.
    pub fn prev(&self, pos: Position) -> Result<Position, MapError> {
        let found = match self.live(pos)? {
            None => self.tree.root.map(|r| self.tree.rightmost(r)),
            Some(k) => self.tree.predecessor(k),
        };
        found.map(Position::node).ok_or(MapError::InvalidIterator)
    }

    pub fn entry_at(&self, pos: Position) -> Result<(&K, &V), MapError> {
        match self.live(pos)? {
            None => Err(MapError::DereferenceOfEndPosition),
            Some(k) => {
                let node = &self.tree.nodes[k];
                Ok((&node.key, &node.value))
            }
        }
    }

    pub fn value_at_mut(&mut self, pos: Position) -> Result<&mut V, MapError> {
        match self.live(pos)? {
            None => Err(MapError::DereferenceOfEndPosition),
            Some(k) => Ok(&mut self.tree.nodes[k].value),
        }
    }

    /// Removes the entry at `pos`. Positions to other entries stay valid;
    /// only their neighbours may change.
    pub fn remove_at(&mut self, pos: Position) -> Result<(K, V), MapError> {
        match self.live(pos)? {
            None => Err(MapError::InvalidIterator),
            Some(k) => Ok(self.tree.unlink(k)),
        }
    }

    /// Lends every value mutably in ascending key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order = self.tree.in_order();
        IterMut::in_order(&mut self.tree.nodes, &order, |n| (&n.key, &mut n.value))
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    pub fn find<Q>(&self, q: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        match self.tree.search(q) {
            Search::Found(k) => Position::node(k),
            Search::Vacant(_) => Position::END,
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        !self.find(q).is_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.value_of(q).ok()
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.value_of_mut(q).ok()
    }

    pub fn value_of<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        match self.tree.search(q) {
            Search::Found(k) => Ok(&self.tree.nodes[k].value),
            Search::Vacant(_) => Err(MapError::KeyNotFound),
        }
    }

    pub fn value_of_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        match self.tree.search(q) {
            Search::Found(k) => Ok(&mut self.tree.nodes[k].value),
            Search::Vacant(_) => Err(MapError::KeyNotFound),
        }
    }

    /// Inserts a new leaf. An existing key is left untouched and reported as
    /// `DuplicateKey`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Position, MapError> {
        self.insert_with(key, || value)
    }

    /// Like `insert`, but only runs `default` when the key is absent.
    pub fn insert_with<F>(&mut self, key: K, default: F) -> Result<Position, MapError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        match self.tree.search(&key) {
            Search::Found(_) => Err(MapError::DuplicateKey),
            Search::Vacant(slot) => Ok(Position::node(self.tree.attach(slot, key, default()))),
        }
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let k = match self.tree.search(&key) {
            Search::Found(k) => k,
            Search::Vacant(slot) => self.tree.attach(slot, key, default()),
        };
        &mut self.tree.nodes[k].value
    }

    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Removes `q`, splicing around the node by its leaf / one-child /
    /// two-children shape.
    pub fn remove<Q>(&mut self, q: &Q) -> Result<(K, V), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        match self.tree.search(q) {
            Search::Found(k) => Ok(self.tree.unlink(k)),
            Search::Vacant(_) => Err(MapError::KeyNotFound),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, Self> {
        Iter::new(self)
    }

    pub fn cursor(&self) -> Cursor<'_, K, V, Self> {
        Cursor::new(self, self.begin())
    }

    pub fn cursor_at(&self, pos: Position) -> Cursor<'_, K, V, Self> {
        Cursor::new(self, pos)
    }
}

impl<K: Ord, V> MapEngine<K, V> for TreeMap<K, V> {
    type Position = Position;

    fn len(&self) -> usize {
        TreeMap::len(self)
    }

    fn begin(&self) -> Position {
        TreeMap::begin(self)
    }

    fn end(&self) -> Position {
        Position::END
    }

    fn find(&self, key: &K) -> Position {
        TreeMap::find(self, key)
    }

    fn next(&self, pos: Position) -> Result<Position, MapError> {
        TreeMap::next(self, pos)
    }

    fn prev(&self, pos: Position) -> Result<Position, MapError> {
        TreeMap::prev(self, pos)
    }

    fn entry_at(&self, pos: Position) -> Result<(&K, &V), MapError> {
        TreeMap::entry_at(self, pos)
    }

    fn value_at_mut(&mut self, pos: Position) -> Result<&mut V, MapError> {
        TreeMap::value_at_mut(self, pos)
    }

    fn insert(&mut self, key: K, value: V) -> Result<Position, MapError> {
        TreeMap::insert(self, key, value)
    }

    fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        TreeMap::get_or_insert_default(self, key)
    }

    fn value_of(&self, key: &K) -> Result<&V, MapError> {
        TreeMap::value_of(self, key)
    }

    fn value_of_mut(&mut self, key: &K) -> Result<&mut V, MapError> {
        TreeMap::value_of_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> Result<(K, V), MapError> {
        TreeMap::remove(self, key)
    }

    fn remove_at(&mut self, pos: Position) -> Result<(K, V), MapError> {
        TreeMap::remove_at(self, pos)
    }

    fn clear(&mut self) {
        TreeMap::clear(self)
    }

    fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        TreeMap::iter_mut(self)
    }

    fn take(&mut self) -> Self {
        TreeMap::take(self)
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> Clone for TreeMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

/// Equal iff both hold the same pairs, whatever their shapes. Identical
/// shapes are confirmed by a structural walk; otherwise the in-order
/// sequences are compared.
impl<K: Ord, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let _g = self.reentrancy.enter();
        let _h = (!core::ptr::eq(self, other)).then(|| other.reentrancy.enter());
        self.tree.same_shape(&other.tree) || self.iter().eq(other.iter())
    }
}

impl<K: Ord, V: Eq> Eq for TreeMap<K, V> {}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Applies `insert` in order; a later duplicate key is dropped.
impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TreeMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for TreeMap<K, V> {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, TreeMap<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut TreeMap<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
impl<K: Ord, V> TreeMap<K, V> {
    /// Panics unless the arena holds exactly the reachable nodes, keys are in
    /// strict BST order and every parent link points at the true parent.
    pub(crate) fn assert_invariants(&self) {
        let tree = &self.tree;
        if let Some(r) = tree.root {
            assert_eq!(tree.nodes[r].parent, None, "root must have no parent");
        }
        let mut reachable = 0usize;
        let mut stack: Vec<NodeKey> = tree.root.into_iter().collect();
        while let Some(k) = stack.pop() {
            reachable += 1;
            let node = &tree.nodes[k];
            for child in [node.left, node.right].into_iter().flatten() {
                assert_eq!(tree.nodes[child].parent, Some(k), "broken parent link");
                stack.push(child);
            }
            if let Some(l) = node.left {
                assert!(tree.nodes[l].key < node.key, "left child out of order");
            }
            if let Some(r) = node.right {
                assert!(tree.nodes[r].key > node.key, "right child out of order");
            }
        }
        assert_eq!(reachable, tree.nodes.len(), "arena holds unreachable nodes");

        let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
        assert_eq!(keys.len(), self.len());
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "in-order walk not ascending");
    }
}
