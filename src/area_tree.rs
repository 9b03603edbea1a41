//! # Area forest
//!
//! Message and file areas are grouped under nested divisions. The forest is
//! kept in an arena: every node lives in one `Vec` and refers to its parent
//! and children by [`NodeId`], so reparenting never moves node data.
//!
//! Two derived fields are recomputed whenever a node moves:
//!
//! - `full_name`: the parent's `full_name`, a dot and the node's own name,
//!   or just the name at the root.
//! - `division_level`: the parent's level plus one, or 0 at the root.
//!
//! The flat schema lists ([`Division`] plus [`MsgArea`] / [`FileArea`]) and
//! the forest convert into each other with [`AreaTree::from_lists`] and
//! [`AreaTree::to_lists`].

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::logutil::escape_log;
use crate::schema::{Division, FileArea, FileAreas, MsgArea, MsgAreas};

/// Index of a node inside its [`AreaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DivisionInfo {
    pub acs: String,
    pub display_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind<A> {
    Division(DivisionInfo),
    Area(A),
}

#[derive(Debug, Clone)]
pub struct Node<A> {
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub division_level: i32,
    pub kind: NodeKind<A>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<A> Node<A> {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_division(&self) -> bool {
        matches!(self.kind, NodeKind::Division(_))
    }

    pub fn area(&self) -> Option<&A> {
        match &self.kind {
            NodeKind::Area(a) => Some(a),
            NodeKind::Division(_) => None,
        }
    }
}

/// Area records that can hang off a division.
pub trait AreaRecord: Clone {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Dotted key of the owning division, empty at the root.
    fn division(&self) -> &str;
    fn set_division(&mut self, key: String);
}

impl AreaRecord for MsgArea {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn division(&self) -> &str {
        &self.division
    }
    fn set_division(&mut self, key: String) {
        self.division = key;
    }
}

impl AreaRecord for FileArea {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn division(&self) -> &str {
        &self.division
    }
    fn set_division(&mut self, key: String) {
        self.division = key;
    }
}

#[derive(Debug, Clone)]
pub struct AreaTree<A> {
    nodes: Vec<Node<A>>,
    roots: Vec<NodeId>,
}

impl<A> Default for AreaTree<A> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }
}

impl<A> AreaTree<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node<A> {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<A> {
        &mut self.nodes[id.index()]
    }

    /// Finds a node by its dotted `full_name`.
    pub fn find(&self, full_name: &str) -> Option<NodeId> {
        self.walk().into_iter().find(|&id| self.node(id).full_name == full_name)
    }

    /// Adds a detached node. It joins the forest through [`attach`] or
    /// [`add_child`], which recompute `full_name` and `division_level`.
    ///
    /// [`attach`]: AreaTree::attach
    /// [`add_child`]: AreaTree::add_child
    pub fn create(
        &mut self,
        name: &str,
        full_name: &str,
        description: &str,
        kind: NodeKind<A>,
        division_level: i32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.to_string(),
            full_name: full_name.to_string(),
            description: description.to_string(),
            division_level,
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` under `parent` and relevels it. Fails when `parent`
    /// is not a division or lies inside `child`'s own subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.attach(child, Some(parent))
    }

    fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).parent.is_some() || self.roots.contains(&id)
    }

    /// Removes `id` from its parent's child list (or from the roots),
    /// keeping the order of its siblings. Returns false if it was not
    /// attached anywhere.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.node(id).parent {
            Some(p) => {
                let siblings = &mut self.nodes[p.index()].children;
                siblings.retain(|&c| c != id);
                self.nodes[id.index()].parent = None;
                true
            }
            None => {
                let before = self.roots.len();
                self.roots.retain(|&r| r != id);
                self.roots.len() != before
            }
        }
    }

    /// Moves `id` to the end of `parent`'s children, or to the end of the
    /// roots when `parent` is `None`, then rebuilds the derived fields of
    /// the whole subtree.
    pub fn attach(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        if let Some(p) = parent {
            if !self.node(p).is_division() || self.is_within(p, id) {
                return false;
            }
        }
        if self.is_attached(id) {
            self.detach(id);
        }
        match parent {
            Some(p) => {
                self.nodes[p.index()].children.push(id);
                self.nodes[id.index()].parent = Some(p);
            }
            None => self.roots.push(id),
        }
        self.rebuild_full_name(id);
        true
    }

    /// True when `id` is `ancestor` or one of its descendants.
    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }

    /// Recomputes `full_name` and `division_level` for `id` and everything
    /// below it.
    pub fn rebuild_full_name(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let (full_name, level) = match self.node(cur).parent {
                Some(p) => {
                    let parent = self.node(p);
                    (
                        format!("{}.{}", parent.full_name, self.node(cur).name),
                        parent.division_level + 1,
                    )
                }
                None => (self.node(cur).name.clone(), 0),
            };
            let node = &mut self.nodes[cur.index()];
            node.full_name = full_name;
            node.division_level = level;
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Every attached node, depth first, parents before children.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        out
    }
}

impl<A: AreaRecord> AreaTree<A> {
    /// Builds the forest from flat lists. Divisions are parented by the
    /// part of their key before the last dot; areas by their `division`
    /// field. Anything whose parent is missing becomes a root.
    pub fn from_lists(divisions: &[Division], areas: &[A]) -> Self {
        let mut tree = Self::new();
        let mut by_key: HashMap<&str, NodeId> = HashMap::new();
        let mut division_ids = Vec::with_capacity(divisions.len());

        for d in divisions {
            let key = if d.key.is_empty() { d.name.as_str() } else { d.key.as_str() };
            let id = tree.create(
                &d.name,
                key,
                &d.description,
                NodeKind::Division(DivisionInfo {
                    acs: d.acs.clone(),
                    display_file: d.display_file.clone(),
                }),
                d.level,
            );
            by_key.entry(key).or_insert(id);
            division_ids.push((key, id));
        }

        for &(key, id) in &division_ids {
            let parent = key
                .rsplit_once('.')
                .and_then(|(parent_key, _)| by_key.get(parent_key).copied())
                .filter(|&p| p != id);
            if parent.is_none() || !tree.attach(id, parent) {
                tree.attach(id, None);
            }
        }

        for a in areas {
            let id = tree.create(a.name(), a.name(), a.description(), NodeKind::Area(a.clone()), 0);
            let parent = by_key.get(a.division()).copied();
            tree.attach(id, parent);
        }

        // divisions may be listed before their parents
        for root in tree.roots.clone() {
            tree.rebuild_full_name(root);
        }
        for &(key, id) in &division_ids {
            let rebuilt = &tree.node(id).full_name;
            if rebuilt != key {
                warn!(
                    "division key '{}' does not match its name chain; using '{}'",
                    escape_log(key),
                    escape_log(rebuilt)
                );
            }
        }
        tree
    }

    /// Flattens the forest: divisions in pre-order (first occurrence of a
    /// key wins) and areas carrying their parent division's key.
    pub fn to_lists(&self) -> (Vec<Division>, Vec<A>) {
        let mut divisions = Vec::new();
        let mut seen = HashSet::new();
        let mut areas = Vec::new();

        for id in self.walk() {
            let node = self.node(id);
            match &node.kind {
                NodeKind::Division(info) => {
                    if seen.insert(node.full_name.as_str()) {
                        divisions.push(Division {
                            name: node.name.clone(),
                            key: node.full_name.clone(),
                            description: node.description.clone(),
                            acs: info.acs.clone(),
                            display_file: info.display_file.clone(),
                            level: node.division_level,
                        });
                    }
                }
                NodeKind::Area(a) => {
                    let mut a = a.clone();
                    let division = node
                        .parent
                        .map(|p| self.node(p).full_name.clone())
                        .unwrap_or_default();
                    a.set_division(division);
                    areas.push(a);
                }
            }
        }
        (divisions, areas)
    }
}

impl From<&MsgAreas> for AreaTree<MsgArea> {
    fn from(v: &MsgAreas) -> Self {
        Self::from_lists(&v.divisions, &v.areas)
    }
}

impl From<&AreaTree<MsgArea>> for MsgAreas {
    fn from(tree: &AreaTree<MsgArea>) -> Self {
        let (divisions, areas) = tree.to_lists();
        Self { divisions, areas }
    }
}

impl From<&FileAreas> for AreaTree<FileArea> {
    fn from(v: &FileAreas) -> Self {
        Self::from_lists(&v.divisions, &v.areas)
    }
}

impl From<&AreaTree<FileArea>> for FileAreas {
    fn from(tree: &AreaTree<FileArea>) -> Self {
        let (divisions, areas) = tree.to_lists();
        Self { divisions, areas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn division(name: &str, key: &str) -> Division {
        Division {
            name: name.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    fn area(name: &str, division: &str) -> MsgArea {
        MsgArea {
            name: name.to_string(),
            division: division.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stale_division_key_is_rebuilt() {
        // hand-edited: the name changed but the key still says "lang"
        let divisions = [division("prog", "prog"), division("rust", "prog.lang")];
        let areas = [area("help", "prog.lang")];
        let tree = AreaTree::from_lists(&divisions, &areas);

        let rust = tree.find("prog.rust").unwrap();
        assert!(tree.find("prog.lang").is_none());
        assert_eq!(tree.node(rust).children().len(), 1);

        let (divs, areas) = tree.to_lists();
        assert_eq!(divs[1].key, "prog.rust");
        assert_eq!(areas[0].division, "prog.rust");
    }

    fn assert_identity(tree: &AreaTree<MsgArea>) {
        for id in tree.walk() {
            let mut names = vec![tree.node(id).name.clone()];
            let mut cur = tree.node(id).parent();
            while let Some(p) = cur {
                names.push(tree.node(p).name.clone());
                cur = tree.node(p).parent();
            }
            names.reverse();
            assert_eq!(tree.node(id).full_name, names.join("."));
            assert_eq!(tree.node(id).division_level as usize, names.len() - 1);
        }
    }

    #[test]
    fn test_build_from_lists() {
        let divisions = [division("a", "a"), division("b", "a.b")];
        let areas = [area("x", "a.b"), area("y", "")];
        let tree = AreaTree::from_lists(&divisions, &areas);

        let roots: Vec<_> = tree.roots().iter().map(|&r| tree.node(r).name.as_str()).collect();
        assert_eq!(roots, ["a", "y"]);
        let a = tree.roots()[0];
        let ab = tree.node(a).children()[0];
        assert_eq!(tree.node(ab).full_name, "a.b");
        let x = tree.node(ab).children()[0];
        assert_eq!(tree.node(x).full_name, "a.b.x");
        assert_eq!(tree.node(tree.roots()[1]).full_name, "y");
        assert_identity(&tree);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let divisions = [division("b", "a.b"), division("a", "a")];
        let tree: AreaTree<MsgArea> = AreaTree::from_lists(&divisions, &[area("x", "a.b")]);
        assert_eq!(tree.roots().len(), 1);
        assert!(tree.find("a.b.x").is_some());
        assert_identity(&tree);
    }

    #[test]
    fn test_orphan_area_becomes_root() {
        let tree = AreaTree::from_lists(&[division("a", "a")], &[area("x", "missing")]);
        assert_eq!(tree.roots().len(), 2);
        let (_, areas) = tree.to_lists();
        assert_eq!(areas[0].division, "");
    }

    #[test]
    fn test_reparent_rebuilds_subtree() {
        let divisions = [division("a", "a"), division("b", "a.b"), division("c", "c")];
        let mut tree = AreaTree::from_lists(&divisions, &[area("x", "a.b")]);
        let ab = tree.find("a.b").unwrap();
        let c = tree.find("c").unwrap();

        assert!(tree.attach(ab, Some(c)));
        assert!(tree.find("c.b.x").is_some());
        assert_eq!(tree.node(tree.find("c.b.x").unwrap()).division_level, 2);
        assert_identity(&tree);

        assert!(tree.detach(ab));
        assert!(!tree.detach(ab));
        assert!(tree.attach(ab, None));
        assert_eq!(tree.node(ab).full_name, "b");
        assert_eq!(tree.roots().last(), Some(&ab));
        assert_identity(&tree);
    }

    #[test]
    fn test_attach_rejects_area_parent_and_cycles() {
        let divisions = [division("a", "a"), division("b", "a.b")];
        let mut tree = AreaTree::from_lists(&divisions, &[area("x", "")]);
        let a = tree.find("a").unwrap();
        let ab = tree.find("a.b").unwrap();
        let x = tree.find("x").unwrap();
        assert!(!tree.attach(a, Some(x)));
        assert!(!tree.attach(a, Some(ab)));
        assert!(!tree.add_child(a, a));
        assert_eq!(tree.node(a).full_name, "a");
    }

    #[test]
    fn test_round_trip_through_lists() {
        let src = MsgAreas {
            divisions: vec![
                Division { level: 0, ..division("a", "a") },
                Division { level: 1, ..division("b", "a.b") },
            ],
            areas: vec![area("x", "a.b"), area("y", "a"), area("z", "")],
        };
        let tree = AreaTree::from(&src);
        assert_eq!(MsgAreas::from(&tree), src);
    }

    #[test]
    fn test_duplicate_division_keys_flatten_once() {
        let mut tree: AreaTree<MsgArea> = AreaTree::new();
        for _ in 0..2 {
            let id = tree.create("d", "d", "", NodeKind::Division(DivisionInfo::default()), 0);
            tree.attach(id, None);
        }
        let (divisions, _) = tree.to_lists();
        assert_eq!(divisions.len(), 1);
    }
}
