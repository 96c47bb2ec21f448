use serde::Serialize;
use std::collections::HashMap;

use crate::error::TreeError;
use crate::layout::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Layout of a node as it was last seen expanded, restored on unfold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandedLayout {
    pub r: f64,
    /// Relative offsets of the original children, in child order.
    pub child_offsets: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualData {
    /// Centre relative to the parent's centre (absolute for the root).
    pub x: f64,
    pub y: f64,
    pub r: f64,
    /// Absolute centre, maintained by the visualizer.
    pub abs_x: f64,
    pub abs_y: f64,
    pub expanded: Option<ExpandedLayout>,
}

impl VisualData {
    pub fn offset(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.x = offset.x;
        self.y = offset.y;
    }

    pub fn absolute(&self) -> Point {
        Point::new(self.abs_x, self.abs_y)
    }

    pub fn set_absolute(&mut self, absolute: Point) {
        self.abs_x = absolute.x;
        self.abs_y = absolute.y;
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    full_name: String,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    folded: bool,
    pub visual: VisualData,
}

impl Node {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Display label: the last segment of the full name, or the full name of
    /// the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Children as built, regardless of fold state.
    pub fn original_children(&self) -> &[NodeId] {
        &self.children
    }

    /// Children that take part in layout.
    pub fn visible_children(&self) -> &[NodeId] {
        if self.folded { &[] } else { &self.children }
    }

    pub fn is_layout_leaf(&self) -> bool {
        self.folded || self.children.is_empty()
    }
}

/// Arena of nodes. Parents own their children by index; children only keep
/// the index of their parent.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
}

impl Tree {
    pub fn new(root_name: &str) -> Result<Self, TreeError> {
        let root_name = root_name.trim();
        if root_name.is_empty() {
            return Err(TreeError::InvalidName(root_name.to_string()));
        }
        let root = Node {
            full_name: root_name.to_string(),
            name: root_name.to_string(),
            parent: None,
            children: Vec::new(),
            depth: 0,
            folded: false,
            visual: VisualData::default(),
        };
        let mut by_name = HashMap::new();
        by_name.insert(root_name.to_string(), NodeId(0));
        Ok(Self {
            nodes: vec![root],
            by_name,
        })
    }

    /// Adds a child named `name` (a single segment) below `parent`.
    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, TreeError> {
        if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or_else(|| TreeError::UnknownNode(format!("#{}", parent.0)))?;
        let full_name = format!("{}.{}", parent_node.full_name, name);
        if self.by_name.contains_key(&full_name) {
            return Err(TreeError::DuplicateName(full_name));
        }
        let id = NodeId(self.nodes.len());
        let depth = parent_node.depth + 1;
        self.nodes.push(Node {
            full_name: full_name.clone(),
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            depth,
            folded: false,
            visual: VisualData::default(),
        });
        self.nodes[parent.0].children.push(id);
        self.by_name.insert(full_name, id);
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn visual(&self, id: NodeId) -> &VisualData {
        &self.nodes[id.0].visual
    }

    pub(crate) fn visual_mut(&mut self, id: NodeId) -> &mut VisualData {
        &mut self.nodes[id.0].visual
    }

    pub fn find(&self, full_name: &str) -> Option<NodeId> {
        self.by_name.get(full_name).copied()
    }

    pub fn id_of(&self, full_name: &str) -> Result<NodeId, TreeError> {
        self.find(full_name)
            .ok_or_else(|| TreeError::UnknownNode(full_name.to_string()))
    }

    /// All ids in creation order; parents always come before their children.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id.0].parent.is_none()
    }

    /// `true` when `other` is `id` itself or one of its ancestors.
    pub fn is_child_of(&self, id: NodeId, other: NodeId) -> bool {
        self.ancestors_inclusive(id).any(|ancestor| ancestor == other)
    }

    /// `id`, its parent, its grandparent, up to the root.
    pub fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.parent(*current))
    }

    /// `true` when no ancestor of `id` is folded.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors_inclusive(id)
            .skip(1)
            .all(|ancestor| !self.nodes[ancestor.0].folded)
    }

    /// Pre-order walk over `id` and every descendant not hidden by a folded
    /// ancestor. Calling it again restarts the walk.
    pub fn visible_descendants(&self, id: NodeId) -> VisibleDescendants<'_> {
        VisibleDescendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Post-order over the whole subtree of `id`, hidden nodes included.
    pub fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push((*child, false));
            }
        }
        out
    }

    /// Toggles the fold flag. Geometry is reconciled by the visualizer.
    pub fn change_fold(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.0];
        if !node.children.is_empty() {
            node.folded = !node.folded;
        }
    }

    pub fn set_folded(&mut self, id: NodeId, folded: bool) {
        let node = &mut self.nodes[id.0];
        if !node.children.is_empty() {
            node.folded = folded;
        }
    }
}

#[derive(Debug, Clone)]
pub struct VisibleDescendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for VisibleDescendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.visible_children().iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new("com.tngtech").unwrap();
        let root = tree.root();
        let main = tree.add_child(root, "main").unwrap();
        let class1 = tree.add_child(main, "class1").unwrap();
        let class2 = tree.add_child(root, "class2").unwrap();
        (tree, main, class1, class2)
    }

    #[test]
    fn builds_full_names_from_segments() {
        let (tree, main, class1, _) = sample();
        assert_eq!(tree.node(class1).full_name(), "com.tngtech.main.class1");
        assert_eq!(tree.node(class1).name(), "class1");
        assert_eq!(tree.find("com.tngtech.main"), Some(main));
        assert_eq!(tree.node(class1).depth(), 2);
    }

    #[test]
    fn rejects_duplicates_and_dotted_segments() {
        let (mut tree, main, _, _) = sample();
        assert_eq!(
            tree.add_child(main, "class1"),
            Err(TreeError::DuplicateName("com.tngtech.main.class1".to_string()))
        );
        assert!(matches!(
            tree.add_child(main, "a.b"),
            Err(TreeError::InvalidName(_))
        ));
    }

    #[test]
    fn is_child_of_includes_self_and_ancestors() {
        let (tree, main, class1, class2) = sample();
        assert!(tree.is_child_of(class1, class1));
        assert!(tree.is_child_of(class1, main));
        assert!(tree.is_child_of(class1, tree.root()));
        assert!(!tree.is_child_of(class1, class2));
        assert!(!tree.is_child_of(main, class1));
    }

    #[test]
    fn visible_descendants_skip_folded_subtrees() {
        let (mut tree, main, class1, class2) = sample();
        let all: Vec<_> = tree.visible_descendants(tree.root()).collect();
        assert_eq!(all, vec![tree.root(), main, class1, class2]);

        tree.change_fold(main);
        let visible: Vec<_> = tree.visible_descendants(tree.root()).collect();
        assert_eq!(visible, vec![tree.root(), main, class2]);
        assert!(!tree.is_visible(class1));
        assert_eq!(tree.node(main).original_children(), &[class1]);
        assert!(tree.node(main).is_layout_leaf());
    }

    #[test]
    fn leaves_cannot_be_folded() {
        let (mut tree, _, class1, _) = sample();
        tree.change_fold(class1);
        assert!(!tree.node(class1).is_folded());
    }

    #[test]
    fn post_order_visits_children_first() {
        let (tree, main, class1, class2) = sample();
        assert_eq!(tree.post_order(tree.root()), vec![class1, main, class2, tree.root()]);
    }
}
