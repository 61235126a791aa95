//! Document arena: node creation, insertion, removal, attribute and text edits.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{ElementData, NodeId, NodeKind};
use crate::error::DomError;

const EMPTY_CHILDREN: &[NodeId] = &[];

/// The terminal DOM, backed by a slotmap arena.
///
/// Parent and child links live in secondary maps, so a node can only ever be
/// listed under one parent: moving a node detaches and reattaches it within a
/// single call.
pub struct Document {
    nodes: SlotMap<NodeId, NodeKind>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    // ── Construction ─────────────────────────────────────────────────

    fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.insert(kind);
        self.children.insert(id, Vec::new());
        id
    }

    /// Create an unattached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.create(NodeKind::Element(ElementData::new(tag)))
    }

    /// Create an unattached text node.
    pub fn create_text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    /// Create an unattached comment (used by the component layer as an anchor).
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Comment(text.into()))
    }

    /// Create an empty document fragment.
    pub fn create_document_fragment(&mut self) -> NodeId {
        self.create(NodeKind::Fragment)
    }

    // ── Structure ────────────────────────────────────────────────────

    /// Insert `child` into `parent` before `reference` (append when `None`).
    ///
    /// A child that already has a parent is detached first. Inserting a
    /// fragment moves its children instead and leaves it empty. Returns the
    /// nodes that were actually inserted, in document order.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Vec<NodeId>, DomError> {
        const OP: &str = "insertBefore";
        let parent_kind = self.nodes.get(parent).ok_or(DomError::UnknownNode { op: OP, node: parent })?;
        if !parent_kind.is_container() {
            return Err(DomError::LeafParent { op: OP, kind: parent_kind.name() });
        }
        if !self.nodes.contains_key(child) {
            return Err(DomError::UnknownNode { op: OP, node: child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::ReferenceNotAChild);
            }
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::HierarchyRequest { op: OP });
        }

        // Inserting a node before itself keeps it where it is.
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };

        let moving: Vec<NodeId> = match self.nodes[child] {
            NodeKind::Fragment => self.children(child).to_vec(),
            _ => vec![child],
        };

        for &node in &moving {
            self.detach(node);
            let Some(siblings) = self.children.get_mut(parent) else {
                return Err(DomError::UnknownNode { op: OP, node: parent });
            };
            let index = reference
                .and_then(|r| siblings.iter().position(|&s| s == r))
                .unwrap_or(siblings.len());
            siblings.insert(index, node);
            self.parent.insert(node, parent);
        }
        Ok(moving)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.insert_before(parent, child, None)
    }

    /// Detach `child` from `parent`.
    ///
    /// Returns `Ok(false)` when `child` is not currently a child of `parent`;
    /// the caller reports that as a soft warning.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<bool, DomError> {
        const OP: &str = "removeChild";
        if !self.nodes.contains_key(parent) {
            return Err(DomError::UnknownNode { op: OP, node: parent });
        }
        if !self.nodes.contains_key(child) {
            return Err(DomError::UnknownNode { op: OP, node: child });
        }
        if self.parent(child) != Some(parent) {
            return Ok(false);
        }
        self.detach(child);
        Ok(true)
    }

    /// Replace `old` (a child of `parent`) with `new`. Returns the inserted nodes.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<Vec<NodeId>, DomError> {
        if self.parent(old) != Some(parent) {
            return Err(DomError::ReplacedNotAChild);
        }
        if new == old {
            return Ok(Vec::new());
        }
        let inserted = self.insert_before(parent, new, Some(old))?;
        self.detach(old);
        Ok(inserted)
    }

    /// Unlink a node from its parent, if it has one.
    fn detach(&mut self, node: NodeId) {
        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&s| s != node);
            }
        }
    }

    /// Free `node` and its whole subtree from the arena.
    ///
    /// Returns every freed node with its payload, parents before children, so
    /// the caller can release widgets and handlers bound to them.
    pub fn destroy(&mut self, node: NodeId) -> Vec<(NodeId, NodeKind)> {
        if !self.nodes.contains_key(node) {
            return Vec::new();
        }
        self.detach(node);
        if self.root == Some(node) {
            self.root = None;
        }

        let mut freed = Vec::new();
        let mut queue = VecDeque::from([node]);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                queue.extend(kids);
            }
            self.parent.remove(current);
            if let Some(kind) = self.nodes.remove(current) {
                freed.push((current, kind));
            }
        }
        freed
    }

    // ── Attributes and text ──────────────────────────────────────────

    /// Set an attribute, returning the previous value.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<Option<String>, DomError> {
        let element = self.element_mut_for("setAttribute", node)?;
        Ok(element.attributes.insert(name.to_owned(), value.into()))
    }

    /// Remove an attribute, returning the previous value.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let element = self.element_mut_for("removeAttribute", node)?;
        Ok(element.attributes.remove(name))
    }

    /// Replace the value of a text or comment node, returning the old value.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<String, DomError> {
        const OP: &str = "setText";
        match self.nodes.get_mut(node) {
            Some(NodeKind::Text(value)) | Some(NodeKind::Comment(value)) => {
                Ok(std::mem::replace(value, text.into()))
            }
            Some(_) => Err(DomError::NotText { op: OP, node }),
            None => Err(DomError::UnknownNode { op: OP, node }),
        }
    }

    fn element_mut_for(&mut self, op: &'static str, node: NodeId) -> Result<&mut ElementData, DomError> {
        match self.nodes.get_mut(node) {
            Some(NodeKind::Element(data)) => Ok(data),
            Some(_) => Err(DomError::NotAnElement { op, node }),
            None => Err(DomError::UnknownNode { op, node }),
        }
    }

    /// Concatenated value of the direct text children of `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        self.children(node)
            .iter()
            .filter_map(|&c| self.nodes.get(c).and_then(NodeKind::as_text))
            .collect()
    }

    /// Whether `node` has at least one direct text child.
    pub fn has_text_children(&self, node: NodeId) -> bool {
        self.children(node)
            .iter()
            .any(|&c| matches!(self.nodes.get(c), Some(NodeKind::Text(_))))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn get(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.nodes.get_mut(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(NodeKind::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(NodeKind::as_element_mut)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Children of a node. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(EMPTY_CHILDREN)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&s| s == id)?;
        siblings.get(index + 1).copied()
    }

    /// Nearest ancestor that is an element.
    pub fn element_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if self.element(node).is_some() {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Ancestors from the immediate parent up to the top of the tree.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent(current) {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        match self.root {
            Some(root) => self.is_ancestor_or_self(root, node),
            None => false,
        }
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Document, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("box");
        doc.set_root(root);
        let a = doc.create_element("box");
        let b = doc.create_element("box");
        let c = doc.create_element("text");
        let d = doc.create_element("text");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        doc.append_child(a, c).unwrap();
        doc.append_child(a, d).unwrap();
        (doc, root, a, b, c, d)
    }

    /// Every node listed as a child has the matching parent link and
    /// appears under exactly one parent.
    fn assert_consistent(doc: &Document) {
        let mut seen = std::collections::HashSet::new();
        for (id, _) in doc.nodes.iter() {
            for &child in doc.children(id) {
                assert_eq!(doc.parent(child), Some(id));
                assert!(seen.insert(child), "node listed under two parents");
            }
        }
        for (child, &parent) in doc.parent.iter() {
            assert!(doc.children(parent).contains(&child));
        }
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn created_nodes_are_unattached() {
        let mut doc = Document::new();
        let e = doc.create_element("box");
        let t = doc.create_text_node("hi");
        let c = doc.create_comment("anchor");
        let f = doc.create_document_fragment();
        for id in [e, t, c, f] {
            assert_eq!(doc.parent(id), None);
            assert!(doc.children(id).is_empty());
        }
        assert_eq!(doc.get(t).unwrap().node_type(), 3);
        assert_eq!(doc.len(), 4);
    }

    // ── insert / append ──────────────────────────────────────────────

    #[test]
    fn append_preserves_order() {
        let (doc, root, a, b, c, d) = build_tree();
        assert_eq!(doc.children(root), &[a, b]);
        assert_eq!(doc.children(a), &[c, d]);
        assert_consistent(&doc);
    }

    #[test]
    fn insert_before_reference() {
        let (mut doc, root, a, b, ..) = build_tree();
        let x = doc.create_element("box");
        doc.insert_before(root, x, Some(b)).unwrap();
        assert_eq!(doc.children(root), &[a, x, b]);
    }

    #[test]
    fn insert_before_none_appends() {
        let (mut doc, root, a, b, ..) = build_tree();
        let x = doc.create_element("box");
        doc.insert_before(root, x, None).unwrap();
        assert_eq!(doc.children(root), &[a, b, x]);
    }

    #[test]
    fn insert_moves_attached_node() {
        let (mut doc, root, a, b, c, d) = build_tree();
        doc.append_child(b, c).unwrap();
        assert_eq!(doc.children(a), &[d]);
        assert_eq!(doc.children(b), &[c]);
        assert_eq!(doc.parent(c), Some(b));
        assert_eq!(doc.ancestors(c), vec![b, root]);
        assert_consistent(&doc);
    }

    #[test]
    fn insert_before_self_is_noop() {
        let (mut doc, _root, a, _b, c, d) = build_tree();
        doc.insert_before(a, c, Some(c)).unwrap();
        assert_eq!(doc.children(a), &[c, d]);
    }

    #[test]
    fn reference_must_be_child() {
        let (mut doc, root, _a, _b, c, _d) = build_tree();
        let x = doc.create_element("box");
        let err = doc.insert_before(root, x, Some(c)).unwrap_err();
        assert_eq!(err, DomError::ReferenceNotAChild);
        assert_eq!(doc.parent(x), None);
    }

    #[test]
    fn cannot_insert_into_descendant() {
        let (mut doc, _root, a, _b, c, _d) = build_tree();
        let err = doc.append_child(c, a).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
        let err = doc.append_child(a, a).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn text_nodes_cannot_have_children() {
        let mut doc = Document::new();
        let t = doc.create_text_node("x");
        let e = doc.create_element("box");
        let err = doc.append_child(t, e).unwrap_err();
        assert!(matches!(err, DomError::LeafParent { kind: "text", .. }));
    }

    #[test]
    fn fragment_children_move_into_parent() {
        let (mut doc, root, a, b, ..) = build_tree();
        let frag = doc.create_document_fragment();
        let x = doc.create_element("box");
        let y = doc.create_text_node("y");
        doc.append_child(frag, x).unwrap();
        doc.append_child(frag, y).unwrap();

        let inserted = doc.insert_before(root, frag, Some(b)).unwrap();
        assert_eq!(inserted, vec![x, y]);
        assert_eq!(doc.children(root), &[a, x, y, b]);
        assert!(doc.children(frag).is_empty());
        assert_consistent(&doc);
    }

    // ── remove / replace / destroy ───────────────────────────────────

    #[test]
    fn remove_child_detaches() {
        let (mut doc, _root, a, _b, c, d) = build_tree();
        assert!(doc.remove_child(a, c).unwrap());
        assert_eq!(doc.children(a), &[d]);
        assert_eq!(doc.parent(c), None);
        assert!(doc.contains(c));
    }

    #[test]
    fn remove_non_child_is_soft() {
        let (mut doc, root, _a, _b, c, _d) = build_tree();
        assert!(!doc.remove_child(root, c).unwrap());
        assert!(doc.parent(c).is_some());
    }

    #[test]
    fn replace_child_swaps_in_place() {
        let (mut doc, root, a, b, ..) = build_tree();
        let x = doc.create_element("box");
        doc.replace_child(root, x, a).unwrap();
        assert_eq!(doc.children(root), &[x, b]);
        assert_eq!(doc.parent(a), None);
    }

    #[test]
    fn replace_requires_old_child() {
        let (mut doc, root, _a, _b, c, _d) = build_tree();
        let x = doc.create_element("box");
        assert_eq!(doc.replace_child(root, x, c).unwrap_err(), DomError::ReplacedNotAChild);
    }

    #[test]
    fn destroy_frees_subtree() {
        let (mut doc, root, a, b, c, d) = build_tree();
        let freed: Vec<NodeId> = doc.destroy(a).into_iter().map(|(id, _)| id).collect();
        assert_eq!(freed, vec![a, c, d]);
        assert!(!doc.contains(c));
        assert_eq!(doc.children(root), &[b]);
        assert_consistent(&doc);
    }

    // ── attributes and text ──────────────────────────────────────────

    #[test]
    fn attributes_round_trip() {
        let (mut doc, _root, a, ..) = build_tree();
        assert_eq!(doc.set_attribute(a, "label", "one").unwrap(), None);
        assert_eq!(doc.set_attribute(a, "label", "two").unwrap(), Some("one".into()));
        assert_eq!(doc.element(a).unwrap().attribute("label"), Some("two"));
        assert_eq!(doc.remove_attribute(a, "label").unwrap(), Some("two".into()));
        assert_eq!(doc.remove_attribute(a, "label").unwrap(), None);
    }

    #[test]
    fn set_attribute_on_text_fails() {
        let mut doc = Document::new();
        let t = doc.create_text_node("x");
        assert!(matches!(
            doc.set_attribute(t, "a", "b"),
            Err(DomError::NotAnElement { .. })
        ));
    }

    #[test]
    fn text_content_concatenates_direct_text() {
        let mut doc = Document::new();
        let e = doc.create_element("text");
        let t1 = doc.create_text_node("Hello, ");
        let t2 = doc.create_text_node("world");
        let inner = doc.create_element("box");
        doc.append_child(e, t1).unwrap();
        doc.append_child(e, inner).unwrap();
        doc.append_child(e, t2).unwrap();
        assert_eq!(doc.text_content(e), "Hello, world");
        doc.set_text(t2, "there").unwrap();
        assert_eq!(doc.text_content(e), "Hello, there");
        assert!(doc.has_text_children(e));
    }

    // ── traversal ────────────────────────────────────────────────────

    #[test]
    fn walk_depth_first_order() {
        let (doc, root, a, b, c, d) = build_tree();
        assert_eq!(doc.walk_depth_first(root), vec![root, a, c, d, b]);
    }

    #[test]
    fn connectivity_follows_root() {
        let (mut doc, root, a, _b, c, _d) = build_tree();
        assert!(doc.is_connected(c));
        doc.remove_child(root, a).unwrap();
        assert!(!doc.is_connected(c));
        assert_eq!(doc.element_ancestor(c), Some(a));
    }

    #[test]
    fn random_moves_keep_single_membership() {
        let mut doc = Document::new();
        let parents: Vec<NodeId> = (0..4).map(|_| doc.create_element("box")).collect();
        let kids: Vec<NodeId> = (0..6).map(|_| doc.create_element("text")).collect();
        // Deterministic pseudo-random sequence of appends, inserts and removals.
        let mut seed = 7u32;
        for _ in 0..200 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let p = parents[(seed >> 3) as usize % parents.len()];
            let k = kids[(seed >> 7) as usize % kids.len()];
            match (seed >> 11) % 3 {
                0 => {
                    doc.append_child(p, k).unwrap();
                }
                1 => {
                    let reference = doc.children(p).first().copied();
                    doc.insert_before(p, k, reference).unwrap();
                }
                _ => {
                    doc.remove_child(p, k).unwrap();
                }
            }
            assert_consistent(&doc);
        }
    }
}
