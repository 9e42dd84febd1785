//! Arena-based DOM tree storage
//!
//! The page is a graph with back-references (parent, children, siblings).
//! Storing it as `Vec<DomNode>` with `u32` handles keeps ownership flat:
//! no Rc/RefCell cycles, no recursion in the hot paths.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Removal never frees a slot. A removed subtree is unlinked from its parent
//! and flagged `detached`, so every handle a caller holds stays valid and
//! queries simply skip it.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};
use ahash::AHashMap;

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<u32, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024), // Pre-allocate for typical page
            backend_id_map: AHashMap::with_capacity(1024),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID.
    ///
    /// The node's `node_id` is overwritten with its arena index and its role
    /// is classified here, once. Linking to a parent is up to the caller.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        node.role = node.classify();
        self.backend_id_map.insert(node.backend_node_id, node_id);
        self.nodes.push(node);
        node_id
    }

    /// Start a fresh document and make it the root
    pub fn create_document(&mut self) -> NodeId {
        let backend_id = self.next_backend_id();
        let doc = DomNode::new(0, backend_id, NodeType::Document, "#document".to_string());
        let id = self.add_node(doc);
        self.root_id = Some(id);
        id
    }

    /// Build an element under `parent`
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId> {
        let backend_id = self.next_backend_id();
        let mut node = DomNode::new(0, backend_id, NodeType::Element, tag.to_ascii_uppercase());
        for (name, value) in attributes {
            node.set_attr(name, value);
        }
        self.append_child(parent, node)
    }

    /// Build a text node under `parent`
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let backend_id = self.next_backend_id();
        let mut node = DomNode::new(0, backend_id, NodeType::Text, "#text".to_string());
        node.node_value = text.to_string();
        self.append_child(parent, node)
    }

    fn append_child(&mut self, parent: NodeId, mut node: DomNode) -> Result<NodeId> {
        let parent_detached = self.get(parent)?.detached;
        node.parent_id = Some(parent);
        node.detached = parent_detached;
        let id = self.add_node(node);
        self.get_mut(parent)?.children_ids.push(id);
        Ok(id)
    }

    fn next_backend_id(&self) -> u32 {
        self.nodes.len() as u32 + 1
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Get node ID by backend node ID
    pub fn get_node_id_by_backend(&self, backend_id: u32) -> Option<NodeId> {
        self.backend_id_map.get(&backend_id).copied()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::InvalidDocument("no root node set".to_string()))?;
        self.get(root_id)
    }

    /// Total number of node slots, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk up from `node_id`, nearest ancestor first (the node itself excluded)
    pub fn ancestors(&self, node_id: NodeId) -> Ancestors<'_> {
        let next = self.nodes.get(node_id as usize).and_then(|n| n.parent_id);
        Ancestors { arena: self, next }
    }

    /// Nearest ancestor matching the predicate
    pub fn closest_ancestor<F>(&self, node_id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.ancestors(node_id)
            .find(|&id| self.nodes.get(id as usize).is_some_and(&predicate))
    }

    /// True if `node_id` is `ancestor_id` or lies beneath it
    pub fn contains(&self, ancestor_id: NodeId, node_id: NodeId) -> bool {
        node_id == ancestor_id || self.ancestors(node_id).any(|id| id == ancestor_id)
    }

    /// Attached means reachable from the root through parent links
    pub fn is_attached(&self, node_id: NodeId) -> bool {
        match self.root_id {
            Some(root_id) => self.contains(root_id, node_id),
            None => false,
        }
    }

    /// All descendants in document order (the node itself excluded)
    pub fn descendants(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.get(node_id)?.children_ids.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            out.push(id);
            for &child_id in self.get(id)?.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(out)
    }

    /// Descendants of `node_id` matching the predicate, in document order
    pub fn find_within<F>(&self, node_id: NodeId, predicate: F) -> Result<Vec<NodeId>>
    where
        F: Fn(&DomNode) -> bool,
    {
        Ok(self
            .descendants(node_id)?
            .into_iter()
            .filter(|&id| self.nodes.get(id as usize).is_some_and(&predicate))
            .collect())
    }

    /// Nearest element sibling after (`forward`) or before `node_id`
    fn element_sibling(&self, node_id: NodeId, forward: bool) -> Option<NodeId> {
        let parent_id = self.nodes.get(node_id as usize)?.parent_id?;
        let siblings = &self.nodes.get(parent_id as usize)?.children_ids;
        let pos = siblings.iter().position(|&id| id == node_id)?;

        let is_element = |id: &&NodeId| self.nodes.get(**id as usize).is_some_and(|n| n.is_element());
        if forward {
            siblings[pos + 1..].iter().find(is_element).copied()
        } else {
            siblings[..pos].iter().rev().find(is_element).copied()
        }
    }

    pub fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        self.element_sibling(node_id, true)
    }

    pub fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        self.element_sibling(node_id, false)
    }

    /// Unlink a node from its parent and mark its whole subtree detached.
    ///
    /// The slots stay in the arena; only the tree forgets them.
    pub fn remove(&mut self, node_id: NodeId) -> Result<()> {
        let parent_id = self.get(node_id)?.parent_id.ok_or(DomError::NoParent(node_id))?;

        self.get_mut(parent_id)?
            .children_ids
            .retain(|child| *child != node_id);
        self.get_mut(node_id)?.parent_id = None;
        self.set_subtree_detached(node_id, true)
    }

    /// Move `node_id` so that it immediately precedes `reference_id` under
    /// the reference's parent. Every other sibling keeps its relative order.
    pub fn insert_before(&mut self, node_id: NodeId, reference_id: NodeId) -> Result<()> {
        if node_id == reference_id {
            return Ok(());
        }

        let reference = self.get(reference_id)?;
        let parent_id = reference.parent_id.ok_or(DomError::NoParent(reference_id))?;
        let detached = reference.detached;

        if self.contains(node_id, reference_id) {
            return Err(DomError::HierarchyRequest {
                node: node_id,
                reference: reference_id,
            });
        }

        if let Some(old_parent) = self.get(node_id)?.parent_id {
            self.get_mut(old_parent)?
                .children_ids
                .retain(|child| *child != node_id);
        }

        let parent = self.get_mut(parent_id)?;
        let pos = parent
            .children_ids
            .iter()
            .position(|&id| id == reference_id)
            .ok_or(DomError::NodeNotFound(reference_id))?;
        parent.children_ids.insert(pos, node_id);

        self.get_mut(node_id)?.parent_id = Some(parent_id);
        self.set_subtree_detached(node_id, detached)
    }

    fn set_subtree_detached(&mut self, node_id: NodeId, detached: bool) -> Result<()> {
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            let node = self.get_mut(id)?;
            node.detached = detached;
            stack.extend(node.children_ids.iter().copied());
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Find attached nodes matching predicate, in document order.
    ///
    /// Returns a snapshot: mutating the tree afterwards does not change it.
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let Some(root_id) = self.root_id else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let _ = self.traverse_df(root_id, |node| {
            if !node.detached && predicate(node) {
                out.push(node.node_id);
            }
            Ok(())
        });
        out
    }

    /// Find first attached node matching predicate
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.find(predicate).into_iter().next()
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`DomArena::ancestors`]
pub struct Ancestors<'a> {
    arena: &'a DomArena,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self
            .arena
            .nodes
            .get(current as usize)
            .and_then(|n| n.parent_id);
        Some(current)
    }
}
