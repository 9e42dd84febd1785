//! DOM Service - Main entry point for DOM operations
//!
//! This handles:
//! - CDP integration (parsing `DOM.getDocument` responses)
//! - DOM tree construction from CDP data
//! - Running the menu normalizer over the imported tree

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::normalizer::{self, NormalizeReport};
use crate::types::*;
use serde_json::Value;
use std::collections::HashMap;

/// Main DOM service
pub struct DomService {
    arena: DomArena,
}

impl DomService {
    pub fn new() -> Self {
        Self {
            arena: DomArena::new(),
        }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Hand the arena over to the caller
    pub fn into_arena(self) -> DomArena {
        self.arena
    }

    /// Parse CDP DOM tree response and build arena
    ///
    /// Input format matches CDP's DOM.getDocument response:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        self.arena.clear();
        let root_id = self.parse_node(root, None)?;
        self.arena.set_root(root_id)?;

        Ok(root_id)
    }

    /// Same as [`parse_cdp_dom_tree`](Self::parse_cdp_dom_tree), from raw JSON text
    pub fn parse_cdp_json(&mut self, json: &str) -> Result<NodeId> {
        let value: Value = serde_json::from_str(json)?;
        self.parse_cdp_dom_tree(&value)
    }

    /// Normalize the imported document in place
    pub fn normalize(&mut self) -> Result<NormalizeReport> {
        normalizer::normalize(&mut self.arena)
    }

    /// Recursively parse a CDP node
    fn parse_node(&mut self, cdp_node: &Value, parent_id: Option<NodeId>) -> Result<NodeId> {
        let backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing backendNodeId".to_string()))?
            as u32;

        // Only validated: arena indices replace CDP node ids
        cdp_node["nodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeId".to_string()))?;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("").to_string();
        let node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

        // Attributes arrive as a flat [name, value, name, value, ...] list
        let mut attributes = HashMap::new();
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    attributes.insert(key.to_string(), value.to_string());
                }
            }
        }

        let mut node = DomNode::new(0, backend_node_id, node_type, node_name);
        node.node_value = node_value;
        node.attributes = attributes;
        node.parent_id = parent_id;

        // Role is classified here, with attributes in place
        let current_node_id = self.arena.add_node(node);

        let mut child_ids = smallvec::SmallVec::new();
        if let Some(children) = cdp_node["children"].as_array() {
            for child in children {
                child_ids.push(self.parse_node(child, Some(current_node_id))?);
            }
        }

        // Iframe documents hang under their frame owner
        if let Some(content_doc) = cdp_node.get("contentDocument") {
            child_ids.push(self.parse_node(content_doc, Some(current_node_id))?);
        }

        self.arena.get_mut(current_node_id)?.children_ids = child_ids;

        Ok(current_node_id)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}
