//! Core type definitions for the menu DOM
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Classify once: every node carries a [`NodeRole`] computed when it
//!    enters the arena, so the rewrite passes never re-parse class strings
//! 3. Use SmallVec for small arrays (avoid heap allocation)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }
}

/// Audience tier of a price entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceCategory {
    Staff,
    Student,
    Guest,
}

impl PriceCategory {
    /// Class token that tags an entry with this category
    pub fn class_token(self) -> &'static str {
        match self {
            PriceCategory::Staff => markers::PRICE_STAFF_CLASS,
            PriceCategory::Student => markers::PRICE_STUDENT_CLASS,
            PriceCategory::Guest => markers::PRICE_GUEST_CLASS,
        }
    }
}

/// What a node means to the menu normalizer.
///
/// One role per node. Precedence when markup carries several markers:
/// header, toggle, price entry, allergen note, menu item, price list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Highlighted row holding one dish
    MenuItem,
    /// Definition list with the price rows of a dish
    PriceList,
    PriceEntry(PriceCategory),
    AllergenNote,
    /// Control pointing at a collapsible section; `target` is the section id
    AccordionToggle { target: String },
    AccordionHeader,
}

/// Fixed markers of the target page. Changing any of these changes which
/// nodes the passes touch on the live site.
pub mod markers {
    pub const MENU_ITEM_CLASS: &str = "menu-highlight";
    pub const PRICE_LIST_TAG: &str = "DL";
    pub const PRICE_STAFF_CLASS: &str = "price-staff";
    pub const PRICE_STUDENT_CLASS: &str = "price-student";
    pub const PRICE_GUEST_CLASS: &str = "price-guest";
    pub const ALLERGEN_NOTE_CLASS: &str = "allergen-note";
    pub const ALLERGEN_MARKER: &str = "enthält Allergene";
    pub const ACCORDION_TARGET_ATTR: &str = "data-accordion-target";
    pub const ACCORDION_HEADER_ID_PREFIX: &str = "accordion-collapse-heading-";
    pub const EXPANDED_ATTR: &str = "aria-expanded";
    pub const HIDDEN_CLASS: &str = "hidden";
    pub const HIDDEN_ATTR: &str = "hidden";
    pub const WEEKDAY_TABS_ID: &str = "tabsWeekdaysMenu";
    pub const DAY_PLAN_CLASS: &str = "menu-tagesplan";
    pub const NO_SERVICE_PHRASE: &str = "heute keine essensausgabe";
}

/// The DOM tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - `detached` instead of freeing: handles held by callers stay valid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    // IDs
    pub node_id: NodeId,
    pub backend_node_id: u32,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,

    pub role: Option<NodeRole>,

    /// Set once the node (or an ancestor) has been removed from the tree
    pub detached: bool,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(node_id: NodeId, backend_node_id: u32, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            backend_node_id,
            node_type,
            node_name,
            node_value: String::new(),
            attributes: HashMap::new(),
            parent_id: None,
            children_ids: SmallVec::new(),
            role: None,
            detached: false,
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Case-insensitive tag comparison (CDP reports HTML tags upper case)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name()
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Whitespace-separated class tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes().any(|c| c == token)
    }

    /// Drop every occurrence of `token` from the class list.
    /// Returns true if anything was removed.
    pub fn remove_class(&mut self, token: &str) -> bool {
        if !self.has_class(token) {
            return false;
        }
        let kept: Vec<&str> = self.classes().filter(|c| *c != token).collect();
        let kept = kept.join(" ");
        if kept.is_empty() {
            self.attributes.remove("class");
        } else {
            self.attributes.insert("class".to_string(), kept);
        }
        true
    }

    /// Collapsed by class token or boolean attribute
    pub fn is_hidden(&self) -> bool {
        self.has_class(markers::HIDDEN_CLASS) || self.attributes.contains_key(markers::HIDDEN_ATTR)
    }

    /// Derive the role from tag and attributes. Called when the node enters
    /// the arena.
    pub fn classify(&self) -> Option<NodeRole> {
        if !self.is_element() {
            return None;
        }

        if self
            .attr("id")
            .and_then(|id| id.strip_prefix(markers::ACCORDION_HEADER_ID_PREFIX))
            .is_some_and(|suffix| !suffix.is_empty())
        {
            return Some(NodeRole::AccordionHeader);
        }

        if let Some(target) = self.attr(markers::ACCORDION_TARGET_ATTR) {
            return Some(NodeRole::AccordionToggle {
                target: target.trim().trim_start_matches('#').to_string(),
            });
        }

        for category in [PriceCategory::Guest, PriceCategory::Staff, PriceCategory::Student] {
            if self.has_class(category.class_token()) {
                return Some(NodeRole::PriceEntry(category));
            }
        }

        if self.has_class(markers::ALLERGEN_NOTE_CLASS) {
            return Some(NodeRole::AllergenNote);
        }

        if self.has_class(markers::MENU_ITEM_CLASS) {
            return Some(NodeRole::MenuItem);
        }

        if self.has_tag(markers::PRICE_LIST_TAG) {
            return Some(NodeRole::PriceList);
        }

        None
    }
}

// Typed predicates used by the passes

pub fn is_menu_item(node: &DomNode) -> bool {
    matches!(node.role, Some(NodeRole::MenuItem))
}

pub fn is_price_list(node: &DomNode) -> bool {
    matches!(node.role, Some(NodeRole::PriceList))
}

pub fn is_price_entry(node: &DomNode, category: PriceCategory) -> bool {
    node.role == Some(NodeRole::PriceEntry(category))
}

pub fn is_guest_price_entry(node: &DomNode) -> bool {
    is_price_entry(node, PriceCategory::Guest)
}

pub fn is_allergen_note(node: &DomNode) -> bool {
    matches!(node.role, Some(NodeRole::AllergenNote))
}

pub fn is_accordion_toggle(node: &DomNode) -> bool {
    matches!(node.role, Some(NodeRole::AccordionToggle { .. }))
}

pub fn is_accordion_header(node: &DomNode) -> bool {
    matches!(node.role, Some(NodeRole::AccordionHeader))
}
