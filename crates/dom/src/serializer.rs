//! DOM Serializer - turn a (normalized) subtree back into output
//!
//! Two shapes:
//! - HTML, for handing the canonical markup to a renderer
//! - display text, one line per block, for chat messages

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils;

const VOID_ELEMENTS: &[&str] = &[
    "AREA", "BASE", "BR", "COL", "EMBED", "HR", "IMG", "INPUT", "LINK", "META", "SOURCE", "TRACK",
    "WBR",
];

const BLOCK_ELEMENTS: &[&str] = &[
    "ADDRESS", "ARTICLE", "ASIDE", "BLOCKQUOTE", "BODY", "DIV", "DL", "FIGURE", "FOOTER", "FORM",
    "H1", "H2", "H3", "H4", "H5", "H6", "HEADER", "HTML", "LI", "MAIN", "NAV", "OL", "P", "PRE",
    "SECTION", "TABLE", "TR", "UL",
];

const SKIPPED_ELEMENTS: &[&str] = &["SCRIPT", "STYLE", "NOSCRIPT", "TEMPLATE"];

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Leave collapsed (`hidden`) and `display: none` elements out of text
    pub skip_hidden: bool,
    /// Truncate each text line to this many characters
    pub max_line_length: Option<usize>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            max_line_length: None,
        }
    }
}

/// DOM Tree Serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Outer HTML of the subtree at `node_id`
    pub fn to_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(4096);
        self.html_node(arena, node_id, &mut output)?;
        Ok(output)
    }

    fn html_node(&self, arena: &DomArena, node_id: NodeId, output: &mut String) -> Result<()> {
        let node = arena.get(node_id)?;

        match node.node_type {
            NodeType::Element => {
                let tag = node.node_name.to_ascii_lowercase();
                output.push('<');
                output.push_str(&tag);

                let mut attributes: Vec<(&String, &String)> = node.attributes.iter().collect();
                attributes.sort();
                for (name, value) in attributes {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    output.push_str(&escape_attr(value));
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.iter().any(|v| node.has_tag(v)) {
                    return Ok(());
                }

                for &child_id in &node.children_ids {
                    self.html_node(arena, child_id, output)?;
                }

                output.push_str("</");
                output.push_str(&tag);
                output.push('>');
            }
            NodeType::Text => output.push_str(&escape_text(&node.node_value)),
            NodeType::Comment => {
                output.push_str("<!--");
                output.push_str(&node.node_value);
                output.push_str("-->");
            }
            NodeType::DocumentType => output.push_str("<!DOCTYPE html>"),
            NodeType::Document | NodeType::DocumentFragment => {
                for &child_id in &node.children_ids {
                    self.html_node(arena, child_id, output)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Display text of the subtree at `node_id`, one line per block
    pub fn to_text(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut lines = LineBuilder::default();
        self.text_node(arena, node_id, &mut lines)?;
        lines.break_line();

        let out: Vec<String> = match self.config.max_line_length {
            Some(max) => lines.lines.iter().map(|l| cap_line(l, max)).collect(),
            None => lines.lines,
        };
        Ok(out.join("\n"))
    }

    fn text_node(&self, arena: &DomArena, node_id: NodeId, lines: &mut LineBuilder) -> Result<()> {
        let node = arena.get(node_id)?;
        if node.detached {
            return Ok(());
        }

        match node.node_type {
            NodeType::Text => lines.push(&node.node_value),
            NodeType::Element => {
                if SKIPPED_ELEMENTS.iter().any(|t| node.has_tag(t)) {
                    return Ok(());
                }
                if self.config.skip_hidden && (node.is_hidden() || utils::is_hidden_by_style(node)) {
                    return Ok(());
                }
                if node.has_tag("BR") {
                    lines.break_line();
                    return Ok(());
                }

                let block = BLOCK_ELEMENTS.iter().any(|t| node.has_tag(t));
                if block {
                    lines.break_line();
                }
                for &child_id in &node.children_ids {
                    self.text_node(arena, child_id, lines)?;
                }
                if block {
                    lines.break_line();
                }
            }
            NodeType::Document | NodeType::DocumentFragment => {
                for &child_id in &node.children_ids {
                    self.text_node(arena, child_id, lines)?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<String>,
    current: String,
}

impl LineBuilder {
    fn push(&mut self, raw: &str) {
        let text = utils::collapse_whitespace(raw);
        if text.is_empty() {
            return;
        }
        // Adjacent inline runs (dt/dd, b/i) are always space-separated
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
        self.current.push_str(&text);
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }
}

fn cap_line(line: &str, max_len: usize) -> String {
    match line.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, PriceRow};
    use crate::normalizer::normalize;
    use crate::service::DomService;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_cdp_document() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "nodeValue": "",
                "children": [{
                    "nodeId": 2,
                    "backendNodeId": 2,
                    "nodeType": 1,
                    "nodeName": "P",
                    "nodeValue": "",
                    "attributes": ["title", "a \"b\"", "class", "x"],
                    "children": [{
                        "nodeId": 3,
                        "backendNodeId": 3,
                        "nodeType": 3,
                        "nodeName": "#text",
                        "nodeValue": "Reis & Curry <vegan>"
                    }]
                }]
            }
        });

        let mut service = DomService::new();
        let root = service.parse_cdp_dom_tree(&cdp_json).unwrap();

        let output = DomSerializer::new().to_html(service.arena(), root).unwrap();
        assert_eq!(
            output,
            r#"<p class="x" title="a &quot;b&quot;">Reis &amp; Curry &lt;vegan&gt;</p>"#
        );
    }

    #[test]
    fn test_void_elements() {
        let mut arena = DomArena::new();
        let doc = arena.create_document();
        let p = arena.append_element(doc, "p", &[]).unwrap();
        arena.append_text(p, "a").unwrap();
        arena.append_element(p, "br", &[]).unwrap();
        arena.append_text(p, "b").unwrap();

        let serializer = DomSerializer::new();
        assert_eq!(serializer.to_html(&arena, doc).unwrap(), "<p>a<br>b</p>");
        assert_eq!(serializer.to_text(&arena, doc).unwrap(), "a\nb");
    }

    #[test]
    fn test_text_of_normalized_day_plan() {
        let (mut arena, ids) = fixtures::menu_page(&[
            PriceRow::Wrapped(PriceCategory::Guest, "6,50 €"),
            PriceRow::Wrapped(PriceCategory::Student, "3,50 €"),
            PriceRow::Wrapped(PriceCategory::Staff, "5,00 €"),
        ]);
        let serializer = DomSerializer::new();

        // Collapsed section: only the header shows
        assert_eq!(serializer.to_text(&arena, ids.day_plan).unwrap(), "Mittagessen");

        normalize(&mut arena).unwrap();

        assert_eq!(
            serializer.to_text(&arena, ids.day_plan).unwrap(),
            "Pasta mit Tomatensoße\nMitarbeiter 5,00 €\nStudierende 3,50 €"
        );
        assert!(!serializer
            .to_html(&arena, ids.item)
            .unwrap()
            .contains("allergen-note"));
        assert!(arena.get(ids.note).unwrap().detached);
        assert!(arena.get(ids.header).unwrap().detached);
    }

    #[test]
    fn test_hidden_kept_when_configured() {
        let (arena, ids) =
            fixtures::menu_page(&[PriceRow::Wrapped(PriceCategory::Student, "3,50 €")]);
        let serializer = DomSerializer::with_config(SerializerConfig {
            skip_hidden: false,
            max_line_length: Some(5),
        });

        let text = serializer.to_text(&arena, ids.day_plan).unwrap();
        assert_eq!(text.lines().next(), Some("Mitta..."));
        assert!(text.contains("Pasta..."));
    }

    #[test]
    fn test_inline_spacing() {
        let mut arena = DomArena::new();
        let doc = arena.create_document();
        let p = arena.append_element(doc, "p", &[]).unwrap();
        arena.append_text(p, "Tofu ").unwrap();
        let b = arena.append_element(p, "b", &[]).unwrap();
        arena.append_text(b, "vegan").unwrap();
        let i = arena.append_element(p, "i", &[]).unwrap();
        arena.append_text(i, "(bio)").unwrap();
        arena.append_element(p, "script", &[]).unwrap();

        let text = DomSerializer::new().to_text(&arena, doc).unwrap();
        assert_eq!(text, "Tofu vegan (bio)");
    }
}
