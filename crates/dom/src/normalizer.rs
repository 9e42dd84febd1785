//! Menu Normalizer - rewrites a rendered menu page into canonical form
//!
//! Five passes, always in this order:
//!
//! ```text
//! expand accordions → strip guest prices → strip allergen notes
//!                   → strip accordion headers → reorder prices
//! ```
//!
//! Later passes rely on earlier ones: headers are only dropped once their
//! sections are open, and staff/student positions are only compared after
//! guest rows are gone.
//!
//! Every pass snapshots its targets before mutating (like a static
//! `querySelectorAll` list). Anything the page happens not to have today
//! is skipped and counted in the [`NormalizeReport`], never an error.

use ahash::AHashMap;
use serde::Serialize;
use tracing::debug;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{self, markers, NodeId, NodeRole, NodeType, PriceCategory};
use crate::utils;

/// The rewrite passes, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ExpandAccordions,
    StripGuestPrices,
    StripAllergenNotes,
    StripAccordionHeaders,
    ReorderPrices,
}

impl Pass {
    pub const ALL: [Pass; 5] = [
        Pass::ExpandAccordions,
        Pass::StripGuestPrices,
        Pass::StripAllergenNotes,
        Pass::StripAccordionHeaders,
        Pass::ReorderPrices,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::ExpandAccordions => "expand-accordions",
            Pass::StripGuestPrices => "strip-guest-prices",
            Pass::StripAllergenNotes => "strip-allergen-notes",
            Pass::StripAccordionHeaders => "strip-accordion-headers",
            Pass::ReorderPrices => "reorder-prices",
        }
    }
}

/// What the passes did (and skipped) on one document
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub sections_expanded: usize,
    pub dangling_targets: usize,
    pub guest_rows_removed: usize,
    pub guest_entries_without_row: usize,
    pub allergen_notes_removed: usize,
    pub allergen_notes_kept: usize,
    pub headers_removed: usize,
    pub price_lists_reordered: usize,
    pub items_without_price_list: usize,
}

/// Run all passes over the document in place.
///
/// Fails only when the arena does not hold a usable document, and then
/// before any pass has touched it.
pub fn normalize(arena: &mut DomArena) -> Result<NormalizeReport> {
    check_document(arena)?;

    let mut report = NormalizeReport::default();
    for pass in Pass::ALL {
        run_pass(arena, pass, &mut report)?;
    }

    debug!(?report, "menu document normalized");
    Ok(report)
}

/// Run a single pass. Exposed so callers can inspect intermediate states.
pub fn run_pass(arena: &mut DomArena, pass: Pass, report: &mut NormalizeReport) -> Result<()> {
    match pass {
        Pass::ExpandAccordions => expand_accordions(arena, report),
        Pass::StripGuestPrices => strip_guest_prices(arena, report),
        Pass::StripAllergenNotes => strip_allergen_notes(arena, report),
        Pass::StripAccordionHeaders => strip_accordion_headers(arena, report),
        Pass::ReorderPrices => reorder_prices(arena, report),
    }
}

fn check_document(arena: &DomArena) -> Result<()> {
    let root = arena.root()?;
    if root.node_type != NodeType::Document {
        return Err(DomError::InvalidDocument(format!(
            "root is {:?}, not a document",
            root.node_type
        )));
    }
    Ok(())
}

fn expand_accordions(arena: &mut DomArena, report: &mut NormalizeReport) -> Result<()> {
    let mut sections_by_id: AHashMap<String, NodeId> = AHashMap::new();
    for id in arena.find(|node| node.is_element() && node.attr("id").is_some()) {
        // First element wins, as with getElementById; an empty id never resolves
        match arena.get(id)?.attr("id") {
            Some(element_id) if !element_id.is_empty() => {
                sections_by_id.entry(element_id.to_string()).or_insert(id);
            }
            _ => {}
        }
    }

    for toggle in arena.find(types::is_accordion_toggle) {
        let target = match &arena.get(toggle)?.role {
            Some(NodeRole::AccordionToggle { target }) => target.clone(),
            _ => continue,
        };

        let Some(&section) = sections_by_id.get(&target) else {
            debug!(toggle, target = %target, "accordion target not found");
            report.dangling_targets += 1;
            continue;
        };

        let node = arena.get_mut(section)?;
        node.remove_class(markers::HIDDEN_CLASS);
        node.remove_attr(markers::HIDDEN_ATTR);
        arena.get_mut(toggle)?.set_attr(markers::EXPANDED_ATTR, "true");
        report.sections_expanded += 1;
    }

    Ok(())
}

fn strip_guest_prices(arena: &mut DomArena, report: &mut NormalizeReport) -> Result<()> {
    for entry in arena.find(types::is_guest_price_entry) {
        if arena.get(entry)?.detached {
            continue;
        }

        match price_row(arena, entry) {
            Some(row) => {
                arena.remove(row)?;
                report.guest_rows_removed += 1;
            }
            None => {
                debug!(entry, "guest price entry has no row wrapper, left in place");
                report.guest_entries_without_row += 1;
            }
        }
    }

    Ok(())
}

fn strip_allergen_notes(arena: &mut DomArena, report: &mut NormalizeReport) -> Result<()> {
    for note in arena.find(types::is_allergen_note) {
        if arena.get(note)?.detached {
            continue;
        }

        let text = utils::get_text_content(arena, note)?;
        if text.contains(markers::ALLERGEN_MARKER) {
            arena.remove(note)?;
            report.allergen_notes_removed += 1;
        } else {
            report.allergen_notes_kept += 1;
        }
    }

    Ok(())
}

fn strip_accordion_headers(arena: &mut DomArena, report: &mut NormalizeReport) -> Result<()> {
    for header in arena.find(types::is_accordion_header) {
        if arena.get(header)?.detached {
            continue;
        }
        arena.remove(header)?;
        report.headers_removed += 1;
    }

    Ok(())
}

fn reorder_prices(arena: &mut DomArena, report: &mut NormalizeReport) -> Result<()> {
    for item in arena.find(types::is_menu_item) {
        let lists = arena.find_within(item, types::is_price_list)?;
        if lists.is_empty() {
            debug!(item, "menu item without price list");
            report.items_without_price_list += 1;
            continue;
        }

        // Lists holding no staff/student pair (labels, additives) fall through
        for list in lists {
            let staff = entry_row(arena, list, PriceCategory::Staff)?;
            let student = entry_row(arena, list, PriceCategory::Student)?;

            let (Some(staff_row), Some(student_row)) = (staff, student) else {
                continue;
            };
            if staff_row == student_row {
                continue;
            }

            if arena.previous_element_sibling(student_row) != Some(staff_row) {
                arena.insert_before(staff_row, student_row)?;
                report.price_lists_reordered += 1;
            }
        }
    }

    Ok(())
}

/// Row wrapper of the first entry of `category` belonging to `list`
/// (entries of a nested list belong to that list)
fn entry_row(arena: &DomArena, list: NodeId, category: PriceCategory) -> Result<Option<NodeId>> {
    let entries = arena.find_within(list, |node| types::is_price_entry(node, category))?;
    let owned = entries
        .into_iter()
        .find(|&entry| arena.closest_ancestor(entry, types::is_price_list) == Some(list));
    Ok(owned.and_then(|entry| price_row(arena, entry)))
}

/// The smallest wrapper representing one price line: the ancestor of
/// `entry` that sits directly under the nearest enclosing price list.
///
/// `None` when the entry is itself a direct child of the list, or is not
/// inside a list at all.
pub fn price_row(arena: &DomArena, entry: NodeId) -> Option<NodeId> {
    let mut row = None;
    for id in arena.ancestors(entry) {
        if arena.get(id).is_ok_and(types::is_price_list) {
            return row;
        }
        row = Some(id);
    }
    None
}
