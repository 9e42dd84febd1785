//! Shared test documents shaped like the weekly menu page

use crate::arena::DomArena;
use crate::types::{NodeId, PriceCategory};

pub(crate) enum PriceRow {
    /// `<div><dt>label</dt><dd class="price-…">value</dd></div>`
    Wrapped(PriceCategory, &'static str),
    /// `<dd class="price-…">value</dd>` straight under the list
    Bare(PriceCategory, &'static str),
}

pub(crate) struct MenuIds {
    pub day_plan: NodeId,
    pub header: NodeId,
    pub toggle: NodeId,
    pub section: NodeId,
    pub item: NodeId,
    pub note: NodeId,
    pub price_list: NodeId,
}

fn label(category: PriceCategory) -> &'static str {
    match category {
        PriceCategory::Staff => "Mitarbeiter",
        PriceCategory::Student => "Studierende",
        PriceCategory::Guest => "Gäste",
    }
}

/// Today's tab (visible) with one collapsed dish, plus tomorrow's tab
/// hidden by inline style.
pub(crate) fn menu_page(rows: &[PriceRow]) -> (DomArena, MenuIds) {
    let mut arena = DomArena::new();
    let doc = arena.create_document();
    let html = arena.append_element(doc, "html", &[]).unwrap();
    let body = arena.append_element(html, "body", &[]).unwrap();
    let tabs = arena
        .append_element(body, "div", &[("id", "tabsWeekdaysMenu")])
        .unwrap();

    let day_plan = arena
        .append_element(tabs, "div", &[("class", "menu-tagesplan"), ("style", "display: block")])
        .unwrap();
    let header = arena
        .append_element(day_plan, "h2", &[("id", "accordion-collapse-heading-1")])
        .unwrap();
    let toggle = arena
        .append_element(
            header,
            "button",
            &[
                ("data-accordion-target", "#accordion-collapse-body-1"),
                ("aria-expanded", "false"),
            ],
        )
        .unwrap();
    arena.append_text(toggle, "Mittagessen").unwrap();

    let section = arena
        .append_element(
            day_plan,
            "div",
            &[("id", "accordion-collapse-body-1"), ("class", "hidden p-5")],
        )
        .unwrap();
    let item = arena
        .append_element(section, "div", &[("class", "rounded menu-highlight")])
        .unwrap();
    let title = arena.append_element(item, "h3", &[]).unwrap();
    arena.append_text(title, "Pasta mit Tomatensoße").unwrap();
    let note = arena
        .append_element(item, "small", &[("class", "allergen-note")])
        .unwrap();
    arena.append_text(note, "enthält Allergene: Gluten").unwrap();

    let price_list = arena.append_element(item, "dl", &[]).unwrap();
    for row in rows {
        match row {
            PriceRow::Wrapped(category, value) => {
                let wrapper = arena.append_element(price_list, "div", &[]).unwrap();
                let dt = arena.append_element(wrapper, "dt", &[]).unwrap();
                arena.append_text(dt, label(*category)).unwrap();
                let dd = arena
                    .append_element(wrapper, "dd", &[("class", category.class_token())])
                    .unwrap();
                arena.append_text(dd, value).unwrap();
            }
            PriceRow::Bare(category, value) => {
                let dd = arena
                    .append_element(price_list, "dd", &[("class", category.class_token())])
                    .unwrap();
                arena.append_text(dd, value).unwrap();
            }
        }
    }

    let tomorrow = arena
        .append_element(tabs, "div", &[("class", "menu-tagesplan"), ("style", "display: none;")])
        .unwrap();
    arena.append_text(tomorrow, "Linseneintopf").unwrap();

    let ids = MenuIds {
        day_plan,
        header,
        toggle,
        section,
        item,
        note,
        price_list,
    };
    (arena, ids)
}
