//! Locating today's menu on the weekly page
//!
//! The page renders one `menu-tagesplan` tab per weekday under
//! `#tabsWeekdaysMenu` and hides all but the current one with an inline
//! `display: none`. Holidays keep the tab but only show a notice.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{markers, NodeId};
use crate::utils;

/// First weekday tab that is not hidden by inline style
pub fn visible_day_plan(arena: &DomArena) -> Option<NodeId> {
    let tabs = arena.find_by_id(markers::WEEKDAY_TABS_ID)?;
    arena
        .find_within(tabs, |node| {
            node.has_class(markers::DAY_PLAN_CLASS) && !utils::is_hidden_by_style(node)
        })
        .ok()?
        .into_iter()
        .next()
}

/// Today's tab, unless it announces that the canteen is closed
pub fn is_menu_available(arena: &DomArena) -> Result<Option<NodeId>> {
    let Some(day_plan) = visible_day_plan(arena) else {
        return Ok(None);
    };

    let text = utils::get_text_content(arena, day_plan)?.to_lowercase();
    if text.contains(markers::NO_SERVICE_PHRASE) {
        return Ok(None);
    }

    Ok(Some(day_plan))
}
