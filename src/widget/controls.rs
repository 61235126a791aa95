//! Virtual controls: text rendering for every kind, plus the built-in
//! checkbox/select/list/input interactions.
//!
//! The backend only paints text inside a rectangle, so checkboxes, selects
//! and lists draw their own state glyphs into [`Widget::rendered`].

use super::element::{KindState, Widget};

pub const CHECKED: &str = "[x]";
pub const UNCHECKED: &str = "[ ]";
pub const INDETERMINATE: &str = "[-]";

/// Recompute the painted text of a widget from its current state.
pub fn render(widget: &Widget) -> String {
    let content = &widget.common.content;
    match &widget.state {
        KindState::Box | KindState::Text => content.clone(),
        KindState::Button { label } => label.clone().unwrap_or_else(|| content.clone()),
        KindState::Checkbox { checked, indeterminate, label } => {
            let glyph = if *indeterminate {
                INDETERMINATE
            } else if *checked {
                CHECKED
            } else {
                UNCHECKED
            };
            let label = label.as_deref().unwrap_or(content);
            if label.is_empty() {
                glyph.to_owned()
            } else {
                format!("{glyph} {label}")
            }
        }
        KindState::Select { options, selected, open } => {
            let current = options.get(*selected).map(String::as_str).unwrap_or("");
            if *open {
                marked_lines(options, *selected)
            } else {
                format!("‹{current}› ▾")
            }
        }
        KindState::List { items, selected } => marked_lines(items, *selected),
        KindState::Input { value, placeholder } => {
            if value.is_empty() && !widget.common.focused {
                placeholder.clone()
            } else {
                value.clone()
            }
        }
    }
}

fn marked_lines(items: &[String], selected: usize) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| if i == selected { format!("> {item}") } else { format!("  {item}") })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

/// Toggle a checkbox. An indeterminate box becomes checked. Returns the new
/// checked state, or `None` if the widget is not a checkbox.
pub fn toggle_checkbox(widget: &mut Widget) -> Option<bool> {
    let KindState::Checkbox { checked, indeterminate, .. } = &mut widget.state else {
        return None;
    };
    *checked = if *indeterminate { true } else { !*checked };
    *indeterminate = false;
    let now = *checked;
    widget.rendered = render(widget);
    Some(now)
}

/// Open or close a select. Returns the new open state.
pub fn toggle_open(widget: &mut Widget) -> Option<bool> {
    let KindState::Select { open, .. } = &mut widget.state else {
        return None;
    };
    *open = !*open;
    let now = *open;
    widget.rendered = render(widget);
    Some(now)
}

/// Move the selection of a list or select by `delta`, clamped to the item
/// range. Returns the new index when it changed.
pub fn move_selection(widget: &mut Widget, delta: i32) -> Option<usize> {
    let (len, selected) = match &mut widget.state {
        KindState::List { items, selected } => (items.len(), selected),
        KindState::Select { options, selected, .. } => (options.len(), selected),
        _ => return None,
    };
    if len == 0 {
        return None;
    }
    let target = (*selected as i64 + delta as i64).clamp(0, len as i64 - 1) as usize;
    if target == *selected {
        return None;
    }
    *selected = target;
    widget.rendered = render(widget);
    Some(target)
}

/// Select an item of a list or select by index. Returns the index when it
/// changed.
pub fn select_index(widget: &mut Widget, index: usize) -> Option<usize> {
    let current = match &widget.state {
        KindState::List { selected, .. } | KindState::Select { selected, .. } => *selected,
        _ => return None,
    };
    move_selection(widget, index as i32 - current as i32)
}

/// Edit an input's value: `Some(ch)` appends, `None` deletes the last
/// character. Returns the new value when it changed.
pub fn edit_input(widget: &mut Widget, ch: Option<char>) -> Option<String> {
    let KindState::Input { value, .. } = &mut widget.state else {
        return None;
    };
    match ch {
        Some(c) => value.push(c),
        None => {
            value.pop()?;
        }
    }
    let now = value.clone();
    widget.rendered = render(widget);
    Some(now)
}

/// The value reported with `change`/`select` events.
pub fn current_value(widget: &Widget) -> String {
    match &widget.state {
        KindState::Checkbox { checked, .. } => checked.to_string(),
        KindState::Select { options, selected, .. } => options.get(*selected).cloned().unwrap_or_default(),
        KindState::List { items, selected } => items.get(*selected).cloned().unwrap_or_default(),
        KindState::Input { value, .. } => value.clone(),
        KindState::Button { .. } | KindState::Box | KindState::Text => widget.common.content.clone(),
    }
}
