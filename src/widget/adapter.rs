//! Per-kind create/update adapters.
//!
//! `create` builds a fully-initialized widget from a property bag in one
//! pass. `update` applies a partial change set, touching only the keys it
//! names, and reports how many properties actually changed.

use tracing::trace;

use super::controls;
use super::element::{KindState, Widget};
use super::kind::WidgetKind;
use super::props::{changes_from, BorderStyle, PropBag, PropChanges, Theme, WidgetStyle};
use crate::dom::InlineStyle;
use crate::error::AdapterError;

/// A validated property change.
#[derive(Debug, Clone, PartialEq)]
enum Prop {
    Style(WidgetStyle, bool),
    Display(Option<bool>),
    Content(String),
    Label(Option<String>),
    Hidden(bool),
    Disabled(bool),
    Focusable(Option<bool>),
    TabIndex(Option<i32>),
    Checked(bool),
    Indeterminate(bool),
    Items(Vec<String>),
    Selected(usize),
    Value(String),
    Placeholder(String),
    Open(bool),
    Extra(String, Option<String>),
}

/// Build a widget of `kind` from `props`.
pub fn create(kind: WidgetKind, props: &PropBag, theme: &Theme) -> Result<Widget, AdapterError> {
    let mut widget = Widget::new(kind);
    apply(&mut widget, &changes_from(props))?;
    refresh(&mut widget, theme);
    trace!(kind = %kind, props = props.len(), "widget created");
    Ok(widget)
}

/// Apply a partial change set. Every change is validated before any is
/// applied, so a rejected bag leaves the widget untouched.
pub fn update(widget: &mut Widget, changes: &PropChanges, theme: &Theme) -> Result<usize, AdapterError> {
    let changed = apply(widget, changes)?;
    if changed > 0 {
        refresh(widget, theme);
    }
    Ok(changed)
}

/// Record a focus change and re-render. Returns `true` if the state changed.
pub fn set_focused(widget: &mut Widget, focused: bool, theme: &Theme) -> bool {
    if widget.common.focused == focused {
        return false;
    }
    widget.common.focused = focused;
    refresh(widget, theme);
    true
}

/// Change set that turns `applied` into `next`: differing keys are set,
/// keys missing from `next` are removed.
pub fn diff(applied: &PropBag, next: &PropBag) -> PropChanges {
    let mut changes = PropChanges::new();
    for (key, value) in next {
        if applied.get(key) != Some(value) {
            changes.insert(key.clone(), Some(value.clone()));
        }
    }
    for key in applied.keys() {
        if !next.contains_key(key) {
            changes.insert(key.clone(), None);
        }
    }
    changes
}

/// Recompute the merged style and the rendered text.
pub fn refresh(widget: &mut Widget, theme: &Theme) {
    let mut style = default_style(widget.kind)
        .merged(&theme.base_style())
        .merged(&widget.common.explicit_style);
    if let Some(BorderStyle::Line { fg }) = style.border.as_mut() {
        if fg.is_none() {
            *fg = Some(theme.border_fg.clone());
        }
    }
    if widget.common.focused {
        style = style.merged(&theme.focus_style());
    }
    if widget.common.disabled {
        style = style.merged(&theme.disabled_style());
    }
    widget.common.style = style;
    widget.rendered = controls::render(widget);
}

/// Built-in style per kind, the lowest layer of the merge.
fn default_style(kind: WidgetKind) -> WidgetStyle {
    match kind {
        WidgetKind::Button => WidgetStyle { bold: Some(true), ..WidgetStyle::default() },
        WidgetKind::Input => WidgetStyle { underline: Some(true), ..WidgetStyle::default() },
        _ => WidgetStyle::default(),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn apply(widget: &mut Widget, changes: &PropChanges) -> Result<usize, AdapterError> {
    let parsed = changes
        .iter()
        .map(|(key, value)| parse(widget.kind, key, value.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parsed.into_iter().map(|prop| apply_one(widget, prop)).filter(|&changed| changed).count())
}

fn parse(kind: WidgetKind, key: &str, value: Option<&str>) -> Result<Prop, AdapterError> {
    let prop = match key {
        "style" => {
            let inline = InlineStyle::parse(value.unwrap_or(""));
            let display_none = inline.get("display") == Some("none");
            Prop::Style(inline.widget_style(), display_none)
        }
        "display" => Prop::Display(value.map(|v| v.trim() == "none")),
        "content" => Prop::Content(value.unwrap_or("").to_owned()),
        "hidden" => Prop::Hidden(parse_bool(key, value)?),
        "disabled" => Prop::Disabled(parse_bool(key, value)?),
        "focusable" => Prop::Focusable(value.map(|v| parse_bool(key, Some(v))).transpose()?),
        "tabindex" => Prop::TabIndex(value.map(|v| parse_int(key, v)).transpose()?),
        "label" if matches!(kind, WidgetKind::Button | WidgetKind::Checkbox) => {
            Prop::Label(value.map(str::to_owned))
        }
        "checked" if kind == WidgetKind::Checkbox => Prop::Checked(parse_bool(key, value)?),
        "indeterminate" if kind == WidgetKind::Checkbox => Prop::Indeterminate(parse_bool(key, value)?),
        "items" | "options" if matches!(kind, WidgetKind::List | WidgetKind::Select) => {
            Prop::Items(parse_list(value.unwrap_or("")))
        }
        "selected" if matches!(kind, WidgetKind::List | WidgetKind::Select) => match value {
            Some(v) => {
                let index = parse_int(key, v)?;
                if index < 0 {
                    return Err(invalid(key, v, "expected a non-negative index"));
                }
                Prop::Selected(index as usize)
            }
            None => Prop::Selected(0),
        },
        "value" if kind == WidgetKind::Input => Prop::Value(value.unwrap_or("").to_owned()),
        "placeholder" if kind == WidgetKind::Input => Prop::Placeholder(value.unwrap_or("").to_owned()),
        "open" if kind == WidgetKind::Select => Prop::Open(parse_bool(key, value)?),
        _ => Prop::Extra(key.to_owned(), value.map(str::to_owned)),
    };
    Ok(prop)
}

/// `""`, `true`, `1` and the key itself are true; `false` and `0` are
/// false; a removed key is false.
fn parse_bool(key: &str, value: Option<&str>) -> Result<bool, AdapterError> {
    match value {
        None => Ok(false),
        Some("" | "true" | "1") => Ok(true),
        Some(v) if v == key => Ok(true),
        Some("false" | "0") => Ok(false),
        Some(v) => Err(invalid(key, v, "expected a boolean")),
    }
}

fn parse_int(key: &str, value: &str) -> Result<i32, AdapterError> {
    value.trim().parse().map_err(|_| invalid(key, value, "expected an integer"))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn invalid(key: &str, value: &str, reason: &'static str) -> AdapterError {
    AdapterError::InvalidProp {
        key: key.to_owned(),
        value: value.to_owned(),
        reason,
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Apply one change. Returns whether anything observable changed.
fn apply_one(widget: &mut Widget, prop: Prop) -> bool {
    let kind = widget.kind;
    let common = &mut widget.common;
    match (prop, &mut widget.state) {
        (Prop::Style(style, display_none), _) => {
            let a = set(&mut common.explicit_style, style);
            common.style_display_none = display_none;
            let effective = common.attr_display_none.unwrap_or(display_none);
            let b = set(&mut common.display_none, effective);
            a || b
        }
        (Prop::Display(none), _) => {
            common.attr_display_none = none;
            let effective = none.unwrap_or(common.style_display_none);
            set(&mut common.display_none, effective)
        }
        (Prop::Content(content), _) => set(&mut common.content, content),
        (Prop::Hidden(hidden), _) => set(&mut common.hidden, hidden),
        (Prop::Disabled(disabled), _) => set(&mut common.disabled, disabled),
        (Prop::Focusable(focusable), _) => {
            set(&mut common.focusable, focusable.unwrap_or_else(|| kind.focusable_by_default()))
        }
        (Prop::TabIndex(index), _) => set(&mut common.tab_index, index),
        (Prop::Label(value), KindState::Button { label } | KindState::Checkbox { label, .. }) => {
            set(label, value)
        }
        (Prop::Checked(value), KindState::Checkbox { checked, .. }) => set(checked, value),
        (Prop::Indeterminate(value), KindState::Checkbox { indeterminate, .. }) => {
            set(indeterminate, value)
        }
        (Prop::Items(values), KindState::List { items, selected })
        | (Prop::Items(values), KindState::Select { options: items, selected, .. }) => {
            let clamped = (*selected).min(values.len().saturating_sub(1));
            let a = set(selected, clamped);
            let b = set(items, values);
            a || b
        }
        (Prop::Selected(index), KindState::List { items, selected })
        | (Prop::Selected(index), KindState::Select { options: items, selected, .. }) => {
            set(selected, index.min(items.len().saturating_sub(1)))
        }
        (Prop::Value(v), KindState::Input { value, .. }) => set(value, v),
        (Prop::Placeholder(v), KindState::Input { placeholder, .. }) => set(placeholder, v),
        (Prop::Open(v), KindState::Select { open, .. }) => set(open, v),
        (Prop::Extra(key, Some(value)), _) => widget.extra.insert(key, value.clone()).as_ref() != Some(&value),
        (Prop::Extra(key, None), _) => widget.extra.remove(&key).is_some(),
        // Parsing routes kind-specific keys only to matching kinds.
        (_, _) => false,
    }
}
