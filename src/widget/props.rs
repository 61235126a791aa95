//! Property bags, widget styles and the theme.

use std::collections::BTreeMap;

use crate::geometry::Spacing;

/// Generic property bag, as produced from element attributes.
pub type PropBag = BTreeMap<String, String>;

/// Partial update: `Some` sets a key, `None` removes it. Keys absent from the
/// map are left untouched.
pub type PropChanges = BTreeMap<String, Option<String>>;

/// Build a full-replacement change set from a bag.
pub fn changes_from(bag: &PropBag) -> PropChanges {
    bag.iter().map(|(k, v)| (k.clone(), Some(v.clone()))).collect()
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// Border of a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Line { fg: Option<String> },
}

/// Visual style of a widget. `None` fields are unset and fall through to the
/// layer below when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetStyle {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: Option<bool>,
    pub underline: Option<bool>,
    pub italic: Option<bool>,
    pub invisible: Option<bool>,
    pub border: Option<BorderStyle>,
}

impl WidgetStyle {
    /// Overlay `over` on top of `self`: every field set in `over` wins.
    pub fn merged(&self, over: &WidgetStyle) -> WidgetStyle {
        WidgetStyle {
            fg: over.fg.clone().or_else(|| self.fg.clone()),
            bg: over.bg.clone().or_else(|| self.bg.clone()),
            bold: over.bold.or(self.bold),
            underline: over.underline.or(self.underline),
            italic: over.italic.or(self.italic),
            invisible: over.invisible.or(self.invisible),
            border: over.border.clone().or_else(|| self.border.clone()),
        }
    }

    pub fn has_border(&self) -> bool {
        matches!(self.border, Some(BorderStyle::Line { .. }))
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Colors derived from the active theme. Parsing theme files is left to the
/// embedding application; this is the already-resolved palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub focus_fg: String,
    pub focus_bg: String,
    pub disabled_fg: String,
    pub border_fg: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: None,
            bg: None,
            focus_fg: "black".into(),
            focus_bg: "cyan".into(),
            disabled_fg: "dark_grey".into(),
            border_fg: "grey".into(),
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fg(mut self, fg: impl Into<String>) -> Self {
        self.fg = Some(fg.into());
        self
    }

    pub fn with_bg(mut self, bg: impl Into<String>) -> Self {
        self.bg = Some(bg.into());
        self
    }

    pub fn with_focus(mut self, fg: impl Into<String>, bg: impl Into<String>) -> Self {
        self.focus_fg = fg.into();
        self.focus_bg = bg.into();
        self
    }

    /// The theme layer of the style merge.
    pub fn base_style(&self) -> WidgetStyle {
        WidgetStyle {
            fg: self.fg.clone(),
            bg: self.bg.clone(),
            ..WidgetStyle::default()
        }
    }

    /// Override applied while a widget holds focus.
    pub fn focus_style(&self) -> WidgetStyle {
        WidgetStyle {
            fg: Some(self.focus_fg.clone()),
            bg: Some(self.focus_bg.clone()),
            ..WidgetStyle::default()
        }
    }

    /// Override applied while a widget is disabled.
    pub fn disabled_style(&self) -> WidgetStyle {
        WidgetStyle {
            fg: Some(self.disabled_fg.clone()),
            ..WidgetStyle::default()
        }
    }
}

// ---------------------------------------------------------------------------
// CommonProps
// ---------------------------------------------------------------------------

/// Properties every widget kind carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonProps {
    /// Absolute column, written back by the layout bridge.
    pub left: i32,
    /// Absolute row, written back by the layout bridge.
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// Whether layout has ever assigned geometry.
    pub placed: bool,
    /// Border plus padding, written back with the geometry.
    pub inset: Spacing,
    /// Rendered text content (folded text children or virtual-control output).
    pub content: String,
    /// Explicit per-element style from the `style` attribute.
    pub explicit_style: WidgetStyle,
    /// Fully merged style; recomputed whenever a layer changes.
    pub style: WidgetStyle,
    pub hidden: bool,
    /// Effective `display: none`: the `display` attribute when set, else the
    /// inline style.
    pub display_none: bool,
    /// `display` attribute: `Some(true)` for `none`, `None` when absent.
    pub attr_display_none: Option<bool>,
    /// `display: none` in the inline style.
    pub style_display_none: bool,
    pub disabled: bool,
    pub focusable: bool,
    pub focused: bool,
    /// Explicit tab-order hint.
    pub tab_index: Option<i32>,
}
