//! Widget kinds and tag-name resolution.

use std::fmt;

/// The widget primitives the adapters know how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Box,
    Text,
    List,
    Input,
    Button,
    Checkbox,
    Select,
}

impl WidgetKind {
    /// Resolve a tag name. Unknown tags fall back to [`WidgetKind::Box`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" | "span" | "p" | "label" => WidgetKind::Text,
            "list" | "ul" | "ol" => WidgetKind::List,
            "input" | "textbox" | "textarea" => WidgetKind::Input,
            "button" => WidgetKind::Button,
            "checkbox" => WidgetKind::Checkbox,
            "select" => WidgetKind::Select,
            _ => WidgetKind::Box,
        }
    }

    /// Whether widgets of this kind take focus unless told otherwise.
    pub fn focusable_by_default(self) -> bool {
        matches!(
            self,
            WidgetKind::Input
                | WidgetKind::Button
                | WidgetKind::Checkbox
                | WidgetKind::Select
                | WidgetKind::List
        )
    }

    /// Whether the kind reacts to the mouse even without listeners.
    pub fn interactive_by_default(self) -> bool {
        self.focusable_by_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Box => "box",
            WidgetKind::Text => "text",
            WidgetKind::List => "list",
            WidgetKind::Input => "input",
            WidgetKind::Button => "button",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Select => "select",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
