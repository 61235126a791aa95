//! Inline `style` attribute: logos tokenizer and declaration mapping.
//!
//! The attribute is a CSS-like `key: value; key: value` list. Keys are
//! normalized to camelCase (`background-color` becomes `backgroundColor`).
//! Visual keys map onto [`WidgetStyle`]; layout keys are read by the layout
//! bridge from the same declaration map.

use std::collections::BTreeMap;

use logos::Logos;

use crate::widget::props::{BorderStyle, WidgetStyle};

/// Token of the inline style grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum StyleToken {
    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[regex(r#""[^"]*""#)]
    Quoted,

    #[regex(r"'[^']*'")]
    QuotedSingle,

    /// Any run of characters that is not a separator, quote or whitespace.
    #[regex(r#"[^:;\s"']+"#)]
    Word,
}

/// Parsed declarations of one `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: BTreeMap<String, String>,
}

impl InlineStyle {
    /// Parse a declaration list. Malformed declarations (no colon, empty key
    /// or empty value) are dropped; later duplicates win.
    pub fn parse(input: &str) -> Self {
        let mut declarations = BTreeMap::new();
        let mut key: Vec<&str> = Vec::new();
        let mut value: Vec<&str> = Vec::new();
        let mut in_value = false;

        let mut commit = |key: &mut Vec<&str>, value: &mut Vec<&str>, in_value: &mut bool| {
            if *in_value && !key.is_empty() && !value.is_empty() {
                declarations.insert(camel_case(&key.join("-")), value.join(" "));
            }
            key.clear();
            value.clear();
            *in_value = false;
        };

        let mut lexer = StyleToken::lexer(input);
        while let Some(token) = lexer.next() {
            let slice = lexer.slice();
            match token {
                Ok(StyleToken::Colon) if !in_value => in_value = true,
                // A second colon belongs to the value (e.g. a URL).
                Ok(StyleToken::Colon) => value.push(":"),
                Ok(StyleToken::Semicolon) => commit(&mut key, &mut value, &mut in_value),
                Ok(StyleToken::Quoted) | Ok(StyleToken::QuotedSingle) => {
                    let inner = &slice[1..slice.len() - 1];
                    if in_value {
                        value.push(inner);
                    } else {
                        key.push(inner);
                    }
                }
                Ok(StyleToken::Word) => {
                    if in_value {
                        value.push(slice);
                    } else {
                        key.push(slice);
                    }
                }
                Err(()) => {}
            }
        }
        commit(&mut key, &mut value, &mut in_value);

        Self { declarations }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.declarations.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Map the visual declarations onto a widget style. Unrecognized keys are
    /// ignored.
    pub fn widget_style(&self) -> WidgetStyle {
        let mut style = WidgetStyle::default();
        for (key, value) in self.iter() {
            match key {
                "color" => style.fg = Some(value.to_owned()),
                "backgroundColor" | "background" => style.bg = Some(value.to_owned()),
                "fontWeight" => {
                    style.bold = Some(matches!(value, "bold" | "bolder" | "700" | "800" | "900"));
                }
                "textDecoration" => style.underline = Some(value.contains("underline")),
                "fontStyle" => style.italic = Some(value == "italic"),
                "visibility" => style.invisible = Some(value == "hidden"),
                "border" => style.border = Some(parse_border(value)),
                _ => {}
            }
        }
        style
    }
}

/// `"<width> <style> <color>"`, a bare style name, or `none`/`0`.
fn parse_border(value: &str) -> BorderStyle {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [] | ["none"] | ["0", ..] => BorderStyle::None,
        [_, "none", ..] => BorderStyle::None,
        [_width, _style, color, ..] => BorderStyle::Line { fg: Some((*color).to_owned()) },
        _ => BorderStyle::Line { fg: None },
    }
}

/// `background-color` becomes `backgroundColor`; camelCase input is unchanged.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.trim().chars() {
        if ch == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── tokenizing ───────────────────────────────────────────────────

    #[test]
    fn parses_simple_declarations() {
        let style = InlineStyle::parse("color: red; background-color: #112233");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("backgroundColor"), Some("#112233"));
    }

    #[test]
    fn multi_word_values_are_joined() {
        let style = InlineStyle::parse("border: 1px   solid blue;");
        assert_eq!(style.get("border"), Some("1px solid blue"));
    }

    #[test]
    fn malformed_declarations_are_dropped() {
        let style = InlineStyle::parse("color; : red; width:; height: 3");
        assert_eq!(style.get("color"), None);
        assert_eq!(style.get("width"), None);
        assert_eq!(style.get("height"), Some("3"));
    }

    #[test]
    fn quoted_values_lose_quotes() {
        let style = InlineStyle::parse("content: 'a b'");
        assert_eq!(style.get("content"), Some("a b"));
    }

    #[test]
    fn later_duplicates_win() {
        let style = InlineStyle::parse("color: red; color: blue");
        assert_eq!(style.get("color"), Some("blue"));
    }

    #[test]
    fn camel_case_conversion() {
        assert_eq!(camel_case("flex-direction"), "flexDirection");
        assert_eq!(camel_case("justifyContent"), "justifyContent");
        assert_eq!(camel_case("-webkit-thing"), "webkitThing");
    }

    // ── widget style mapping ─────────────────────────────────────────

    #[test]
    fn maps_colors() {
        let s = InlineStyle::parse("color: green; background: black").widget_style();
        assert_eq!(s.fg.as_deref(), Some("green"));
        assert_eq!(s.bg.as_deref(), Some("black"));
    }

    #[test]
    fn maps_font_weight() {
        for weight in ["bold", "700", "800", "900"] {
            let s = InlineStyle::parse(&format!("font-weight: {weight}")).widget_style();
            assert_eq!(s.bold, Some(true), "{weight}");
        }
        let s = InlineStyle::parse("font-weight: normal").widget_style();
        assert_eq!(s.bold, Some(false));
    }

    #[test]
    fn maps_decoration_italic_visibility() {
        let s = InlineStyle::parse(
            "text-decoration: underline dotted; font-style: italic; visibility: hidden",
        )
        .widget_style();
        assert_eq!(s.underline, Some(true));
        assert_eq!(s.italic, Some(true));
        assert_eq!(s.invisible, Some(true));
    }

    #[test]
    fn maps_border() {
        let s = InlineStyle::parse("border: 1px solid cyan").widget_style();
        assert_eq!(s.border, Some(BorderStyle::Line { fg: Some("cyan".into()) }));
        let s = InlineStyle::parse("border: none").widget_style();
        assert_eq!(s.border, Some(BorderStyle::None));
    }

    #[test]
    fn unknown_keys_ignored() {
        let s = InlineStyle::parse("cursor: pointer; z-index: 3").widget_style();
        assert_eq!(s, WidgetStyle::default());
    }
}
