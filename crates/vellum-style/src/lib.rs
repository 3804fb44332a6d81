//! Style boundary consumed read-only by the view tree.
//!
//! Views ask the style for fonts, colors, alignment, and wrap mode through
//! typed accessors over a key/value store; writers go through
//! [`Style::set`], which raises `ValueChanged` so the document view can
//! rebuild.

mod config;
mod metrics;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;
use vellum_draw::Color;
use vellum_events::{EventDispatcher, Subscription};

pub use config::{CaretConfig, ConfigFile, FontConfig, TextConfig, UndoConfig, VellumConfig};
pub use metrics::{FixedMetrics, FontMetrics};

/// Horizontal alignment of a paragraph's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    /// Justify: stretch inter-word gaps so each line (except the last)
    /// exactly fills the available width.
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapMode {
    None,
    #[default]
    Word,
}

bitflags::bitflags! {
    /// Text decoration lines drawn over a glyph run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Decorations: u8 {
        const UNDERLINE = 1;
        const STRIKETHROUGH = 2;
    }
}

/// Keys understood by the text engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKey {
    FontSize,
    TextColor,
    SelectionColor,
    CaretColor,
    Alignment,
    WrapText,
    Decorations,
    LineSpacing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleValue {
    Float(f32),
    Color(Color),
    Align(Alignment),
    Wrap(WrapMode),
    Decorations(Decorations),
}

struct StyleInner {
    values: RefCell<HashMap<StyleKey, StyleValue>>,
    changed: EventDispatcher<StyleKey>,
}

/// Clonable handle to a style table; clones observe the same values and the
/// same `ValueChanged` dispatcher.
#[derive(Clone)]
pub struct Style {
    inner: Rc<StyleInner>,
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl Style {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StyleInner {
                values: RefCell::new(HashMap::new()),
                changed: EventDispatcher::new(),
            }),
        }
    }

    pub fn get(&self, key: StyleKey) -> Option<StyleValue> {
        self.inner.values.borrow().get(&key).copied()
    }

    /// Store `value` under `key`, raising `ValueChanged` when the value
    /// actually differs.
    pub fn set(&self, key: StyleKey, value: StyleValue) {
        let prev = self.inner.values.borrow_mut().insert(key, value);
        if prev != Some(value) {
            self.inner.changed.dispatch(&key);
        }
    }

    /// `ValueChanged`: fires with the key whose value was replaced.
    pub fn changed(&self) -> &EventDispatcher<StyleKey> {
        &self.inner.changed
    }

    pub fn subscribe_changed(&self, f: impl Fn(&StyleKey) + 'static) -> Subscription {
        self.inner.changed.subscribe(f)
    }

    pub fn font_size(&self) -> f32 {
        match self.get(StyleKey::FontSize) {
            Some(StyleValue::Float(v)) => v,
            _ => 14.0,
        }
    }

    pub fn text_color(&self) -> Color {
        match self.get(StyleKey::TextColor) {
            Some(StyleValue::Color(c)) => c,
            _ => Color::WHITE,
        }
    }

    pub fn selection_color(&self) -> Color {
        match self.get(StyleKey::SelectionColor) {
            Some(StyleValue::Color(c)) => c,
            _ => Color::rgba(80, 120, 200, 128),
        }
    }

    pub fn caret_color(&self) -> Color {
        match self.get(StyleKey::CaretColor) {
            Some(StyleValue::Color(c)) => c,
            _ => self.text_color(),
        }
    }

    pub fn alignment(&self) -> Alignment {
        match self.get(StyleKey::Alignment) {
            Some(StyleValue::Align(a)) => a,
            _ => Alignment::Start,
        }
    }

    pub fn wrap(&self) -> WrapMode {
        match self.get(StyleKey::WrapText) {
            Some(StyleValue::Wrap(w)) => w,
            _ => WrapMode::Word,
        }
    }

    pub fn decorations(&self) -> Decorations {
        match self.get(StyleKey::Decorations) {
            Some(StyleValue::Decorations(d)) => d,
            _ => Decorations::empty(),
        }
    }

    /// Extra vertical space between lines, in pixels.
    pub fn line_spacing(&self) -> f32 {
        match self.get(StyleKey::LineSpacing) {
            Some(StyleValue::Float(v)) => v,
            _ => 0.0,
        }
    }
}

impl std::fmt::Debug for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Style")
            .field("values", &self.inner.values.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn defaults_apply_when_unset() {
        let s = Style::new();
        assert_eq!(s.alignment(), Alignment::Start);
        assert_eq!(s.wrap(), WrapMode::Word);
        assert!(s.decorations().is_empty());
    }

    #[test]
    fn set_raises_value_changed_once_per_actual_change() {
        let s = Style::new();
        let hits = Rc::new(Cell::new(0u32));
        let h = Rc::clone(&hits);
        s.subscribe_changed(move |_| h.set(h.get() + 1));
        s.set(StyleKey::Alignment, StyleValue::Align(Alignment::Fill));
        s.set(StyleKey::Alignment, StyleValue::Align(Alignment::Fill));
        assert_eq!(hits.get(), 1);
        assert_eq!(s.alignment(), Alignment::Fill);
    }

    #[test]
    fn clones_share_values() {
        let a = Style::new();
        let b = a.clone();
        a.set(StyleKey::FontSize, StyleValue::Float(20.0));
        assert_eq!(b.font_size(), 20.0);
    }
}
