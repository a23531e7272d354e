//! Style records and the cascade merge.
//!
//! A [`Style`] is a sparse record: every field is an `Option` so that
//! [`Style::merge`] can tell "explicitly set" apart from "inherit". An
//! element's computed style is `merge(parent_inheritable, authored)`,
//! recomputed whenever either input changes and pushed down the subtree.
//! Only the paint properties cascade; size, margin, display and scroll apply
//! to the element they are authored on.

use crate::types::{Axis, Extent, Pair};

// =============================================================================
// Color palette
// =============================================================================

/// Enumerated terminal palette.
///
/// The engine never emits escape codes itself; the backend maps these to the
/// terminal's native codes. `Ansi` is the 256-color escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's own default foreground/background.
    Reset,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Grey,
    DarkGrey,
    /// Raw 256-color palette index.
    Ansi(u8),
}

// =============================================================================
// Display / Scroll / TextAlign
// =============================================================================

/// Whether an element occupies space at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Display {
    #[default]
    Block,
    /// The element keeps its children and styles but draws nothing and
    /// reports a zero desired size.
    None,
}

/// How a stack layout responds to scroll input on its main axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scroll {
    /// Never scrolls; events bubble to an ancestor.
    None,
    /// Shift the scroll offset by lines, clamped to the content length.
    ByLine,
    /// Move focus between children instead of shifting cells.
    ByChild,
}

/// Horizontal alignment for text widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

// =============================================================================
// Margin
// =============================================================================

/// Four-sided margin in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Margin {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Margin {
    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// The same margin on all four sides.
    pub const fn uniform(value: i32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Margin consumed before a child's content starts, per axis.
    pub const fn leading(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// Margin consumed after a child's content ends, per axis.
    pub const fn trailing(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }

    /// Total margin along an axis.
    pub const fn along(&self, axis: Axis) -> i32 {
        self.leading(axis) + self.trailing(axis)
    }
}

// =============================================================================
// Style
// =============================================================================

/// A cascading style record.
///
/// Unset fields inherit through [`Style::merge`]; set fields override. The
/// merge is associative but not commutative: override always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub size: Option<Pair<Extent>>,
    pub margin: Option<Margin>,
    pub display: Option<Display>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub text_align: Option<TextAlign>,
    pub scroll: Option<Scroll>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `over` onto `base`: every field explicitly set on `over`
    /// replaces the base's; unset fields inherit.
    pub fn merge(base: Self, over: Self) -> Self {
        Self {
            size: over.size.or(base.size),
            margin: over.margin.or(base.margin),
            display: over.display.or(base.display),
            foreground: over.foreground.or(base.foreground),
            background: over.background.or(base.background),
            text_align: over.text_align.or(base.text_align),
            scroll: over.scroll.or(base.scroll),
        }
    }

    /// The subset of this style that cascades into children: the paint
    /// properties. Size, margin, display and scroll apply only to the
    /// element they are authored on.
    pub fn inheritable(&self) -> Self {
        Self {
            foreground: self.foreground,
            background: self.background,
            text_align: self.text_align,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    pub fn with_size(mut self, width: Extent, height: Extent) -> Self {
        self.size = Some(Pair::new(width, height));
        self
    }

    /// Fill both axes.
    pub fn with_full_size(self) -> Self {
        self.with_size(Extent::Fill, Extent::Fill)
    }

    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_display(mut self, display: Display) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_text_align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn with_scroll(mut self, scroll: Scroll) -> Self {
        self.scroll = Some(scroll);
        self
    }

    // -------------------------------------------------------------------------
    // Resolved accessors (defaults applied)
    // -------------------------------------------------------------------------

    /// The styled extent along one axis; unset means `Auto`.
    pub fn extent(&self, axis: Axis) -> Extent {
        self.size.map(|s| s[axis]).unwrap_or(Extent::Auto)
    }

    pub fn margin(&self) -> Margin {
        self.margin.unwrap_or_default()
    }

    pub fn display(&self) -> Display {
        self.display.unwrap_or_default()
    }

    pub fn is_displayed(&self) -> bool {
        self.display() != Display::None
    }

    /// Effective scroll policy. An unset policy scrolls by line, matching
    /// the behavior content regions had before the policy field existed;
    /// `Scroll::None` opts out entirely.
    pub fn scroll(&self) -> Scroll {
        self.scroll.unwrap_or(Scroll::ByLine)
    }

    pub fn text_align(&self) -> TextAlign {
        self.text_align.unwrap_or_default()
    }

    pub fn foreground(&self) -> Color {
        self.foreground.unwrap_or(Color::Reset)
    }

    pub fn background(&self) -> Color {
        self.background.unwrap_or(Color::Reset)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(w: i32, h: i32) -> Style {
        Style::new().with_size(Extent::Cells(w), Extent::Cells(h))
    }

    #[test]
    fn test_merge_self_is_idempotent() {
        let style = sized(4, 2)
            .with_background(Color::Blue)
            .with_margin(Margin::uniform(1));
        assert_eq!(Style::merge(style, style), style);
    }

    #[test]
    fn test_merge_override_wins_on_set_fields() {
        let base = sized(4, 2).with_foreground(Color::Red);
        let over = Style::new().with_foreground(Color::Green);

        let merged = Style::merge(base, over);
        // No trace of the base's value survives on an overridden field.
        assert_eq!(merged.foreground, Some(Color::Green));
        // Unset fields inherit.
        assert_eq!(merged.size, base.size);
    }

    #[test]
    fn test_merge_is_not_commutative() {
        let a = Style::new().with_background(Color::Black);
        let b = Style::new().with_background(Color::White);
        assert_ne!(Style::merge(a, b), Style::merge(b, a));
    }

    #[test]
    fn test_merge_whole_size_pair_replaces() {
        let base = Style::new().with_size(Extent::Cells(10), Extent::Fill);
        let over = Style::new().with_size(Extent::Auto, Extent::Cells(3));

        let merged = Style::merge(base, over);
        assert_eq!(merged.extent(Axis::Horizontal), Extent::Auto);
        assert_eq!(merged.extent(Axis::Vertical), Extent::Cells(3));
    }

    #[test]
    fn test_inheritable_keeps_paint_and_drops_layout_fields() {
        let style = sized(4, 2)
            .with_margin(Margin::uniform(1))
            .with_display(Display::None)
            .with_scroll(Scroll::ByChild)
            .with_foreground(Color::Red)
            .with_background(Color::Blue)
            .with_text_align(TextAlign::Right);

        let inherited = style.inheritable();
        assert_eq!(inherited.foreground, Some(Color::Red));
        assert_eq!(inherited.background, Some(Color::Blue));
        assert_eq!(inherited.text_align, Some(TextAlign::Right));
        assert_eq!(inherited.size, None);
        assert_eq!(inherited.margin, None);
        assert_eq!(inherited.display, None);
        assert_eq!(inherited.scroll, None);
    }

    #[test]
    fn test_resolved_defaults() {
        let style = Style::new();
        assert_eq!(style.extent(Axis::Horizontal), Extent::Auto);
        assert_eq!(style.display(), Display::Block);
        assert_eq!(style.scroll(), Scroll::ByLine);
        assert_eq!(style.margin(), Margin::default());
        assert_eq!(style.background(), Color::Reset);
    }

    #[test]
    fn test_margin_axis_helpers() {
        let margin = Margin::new(1, 2, 3, 4);
        assert_eq!(margin.leading(Axis::Horizontal), 1);
        assert_eq!(margin.trailing(Axis::Horizontal), 2);
        assert_eq!(margin.leading(Axis::Vertical), 3);
        assert_eq!(margin.trailing(Axis::Vertical), 4);
        assert_eq!(margin.along(Axis::Horizontal), 3);
        assert_eq!(margin.along(Axis::Vertical), 7);
    }
}
