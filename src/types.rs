//! Core geometry types for spark-dom.
//!
//! Everything the layout engine negotiates with is expressed in these types:
//! axes, per-axis pairs, the size sentinel vocabulary (fixed / fill / auto),
//! and the screen rectangles elements render into.

use std::fmt;
use std::ops::{Index, IndexMut};

// =============================================================================
// Axis
// =============================================================================

/// One of the two terminal axes.
///
/// Stack layouts pick a main axis; everything else is "the cross axis".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// The other axis.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

// =============================================================================
// Pair - one value per axis
// =============================================================================

/// A per-axis pair, indexable by [`Axis`].
///
/// Used for sizes, positions, scroll offsets and resize flags. Keeping the
/// axis abstract lets the stack layout run the same placement code vertically
/// and horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pair<T> {
    pub x: T,
    pub y: T,
}

impl<T> Pair<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Copy> Pair<T> {
    /// Build a pair with `value` on `axis` and `other` on the opposite axis.
    pub fn on_axis(axis: Axis, value: T, other: T) -> Self {
        match axis {
            Axis::Horizontal => Self::new(value, other),
            Axis::Vertical => Self::new(other, value),
        }
    }

    /// Both components set to the same value.
    pub fn splat(value: T) -> Self {
        Self::new(value, value)
    }
}

impl<T> Index<Axis> for Pair<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::Horizontal => &self.x,
            Axis::Vertical => &self.y,
        }
    }
}

impl<T> IndexMut<Axis> for Pair<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::Horizontal => &mut self.x,
            Axis::Vertical => &mut self.y,
        }
    }
}

/// An absolute screen coordinate (column, row).
pub type Position = Pair<i32>;

/// Per-axis "did this axis change size" flags used by resize escalation.
pub type ResizeAxes = Pair<bool>;

// =============================================================================
// Extent - style-level size sentinel
// =============================================================================

/// A styled size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Extent {
    /// Grow to exactly fit content; memoized once computed.
    #[default]
    Auto,
    /// Consume all space the parent has left after fixed/auto siblings.
    Fill,
    /// Exactly this many terminal cells.
    Cells(i32),
}

impl Extent {
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }

    /// The resolved length this extent dictates, or `None` for `Auto` (which
    /// only content measurement can resolve).
    pub const fn as_len(self) -> Option<Len> {
        match self {
            Self::Auto => None,
            Self::Fill => Some(Len::Fill),
            Self::Cells(n) => Some(Len::Cells(n)),
        }
    }
}

// =============================================================================
// Len - resolved desired length
// =============================================================================

/// A resolved desired length along one axis.
///
/// `Auto` never survives size negotiation: by the time a desired size exists
/// the content has been measured, so only `Fill` and concrete cells remain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Len {
    /// Still wants all remaining space; the parent resolves this.
    Fill,
    /// Concrete number of cells.
    Cells(i32),
}

impl Len {
    pub const fn is_fill(self) -> bool {
        matches!(self, Self::Fill)
    }

    /// Concrete cell count, if resolved.
    pub const fn cells(self) -> Option<i32> {
        match self {
            Self::Fill => None,
            Self::Cells(n) => Some(n),
        }
    }
}

/// A desired size: one resolved length per axis.
pub type Size = Pair<Len>;

impl Size {
    /// A fully concrete size.
    pub const fn cells(width: i32, height: i32) -> Self {
        Pair::new(Len::Cells(width), Len::Cells(height))
    }
}

// =============================================================================
// Rect - a renderable screen region
// =============================================================================

/// A rectangular terminal region an element renders into.
///
/// `offset` is the signed scroll shift applied to children's coordinates
/// (negative = content scrolled up/left). Structural equality is what the
/// render gate uses to detect "nothing changed, skip render".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub size: Pair<i32>,
    pub position: Position,
    pub offset: Pair<i32>,
}

impl Rect {
    pub const fn new(size: Pair<i32>, position: Position) -> Self {
        Self {
            size,
            position,
            offset: Pair::new(0, 0),
        }
    }

    pub const fn with_offset(size: Pair<i32>, position: Position, offset: Pair<i32>) -> Self {
        Self {
            size,
            position,
            offset,
        }
    }

    pub const fn width(&self) -> i32 {
        self.size.x
    }

    pub const fn height(&self) -> i32 {
        self.size.y
    }

    /// A rect draws nothing unless both dimensions are positive.
    pub const fn is_visible(&self) -> bool {
        self.size.x > 0 && self.size.y > 0
    }

    /// Half-open containment test: `position <= p < position + size` on both
    /// axes, so adjacent rects never claim the same cell.
    pub fn contains(&self, p: Position) -> bool {
        self.contains_on(p, Axis::Horizontal) && self.contains_on(p, Axis::Vertical)
    }

    fn contains_on(&self, p: Position, axis: Axis) -> bool {
        p[axis] >= self.position[axis] && p[axis] < self.position[axis] + self.size[axis]
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect{{size=({}, {}), position=({}, {}), offset=({}, {})}}",
            self.size.x, self.size.y, self.position.x, self.position.y, self.offset.x, self.offset.y
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_axis_indexing() {
        let mut p = Pair::new(3, 7);
        assert_eq!(p[Axis::Horizontal], 3);
        assert_eq!(p[Axis::Vertical], 7);

        p[Axis::Vertical] = 9;
        assert_eq!(p.y, 9);

        let q = Pair::on_axis(Axis::Vertical, 10, 2);
        assert_eq!(q, Pair::new(2, 10));
    }

    #[test]
    fn test_axis_opposite() {
        assert_eq!(Axis::Horizontal.opposite(), Axis::Vertical);
        assert_eq!(Axis::Vertical.opposite(), Axis::Horizontal);
    }

    #[test]
    fn test_len_cells() {
        assert_eq!(Len::Cells(4).cells(), Some(4));
        assert_eq!(Len::Fill.cells(), None);
        assert!(Len::Fill.is_fill());
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let rect = Rect::new(Pair::new(10, 5), Pair::new(2, 3));
        assert!(rect.contains(Pair::new(2, 3)));
        assert!(rect.contains(Pair::new(11, 7)));
        // The far edges belong to the next rect over.
        assert!(!rect.contains(Pair::new(12, 3)));
        assert!(!rect.contains(Pair::new(2, 8)));
        assert!(!rect.contains(Pair::new(1, 3)));
    }

    #[test]
    fn test_rect_visibility() {
        assert!(Rect::new(Pair::new(1, 1), Pair::new(0, 0)).is_visible());
        assert!(!Rect::new(Pair::new(0, 5), Pair::new(0, 0)).is_visible());
        assert!(!Rect::new(Pair::new(5, 0), Pair::new(0, 0)).is_visible());
    }

    #[test]
    fn test_rect_equality_includes_offset() {
        let a = Rect::new(Pair::new(4, 4), Pair::new(0, 0));
        let mut b = a;
        assert_eq!(a, b);
        b.offset = Pair::new(0, -2);
        assert_ne!(a, b);
    }
}
