//! Stack layout: children placed sequentially along one axis.
//!
//! The placement pass resolves each child's main-axis share (fixed lengths
//! first, remaining space split evenly across `Fill` children, remainder to
//! the last one), records every child's content-relative start position, and
//! clips each child's rect to the visible window under the current scroll
//! offset. The recorded start positions double as the hit-testing index: a
//! binary search over them resolves mouse coordinates to children.
//!
//! Scrolling is event-driven. A stack subscribes to arrow/page keys and the
//! mouse wheel on its own bus; `ByLine` shifts the offset in cells, `ByChild`
//! moves focus between children, and a move that cannot change anything is
//! left unconsumed so an ancestor scroll region can take it instead.

use crate::element::{Element, Kind, KindTag};
use crate::error::{Error, Result};
use crate::event::{key, Event};
use crate::style::Scroll;
use crate::types::{Axis, Len, Pair, Position, Rect, ResizeAxes, Size};

// =============================================================================
// State
// =============================================================================

pub(crate) struct StackState {
    pub(crate) axis: Axis,
    pub(crate) children: Vec<Element>,
    /// Content-relative main-axis start of every child, rebuilt each render.
    /// Monotonically non-decreasing, which is what hit-testing relies on.
    pub(crate) positions: Vec<i32>,
    /// Tracked by `ByChild` scrolling and keep-focused-visible.
    pub(crate) focused_child: Option<usize>,
}

fn with_stack<R>(element: &Element, f: impl FnOnce(&mut StackState) -> R) -> Result<R> {
    match &mut *element.kind_mut() {
        Kind::Stack(stack) => Ok(f(stack)),
        _ => Err(Error::NotAContainer(element.debug_id())),
    }
}

fn stack_parts(element: &Element) -> Result<(Axis, Vec<Element>)> {
    with_stack(element, |stack| (stack.axis, stack.children.clone()))
}

// =============================================================================
// Public child and scroll operations
// =============================================================================

impl Element {
    /// An empty stack laying children out along `axis`.
    pub fn stack(axis: Axis) -> Element {
        Element::from_kind(Kind::Stack(StackState {
            axis,
            children: Vec::new(),
            positions: Vec::new(),
            focused_child: None,
        }))
    }

    /// Builder form of [`Element::set_children`].
    pub fn with_children(self, children: Vec<Element>) -> Result<Self> {
        self.set_children(children)?;
        Ok(self)
    }

    /// Snapshot of the direct children.
    pub fn children(&self) -> Vec<Element> {
        self.children_snapshot()
    }

    /// Append a child and redraw.
    pub fn add_child(&self, child: Element) -> Result<()> {
        let index = with_stack(self, |stack| stack.children.len())?;
        self.insert_child(index, child)
    }

    /// Insert a child at `index` and redraw.
    pub fn insert_child(&self, index: usize, child: Element) -> Result<()> {
        with_stack(self, |stack| stack.children.insert(index, child.clone()))?;
        child.attach_to_parent(self, index)?;
        self.rerender(false, Some(ResizeAxes::splat(true)))?;
        Ok(())
    }

    /// Append several children with a single redraw at the end.
    pub fn add_children(&self, children: Vec<Element>) -> Result<()> {
        let start = with_stack(self, |stack| stack.children.len())?;
        for (i, child) in children.into_iter().enumerate() {
            with_stack(self, |stack| stack.children.push(child.clone()))?;
            child.attach_to_parent(self, start + i)?;
        }
        self.rerender(false, Some(ResizeAxes::splat(true)))?;
        Ok(())
    }

    /// Remove and detach the child at `index`, returning its handle.
    pub fn remove_child(&self, index: usize) -> Result<Element> {
        let child = with_stack(self, |stack| {
            if index < stack.positions.len() {
                stack.positions.remove(index);
            }
            stack.children.remove(index)
        })?;
        child.detach();
        self.rerender(false, Some(ResizeAxes::splat(true)))?;
        Ok(child)
    }

    /// Replace all children, detaching the old ones.
    pub fn set_children(&self, children: Vec<Element>) -> Result<()> {
        let old = with_stack(self, |stack| std::mem::take(&mut stack.children))?;
        for child in old {
            child.detach();
        }
        for (i, child) in children.iter().enumerate() {
            child.attach_to_parent(self, i)?;
        }
        with_stack(self, |stack| {
            stack.children = children;
            stack.positions.clear();
            stack.focused_child = None;
        })?;
        self.rerender(false, Some(ResizeAxes::splat(true)))?;
        Ok(())
    }

    /// Scroll back to the beginning of the content on `axis`.
    pub fn scroll_to_start(&self, axis: Axis) -> Result<()> {
        let Some(rect) = self.screen_rect() else {
            return Ok(());
        };
        if rect.offset[axis] == 0 {
            return Ok(());
        }
        let mut offset = rect.offset;
        offset[axis] = 0;
        render_moved(self, offset)
    }

    /// Scroll so the end of the content is visible on `axis`.
    pub fn scroll_to_end(&self, axis: Axis) -> Result<()> {
        let Some(rect) = self.screen_rect() else {
            return Ok(());
        };
        let Some(content) = self
            .core()
            .render_size
            .and_then(|size| size[axis].cells())
        else {
            return Ok(());
        };
        let target = (rect.size[axis] - content).min(0);
        if rect.offset[axis] == target {
            return Ok(());
        }
        let mut offset = rect.offset;
        offset[axis] = target;
        render_moved(self, offset)
    }
}

// =============================================================================
// Size negotiation
// =============================================================================

/// A stack's desired size: the styled size when fully specified, otherwise
/// each auto axis accumulates the children — concrete lengths sum up, and a
/// single `Fill` child makes the whole axis `Fill` (growth propagates upward
/// instead of adding).
pub(crate) fn stack_desired_size(element: &Element, max: Pair<i32>) -> Result<Size> {
    if let Ok(size) = element.styled_desired_size() {
        return Ok(size);
    }
    let (_, children) = stack_parts(element)?;
    let computed = element.computed_style();

    let mut size: Size = Pair::new(
        computed.extent(Axis::Horizontal).as_len().unwrap_or(Len::Cells(0)),
        computed.extent(Axis::Vertical).as_len().unwrap_or(Len::Cells(0)),
    );
    for child in &children {
        let child_size = child.desired_size(max, false)?;
        for axis in [Axis::Horizontal, Axis::Vertical] {
            if !computed.extent(axis).is_auto() {
                continue;
            }
            size[axis] = match (size[axis], child_size[axis]) {
                (Len::Fill, _) | (_, Len::Fill) => Len::Fill,
                (Len::Cells(total), Len::Cells(n)) => Len::Cells(total + n),
            };
        }
    }
    Ok(element.margined_size(size))
}

// =============================================================================
// Rendering
// =============================================================================

pub(crate) fn render_stack(element: &Element, rect: Rect, force: bool) -> Result<()> {
    if !element.should_render(rect, force) {
        element.finish_render(rect);
        return Ok(());
    }
    if !element.can_display(rect) {
        // Push the invisible rect down so children refresh their caches and
        // repaint correctly when the stack is displayed again.
        for child in element.children_snapshot() {
            child.render(rect, false)?;
        }
        element.finish_render(rect);
        return Ok(());
    }

    let (axis, children) = stack_parts(element)?;
    let cross = axis.opposite();
    tracing::trace!(element = %element.debug_id(), %rect, "stack render");

    // Negotiation pass: fixed lengths claim their cells, Fill children split
    // what is left evenly, and the division remainder goes to the last one.
    let mut fixed_total = 0;
    let mut fill_count: i32 = 0;
    let mut last_fill = None;
    let mut desired_sizes = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        let desired = child.desired_size(rect.size, false)?;
        match desired[axis] {
            Len::Fill => {
                fill_count += 1;
                last_fill = Some(index);
            }
            Len::Cells(n) => fixed_total += n,
        }
        desired_sizes.push(desired);
    }
    let total_shared = (rect.size[axis] - fixed_total).max(0);
    let shared = total_shared / fill_count.max(1);
    let extra = total_shared - shared * fill_count;

    let mut rect = rect;
    if fixed_total + shared * fill_count <= rect.size[axis] {
        // The content fits; a stale scroll offset must not leave a gap.
        rect.offset[axis] = 0;
    }

    // Placement pass.
    let mut positions = Vec::with_capacity(children.len());
    let mut cursor = rect.offset[axis];
    let mut cross_len = 0;
    for (index, (child, desired)) in children.iter().zip(&desired_sizes).enumerate() {
        let main_len = match desired[axis] {
            Len::Cells(n) => n,
            Len::Fill => shared + if last_fill == Some(index) { extra } else { 0 },
        };
        cursor += place_child(element, axis, rect, child, cursor, main_len, force, &mut positions)?;

        if let Some(render_size) = child.core().render_size {
            if let Len::Cells(n) = render_size[cross] {
                cross_len = cross_len.max(n);
            }
        }
    }

    let mut render_size = Size::cells(0, 0);
    render_size[cross] = Len::Cells(cross_len);
    if !children.is_empty() {
        render_size[axis] = Len::Cells(cursor - rect.offset[axis]);
    }

    // Clear whatever the children left uncovered at the tail.
    let mut clear_size = rect.size;
    clear_size[axis] = (rect.size[axis] - cursor.max(0)).max(0);
    let mut clear_position = rect.position;
    clear_position[axis] += cursor.max(0);
    element.clear_region(Rect::new(clear_size, clear_position));

    element.core_mut().render_size = Some(render_size);
    with_stack(element, |stack| stack.positions = positions)?;
    element.finish_render(rect);
    Ok(())
}

/// Place one child at `cursor` (main-axis coordinate including the scroll
/// offset), render it clipped to the visible window, and paint its margins.
/// Returns how far the cursor advances: the child's full resolved length,
/// clipped or not.
#[allow(clippy::too_many_arguments)]
fn place_child(
    stack: &Element,
    axis: Axis,
    rect: Rect,
    child: &Element,
    cursor: i32,
    main_len: i32,
    force: bool,
    positions: &mut Vec<i32>,
) -> Result<i32> {
    let cross = axis.opposite();
    positions.push(cursor - rect.offset[axis]);

    // Visible span: shrink by whatever hangs off the near edge (negative
    // cursor) or the far edge.
    let visible = (main_len + cursor.min(0)).min(rect.size[axis] - cursor.max(0));
    let mut size = rect.size;
    size[axis] = visible.max(0);

    let mut position = rect.position;
    position[axis] = (rect.position[axis] + cursor.max(0)).min(rect.position[axis] + rect.size[axis]);

    let mut offset = Pair::new(0, 0);
    offset[axis] = cursor.min(0);
    offset[cross] = rect.offset[cross];

    let margin = child.computed_style().margin();
    let child_rect = Rect::with_offset(
        Pair::new(
            (size.x - margin.left - margin.right).max(0),
            (size.y - margin.top - margin.bottom).max(0),
        ),
        Pair::new(position.x + margin.left, position.y + margin.top),
        offset,
    );
    child.render(child_rect, force)?;

    if child.is_displayed() {
        // The margin strips around the child are the stack's to paint.
        let strips = [
            Rect::new(Pair::new(margin.left, size.y), position),
            Rect::new(
                Pair::new(margin.right, size.y),
                Pair::new(position.x + size.x - margin.right, position.y),
            ),
            Rect::new(Pair::new(size.x, margin.top), position),
            Rect::new(
                Pair::new(size.x, margin.bottom),
                Pair::new(position.x, position.y + size.y - margin.bottom),
            ),
        ];
        for strip in strips {
            stack.clear_region(strip);
        }
    }
    Ok(main_len)
}

// =============================================================================
// Hit-testing
// =============================================================================

pub(crate) fn stack_find_descendant(element: &Element, position: Position) -> Option<Element> {
    if !element.contains(position) {
        return None;
    }
    let (axis, children) = stack_parts(element).ok()?;
    if children.is_empty() {
        return Some(element.clone());
    }
    let Some(index) = find_child_index(element, axis, position) else {
        return Some(element.clone());
    };
    let child = &children[index];
    // A hit on a hidden child, a margin or a gap belongs to the stack.
    if !child.contains(position) {
        return Some(element.clone());
    }
    if child.kind_tag() == KindTag::Stack {
        return child.find_descendant_at_position(position);
    }
    Some(child.clone())
}

/// Binary search the start-position cache for the child occupying a main-axis
/// coordinate. Zero-length children share a start position, so an exact match
/// scans for the first displayed one; a coordinate outside the cached range
/// clamps to the nearest end.
fn find_child_index(element: &Element, axis: Axis, position: Position) -> Option<usize> {
    let rect = element.screen_rect()?;
    let target = position[axis] - (rect.position[axis] + rect.offset[axis]);
    let (positions, children) =
        with_stack(element, |stack| (stack.positions.clone(), stack.children.clone())).ok()?;
    if positions.is_empty() || positions.len() != children.len() {
        return None;
    }

    let mut left: i32 = 0;
    let mut right: i32 = positions.len() as i32 - 1;
    while left <= right {
        let mid = left + (right - left) / 2;
        let value = positions[mid as usize];
        if value == target {
            for index in left as usize..=right as usize {
                if positions[index] == target && children[index].is_displayed() {
                    return Some(index);
                }
            }
            return Some(mid as usize);
        }
        if value > target {
            right = mid - 1;
        } else {
            left = mid + 1;
        }
    }
    // Between two starts: `right` is the last child beginning at or before
    // the target.
    Some(right.clamp(0, positions.len() as i32 - 1) as usize)
}

// =============================================================================
// Scrolling
// =============================================================================

pub(crate) fn stack_on_mouse(element: &Element, event: &Event) -> Result<()> {
    if event.is_scroll_down() {
        scroll_move(element, 1, Axis::Vertical, event)
    } else if event.is_scroll_up() {
        scroll_move(element, -1, Axis::Vertical, event)
    } else {
        Ok(())
    }
}

pub(crate) fn stack_on_keyboard(element: &Element, event: &Event) -> Result<()> {
    let Some(input) = event.key() else {
        return Ok(());
    };
    let page = element.screen_rect().map(|rect| rect.size.y).unwrap_or(0);
    match input.code {
        key::ARROW_DOWN => scroll_move(element, 1, Axis::Vertical, event),
        key::ARROW_UP => scroll_move(element, -1, Axis::Vertical, event),
        key::ARROW_RIGHT => scroll_move(element, 4, Axis::Horizontal, event),
        key::ARROW_LEFT => scroll_move(element, -4, Axis::Horizontal, event),
        key::PAGE_DOWN => scroll_move(element, page, Axis::Vertical, event),
        key::PAGE_UP => scroll_move(element, -page, Axis::Vertical, event),
        _ => Ok(()),
    }
}

/// React to a scroll request of `delta` cells along `axis`. Leaves the event
/// unconsumed (no `stop_propagation`) whenever this stack cannot move, so the
/// request climbs to an ancestor scroll region.
fn scroll_move(element: &Element, delta: i32, axis: Axis, event: &Event) -> Result<()> {
    let (main_axis, _) = stack_parts(element)?;
    let (Some(rect), Some(render_size)) = (element.screen_rect(), element.core().render_size)
    else {
        return Ok(());
    };
    let computed = element.computed_style();

    let content = render_size[main_axis].cells().unwrap_or(0);
    if content <= rect.size[main_axis] && computed.scroll() != Scroll::ByChild {
        return Ok(());
    }
    // A stack with an auto main axis always matches its content; there is
    // nothing to scroll inside.
    if computed.extent(main_axis).is_auto() {
        return Ok(());
    }

    match computed.scroll() {
        Scroll::None => Ok(()),
        Scroll::ByLine => move_by_line(element, delta, axis, event),
        Scroll::ByChild => {
            if axis != main_axis {
                return Ok(());
            }
            move_by_child(element, delta, event)
        }
    }
}

fn move_by_line(element: &Element, delta: i32, axis: Axis, event: &Event) -> Result<()> {
    let (Some(rect), Some(render_size)) = (element.screen_rect(), element.core().render_size)
    else {
        return Ok(());
    };
    let Some(content) = render_size[axis].cells() else {
        return Ok(());
    };
    let min_offset = rect.size[axis] - content;
    let next = (rect.offset[axis] - delta).max(min_offset).min(0);
    if next == rect.offset[axis] {
        // Already at the edge; the event stays live for ancestors.
        return Ok(());
    }
    event.stop_propagation();
    let mut offset = rect.offset;
    offset[axis] = next;
    render_moved(element, offset)
}

fn move_by_child(element: &Element, delta: i32, event: &Event) -> Result<()> {
    // Main-axis navigation is always this stack's to answer, even at an edge.
    event.stop_propagation();
    let (children, focused) =
        with_stack(element, |stack| (stack.children.clone(), stack.focused_child))?;
    if children.is_empty() {
        return Ok(());
    }
    let target = match focused {
        None if delta >= 0 => 0,
        None => children.len() - 1,
        Some(index) => (index as i32 + delta).clamp(0, children.len() as i32 - 1) as usize,
    };
    children[target].focus()
}

/// Keep the newly focused child visible under `ByChild` scrolling.
pub(crate) fn stack_on_descendant_focus(element: &Element, child: &Element) -> Result<()> {
    {
        let core = element.core();
        if core.render_size.is_none() || core.computed.scroll() != Scroll::ByChild {
            return Ok(());
        }
    }
    let index = with_stack(element, |stack| {
        stack.children.iter().position(|c| c == child)
    })?;
    let Some(index) = index else {
        return Ok(());
    };
    ensure_focus_visible(element, index)
}

fn ensure_focus_visible(element: &Element, index: usize) -> Result<()> {
    let Some(rect) = element.screen_rect() else {
        return Ok(());
    };
    let (axis, unchanged, child, start) = with_stack(element, |stack| {
        let unchanged = stack.focused_child == Some(index);
        stack.focused_child = Some(index);
        (
            stack.axis,
            unchanged,
            stack.children.get(index).cloned(),
            stack.positions.get(index).copied(),
        )
    })?;
    if unchanged {
        return Ok(());
    }
    let (Some(child), Some(start)) = (child, start) else {
        return Ok(());
    };

    let desired = child.desired_size(rect.size, false)?;
    let length = desired[axis].cells().unwrap_or(0);
    // Offset that aligns the child's leading edge with the window's start,
    // and the one that aligns its trailing edge with the window's end.
    let top_max = -start;
    let bottom_min = rect.size[axis] - (start + length);
    let current = rect.offset[axis];
    let next = if bottom_min < current {
        bottom_min
    } else if top_max > current {
        top_max
    } else {
        return Ok(());
    };

    let mut offset = rect.offset;
    offset[axis] = next;
    render_moved(element, offset)
}

fn render_moved(element: &Element, offset: Pair<i32>) -> Result<()> {
    let Some(rect) = element.screen_rect() else {
        return Ok(());
    };
    let Some(window) = element.window_node() else {
        return Ok(());
    };
    tracing::trace!(
        element = %element.debug_id(),
        from = ?rect.offset,
        to = ?offset,
        "scroll"
    );
    element.render(Rect::with_offset(rect.size, rect.position, offset), false)?;
    window.refresh()?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventData, EventKind};
    use crate::style::Style;
    use crate::types::Extent;

    const MAX: Pair<i32> = Pair::new(80, 24);

    fn sized_blank(width: i32, height: i32) -> Element {
        Element::blank().with_style(Style::new().with_size(Extent::Cells(width), Extent::Cells(height)))
    }

    // =========================================================================
    // Desired size aggregation
    // =========================================================================

    #[test]
    fn test_auto_axes_sum_children() {
        let stack = Element::stack(Axis::Vertical)
            .with_children(vec![sized_blank(3, 1), sized_blank(5, 2)])
            .unwrap();
        assert_eq!(stack.desired_size(MAX, false).unwrap(), Size::cells(8, 3));
    }

    #[test]
    fn test_fill_child_makes_auto_axis_fill() {
        let fill = Element::blank()
            .with_style(Style::new().with_size(Extent::Cells(2), Extent::Fill));
        let stack = Element::stack(Axis::Vertical)
            .with_children(vec![sized_blank(3, 1), fill])
            .unwrap();

        let desired = stack.desired_size(MAX, false).unwrap();
        assert_eq!(desired.x, Len::Cells(5));
        assert_eq!(desired.y, Len::Fill);
    }

    #[test]
    fn test_styled_axis_overrides_aggregation() {
        let stack = Element::stack(Axis::Vertical)
            .with_style(Style::new().with_size(Extent::Auto, Extent::Cells(10)))
            .with_children(vec![sized_blank(3, 1), sized_blank(5, 2)])
            .unwrap();
        assert_eq!(stack.desired_size(MAX, false).unwrap(), Size::cells(8, 10));
    }

    #[test]
    fn test_fully_styled_stack_skips_children() {
        let stack = Element::stack(Axis::Vertical)
            .with_style(Style::new().with_size(Extent::Cells(7), Extent::Cells(4)))
            .with_children(vec![sized_blank(99, 99)])
            .unwrap();
        assert_eq!(stack.desired_size(MAX, false).unwrap(), Size::cells(7, 4));
    }

    // =========================================================================
    // Child bookkeeping
    // =========================================================================

    #[test]
    fn test_add_child_sets_parent_and_cascades_style() {
        let stack = Element::stack(Axis::Vertical)
            .with_style(Style::new().with_foreground(crate::style::Color::Red));
        let child = sized_blank(2, 1);
        stack.add_child(child.clone()).unwrap();

        assert_eq!(child.parent().unwrap(), stack);
        assert_eq!(
            child.computed_style().foreground,
            Some(crate::style::Color::Red)
        );
    }

    #[test]
    fn test_remove_child_detaches() {
        let stack = Element::stack(Axis::Vertical)
            .with_children(vec![sized_blank(2, 1), sized_blank(2, 1)])
            .unwrap();
        let removed = stack.remove_child(0).unwrap();

        assert!(removed.parent().is_none());
        assert_eq!(stack.children().len(), 1);
    }

    #[test]
    fn test_child_operations_fail_on_leaves() {
        let leaf = Element::blank();
        assert!(matches!(
            leaf.add_child(sized_blank(1, 1)),
            Err(Error::NotAContainer(_))
        ));
    }

    // =========================================================================
    // Hit-test index search
    // =========================================================================

    /// Fabricate a rendered-looking stack: rect cache plus start positions.
    fn searchable_stack(positions: Vec<i32>, rect: Rect) -> Element {
        let children: Vec<Element> = positions.iter().map(|_| sized_blank(1, 1)).collect();
        let stack = Element::stack(Axis::Vertical)
            .with_children(children)
            .unwrap();
        stack.core_mut().render_rect = Some(rect);
        with_stack(&stack, |state| state.positions = positions).unwrap();
        stack
    }

    #[test]
    fn test_find_child_index_exact_and_between() {
        let rect = Rect::new(Pair::new(10, 10), Pair::new(0, 0));
        let stack = searchable_stack(vec![0, 2, 5], rect);

        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 0)), Some(0));
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 2)), Some(1));
        // Row 3 falls inside the child starting at 2.
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 3)), Some(1));
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 7)), Some(2));
    }

    #[test]
    fn test_find_child_index_clamps_out_of_range() {
        let rect = Rect::new(Pair::new(10, 10), Pair::new(0, 2));
        let stack = searchable_stack(vec![0, 3], rect);

        // Above the first child and below the last.
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 0)), Some(0));
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 9)), Some(1));
    }

    #[test]
    fn test_find_child_index_accounts_for_scroll_offset() {
        let rect = Rect::with_offset(Pair::new(10, 4), Pair::new(0, 0), Pair::new(0, -2));
        let stack = searchable_stack(vec![0, 3, 6], rect);

        // Screen row 0 is content row 2: still the first child.
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 0)), Some(0));
        // Screen row 1 is content row 3: the second child's start.
        assert_eq!(find_child_index(&stack, Axis::Vertical, Pair::new(0, 1)), Some(1));
    }

    #[test]
    fn test_empty_stack_resolves_hit_to_itself() {
        let stack = Element::stack(Axis::Vertical);
        stack.core_mut().render_rect = Some(Rect::new(Pair::new(4, 4), Pair::new(0, 0)));
        let hit = stack.find_descendant_at_position(Pair::new(1, 1));
        assert_eq!(hit, Some(stack));
    }

    #[test]
    fn test_miss_outside_rect_returns_none() {
        let stack = Element::stack(Axis::Vertical);
        stack.core_mut().render_rect = Some(Rect::new(Pair::new(4, 4), Pair::new(0, 0)));
        assert_eq!(stack.find_descendant_at_position(Pair::new(9, 9)), None);
    }

    // =========================================================================
    // Scroll consumption
    // =========================================================================

    /// A detached stack dressed up with render caches so the scroll guards
    /// see an overflowing content region.
    fn scrollable_stack(visible: i32, content: i32) -> Element {
        let stack = Element::stack(Axis::Vertical)
            .with_style(Style::new().with_size(Extent::Cells(10), Extent::Cells(visible)));
        {
            let mut core = stack.core_mut();
            core.render_rect = Some(Rect::new(Pair::new(10, visible), Pair::new(0, 0)));
            core.render_size = Some(Size::cells(10, content));
        }
        stack
    }

    fn scroll_event(stack: &Element) -> Event {
        Event::new(
            EventKind::Keyboard,
            stack,
            EventData::Keyboard(crate::event::KeyInput::new(key::ARROW_DOWN, true)),
        )
    }

    #[test]
    fn test_scroll_with_overflow_consumes_event() {
        let stack = scrollable_stack(4, 10);
        let event = scroll_event(&stack);
        scroll_move(&stack, 1, Axis::Vertical, &event).unwrap();
        assert!(event.propagation_stopped());
    }

    #[test]
    fn test_scroll_when_content_fits_bubbles() {
        let stack = scrollable_stack(10, 4);
        let event = scroll_event(&stack);
        scroll_move(&stack, 1, Axis::Vertical, &event).unwrap();
        assert!(!event.propagation_stopped());
    }

    #[test]
    fn test_scroll_at_edge_bubbles() {
        // Scrolling up while already at the top cannot change the offset.
        let stack = scrollable_stack(4, 10);
        let event = scroll_event(&stack);
        scroll_move(&stack, -1, Axis::Vertical, &event).unwrap();
        assert!(!event.propagation_stopped());
    }

    #[test]
    fn test_auto_main_axis_never_scrolls() {
        let stack = Element::stack(Axis::Vertical)
            .with_style(Style::new().with_size(Extent::Cells(10), Extent::Auto));
        {
            let mut core = stack.core_mut();
            core.render_rect = Some(Rect::new(Pair::new(10, 4), Pair::new(0, 0)));
            core.render_size = Some(Size::cells(10, 10));
        }
        let event = scroll_event(&stack);
        scroll_move(&stack, 1, Axis::Vertical, &event).unwrap();
        assert!(!event.propagation_stopped());
    }

    #[test]
    fn test_by_child_consumes_main_axis_even_at_edge() {
        let stack = scrollable_stack(4, 10);
        stack.core_mut().computed.scroll = Some(Scroll::ByChild);
        let event = scroll_event(&stack);
        scroll_move(&stack, -1, Axis::Vertical, &event).unwrap();
        assert!(event.propagation_stopped());
    }

    #[test]
    fn test_by_child_lets_cross_axis_bubble() {
        let stack = scrollable_stack(4, 10);
        stack.core_mut().computed.scroll = Some(Scroll::ByChild);
        let event = scroll_event(&stack);
        scroll_move(&stack, 4, Axis::Horizontal, &event).unwrap();
        assert!(!event.propagation_stopped());
    }
}
