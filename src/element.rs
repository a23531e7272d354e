//! Element tree core.
//!
//! Every widget is an [`Element`]: a cheaply clonable handle over a shared
//! node holding identity, styles, size/render caches and an event emitter.
//! Parents own their children; parent and window links are weak, so dropping
//! a window tears the whole tree down without leak cycles.
//!
//! The render pipeline lives here:
//! - `desired_size` — memoized size negotiation (styled size, else content
//!   measurement, else a configuration error for bare leaves)
//! - `render` / `should_render` / `finish_render` — the render gate and its
//!   caches (`rect`, `style`, `size`)
//! - `rerender` — self-initiated redraws, escalating to the parent when an
//!   auto-sized axis changed
//! - `dispatch_bubbling` — event delivery with parent-relay semantics

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::event::{
    Event, EventData, EventEmitter, EventKind, KeyInput, MouseButtons, Observer,
};
use crate::layout::StackState;
use crate::style::{Color, Style};
use crate::text::{InputState, TextState};
use crate::types::{Axis, Len, Pair, Position, Rect, ResizeAxes, Size};
use crate::window::{Window, WindowNode};

// =============================================================================
// Node storage
// =============================================================================

/// Widget-specific state. The set is closed: the engine dispatches on it
/// directly instead of going through a trait object, which keeps rendering
/// free of virtual calls and lets the layout inspect children's internals.
pub(crate) enum Kind {
    Blank,
    Text(TextState),
    Input(InputState),
    Stack(StackState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KindTag {
    Blank,
    Text,
    Input,
    Stack,
}

impl KindTag {
    const fn name(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Text => "text",
            Self::Input => "input",
            Self::Stack => "stack",
        }
    }
}

impl Kind {
    pub(crate) const fn tag(&self) -> KindTag {
        match self {
            Self::Blank => KindTag::Blank,
            Self::Text(_) => KindTag::Text,
            Self::Input(_) => KindTag::Input,
            Self::Stack(_) => KindTag::Stack,
        }
    }
}

/// Shared, widget-independent element state.
pub(crate) struct Core {
    pub(crate) id: Option<String>,
    pub(crate) classes: HashSet<String>,
    pub(crate) debug_id: String,
    /// Style set directly on this element.
    pub(crate) style: Style,
    /// `merge(parent_computed, style)`, recomputed on every cascade.
    pub(crate) computed: Style,
    /// Memoized desired size; `None` means "must renegotiate".
    pub(crate) desired: Option<Size>,
    // Render caches: what the last completed render used. The gate skips a
    // render when all three still match.
    pub(crate) render_rect: Option<Rect>,
    pub(crate) render_style: Option<Style>,
    pub(crate) render_size: Option<Size>,
    /// Next render must repaint even if the caches match.
    pub(crate) force: bool,
    pub(crate) focused: bool,
    pub(crate) parent: Weak<ElementNode>,
    pub(crate) window: Weak<WindowNode>,
}

pub(crate) struct ElementNode {
    pub(crate) core: RefCell<Core>,
    pub(crate) kind: RefCell<Kind>,
    pub(crate) events: EventEmitter<EventKind, Event>,
}

// =============================================================================
// Element handle
// =============================================================================

/// A handle to one element in the tree. Clones share the node; equality is
/// node identity.
pub struct Element(pub(crate) Rc<ElementNode>);

impl Clone for Element {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.core().debug_id)
    }
}

impl Element {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub(crate) fn from_kind(kind: Kind) -> Self {
        let name = kind.tag().name();
        Self(Rc::new(ElementNode {
            core: RefCell::new(Core {
                id: None,
                classes: HashSet::new(),
                debug_id: name.to_string(),
                style: Style::new(),
                computed: Style::new(),
                desired: None,
                render_rect: None,
                render_style: None,
                render_size: None,
                force: false,
                focused: false,
                parent: Weak::new(),
                window: Weak::new(),
            }),
            kind: RefCell::new(kind),
            events: EventEmitter::new(),
        }))
    }

    /// A bare element that paints its background and nothing else. It has no
    /// content to measure, so it must be styled with a non-auto size on both
    /// axes before it can participate in layout.
    pub fn blank() -> Self {
        Self::from_kind(Kind::Blank)
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        {
            let mut core = self.core_mut();
            let id = id.into();
            core.debug_id = id.clone();
            core.id = Some(id);
        }
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.core_mut().classes.insert(class.into());
        self
    }

    /// Seed the authored style. Until the element is attached its computed
    /// style equals the authored one.
    pub fn with_style(self, style: Style) -> Self {
        {
            let mut core = self.core_mut();
            core.style = style;
            core.computed = style;
        }
        self
    }

    // -------------------------------------------------------------------------
    // Identity and lookup
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Option<String> {
        self.core().id.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.core().classes.contains(class)
    }

    /// Human-readable path used in logs: the id when set, otherwise
    /// `parent[index].kind` assigned at attach time.
    pub fn debug_id(&self) -> String {
        self.core().debug_id.clone()
    }

    /// First element in this subtree (self included, depth-first) carrying
    /// `class`.
    pub fn query_selector(&self, class: &str) -> Option<Element> {
        let mut matches = Vec::new();
        self.query_into(class, &mut matches, true);
        matches.pop()
    }

    /// Every element in this subtree carrying `class`, depth-first.
    pub fn query_selector_all(&self, class: &str) -> Vec<Element> {
        let mut matches = Vec::new();
        self.query_into(class, &mut matches, false);
        matches
    }

    fn query_into(&self, class: &str, matches: &mut Vec<Element>, first_only: bool) -> bool {
        if self.has_class(class) {
            matches.push(self.clone());
            if first_only {
                return true;
            }
        }
        for child in self.children_snapshot() {
            if child.query_into(class, matches, first_only) {
                return true;
            }
        }
        false
    }

    pub fn parent(&self) -> Option<Element> {
        self.core().parent.upgrade().map(Element)
    }

    pub fn window(&self) -> Option<Window> {
        self.window_node().map(Window::from_node)
    }

    /// The screen region the last render drew into, if any.
    pub fn screen_rect(&self) -> Option<Rect> {
        self.core().render_rect
    }

    /// Whether `position` falls inside the last rendered region.
    pub fn contains(&self, position: Position) -> bool {
        self.core()
            .render_rect
            .is_some_and(|rect| rect.contains(position))
    }

    /// The element at `position` in this subtree, or `None` on a miss.
    pub fn find_descendant_at_position(&self, position: Position) -> Option<Element> {
        if self.kind_tag() == KindTag::Stack {
            return crate::layout::stack_find_descendant(self, position);
        }
        self.contains(position).then(|| self.clone())
    }

    // -------------------------------------------------------------------------
    // Event subscription
    // -------------------------------------------------------------------------

    /// Subscribe to one event type on this element. Events bubbling through
    /// from descendants fire here too. The returned handle identifies the
    /// observer for [`Element::off`].
    pub fn on(&self, kind: EventKind, observer: impl Fn(&Event) + 'static) -> Observer<Event> {
        let observer: Observer<Event> = Rc::new(observer);
        self.0.events.on(kind, Rc::clone(&observer));
        observer
    }

    pub fn off(&self, kind: EventKind, observer: &Observer<Event>) {
        self.0.events.off(kind, observer);
    }

    /// Subscribe to every event type on this element.
    pub fn on_any(&self, observer: impl Fn(&Event) + 'static) -> Observer<Event> {
        let observer: Observer<Event> = Rc::new(observer);
        self.0.events.on_any(Rc::clone(&observer));
        observer
    }

    pub fn off_any(&self, observer: &Observer<Event>) {
        self.0.events.off_any(observer);
    }

    // -------------------------------------------------------------------------
    // Style cascade
    // -------------------------------------------------------------------------

    /// The style authored directly on this element.
    pub fn style(&self) -> Style {
        self.core().style
    }

    /// The effective style after cascading from ancestors.
    pub fn computed_style(&self) -> Style {
        self.core().computed
    }

    pub fn is_displayed(&self) -> bool {
        self.core().computed.is_displayed()
    }

    /// Merge `patch` into the authored style, recompute the cascade for this
    /// subtree and redraw. A size change renegotiates both axes; a display
    /// change additionally forces the repaint.
    pub fn set_style(&self, patch: Style) -> Result<()> {
        let computed = {
            let mut core = self.core_mut();
            core.style = Style::merge(core.style, patch);
            Style::merge(core.computed, core.style)
        };
        for child in self.children_snapshot() {
            child.cascade_style(computed, false)?;
        }
        self.update_style(computed, true)
    }

    /// Recompute this subtree's computed styles from a new parent style.
    /// Only the parent's inheritable properties flow in.
    pub(crate) fn cascade_style(&self, parent_computed: Style, render: bool) -> Result<()> {
        let computed = Style::merge(parent_computed.inheritable(), self.core().style);
        for child in self.children_snapshot() {
            child.cascade_style(computed, false)?;
        }
        self.update_style(computed, render)
    }

    fn update_style(&self, computed: Style, render: bool) -> Result<()> {
        let (resize, force) = {
            let mut core = self.core_mut();
            let mut resize = None;
            let mut force = false;
            if computed.size != core.computed.size {
                resize = Some(ResizeAxes::splat(true));
            }
            if computed.display != core.computed.display {
                resize = Some(ResizeAxes::splat(true));
                force = true;
            }
            core.computed = computed;
            if !render && resize.is_some() {
                core.desired = None;
            }
            (resize, force)
        };
        if render {
            self.rerender(force, resize)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Size negotiation
    // -------------------------------------------------------------------------

    /// The size this element wants, memoized until invalidated by a style or
    /// content change. `max` caps content measurement; `force` bypasses the
    /// memo.
    pub fn desired_size(&self, max: Pair<i32>, force: bool) -> Result<Size> {
        if !force {
            if let Some(desired) = self.core().desired {
                return Ok(desired);
            }
        }
        let desired = match self.kind_tag() {
            KindTag::Blank => self.styled_desired_size()?,
            KindTag::Text => crate::text::text_desired_size(self, max)?,
            KindTag::Input => crate::text::input_desired_size(self, max)?,
            KindTag::Stack => crate::layout::stack_desired_size(self, max)?,
        };
        self.core_mut().desired = Some(desired);
        Ok(desired)
    }

    /// Desired size from the style alone. Hidden elements take no space; an
    /// auto axis means the style does not determine the size and the caller
    /// must measure content instead (for content-free leaves that is a
    /// configuration error).
    pub(crate) fn styled_desired_size(&self) -> Result<Size> {
        let (computed, debug_id) = {
            let core = self.core();
            (core.computed, core.debug_id.clone())
        };
        if !computed.is_displayed() {
            return Ok(Size::cells(0, 0));
        }
        let width = computed.extent(Axis::Horizontal).as_len();
        let height = computed.extent(Axis::Vertical).as_len();
        match (width, height) {
            (Some(w), Some(h)) => Ok(self.margined_size(Pair::new(w, h))),
            _ => Err(Error::UndefinedSize(debug_id)),
        }
    }

    /// Add this element's margins onto a content size. Fill axes stay fill;
    /// margins only widen concrete lengths.
    pub(crate) fn margined_size(&self, size: Size) -> Size {
        let computed = self.core().computed;
        if !computed.is_displayed() {
            return size;
        }
        let margin = computed.margin();
        let mut out = size;
        for axis in [Axis::Horizontal, Axis::Vertical] {
            if let Len::Cells(n) = out[axis] {
                out[axis] = Len::Cells(n + margin.along(axis));
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Draw this element into `rect`. Parents call this during their own
    /// render; the window calls it on the root.
    pub(crate) fn render(&self, rect: Rect, force: bool) -> Result<()> {
        match self.kind_tag() {
            KindTag::Blank => self.render_blank(rect, force),
            KindTag::Text => crate::text::render_text(self, rect, force),
            KindTag::Input => crate::text::render_input(self, rect, force),
            KindTag::Stack => crate::layout::render_stack(self, rect, force),
        }
    }

    fn render_blank(&self, rect: Rect, force: bool) -> Result<()> {
        if !self.should_render(rect, force) || !self.can_display(rect) {
            self.finish_render(rect);
            return Ok(());
        }
        let desired = self.desired_size(rect.size, false)?;
        self.clear_region(rect);
        self.core_mut().render_size = Some(desired);
        self.finish_render(rect);
        Ok(())
    }

    /// The render gate: draw only when something observable changed since the
    /// cached render, or when forced.
    pub(crate) fn should_render(&self, rect: Rect, force: bool) -> bool {
        self.is_dirty(force) || Some(rect) != self.core().render_rect
    }

    /// Dirty check against the caches, ignoring the target rect. A stack is
    /// dirty when any child is.
    pub(crate) fn is_dirty(&self, force: bool) -> bool {
        {
            let core = self.core();
            if force || core.force {
                return true;
            }
            if core.render_style != Some(core.computed) || core.render_size != core.desired {
                return true;
            }
        }
        match &*self.0.kind.borrow() {
            Kind::Blank => false,
            Kind::Text(text) => text.is_dirty(),
            Kind::Input(input) => input.is_dirty(),
            Kind::Stack(stack) => stack.children.iter().any(|child| child.is_dirty(force)),
        }
    }

    pub(crate) fn can_display(&self, rect: Rect) -> bool {
        rect.is_visible() && self.window_node().is_some()
    }

    /// Render epilogue: update the caches, and drop them entirely for hidden
    /// elements so a later `display` flip renders from a clean slate.
    pub(crate) fn finish_render(&self, rect: Rect) {
        let mut core = self.core_mut();
        core.force = false;
        core.render_rect = Some(rect);
        core.render_style = Some(core.computed);
        if !core.computed.is_displayed() {
            core.render_size = None;
            core.render_rect = None;
            core.render_style = None;
        }
    }

    /// Paint `rect` with this element's background color.
    pub(crate) fn clear_region(&self, rect: Rect) {
        let Some(window) = self.window_node() else {
            return;
        };
        if !rect.is_visible() {
            return;
        }
        let background = self.core().computed.background();
        let blank = " ".repeat(rect.size.x as usize);
        for row in 0..rect.size.y {
            window.print_at(
                &blank,
                Pair::new(rect.position.x, rect.position.y + row),
                Color::Reset,
                background,
            );
        }
    }

    // -------------------------------------------------------------------------
    // Self-initiated redraws and resize escalation
    // -------------------------------------------------------------------------

    /// Redraw after a local change. Returns `Ok(true)` when this element
    /// repainted in place; `Ok(false)` when it is detached, or when the
    /// change resized an auto axis and was escalated to the parent instead
    /// (the parent re-runs layout and repaints the subtree).
    pub(crate) fn rerender(&self, force: bool, resize: Option<ResizeAxes>) -> Result<bool> {
        let Some(window) = self.window_node() else {
            return Ok(false);
        };
        let (computed, rect) = {
            let mut core = self.core_mut();
            core.force = true;
            (core.computed, core.render_rect)
        };
        let is_root = window.is_root(self);
        if let Some(axes) = resize {
            if (axes.x || axes.y) && !is_root {
                let escalate = ResizeAxes::new(
                    axes.x && computed.extent(Axis::Horizontal).is_auto(),
                    axes.y && computed.extent(Axis::Vertical).is_auto(),
                );
                if force || escalate.x || escalate.y {
                    self.core_mut().desired = None;
                    self.request_resize(escalate)?;
                    return Ok(false);
                }
            }
        }
        match rect {
            // Never rendered: only the parent knows where this belongs.
            None => {
                self.request_resize(ResizeAxes::splat(true))?;
                Ok(false)
            }
            Some(rect) => {
                self.render(rect, force)?;
                window.refresh()?;
                Ok(true)
            }
        }
    }

    fn request_resize(&self, axes: ResizeAxes) -> Result<()> {
        tracing::trace!(element = %self.debug_id(), x = axes.x, y = axes.y, "resize escalation");
        let event = Event::new(EventKind::Resize, self, EventData::Resize(axes));
        self.0.events.emit(EventKind::Resize, &event);
        if let Some(parent) = self.parent() {
            parent.rerender(false, Some(axes))?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    pub fn is_focused(&self) -> bool {
        self.core().focused
    }

    /// Make this the window's single focus holder. The previous holder is
    /// blurred first; focusing the current holder is a no-op.
    pub fn focus(&self) -> Result<()> {
        let Some(window) = self.window_node() else {
            return Ok(());
        };
        if window.focused_is(self) {
            return Ok(());
        }
        self.core_mut().focused = true;
        window.set_focus(self)?;
        self.dispatch_bubbling(EventKind::Focus, EventData::None)
    }

    /// Give up focus. A no-op unless this element holds it.
    pub fn blur(&self) -> Result<()> {
        if !self.core().focused {
            return Ok(());
        }
        self.core_mut().focused = false;
        if let Some(window) = self.window_node() {
            window.clear_focus(self);
        }
        self.dispatch_bubbling(EventKind::Blur, EventData::None)
    }

    // -------------------------------------------------------------------------
    // Event dispatch
    // -------------------------------------------------------------------------

    /// Emit an event on this element and bubble it through the ancestor
    /// chain. At each level the engine's built-in reaction runs before user
    /// observers; `stop_propagation` halts the climb after the current level
    /// finishes.
    pub(crate) fn dispatch_bubbling(&self, kind: EventKind, data: EventData) -> Result<()> {
        let event = Event::new(kind, self, data);
        self.built_in_handle(&event)?;
        self.0.events.emit(kind, &event);
        let mut level = self.clone();
        while let Some(parent) = level.parent() {
            // Scroll containers track descendant focus even when the event
            // does not reach their observers.
            parent.handle_child_event(&event, &level)?;
            if event.propagation_stopped() {
                break;
            }
            event.set_current_target(&parent);
            parent.built_in_handle(&event)?;
            parent.0.events.emit(kind, &event);
            level = parent;
        }
        Ok(())
    }

    fn built_in_handle(&self, event: &Event) -> Result<()> {
        match (self.kind_tag(), event.kind) {
            (KindTag::Stack, EventKind::Keyboard) => crate::layout::stack_on_keyboard(self, event),
            (KindTag::Stack, EventKind::Mouse) => crate::layout::stack_on_mouse(self, event),
            // The input repaints on focus change to show or hide its cursor.
            (KindTag::Input, EventKind::Focus | EventKind::Blur) => {
                self.rerender(true, None).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    fn handle_child_event(&self, event: &Event, child: &Element) -> Result<()> {
        if self.kind_tag() == KindTag::Stack && event.kind == EventKind::Focus {
            crate::layout::stack_on_descendant_focus(self, child)?;
        }
        Ok(())
    }

    /// Route a key to this element: inputs edit first, then the event
    /// bubbles.
    pub(crate) fn dispatch_key(&self, input: KeyInput) -> Result<()> {
        if self.kind_tag() == KindTag::Input {
            crate::text::input_key_press(self, input)
        } else {
            self.dispatch_bubbling(EventKind::Keyboard, EventData::Keyboard(input))
        }
    }

    /// Deliver a mouse hit: the event bubbles, then a button press moves
    /// focus here when the window has click-to-focus enabled.
    pub(crate) fn dispatch_mouse(&self, position: Position, buttons: MouseButtons) -> Result<()> {
        self.dispatch_bubbling(EventKind::Mouse, EventData::Mouse { position, buttons })?;
        if !buttons.is_empty() {
            if let Some(window) = self.window_node() {
                if window.click_to_focus() {
                    self.focus()?;
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Attachment
    // -------------------------------------------------------------------------

    /// Wire this subtree under `parent`: cascade styles, adopt the parent's
    /// window, register ids. `index` only feeds the debug path.
    pub(crate) fn attach_to_parent(&self, parent: &Element, index: usize) -> Result<()> {
        self.cascade_style(parent.computed_style(), false)?;
        let debug_id = {
            let core = self.core();
            match &core.id {
                Some(id) => id.clone(),
                None => format!(
                    "{}[{}].{}",
                    parent.debug_id(),
                    index,
                    self.kind_tag().name()
                ),
            }
        };
        {
            let mut core = self.core_mut();
            core.parent = Rc::downgrade(&parent.0);
            core.window = parent.window_weak();
            core.debug_id = debug_id;
        }
        if self.core().id.is_some() {
            if let Some(window) = self.window_node() {
                window.register(self)?;
            }
        }
        for (i, child) in self.children_snapshot().into_iter().enumerate() {
            child.attach_to_parent(self, i)?;
        }
        Ok(())
    }

    /// Wire this subtree as a window's root.
    pub(crate) fn attach_to_window(&self, window: &Rc<WindowNode>) -> Result<()> {
        let debug_id = self.core().id.clone().unwrap_or_else(|| "root".to_string());
        {
            let mut core = self.core_mut();
            core.window = Rc::downgrade(window);
            core.parent = Weak::new();
            core.debug_id = debug_id;
        }
        if self.core().id.is_some() {
            window.register(self)?;
        }
        for (i, child) in self.children_snapshot().into_iter().enumerate() {
            child.attach_to_parent(self, i)?;
        }
        Ok(())
    }

    /// Sever this element from its parent and window. The subtree below
    /// keeps its internal parent links but loses window access, focus and id
    /// registration.
    pub(crate) fn detach(&self) {
        self.release_window();
        self.core_mut().parent = Weak::new();
    }

    fn release_window(&self) {
        if let Some(window) = self.window_node() {
            if self.core().id.is_some() {
                window.unregister(self);
            }
            if self.core().focused {
                window.clear_focus(self);
                self.core_mut().focused = false;
            }
        }
        self.core_mut().window = Weak::new();
        for child in self.children_snapshot() {
            child.release_window();
        }
    }

    // -------------------------------------------------------------------------
    // Internal accessors
    // -------------------------------------------------------------------------

    pub(crate) fn core(&self) -> Ref<'_, Core> {
        self.0.core.borrow()
    }

    pub(crate) fn core_mut(&self) -> RefMut<'_, Core> {
        self.0.core.borrow_mut()
    }

    pub(crate) fn kind(&self) -> Ref<'_, Kind> {
        self.0.kind.borrow()
    }

    pub(crate) fn kind_mut(&self) -> RefMut<'_, Kind> {
        self.0.kind.borrow_mut()
    }

    pub(crate) fn kind_tag(&self) -> KindTag {
        self.0.kind.borrow().tag()
    }

    pub(crate) fn window_node(&self) -> Option<Rc<WindowNode>> {
        self.core().window.upgrade()
    }

    pub(crate) fn window_weak(&self) -> Weak<WindowNode> {
        self.core().window.clone()
    }

    /// Direct children (empty for leaves), cloned out so callers never hold
    /// the kind borrow across recursion.
    pub(crate) fn children_snapshot(&self) -> Vec<Element> {
        match &*self.0.kind.borrow() {
            Kind::Stack(stack) => stack.children.clone(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Display, Margin};
    use crate::types::Extent;

    const MAX: Pair<i32> = Pair::new(80, 24);

    #[test]
    fn test_blank_without_size_is_a_configuration_error() {
        let blank = Element::blank().with_id("bare");
        match blank.desired_size(MAX, false) {
            Err(Error::UndefinedSize(id)) => assert_eq!(id, "bare"),
            other => panic!("expected UndefinedSize, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_with_one_auto_axis_still_fails() {
        let blank = Element::blank()
            .with_style(Style::new().with_size(Extent::Cells(4), Extent::Auto));
        assert!(matches!(
            blank.desired_size(MAX, false),
            Err(Error::UndefinedSize(_))
        ));
    }

    #[test]
    fn test_styled_size_includes_margins() {
        let blank = Element::blank().with_style(
            Style::new()
                .with_size(Extent::Cells(4), Extent::Cells(2))
                .with_margin(Margin::new(1, 2, 3, 4)),
        );
        assert_eq!(blank.desired_size(MAX, false).unwrap(), Size::cells(7, 9));
    }

    #[test]
    fn test_fill_axes_ignore_margins() {
        let blank = Element::blank().with_style(
            Style::new()
                .with_size(Extent::Fill, Extent::Cells(2))
                .with_margin(Margin::uniform(1)),
        );
        let desired = blank.desired_size(MAX, false).unwrap();
        assert_eq!(desired.x, Len::Fill);
        assert_eq!(desired.y, Len::Cells(4));
    }

    #[test]
    fn test_hidden_element_takes_no_space() {
        let blank = Element::blank().with_style(
            Style::new()
                .with_size(Extent::Cells(4), Extent::Cells(2))
                .with_display(Display::None),
        );
        assert_eq!(blank.desired_size(MAX, false).unwrap(), Size::cells(0, 0));
    }

    #[test]
    fn test_desired_size_is_memoized() {
        let blank = Element::blank()
            .with_style(Style::new().with_size(Extent::Cells(4), Extent::Cells(2)));
        assert_eq!(blank.desired_size(MAX, false).unwrap(), Size::cells(4, 2));

        // A direct core poke is invisible until the memo is invalidated.
        blank.core_mut().computed.size = Some(Pair::splat(Extent::Cells(9)));
        assert_eq!(blank.desired_size(MAX, false).unwrap(), Size::cells(4, 2));
        assert_eq!(blank.desired_size(MAX, true).unwrap(), Size::cells(9, 9));
    }

    #[test]
    fn test_set_style_merges_into_authored_and_computed() {
        let blank = Element::blank()
            .with_style(Style::new().with_size(Extent::Cells(4), Extent::Cells(2)));
        blank
            .set_style(Style::new().with_foreground(Color::Red))
            .unwrap();

        let computed = blank.computed_style();
        assert_eq!(computed.foreground, Some(Color::Red));
        // Untouched fields survive the patch.
        assert_eq!(
            computed.size,
            Some(Pair::new(Extent::Cells(4), Extent::Cells(2)))
        );
    }

    #[test]
    fn test_cascade_carries_paint_but_not_layout_properties() {
        let stack = Element::stack(Axis::Vertical).with_style(
            Style::new()
                .with_full_size()
                .with_margin(Margin::uniform(1))
                .with_background(Color::Blue),
        );
        let child = Element::text("hi");
        stack.add_child(child.clone()).unwrap();

        let computed = child.computed_style();
        assert_eq!(computed.background, Some(Color::Blue));
        // The parent's box properties stay its own: the child still measures
        // by content instead of filling the container.
        assert_eq!(computed.size, None);
        assert_eq!(computed.margin, None);
        assert_eq!(child.desired_size(MAX, false).unwrap(), Size::cells(2, 1));
    }

    #[test]
    fn test_focus_without_window_is_a_noop() {
        let blank = Element::blank();
        blank.focus().unwrap();
        assert!(!blank.is_focused());
    }

    #[test]
    fn test_query_selector_matches_self() {
        let blank = Element::blank().with_class("panel");
        assert!(blank.query_selector("panel").is_some());
        assert!(blank.query_selector("missing").is_none());
        assert_eq!(blank.query_selector_all("panel").len(), 1);
    }
}
