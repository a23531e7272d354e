//! The window: terminal session, root element, focus, id registry, poll loop.
//!
//! A [`Window`] owns one [`Terminal`] backend and at most one root element.
//! [`Window::run`] attaches the root, focuses it, performs a forced full
//! render, then drives the session: watch for terminal resizes, drain raw
//! input (keys to the focused element, mouse through hit-testing), and tick
//! until [`Window::request_exit`] or an error tears the session down.
//!
//! Elements reach back through a weak handle for draws, refreshes, focus
//! bookkeeping and id lookups, so the window outliving the tree is never
//! assumed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::backend::{RawInput, Terminal};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::event::MouseButtons;
use crate::style::Color;
use crate::types::{Pair, Position, Rect};

/// How long one poll-loop tick waits for input before checking flags again.
const TICK: Duration = Duration::from_millis(10);

// =============================================================================
// WindowNode - shared state elements point back into
// =============================================================================

pub(crate) struct WindowNode {
    terminal: RefCell<Box<dyn Terminal>>,
    root: RefCell<Option<Element>>,
    focused: RefCell<Option<Element>>,
    registry: RefCell<HashMap<String, Element>>,
    click_to_focus: Cell<bool>,
    exit: Cell<bool>,
    closed: Cell<bool>,
    dimensions: Cell<Pair<i32>>,
}

impl WindowNode {
    /// Record an element under its id. Re-registering the same element is a
    /// no-op; a different element with the same id is an error.
    pub(crate) fn register(&self, element: &Element) -> Result<()> {
        let Some(id) = element.id() else {
            return Ok(());
        };
        let mut registry = self.registry.borrow_mut();
        if let Some(existing) = registry.get(&id) {
            if existing == element {
                return Ok(());
            }
            return Err(Error::DuplicateId(id));
        }
        registry.insert(id, element.clone());
        Ok(())
    }

    /// Drop an element's id entry. Only removes the entry when it still
    /// points at this element, so a re-registered id survives a stale detach.
    pub(crate) fn unregister(&self, element: &Element) {
        let Some(id) = element.id() else {
            return;
        };
        let mut registry = self.registry.borrow_mut();
        if registry.get(&id).is_some_and(|entry| entry == element) {
            registry.remove(&id);
        }
    }

    /// Move focus to `element`, blurring the previous holder first.
    pub(crate) fn set_focus(&self, element: &Element) -> Result<()> {
        let previous = self.focused.borrow_mut().take();
        if let Some(previous) = previous {
            previous.blur()?;
        }
        *self.focused.borrow_mut() = Some(element.clone());
        Ok(())
    }

    /// Clear focus, but only if `element` still holds it.
    pub(crate) fn clear_focus(&self, element: &Element) {
        let mut focused = self.focused.borrow_mut();
        if focused.as_ref().is_some_and(|holder| holder == element) {
            *focused = None;
        }
    }

    pub(crate) fn focused_is(&self, element: &Element) -> bool {
        self.focused
            .borrow()
            .as_ref()
            .is_some_and(|holder| holder == element)
    }

    pub(crate) fn is_root(&self, element: &Element) -> bool {
        self.root
            .borrow()
            .as_ref()
            .is_some_and(|root| root == element)
    }

    pub(crate) fn click_to_focus(&self) -> bool {
        self.click_to_focus.get()
    }

    pub(crate) fn refresh(&self) -> Result<()> {
        self.terminal.borrow_mut().refresh()?;
        Ok(())
    }

    /// Draw on behalf of an element. Draw failures are logged rather than
    /// unwound through the render recursion; the next refresh surfaces any
    /// persistent backend failure.
    pub(crate) fn print_at(
        &self,
        text: &str,
        position: Position,
        foreground: Color,
        background: Color,
    ) {
        let result = self
            .terminal
            .borrow_mut()
            .print_at(text, position, foreground, background);
        if let Err(error) = result {
            tracing::error!(%error, x = position.x, y = position.y, "draw failed");
        }
    }

    fn teardown(&self) {
        if self.closed.replace(true) {
            return;
        }
        if let Err(error) = self.terminal.borrow_mut().close() {
            tracing::error!(%error, "terminal close failed");
        }
    }
}

impl Drop for WindowNode {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Window - public handle
// =============================================================================

/// Handle to a terminal window. Clones share the same session, so event
/// observers can capture one to call [`Window::request_exit`] or look up
/// elements by id.
#[derive(Clone)]
pub struct Window(Rc<WindowNode>);

impl Window {
    pub fn new(terminal: Box<dyn Terminal>) -> Self {
        let dimensions = terminal.dimensions();
        Self(Rc::new(WindowNode {
            terminal: RefCell::new(terminal),
            root: RefCell::new(None),
            focused: RefCell::new(None),
            registry: RefCell::new(HashMap::new()),
            click_to_focus: Cell::new(true),
            exit: Cell::new(false),
            closed: Cell::new(false),
            dimensions: Cell::new(dimensions),
        }))
    }

    pub(crate) fn from_node(node: Rc<WindowNode>) -> Self {
        Self(node)
    }

    /// When enabled (the default), a mouse click focuses the element it hit.
    pub fn set_click_to_focus(&self, enabled: bool) {
        self.0.click_to_focus.set(enabled);
    }

    /// The element registered under `id`, if attached.
    pub fn element_by_id(&self, id: &str) -> Option<Element> {
        self.0.registry.borrow().get(id).cloned()
    }

    /// The current focus holder.
    pub fn focused(&self) -> Option<Element> {
        self.0.focused.borrow().clone()
    }

    /// The attached root element.
    pub fn root(&self) -> Option<Element> {
        self.0.root.borrow().clone()
    }

    /// Ask the poll loop to finish its current tick and tear the session
    /// down. Safe to call from any event observer.
    pub fn request_exit(&self) {
        self.0.exit.set(true);
    }

    /// Attach `root`, render it, and drive the session until
    /// [`Window::request_exit`] or a failure. The terminal is restored
    /// before returning either way.
    pub fn run(&self, root: Element) -> Result<()> {
        let result = self.attach(root).and_then(|_| self.poll_loop());
        self.0.teardown();
        if let Err(error) = &result {
            tracing::error!(%error, "window session failed");
        }
        result
    }

    fn attach(&self, root: Element) -> Result<()> {
        if self.0.root.borrow().is_some() {
            return Err(Error::RootAlreadyAttached);
        }
        *self.0.root.borrow_mut() = Some(root.clone());
        root.attach_to_window(&self.0)?;
        root.focus()?;
        self.render_full(true)
    }

    fn poll_loop(&self) -> Result<()> {
        loop {
            if self.0.exit.get() {
                return Ok(());
            }
            if self.0.terminal.borrow_mut().has_resized() {
                self.render_full(false)?;
            }
            // First poll doubles as the tick sleep; the rest drain whatever
            // queued up without waiting.
            let mut wait = TICK;
            loop {
                let input = self.0.terminal.borrow_mut().poll_input(wait)?;
                let Some(input) = input else {
                    break;
                };
                wait = Duration::ZERO;
                match input {
                    RawInput::Key(input) => {
                        if let Some(focused) = self.focused() {
                            focused.dispatch_key(input)?;
                        }
                    }
                    RawInput::Mouse { position, buttons } => {
                        self.route_mouse(position, buttons)?;
                    }
                }
                if self.0.exit.get() {
                    return Ok(());
                }
            }
        }
    }

    /// Clear the screen and re-render the whole tree. Unless forced, skipped
    /// when the terminal still has the dimensions of the last full render.
    fn render_full(&self, force: bool) -> Result<()> {
        let dimensions = self.0.terminal.borrow_mut().dimensions();
        if !force && dimensions == self.0.dimensions.get() {
            return Ok(());
        }
        self.0.dimensions.set(dimensions);
        tracing::trace!(width = dimensions.x, height = dimensions.y, "full render");
        self.0.terminal.borrow_mut().clear()?;
        if let Some(root) = self.root() {
            root.render(Rect::new(dimensions, Pair::new(0, 0)), true)?;
        }
        self.0.refresh()
    }

    fn route_mouse(&self, position: Position, buttons: MouseButtons) -> Result<()> {
        let Some(root) = self.root() else {
            return Ok(());
        };
        match root.find_descendant_at_position(position) {
            Some(element) => element.dispatch_mouse(position, buttons),
            None => {
                tracing::warn!(x = position.x, y = position.y, "mouse event hit nothing");
                Ok(())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
