//! Event bus and the DOM event vocabulary.
//!
//! [`EventEmitter`] is a typed publish/subscribe bus that is safe to mutate
//! from inside its own observers: blur/focus handlers routinely subscribe and
//! unsubscribe while an emission is in flight, so mutations issued during an
//! emission are queued and applied only after the outermost emission
//! completes. An observer removed mid-emission still fires during the
//! in-progress emission; one added mid-emission first fires on the next.
//!
//! Observer panics are not swallowed: they propagate to the emitting caller
//! and abort the remaining observers as well as the deferred-mutation flush.
//! The window is responsible for containment.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::element::Element;
use crate::types::{Position, ResizeAxes};

// =============================================================================
// EventEmitter
// =============================================================================

/// An observer callback. `off` matches by `Rc` identity, so keep the handle
/// you passed to `on` if you intend to unsubscribe.
pub type Observer<E> = Rc<dyn Fn(&E)>;

enum Pending<K, E> {
    On(K, Observer<E>),
    Off(K, Observer<E>),
    OnAny(Observer<E>),
    OffAny(Observer<E>),
}

/// Typed publish/subscribe bus with reentrancy-safe mutation.
///
/// Emission is synchronous, on the caller's thread: all type-specific
/// observers fire in registration order, then all global observers.
pub struct EventEmitter<K, E> {
    observers: RefCell<HashMap<K, Vec<Observer<E>>>>,
    any_observers: RefCell<Vec<Observer<E>>>,
    emit_depth: Cell<usize>,
    pending: RefCell<Vec<Pending<K, E>>>,
}

impl<K: Copy + Eq + Hash, E> EventEmitter<K, E> {
    pub fn new() -> Self {
        Self {
            observers: RefCell::new(HashMap::new()),
            any_observers: RefCell::new(Vec::new()),
            emit_depth: Cell::new(0),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Subscribe to one event type.
    pub fn on(&self, kind: K, observer: Observer<E>) {
        if self.emitting() {
            self.pending.borrow_mut().push(Pending::On(kind, observer));
        } else {
            self.observers
                .borrow_mut()
                .entry(kind)
                .or_default()
                .push(observer);
        }
    }

    /// Unsubscribe a previously registered observer (by `Rc` identity).
    pub fn off(&self, kind: K, observer: &Observer<E>) {
        if self.emitting() {
            self.pending
                .borrow_mut()
                .push(Pending::Off(kind, Rc::clone(observer)));
        } else if let Some(list) = self.observers.borrow_mut().get_mut(&kind) {
            list.retain(|o| !Rc::ptr_eq(o, observer));
        }
    }

    /// Subscribe to every event type. Global observers fire after the
    /// type-specific ones.
    pub fn on_any(&self, observer: Observer<E>) {
        if self.emitting() {
            self.pending.borrow_mut().push(Pending::OnAny(observer));
        } else {
            self.any_observers.borrow_mut().push(observer);
        }
    }

    /// Unsubscribe a global observer (by `Rc` identity).
    pub fn off_any(&self, observer: &Observer<E>) {
        if self.emitting() {
            self.pending
                .borrow_mut()
                .push(Pending::OffAny(Rc::clone(observer)));
        } else {
            self.any_observers
                .borrow_mut()
                .retain(|o| !Rc::ptr_eq(o, observer));
        }
    }

    /// Invoke all observers of `kind`, then all global observers,
    /// synchronously and in registration order.
    pub fn emit(&self, kind: K, event: &E) {
        // Snapshot before invoking so that deferred removals still fire and
        // deferred additions do not.
        let typed: Vec<Observer<E>> = self
            .observers
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        let any: Vec<Observer<E>> = self.any_observers.borrow().clone();

        self.emit_depth.set(self.emit_depth.get() + 1);
        for observer in typed.iter().chain(any.iter()) {
            observer(event);
        }
        self.emit_depth.set(self.emit_depth.get() - 1);

        // Nested emissions defer to the outermost one; a boolean flag here
        // would flush too early.
        if self.emit_depth.get() == 0 {
            self.flush_pending();
        }
    }

    fn emitting(&self) -> bool {
        self.emit_depth.get() > 0
    }

    fn flush_pending(&self) {
        let pending: Vec<Pending<K, E>> = self.pending.borrow_mut().drain(..).collect();
        for operation in pending {
            match operation {
                Pending::On(kind, observer) => self.on(kind, observer),
                Pending::Off(kind, observer) => self.off(kind, &observer),
                Pending::OnAny(observer) => self.on_any(observer),
                Pending::OffAny(observer) => self.off_any(&observer),
            }
        }
    }
}

impl<K: Copy + Eq + Hash, E> Default for EventEmitter<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// DOM events
// =============================================================================

/// The event types elements emit and bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Focus,
    Blur,
    Keyboard,
    Mouse,
    Resize,
}

bitflags::bitflags! {
    /// Mouse button state as delivered by the input backend.
    ///
    /// `is_right_click` tests `RIGHT` and `is_double_click` tests `DOUBLE`;
    /// backends are expected to honor the same mapping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const DOUBLE = 1 << 2;
        const SCROLL_DOWN = 1 << 3;
        const SCROLL_UP = 1 << 4;
    }
}

/// A raw keyboard input: an integer code plus a "special key" marker for
/// navigation keys that have no character representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub code: i32,
    pub special: bool,
}

impl KeyInput {
    pub const fn new(code: i32, special: bool) -> Self {
        Self { code, special }
    }

    /// Printable ASCII?
    pub const fn is_char(&self) -> bool {
        !self.special && 32 <= self.code && self.code <= 126
    }

    pub fn as_char(&self) -> Option<char> {
        if self.is_char() {
            char::from_u32(self.code as u32)
        } else {
            None
        }
    }
}

/// Key-code constants shared by the input backends and the widgets.
pub mod key {
    pub const ENTER: i32 = 10;
    pub const TAB: i32 = 9;

    pub const HOME: i32 = -200;
    pub const END: i32 = -201;

    pub const ARROW_LEFT: i32 = -203;
    pub const ARROW_UP: i32 = -204;
    pub const ARROW_RIGHT: i32 = -205;
    pub const ARROW_DOWN: i32 = -206;

    pub const PAGE_UP: i32 = -207;
    pub const PAGE_DOWN: i32 = -208;

    pub const DELETE: i32 = -102;
    pub const BACKSPACE: i32 = -300;

    // Readline-style editing controls (ctrl + letter).
    pub const CLEAR_LINE: i32 = 21; // ctrl+u
    pub const CLEAR_WORD_BACKWARD: i32 = 23; // ctrl+w
    pub const CLEAR_LINE_FORWARD: i32 = 11; // ctrl+k
    pub const MOVE_LINE_START: i32 = 1; // ctrl+a
    pub const MOVE_LINE_END: i32 = 5; // ctrl+e
    pub const MOVE_WORD_FORWARD: i32 = 102; // alt+right
    pub const MOVE_WORD_BACKWARD: i32 = 98; // alt+left
    pub const MOVE_WORD_FORWARD_CTRL: i32 = 6; // ctrl+f
    pub const MOVE_WORD_BACKWARD_CTRL: i32 = 2; // ctrl+b
}

/// Kind-specific payload carried by an [`Event`].
#[derive(Debug, Clone)]
pub enum EventData {
    None,
    Keyboard(KeyInput),
    Mouse {
        position: Position,
        buttons: MouseButtons,
    },
    Resize(ResizeAxes),
}

/// An event travelling through the element tree.
///
/// `target` is the element the event originated on; `current_target` is the
/// element whose observers are currently being invoked as the event bubbles.
pub struct Event {
    pub kind: EventKind,
    pub target: Element,
    pub data: EventData,
    current: RefCell<Element>,
    stop: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventKind, target: &Element, data: EventData) -> Self {
        Self {
            kind,
            target: target.clone(),
            data,
            current: RefCell::new(target.clone()),
            stop: Cell::new(false),
        }
    }

    /// The element whose observers are currently running.
    pub fn current_target(&self) -> Element {
        self.current.borrow().clone()
    }

    pub(crate) fn set_current_target(&self, element: &Element) {
        *self.current.borrow_mut() = element.clone();
    }

    /// Stop the event from bubbling past the current element.
    pub fn stop_propagation(&self) {
        self.stop.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stop.get()
    }

    // -------------------------------------------------------------------------
    // Payload accessors
    // -------------------------------------------------------------------------

    pub fn key(&self) -> Option<KeyInput> {
        match self.data {
            EventData::Keyboard(input) => Some(input),
            _ => None,
        }
    }

    pub fn mouse_position(&self) -> Option<Position> {
        match self.data {
            EventData::Mouse { position, .. } => Some(position),
            _ => None,
        }
    }

    pub fn mouse_buttons(&self) -> Option<MouseButtons> {
        match self.data {
            EventData::Mouse { buttons, .. } => Some(buttons),
            _ => None,
        }
    }

    pub fn is_left_click(&self) -> bool {
        self.mouse_buttons()
            .is_some_and(|b| b.contains(MouseButtons::LEFT))
    }

    pub fn is_right_click(&self) -> bool {
        self.mouse_buttons()
            .is_some_and(|b| b.contains(MouseButtons::RIGHT))
    }

    pub fn is_double_click(&self) -> bool {
        self.mouse_buttons()
            .is_some_and(|b| b.contains(MouseButtons::DOUBLE))
    }

    pub fn is_scroll_down(&self) -> bool {
        self.mouse_buttons()
            .is_some_and(|b| b.contains(MouseButtons::SCROLL_DOWN))
    }

    pub fn is_scroll_up(&self) -> bool {
        self.mouse_buttons()
            .is_some_and(|b| b.contains(MouseButtons::SCROLL_UP))
    }

    pub fn resize_axes(&self) -> Option<ResizeAxes> {
        match self.data {
            EventData::Resize(axes) => Some(axes),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type TestEmitter = EventEmitter<u8, u32>;

    fn recording_observer(log: &Rc<RefCell<Vec<String>>>, name: &str) -> Observer<u32> {
        let log = Rc::clone(log);
        let name = name.to_string();
        Rc::new(move |value: &u32| {
            log.borrow_mut().push(format!("{name}:{value}"));
        })
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[test]
    fn test_emit_runs_typed_then_global_in_registration_order() {
        let emitter = TestEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        emitter.on(1, recording_observer(&log, "a"));
        emitter.on_any(recording_observer(&log, "any"));
        emitter.on(1, recording_observer(&log, "b"));
        emitter.on(2, recording_observer(&log, "other"));

        emitter.emit(1, &7);

        assert_eq!(*log.borrow(), vec!["a:7", "b:7", "any:7"]);
    }

    #[test]
    fn test_off_removes_by_identity() {
        let emitter = TestEmitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let keep = recording_observer(&log, "keep");
        let drop = recording_observer(&log, "drop");
        emitter.on(1, Rc::clone(&keep));
        emitter.on(1, Rc::clone(&drop));
        emitter.off(1, &drop);

        emitter.emit(1, &1);
        assert_eq!(*log.borrow(), vec!["keep:1"]);
    }

    // =========================================================================
    // Reentrancy
    // =========================================================================

    #[test]
    fn test_observer_removed_mid_emission_still_fires() {
        let emitter = Rc::new(TestEmitter::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let second = recording_observer(&log, "second");
        let remover: Observer<u32> = {
            let emitter = Rc::clone(&emitter);
            let second = Rc::clone(&second);
            let log = Rc::clone(&log);
            Rc::new(move |_| {
                log.borrow_mut().push("remover".into());
                emitter.off(1, &second);
            })
        };
        emitter.on(1, remover);
        emitter.on(1, Rc::clone(&second));

        // Removal is deferred: "second" still fires this emission.
        emitter.emit(1, &1);
        assert_eq!(*log.borrow(), vec!["remover", "second:1"]);

        // But is gone on the next one.
        log.borrow_mut().clear();
        emitter.emit(1, &2);
        assert_eq!(*log.borrow(), vec!["remover"]);
    }

    #[test]
    fn test_observer_added_mid_emission_fires_next_emission() {
        let emitter = Rc::new(TestEmitter::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let adder: Observer<u32> = {
            let emitter = Rc::clone(&emitter);
            let log = Rc::clone(&log);
            Rc::new(move |_| {
                log.borrow_mut().push("adder".into());
                emitter.on(1, recording_observer(&log, "late"));
            })
        };
        emitter.on(1, adder);

        emitter.emit(1, &1);
        assert_eq!(*log.borrow(), vec!["adder"]);

        log.borrow_mut().clear();
        emitter.emit(1, &2);
        assert_eq!(*log.borrow(), vec!["adder", "late:2"]);
        // Only one copy was added per firing of the adder; clear state to
        // keep the assertion honest.
    }

    #[test]
    fn test_nested_emission_defers_flush_to_outermost() {
        let emitter = Rc::new(TestEmitter::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let nested: Observer<u32> = {
            let emitter = Rc::clone(&emitter);
            let log = Rc::clone(&log);
            Rc::new(move |value: &u32| {
                if *value == 1 {
                    // Subscribe during the outer emission, then emit a nested
                    // event. The new observer must not fire for either.
                    emitter.on(2, recording_observer(&log, "late"));
                    emitter.emit(2, &99);
                }
            })
        };
        emitter.on(1, nested);

        emitter.emit(1, &1);
        assert_eq!(log.borrow().len(), 0);

        emitter.emit(2, &3);
        assert_eq!(*log.borrow(), vec!["late:3"]);
    }

    // =========================================================================
    // Event payloads
    // =========================================================================

    #[test]
    fn test_key_input_char_classification() {
        assert_eq!(KeyInput::new(97, false).as_char(), Some('a'));
        assert!(!KeyInput::new(97, true).is_char());
        assert!(!KeyInput::new(key::ARROW_UP, true).is_char());
        assert!(!KeyInput::new(7, false).is_char());
    }

    #[test]
    fn test_mouse_button_mapping_is_consistent() {
        let buttons = MouseButtons::RIGHT | MouseButtons::SCROLL_UP;
        assert!(buttons.contains(MouseButtons::RIGHT));
        assert!(!buttons.contains(MouseButtons::DOUBLE));
        assert!(buttons.contains(MouseButtons::SCROLL_UP));
    }
}
