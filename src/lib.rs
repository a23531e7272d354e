//! # spark-dom
//!
//! Retained-mode DOM-style UI engine for the terminal.
//!
//! The tree is built from [`Element`] handles (blank boxes, text, inputs, and
//! scrollable stacks), styled with a cascading [`Style`], and driven by a
//! [`Window`] that owns the terminal session and the poll loop.
//!
//! ## Architecture
//!
//! Rendering is retained and demand-driven: every element memoizes its
//! desired size and the rect + style it last drew with, and a render gate
//! skips any element whose observable state is unchanged. Local mutations
//! repaint in place; mutations that change an auto-sized axis escalate to
//! the parent, which re-runs layout for the subtree.
//!
//! ```text
//! Element tree → style cascade → size negotiation → stack placement → draws
//! ```
//!
//! Events (focus, blur, keyboard, mouse, resize) bubble from their target to
//! the root; scroll containers consume the keys and wheel input they can act
//! on and let the rest continue upward.
//!
//! ## Modules
//!
//! - [`types`] - axes, sizes, rects
//! - [`style`] - the cascading style set
//! - [`element`] - the element tree and render gate
//! - [`layout`] - stack placement, scrolling, hit-testing
//! - [`text`] - text and input widgets
//! - [`event`] - event bus and bubbling
//! - [`window`] - terminal session and poll loop
//! - [`backend`] - terminal backends

pub mod backend;
pub mod element;
pub mod error;
pub mod event;
pub mod layout;
pub mod style;
pub mod text;
pub mod types;
pub mod window;

pub use backend::{CrosstermTerminal, RawInput, Terminal, TestTerminal};
pub use element::Element;
pub use error::{Error, Result};
pub use event::{key, Event, EventData, EventKind, KeyInput, MouseButtons, Observer};
pub use style::{Color, Display, Margin, Scroll, Style, TextAlign};
pub use types::{Axis, Extent, Len, Pair, Position, Rect, Size};
pub use window::Window;
