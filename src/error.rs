//! Error types.
//!
//! Two families, per the engine's error-handling design: configuration
//! errors (programmer mistakes — an element that resolves no concrete size, a
//! second root, an id collision) fail the offending operation immediately;
//! I/O errors from the terminal backend are contained by the window's poll
//! loop, which logs and tears the session down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A leaf element was asked for its desired size but neither its style
    /// nor its content resolves to a concrete size.
    #[error("element '{0}' does not define a concrete size")]
    UndefinedSize(String),

    /// `Window::run` was called while a root element is already attached.
    #[error("a root element is already attached to this window")]
    RootAlreadyAttached,

    /// Two attached elements within one window share an id.
    #[error("duplicate element id '{0}' within window")]
    DuplicateId(String),

    /// A child operation was invoked on a leaf element.
    #[error("element '{0}' cannot hold children")]
    NotAContainer(String),

    /// A content operation was invoked on an element kind that has no such
    /// content (e.g. `set_text` on an input).
    #[error("operation not supported by element '{0}'")]
    Unsupported(String),

    /// Terminal backend failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
