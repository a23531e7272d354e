//! Hello world: a full-screen stack with one centered text line.
//!
//! Run with `cargo run --example hello`; press `q` or escape to quit.

use spark_dom::{Axis, Color, CrosstermTerminal, Element, EventKind, Style, TextAlign, Window};

fn main() -> spark_dom::Result<()> {
    let text = Element::text("Hello world!").with_style(
        Style::default()
            .with_full_size()
            .with_text_align(TextAlign::Center),
    );
    let root = Element::stack(Axis::Vertical)
        .with_id("window")
        .with_style(Style::default().with_background(Color::Black))
        .with_children(vec![text])?;

    let window = Window::new(Box::new(CrosstermTerminal::new()?));
    let handle = window.clone();
    root.on(EventKind::Keyboard, move |event| {
        let quit = event
            .key()
            .is_some_and(|k| k.as_char() == Some('q') || (k.special && k.code == 27));
        if quit {
            handle.request_exit();
        }
    });
    window.run(root)
}
