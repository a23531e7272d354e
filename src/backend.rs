//! Terminal backends.
//!
//! The engine draws through the [`Terminal`] trait: open/close a session,
//! absolute-position prints, a refresh flush, resize detection, and a polled
//! raw-input source. [`CrosstermTerminal`] is the real backend (raw mode +
//! alternate screen + mouse capture, restored on drop); [`TestTerminal`] is
//! an in-memory cell grid with scripted input for tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color as CtColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};

use crate::event::{key, KeyInput, MouseButtons};
use crate::style::Color;
use crate::types::{Pair, Position};

// =============================================================================
// Terminal trait
// =============================================================================

/// A decoded raw input from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Key(KeyInput),
    Mouse {
        position: Position,
        buttons: MouseButtons,
    },
}

/// The drawing and input surface the window runs against.
pub trait Terminal {
    /// Current logical size in cells.
    fn dimensions(&self) -> Pair<i32>;

    /// Blank the whole screen.
    fn clear(&mut self) -> io::Result<()>;

    /// Draw `text` starting at an absolute cell position, clipped to the
    /// screen. Drawn cells are not visible until [`Terminal::refresh`].
    fn print_at(
        &mut self,
        text: &str,
        position: Position,
        foreground: Color,
        background: Color,
    ) -> io::Result<()>;

    /// Flush buffered draws to the screen.
    fn refresh(&mut self) -> io::Result<()>;

    /// True once after the terminal changed size; reading resets the flag.
    fn has_resized(&mut self) -> bool;

    /// Wait up to `timeout` for one input. `None` means nothing arrived.
    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<RawInput>>;

    /// Release the terminal session. Idempotent.
    fn close(&mut self) -> io::Result<()>;
}

// =============================================================================
// Crossterm backend
// =============================================================================

/// The real terminal: raw mode, alternate screen, mouse capture, hidden
/// cursor. Everything is restored by [`Terminal::close`], or on drop as a
/// fallback.
pub struct CrosstermTerminal {
    out: io::Stdout,
    dimensions: Pair<i32>,
    resized: bool,
    closed: bool,
}

impl CrosstermTerminal {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, EnableMouseCapture, Hide)?;
        let (width, height) = terminal::size()?;
        Ok(Self {
            out,
            dimensions: Pair::new(width as i32, height as i32),
            resized: false,
            closed: false,
        })
    }
}

impl Terminal for CrosstermTerminal {
    fn dimensions(&self) -> Pair<i32> {
        self.dimensions
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor, Clear(ClearType::All))
    }

    fn print_at(
        &mut self,
        text: &str,
        position: Position,
        foreground: Color,
        background: Color,
    ) -> io::Result<()> {
        if position.y < 0 || position.y >= self.dimensions.y || position.x >= self.dimensions.x {
            return Ok(());
        }
        // Clip the text run to the screen edges.
        let skip = (-position.x).max(0) as usize;
        let x = position.x.max(0);
        let take = (self.dimensions.x - x).max(0) as usize;
        let visible: String = text.chars().skip(skip).take(take).collect();
        if visible.is_empty() {
            return Ok(());
        }
        queue!(
            self.out,
            MoveTo(x as u16, position.y as u16),
            SetForegroundColor(terminal_color(foreground)),
            SetBackgroundColor(terminal_color(background)),
            Print(visible),
        )
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn has_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    fn poll_input(&mut self, timeout: Duration) -> io::Result<Option<RawInput>> {
        let mut wait = timeout;
        loop {
            if !event::poll(wait)? {
                return Ok(None);
            }
            wait = Duration::ZERO;
            match event::read()? {
                Event::Resize(width, height) => {
                    self.dimensions = Pair::new(width as i32, height as i32);
                    self.resized = true;
                }
                Event::Key(event) => {
                    if let Some(input) = convert_key(event) {
                        return Ok(Some(RawInput::Key(input)));
                    }
                }
                Event::Mouse(event) => {
                    if let Some(input) = convert_mouse(event) {
                        return Ok(Some(input));
                    }
                }
                _ => {}
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        execute!(self.out, Show, DisableMouseCapture, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Map crossterm key events onto the engine's key codes: printable chars as
/// their codepoint, ctrl+letter as the control code the editing keys expect,
/// navigation keys as negative "special" codes.
fn convert_key(event: KeyEvent) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let input = match event.code {
        KeyCode::Char(c) if ctrl && c.is_ascii_alphabetic() => {
            KeyInput::new(c.to_ascii_lowercase() as i32 - 'a' as i32 + 1, false)
        }
        KeyCode::Char(c) => KeyInput::new(c as i32, false),
        KeyCode::Enter => KeyInput::new(key::ENTER, false),
        KeyCode::Tab => KeyInput::new(key::TAB, false),
        KeyCode::Backspace => KeyInput::new(key::BACKSPACE, true),
        KeyCode::Delete => KeyInput::new(key::DELETE, true),
        KeyCode::Home => KeyInput::new(key::HOME, true),
        KeyCode::End => KeyInput::new(key::END, true),
        // Special, not char: the codes alias printable `b`/`f` codepoints.
        KeyCode::Left if alt => KeyInput::new(key::MOVE_WORD_BACKWARD, true),
        KeyCode::Right if alt => KeyInput::new(key::MOVE_WORD_FORWARD, true),
        KeyCode::Left => KeyInput::new(key::ARROW_LEFT, true),
        KeyCode::Right => KeyInput::new(key::ARROW_RIGHT, true),
        KeyCode::Up => KeyInput::new(key::ARROW_UP, true),
        KeyCode::Down => KeyInput::new(key::ARROW_DOWN, true),
        KeyCode::PageUp => KeyInput::new(key::PAGE_UP, true),
        KeyCode::PageDown => KeyInput::new(key::PAGE_DOWN, true),
        KeyCode::Esc => KeyInput::new(27, true),
        _ => return None,
    };
    Some(input)
}

fn convert_mouse(event: MouseEvent) -> Option<RawInput> {
    let buttons = match event.kind {
        MouseEventKind::Down(MouseButton::Left) => MouseButtons::LEFT,
        MouseEventKind::Down(MouseButton::Right) => MouseButtons::RIGHT,
        MouseEventKind::ScrollDown => MouseButtons::SCROLL_DOWN,
        MouseEventKind::ScrollUp => MouseButtons::SCROLL_UP,
        _ => return None,
    };
    Some(RawInput::Mouse {
        position: Pair::new(event.column as i32, event.row as i32),
        buttons,
    })
}

fn terminal_color(color: Color) -> CtColor {
    match color {
        Color::Reset => CtColor::Reset,
        Color::Black => CtColor::Black,
        Color::Red => CtColor::Red,
        Color::Green => CtColor::Green,
        Color::Yellow => CtColor::Yellow,
        Color::Blue => CtColor::Blue,
        Color::Magenta => CtColor::Magenta,
        Color::Cyan => CtColor::Cyan,
        Color::White => CtColor::White,
        Color::Grey => CtColor::Grey,
        Color::DarkGrey => CtColor::DarkGrey,
        Color::Ansi(value) => CtColor::AnsiValue(value),
    }
}

// =============================================================================
// Test backend
// =============================================================================

/// One recorded `print_at` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub text: String,
    pub position: Position,
    pub foreground: Color,
    pub background: Color,
}

struct TestState {
    size: Pair<i32>,
    grid: Vec<Vec<char>>,
    draws: Vec<DrawCall>,
    refreshes: usize,
    inputs: VecDeque<RawInput>,
    resized: bool,
    closed: bool,
}

/// An in-memory terminal: a character grid plus a draw-call log and a queue
/// of scripted inputs. Clones share state, so tests can keep a handle after
/// moving one into a window.
#[derive(Clone)]
pub struct TestTerminal {
    state: Rc<RefCell<TestState>>,
}

impl TestTerminal {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            state: Rc::new(RefCell::new(TestState {
                size: Pair::new(width, height),
                grid: blank_grid(width, height),
                draws: Vec::new(),
                refreshes: 0,
                inputs: VecDeque::new(),
                resized: false,
                closed: false,
            })),
        }
    }

    pub fn push_input(&self, input: RawInput) {
        self.state.borrow_mut().inputs.push_back(input);
    }

    pub fn push_key(&self, code: i32, special: bool) {
        self.push_input(RawInput::Key(KeyInput::new(code, special)));
    }

    pub fn push_mouse(&self, position: Position, buttons: MouseButtons) {
        self.push_input(RawInput::Mouse { position, buttons });
    }

    /// Simulate an external resize; the window notices on its next tick.
    pub fn resize(&self, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        state.size = Pair::new(width, height);
        state.grid = blank_grid(width, height);
        state.resized = true;
    }

    /// The rendered characters of one row.
    pub fn row(&self, y: i32) -> String {
        let state = self.state.borrow();
        state
            .grid
            .get(y as usize)
            .map(|row| row.iter().collect())
            .unwrap_or_default()
    }

    pub fn draws(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn draw_count(&self) -> usize {
        self.state.borrow().draws.len()
    }

    pub fn reset_draws(&self) {
        self.state.borrow_mut().draws.clear();
    }

    pub fn refresh_count(&self) -> usize {
        self.state.borrow().refreshes
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

fn blank_grid(width: i32, height: i32) -> Vec<Vec<char>> {
    vec![vec![' '; width.max(0) as usize]; height.max(0) as usize]
}

impl Terminal for TestTerminal {
    fn dimensions(&self) -> Pair<i32> {
        self.state.borrow().size
    }

    fn clear(&mut self) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        let size = state.size;
        state.grid = blank_grid(size.x, size.y);
        Ok(())
    }

    fn print_at(
        &mut self,
        text: &str,
        position: Position,
        foreground: Color,
        background: Color,
    ) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        let size = state.size;
        if position.y >= 0 && position.y < size.y {
            for (i, c) in text.chars().enumerate() {
                let x = position.x + i as i32;
                if x >= 0 && x < size.x {
                    state.grid[position.y as usize][x as usize] = c;
                }
            }
        }
        state.draws.push(DrawCall {
            text: text.to_string(),
            position,
            foreground,
            background,
        });
        Ok(())
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.state.borrow_mut().refreshes += 1;
        Ok(())
    }

    fn has_resized(&mut self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().resized)
    }

    fn poll_input(&mut self, _timeout: Duration) -> io::Result<Option<RawInput>> {
        Ok(self.state.borrow_mut().inputs.pop_front())
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_terminal_grid_clips_prints() {
        let mut terminal = TestTerminal::new(5, 2);
        terminal
            .print_at("hello world", Pair::new(2, 0), Color::Reset, Color::Reset)
            .unwrap();
        terminal
            .print_at("off", Pair::new(0, 9), Color::Reset, Color::Reset)
            .unwrap();

        assert_eq!(terminal.row(0), "  hel");
        assert_eq!(terminal.row(1), "     ");
        assert_eq!(terminal.draw_count(), 2);
    }

    #[test]
    fn test_test_terminal_resize_flag_resets_on_read() {
        let mut terminal = TestTerminal::new(4, 4);
        assert!(!terminal.has_resized());
        terminal.resize(6, 6);
        assert!(terminal.has_resized());
        assert!(!terminal.has_resized());
        assert_eq!(terminal.dimensions(), Pair::new(6, 6));
    }

    #[test]
    fn test_scripted_input_drains_in_order() {
        let mut terminal = TestTerminal::new(4, 4);
        terminal.push_key('a' as i32, false);
        terminal.push_mouse(Pair::new(1, 1), MouseButtons::LEFT);

        let first = terminal.poll_input(Duration::ZERO).unwrap();
        assert_eq!(first, Some(RawInput::Key(KeyInput::new('a' as i32, false))));
        assert!(matches!(
            terminal.poll_input(Duration::ZERO).unwrap(),
            Some(RawInput::Mouse { .. })
        ));
        assert_eq!(terminal.poll_input(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn test_ctrl_letter_maps_to_control_code() {
        let event = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(convert_key(event), Some(KeyInput::new(key::CLEAR_LINE, false)));

        let event = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert_eq!(
            convert_key(event),
            Some(KeyInput::new(key::CLEAR_WORD_BACKWARD, false))
        );
    }

    #[test]
    fn test_navigation_keys_are_special() {
        let event = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(convert_key(event), Some(KeyInput::new(key::ARROW_UP, true)));

        let event = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(convert_key(event), Some(KeyInput::new('k' as i32, false)));
    }

    #[test]
    fn test_alt_arrows_are_special_word_moves_not_letters() {
        let event = KeyEvent::new(KeyCode::Right, KeyModifiers::ALT);
        let input = convert_key(event).unwrap();
        assert_eq!(input, KeyInput::new(key::MOVE_WORD_FORWARD, true));
        assert_eq!(input.as_char(), None);

        let event = KeyEvent::new(KeyCode::Left, KeyModifiers::ALT);
        let input = convert_key(event).unwrap();
        assert_eq!(input, KeyInput::new(key::MOVE_WORD_BACKWARD, true));
        assert_eq!(input.as_char(), None);
    }
}
