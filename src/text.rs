//! Text widgets: static text, fill, and a single-value text input.
//!
//! Text measures its lines for auto sizing (display width, not byte length),
//! clips them under the parent's scroll offset, and aligns/pads each visible
//! row. Fill is text that regenerates its content to blanket whatever rect it
//! is granted. The input renders an editable value with a block cursor and
//! keeps the cursor visible by sliding a value offset: a one/two line input
//! scrolls horizontally ("short scroll", `<`/`>` truncation markers), a
//! taller one scrolls by wrapped lines ("long scroll", `>....`/`<....`
//! markers).

use unicode_width::UnicodeWidthStr;

use crate::element::{Element, Kind};
use crate::error::{Error, Result};
use crate::event::{key, EventData, EventKind, KeyInput};
use crate::style::{Color, TextAlign};
use crate::types::{Axis, Len, Pair, Rect, ResizeAxes, Size};

// =============================================================================
// State
// =============================================================================

pub(crate) struct TextState {
    pub(crate) values: Vec<String>,
    pub(crate) render_values: Option<Vec<String>>,
    /// Set for fill elements: the character the content is regenerated from.
    pub(crate) fill: Option<char>,
}

impl TextState {
    pub(crate) fn is_dirty(&self) -> bool {
        self.render_values.as_ref() != Some(&self.values)
    }
}

#[derive(Default)]
pub(crate) struct InputState {
    pub(crate) value: Vec<char>,
    pub(crate) cursor: usize,
    /// Index of the first value character being rendered; slides to keep the
    /// cursor visible when the value outgrows the widget.
    pub(crate) value_offset: i32,
    pub(crate) render_value: Option<Vec<char>>,
    pub(crate) render_cursor: Option<usize>,
}

impl InputState {
    pub(crate) fn is_dirty(&self) -> bool {
        self.render_value.as_deref() != Some(&self.value)
            || self.render_cursor != Some(self.cursor)
    }
}

// =============================================================================
// Constructors and content operations
// =============================================================================

impl Element {
    /// A single line of static text.
    pub fn text(value: impl Into<String>) -> Element {
        Self::text_lines(vec![value.into()])
    }

    /// Multiple lines of static text.
    pub fn text_lines(values: Vec<String>) -> Element {
        Element::from_kind(Kind::Text(TextState {
            values,
            render_values: None,
            fill: None,
        }))
    }

    /// An element that covers its whole rect with `character`.
    pub fn fill(character: char) -> Element {
        Element::from_kind(Kind::Text(TextState {
            values: vec![String::new()],
            render_values: None,
            fill: Some(character),
        }))
    }

    /// An empty editable text input.
    pub fn input() -> Element {
        Element::from_kind(Kind::Input(InputState::default()))
    }

    /// Replace a text element's content with a single line.
    pub fn set_text(&self, value: impl Into<String>) -> Result<()> {
        self.set_text_lines(vec![value.into()])
    }

    /// Replace a text element's content. Only the axes whose measurement
    /// actually changed renegotiate size.
    pub fn set_text_lines(&self, lines: Vec<String>) -> Result<()> {
        let resize = {
            match &mut *self.kind_mut() {
                Kind::Text(state) => {
                    let resize = ResizeAxes::new(
                        max_line_width(&lines) != max_line_width(&state.values),
                        lines.len() != state.values.len(),
                    );
                    state.values = lines;
                    resize
                }
                _ => return Err(Error::Unsupported(self.debug_id())),
            }
        };
        self.rerender(false, Some(resize))?;
        Ok(())
    }

    /// An input's current value.
    pub fn value(&self) -> Option<String> {
        match &*self.kind() {
            Kind::Input(state) => Some(state.value.iter().collect()),
            _ => None,
        }
    }

    /// Replace an input's value, moving the cursor to the end.
    pub fn set_value(&self, value: impl Into<String>) -> Result<()> {
        let desired = self.core().desired;
        {
            match &mut *self.kind_mut() {
                Kind::Input(state) => {
                    state.value = value.into().chars().collect();
                    state.cursor = state.value.len();
                    state.value_offset = match desired {
                        Some(desired) => calculate_offset(state, 0, desired),
                        None => 0,
                    };
                }
                _ => return Err(Error::Unsupported(self.debug_id())),
            }
        }
        self.rerender(true, Some(ResizeAxes::new(false, true)))?;
        Ok(())
    }
}

fn max_line_width(values: &[String]) -> i32 {
    values
        .iter()
        .map(|v| UnicodeWidthStr::width(v.as_str()) as i32)
        .max()
        .unwrap_or(0)
}

// =============================================================================
// Text
// =============================================================================

/// A text element's desired size: styled axes win; auto axes measure the
/// content (widest line, line count).
pub(crate) fn text_desired_size(element: &Element, _max: Pair<i32>) -> Result<Size> {
    if let Ok(size) = element.styled_desired_size() {
        return Ok(size);
    }
    let computed = element.computed_style();
    let (width, height) = match &*element.kind() {
        Kind::Text(state) => (max_line_width(&state.values), state.values.len() as i32),
        _ => (0, 0),
    };
    let size = Pair::new(
        computed
            .extent(Axis::Horizontal)
            .as_len()
            .unwrap_or(Len::Cells(width)),
        computed
            .extent(Axis::Vertical)
            .as_len()
            .unwrap_or(Len::Cells(height)),
    );
    Ok(element.margined_size(size))
}

pub(crate) fn render_text(element: &Element, rect: Rect, force: bool) -> Result<()> {
    // A fill regenerates its content for the granted rect before the dirty
    // check so a size change shows up as a content change.
    {
        let mut kind = element.kind_mut();
        if let Kind::Text(state) = &mut *kind {
            if let Some(character) = state.fill {
                let line: String = std::iter::repeat(character)
                    .take(rect.size.x.max(0) as usize)
                    .collect();
                state.values = vec![line; rect.size.y.max(0) as usize];
            }
        }
    }
    if !element.should_render(rect, force) || !element.can_display(rect) {
        element.finish_render(rect);
        return Ok(());
    }
    let Some(window) = element.window_node() else {
        element.finish_render(rect);
        return Ok(());
    };

    let computed = element.computed_style();
    let values = match &*element.kind() {
        Kind::Text(state) => state.values.clone(),
        _ => Vec::new(),
    };
    let (foreground, background) = (computed.foreground(), computed.background());
    for (row, line) in format_lines(&values, rect, computed.text_align())
        .iter()
        .enumerate()
    {
        window.print_at(
            line,
            Pair::new(rect.position.x, rect.position.y + row as i32),
            foreground,
            background,
        );
    }

    if let Kind::Text(state) = &mut *element.kind_mut() {
        state.render_values = Some(values);
    }
    let desired = element.desired_size(rect.size, false)?;
    element.core_mut().render_size = Some(desired);
    element.finish_render(rect);
    Ok(())
}

/// Clip lines under the rect's scroll offset, then align and pad each row to
/// the full rect width so stale cells never linger.
fn format_lines(values: &[String], rect: Rect, align: TextAlign) -> Vec<String> {
    let width = rect.size.x.max(0) as usize;
    let height = rect.size.y.max(0) as usize;

    let skip_rows = (-rect.offset.y).max(0) as usize;
    let skip_cols = (-rect.offset.x).max(0) as usize;

    let mut formatted = Vec::with_capacity(height);
    for line in values.iter().skip(skip_rows).take(height) {
        let visible: String = line.chars().skip(skip_cols).take(width).collect();
        let pad = width.saturating_sub(UnicodeWidthStr::width(visible.as_str()));
        formatted.push(match align {
            TextAlign::Left => format!("{visible}{}", " ".repeat(pad)),
            TextAlign::Right => format!("{}{visible}", " ".repeat(pad)),
            TextAlign::Center => {
                let left = pad / 2;
                format!("{}{visible}{}", " ".repeat(left), " ".repeat(pad - left))
            }
        });
    }
    while formatted.len() < height {
        formatted.push(" ".repeat(width));
    }
    formatted
}

// =============================================================================
// Input - size negotiation
// =============================================================================

/// An input wants the full granted width unless styled otherwise, and as many
/// rows as its value wraps into (capped by the available height).
pub(crate) fn input_desired_size(element: &Element, max: Pair<i32>) -> Result<Size> {
    let computed = element.computed_style();
    if !computed.is_displayed() {
        return Ok(Size::cells(0, 0));
    }
    let value_len = match &*element.kind() {
        Kind::Input(state) => state.value.len() as i32,
        _ => 0,
    };
    let width = computed
        .extent(Axis::Horizontal)
        .as_len()
        .unwrap_or(Len::Cells(max.x));
    let height = computed
        .extent(Axis::Vertical)
        .as_len()
        .unwrap_or_else(|| Len::Cells((value_len / max.x.max(1) + 1).min(max.y)));
    Ok(element.margined_size(Pair::new(width, height)))
}

// =============================================================================
// Input - editing
// =============================================================================

/// Handle a key routed to a focused input: apply the edit, recompute the
/// value offset, repaint, then let the event bubble as usual.
pub(crate) fn input_key_press(element: &Element, input: KeyInput) -> Result<()> {
    let desired = element.core().desired;
    let Some(desired) = desired else {
        // Not laid out yet; nothing to edit against.
        return element.dispatch_bubbling(EventKind::Keyboard, EventData::Keyboard(input));
    };
    let edited = match &mut *element.kind_mut() {
        Kind::Input(state) => edit_value(state, input, desired),
        _ => None,
    };
    if let Some(height_changed) = edited {
        element.rerender(true, Some(ResizeAxes::new(false, height_changed)))?;
    }
    element.dispatch_bubbling(EventKind::Keyboard, EventData::Keyboard(input))
}

/// Apply one editing key. Returns `None` when the key is not an editing key
/// (it still bubbles), otherwise whether the wrapped line count changed and
/// the parent must renegotiate the height.
fn edit_value(state: &mut InputState, input: KeyInput, desired: Size) -> Option<bool> {
    let prev_cursor = state.cursor;
    let prev_len = state.value.len() as i32;

    if let Some(c) = input.as_char() {
        state.value.insert(state.cursor, c);
        state.cursor += 1;
    } else {
        match input.code {
            key::BACKSPACE => {
                if state.cursor > 0 {
                    state.value.remove(state.cursor - 1);
                    state.cursor -= 1;
                }
            }
            key::DELETE => {
                if state.cursor < state.value.len() {
                    state.value.remove(state.cursor);
                }
            }
            key::CLEAR_WORD_BACKWARD => {
                let boundary = word_backward(&state.value, state.cursor);
                state.value.drain(boundary..state.cursor);
                state.cursor = boundary;
            }
            key::CLEAR_LINE_FORWARD => state.value.truncate(state.cursor),
            key::CLEAR_LINE => {
                state.value.clear();
                state.cursor = 0;
            }
            key::ARROW_LEFT => state.cursor = state.cursor.saturating_sub(1),
            key::ARROW_RIGHT => state.cursor = (state.cursor + 1).min(state.value.len()),
            key::MOVE_WORD_BACKWARD | key::MOVE_WORD_BACKWARD_CTRL => {
                state.cursor = word_backward(&state.value, state.cursor);
            }
            key::MOVE_WORD_FORWARD | key::MOVE_WORD_FORWARD_CTRL => {
                state.cursor = word_forward(&state.value, state.cursor);
            }
            key::HOME | key::MOVE_LINE_START => state.cursor = 0,
            key::END | key::MOVE_LINE_END => state.cursor = state.value.len(),
            _ => return None,
        }
    }

    state.value_offset = calculate_offset(state, prev_cursor as i32, desired);
    let width = desired.x.cells().unwrap_or(1).max(1);
    let height_changed = prev_len / width != state.value.len() as i32 / width;
    Some(height_changed)
}

/// Start of the word before `cursor`: just past the last space preceding the
/// trailing-space-trimmed prefix.
fn word_backward(value: &[char], cursor: usize) -> usize {
    let mut end = cursor;
    while end > 0 && value[end - 1] == ' ' {
        end -= 1;
    }
    value[..end]
        .iter()
        .rposition(|&c| c == ' ')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Start of the word after `cursor`: across any spaces under the cursor,
/// otherwise past the current word and the spaces following it.
fn word_forward(value: &[char], cursor: usize) -> usize {
    let rest = &value[cursor..];
    let leading_spaces = rest.iter().take_while(|&&c| c == ' ').count();
    if leading_spaces > 0 {
        return (cursor + leading_spaces).min(value.len());
    }
    let Some(space) = rest.iter().position(|&c| c == ' ') else {
        return value.len();
    };
    let after = &value[cursor + space..];
    let run = after.iter().take_while(|&&c| c == ' ').count();
    (cursor + space + run).min(value.len())
}

// =============================================================================
// Input - cursor-visibility offset
// =============================================================================

fn is_short_scroll(desired: Size) -> bool {
    matches!(desired.y.cells(), Some(h) if (1..=2).contains(&h))
}

/// Recompute the value offset so the cursor stays visible inside `size`.
fn calculate_offset(state: &InputState, prev_cursor: i32, size: Size) -> i32 {
    let width = size.x.cells().unwrap_or(0);
    let height = size.y.cells().unwrap_or(0);
    if width <= 0 {
        return 0;
    }
    let display = if is_short_scroll(size) {
        width
    } else {
        width * height
    };
    let len = state.value.len() as i32;
    if len < display {
        return 0;
    }
    if is_short_scroll(size) {
        short_scroll_offset(state, prev_cursor, width, len)
    } else {
        long_scroll_offset(state, prev_cursor, width, height, len)
    }
}

/// Horizontal scroll for one/two line inputs: when the cursor would cross a
/// visible edge (accounting for the truncation markers), re-center it.
fn short_scroll_offset(state: &InputState, prev_cursor: i32, width: i32, len: i32) -> i32 {
    let cursor = state.cursor as i32;
    let offset = state.value_offset;
    let truncated_start = offset != 0;
    let truncated_end = len - offset > width;

    let mut prev_line = (prev_cursor - offset).div_euclid(width);
    let mut next_line = (cursor - offset).div_euclid(width);
    let next_position = (cursor - offset).rem_euclid(width);
    if next_position <= 0 && truncated_start {
        // The "<" marker sits on the first cell.
        prev_line -= 1;
    } else if next_position == width - 1 && truncated_end {
        // The ">" marker sits on the last cell.
        next_line += 1;
    }
    if prev_line != next_line {
        (cursor - width / 2).max(0)
    } else {
        offset
    }
}

/// Wrapped-line scroll for taller inputs: slide by whole display lines so the
/// cursor lands on the first (scrolling down) or second-to-last (scrolling
/// up) visible line.
fn long_scroll_offset(state: &InputState, prev_cursor: i32, width: i32, height: i32, len: i32) -> i32 {
    let cursor = state.cursor as i32;
    let prev_line_offset = state.value_offset.div_euclid(width);
    let prev_cursor_line = prev_cursor.div_euclid(width);
    let line_count = len.div_euclid(width) + 1;
    let cursor_line = cursor.div_euclid(width);

    if prev_cursor_line < cursor_line {
        if cursor_line - prev_line_offset >= height - 1 {
            return (width * (cursor_line - 1).min(line_count - height)).max(0);
        }
    } else if prev_cursor_line > cursor_line && cursor_line - prev_line_offset < 1 {
        return (width * (cursor_line - (height - 2))).max(0);
    }
    state.value_offset
}

// =============================================================================
// Input - rendering
// =============================================================================

pub(crate) fn render_input(element: &Element, rect: Rect, force: bool) -> Result<()> {
    if !element.should_render(rect, force) || !element.can_display(rect) {
        element.finish_render(rect);
        return Ok(());
    }
    let Some(window) = element.window_node() else {
        element.finish_render(rect);
        return Ok(());
    };

    let desired = element.desired_size(rect.size, false)?;
    {
        // The granted size changed since the last render; reflow the offset.
        let stale = {
            let core = element.core();
            core.render_size.is_some() && core.render_size != Some(desired)
        };
        if stale {
            if let Kind::Input(state) = &mut *element.kind_mut() {
                state.value_offset = calculate_offset(state, 0, desired);
            }
        }
    }

    let computed = element.computed_style();
    let focused = element.is_focused();
    let (value, cursor, offset) = match &*element.kind() {
        Kind::Input(state) => (state.value.clone(), state.cursor, state.value_offset),
        _ => (Vec::new(), 0, 0),
    };
    let (foreground, background) = (computed.foreground(), computed.background());

    let width = rect.size.x;
    let short = is_short_scroll(desired);
    let display = if short { width } else { width * rect.size.y };
    let len = value.len() as i32;
    let truncated_start = offset != 0;
    let truncated_end = len - offset > display;
    let cursor_render = cursor as i32 - offset;
    let cursor_line = cursor_render.div_euclid(width);
    let desired_height = desired.y.cells().unwrap_or(rect.size.y);

    for row in 0..rect.size.y {
        let at = Pair::new(rect.position.x, rect.position.y + row);
        let is_first = row == 0;
        let is_last =
            row == desired_height - 1 || (desired_height == 2 && row == desired_height - 2);

        if !short && truncated_start && is_first {
            let marker = format!(">....{}", " ".repeat((width - 5).max(0) as usize));
            window.print_at(&marker, at, foreground, background);
            continue;
        }

        let line_index = row - rect.offset.y;
        let start = line_index * width + offset;
        let end = start + width;

        let (mut line, mut line_len) = if line_index != cursor_line {
            let slice = char_range(&value, start, end);
            let slice_len = slice.chars().count() as i32;
            (slice, slice_len)
        } else {
            // Up to the cursor only; the cursor and tail print separately.
            let full_len = char_range(&value, start, end).chars().count() as i32;
            (char_range(&value, start, cursor as i32), full_len)
        };
        if short && !is_first {
            line.clear();
            line_len = 0;
        }
        if is_first && truncated_start {
            line = format!("<{}", line.chars().skip(1).collect::<String>());
        }
        window.print_at(&line, at, foreground, background);

        if line_index == cursor_line {
            let cursor_background = if focused { Color::White } else { Color::DarkGrey };
            let cursor_char = if cursor == value.len() {
                line_len += 1;
                ' '
            } else {
                value[cursor]
            };
            let cursor_index = cursor_render.rem_euclid(width);
            window.print_at(
                &cursor_char.to_string(),
                Pair::new(at.x + cursor_index, at.y),
                Color::Black,
                cursor_background,
            );
            let tail = char_range(&value, cursor as i32 + 1, end);
            window.print_at(
                &tail,
                Pair::new(at.x + cursor_index + 1, at.y),
                foreground,
                background,
            );
        }

        if truncated_end && is_last {
            let marker = if short { ">" } else { "<...." };
            window.print_at(
                marker,
                Pair::new(at.x + line_len - marker.len() as i32, at.y),
                foreground,
                background,
            );
        } else {
            let pad = (width - line_len).max(0) as usize;
            window.print_at(
                &" ".repeat(pad),
                Pair::new(at.x + line_len, at.y),
                foreground,
                background,
            );
        }
    }

    if let Kind::Input(state) = &mut *element.kind_mut() {
        state.render_value = Some(value);
        state.render_cursor = Some(cursor);
    }
    element.core_mut().render_size = Some(desired);
    element.finish_render(rect);
    Ok(())
}

/// Clamped character-range slice of the value.
fn char_range(value: &[char], start: i32, end: i32) -> String {
    let len = value.len() as i32;
    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if start >= end {
        return String::new();
    }
    value[start..end].iter().collect()
}

// =============================================================================
// Tests
// =============================================================================
