use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::shared::{CANVAS_HEIGHT, CANVAS_WIDTH, InputEvent};
use super::mode::TuiState;

// poll for input from tui, tracks pen state in tuistate,
// resolves keys and mouse drags to input events for the backend to handle
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    match event::read()? {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return Ok(vec![]);
            }
            Ok(handle_key(key.code, ts))
        }
        Event::Mouse(mouse) => Ok(handle_mouse(mouse, ts)),
        _ => Ok(vec![]),
    }
}

fn handle_key(code: KeyCode, ts: &TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        // "beat it" button is greyed out while playing
        KeyCode::Char(' ') | KeyCode::Enter if !ts.playing => vec![InputEvent::BeatIt],
        KeyCode::Char('c') => vec![InputEvent::ClearCanvas],
        KeyCode::Char('[') => vec![InputEvent::Thinner],
        KeyCode::Char(']') => vec![InputEvent::Thicker],
        _ => vec![],
    }
}

fn handle_mouse(mouse: MouseEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    let at = to_canvas(ts.canvas_area, mouse.column, mouse.row);
    match (mouse.kind, at) {
        (MouseEventKind::Down(MouseButton::Left), Some((x, y))) => {
            ts.pen_down = true;
            vec![InputEvent::DrawAt(x, y)]
        }
        (MouseEventKind::Drag(MouseButton::Left), Some((x, y))) if ts.pen_down => {
            vec![InputEvent::DrawAt(x, y)]
        }
        // releasing, or dragging off the canvas, ends the stroke
        (MouseEventKind::Up(MouseButton::Left), _) | (MouseEventKind::Drag(MouseButton::Left), None)
            if ts.pen_down =>
        {
            ts.pen_down = false;
            vec![InputEvent::PenUp]
        }
        _ => vec![],
    }
}

// terminal cell -> canvas pixel, centre of the cell; None outside the canvas
fn to_canvas(area: Rect, column: u16, row: u16) -> Option<(f64, f64)> {
    if area.width == 0 || area.height == 0 {
        return None;
    }
    if column < area.x || row < area.y || column >= area.x + area.width || row >= area.y + area.height {
        return None;
    }
    let fx = (column - area.x) as f64 + 0.5;
    let fy = (row - area.y) as f64 + 0.5;
    Some((
        (fx / area.width as f64 * CANVAS_WIDTH as f64).floor(),
        (fy / area.height as f64 * CANVAS_HEIGHT as f64).floor(),
    ))
}
