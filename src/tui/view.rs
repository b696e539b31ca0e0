use crate::shared::{CANVAS_HEIGHT, CANVAS_WIDTH, DisplayState, LOOP_SECONDS};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, LineGauge, Paragraph};
use ratatui::Frame;

const BACKGROUND: Color = Color::Rgb(0x00, 0x11, 0x00);
const INK: Color = Color::Rgb(0x00, 0xff, 0x00);

// draws one frame; returns the inner canvas area so mouse input can be mapped
pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10), // drawing canvas
            Constraint::Length(1), // status line
            Constraint::Length(8), // visualizer bars
            Constraint::Length(1), // playhead
            Constraint::Length(1), // key help
        ])
        .split(area);

    let canvas_area = draw_canvas(frame, sections[0], state);
    draw_status(frame, sections[1], state);
    draw_bars(frame, sections[2], state);
    draw_playhead(frame, sections[3], state);
    draw_help(frame, sections[4], state);
    canvas_area
}

fn draw_canvas(frame: &mut Frame, area: Rect, state: &DisplayState) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(INK))
        .title(" draw a line ");
    let inner = block.inner(area);

    // canvas space has y growing downward, the widget has it growing up
    let height = CANVAS_HEIGHT as f64;
    let coords: Vec<(f64, f64)> = state.ink.iter().map(|&(x, y)| (x, height - y)).collect();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(BACKGROUND)
        .x_bounds([0.0, CANVAS_WIDTH as f64])
        .y_bounds([0.0, height])
        .paint(move |ctx| {
            ctx.draw(&Points { coords: &coords, color: INK });
        });
    frame.render_widget(canvas, area);
    inner
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let bpm = match state.bpm {
        Some(bpm) => format!("{bpm} BPM"),
        None => "--- BPM".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {bpm} "), Style::default().fg(Color::Black).bg(INK)),
        Span::raw(format!("  line {}px  ", state.line_thickness)),
        Span::styled(state.status_text.as_str(), Style::default().add_modifier(Modifier::BOLD)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_bars(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let bars: Vec<Bar> = state
        .bars
        .iter()
        .map(|v| Bar::default().value((v.clamp(0.0, 1.0) * 100.0).round() as u64).text_value(String::new()))
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" beat "))
        .bar_width(2)
        .bar_gap(0)
        .bar_style(Style::default().fg(INK))
        .max(100)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_playhead(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let gauge = LineGauge::default()
        .filled_style(Style::default().fg(INK))
        .unfilled_style(Style::default().fg(Color::DarkGray))
        .label(match state.elapsed {
            Some(t) => format!("{t:4.1}s / {LOOP_SECONDS}s "),
            None => "idle        ".to_string(),
        })
        .ratio(state.playhead.clamp(0.0, 1.0));
    frame.render_widget(gauge, area);
}

fn draw_help(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let beat = if state.playing { "" } else { "space beat it  " };
    let help = format!(" {beat}c clear  [ ] thickness  esc quit");
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn reports_inner_canvas_area() {
        let mut term = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let state = DisplayState {
            ink: vec![(0.0, 0.0), (400.0, 200.0)],
            bars: vec![0.5; 32],
            playhead: 0.25,
            playing: true,
            bpm: Some(140),
            ..DisplayState::default()
        };
        let mut canvas_area = Rect::default();
        term.draw(|frame| {
            canvas_area = render(frame, frame.area(), &state);
        })
        .unwrap();
        // border eats one cell on each side
        assert_eq!(canvas_area, Rect::new(1, 1, 98, 27));
    }
}
