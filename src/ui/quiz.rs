use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use super::format_time;
use crate::app::App;
use crate::session::SessionState;

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];
const LOW_TIME_SECONDS: u32 = 30;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(session) = app.session() else {
        return;
    };
    let question = session.current_question();
    let code = question.code.as_deref();

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(4)];
    if code.is_some() {
        constraints.push(Constraint::Min(6));
    }
    constraints.extend([Constraint::Fill(1), Constraint::Length(1), Constraint::Length(1)]);
    let chunks = Layout::vertical(constraints).margin(1).split(area);

    render_progress(frame, chunks[0], session);
    render_question_text(frame, chunks[1], &question.text);

    let mut next = 2;
    if let Some(code) = code {
        render_code_block(frame, chunks[next], code);
        next += 1;
    }

    let answered = session.answer(session.current_index());
    render_options(frame, chunks[next], &question.options, app.selected_option(), answered);
    render_status(frame, chunks[next + 1], app.status());
    render_controls(frame, chunks[next + 2]);
}

fn render_progress(frame: &mut Frame, area: Rect, session: &SessionState) {
    let remaining = session.remaining_seconds();
    let timer_style = if remaining <= LOW_TIME_SECONDS {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Green)
    };

    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let left = Paragraph::new(Line::from(vec![
        Span::styled(format!("{}  ", session.quiz().subject), Style::default().fg(Color::Cyan)),
        Span::styled(format_time(remaining), timer_style),
    ]));
    frame.render_widget(left, halves[0]);

    let progress = format!(
        "{}/{}  ·  {} answered",
        session.current_index() + 1,
        session.total_questions(),
        session.answered_count()
    );
    let right = Paragraph::new(progress)
        .alignment(Alignment::Right)
        .fg(Color::DarkGray);
    frame.render_widget(right, halves[1]);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn render_code_block(frame: &mut Frame, area: Rect, code: &str) {
    let code_lines: Vec<Line> = code
        .lines()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Yellow))))
        .collect();

    let widget = Paragraph::new(code_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_options(
    frame: &mut Frame,
    area: Rect,
    options: &[String],
    selected: usize,
    answered: Option<usize>,
) {
    let mut lines: Vec<Line> = Vec::with_capacity(options.len() * 2);

    for (index, option) in options.iter().enumerate() {
        let is_selected = index == selected;
        let is_answer = answered == Some(index);
        let style = match (is_selected, is_answer) {
            (true, _) => Style::default().fg(Color::Cyan).bold(),
            (false, true) => Style::default().fg(Color::Green),
            (false, false) => Style::default().fg(Color::Gray),
        };
        let marker = if is_selected { ">" } else { " " };
        let chosen = if is_answer { "  ✓" } else { "" };
        let label = OPTION_LABELS.get(index).copied().unwrap_or('?');

        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", marker), style),
            Span::styled(format!("{}. ", label), style),
            Span::styled(option.as_str(), style),
            Span::styled(chosen, Style::default().fg(Color::Green)),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_status(frame: &mut Frame, area: Rect, status: Option<&str>) {
    if let Some(message) = status {
        let widget = Paragraph::new(message)
            .alignment(Alignment::Center)
            .fg(Color::Red);
        frame.render_widget(widget, area);
    }
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new(
        "j/k option  ·  enter answer  ·  h/l question  ·  s submit  ·  esc leave",
    )
    .alignment(Alignment::Center)
    .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
