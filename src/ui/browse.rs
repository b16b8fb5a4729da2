use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(4),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_header(frame, chunks[0], app);
    render_quiz_list(frame, chunks[1], app);
    render_status(frame, chunks[2], app.status());
    render_controls(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let content = vec![
        Line::from(Span::styled(
            "QUIZ PORTAL",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(
            format!(
                "{} quizzes available · signed in as {}",
                app.quizzes().len(),
                app.identity().name
            )
            .fg(Color::DarkGray),
        ),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_quiz_list(frame: &mut Frame, area: Rect, app: &App) {
    if app.quizzes().is_empty() {
        let widget = Paragraph::new(vec![
            Line::from(""),
            Line::from("No quizzes available".fg(Color::Gray)),
            Line::from("Import some with `quiz-portal import <file>`".fg(Color::DarkGray)),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(widget, area);
        return;
    }

    let lines: Vec<Line> = app
        .quizzes()
        .iter()
        .enumerate()
        .map(|(index, quiz)| {
            let is_selected = index == app.selected_quiz_index();
            let style = if is_selected {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if is_selected { ">" } else { " " };

            let summary = app.summary_for(&quiz.id);
            let badge = match summary.best {
                Some(best) => Span::styled(
                    format!(
                        "  Attempted x{} · best {}/{}",
                        summary.attempts, best.score, best.total
                    ),
                    Style::default().fg(Color::Green),
                ),
                None => Span::styled("  New", Style::default().fg(Color::Yellow)),
            };

            Line::from(vec![
                Span::styled(format!(" {} ", marker), style),
                Span::styled(format!("{}  ", quiz.date), Style::default().fg(Color::DarkGray)),
                Span::styled(quiz.subject.clone(), style),
                Span::styled(
                    format!(
                        "  {} questions · {} min",
                        quiz.total_questions(),
                        quiz.time_limit_minutes()
                    ),
                    Style::default().fg(Color::DarkGray),
                ),
                badge,
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(Block::default().padding(Padding::horizontal(1)));
    frame.render_widget(widget, area);
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
    let widget = Paragraph::new("j/k choose  ·  enter start  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
