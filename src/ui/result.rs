use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use super::{format_time, grade_color};
use crate::app::{App, SaveStatus};
use crate::leaderboard::LeaderboardEntry;
use crate::models::{AttemptRecord, Quiz};
use crate::session::ScoreReport;

const QUESTION_PREVIEW_LENGTH: usize = 55;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let (Some(record), Some(report), Some(session)) =
        (app.last_attempt(), app.last_report(), app.session())
    else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(7),
        Constraint::Min(6),
        Constraint::Length(4),
        Constraint::Length(8),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_score_summary(frame, chunks[0], record, app.save_status());
    render_question_breakdown(frame, chunks[1], session.quiz(), report, app.result_scroll());
    render_explanation(frame, chunks[2], session.quiz(), record, app.result_scroll());
    render_leaderboard(frame, chunks[3], &app.leaderboard());
    render_controls(frame, chunks[4]);
}

fn render_score_summary(
    frame: &mut Frame,
    area: Rect,
    record: &AttemptRecord,
    save_status: Option<&SaveStatus>,
) {
    let (save_text, save_color) = match save_status {
        Some(SaveStatus::Pending) => ("saving...".to_string(), Color::Yellow),
        Some(SaveStatus::Saved) => ("saved".to_string(), Color::Green),
        Some(SaveStatus::Failed(reason)) => (format!("not saved: {}", reason), Color::Red),
        Some(SaveStatus::NotStored) | None => ("not stored".to_string(), Color::DarkGray),
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "RESULTS",
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} / {}  ({}%)", record.score, record.total, record.percentage),
            Style::default().fg(grade_color(record.percentage)).bold(),
        )),
        Line::from(
            format!(
                "{} · {} taken · {}",
                record.reason,
                format_time(record.time_taken_seconds),
                save_text
            )
            .fg(save_color),
        ),
    ];

    let widget = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(widget, area);
}

fn render_question_breakdown(
    frame: &mut Frame,
    area: Rect,
    quiz: &Quiz,
    report: &ScoreReport,
    scroll: usize,
) {
    let lines: Vec<Line> = report
        .per_question
        .iter()
        .zip(quiz.questions.iter())
        .enumerate()
        .map(|(index, (is_correct, question))| {
            let (symbol, color) = if *is_correct {
                ("+", Color::Green)
            } else {
                ("-", Color::Red)
            };
            let row_style = if index == scroll {
                Style::default().fg(Color::White).bold()
            } else {
                Style::default().fg(Color::Gray)
            };

            Line::from(vec![
                Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                Span::styled(
                    format!("{:2}. ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(truncate_question(&question.text), row_style),
            ])
        })
        .collect();

    let offset = scroll.saturating_sub(usize::from(area.height.saturating_sub(1)));
    let widget = Paragraph::new(lines)
        .block(Block::default().padding(Padding::horizontal(1)))
        .scroll((offset as u16, 0));
    frame.render_widget(widget, area);
}

fn render_explanation(
    frame: &mut Frame,
    area: Rect,
    quiz: &Quiz,
    record: &AttemptRecord,
    index: usize,
) {
    let Some(question) = quiz.questions.get(index) else {
        return;
    };
    let option_text = |i: usize| question.options.get(i).map_or("?", String::as_str);

    let yours = match record.answers.get(index).copied().flatten() {
        Some(answer) => option_text(answer).to_string(),
        None => "unanswered".to_string(),
    };

    let content = vec![
        Line::from(vec![
            Span::styled("Your answer: ", Style::default().fg(Color::DarkGray)),
            Span::styled(yours, Style::default().fg(Color::Gray)),
            Span::styled("   Correct: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                option_text(question.correct_answer),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(Span::styled(
            question.explanation.as_str(),
            Style::default().fg(Color::Gray),
        )),
    ];

    let widget = Paragraph::new(content).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Color::DarkGray)
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_leaderboard(frame: &mut Frame, area: Rect, leaderboard: &[LeaderboardEntry]) {
    let lines: Vec<Line> = leaderboard
        .iter()
        .map(|entry| {
            let rank_style = match entry.rank {
                1 => Style::default().fg(Color::Yellow).bold(),
                2 => Style::default().fg(Color::White),
                3 => Style::default().fg(Color::LightRed),
                _ => Style::default().fg(Color::DarkGray),
            };
            let you_marker = if entry.is_you { " <- You" } else { "" };

            Line::from(vec![
                Span::styled(format!(" #{:<3}", entry.rank), rank_style),
                Span::styled(
                    format!("{:<18}", entry.user_name),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!(
                        "{}/{} ({}%)  {}",
                        entry.score,
                        entry.total,
                        entry.percentage,
                        format_time(entry.time_taken_seconds)
                    ),
                    Style::default().fg(grade_color(entry.percentage)),
                ),
                Span::styled(you_marker, Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Leaderboard ")
            .title_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(widget, area);
}

fn truncate_question(text: &str) -> String {
    let char_count = text.chars().count();
    if char_count > QUESTION_PREVIEW_LENGTH {
        let truncated: String = text.chars().take(QUESTION_PREVIEW_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k browse answers  ·  b back to quizzes  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_question() {
        assert_eq!(truncate_question("short"), "short");
        let long = "x".repeat(60);
        let truncated = truncate_question(&long);
        assert_eq!(truncated.chars().count(), QUESTION_PREVIEW_LENGTH + 3);
        assert!(truncated.ends_with("..."));
    }
}
