use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::{Duration, Instant};

use crate::quiz::{QuizSession, Tick, format_time};

/// How an interactive quiz session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    /// Submit now: either the user asked for it or the countdown expired.
    Submitted,
    Abandoned,
}

pub fn run_quiz(session: &mut QuizSession) -> Result<QuizOutcome> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, session);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut QuizSession,
) -> Result<QuizOutcome> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| draw(frame, session))?;

        // Drive the one-second countdown between input polls.
        while last_tick.elapsed() >= Duration::from_secs(1) {
            last_tick += Duration::from_secs(1);
            if session.tick() == Tick::Expired {
                return Ok(QuizOutcome::Submitted);
            }
        }

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    // Leaving the session cancels the countdown
                    session.mark_submitted();
                    return Ok(QuizOutcome::Abandoned);
                }
                KeyCode::Char('s') => {
                    session.mark_submitted();
                    return Ok(QuizOutcome::Submitted);
                }
                KeyCode::Left | KeyCode::Char('k') => session.prev_question(),
                KeyCode::Right | KeyCode::Char('j') => session.next_question(),
                KeyCode::Char(c @ '1'..='9') => {
                    session.select_answer(c as usize - '1' as usize);
                }
                _ => {}
            }
        }
    }
}

fn draw(frame: &mut Frame, session: &QuizSession) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(frame.area());

    // Header: what is being assessed
    let header = Paragraph::new(format!(
        " {} {} Competency Assessment",
        session.specialization, session.category
    ))
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(header, chunks[0]);

    // Status row: progress gauge on the left, countdown on the right
    let status = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(session.progress_pct() / 100.0)
        .label(format!(
            "{}/{} answered",
            session.answered_count(),
            session.questions().len()
        ));
    frame.render_widget(progress, status[0]);

    let timer_style = if session.time_left() < 60 {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let timer = Paragraph::new(Span::styled(
        format!(" {} remaining", format_time(session.time_left())),
        timer_style,
    ))
    .block(Block::default().borders(Borders::ALL).title(" Time "));
    frame.render_widget(timer, status[1]);

    // Question and options
    frame.render_widget(build_question(session), chunks[2]);

    // Footer help
    let help = Paragraph::new(
        " 1-9:answer  \u{2190}/\u{2192}:question  s:submit  q:abandon",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}

fn build_question(session: &QuizSession) -> Paragraph<'_> {
    let question = session.current_question();
    let chosen = session.current_answer();

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!(
            "Question {} of {}",
            session.current_index() + 1,
            session.questions().len()
        ),
        Style::default().fg(Color::Cyan),
    )));
    if chosen.is_some() {
        lines.push(Line::from(Span::styled(
            "Answered",
            Style::default().fg(Color::Green),
        )));
    }
    lines.push(Line::from(""));
    for text in textwrap::fill(&question.question, 76).lines() {
        lines.push(Line::from(text.to_string()));
    }
    lines.push(Line::from(""));

    for (i, option) in question.options.iter().enumerate() {
        let selected = chosen == Some(i);
        let marker = if selected { "(*)" } else { "( )" };
        let style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("  {marker} {}. {option}", i + 1),
            style,
        )));
    }

    // Answer map, the question-navigation strip
    lines.push(Line::from(""));
    let map: String = (0..session.questions().len())
        .map(|i| {
            if i == session.current_index() {
                '>'
            } else if session.answer_for(i).is_some() {
                '+'
            } else {
                '.'
            }
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!("  [{map}]"),
        Style::default().fg(Color::DarkGray),
    )));

    Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Quiz "))
        .wrap(Wrap { trim: false })
}
