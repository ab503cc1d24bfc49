use crate::engine::EngineState;
use crate::utils::format_duration;
use crate::worker::{Status, WorkerHandle};
use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::atomic::Ordering;
use std::time::Duration as StdDuration;

pub fn run_tui(worker: &WorkerHandle) -> Result<()> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_loop(&mut terminal, worker);

    // restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{:?}", err)
    }

    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    worker: &WorkerHandle,
) -> Result<()> {
    loop {
        let Some(snapshot) = worker.snapshot() else {
            // Worker panicked and poisoned the status lock.
            return Ok(());
        };
        let paused = worker.controls.paused.load(Ordering::SeqCst);
        let beep = worker.controls.beep_enabled.load(Ordering::SeqCst);

        terminal.draw(|f| draw(f, &snapshot, paused, beep))?;

        if event::poll(StdDuration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('p') => {
                        worker.controls.paused.fetch_xor(true, Ordering::SeqCst);
                    }
                    KeyCode::Char('b') => {
                        worker
                            .controls
                            .beep_enabled
                            .fetch_xor(true, Ordering::SeqCst);
                    }
                    _ => {}
                }
            }
        }
    }
}

pub fn draw(frame: &mut Frame, status: &Status, paused: bool, beep: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Length(12), // Status
            Constraint::Min(0),
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], status, paused);
    draw_status(frame, chunks[1], status, beep);
    draw_footer(frame, chunks[3]);
}

fn draw_header(frame: &mut Frame, area: Rect, status: &Status, paused: bool) {
    let now_utc = Utc::now();
    let now_local = Local::now();

    let state_text = if status.ended {
        Span::styled(
            "SESSION ENDED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if paused {
        Span::styled(
            "PAUSED",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        match status.state {
            EngineState::Watching => Span::styled(
                "WATCHING",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            EngineState::KeepingAwake => Span::styled(
                "KEEPING AWAKE",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        }
    };

    let mut header_spans = vec![
        Span::styled(
            " Perk ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        state_text,
        Span::raw(" | "),
        Span::raw(now_local.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];

    if let Some(deadline) = status.deadline {
        let remaining = deadline - now_utc;
        if remaining.num_seconds() > 0 {
            header_spans.push(Span::raw(" | Stops in: "));
            header_spans.push(Span::styled(
                format_duration(remaining.num_seconds()),
                Style::default().fg(Color::Magenta),
            ));
        }
    }

    let header = Paragraph::new(Line::from(header_spans))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_status(frame: &mut Frame, area: Rect, status: &Status, beep: bool) {
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::raw("  Idle time:  "),
        Span::styled(
            format_duration(status.idle_secs as i64),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  (threshold {})",
            format_duration(status.threshold_secs as i64)
        )),
    ]));

    lines.push(Line::raw(format!(
        "  Interval:   {}",
        format_duration(status.interval_secs as i64)
    )));

    let next = match status.next_burst_in {
        Some(0) => "due (waiting for idle threshold)".to_string(),
        Some(secs) => format!("in {}", format_duration(secs)),
        None => "once idle threshold is reached".to_string(),
    };
    lines.push(Line::raw(format!("  Next burst: {}", next)));

    let state_for = (Utc::now() - status.state_since).num_seconds();
    lines.push(Line::raw(format!(
        "  State for:  {}",
        format_duration(state_for)
    )));

    lines.push(Line::raw(""));

    lines.push(Line::from(vec![
        Span::raw("  Bursts this session: "),
        Span::styled(
            status.burst_count.to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    if let Some(last) = status.last_burst {
        lines.push(Line::raw(format!(
            "  Last burst:          {}",
            last.with_timezone(&Local).format("%H:%M:%S")
        )));
    } else {
        lines.push(Line::raw("  Last burst:          ---"));
    }

    if status.failed_bursts > 0 {
        lines.push(Line::from(vec![
            Span::raw("  Failed bursts:       "),
            Span::styled(
                status.failed_bursts.to_string(),
                Style::default().fg(Color::Red),
            ),
        ]));
    }

    lines.push(Line::raw(format!(
        "  Beep:                {}",
        if beep { "on" } else { "off" }
    )));

    let block = Block::default()
        .title(Span::styled(
            " SESSION ",
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("Press 'q' to quit | 'p' to pause | 'b' to toggle beep")
        .block(Block::default().borders(Borders::ALL))
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(help, area);
}
