//! Live dashboard in the alternate screen.
//!
//! The clock tick, snapshot updates and key events all feed one select loop.
//! Fetches never run on it: a manual refresh is handed to the monitor and the
//! result comes back through the snapshot channel.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dockwatch_core::{facility_now, facility_today};
use futures_util::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::Config;
use crate::dashboard;
use crate::monitor::DowntimeMonitor;
use crate::source::TaskSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Refresh,
}

fn key_action(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        // Raw mode swallows SIGINT.
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Enter | KeyCode::Char('r') => Some(Action::Refresh),
        _ => None,
    }
}

pub async fn run_watch(cfg: &Config, date: Option<NaiveDate>, source: Arc<dyn TaskSource>) -> Result<()> {
    let tz = cfg.timezone()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = watch_loop(&mut terminal, cfg, tz, date, source).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn watch_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    cfg: &Config,
    tz: Tz,
    date: Option<NaiveDate>,
    source: Arc<dyn TaskSource>,
) -> Result<()> {
    let follow_today = date.is_none();

    let mut today = facility_today(tz, Utc::now());
    let mut monitor = DowntimeMonitor::new(source, cfg.refresh_interval());
    monitor.select_date(date.unwrap_or(today), today);

    let mut updates = monitor.subscribe();
    let mut clock = tokio::time::interval(cfg.clock_tick());
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut events = EventStream::new();

    loop {
        let now_utc = Utc::now();
        let new_today = facility_today(tz, now_utc);
        if new_today != today {
            today = new_today;
            info!(%today, "facility date rolled over");
            if follow_today {
                monitor.select_date(today, today);
            } else if let Some(selected) = monitor.selected_date() {
                // The selected day just became history: stop polling it.
                if monitor.is_polling() {
                    monitor.select_date(selected, today);
                }
            }
        }

        let body = body_text(&monitor, cfg, tz, today, now_utc);
        let footer = footer_text(&monitor, cfg);
        draw_once(terminal, &body, &footer)?;

        tokio::select! {
            _ = clock.tick() => {}
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            ev = events.next() => match ev {
                Some(Ok(Event::Key(key))) => match key_action(key) {
                    Some(Action::Quit) => break,
                    Some(Action::Refresh) => {
                        if let Err(e) = monitor.request_refresh() {
                            warn!(error = %format!("{e:#}"), "manual refresh not started");
                        }
                    }
                    None => {}
                },
                // Resize and friends: redraw on the next pass.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    monitor.stop();
    Ok(())
}

fn body_text(monitor: &DowntimeMonitor, cfg: &Config, tz: Tz, today: NaiveDate, now_utc: DateTime<Utc>) -> String {
    match monitor.snapshot() {
        Some(snap) => {
            let report = snap.report(&cfg.thresholds, facility_now(tz, now_utc), today);
            let header = dashboard::Header {
                date: snap.date,
                live: snap.date == today,
                updated: Some(snap.fetched_at.with_timezone(&tz).format("%H:%M:%S").to_string()),
            };
            dashboard::render(&report, &snap.annotations, &header)
        }
        None => {
            let date = monitor.selected_date().unwrap_or(today);
            format!("Loading {}...\n", date.format("%d.%m.%Y"))
        }
    }
}

fn footer_text(monitor: &DowntimeMonitor, cfg: &Config) -> String {
    if monitor.is_polling() {
        format!(
            "refreshing every {}s | Enter/r: refresh now | q: quit",
            cfg.refresh_interval().as_secs()
        )
    } else {
        "history, not polling | Enter/r: refresh now | q: quit".to_string()
    }
}

fn line_style(line: &str) -> Style {
    if line.starts_with('#') {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if line.contains("[CRITICAL]") {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if line.contains("[WARNING]") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn styled(rendered: &str) -> Text<'static> {
    let lines: Vec<Line<'static>> = rendered
        .lines()
        .map(|l| {
            let mut line = Line::from(l.to_string());
            line.style = line_style(l);
            line
        })
        .collect();
    Text::from(lines)
}

fn draw(f: &mut Frame, body: &str, footer: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let report = Paragraph::new(styled(body))
        .block(Block::default().borders(Borders::ALL).title("dockwatch"))
        .wrap(Wrap { trim: false });
    f.render_widget(report, chunks[0]);

    let keys = Paragraph::new(footer.to_string())
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray));
    f.render_widget(keys, chunks[1]);
}

fn draw_once<B: Backend>(terminal: &mut Terminal<B>, body: &str, footer: &str) -> Result<()> {
    terminal.draw(|f| draw(f, body, footer))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_action(press(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(key_action(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Action::Quit));
        assert_eq!(key_action(press(KeyCode::Enter, KeyModifiers::NONE)), Some(Action::Refresh));
        assert_eq!(key_action(press(KeyCode::Char('r'), KeyModifiers::NONE)), Some(Action::Refresh));
        assert_eq!(key_action(press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Enter, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(key_action(key), None);
    }

    #[test]
    fn severity_lines_are_colored() {
        let text = styled("# Zone downtime 16.10.2026 (live)\n- [CRITICAL] G7: 2ч 29мин\n- [WARNING] G4: 44мин\n- [normal] G1: 29мин");
        let fg: Vec<_> = text.lines.iter().map(|l| l.style.fg).collect();
        assert_eq!(fg, vec![Some(Color::Cyan), Some(Color::Red), Some(Color::Yellow), None]);
    }

    #[test]
    fn frame_shows_report_and_keys() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        draw_once(&mut terminal, "# Zone downtime 16.10.2026 (live)\nG4: total 40мин", "q: quit").unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Zone downtime 16.10.2026"));
        assert!(screen.contains("G4: total 40мин"));
        assert!(screen.contains("q: quit"));
    }
}
