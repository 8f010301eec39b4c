//! Terminal monitor for Hinge
//!
//! Live view of the signal path: lid angle, hinge speed, and the
//! smoothed gain/rate the active engine is playing at. Also the control
//! surface - mode switching, track pinning, volume - standing in for
//! the original's menu layer.
//!
//! Keys: `m` cycle mode, `space` toggle audio, `0-9` pin track,
//! `r` reset pin, `+`/`-` volume, `q` quit.

mod meter;

pub use meter::Meter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::engine::SoundManager;

/// Shared run flag for the monitor loop
pub struct MonitorState {
    running: Arc<AtomicBool>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Clone of the underlying flag, for ctrlc handlers
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of manager state taken under one short lock
struct Readout {
    mode_label: &'static str,
    enabled: bool,
    angle: f64,
    velocity: f64,
    gain: f64,
    rate: f64,
    volume: f32,
    tracks: Vec<String>,
}

fn read_manager(manager: &Arc<Mutex<SoundManager>>) -> Readout {
    let mgr = manager.lock().unwrap();
    Readout {
        mode_label: mgr.mode().label(),
        enabled: mgr.is_enabled(),
        angle: mgr.current_angle(),
        velocity: mgr.current_velocity(),
        gain: mgr.current_gain(),
        rate: mgr.current_rate(),
        volume: mgr.master_volume(),
        tracks: mgr.track_names(),
    }
}

/// Run the monitor TUI until quit
pub fn run_monitor(manager: Arc<Mutex<SoundManager>>, state: &MonitorState) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = monitor_loop(&mut terminal, &manager, state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn monitor_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    manager: &Arc<Mutex<SoundManager>>,
    state: &MonitorState,
) -> Result<()> {
    // Last failure to show in the status bar; stdout is unusable in
    // raw mode on the alternate screen
    let mut notice: Option<String> = None;

    while state.is_running() {
        let readout = read_manager(manager);
        terminal.draw(|f| draw_ui(f, &readout, notice.as_deref()))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Esc, _) => {
                state.stop();
            }
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                state.stop();
            }
            (KeyCode::Char('m'), _) => {
                notice = match manager.lock().unwrap().cycle_mode() {
                    Ok(()) => None,
                    Err(e) => Some(format!("Mode switch failed: {}", e)),
                };
            }
            (KeyCode::Char(' '), _) => {
                let mut mgr = manager.lock().unwrap();
                let enabled = mgr.is_enabled();
                mgr.enable_audio(!enabled);
            }
            (KeyCode::Char('r'), _) => {
                manager.lock().unwrap().reset_track();
            }
            (KeyCode::Char(c), _) if c.is_ascii_digit() => {
                let index = c.to_digit(10).unwrap() as usize;
                manager.lock().unwrap().select_track(index);
            }
            (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                let mut mgr = manager.lock().unwrap();
                let volume = mgr.master_volume() + 0.05;
                mgr.set_master_volume(volume);
            }
            (KeyCode::Char('-'), _) => {
                let mut mgr = manager.lock().unwrap();
                let volume = mgr.master_volume() - 0.05;
                mgr.set_master_volume(volume);
            }
            _ => {}
        }
    }

    Ok(())
}

fn draw_ui(f: &mut Frame, readout: &Readout, notice: Option<&str>) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Signal meters
            Constraint::Min(4),    // Tracks
            Constraint::Length(3), // Status
        ])
        .split(area);

    draw_signal(f, chunks[0], readout);
    draw_tracks(f, chunks[1], readout);
    draw_status(f, chunks[2], readout, notice);
}

fn draw_signal(f: &mut Frame, area: Rect, readout: &Readout) {
    let block = Block::default().borders(Borders::ALL).title(" Signal ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    f.render_widget(
        Meter::new("angle", readout.angle, 0.0, 180.0).style(Style::default().fg(Color::Cyan)),
        rows[0],
    );
    f.render_widget(
        Meter::new("speed", readout.velocity.abs(), 0.0, 200.0)
            .style(Style::default().fg(Color::Magenta)),
        rows[1],
    );
    f.render_widget(
        Meter::new("gain", readout.gain, 0.0, 1.0).style(Style::default().fg(Color::Green)),
        rows[2],
    );
    f.render_widget(
        Meter::new("rate", readout.rate, 0.0, 2.0)
            .marker(1.0)
            .style(Style::default().fg(Color::Yellow)),
        rows[3],
    );
}

fn draw_tracks(f: &mut Frame, area: Rect, readout: &Readout) {
    let lines: Vec<Line> = if readout.tracks.is_empty() {
        vec![Line::from(Span::styled(
            "  (no tracks in this mode)",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        readout
            .tracks
            .iter()
            .enumerate()
            .map(|(i, name)| Line::from(format!("  {} {}", i, name)))
            .collect()
    };

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Tracks "));
    f.render_widget(paragraph, area);
}

fn status_line(readout: &Readout, notice: Option<&str>) -> Line<'static> {
    let audio = if readout.enabled { "ON" } else { "MUTED" };
    let audio_color = if readout.enabled {
        Color::Green
    } else {
        Color::Yellow
    };

    let mut spans = vec![
        Span::raw(format!("  Mode: {}  |  Audio: ", readout.mode_label)),
        Span::styled(audio.to_string(), Style::default().fg(audio_color)),
        Span::raw(format!(
            "  |  Vol: {:.0}%  |  m: mode  space: mute  0-9: pin  r: unpin  q: quit",
            readout.volume * 100.0
        )),
    ];
    if let Some(notice) = notice {
        spans.push(Span::styled(
            format!("  |  {}", notice),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

fn draw_status(f: &mut Frame, area: Rect, readout: &Readout, notice: Option<&str>) {
    let paragraph =
        Paragraph::new(status_line(readout, notice)).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_state_running() {
        let state = MonitorState::new();
        assert!(state.is_running());
        state.stop();
        assert!(!state.is_running());
    }

    #[test]
    fn test_monitor_state_flag_is_shared() {
        let state = MonitorState::new();
        let flag = state.flag();
        flag.store(false, Ordering::SeqCst);
        assert!(!state.is_running());
    }

    fn readout() -> Readout {
        Readout {
            mode_label: "Creak",
            enabled: true,
            angle: 90.0,
            velocity: 0.0,
            gain: 0.0,
            rate: 1.0,
            volume: 0.7,
            tracks: Vec::new(),
        }
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_status_line_shows_notice() {
        let text = line_text(&status_line(&readout(), Some("Mode switch failed: boom")));
        assert!(text.contains("Mode switch failed: boom"));
    }

    #[test]
    fn test_status_line_without_notice() {
        let text = line_text(&status_line(&readout(), None));
        assert!(text.contains("Mode: Creak"));
        assert!(!text.contains("failed"));
    }
}
