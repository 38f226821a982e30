use crate::error::TrackerResult;
use crate::models::category::hex_to_rgb;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::{Color, Constraint, Direction, Layout, Rect};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::warn;

pub type Term = Terminal<CrosstermBackend<Stdout>>;

/// Runs its closure once when dropped.
struct Restore<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for Restore<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.0.take() {
            restore();
        }
    }
}

/// Runs `body` on the alternate screen. Every terminal mode that was entered
/// is left again on all paths, including failed setup.
pub fn run_fullscreen<F>(body: F) -> TrackerResult<()>
where
    F: FnOnce(&mut Term) -> TrackerResult<()>,
{
    enable_raw_mode()?;
    let _raw_mode = Restore(Some(|| {
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "Failed to disable raw mode");
        }
    }));

    execute!(io::stdout(), EnterAlternateScreen)?;
    let _alternate_screen = Restore(Some(|| {
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen) {
            warn!(error = %e, "Failed to leave alternate screen");
        }
    }));

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    body(&mut terminal)
}

/// Next key press, if one arrives within `timeout`. Release events are
/// dropped since many terminals report both press and release.
pub fn next_key(timeout: Duration) -> TrackerResult<Option<KeyEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind != KeyEventKind::Release => Ok(Some(key)),
        _ => Ok(None),
    }
}

pub fn hex_color(hex: &str) -> Color {
    hex_to_rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn guarded_steps(fail_at: usize, log: &RefCell<Vec<&'static str>>) -> TrackerResult<()> {
        let _first = Restore(Some(|| log.borrow_mut().push("undo first")));
        if fail_at == 1 {
            return Err(io::Error::other("second step failed").into());
        }
        let _second = Restore(Some(|| log.borrow_mut().push("undo second")));
        if fail_at == 2 {
            return Err(io::Error::other("body failed").into());
        }
        Ok(())
    }

    #[test]
    fn test_restore_runs_for_every_entered_step() {
        let log = RefCell::new(Vec::new());
        assert!(guarded_steps(1, &log).is_err());
        assert_eq!(*log.borrow(), ["undo first"]);

        log.borrow_mut().clear();
        assert!(guarded_steps(2, &log).is_err());
        assert_eq!(*log.borrow(), ["undo second", "undo first"]);

        log.borrow_mut().clear();
        assert!(guarded_steps(0, &log).is_ok());
        assert_eq!(*log.borrow(), ["undo second", "undo first"]);
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#10B981"), Color::Rgb(0x10, 0xB9, 0x81));
        assert_eq!(hex_color("nonsense"), Color::Gray);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(80, 30, area);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
        assert_eq!(popup.width, 80);
    }
}
