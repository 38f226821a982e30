use super::history::{HistoryQuery, category_color, filter_history};
use super::tui::{self, Term};
use crate::error::TrackerResult;
use crate::ledger::Ledger;
use crate::models::category::Category;
use crate::models::receipt::Receipt;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::cmp::{max, min};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
    ConfirmDelete,
    Input(InputKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Search,
    Category,
}

struct BrowseState {
    mode: Mode,

    receipts: Arc<[Receipt]>,
    categories: Arc<[Category]>,
    visible: Vec<Receipt>,

    table_state: TableState,
    query: HistoryQuery,

    input_buffer: String,
    status: Option<String>,

    // Cached per-draw
    last_page_size: usize,
}

impl BrowseState {
    fn new(ledger: &Ledger) -> Self {
        let snapshot = ledger.snapshot();
        let mut state = Self {
            mode: Mode::List,
            receipts: snapshot.receipts,
            categories: snapshot.categories,
            visible: Vec::new(),
            table_state: TableState::default(),
            query: HistoryQuery::default(),
            input_buffer: String::new(),
            status: None,
            last_page_size: 10,
        };
        state.recompute();
        state
    }

    fn selected_receipt(&self) -> Option<&Receipt> {
        self.visible.get(self.table_state.selected()?)
    }

    fn recompute(&mut self) {
        self.visible = filter_history(&self.receipts, &self.query)
            .into_iter()
            .cloned()
            .collect();

        if self.visible.is_empty() {
            self.table_state.select(None);
        } else {
            let selected = match self.table_state.selected() {
                Some(sel) => min(sel, self.visible.len() - 1),
                None => 0,
            };
            self.table_state.select(Some(selected));
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.visible.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.visible.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page(&mut self, direction: i32) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(direction * page);
    }

    fn start_input(&mut self, kind: InputKind) {
        self.input_buffer = match kind {
            InputKind::Search => self.query.search.clone(),
            InputKind::Category => self.query.category.clone().unwrap_or_default(),
        };
        self.mode = Mode::Input(kind);
    }

    fn commit_input(&mut self, kind: InputKind) {
        let raw = self.input_buffer.trim();
        match kind {
            InputKind::Search => self.query.search = raw.to_string(),
            InputKind::Category => {
                self.query.category = if raw.is_empty() {
                    None
                } else {
                    Some(raw.to_string())
                };
            }
        }
        self.mode = Mode::List;
        self.recompute();
    }

    fn clear_filters(&mut self) {
        self.query = HistoryQuery {
            sort: self.query.sort,
            ..Default::default()
        };
        self.recompute();
    }

    fn toggle_sort(&mut self) {
        self.query.sort = self.query.sort.toggle();
        self.recompute();
    }

    fn delete_selected(&mut self, ledger: &mut Ledger) {
        let Some(id) = self.selected_receipt().map(Receipt::id) else {
            self.mode = Mode::List;
            return;
        };

        match ledger.delete_receipt(id) {
            Ok(removed) => {
                self.status = Some(format!("Deleted receipt from {}", removed.store()));
            }
            Err(e) => {
                warn!(error = %e, "Failed to delete receipt from history view");
                self.status = Some(format!("Error: {}", e));
            }
        }

        let snapshot = ledger.snapshot();
        self.receipts = snapshot.receipts;
        self.categories = snapshot.categories;
        self.mode = Mode::List;
        self.recompute();
    }
}

/// Interactive receipt history. Deleting here removes receipts from `ledger`.
pub fn run_browse(ledger: &mut Ledger) -> TrackerResult<()> {
    let mut state = BrowseState::new(ledger);

    tui::run_fullscreen(|terminal: &mut Term| {
        loop {
            terminal.draw(|frame| {
                let size = frame.area();
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(5),
                        Constraint::Length(3),
                    ])
                    .split(size);

                render_header(frame, layout[0], &state);
                render_table(frame, layout[1], &mut state);
                render_footer(frame, layout[2], &state);

                match state.mode {
                    Mode::Input(kind) => render_input_modal(frame, size, &state, kind),
                    Mode::Details => render_details_modal(frame, size, &state),
                    Mode::ConfirmDelete => render_confirm_modal(frame, size, &state),
                    Mode::List => {}
                }
            })?;

            if let Some(key) = tui::next_key(Duration::from_millis(200))? {
                if handle_key(ledger, &mut state, key) {
                    break;
                }
            }
        }
        Ok(())
    })
}

/// Returns `true` when the view should close.
fn handle_key(ledger: &mut Ledger, state: &mut BrowseState, key: KeyEvent) -> bool {
    match state.mode {
        Mode::List => {
            state.status = None;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return true,
                KeyCode::Up => state.move_selection(-1),
                KeyCode::Down => state.move_selection(1),
                KeyCode::PageUp => state.page(-1),
                KeyCode::PageDown => state.page(1),
                KeyCode::Home => state.move_selection(i32::MIN / 2),
                KeyCode::End => state.move_selection(i32::MAX / 2),
                KeyCode::Enter => {
                    if state.selected_receipt().is_some() {
                        state.mode = Mode::Details;
                    }
                }
                KeyCode::Char('/') => state.start_input(InputKind::Search),
                KeyCode::Char('c') => state.start_input(InputKind::Category),
                KeyCode::Char('s') => state.toggle_sort(),
                KeyCode::Char('x') => state.clear_filters(),
                KeyCode::Char('d') | KeyCode::Delete => {
                    if state.selected_receipt().is_some() {
                        state.mode = Mode::ConfirmDelete;
                    }
                }
                _ => {}
            }
        }
        Mode::Details => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b')) {
                state.mode = Mode::List;
            }
        }
        Mode::ConfirmDelete => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => state.delete_selected(ledger),
            _ => state.mode = Mode::List,
        },
        Mode::Input(kind) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.mode = Mode::List;
                return false;
            }

            match key.code {
                KeyCode::Esc => state.mode = Mode::List,
                KeyCode::Enter => state.commit_input(kind),
                KeyCode::Backspace => {
                    state.input_buffer.pop();
                }
                KeyCode::Char(ch) => state.input_buffer.push(ch),
                _ => {}
            }
        }
    }

    false
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let search = if state.query.search.is_empty() {
        "(any)"
    } else {
        state.query.search.as_str()
    };
    let category = state.query.category.as_deref().unwrap_or("(all)");

    let line = Line::from(vec![
        Span::styled(
            "Receipt history",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(format!("Sort: {}", state.query.sort.label())),
        Span::raw("  |  "),
        Span::raw(format!("Search: {}", search)),
        Span::raw("  |  "),
        Span::raw(format!("Category: {}", category)),
        Span::raw("  |  "),
        Span::raw(format!("Rows: {}", state.visible.len())),
    ]);

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let hint = match (&state.status, state.mode) {
        (Some(status), Mode::List) => status.as_str(),
        (None, Mode::List) => {
            "↑/↓ move  PgUp/PgDn page  Enter details  / search  c category  s sort  x clear  d delete  q/Esc exit"
        }
        (_, Mode::Details) => "Esc/q/b back",
        (_, Mode::ConfirmDelete) => "y/Enter delete, any other key cancels",
        (_, Mode::Input(_)) => "Type, Enter apply, Esc cancel",
    };

    frame.render_widget(
        Paragraph::new(hint)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Receipts").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new([
        Cell::from("Date").style(bold),
        Cell::from("Store").style(bold),
        Cell::from("Category").style(bold),
        Cell::from("Items").style(bold),
        Cell::from("Amount").style(bold),
        Cell::from("Id").style(bold),
    ])
    .style(Style::default().fg(Color::White));

    let rows = state.visible.iter().map(|receipt| {
        let color = tui::hex_color(category_color(&state.categories, receipt.category()));
        let mut id_short = receipt.id().to_string();
        id_short.truncate(8);

        Row::new([
            Cell::from(receipt.date().format("%Y-%m-%d").to_string()),
            Cell::from(truncate(receipt.store(), 32)),
            Cell::from(receipt.category().to_string()).style(Style::default().fg(color)),
            Cell::from(format!("{} items", receipt.items().len())),
            Cell::from(format!("{} ₽", receipt.amount().normalize())),
            Cell::from(id_short),
        ])
    });

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(30),
        Constraint::Length(16),
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.visible.is_empty() {
        let message = if state.receipts.is_empty() {
            "No receipts yet"
        } else {
            "No receipts match the current filters"
        };
        frame.render_widget(
            Paragraph::new(message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
    }
}

fn render_input_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState, kind: InputKind) {
    let popup_area = tui::centered_rect(80, 30, area);
    frame.render_widget(Clear, popup_area);

    let (title, help) = match kind {
        InputKind::Search => ("Search", "Store name or item text (empty clears)"),
        InputKind::Category => ("Filter Category", "Exact category name (empty shows all)"),
    };

    let lines = vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(help),
        Line::from(""),
        Line::from(Span::styled(
            format!("> {}", state.input_buffer),
            Style::default().fg(Color::Yellow),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Input"))
            .wrap(Wrap { trim: true }),
        popup_area,
    );
}

fn render_confirm_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = tui::centered_rect(60, 25, area);
    frame.render_widget(Clear, popup_area);

    let target = state
        .selected_receipt()
        .map(|r| format!("{} on {}", r.store(), r.date().format("%Y-%m-%d")))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(
            "Delete receipt?",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(target),
        Line::from("This cannot be undone."),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .alignment(Alignment::Center),
        popup_area,
    );
}

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = tui::centered_rect(90, 60, area);
    frame.render_widget(Clear, popup_area);

    let Some(receipt) = state.selected_receipt() else {
        frame.render_widget(
            Paragraph::new("No selection")
                .block(Block::default().borders(Borders::ALL).title("Details"))
                .alignment(Alignment::Center),
            popup_area,
        );
        return;
    };

    let color = tui::hex_color(category_color(&state.categories, receipt.category()));
    let mut lines = vec![
        Line::from(Span::styled(
            "Receipt Details",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Id: {}", receipt.id())),
        Line::from(format!("Date: {}", receipt.date().format("%Y-%m-%d"))),
        Line::from(format!("Store: {}", receipt.store())),
        Line::from(vec![
            Span::raw("Category: "),
            Span::styled(receipt.category().to_string(), Style::default().fg(color)),
        ]),
        Line::from(format!("Amount: {} ₽", receipt.amount().normalize())),
        Line::from(""),
        Line::from("Items:"),
    ];
    lines.extend(receipt.items().iter().map(|item| Line::from(format!("  • {}", item))));

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::history::SortKey;
    use chrono::NaiveDate;
    use crossterm::event::KeyEvent;
    use rust_decimal::Decimal;

    fn ledger_with(receipts: &[(&str, i64, &str)]) -> Ledger {
        let mut ledger = Ledger::default();
        for (store, amount, category) in receipts {
            ledger.add_receipt(
                Receipt::new(
                    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                    *store,
                    Decimal::from(*amount),
                    *category,
                    vec![],
                )
                .unwrap(),
            );
        }
        ledger
    }

    fn press(ledger: &mut Ledger, state: &mut BrowseState, code: KeyCode) -> bool {
        handle_key(ledger, state, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(ledger: &mut Ledger, state: &mut BrowseState, text: &str) {
        for ch in text.chars() {
            press(ledger, state, KeyCode::Char(ch));
        }
    }

    #[test]
    fn test_initial_selection() {
        let ledger = ledger_with(&[("Magnit", 100, "Groceries")]);
        let state = BrowseState::new(&ledger);
        assert_eq!(state.table_state.selected(), Some(0));

        let empty = BrowseState::new(&Ledger::default());
        assert_eq!(empty.table_state.selected(), None);
    }

    #[test]
    fn test_move_selection_is_clamped() {
        let ledger = ledger_with(&[("A", 1, "Other"), ("B", 2, "Other"), ("C", 3, "Other")]);
        let mut state = BrowseState::new(&ledger);

        state.move_selection(-5);
        assert_eq!(state.table_state.selected(), Some(0));
        state.move_selection(10);
        assert_eq!(state.table_state.selected(), Some(2));
    }

    #[test]
    fn test_search_input_filters_rows() {
        let mut ledger = ledger_with(&[("Magnit", 100, "Groceries"), ("Yandex Taxi", 400, "Transport")]);
        let mut state = BrowseState::new(&ledger);

        press(&mut ledger, &mut state, KeyCode::Char('/'));
        type_text(&mut ledger, &mut state, "taxi");
        press(&mut ledger, &mut state, KeyCode::Enter);

        assert_eq!(state.mode, Mode::List);
        assert_eq!(state.visible.len(), 1);
        assert_eq!(state.visible[0].store(), "Yandex Taxi");

        press(&mut ledger, &mut state, KeyCode::Char('x'));
        assert_eq!(state.visible.len(), 2);
    }

    #[test]
    fn test_category_input_empty_clears_filter() {
        let mut ledger = ledger_with(&[("Magnit", 100, "Groceries"), ("Yandex Taxi", 400, "Transport")]);
        let mut state = BrowseState::new(&ledger);

        press(&mut ledger, &mut state, KeyCode::Char('c'));
        type_text(&mut ledger, &mut state, "Groceries");
        press(&mut ledger, &mut state, KeyCode::Enter);
        assert_eq!(state.visible.len(), 1);

        press(&mut ledger, &mut state, KeyCode::Char('c'));
        for _ in 0.."Groceries".len() {
            press(&mut ledger, &mut state, KeyCode::Backspace);
        }
        press(&mut ledger, &mut state, KeyCode::Enter);
        assert_eq!(state.query.category, None);
        assert_eq!(state.visible.len(), 2);
    }

    #[test]
    fn test_sort_toggle_orders_by_amount() {
        let mut ledger = ledger_with(&[("Small", 10, "Other"), ("Big", 900, "Other"), ("Mid", 50, "Other")]);
        let mut state = BrowseState::new(&ledger);

        press(&mut ledger, &mut state, KeyCode::Char('s'));
        assert_eq!(state.query.sort, SortKey::Amount);
        let stores: Vec<&str> = state.visible.iter().map(|r| r.store()).collect();
        assert_eq!(stores, ["Big", "Mid", "Small"]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut ledger = ledger_with(&[("Magnit", 100, "Groceries"), ("Yandex Taxi", 400, "Transport")]);
        let mut state = BrowseState::new(&ledger);

        press(&mut ledger, &mut state, KeyCode::Char('d'));
        assert_eq!(state.mode, Mode::ConfirmDelete);
        press(&mut ledger, &mut state, KeyCode::Char('n'));
        assert_eq!(state.mode, Mode::List);
        assert_eq!(ledger.receipts().len(), 2);

        press(&mut ledger, &mut state, KeyCode::Char('d'));
        press(&mut ledger, &mut state, KeyCode::Char('y'));
        assert_eq!(ledger.receipts().len(), 1);
        assert_eq!(state.visible.len(), 1);
        assert!(state.status.as_deref().unwrap().starts_with("Deleted receipt"));
    }

    #[test]
    fn test_quit_keys() {
        let mut ledger = Ledger::default();
        let mut state = BrowseState::new(&ledger);
        assert!(press(&mut ledger, &mut state, KeyCode::Char('q')));
        assert!(press(&mut ledger, &mut state, KeyCode::Esc));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Перекрёсток Экспресс", 10), "Перекрё...");
    }
}
