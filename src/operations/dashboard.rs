use super::summary::{Dashboard, DailyTotal, RankedCategory};
use super::tui::{self, Term};
use crate::error::TrackerResult;
use crate::ledger::Snapshot;
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Points},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::time::Duration;

const BAR_COLOR: Color = Color::Rgb(0x0E, 0xA5, 0xE9);

pub fn run_dashboard(snapshot: &Snapshot, today: NaiveDate) -> TrackerResult<()> {
    let dashboard = Dashboard::compute(snapshot, today);

    tui::run_fullscreen(|terminal: &mut Term| {
        loop {
            terminal.draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, area, &dashboard);
            })?;

            if let Some(key) = tui::next_key(Duration::from_millis(250))? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
        Ok(())
    })
}

fn render_dashboard(frame: &mut ratatui::Frame, area: Rect, data: &Dashboard) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(9),
        ])
        .split(area);

    render_stats(frame, layout[0], data);

    if data.receipt_count == 0 {
        let empty = Paragraph::new(vec![
            Line::from("No receipts yet"),
            Line::from("Scan a receipt image with `scan <path>` to see statistics"),
            Line::from(""),
            Line::from(Span::styled("press q to exit", Style::default().fg(Color::DarkGray))),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, layout[1]);
        return;
    }

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(layout[1]);

    render_category_pie(frame, charts[0], data);
    render_daily_chart(frame, charts[1], &data.daily_totals);
    render_top_categories(frame, layout[2], data);
}

fn render_stats(frame: &mut ratatui::Frame, area: Rect, data: &Dashboard) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let stats = [
        ("Receipts", data.receipt_count.to_string(), Color::Blue),
        ("Total spent", format_money(data.total), Color::Green),
        ("Last 7 days", data.recent_count.to_string(), Color::Magenta),
        ("Average receipt", format_money(data.average), Color::Yellow),
    ];

    for (cell, (label, value, color)) in cells.iter().zip(stats) {
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(label, Style::default().fg(Color::Gray))),
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, *cell);
    }
}

fn render_category_pie(frame: &mut ratatui::Frame, area: Rect, data: &Dashboard) {
    let block = Block::default()
        .title("Spending by category  (press q to exit)")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let total: Decimal = data.category_totals.iter().map(|c| c.amount).sum();
    let total = total.to_f64().unwrap_or(0.0);
    if total <= 0.0 {
        frame.render_widget(
            Paragraph::new("No receipts in known categories").alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let mut slices = Vec::new();
    let mut start_angle = 0.0_f64;
    for category in &data.category_totals {
        let sweep = category.amount.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
        slices.push((start_angle, start_angle + sweep, tui::hex_color(&category.color)));
        start_angle += sweep;
    }

    let canvas = Canvas::default()
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for (start, end, color) in &slices {
                let mut points = Vec::new();
                let mut radius = 0.0;
                while radius <= 1.0 {
                    let mut angle = *start;
                    while angle <= *end {
                        points.push((radius * angle.cos(), radius * angle.sin()));
                        angle += 0.05;
                    }
                    radius += 0.04;
                }
                if !points.is_empty() {
                    ctx.draw(&Points {
                        coords: &points,
                        color: *color,
                    });
                }
            }
        });
    frame.render_widget(canvas, halves[0]);

    let legend: Vec<Line> = data
        .category_totals
        .iter()
        .map(|category| {
            let percent = category.amount.to_f64().unwrap_or(0.0) / total * 100.0;
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(tui::hex_color(&category.color))),
                Span::raw(format!("{} {:.0}%", category.name, percent)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(legend), halves[1]);
}

fn render_daily_chart(frame: &mut ratatui::Frame, area: Rect, daily: &[DailyTotal]) {
    let block = Block::default().title("Last 7 days").borders(Borders::ALL);
    let inner_width = block.inner(area).width as usize;
    let bar_width = (inner_width / daily.len().max(1)).saturating_sub(1).clamp(3, 12) as u16;

    let bars: Vec<Bar> = daily
        .iter()
        .map(|day| {
            Bar::default()
                .value(day.amount.to_u64().unwrap_or(0))
                .text_value(format_money(day.amount))
                .label(Line::from(day.date.format("%b %d").to_string()))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(BAR_COLOR))
        .value_style(Style::default().fg(Color::Black).bg(BAR_COLOR))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_top_categories(frame: &mut ratatui::Frame, area: Rect, data: &Dashboard) {
    let top: &[RankedCategory] = &data.top_categories;
    let block = Block::default()
        .title(top_categories_title(data))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let name_width = top.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
    let bar_space = (inner.width as usize).saturating_sub(name_width + 24).max(1);

    let lines: Vec<Line> = top
        .iter()
        .enumerate()
        .map(|(idx, category)| {
            let color = tui::hex_color(&category.color);
            let filled = share_width(category.share, bar_space);
            Line::from(vec![
                Span::styled(
                    format!("{}. ", idx + 1),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:<width$}  ", category.name, width = name_width)),
                Span::styled(format!("{:>12}  ", format_money(category.amount)), Style::default().fg(color)),
                Span::styled("█".repeat(filled), Style::default().fg(color)),
                Span::styled(
                    "░".repeat(bar_space - filled),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn top_categories_title(data: &Dashboard) -> String {
    match &data.period {
        Some(period) => format!(
            "Top categories  ({} .. {}, labels in use: {})",
            period.start.format("%Y-%m-%d"),
            period.end.format("%Y-%m-%d"),
            data.category_count
        ),
        None => "Top categories".to_string(),
    }
}

/// Cells of a `width`-wide bar filled for a `share` percentage.
fn share_width(share: f64, width: usize) -> usize {
    let cells = (share / 100.0 * width as f64).round();
    (cells.max(0.0) as usize).min(width)
}

fn format_money(amount: Decimal) -> String {
    format!("{} ₽", amount.normalize())
}
