use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};

use crate::app::{App, HeaderMode};
use crate::model::{ConnectionStatus, Side};
use crate::ui::constants::{HELP_TEXT, PANE_SIZE_COLUMN};
use crate::ui::helpers::{format_bytes, format_eta, format_throughput, list_state, truncate_text};

pub(crate) fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    match app.header_mode {
        HeaderMode::Help => {
            let help = Paragraph::new(HELP_TEXT)
                .block(
                    Block::default()
                        .title(Line::from(Span::styled("Help", header_style)))
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true });
            frame.render_widget(help, area);
        }
        HeaderMode::Logs => {
            let log_lines = app
                .log_lines
                .iter()
                .rev()
                .take(area.height.saturating_sub(2) as usize)
                .cloned()
                .collect::<Vec<_>>();
            let logs = Paragraph::new(log_lines.join("\n"))
                .block(
                    Block::default()
                        .title(Line::from(Span::styled("Logs", header_style)))
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::Gray))
                .wrap(Wrap { trim: true });
            frame.render_widget(logs, area);
        }
        HeaderMode::Off => {}
    }
}

pub(crate) fn draw_pane(frame: &mut Frame<'_>, app: &App, side: Side, area: Rect) {
    let pane = app.pane(side);
    let active = app.active_side == side;
    let border_style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Gray)
    };
    let location = match side {
        Side::Local => app.local_cwd.to_string_lossy().into_owned(),
        Side::Remote => app.remote_cwd.clone(),
    };
    let title_width = area.width.saturating_sub(4) as usize;
    let title = truncate_text(&format!("{}: {}", side.label(), location), title_width);
    let title_style = if active {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let block = Block::default()
        .title(Line::from(Span::styled(title, title_style)))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The remote pane dedicates its last inner row to disk usage.
    let show_usage = side == Side::Remote && app.disk_usage.is_some();
    let list_area = if show_usage {
        Rect {
            x: inner.x,
            y: inner.y,
            width: inner.width,
            height: inner.height.saturating_sub(1),
        }
    } else {
        inner
    };

    if let Some(error) = &pane.error {
        let message = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(message, list_area);
    } else if pane.loading {
        let message = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(message, list_area);
    } else if pane.entries.is_empty() {
        let message = Paragraph::new("(empty)")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(message, list_area);
    } else {
        let name_width = list_area
            .width
            .saturating_sub(2 + PANE_SIZE_COLUMN) as usize;
        let items: Vec<ListItem> = pane
            .entries
            .iter()
            .map(|entry| {
                let marked = pane.marked.contains(&entry.name);
                let prefix = if marked { "*" } else { " " };
                let name = if entry.is_dir() {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                };
                let name = truncate_text(&name, name_width);
                let size = entry
                    .size_bytes
                    .map(format_bytes)
                    .unwrap_or_default();
                let row_style = if entry.is_dir() {
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
                } else if marked {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                let size_width = PANE_SIZE_COLUMN as usize;
                let pad = (name_width.saturating_sub(name.chars().count())).max(1);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{prefix}{name}"), row_style),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(
                        format!("{size:>size_width$}"),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = list_state(pane.selected, pane.entries.len());
        frame.render_stateful_widget(list, list_area, &mut state);
    }

    if show_usage {
        if let Some(usage) = &app.disk_usage {
            let label = format!(
                "{} used of {}, {} free",
                format_bytes(usage.used_bytes),
                format_bytes(usage.total_bytes),
                format_bytes(usage.available_bytes),
            );
            let usage_line = Paragraph::new(truncate_text(&label, inner.width as usize))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center);
            let usage_area = Rect {
                x: inner.x,
                y: inner.y + inner.height.saturating_sub(1),
                width: inner.width,
                height: 1,
            };
            frame.render_widget(usage_line, usage_area);
        }
    }
}

pub(crate) fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let (connection_label, connection_style) = match &app.connection {
        ConnectionStatus::Checking => ("checking", Style::default().fg(Color::Yellow)),
        ConnectionStatus::Connected(_) => ("connected", Style::default().fg(Color::Green)),
        ConnectionStatus::NoDevice => ("no device", Style::default().fg(Color::Red)),
        ConnectionStatus::ToolMissing => ("adb missing", Style::default().fg(Color::Red)),
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("[{connection_label}]"),
            connection_style.add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(app.status.as_str()),
    ]));
    frame.render_widget(status, area);
}

pub(crate) fn draw_transfer_gauge(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(running) = &app.running_transfer else {
        return;
    };
    let percent = (running.fraction * 100.0).clamp(0.0, 100.0);
    let rate = running
        .throughput
        .map(format_throughput)
        .unwrap_or_else(|| "-".to_string());
    let eta = running
        .eta_secs
        .map(format_eta)
        .unwrap_or_else(|| "-".to_string());
    let elapsed = format_eta(running.started.elapsed().as_secs());
    let label = format!(
        "{:.0}% | {} / {} | {} | {} elapsed | ETA {}",
        percent,
        format_bytes(running.bytes_done),
        format_bytes(running.total_bytes),
        rate,
        elapsed,
        eta,
    );
    let title = if running.current_item.is_empty() {
        format!("{} ({} items)", running.direction.label(), running.item_count)
    } else {
        format!(
            "{}: {} ({} items, c to cancel)",
            running.direction.label(),
            running.current_item,
            running.item_count
        )
    };
    let title = truncate_text(&title, area.width.saturating_sub(4) as usize);
    let gauge = Gauge::default()
        .ratio(running.fraction.clamp(0.0, 1.0))
        .label(label)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray))
        .gauge_style(Style::default().fg(Color::Green));
    frame.render_widget(gauge, area);
}
