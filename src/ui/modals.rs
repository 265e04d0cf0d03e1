use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::App;
use crate::model::TransferDirection;
use crate::ui::constants::{MODAL_WIDTH_PERCENT, TRANSFER_CONFIRM_WIDTH_PERCENT};
use crate::ui::helpers::{
    centered_rect_by_height, draw_popup_frame, format_bytes, modal_height,
};

pub(crate) fn draw_transfer_confirm_modal(frame: &mut Frame<'_>, app: &App) {
    let Some(pending) = &app.pending_transfer else {
        return;
    };
    let (source, target) = match pending.direction {
        TransferDirection::Push => (
            app.local_cwd.to_string_lossy().into_owned(),
            app.remote_cwd.clone(),
        ),
        TransferDirection::Pull => (
            app.remote_cwd.clone(),
            app.local_cwd.to_string_lossy().into_owned(),
        ),
    };
    let height = modal_height(4, 2);
    let area = centered_rect_by_height(TRANSFER_CONFIRM_WIDTH_PERCENT, height, frame.area());
    let title = format!("Confirm {}", pending.direction.label().to_lowercase());
    let inner = draw_popup_frame(frame, area, &title, Style::default().fg(Color::Yellow));

    let lines = vec![
        Line::from(format!("Source: {source}")),
        Line::from(format!("Target: {target}")),
        Line::from(format!("Items: {}", pending.plan.items.len())),
        Line::from(format!("Size: {}", format_bytes(pending.plan.total_bytes))),
    ];
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, layout[0]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" or "),
        Span::styled("Y", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to start, "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" or "),
        Span::styled("N", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to cancel"),
    ]))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

pub(crate) fn draw_confirm_delete_modal(frame: &mut Frame<'_>, app: &App) {
    let Some(request) = &app.delete_request else {
        return;
    };
    let height = modal_height(2, 2);
    let area = centered_rect_by_height(MODAL_WIDTH_PERCENT, height, frame.area());
    let inner = draw_popup_frame(
        frame,
        area,
        "Delete?",
        Style::default().fg(Color::Red),
    );

    let label = if request.names.len() == 1 {
        request.names[0].clone()
    } else {
        format!("{} entries", request.names.len())
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    let message = Paragraph::new(format!(
        "Delete {label} from the {} side? This cannot be undone.",
        request.side.label().to_lowercase()
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(message, layout[0]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" or "),
        Span::styled("Y", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to confirm, "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" or "),
        Span::styled("N", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to cancel"),
    ]))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}

pub(crate) fn draw_notice_modal(frame: &mut Frame<'_>, app: &App) {
    let Some(notice) = &app.notice else {
        return;
    };
    let message_lines = notice.message.lines().count().max(1);
    let height = modal_height(message_lines + 1, 1);
    let area = centered_rect_by_height(MODAL_WIDTH_PERCENT, height, frame.area());
    let inner = draw_popup_frame(
        frame,
        area,
        notice.title.as_str(),
        Style::default().fg(Color::Yellow),
    );

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(inner);
    let message = Paragraph::new(notice.message.as_str()).wrap(Wrap { trim: true });
    frame.render_widget(message, layout[0]);

    let footer = Paragraph::new(Line::from(vec![
        Span::raw("Press "),
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" to close."),
    ]))
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, layout[1]);
}
