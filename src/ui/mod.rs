use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{App, HeaderMode};
use crate::model::{Mode, Side};
use crate::ui::constants::{GAUGE_HEIGHT, HEADER_HEIGHT, STATUS_HEIGHT};
use crate::ui::modals::{
    draw_confirm_delete_modal, draw_notice_modal, draw_transfer_confirm_modal,
};
use crate::ui::panels::{draw_header, draw_pane, draw_status_bar, draw_transfer_gauge};

pub(crate) mod constants;
mod helpers;
mod modals;
mod panels;

pub(crate) fn draw_ui(frame: &mut Frame<'_>, app: &App) {
    let show_header = app.header_mode != HeaderMode::Off;
    let show_gauge = app.running_transfer.is_some();
    let mut constraints = Vec::with_capacity(4);
    if show_header {
        constraints.push(Constraint::Length(HEADER_HEIGHT));
    }
    constraints.push(Constraint::Min(1));
    if show_gauge {
        constraints.push(Constraint::Length(GAUGE_HEIGHT));
    }
    constraints.push(Constraint::Length(STATUS_HEIGHT));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let mut row = 0usize;
    if show_header {
        draw_header(frame, app, layout[row]);
        row += 1;
    }

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(layout[row]);
    draw_pane(frame, app, Side::Local, panes[0]);
    draw_pane(frame, app, Side::Remote, panes[1]);
    row += 1;

    if show_gauge {
        draw_transfer_gauge(frame, app, layout[row]);
        row += 1;
    }
    draw_status_bar(frame, app, layout[row]);

    if app.mode == Mode::ConfirmTransfer {
        draw_transfer_confirm_modal(frame, app);
    }
    if app.mode == Mode::ConfirmDelete {
        draw_confirm_delete_modal(frame, app);
    }
    if app.notice.is_some() {
        draw_notice_modal(frame, app);
    }
}
