pub(crate) const HELP_TEXT: &str =
    "Tab switch pane | Enter open | Backspace up | ~ home | space mark | p push | l pull | x delete | r refresh | R reconnect | c cancel | v view | q quit";

pub(crate) const HEADER_HEIGHT: u16 = 4;
pub(crate) const STATUS_HEIGHT: u16 = 1;
pub(crate) const GAUGE_HEIGHT: u16 = 3;

pub(crate) const MODAL_WIDTH_PERCENT: u16 = 60;
pub(crate) const TRANSFER_CONFIRM_WIDTH_PERCENT: u16 = 70;

pub(crate) const POPUP_MIN_WIDTH: u16 = 10;
pub(crate) const POPUP_MIN_HEIGHT: u16 = 5;

/// Columns reserved on the right of each pane row for the size label.
pub(crate) const PANE_SIZE_COLUMN: u16 = 12;
