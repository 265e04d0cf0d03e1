pub(crate) const STATUS_READY: &str = "Ready";

pub(crate) const DEFAULT_REMOTE_ROOT: &str = "/sdcard/";

pub(crate) const LOG_TIMESTAMP_FORMAT: &str = "%m-%d %H:%M:%S";
pub(crate) const LOG_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const LOG_SEPARATOR: &str = " | ";
pub(crate) const LOG_NO_LOGS_MESSAGE: &str = "No logs yet";

pub(crate) const LOG_RETENTION_DAYS: i64 = 7;
pub(crate) const LOG_MAX_ENTRIES: usize = 10_000;
pub(crate) const LOG_MAX_IN_MEMORY: usize = 100;

pub(crate) const NOT_CONNECTED_MESSAGE: &str = "No device connected";
pub(crate) const NOTICE_NOT_CONNECTED_TITLE: &str = "Not connected";
pub(crate) const NOTICE_NOT_CONNECTED_MESSAGE: &str =
    "Connect a device via USB, enable debugging, then press R to reconnect.";
