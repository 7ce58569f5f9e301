//! The notification contract: failed requests surface a transient notice
//! through whatever sink the application registers.

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStatus {
    Error,
    Warning,
    Info,
    Success,
}

/// Default display duration for failure notices.
pub const DEFAULT_NOTICE_DURATION_MS: u64 = 5000;

/// A transient user-facing notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub status: NoticeStatus,
    pub duration_ms: u64,
    pub closable: bool,
}

impl Notice {
    /// An error notice with the default duration, closable.
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: NoticeStatus::Error,
            duration_ms: DEFAULT_NOTICE_DURATION_MS,
            closable: true,
        }
    }
}

/// Sink for transient notifications, injected into the runtime builder so
/// the dispatcher never couples to a concrete toast implementation.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default [`Notifier`] that emits notices as `tracing` events.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.status {
            NoticeStatus::Error => tracing::error!(title = %notice.title, "notice"),
            NoticeStatus::Warning => tracing::warn!(title = %notice.title, "notice"),
            _ => tracing::info!(title = %notice.title, "notice"),
        }
    }
}
