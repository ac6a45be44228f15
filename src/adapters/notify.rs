use crate::domain::model::{Notice, NoticeLevel};
use crate::domain::ports::Notifier;

/// Sends notices to the log instead of a snackbar.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!("✅ {}", notice.message),
            NoticeLevel::Error => tracing::error!("❌ {}", notice.message),
        }
    }
}
