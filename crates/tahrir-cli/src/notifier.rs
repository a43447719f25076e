//! A [`Notifier`] that writes each event to the log.

use tahrir_core::notify::{Notification, Notifier, NotifyError};
use tracing::info;

pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, event: &Notification) -> Result<(), NotifyError> {
    let body = event.body()?;
    info!(
      topic = event.topic(),
      agent = event.agent_name(),
      summary = %event.summary(),
      %body,
      "notification"
    );
    Ok(())
  }
}
