use std::sync::Arc;

use shared::telegram::TelegramSubscriber;
use tokio::sync::mpsc;
use tracing::info;

use crate::messages::{MessageLoader, Notification};

/// Fire-and-forget user notifications. Every notification is logged; it is also
/// pushed to Telegram and to a local listener when those are attached.
#[derive(Clone)]
pub struct Notifier {
    pub messages: Arc<MessageLoader>,
    telegram: Option<TelegramSubscriber>,
    listener: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    pub fn new(messages: Arc<MessageLoader>, telegram: Option<TelegramSubscriber>) -> Self {
        Self {
            messages,
            telegram,
            listener: None,
        }
    }

    /// Also delivers every notification to the returned receiver.
    pub fn with_listener(mut self) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.listener = Some(sender);
        (self, receiver)
    }

    pub fn send(&self, notification: Notification) {
        info!(
            title = %notification.title,
            "Notification: {}", notification.message
        );
        if let Some(telegram) = &self.telegram {
            telegram.notify(&notification.title, &notification.message);
        }
        if let Some(listener) = &self.listener {
            let _ = listener.send(notification);
        }
    }
}
