use reqwest::{Client, Response};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};

pub enum MessageType {
    Notification { title: String, message: String },
    Log((String, Level)),
}

#[derive(Clone)]
pub struct TelegramSubscriber {
    sender: mpsc::UnboundedSender<MessageType>,
}

const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn render(message: MessageType) -> String {
    match message {
        MessageType::Notification { title, message } => {
            format!("*{}*\n{}", escape_markdown(&title), escape_markdown(&message))
        }
        MessageType::Log((message, level)) => {
            format!("*{}*: `{}`", level.as_str(), escape_markdown(&message))
        }
    }
}

async fn send_message(
    client: &Client,
    bot_token: &str,
    chat_id: &str,
    text: String,
) -> anyhow::Result<Response> {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
    let params = [
        ("chat_id", chat_id),
        ("text", &text),
        ("parse_mode", "MarkdownV2"),
    ];

    Ok(client.post(&url).form(&params).send().await?)
}

async fn sender_task(
    mut reader: mpsc::UnboundedReceiver<MessageType>,
    client: Client,
    bot_token: String,
    chat_id: String,
) {
    while let Some(msg) = reader.recv().await {
        let result = send_message(&client, &bot_token, &chat_id, render(msg)).await;

        match result {
            Ok(response) if response.status().is_success() => {}
            // We use eprintln! here because it doesn't make sense to send back a message to the chat
            Ok(response) => eprintln!(
                "Failed to send message: Received HTTP {}:",
                response.status()
            ),
            Err(e) => eprintln!("Failed to send message: {}", e),
        }
    }
}

impl TelegramSubscriber {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(sender_task(receiver, Client::new(), bot_token, chat_id));
        Self { sender }
    }

    /// Fire-and-forget: the message is queued and sent by the background task.
    pub fn notify(&self, title: &str, message: &str) {
        let _ = self.sender.send(MessageType::Notification {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn send_log(&self, message: &str, level: &Level) {
        let _ = self
            .sender
            .send(MessageType::Log((message.to_string(), *level)));
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for TelegramSubscriber {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let message = format!("{}", visitor);

        // Only WARN and above reach the chat
        let level = event.metadata().level();
        if level <= &Level::WARN {
            self.send_log(&message, level);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl fmt::Display for MessageVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
