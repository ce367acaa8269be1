use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, instrument, warn};

/// The page as it looked after one batch of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn document(&self) -> Document {
        Document::parse(&self.url, &self.html)
    }
}

/// Read-only queries over a parsed page. Invalid selectors simply match nothing.
pub struct Document {
    url: String,
    html: Html,
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl Document {
    pub fn parse(url: &str, html: &str) -> Self {
        Self {
            url: url.to_string(),
            html: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path of the page address, without query or fragment.
    pub fn path(&self) -> &str {
        let rest = match self.url.find("://") {
            Some(index) => &self.url[index + 3..],
            None => &self.url,
        };
        let path = rest.find('/').map_or("", |index| &rest[index..]);
        path.split(['?', '#']).next().unwrap_or_default()
    }

    fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => {
                debug!("Ignoring invalid selector {selector}");
                vec![]
            }
        }
    }

    pub fn has(&self, selector: &str) -> bool {
        !self.select(selector).is_empty()
    }

    /// Text of the first matching element that has any.
    pub fn text(&self, selector: &str) -> Option<String> {
        self.select(selector)
            .into_iter()
            .map(text_of)
            .find(|text| !text.is_empty())
    }

    pub fn texts(&self, selector: &str) -> Vec<String> {
        self.select(selector).into_iter().map(text_of).collect()
    }

    /// Like [`Document::texts`], but keeps surrounding whitespace.
    pub fn texts_raw(&self, selector: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .map(|element| element.text().collect())
            .collect()
    }

    pub fn attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.select(selector)
            .into_iter()
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    pub fn meta(&self, property: &str) -> Option<String> {
        self.attr(&format!("meta[property=\"{property}\"]"), "content")
            .or_else(|| self.attr(&format!("meta[name=\"{property}\"]"), "content"))
    }

    pub fn element_contains(&self, selector: &str, needle: &str) -> bool {
        self.select(selector)
            .into_iter()
            .any(|element| text_of(element).contains(needle))
    }

    /// Whether any element carries a class containing `needle`.
    pub fn class_contains(&self, needle: &str) -> bool {
        self.html.root_element().descendants().any(|node| {
            node.value()
                .as_element()
                .and_then(|element| element.attr("class"))
                .is_some_and(|class| class.contains(needle))
        })
    }

    pub fn body_contains(&self, needle: &str) -> bool {
        self.texts("body")
            .iter()
            .any(|text| text.contains(needle))
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }
}

/// Polls a page and emits a snapshot whenever its content changed.
pub struct PagePoller {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl PagePoller {
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            interval,
        }
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> anyhow::Result<PageSnapshot> {
        let html = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(PageSnapshot::new(self.url.clone(), html))
    }

    /// Runs until the receiver is dropped.
    pub fn spawn(self) -> (mpsc::Receiver<PageSnapshot>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(16);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            let mut last: Option<String> = None;
            loop {
                interval.tick().await;
                let snapshot = match self.fetch().await {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("Failed to fetch {}: {e}", self.url);
                        continue;
                    }
                };
                if last.as_deref() == Some(snapshot.html.as_str()) {
                    continue;
                }
                last = Some(snapshot.html.clone());
                if sender.send(snapshot).await.is_err() {
                    debug!("Snapshot receiver dropped, stopping poller");
                    break;
                }
            }
        });
        (receiver, task)
    }
}
