use std::{str::FromStr, time::Duration};

use codesync_watcher::{
    extractor::Extractor, observer::ChangeObserver, page::PagePoller, router_client::RouterClient,
};
use serde::Deserialize;
use shared::Platform;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    page_url: String,
    platform: Option<String>,
    #[serde(default = "default_router_url")]
    router_url: String,
    poll_interval_in_seconds: Option<u64>,
    #[serde(default = "default_true")]
    synthetic_problem_ids: bool,
}

fn default_router_url() -> String {
    "http://127.0.0.1:8000/message".to_string()
}

fn default_true() -> bool {
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let platform = match env.platform.as_deref() {
        Some(name) => Platform::from_str(name).unwrap_or_else(|_| {
            warn!("Unknown platform {name}, detecting from the page address");
            Platform::from_url(&env.page_url)
        }),
        None => Platform::from_url(&env.page_url),
    };
    info!("Watching {} as {platform}", env.page_url);

    let client = reqwest::Client::new();
    let poller = PagePoller::new(
        env.page_url,
        Duration::from_secs(env.poll_interval_in_seconds.unwrap_or(5)),
    );
    let (batches, poller_task) = poller.spawn();

    let extractor = Extractor::for_platform(platform).with_synthetic_id(env.synthetic_problem_ids);
    let mut observer =
        ChangeObserver::new(extractor, RouterClient::new(client, env.router_url)).spawn(batches);

    signal::ctrl_c().await?;
    warn!("Received SIGINT. Exiting.");
    observer.dispose();
    poller_task.abort();

    Ok(())
}
