use std::{path::PathBuf, sync::Arc, time::Duration};

use codesync_bot::{
    api::{prometheus::PrometheusClient, RepositoryClient, RepositoryTarget, RetryPolicy},
    events::{ClientFactory, Context},
    messages::MessageLoader,
    notifier::Notifier,
    scheduler::Scheduler,
    store::Store,
};
use rocket::{routes, serde::json::Json};
use serde::Deserialize;
use shared::{telegram, Message, Response};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

#[derive(Deserialize)]
struct Env {
    #[serde(default)]
    github_token: String,
    #[serde(default)]
    github_owner: String,
    #[serde(default)]
    github_repo: String,
    store_path: Option<PathBuf>,
    message_file: Option<PathBuf>,
    telegram_token: Option<String>,
    telegram_chat_id: Option<String>,
    reminder_interval_in_minutes: Option<u64>,
    repo_check_interval_in_minutes: Option<u64>,
    request_timeout_in_seconds: Option<u64>,
    max_retries: Option<u32>,
}

#[rocket::post("/message", data = "<message>")]
async fn message(state: &rocket::State<Context>, message: Json<Message>) -> Json<Response> {
    Json(state.handle(message.into_inner()).await)
}

#[rocket::get("/metrics")]
async fn metrics(
    state: &rocket::State<Context>,
) -> Option<(
    rocket::http::ContentType,
    rocket::response::content::RawHtml<String>,
)> {
    let metrics = state.prometheus.encode().ok()?;
    Some((
        rocket::http::ContentType::new(
            "application/openmetrics-text",
            " version=1.0.0; charset=utf-8",
        ),
        rocket::response::content::RawHtml(metrics),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let env = envy::from_env::<Env>()?;
    let telegram = match (env.telegram_token, env.telegram_chat_id) {
        (Some(token), Some(chat_id)) => Some(telegram::TelegramSubscriber::new(token, chat_id)),
        _ => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(telegram.clone())
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let messages = match &env.message_file {
        Some(path) => MessageLoader::load_from_file(path)?,
        None => MessageLoader::bundled()?,
    };
    let store = Store::open(
        env.store_path
            .unwrap_or_else(|| PathBuf::from("codesync-store.json")),
    )
    .await?;

    let prometheus: Arc<PrometheusClient> = Default::default();
    let retry = RetryPolicy {
        timeout: Duration::from_secs(env.request_timeout_in_seconds.unwrap_or(30)),
        max_retries: env.max_retries.unwrap_or(3),
        ..Default::default()
    };
    let factory: ClientFactory = {
        let prometheus = prometheus.clone();
        Arc::new(move |target: RepositoryTarget| {
            RepositoryClient::github(target, prometheus.clone(), retry)
        })
    };

    let context = Context::new(
        store.into(),
        Notifier::new(messages.into(), telegram),
        prometheus,
        factory,
    );
    context
        .restore(&RepositoryTarget::new(
            env.github_token,
            env.github_owner,
            env.github_repo,
        ))
        .await?;

    let scheduler = Scheduler::new(
        context.clone(),
        Duration::from_secs(env.reminder_interval_in_minutes.unwrap_or(60) * 60),
        Duration::from_secs(env.repo_check_interval_in_minutes.unwrap_or(24 * 60) * 60),
    );

    tokio::select! {
        _ = scheduler.run() => {
        }
        _ = signal::ctrl_c() => {
            tracing::warn!("Received SIGINT. Exiting.");
        }
        _ = rocket::build()
            .mount("/", routes![message, metrics])
            .manage(context)
            .launch() => {

            }
    }
    tracing::warn!("Exiting bot...");

    Ok(())
}
