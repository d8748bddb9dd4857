use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use honeypot_engine::api;
use honeypot_engine::config::ServiceConfig;
use honeypot_engine::llm::create_reply_generator;
use honeypot_engine::pipeline::Engine;
use honeypot_engine::report::WebhookTransport;
use honeypot_engine::session::SessionRegistry;

/// Console logging, plus a daily rolling file when `log_dir` is set.
/// The returned guard must live as long as the process.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "honeypot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    eprintln!("🍯 Honeypot engine v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Inbound: http://0.0.0.0:{}/inbound", config.port);
    eprintln!("   Reports: {}", config.callback_url);

    if config.api_key.is_none() {
        tracing::warn!("HONEYPOT_API_KEY not set, inbound requests are unauthenticated");
    }

    let transport = WebhookTransport::new(&config.callback_url, config.engine.delivery_timeout)
        .context("failed to build report transport")?;
    let engine = Engine::new(
        config.engine.clone(),
        SessionRegistry::new(),
        create_reply_generator(&config),
        Arc::new(transport),
    );

    let app = api::routes(Arc::new(engine), config.api_key.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    info!(port = config.port, "Honeypot engine listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
