use chatrelay::{
    app::config::{self, Config},
    core::{
        chat::ChatListener,
        outbound::{OutboundQueue, QueueOptions},
    },
    events::app_event::ChatEvent,
};
use eyre::Context;
use serde_json::Value;
use std::io::Write;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

/// Reads one JSON chat component per line from stdin and prints the decoded
/// chat. Lines starting with `/say ` go out through the rate-limited queue.
#[tokio::main]
async fn main() -> Result<(), eyre::Report> {
    let user_config_path = config::user_config_path()?;
    let config = config::load(&user_config_path)?;

    // Setup file-based logging
    let default_level = if config.silent { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let file_appender = tracing_appender::rolling::never(".", "chatrelay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .init();

    tracing::info!("Loaded config from {:?}", user_config_path);
    match config::save_if_missing(&config, &user_config_path).await {
        Ok(true) => tracing::info!("Saved initial config to {:?}", user_config_path),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to save initial config: {}", e),
    }

    let span = tracing::info_span!("client", name = %config.log_name());
    run(config).instrument(span).await
}

async fn run(config: Config) -> Result<(), eyre::Report> {
    tracing::info!(?config, "Starting chat relay");

    let queue = OutboundQueue::spawn(QueueOptions::from(&config), stdout_transport)?;
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let listener = ChatListener::new(event_tx);

    let printer = tokio::spawn(async move {
        while let Some(ChatEvent::NewChatMessage(message)) = event_rx.recv().await {
            if !message.plain.is_empty() {
                println!("[{}] {}", message.timestamp.format("%H:%M:%S"), message.plain);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(text) = line.strip_prefix("/say ") {
            queue.queue_message(text);
            continue;
        }

        let component = serde_json::from_str::<Value>(line)
            .unwrap_or_else(|_| Value::String(line.to_string()));
        listener.handle_component(&component).await;
    }

    drop(listener);
    printer.await.context("Chat printer task failed")?;

    // Give the drain task one tick per waiting message before giving up.
    for _ in 0..=queue.pending_len() {
        if queue.pending_len() == 0 {
            break;
        }
        tokio::time::sleep(queue.interval()).await;
    }

    let unsent = queue.shutdown();
    if !unsent.is_empty() {
        tracing::warn!(unsent = unsent.len(), "Exiting with unsent chat messages");
    }
    Ok(())
}

fn stdout_transport(text: &str) -> Result<(), eyre::Report> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "> {}", text).context("Failed to write to stdout")?;
    Ok(())
}
