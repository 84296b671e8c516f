//! layer-watch — logs deleted, edited and received messages of a user
//! account into per-chat files.
//!
//! Put your credentials into `.env` (see `layer-watch-app/watch.env.example`)
//! and run:
//!   cargo run -p layer-watch-app
//!
//! Logging: RUST_LOG=layer_client=info,layer_watch=debug,layer_watch_app=debug cargo run -p layer-watch-app

mod auth;
mod config;
mod directory;
mod translate;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use layer_client::{BinaryFileBackend, Client, Config};
use layer_watch::{EventLogger, FileSink};

use crate::config::Settings;
use crate::directory::{ChatDirectory, user_display};
use crate::translate::Translator;

#[derive(Debug, Parser)]
#[command(name = "layer-watch", version, about = "Log deleted, edited and received Telegram messages per chat")]
struct Cli {
    /// KEY=VALUE settings file [default: .env, optional]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the log files (overrides LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("layer_client=warn,layer_watch=info,layer_watch_app=info"),
    ).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("\n✗ {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(".env"));
    let mut settings = Settings::load(&config_path, cli.config.is_some())?;
    if let Some(dir) = cli.log_dir {
        settings.log_dir = dir;
    }
    log::debug!("[watch] {settings:?}");

    let mut config = Config {
        api_id:          settings.api_id,
        api_hash:        settings.api_hash.clone(),
        session_backend: Arc::new(BinaryFileBackend::new(settings.session_path())),
        ..Default::default()
    };
    if let Some(dc) = &settings.dc {
        log::info!("[watch] pinning DC{} at {}", dc.id, dc.addr());
        config.dc_addr = Some(dc.addr());
    }

    println!("🔌 Connecting …");
    let (client, _shutdown) = Client::connect(config).await?;
    auth::ensure_signed_in(&client, &settings).await?;

    let me = client.get_me().await?;
    let mut directory = ChatDirectory::default();
    directory.insert_user(&me);
    if let Err(e) = directory.refresh(&client).await {
        log::warn!("[watch] could not load dialogs, chat titles will be missing: {e}");
    }
    let me_display = user_display(me.username.as_deref(), me.first_name.as_deref(), me.last_name.as_deref());

    let logger = EventLogger::new(FileSink::new(&settings.log_dir))
        .with_allowed_chats(settings.allowed_chat_ids.iter().copied());
    let mut translator = Translator::new(client.clone(), directory, me_display);

    // ── Update stream loop ─────────────────────────────────────────────
    println!("\n👂 Logging to {} (Ctrl+C to quit) …\n", settings.log_dir.display());
    let mut updates = client.stream_updates();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(update) = update else {
                    log::warn!("[watch] update stream closed");
                    break;
                };
                if let Some(event) = translator.translate(update).await {
                    logger.handle(&event);
                }
            }
            _ = &mut shutdown => {
                println!("\n👋 Shutting down");
                break;
            }
        }
    }

    client.save_session().await?;
    Ok(())
}
