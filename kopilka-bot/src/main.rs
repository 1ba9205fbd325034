use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use kopilka_bot::config::BotConfig;
use kopilka_bot::handlers::status::ServerInfo;
use kopilka_bot::integrations::TelegramClient;
use kopilka_bot::Dispatcher;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("kopilka-bot.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Bot starting");

    let (config, config_path) = BotConfig::load()?;
    tracing::info!("Loaded config from {:?}", config_path);

    let Some(token) = config.bot_token() else {
        tracing::error!(
            "{} is not set and no bot_token in {:?}",
            kopilka_bot::config::TOKEN_ENV,
            config_path
        );
        std::process::exit(1);
    };

    let telegram = config.telegram();
    let client = TelegramClient::new(
        &telegram.api_base_url,
        token,
        Duration::from_secs(telegram.send_timeout_secs),
    )?;
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(client),
        config.web_app_url().map(str::to_string),
    )?);

    let server_config = config.server();
    let info = ServerInfo {
        hosting: server_config.hosting.clone(),
        bot_username: telegram.bot_username.clone(),
    };
    let cors_config = config.cors.clone();

    tracing::info!(
        "Server listening on {}:{}",
        server_config.host,
        server_config.port
    );
    tracing::info!("Webhook: http://localhost:{}/webhook", server_config.port);

    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec!["Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(dispatcher.clone()))
            .app_data(web::Data::new(info.clone()))
            .configure(kopilka_bot::configure)
    })
    .bind((server_config.host.as_str(), server_config.port))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
