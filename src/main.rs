use img2pdf_bot::config::Config;
use img2pdf_bot::transport::{self, TelegramMessenger};
use log::{error, info};
use std::sync::Arc;
use teloxide::Bot;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let bot = Bot::new(config.bot_token.clone());
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let controller = Arc::new(config.into_controller(messenger));

    info!("Starting bot, waiting for updates");
    transport::run(bot, controller).await;
    info!("Bot stopped");
}
