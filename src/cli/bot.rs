//! Bot command: serve chat commands until interrupted.

use std::time::Duration;

use anyhow::Result;
use tracing::info;

use pagewatch::bot::{BotService, BotState};
use pagewatch::channels::TelegramChannel;
use pagewatch::config::Config;
use pagewatch::fetch::HttpFetcher;
use pagewatch::matcher::Phrase;
use pagewatch::scheduler::Scheduler;

pub(crate) async fn cmd_bot(config: Config) -> Result<()> {
    let token = config.validate_for_bot()?;
    let channel = TelegramChannel::new(token)?;
    channel.announce_identity().await;

    let fetcher = HttpFetcher::new(
        Duration::from_secs_f64(config.timeout_secs),
        &config.user_agent,
    )?;
    let mut state = BotState::new(
        Scheduler::new(Phrase::new(&config.find)),
        config.interval_secs,
    );
    let service = BotService::new(
        &channel,
        &channel,
        &fetcher,
        Duration::from_millis(config.tick_millis),
    );

    service.announce(config.telegram.chat_id()).await;
    println!("🤖 Bot running, looking for '{}'", config.find);
    println!("Press Ctrl+C to stop.");

    tokio::select! {
        _ = service.run(&mut state) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    info!(watches = state.scheduler.len(), "Interrupted, shutting down");
    Ok(())
}
