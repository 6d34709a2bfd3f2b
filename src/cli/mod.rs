//! Command-line surface.

pub(crate) mod bot;
pub(crate) mod watch;

use anyhow::{bail, Context, Result};
use clap::Parser;

use pagewatch::config::{Config, ENV_TELEGRAM_CHAT_ID, ENV_TELEGRAM_TOKEN};

#[derive(Parser, Debug)]
#[command(name = "pagewatch")]
#[command(version)]
#[command(about = "Check pages for a phrase, or run as a Telegram bot", long_about = None)]
pub(crate) struct Cli {
    /// One or more URLs to check (omit in --bot mode)
    pub urls: Vec<String>,

    /// Timeout in seconds for each request
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Text to search for within the page
    #[arg(long)]
    pub find: Option<String>,

    /// Keep checking every interval until the text shows up
    #[arg(long)]
    pub watch: bool,

    /// Seconds between checks with --watch (and the bot's default)
    #[arg(long)]
    pub interval: Option<f64>,

    /// Print the size of each page and exit
    #[arg(long)]
    pub size: bool,

    /// Run as a Telegram bot that accepts /watch, /stop and /status
    #[arg(long)]
    pub bot: bool,

    /// Telegram bot token
    #[arg(long = "tg-token", env = ENV_TELEGRAM_TOKEN, hide_env_values = true)]
    pub tg_token: Option<String>,

    /// Telegram chat id that receives detections
    #[arg(long = "tg-chat-id", env = ENV_TELEGRAM_CHAT_ID)]
    pub tg_chat_id: Option<String>,
}

impl Cli {
    /// Layer the flags on top of a loaded config.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(find) = &self.find {
            config.find = find.clone();
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(token) = &self.tg_token {
            config.telegram.token = Some(token.clone());
        }
        if let Some(chat_id) = &self.tg_chat_id {
            config.telegram.chat_id = Some(chat_id.clone());
        }
        config
    }
}

/// Dispatch to the selected mode.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply_to(Config::load().context("Failed to load configuration")?);
    config.validate()?;

    if cli.bot {
        return bot::cmd_bot(config).await;
    }

    if cli.urls.is_empty() {
        bail!("Please provide at least one URL or use --bot mode.");
    }

    if cli.size {
        watch::cmd_size(&config, &cli.urls).await
    } else if cli.watch {
        watch::cmd_watch(&config, cli.urls).await
    } else {
        watch::cmd_check(&config, cli.urls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_urls_and_flags() {
        let cli = Cli::try_parse_from([
            "pagewatch",
            "https://a.test",
            "https://b.test",
            "--watch",
            "--interval",
            "2.5",
            "--find",
            "open",
        ])
        .unwrap();
        assert_eq!(cli.urls, vec!["https://a.test", "https://b.test"]);
        assert!(cli.watch);
        assert!(!cli.bot);
        assert_eq!(cli.interval, Some(2.5));
        assert_eq!(cli.find.as_deref(), Some("open"));
    }

    #[test]
    fn test_bot_mode_without_urls_parses() {
        let cli = Cli::try_parse_from(["pagewatch", "--bot", "--tg-token", "123:abc"]).unwrap();
        assert!(cli.bot);
        assert!(cli.urls.is_empty());
        assert_eq!(cli.tg_token.as_deref(), Some("123:abc"));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "pagewatch",
            "https://a.test",
            "--timeout",
            "3",
            "--tg-chat-id",
            "791",
        ])
        .unwrap();
        let mut base = Config::default();
        base.find = "from file".to_string();

        let config = cli.apply_to(base);
        assert_eq!(config.timeout_secs, 3.0);
        assert_eq!(config.find, "from file");
        assert_eq!(config.telegram.chat_id(), Some("791"));
    }

    #[test]
    fn test_rejects_non_numeric_interval() {
        let parsed = Cli::try_parse_from(["pagewatch", "https://a.test", "--interval", "soon"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_out_of_range_flags_fail_validation() {
        let cli = Cli::try_parse_from(["pagewatch", "https://a.test", "--interval", "1e20"])
            .unwrap();
        assert!(cli.apply_to(Config::default()).validate().is_err());

        let cli = Cli::try_parse_from(["pagewatch", "https://a.test", "--timeout", "1e19"])
            .unwrap();
        assert!(cli.apply_to(Config::default()).validate().is_err());
    }
}
