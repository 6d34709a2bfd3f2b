//! Telegram channel implementation.
//!
//! Uses the Bot API through teloxide: `getUpdates` polling for inbound
//! commands and `sendMessage` for replies and detections.

use async_trait::async_trait;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, Recipient, Update, UpdateKind};
use teloxide::Bot;
use tracing::{info, warn};

use crate::error::{Result, WatchError};

use super::{CommandSource, InboundCommand, Notifier};

/// Telegram channel backed by a single bot token.
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    /// Creates a new Telegram channel. The token must be non-empty.
    pub fn new(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(WatchError::Config("Telegram bot token is empty".to_string()));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Log the bot's identity. Failure here is not fatal.
    pub async fn announce_identity(&self) {
        match self.bot.get_me().await {
            Ok(me) => info!(
                "Telegram bot: @{}",
                me.user.username.as_deref().unwrap_or("unknown")
            ),
            Err(e) => warn!("Telegram getMe failed: {}", e),
        }
    }

    /// Send a text message, surfacing API errors.
    pub async fn try_send(&self, recipient: &str, text: &str) -> Result<()> {
        let to = parse_recipient(recipient)?;
        self.bot
            .send_message(to, text)
            .await
            .map_err(|e| WatchError::Channel(format!("sendMessage failed: {}", e)))?;
        Ok(())
    }

    /// Fetch updates after `offset`, surfacing API errors.
    pub async fn try_poll(
        &self,
        offset: Option<i64>,
        wait_secs: u32,
    ) -> Result<Vec<InboundCommand>> {
        let mut request = self.bot.get_updates().timeout(wait_secs);
        if let Some(offset) = offset {
            let offset = i32::try_from(offset).map_err(|_| {
                WatchError::Channel(format!("update offset {} out of range", offset))
            })?;
            request = request.offset(offset);
        }

        let updates = request
            .await
            .map_err(|e| WatchError::Channel(format!("getUpdates failed: {}", e)))?;

        Ok(updates.iter().map(to_inbound).collect())
    }
}

/// Numeric ids go to `Recipient::Id`; anything else is a `@channel` username.
fn parse_recipient(recipient: &str) -> Result<Recipient> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(WatchError::Channel("Telegram chat id is empty".to_string()));
    }
    Ok(match recipient.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(recipient.to_string()),
    })
}

/// Convert an update into a command. Non-message updates and messages
/// without text come back with empty `recipient`/`text` so the caller can
/// still advance its offset past them.
pub fn to_inbound(update: &Update) -> InboundCommand {
    let update_id = i64::from(update.id);
    let message = match &update.kind {
        UpdateKind::Message(m) | UpdateKind::EditedMessage(m) => Some(m),
        _ => None,
    };

    match message {
        Some(m) => InboundCommand {
            update_id,
            recipient: m.chat.id.0.to_string(),
            text: m.text().unwrap_or_default().to_string(),
        },
        None => InboundCommand {
            update_id,
            recipient: String::new(),
            text: String::new(),
        },
    }
}

#[async_trait]
impl Notifier for TelegramChannel {
    async fn send(&self, recipient: &str, text: &str) {
        if let Err(e) = self.try_send(recipient, text).await {
            warn!(recipient, "Telegram notification dropped: {}", e);
        }
    }
}

#[async_trait]
impl CommandSource for TelegramChannel {
    async fn poll(&self, offset: Option<i64>, wait_secs: u32) -> Vec<InboundCommand> {
        match self.try_poll(offset, wait_secs).await {
            Ok(commands) => commands,
            Err(e) => {
                warn!("Telegram polling error: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotState;
    use crate::matcher::Phrase;
    use crate::scheduler::Scheduler;
    use std::time::Instant;

    // Parsed from text: teloxide's flattened update kind only resolves
    // through a streaming deserializer.
    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_token_is_config_error() {
        let err = TelegramChannel::new("   ").err().unwrap();
        assert!(matches!(err, WatchError::Config(_)));
    }

    #[test]
    fn test_parse_recipient() {
        assert!(matches!(
            parse_recipient("791653").unwrap(),
            Recipient::Id(ChatId(791653))
        ));
        assert!(matches!(
            parse_recipient("-100123").unwrap(),
            Recipient::Id(ChatId(-100123))
        ));
        assert!(matches!(
            parse_recipient("@alerts").unwrap(),
            Recipient::ChannelUsername(ref name) if name == "@alerts"
        ));
        assert!(parse_recipient("").is_err());
    }

    #[test]
    fn test_to_inbound_text_message() {
        let upd = update(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "date": 1700000000,
                    "chat": {"id": 791, "type": "private", "first_name": "Sam"},
                    "from": {"id": 791, "is_bot": false, "first_name": "Sam"},
                    "text": "/watch https://a.test 10"
                }
            }"#,
        );
        let cmd = to_inbound(&upd);
        assert_eq!(cmd.update_id, 10);
        assert_eq!(cmd.recipient, "791");
        assert_eq!(cmd.text, "/watch https://a.test 10");
    }

    #[test]
    fn test_to_inbound_edited_message() {
        let upd = update(
            r#"{
                "update_id": 11,
                "edited_message": {
                    "message_id": 2,
                    "date": 1700000000,
                    "edit_date": 1700000010,
                    "chat": {"id": 792, "type": "private", "first_name": "Sam"},
                    "from": {"id": 792, "is_bot": false, "first_name": "Sam"},
                    "text": "/stop"
                }
            }"#,
        );
        let cmd = to_inbound(&upd);
        assert_eq!(cmd.update_id, 11);
        assert_eq!(cmd.recipient, "792");
        assert_eq!(cmd.text, "/stop");
    }

    #[test]
    fn test_non_message_update_still_advances_offset() {
        let upd = update(r#"{"update_id": 12, "some_future_update": {"x": 1}}"#);
        let cmd = to_inbound(&upd);
        assert_eq!(cmd.update_id, 12);
        assert!(cmd.recipient.is_empty());
        assert!(cmd.text.is_empty());

        let mut state = BotState::new(Scheduler::new(Phrase::new("x")), 5.0);
        assert!(state.handle(&cmd, Instant::now()).is_none());
        assert_eq!(state.next_offset, Some(13));
        assert!(state.scheduler.is_empty());
    }
}
