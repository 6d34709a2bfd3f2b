//! Chat command parser and its effect on the scheduler.
//!
//! Verbs (case-insensitive, leading `/` optional, `@botname` suffix ignored):
//! - `watch <url>... [seconds]`: start or replace this chat's watch
//! - `stop`: drop this chat's watch
//! - `status`: show URLs, interval and last results
//! - `help` / `start`: usage text

use std::time::{Duration, Instant};

use crate::scheduler::{Scheduler, UrlState, WatchTask, MAX_INTERVAL_SECS};

/// Smallest interval a chat may request, in seconds.
pub const MIN_INTERVAL_SECS: f64 = 1.0;

/// Requested intervals above this are clamped down to it.
const MAX_REQUESTED_SECS: f64 = MAX_INTERVAL_SECS as f64;

const WATCH_VERBS: &[&str] = &["watch"];
const STOP_VERBS: &[&str] = &["stop"];
const STATUS_VERBS: &[&str] = &["status"];
const HELP_VERBS: &[&str] = &["help", "start"];

/// Parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Start watching `urls`; `interval` overrides the default when given.
    StartWatch {
        urls: Vec<String>,
        interval: Option<f64>,
    },
    /// A start-watch verb without any URL.
    Invalid,
    Stop,
    Status,
    Help,
    /// Not a command.
    Unknown,
}

fn verb_of(token: &str) -> String {
    let token = token.strip_prefix('/').unwrap_or(token);
    let token = token.split('@').next().unwrap_or(token);
    token.to_lowercase()
}

fn is_url_token(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://")
}

fn parse_interval_token(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= MIN_INTERVAL_SECS)
}

/// Parse a raw chat message.
pub fn interpret(text: &str) -> Intent {
    let mut parts = text.split_whitespace();
    let Some(first) = parts.next() else {
        return Intent::Unknown;
    };
    let verb = verb_of(first);
    let args: Vec<&str> = parts.collect();

    if WATCH_VERBS.contains(&verb.as_str()) {
        if args.is_empty() {
            return Intent::Invalid;
        }
        let mut urls = Vec::new();
        let mut interval = None;
        for arg in args {
            if is_url_token(arg) {
                urls.push(arg.to_string());
            } else if let Some(v) = parse_interval_token(arg) {
                interval = Some(v);
            }
        }
        if urls.is_empty() {
            return Intent::Invalid;
        }
        Intent::StartWatch { urls, interval }
    } else if STOP_VERBS.contains(&verb.as_str()) {
        Intent::Stop
    } else if STATUS_VERBS.contains(&verb.as_str()) {
        Intent::Status
    } else if HELP_VERBS.contains(&verb.as_str()) {
        Intent::Help
    } else {
        Intent::Unknown
    }
}

/// Apply an intent for `chat_id` and return the reply to send, if any.
pub fn apply(
    intent: Intent,
    chat_id: &str,
    scheduler: &mut Scheduler,
    default_interval: f64,
    now: Instant,
) -> Option<String> {
    match intent {
        Intent::StartWatch { urls, interval } => {
            let secs = interval
                .unwrap_or(default_interval)
                .clamp(MIN_INTERVAL_SECS, MAX_REQUESTED_SECS);
            let interval = Duration::try_from_secs_f64(secs).ok()?;
            if !scheduler.start_watch(chat_id, urls, interval, now) {
                return None;
            }
            scheduler
                .task(chat_id)
                .map(|task| format_started(task, scheduler.phrase().raw()))
        }
        Intent::Stop => Some(if scheduler.stop(chat_id) {
            "⏹️ Watch stopped".to_string()
        } else {
            "❌ No active watch".to_string()
        }),
        Intent::Status => Some(match scheduler.task(chat_id) {
            Some(task) => format_status(task, scheduler.phrase().raw()),
            None => "❌ No active watch\nUse: /watch <url1> [url2] ... [interval]".to_string(),
        }),
        Intent::Help => Some(HELP_TEXT.to_string()),
        Intent::Invalid | Intent::Unknown => None,
    }
}

/// Usage text for `help` / `start`.
pub const HELP_TEXT: &str = "🤖 Bot commands:\n\n\
/watch <url1> [url2] ... [seconds] - start watching\n  \
Example: /watch https://site1.com https://site2.com 5\n\n\
/stop - stop watching\n\
/status - show status\n\
/help - show this help\n\n\
💡 Notes:\n\
• You can watch several links at once\n\
• You are notified as soon as the text appears on any link\n\
• The last number is the seconds between checks";

/// Bot-is-running banner sent at startup.
pub const STARTUP_TEXT: &str = "🤖 Bot is running\nUse /help to list commands";

fn numbered_urls(task: &WatchTask) -> String {
    task.urls()
        .iter()
        .enumerate()
        .map(|(i, url)| format!("  {}. {}", i + 1, url))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_started(task: &WatchTask, phrase: &str) -> String {
    format!(
        "✅ Watch started\n\n📋 Links ({}):\n{}\n\n⏱ Every {} seconds\n🔍 Looking for: '{}'",
        task.urls().len(),
        numbered_urls(task),
        task.interval().as_secs_f64(),
        phrase
    )
}

fn format_status(task: &WatchTask, phrase: &str) -> String {
    let results = task
        .states()
        .map(|(url, state)| match state {
            UrlState::Present => format!("  ✅ {}", url),
            UrlState::Absent => format!("  ❌ {}", url),
            UrlState::Unknown => format!("  ⏳ {} ({})", url, state),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "📊 Watch status:\n\n📋 Links ({}):\n{}\n\n⏱ Every {} seconds\n\
         🔍 Looking for: '{}'\n\n📈 Last result:\n{}",
        task.urls().len(),
        numbered_urls(task),
        task.interval().as_secs_f64(),
        phrase,
        results
    )
}
